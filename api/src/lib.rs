pub mod client;
pub mod wire;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(GameId);
id_type!(PlayerId);
id_type!(StatId);
id_type!(UserId);

// ---------------------------------------------------------------------------
// Domain types, independent of the server's JSON shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: GameId,
    pub opponent_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub final_score: Option<u16>,    // our side
    pub opponent_score: Option<u16>,
    pub video_url: Option<String>,
}

impl Game {
    /// A game is completed once both final scores are recorded.
    pub fn is_completed(&self) -> bool {
        self.final_score.is_some() && self.opponent_score.is_some()
    }

    pub fn score(&self) -> Option<(u16, u16)> {
        self.final_score.zip(self.opponent_score)
    }

    pub fn result(&self) -> Option<GameResult> {
        let (ours, theirs) = self.score()?;
        Some(match ours.cmp(&theirs) {
            std::cmp::Ordering::Greater => GameResult::Win,
            std::cmp::Ordering::Less => GameResult::Loss,
            std::cmp::Ordering::Equal => GameResult::Tie,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Tie,
}

impl GameResult {
    pub fn letter(&self) -> char {
        match self {
            GameResult::Win => 'W',
            GameResult::Loss => 'L',
            GameResult::Tie => 'T',
        }
    }
}

/// Editable fields of a game, used for both create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDraft {
    pub opponent_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub final_score: Option<u16>,
    pub opponent_score: Option<u16>,
    pub video_url: Option<String>,
}

impl From<&Game> for GameDraft {
    fn from(game: &Game) -> Self {
        Self {
            opponent_name: game.opponent_name.clone(),
            scheduled_at: game.scheduled_at,
            venue: game.venue.clone(),
            final_score: game.final_score,
            opponent_score: game.opponent_score,
            video_url: game.video_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub jersey_number: u8,
    pub is_active: bool,
    pub joined_on: Option<NaiveDate>,
}

impl Player {
    pub const MAX_JERSEY: u8 = 99;

    pub fn jersey_in_range(number: u32) -> bool {
        number <= u32::from(Self::MAX_JERSEY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDraft {
    pub name: String,
    pub jersey_number: u8,
}

/// Player identity as embedded in a stat record by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: Option<PlayerId>,
    pub name: String,
    pub jersey_number: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerGameStat {
    pub id: StatId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub player: Option<PlayerRef>,
    pub points: u32,
    pub fouls: u32,
    pub verification: VerificationStatus,
    pub source_url: Option<String>,
    pub scraped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Manager,
    Player,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::Player => "Player",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_verified: bool,
    pub jersey_number: Option<u8>,
}

/// Result of a successful login: the bearer token and the signed-in user.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: SecretString,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub role: Role,
    pub jersey_number: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LadderEntry {
    pub position: u32,
    pub team_name: String,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,
    /// Fraction of games won, 0.0 to 1.0, with draws counting half.
    pub win_percentage: f64,
    pub games_played: u32,
    pub season: Option<String>,
    pub division: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl LadderEntry {
    /// `win_percentage` scaled for display, 0.0 to 100.0.
    pub fn win_percent(&self) -> f64 {
        self.win_percentage * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: GameId,
    pub opponent_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub is_today: bool,
    pub days_until: i64,
    pub has_scores: bool,
}

/// Parameters of the combined fetch-external-and-optionally-persist call.
#[derive(Debug, Clone)]
pub struct StatsFetch {
    pub url: String,
    pub credential: SecretString,
    pub game_id: Option<GameId>,
    pub persist: bool,
}

/// One player's line as extracted from an external stats page.
/// `None` means the source had no value for that column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStatLine {
    pub player_name: String,
    pub points: Option<u32>,
    pub fouls: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalStats {
    pub message: String,
    pub lines: Vec<ExternalStatLine>, // sorted by player name
    pub raw_content: Option<String>,
    pub saved: bool,
}

/// Acknowledgement returned by trigger-style endpoints (ladder/fixtures refresh).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Acknowledgement {
    pub message: String,
}
