/// Raw wire types: serde shapes for the team service's JSON bodies.
/// These map to the clean domain types via the mapping functions in client.rs.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Booleans arrive either as JSON bools or as 0/1 integers depending on the
/// server revision (e.g. `players.is_active`).
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// FastAPI-style error body. `detail` is a string for handled errors and a
/// list of validation issues for 422 responses.
#[derive(Debug, Deserialize, Default)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Auth / users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WireUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_verified: Option<Flag>,
    pub jersey_number: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct WireAuthResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub user: WireUser,
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jersey_number: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WireMessage {
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

/// Older server revisions send a date-only `date`; newer ones a full
/// `datetime`. Both may be present.
#[derive(Debug, Deserialize, Clone)]
pub struct WireGame {
    pub id: i64,
    pub opponent_name: String,
    pub datetime: Option<String>,
    pub date: Option<String>,
    pub venue: Option<String>,
    pub final_score_skywalkers: Option<u16>,
    pub final_score_opponent: Option<u16>,
    pub video_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GameBody<'a> {
    pub opponent_name: &'a str,
    pub datetime: String,
    pub date: String,
    pub venue: Option<&'a str>,
    pub final_score_skywalkers: Option<u16>,
    pub final_score_opponent: Option<u16>,
    pub video_url: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WirePlayer {
    pub id: i64,
    pub name: Option<String>,
    pub jersey_number: Option<u8>,
    pub is_active: Option<Flag>,
    pub created_at: Option<String>,
    /// Legacy shape: player rows linked to a user carry the name there.
    pub user: Option<WireUser>,
}

#[derive(Debug, Serialize)]
pub struct PlayerBody<'a> {
    pub name: &'a str,
    pub jersey_number: u8,
}

#[derive(Debug, Serialize)]
pub struct MergeBody {
    pub source_player_id: i64,
    pub target_player_id: i64,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WireStat {
    pub id: i64,
    pub game_id: i64,
    #[serde(alias = "user_id")]
    pub player_id: i64,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub fouls: u32,
    pub verification_status: Option<String>,
    pub is_verified: Option<Flag>,
    pub scrape_source: Option<String>,
    pub is_scraped: Option<Flag>,
    #[serde(alias = "user")]
    pub player: Option<WirePlayer>,
}

#[derive(Debug, Serialize)]
pub struct FetchStatsBody<'a> {
    pub url: &'a str,
    /// The server still names the access credential `cookies`.
    pub cookies: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<i64>,
    pub save_to_db: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct WireFetchStatsResponse {
    #[serde(default)]
    pub message: String,
    pub data: Option<WireFetchStatsData>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WireFetchStatsData {
    pub url: Option<String>,
    pub success: Option<bool>,
    pub timestamp: Option<String>,
    /// Player name → extracted line. `-1` marks a column the page did not have.
    #[serde(default)]
    pub player_stats: BTreeMap<String, WireStatLine>,
    pub raw_content: Option<String>,
    #[serde(default)]
    pub saved_to_db: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct WireStatLine {
    #[serde(default = "missing")]
    pub points: i64,
    #[serde(default = "missing")]
    pub fouls: i64,
}

fn missing() -> i64 {
    -1
}

// ---------------------------------------------------------------------------
// Ladder / fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct WireLadderEntry {
    pub position: u32,
    pub team_name: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub draws: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub points_for: u32,
    #[serde(default)]
    pub points_against: u32,
    #[serde(default)]
    pub win_percentage: f64,
    #[serde(default)]
    pub games_played: u32,
    pub season: Option<String>,
    pub division: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct LadderUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WireFixturesResponse {
    #[serde(default)]
    pub fixtures: Vec<WireFixture>,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireFixture {
    pub id: i64,
    pub opponent_name: String,
    pub date: Option<String>,
    pub datetime: Option<String>,
    pub venue: Option<String>,
    #[serde(default)]
    pub is_today: bool,
    #[serde(default)]
    pub days_until: i64,
    #[serde(default)]
    pub has_scores: bool,
}
