use crate::state::network::LoadingState;
use courtside_api::{
    Acknowledgement, Credentials, ExternalStats, Fixture, Game, GameDraft, GameId, LadderEntry,
    Player, PlayerDraft, PlayerGameStat, PlayerId, Registration, StatId, StatsFetch, User, UserId,
};
use crossterm::event::KeyEvent;

/// Errors cross the channel as display strings; the worker has already logged them.
pub type Outcome<T> = Result<T, String>;

/// Private loads carry the session generation they were issued under and
/// their responses echo it back.
pub type Generation = u64;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    Login { credentials: Credentials },
    Logout,
    Register { registration: Registration },
    ResendVerification { email: String },

    LoadGames,
    LoadGameStats { game_id: GameId, generation: Generation },
    SaveGame { id: Option<GameId>, draft: GameDraft },
    DeleteGame { id: GameId },

    LoadSeasonStats { game_ids: Vec<GameId>, generation: Generation },
    LoadPlayerHistory { player_id: PlayerId, generation: Generation },
    /// Preview (`persist == false`) or commit of external stats.
    FetchExternalStats { session: u64, fetch: StatsFetch },
    LoadUnverified { generation: Generation },
    VerifyStat { id: StatId },
    RejectStat { id: StatId },

    LoadLadder { limit: usize, generation: Generation },
    LoadTeamPosition { team_name: String, generation: Generation },
    UpdateLadder,
    LoadFixtures { limit: usize },
    UpdateFixtures,
    SyncFixtures,

    LoadPlayers { include_inactive: bool, generation: Generation },
    SavePlayer { id: Option<PlayerId>, draft: PlayerDraft },
    SetPlayerActive { id: PlayerId, active: bool },
    MergePlayers { source: PlayerId, target: PlayerId },

    LoadUsers { generation: Generation },
    CreateManager { registration: Registration },
    DeleteUser { id: UserId },
    VerifyUser { id: UserId },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },

    LoggedIn { result: Outcome<User> },
    LoggedOut,
    Registered { result: Outcome<User> },
    VerificationResent { result: Outcome<Acknowledgement> },

    GamesLoaded { result: Outcome<Vec<Game>> },
    GameStatsLoaded { game_id: GameId, generation: Generation, result: Outcome<Vec<PlayerGameStat>> },
    GameSaved { result: Outcome<Game> },
    GameDeleted { id: GameId, result: Outcome<Acknowledgement> },

    /// One entry per requested game, in request order.
    SeasonStatsLoaded { generation: Generation, per_game: Vec<(GameId, Outcome<Vec<PlayerGameStat>>)> },
    PlayerHistoryLoaded { player_id: PlayerId, generation: Generation, result: Outcome<Vec<PlayerGameStat>> },
    ExternalStatsFetched { session: u64, persist: bool, result: Outcome<ExternalStats> },
    UnverifiedLoaded { generation: Generation, result: Outcome<Vec<PlayerGameStat>> },
    StatVerified { id: StatId, result: Outcome<Acknowledgement> },
    StatRejected { id: StatId, result: Outcome<Acknowledgement> },

    LadderLoaded { generation: Generation, result: Outcome<Vec<LadderEntry>> },
    TeamPositionLoaded { generation: Generation, result: Outcome<LadderEntry> },
    LadderUpdated { result: Outcome<Acknowledgement> },
    FixturesLoaded { result: Outcome<Vec<Fixture>> },
    FixturesUpdated { result: Outcome<Acknowledgement> },
    FixturesSynced { result: Outcome<Acknowledgement> },

    PlayersLoaded { generation: Generation, result: Outcome<Vec<Player>> },
    PlayerSaved { result: Outcome<Player> },
    PlayerActiveSet { id: PlayerId, active: bool, result: Outcome<Acknowledgement> },
    PlayersMerged { result: Outcome<Acknowledgement> },

    UsersLoaded { generation: Generation, result: Outcome<Vec<User>> },
    ManagerCreated { result: Outcome<User> },
    UserDeleted { id: UserId, result: Outcome<Acknowledgement> },
    UserVerified { id: UserId, result: Outcome<Acknowledgement> },
}

impl NetworkResponse {
    /// Whether the spinner should end on the error marker.
    pub fn is_failure(&self) -> bool {
        use NetworkResponse::*;
        match self {
            LoadingStateChanged { .. } | LoggedOut => false,
            LoggedIn { result } | Registered { result } | ManagerCreated { result } => result.is_err(),
            VerificationResent { result }
            | GameDeleted { result, .. }
            | StatVerified { result, .. }
            | StatRejected { result, .. }
            | LadderUpdated { result }
            | FixturesUpdated { result }
            | FixturesSynced { result }
            | PlayerActiveSet { result, .. }
            | PlayersMerged { result }
            | UserDeleted { result, .. }
            | UserVerified { result, .. } => result.is_err(),
            GamesLoaded { result } => result.is_err(),
            GameSaved { result } => result.is_err(),
            GameStatsLoaded { result, .. }
            | PlayerHistoryLoaded { result, .. }
            | UnverifiedLoaded { result, .. } => result.is_err(),
            SeasonStatsLoaded { per_game, .. } => per_game.iter().any(|(_, r)| r.is_err()),
            ExternalStatsFetched { result, .. } => result.is_err(),
            LadderLoaded { result, .. } => result.is_err(),
            TeamPositionLoaded { result, .. } => result.is_err(),
            FixturesLoaded { result } => result.is_err(),
            PlayersLoaded { result, .. } => result.is_err(),
            PlayerSaved { result } => result.is_err(),
            UsersLoaded { result, .. } => result.is_err(),
        }
    }

    /// The session generation of a private load, `None` for everything else.
    pub fn generation(&self) -> Option<Generation> {
        use NetworkResponse::*;
        match self {
            GameStatsLoaded { generation, .. }
            | SeasonStatsLoaded { generation, .. }
            | PlayerHistoryLoaded { generation, .. }
            | UnverifiedLoaded { generation, .. }
            | LadderLoaded { generation, .. }
            | TeamPositionLoaded { generation, .. }
            | PlayersLoaded { generation, .. }
            | UsersLoaded { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    /// Periodic refresh timer fired.
    RefreshTick,
    IntakeAutoClose { session: u64 },
}
