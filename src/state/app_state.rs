use crate::app::MenuItem;
use crate::state::aggregate::SeasonStats;
use crate::state::form::Form;
use crate::state::games::GameStore;
use crate::state::intake::StatsIntake;
use crate::state::league::{FixturesSync, LadderView};
use crate::state::review::ReviewQueue;
use crate::state::roster::Roster;
use crate::state::session::Session;
use crate::state::users::UserAdmin;
use courtside_api::{GameId, PlayerGameStat, PlayerId, StatId, UserId};

// ---------------------------------------------------------------------------
// Game detail
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct GameDetailState {
    pub game_id: Option<GameId>,
    pub stats: Vec<PlayerGameStat>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub scroll_offset: u16,
}

impl GameDetailState {
    pub fn open(&mut self, game_id: GameId) {
        *self = Self { game_id: Some(game_id), loading: true, ..Self::default() };
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn is_open_for(&self, game_id: GameId) -> bool {
        self.game_id == Some(game_id)
    }

    pub fn loaded(&mut self, game_id: GameId, result: Result<Vec<PlayerGameStat>, String>) {
        if !self.is_open_for(game_id) {
            return;
        }
        self.loading = false;
        match result {
            Ok(mut stats) => {
                stats.sort_by(|a, b| b.points.cmp(&a.points));
                self.stats = stats;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Modals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    RejectStat(StatId),
    DeleteGame(GameId),
    DeleteUser(UserId),
    MergePlayers { source: PlayerId, target: PlayerId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Login(Form),
    Register(Form),
    /// Form and stage live in `AppState::intake`.
    Intake,
    GameEditor { id: Option<GameId>, form: Form },
    PlayerEditor { id: Option<PlayerId>, form: Form },
    ManagerEditor(Form),
    Search(Form),
    Confirm(ConfirmAction),
}

impl Modal {
    pub fn form_mut<'a>(&'a mut self, intake: &'a mut StatsIntake) -> Option<&'a mut Form> {
        match self {
            Modal::Login(form)
            | Modal::Register(form)
            | Modal::ManagerEditor(form)
            | Modal::Search(form)
            | Modal::GameEditor { form, .. }
            | Modal::PlayerEditor { form, .. } => Some(form),
            Modal::Intake => Some(&mut intake.form),
            Modal::Confirm(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub session: Session,
    pub games: GameStore,
    pub game_detail: GameDetailState,
    pub season: SeasonStats,
    pub intake: StatsIntake,
    pub review: ReviewQueue,
    pub ladder: LadderView,
    pub fixtures: FixturesSync,
    pub roster: Roster,
    pub users: UserAdmin,
    pub modal: Option<Modal>,
    /// Error shown inside the open modal.
    pub modal_error: Option<String>,
    /// An editor save is in flight.
    pub submitting: bool,
    pub notice: Option<String>,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything that belongs to the signed-in user.
    pub fn clear_private(&mut self) {
        self.season.clear();
        self.review.clear();
        self.roster.clear();
        self.users.clear();
        self.ladder.clear();
        self.game_detail.close();
        self.intake.close();
        self.modal = None;
        self.modal_error = None;
        self.submitting = false;
    }
}
