use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, ConfirmAction, Modal};
use crate::state::form::{self, Form};
use crate::state::intake::{IntakeOutcome, IntakeStage};
use crate::state::league::{FIXTURES_LIMIT, FixturesAction, LADDER_LIMIT};
use crate::state::messages::{NetworkRequest, NetworkResponse};
use chrono::{DateTime, Utc};
use courtside_api::{Credentials, GameDraft, GameId, Registration, Role};
use log::{debug, info};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Dashboard,
    Games,
    Stats,
    Ladder,
    Roster,
    Review,
    Users,
    Help,
}

/// Side effects the UI loop performs after a state transition.
#[derive(Debug)]
pub enum Effect {
    Send(NetworkRequest),
    ScheduleIntakeClose { session: u64 },
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self {
            state: AppState::new(),
            settings,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    pub fn startup_requests(&mut self) -> Vec<NetworkRequest> {
        let mut requests: Vec<NetworkRequest> = self.request_games_refresh().into_iter().collect();
        if self.state.fixtures.begin_load() {
            requests.push(NetworkRequest::LoadFixtures { limit: FIXTURES_LIMIT });
        }
        requests
    }

    /// Goes through the game store's guard: `None` while a refresh is pending.
    pub fn request_games_refresh(&mut self) -> Option<NetworkRequest> {
        if self.state.games.begin_refresh() {
            Some(NetworkRequest::LoadGames)
        } else {
            debug!("games refresh already in flight, dropping request");
            None
        }
    }

    /// Periodic tick: roll games past `now` into the completed view, then
    /// refresh from the server.
    pub fn on_refresh_tick(&mut self, now: DateTime<Utc>) -> Vec<NetworkRequest> {
        self.state.games.reclassify(now);
        self.request_games_refresh().into_iter().collect()
    }

    fn season_reload(&mut self) -> Option<NetworkRequest> {
        if !self.capabilities().view_stats || !self.state.season.begin_load() {
            return None;
        }
        Some(NetworkRequest::LoadSeasonStats {
            game_ids: self.state.games.completed_ids(),
            generation: self.generation(),
        })
    }

    fn ladder_reload(&mut self) -> Vec<NetworkRequest> {
        if !self.capabilities().view_ladder || !self.state.ladder.begin_load() {
            return Vec::new();
        }
        let generation = self.generation();
        vec![
            NetworkRequest::LoadLadder { limit: LADDER_LIMIT, generation },
            NetworkRequest::LoadTeamPosition { team_name: self.settings.team_name.clone(), generation },
        ]
    }

    fn fixtures_reload(&mut self) -> Option<NetworkRequest> {
        self.state
            .fixtures
            .begin_load()
            .then_some(NetworkRequest::LoadFixtures { limit: FIXTURES_LIMIT })
    }

    fn roster_reload(&mut self) -> Option<NetworkRequest> {
        let caps = self.capabilities();
        if !caps.view_roster || !self.state.roster.begin_load() {
            return None;
        }
        Some(NetworkRequest::LoadPlayers { include_inactive: caps.manage_players, generation: self.generation() })
    }

    fn review_reload(&mut self) -> Option<NetworkRequest> {
        if !self.capabilities().review_stats || !self.state.review.load() {
            return None;
        }
        Some(NetworkRequest::LoadUnverified { generation: self.generation() })
    }

    fn users_reload(&mut self) -> Option<NetworkRequest> {
        if !self.capabilities().manage_users || !self.state.users.begin_load() {
            return None;
        }
        Some(NetworkRequest::LoadUsers { generation: self.generation() })
    }

    pub fn capabilities(&self) -> crate::state::session::Capabilities {
        self.state.session.capabilities()
    }

    fn generation(&self) -> u64 {
        self.state.session.generation()
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_network_response(&mut self, response: NetworkResponse, now: DateTime<Utc>) -> Vec<Effect> {
        // A private load issued before the last sign-in or sign-out must not
        // refill state that was cleared for the new session.
        if let Some(generation) = response.generation()
            && generation != self.generation()
        {
            debug!("dropping private response from session generation {generation}");
            return Vec::new();
        }

        let mut requests: Vec<NetworkRequest> = Vec::new();
        let mut effects: Vec<Effect> = Vec::new();

        match response {
            NetworkResponse::LoadingStateChanged { .. } | NetworkResponse::LoggedOut => {}

            NetworkResponse::LoggedIn { result } => match result {
                Ok(user) => {
                    info!("signed in as {} ({})", user.email, user.role.label());
                    self.state.notice = Some(format!("Signed in as {}", user.name));
                    self.state.session.signed_in(user);
                    self.close_modal();
                    requests.extend(self.request_games_refresh());
                    requests.extend(self.ladder_reload());
                    requests.extend(self.roster_reload());
                    requests.extend(self.review_reload());
                    requests.extend(self.users_reload());
                }
                Err(e) => {
                    self.state.session.sign_in_failed();
                    self.state.modal_error = Some(e);
                }
            },
            NetworkResponse::Registered { result } => {
                self.state.submitting = false;
                match result {
                    Ok(user) => {
                        self.state.notice =
                            Some(format!("Registered {}. Verify your email, then sign in.", user.email));
                        self.state.modal = Some(Modal::Login(Form::login().with_value(0, user.email)));
                        self.state.modal_error = None;
                    }
                    Err(e) => self.state.modal_error = Some(e),
                }
            }
            NetworkResponse::VerificationResent { result } => match result {
                Ok(ack) => self.state.notice = Some(non_empty(ack.message, "Verification email sent")),
                Err(e) => self.state.modal_error = Some(e),
            },

            NetworkResponse::GamesLoaded { result } => {
                let ok = result.is_ok();
                self.state.games.finish_refresh(result, now);
                if ok {
                    requests.extend(self.season_reload());
                }
            }
            NetworkResponse::GameStatsLoaded { game_id, result, .. } => {
                self.state.game_detail.loaded(game_id, result);
            }
            NetworkResponse::GameSaved { result } => {
                self.state.submitting = false;
                match result {
                    Ok(game) => {
                        self.state.notice = Some(format!("Saved game vs {}", game.opponent_name));
                        self.close_modal();
                        requests.extend(self.request_games_refresh());
                    }
                    Err(e) => self.state.modal_error = Some(e),
                }
            }
            NetworkResponse::GameDeleted { id, result } => match result {
                Ok(_) => {
                    self.state.notice = Some("Game deleted".to_owned());
                    if self.state.game_detail.is_open_for(id) {
                        self.state.game_detail.close();
                    }
                    requests.extend(self.request_games_refresh());
                }
                Err(e) => self.state.last_error = Some(e),
            },

            NetworkResponse::SeasonStatsLoaded { per_game, .. } => {
                self.state.season.finish_load(per_game, self.state.roster.players());
            }
            NetworkResponse::PlayerHistoryLoaded { player_id, result, .. } => {
                self.state.season.history_loaded(player_id, result);
            }
            NetworkResponse::ExternalStatsFetched { session, persist: false, result } => {
                self.state.intake.fetch_completed(session, result);
            }
            NetworkResponse::ExternalStatsFetched { session, persist: true, result } => {
                match self.state.intake.commit_completed(session, result) {
                    IntakeOutcome::Committed { session } => {
                        info!("external stats saved (intake session {session})");
                        self.state.notice = Some("Stats saved".to_owned());
                        effects.push(Effect::ScheduleIntakeClose { session });
                        if let Some(game_id) = self.state.intake.target_game()
                            && self.state.game_detail.is_open_for(game_id)
                        {
                            self.state.game_detail.loading = true;
                            requests.push(NetworkRequest::LoadGameStats { game_id, generation: self.generation() });
                        }
                        requests.extend(self.request_games_refresh());
                        requests.extend(self.review_reload());
                    }
                    IntakeOutcome::Failed | IntakeOutcome::Ignored => {}
                }
            }
            NetworkResponse::UnverifiedLoaded { result, .. } => self.state.review.loaded(result),
            NetworkResponse::StatVerified { id, result } => {
                let ok = result.is_ok();
                self.state.review.verified(id, result.map(|_| ()));
                if ok {
                    self.state.notice = Some(format!("Stat {id} verified"));
                    requests.extend(self.season_reload());
                }
            }
            NetworkResponse::StatRejected { id, result } => {
                let ok = result.is_ok();
                self.state.review.rejected(id, result.map(|_| ()));
                if ok {
                    self.state.notice = Some(format!("Stat {id} rejected and deleted"));
                    requests.extend(self.season_reload());
                }
            }

            NetworkResponse::LadderLoaded { result, .. } => self.state.ladder.loaded(result),
            NetworkResponse::TeamPositionLoaded { result, .. } => self.state.ladder.own_loaded(result),
            NetworkResponse::LadderUpdated { result } => {
                if self.state.ladder.updated(result) {
                    requests.extend(self.ladder_reload());
                }
            }
            NetworkResponse::FixturesLoaded { result } => self.state.fixtures.loaded(result),
            NetworkResponse::FixturesUpdated { result } => {
                if self.state.fixtures.finished(FixturesAction::Update, result) {
                    requests.extend(self.fixtures_reload());
                }
            }
            NetworkResponse::FixturesSynced { result } => {
                if self.state.fixtures.finished(FixturesAction::Sync, result) {
                    requests.extend(self.fixtures_reload());
                    requests.extend(self.request_games_refresh());
                }
            }

            NetworkResponse::PlayersLoaded { result, .. } => {
                self.state.roster.loaded(result);
                let roster = self.state.roster.players();
                self.state.season.recompute(roster);
            }
            NetworkResponse::PlayerSaved { result } => {
                self.state.submitting = false;
                match result {
                    Ok(player) => {
                        self.state.notice = Some(format!("Saved #{} {}", player.jersey_number, player.name));
                        if self.capabilities().manage_players {
                            self.state.roster.upsert(player);
                            self.state.season.recompute(self.state.roster.players());
                        }
                        self.close_modal();
                    }
                    Err(e) => self.state.modal_error = Some(e),
                }
            }
            NetworkResponse::PlayerActiveSet { id, active, result } => match result {
                Ok(_) => self.state.roster.set_active(id, active),
                Err(e) => self.state.roster.last_error = Some(e),
            },
            NetworkResponse::PlayersMerged { result } => match result {
                Ok(ack) => {
                    self.state.notice = Some(non_empty(ack.message, "Players merged"));
                    self.state.roster.merge_source = None;
                    requests.extend(self.roster_reload());
                    requests.extend(self.season_reload());
                }
                Err(e) => self.state.roster.last_error = Some(e),
            },

            NetworkResponse::UsersLoaded { result, .. } => self.state.users.loaded(result),
            NetworkResponse::ManagerCreated { result } => {
                self.state.submitting = false;
                match result {
                    Ok(user) => {
                        self.state.notice = Some(format!("Created manager {}", user.email));
                        if self.capabilities().manage_users {
                            self.state.users.added(user);
                        }
                        self.close_modal();
                    }
                    Err(e) => self.state.modal_error = Some(e),
                }
            }
            NetworkResponse::UserDeleted { id, result } => match result {
                Ok(_) => self.state.users.removed(id),
                Err(e) => self.state.users.last_error = Some(e),
            },
            NetworkResponse::UserVerified { id, result } => match result {
                Ok(_) => self.state.users.mark_verified(id),
                Err(e) => self.state.users.last_error = Some(e),
            },
        }

        effects.extend(requests.into_iter().map(Effect::Send));
        effects
    }

    pub fn on_intake_auto_close(&mut self, session: u64) {
        if self.state.intake.auto_close(session) && self.state.modal == Some(Modal::Intake) {
            self.state.modal = None;
        }
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn tab_allowed(&self, tab: MenuItem) -> bool {
        let caps = self.capabilities();
        match tab {
            MenuItem::Dashboard | MenuItem::Games | MenuItem::Ladder | MenuItem::Help => true,
            MenuItem::Stats => caps.view_stats,
            MenuItem::Roster => caps.view_roster,
            MenuItem::Review => caps.review_stats,
            MenuItem::Users => caps.manage_users,
        }
    }

    pub fn update_tab(&mut self, next: MenuItem) -> Vec<NetworkRequest> {
        if self.state.active_tab == next {
            return Vec::new();
        }
        if !self.tab_allowed(next) {
            self.state.notice = Some("Sign in with a role that can open this tab (L)".to_owned());
            return Vec::new();
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;

        // Lazily load what the tab shows if it has never been fetched.
        let mut requests = Vec::new();
        match next {
            MenuItem::Stats if self.state.season.rows().is_empty() => {
                requests.extend(self.season_reload());
            }
            MenuItem::Ladder => {
                if self.state.ladder.entries().is_empty() {
                    requests.extend(self.ladder_reload());
                }
                if self.state.fixtures.fixtures().is_empty() {
                    requests.extend(self.fixtures_reload());
                }
            }
            MenuItem::Roster if self.state.roster.players().is_empty() => {
                requests.extend(self.roster_reload());
            }
            MenuItem::Review => requests.extend(self.review_reload()),
            MenuItem::Users if self.state.users.users().is_empty() => {
                requests.extend(self.users_reload());
            }
            _ => {}
        }
        requests
    }

    /// Reload whatever the active tab shows.
    pub fn refresh_active_tab(&mut self) -> Vec<NetworkRequest> {
        let mut requests = Vec::new();
        match self.state.active_tab {
            MenuItem::Dashboard => {
                requests.extend(self.request_games_refresh());
                requests.extend(self.ladder_reload());
                requests.extend(self.fixtures_reload());
            }
            MenuItem::Games => requests.extend(self.request_games_refresh()),
            MenuItem::Stats => requests.extend(self.season_reload()),
            MenuItem::Ladder => {
                requests.extend(self.ladder_reload());
                requests.extend(self.fixtures_reload());
            }
            MenuItem::Roster => requests.extend(self.roster_reload()),
            MenuItem::Review => requests.extend(self.review_reload()),
            MenuItem::Users => requests.extend(self.users_reload()),
            MenuItem::Help => {}
        }
        requests
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn dismiss_notice(&mut self) {
        self.state.notice = None;
        self.state.last_error = None;
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Opens the login modal, or signs out when already signed in.
    pub fn toggle_login(&mut self) -> Vec<NetworkRequest> {
        if self.state.session.is_signed_in() {
            info!("signing out");
            self.state.session.sign_out();
            self.state.clear_private();
            if !self.tab_allowed(self.state.active_tab) {
                self.state.active_tab = MenuItem::Dashboard;
            }
            self.state.notice = Some("Signed out".to_owned());
            return vec![NetworkRequest::Logout];
        }
        self.open_modal(Modal::Login(Form::login()));
        Vec::new()
    }

    pub fn open_registration(&mut self) {
        if matches!(self.state.modal, Some(Modal::Login(_))) {
            self.open_modal(Modal::Register(Form::registration()));
        }
    }

    pub fn resend_verification(&mut self) -> Vec<NetworkRequest> {
        let Some(Modal::Login(form)) = &self.state.modal else {
            return Vec::new();
        };
        match form.required(0) {
            Ok(email) => vec![NetworkRequest::ResendVerification { email: email.to_owned() }],
            Err(e) => {
                self.state.modal_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Modals
    // -----------------------------------------------------------------------

    fn open_modal(&mut self, modal: Modal) {
        self.state.modal = Some(modal);
        self.state.modal_error = None;
    }

    pub fn close_modal(&mut self) {
        match self.state.modal.take() {
            Some(Modal::Intake) => self.state.intake.close(),
            Some(Modal::Confirm(ConfirmAction::RejectStat(_))) => self.state.review.cancel_reject(),
            _ => {}
        }
        self.state.modal_error = None;
        self.state.submitting = false;
    }

    pub fn modal_form_mut(&mut self) -> Option<&mut Form> {
        let state = &mut self.state;
        state.modal.as_mut()?.form_mut(&mut state.intake)
    }

    /// Enter on a modal: the primary action of whatever is open.
    pub fn submit_modal(&mut self) -> Vec<NetworkRequest> {
        let Some(modal) = self.state.modal.clone() else {
            return Vec::new();
        };
        if self.state.submitting {
            return Vec::new();
        }

        let result: Result<Vec<NetworkRequest>, String> = match modal {
            Modal::Login(form) => self.submit_login(&form),
            Modal::Register(form) => submit_registration(&form, Role::Player)
                .map(|registration| vec![NetworkRequest::Register { registration }]),
            Modal::ManagerEditor(form) => submit_registration(&form, Role::Manager)
                .map(|registration| vec![NetworkRequest::CreateManager { registration }]),
            Modal::Intake => Ok(self.intake_primary()),
            Modal::GameEditor { id, form } => form::game_draft(&form)
                .map(|draft| vec![NetworkRequest::SaveGame { id, draft }])
                .map_err(|e| e.to_string()),
            Modal::PlayerEditor { id, form } => form::player_draft(&form)
                .map(|draft| vec![NetworkRequest::SavePlayer { id, draft }])
                .map_err(|e| e.to_string()),
            Modal::Search(form) => {
                self.state.roster.set_query(form.value(0).to_owned());
                self.close_modal();
                Ok(Vec::new())
            }
            Modal::Confirm(action) => Ok(self.confirm(action)),
        };

        match result {
            Ok(requests) => {
                if requests.iter().any(|r| {
                    matches!(
                        r,
                        NetworkRequest::Register { .. }
                            | NetworkRequest::CreateManager { .. }
                            | NetworkRequest::SaveGame { .. }
                            | NetworkRequest::SavePlayer { .. }
                    )
                }) {
                    self.state.submitting = true;
                    self.state.modal_error = None;
                }
                requests
            }
            Err(message) => {
                self.state.modal_error = Some(message);
                Vec::new()
            }
        }
    }

    fn submit_login(&mut self, form: &Form) -> Result<Vec<NetworkRequest>, String> {
        let email = form.required(0).map_err(|e| e.to_string())?.to_owned();
        form.required(1).map_err(|e| e.to_string())?;
        if !self.state.session.begin_sign_in() {
            return Ok(Vec::new());
        }
        self.state.modal_error = None;
        let credentials = Credentials { email, password: form.secret(1) };
        Ok(vec![NetworkRequest::Login { credentials }])
    }

    // -----------------------------------------------------------------------
    // Stats intake
    // -----------------------------------------------------------------------

    pub fn open_intake(&mut self, target_game: Option<GameId>) {
        if !self.capabilities().ingest_stats {
            return;
        }
        self.state.intake.open(target_game);
        self.open_modal(Modal::Intake);
    }

    /// Fetch while nothing is fetched yet, commit once a preview exists.
    fn intake_primary(&mut self) -> Vec<NetworkRequest> {
        let intake = &mut self.state.intake;
        let session = intake.session();
        let has_preview = match intake.stage() {
            IntakeStage::Idle => false,
            IntakeStage::Fetched(_) => true,
            IntakeStage::Committed(_) => return Vec::new(),
        };
        let result = if has_preview { intake.submit_commit() } else { intake.submit_fetch() };
        match result {
            Ok(fetch) => vec![NetworkRequest::FetchExternalStats { session, fetch }],
            Err(e) => {
                debug!("intake action refused: {e}");
                Vec::new()
            }
        }
    }

    /// Fetch again from the current form values, replacing the preview.
    pub fn intake_refetch(&mut self) -> Vec<NetworkRequest> {
        if self.state.modal != Some(Modal::Intake) {
            return Vec::new();
        }
        let session = self.state.intake.session();
        match self.state.intake.submit_fetch() {
            Ok(fetch) => vec![NetworkRequest::FetchExternalStats { session, fetch }],
            Err(e) => {
                debug!("intake re-fetch refused: {e}");
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------------

    fn ask(&mut self, action: ConfirmAction) {
        self.open_modal(Modal::Confirm(action));
    }

    fn confirm(&mut self, action: ConfirmAction) -> Vec<NetworkRequest> {
        self.state.modal = None;
        match action {
            ConfirmAction::RejectStat(_) => self
                .state
                .review
                .confirm_reject()
                .map(|id| NetworkRequest::RejectStat { id })
                .into_iter()
                .collect(),
            ConfirmAction::DeleteGame(id) => vec![NetworkRequest::DeleteGame { id }],
            ConfirmAction::DeleteUser(id) => vec![NetworkRequest::DeleteUser { id }],
            ConfirmAction::MergePlayers { source, target } => {
                vec![NetworkRequest::MergePlayers { source, target }]
            }
        }
    }

    // -----------------------------------------------------------------------
    // Games tab
    // -----------------------------------------------------------------------

    pub fn open_game_detail(&mut self) -> Vec<NetworkRequest> {
        let Some(game_id) = self.state.games.selected_game().map(|g| g.id) else {
            return Vec::new();
        };
        self.state.game_detail.open(game_id);
        if !self.capabilities().view_stats {
            self.state.game_detail.loading = false;
            return Vec::new();
        }
        vec![NetworkRequest::LoadGameStats { game_id, generation: self.generation() }]
    }

    pub fn new_game(&mut self) {
        if self.capabilities().edit_games {
            self.open_modal(Modal::GameEditor { id: None, form: form::game_form(None) });
        }
    }

    pub fn edit_selected_game(&mut self) {
        if !self.capabilities().edit_games {
            return;
        }
        if let Some(game) = self.state.games.selected_game() {
            let id = game.id;
            let form = form::game_form(Some(&GameDraft::from(game)));
            self.open_modal(Modal::GameEditor { id: Some(id), form });
        }
    }

    pub fn delete_selected_game(&mut self) {
        if !self.capabilities().edit_games {
            return;
        }
        if let Some(id) = self.state.games.selected_game().map(|g| g.id) {
            self.ask(ConfirmAction::DeleteGame(id));
        }
    }

    pub fn intake_for_selected_game(&mut self) {
        let target = self
            .state
            .game_detail
            .game_id
            .or_else(|| self.state.games.selected_game().map(|g| g.id));
        self.open_intake(target);
    }

    // -----------------------------------------------------------------------
    // Stats tab
    // -----------------------------------------------------------------------

    pub fn open_player_history(&mut self) -> Vec<NetworkRequest> {
        match self.state.season.selected_row().and_then(|r| r.player_id) {
            Some(player_id) => vec![NetworkRequest::LoadPlayerHistory { player_id, generation: self.generation() }],
            None => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Ladder tab
    // -----------------------------------------------------------------------

    pub fn update_ladder(&mut self) -> Vec<NetworkRequest> {
        if !self.capabilities().edit_games || !self.state.ladder.begin_update() {
            return Vec::new();
        }
        vec![NetworkRequest::UpdateLadder]
    }

    pub fn run_fixtures(&mut self, action: FixturesAction) -> Vec<NetworkRequest> {
        if !self.capabilities().edit_games || !self.state.fixtures.begin(action) {
            return Vec::new();
        }
        vec![match action {
            FixturesAction::Update => NetworkRequest::UpdateFixtures,
            FixturesAction::Sync => NetworkRequest::SyncFixtures,
        }]
    }

    // -----------------------------------------------------------------------
    // Roster tab
    // -----------------------------------------------------------------------

    pub fn open_search(&mut self) {
        let query = self.state.roster.query.clone();
        self.open_modal(Modal::Search(Form::search().with_value(0, query)));
    }

    pub fn new_player(&mut self) {
        if self.capabilities().manage_players {
            self.open_modal(Modal::PlayerEditor { id: None, form: form::player_form(None) });
        }
    }

    pub fn edit_selected_player(&mut self) {
        if !self.capabilities().manage_players {
            return;
        }
        if let Some(player) = self.state.roster.selected_player() {
            let id = player.id;
            let form = form::player_form(Some(player));
            self.open_modal(Modal::PlayerEditor { id: Some(id), form });
        }
    }

    pub fn toggle_selected_player_active(&mut self) -> Vec<NetworkRequest> {
        if !self.capabilities().manage_players {
            return Vec::new();
        }
        match self.state.roster.selected_player() {
            Some(player) => vec![NetworkRequest::SetPlayerActive { id: player.id, active: !player.is_active }],
            None => Vec::new(),
        }
    }

    pub fn merge_step(&mut self) {
        if !self.capabilities().manage_players {
            return;
        }
        if let Some((source, target)) = self.state.roster.merge_step() {
            self.ask(ConfirmAction::MergePlayers { source, target });
        }
    }

    // -----------------------------------------------------------------------
    // Review tab
    // -----------------------------------------------------------------------

    pub fn verify_selected_stat(&mut self) -> Vec<NetworkRequest> {
        let Some(id) = self.state.review.selected_item().map(|s| s.id) else {
            return Vec::new();
        };
        self.state
            .review
            .verify(id)
            .map(|id| NetworkRequest::VerifyStat { id })
            .into_iter()
            .collect()
    }

    pub fn reject_selected_stat(&mut self) {
        let Some(id) = self.state.review.selected_item().map(|s| s.id) else {
            return;
        };
        if self.state.review.request_reject(id) {
            self.ask(ConfirmAction::RejectStat(id));
        }
    }

    // -----------------------------------------------------------------------
    // Users tab
    // -----------------------------------------------------------------------

    pub fn new_manager(&mut self) {
        if self.capabilities().manage_users {
            self.open_modal(Modal::ManagerEditor(Form::manager()));
        }
    }

    pub fn verify_selected_user(&mut self) -> Vec<NetworkRequest> {
        match self.state.users.selected_user() {
            Some(user) if !user.is_verified => vec![NetworkRequest::VerifyUser { id: user.id }],
            _ => Vec::new(),
        }
    }

    pub fn delete_selected_user(&mut self) {
        let own_id = self.state.session.user().map(|u| u.id);
        match self.state.users.selected_user().map(|u| u.id) {
            Some(id) if Some(id) == own_id => {
                self.state.users.last_error = Some("You cannot delete your own account".to_owned());
            }
            Some(id) => self.ask(ConfirmAction::DeleteUser(id)),
            None => {}
        }
    }
}

fn submit_registration(form: &Form, role: Role) -> Result<Registration, String> {
    let name = form.required(0).map_err(|e| e.to_string())?.to_owned();
    let email = form.required(1).map_err(|e| e.to_string())?.to_owned();
    form.required(2).map_err(|e| e.to_string())?;
    let jersey_number = match role {
        Role::Player => form.jersey(3).map_err(|e| e.to_string())?,
        Role::Manager => None,
    };
    Ok(Registration { email, password: form.secret(2), name, role, jersey_number })
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() { fallback.to_owned() } else { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use courtside_api::{
        ExternalStats, Game, Player, PlayerGameStat, PlayerId, StatId, User, UserId, VerificationStatus,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn game(id: i64, day: u32) -> Game {
        Game {
            id: GameId(id),
            opponent_name: format!("Team {id}"),
            scheduled_at: Utc.with_ymd_and_hms(2025, 3, day, 19, 0, 0).unwrap(),
            venue: None,
            final_score: None,
            opponent_score: None,
            video_url: None,
        }
    }

    fn manager() -> User {
        User {
            id: UserId(1),
            email: "coach@club.test".into(),
            name: "Coach".into(),
            role: Role::Manager,
            is_verified: true,
            jersey_number: None,
        }
    }

    fn sends(effects: &[Effect]) -> Vec<&NetworkRequest> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(r) => Some(r),
                Effect::ScheduleIntakeClose { .. } => None,
            })
            .collect()
    }

    fn unverified_stat(id: i64) -> PlayerGameStat {
        PlayerGameStat {
            id: StatId(id),
            game_id: GameId(1),
            player_id: PlayerId(2),
            player: None,
            points: 3,
            fouls: 0,
            verification: VerificationStatus::Unverified,
            source_url: None,
            scraped: true,
        }
    }

    fn signed_in_manager() -> App {
        let mut app = App::new(AppSettings::default());
        app.state.session.signed_in(manager());
        app
    }

    #[test]
    fn startup_loads_games_and_fixtures_once() {
        let mut app = App::new(AppSettings::default());
        let requests = app.startup_requests();
        assert!(matches!(requests.as_slice(), [NetworkRequest::LoadGames, NetworkRequest::LoadFixtures { .. }]));
        assert!(app.request_games_refresh().is_none());
    }

    #[test]
    fn refresh_tick_reclassifies_and_respects_the_guard() {
        let mut app = App::new(AppSettings::default());
        app.request_games_refresh();
        app.on_network_response(NetworkResponse::GamesLoaded { result: Ok(vec![game(1, 11)]) }, now());
        assert_eq!(app.state.games.upcoming().len(), 1);

        let later = Utc.with_ymd_and_hms(2025, 3, 12, 0, 0, 0).unwrap();
        let requests = app.on_refresh_tick(later);
        assert_eq!(app.state.games.completed().len(), 1);
        assert!(matches!(requests.as_slice(), [NetworkRequest::LoadGames]));

        assert!(app.on_refresh_tick(later).is_empty());
    }

    #[test]
    fn games_load_triggers_season_stats_for_signed_in_users() {
        let mut app = signed_in_manager();
        app.request_games_refresh();
        let effects = app.on_network_response(
            NetworkResponse::GamesLoaded { result: Ok(vec![game(1, 1), game(2, 5), game(3, 20)]) },
            now(),
        );
        match sends(&effects).as_slice() {
            [NetworkRequest::LoadSeasonStats { game_ids, .. }] => {
                assert_eq!(game_ids, &vec![GameId(2), GameId(1)]);
            }
            other => panic!("unexpected requests: {other:?}"),
        }
    }

    #[test]
    fn anonymous_users_cannot_open_private_tabs() {
        let mut app = App::new(AppSettings::default());
        assert!(app.update_tab(MenuItem::Review).is_empty());
        assert_eq!(app.state.active_tab, MenuItem::Dashboard);
        assert!(app.state.notice.is_some());

        app.update_tab(MenuItem::Games);
        assert_eq!(app.state.active_tab, MenuItem::Games);
    }

    #[test]
    fn login_success_fans_out_loads_and_closes_the_modal() {
        let mut app = App::new(AppSettings::default());
        app.toggle_login();
        if let Some(Modal::Login(form)) = app.state.modal.as_mut() {
            *form = Form::login().with_value(0, "coach@club.test").with_value(1, "pw");
        }
        let requests = app.submit_modal();
        assert!(matches!(requests.as_slice(), [NetworkRequest::Login { .. }]));
        assert!(app.submit_modal().is_empty());

        let effects = app.on_network_response(NetworkResponse::LoggedIn { result: Ok(manager()) }, now());
        assert!(app.state.modal.is_none());
        let sent = sends(&effects);
        assert!(sent.iter().any(|r| matches!(r, NetworkRequest::LoadGames)));
        assert!(sent.iter().any(|r| matches!(r, NetworkRequest::LoadUnverified { .. })));
        assert!(sent.iter().any(|r| matches!(r, NetworkRequest::LoadUsers { .. })));
        assert!(sent.iter().any(|r| matches!(r, NetworkRequest::LoadTeamPosition { team_name, .. } if team_name == "Skywalkers")));
    }

    #[test]
    fn login_failure_stays_in_the_modal_with_the_message() {
        let mut app = App::new(AppSettings::default());
        app.toggle_login();
        app.state.session.begin_sign_in();
        app.on_network_response(NetworkResponse::LoggedIn { result: Err("Incorrect email or password".into()) }, now());
        assert!(matches!(app.state.modal, Some(Modal::Login(_))));
        assert_eq!(app.state.modal_error.as_deref(), Some("Incorrect email or password"));
        assert!(!app.state.session.is_signing_in());
    }

    #[test]
    fn sign_out_clears_private_state_and_leaves_private_tabs() {
        let mut app = signed_in_manager();
        app.update_tab(MenuItem::Users);
        let requests = app.toggle_login();
        assert!(matches!(requests.as_slice(), [NetworkRequest::Logout]));
        assert_eq!(app.state.active_tab, MenuItem::Dashboard);
        assert!(!app.state.session.is_signed_in());
    }

    #[test]
    fn loads_in_flight_at_sign_out_do_not_refill_private_state() {
        let mut app = signed_in_manager();
        let generation = match app.update_tab(MenuItem::Review).as_slice() {
            [NetworkRequest::LoadUnverified { generation }] => *generation,
            other => panic!("unexpected requests: {other:?}"),
        };
        app.toggle_login();

        let effects = app.on_network_response(
            NetworkResponse::UnverifiedLoaded { generation, result: Ok(vec![unverified_stat(5)]) },
            now(),
        );
        assert!(effects.is_empty());
        assert!(app.state.review.items().is_empty());
    }

    #[test]
    fn a_previous_sessions_roster_does_not_leak_into_the_next() {
        let mut app = signed_in_manager();
        let stale = match app.update_tab(MenuItem::Roster).as_slice() {
            [NetworkRequest::LoadPlayers { include_inactive: true, generation }] => *generation,
            other => panic!("unexpected requests: {other:?}"),
        };
        app.toggle_login();

        let player = User { id: UserId(9), role: Role::Player, ..manager() };
        let effects = app.on_network_response(NetworkResponse::LoggedIn { result: Ok(player) }, now());
        let current = sends(&effects)
            .into_iter()
            .find_map(|r| match r {
                NetworkRequest::LoadPlayers { include_inactive: false, generation } => Some(*generation),
                _ => None,
            })
            .expect("player sign-in loads the roster");
        assert_ne!(stale, current);

        let benched =
            Player { id: PlayerId(3), name: "Old Timer".into(), jersey_number: 1, is_active: false, joined_on: None };
        app.on_network_response(NetworkResponse::PlayersLoaded { generation: stale, result: Ok(vec![benched]) }, now());
        assert!(app.state.roster.players().is_empty());

        let amy = Player { id: PlayerId(2), name: "Amy".into(), jersey_number: 23, is_active: true, joined_on: None };
        app.on_network_response(NetworkResponse::PlayersLoaded { generation: current, result: Ok(vec![amy]) }, now());
        assert_eq!(app.state.roster.players().len(), 1);
    }

    #[test]
    fn intake_enter_fetches_then_commits_then_schedules_close() {
        let mut app = signed_in_manager();
        app.open_intake(Some(GameId(7)));
        app.state.intake.form = Form::intake().with_value(0, "https://league.example/g/7").with_value(1, "abc");

        let requests = app.submit_modal();
        let session = match requests.as_slice() {
            [NetworkRequest::FetchExternalStats { session, fetch }] => {
                assert!(!fetch.persist);
                *session
            }
            other => panic!("unexpected requests: {other:?}"),
        };
        app.on_network_response(
            NetworkResponse::ExternalStatsFetched { session, persist: false, result: Ok(ExternalStats::default()) },
            now(),
        );

        let requests = app.submit_modal();
        assert!(matches!(requests.as_slice(), [NetworkRequest::FetchExternalStats { fetch, .. }] if fetch.persist));

        let effects = app.on_network_response(
            NetworkResponse::ExternalStatsFetched {
                session,
                persist: true,
                result: Ok(ExternalStats { saved: true, ..ExternalStats::default() }),
            },
            now(),
        );
        assert!(effects.iter().any(|e| matches!(e, Effect::ScheduleIntakeClose { session: s } if *s == session)));
        assert!(sends(&effects).iter().any(|r| matches!(r, NetworkRequest::LoadGames)));

        app.on_intake_auto_close(session);
        assert!(app.state.modal.is_none());
        assert!(!app.state.intake.is_open());
    }

    #[test]
    fn rejecting_a_stat_goes_through_confirmation() {
        let mut app = signed_in_manager();
        app.state.review.load();
        app.state.review.loaded(Ok(vec![unverified_stat(5)]));

        app.reject_selected_stat();
        assert!(matches!(app.state.modal, Some(Modal::Confirm(ConfirmAction::RejectStat(_)))));

        app.close_modal();
        assert_eq!(app.state.review.confirming(), None);

        app.reject_selected_stat();
        let requests = app.submit_modal();
        assert!(matches!(requests.as_slice(), [NetworkRequest::RejectStat { id }] if id.0 == 5));
    }

    #[test]
    fn invalid_game_form_reports_inline() {
        let mut app = signed_in_manager();
        app.new_game();
        let requests = app.submit_modal();
        assert!(requests.is_empty());
        assert_eq!(app.state.modal_error.as_deref(), Some("Opponent is required"));
        assert!(!app.state.submitting);
    }
}
