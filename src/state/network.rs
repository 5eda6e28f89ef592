use crate::state::messages::{NetworkRequest, NetworkResponse, Outcome};
use courtside_api::client::{ApiError, TeamApi};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Owns the REST client and its bearer token. Requests are served one at a
/// time in arrival order.
pub struct NetworkWorker {
    client: TeamApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

fn outcome<T>(what: &str, result: Result<T, ApiError>) -> Outcome<T> {
    result.map_err(|e| {
        error!("{what} failed: {e}");
        e.to_string()
    })
}

impl NetworkWorker {
    pub fn new(
        client: TeamApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let response = self.handle(request).await;

            debug!("network request complete");
            self.stop_loading_animation(!response.is_failure()).await;

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle(&mut self, request: NetworkRequest) -> NetworkResponse {
        match request {
            NetworkRequest::Login { credentials } => {
                debug!("signing in as {}", credentials.email);
                let result = outcome("login", self.client.login(&credentials).await).map(|grant| {
                    self.client.set_token(Some(grant.token));
                    grant.user
                });
                NetworkResponse::LoggedIn { result }
            }
            NetworkRequest::Logout => {
                debug!("dropping bearer token");
                self.client.set_token(None);
                NetworkResponse::LoggedOut
            }
            NetworkRequest::Register { registration } => {
                debug!("registering {}", registration.email);
                let result = outcome("registration", self.client.register(&registration).await);
                NetworkResponse::Registered { result }
            }
            NetworkRequest::ResendVerification { email } => {
                debug!("resending verification to {email}");
                let result = outcome("resend verification", self.client.resend_verification(&email).await);
                NetworkResponse::VerificationResent { result }
            }

            NetworkRequest::LoadGames => {
                debug!("loading games");
                NetworkResponse::GamesLoaded { result: outcome("load games", self.client.list_games().await) }
            }
            NetworkRequest::LoadGameStats { game_id, generation } => {
                debug!("loading stats for game {game_id}");
                let result = outcome("load game stats", self.client.game_stats(game_id).await);
                NetworkResponse::GameStatsLoaded { game_id, generation, result }
            }
            NetworkRequest::SaveGame { id, draft } => {
                debug!("saving game {id:?}");
                let result = match id {
                    Some(id) => self.client.update_game(id, &draft).await,
                    None => self.client.create_game(&draft).await,
                };
                NetworkResponse::GameSaved { result: outcome("save game", result) }
            }
            NetworkRequest::DeleteGame { id } => {
                debug!("deleting game {id}");
                let result = outcome("delete game", self.client.delete_game(id).await);
                NetworkResponse::GameDeleted { id, result }
            }

            NetworkRequest::LoadSeasonStats { game_ids, generation } => {
                debug!("loading season stats for {} games", game_ids.len());
                let mut per_game = Vec::with_capacity(game_ids.len());
                for game_id in game_ids {
                    let result = outcome("load game stats", self.client.game_stats(game_id).await);
                    per_game.push((game_id, result));
                }
                NetworkResponse::SeasonStatsLoaded { generation, per_game }
            }
            NetworkRequest::LoadPlayerHistory { player_id, generation } => {
                debug!("loading stat history for player {player_id}");
                let result = outcome("load player stats", self.client.player_stats(player_id).await);
                NetworkResponse::PlayerHistoryLoaded { player_id, generation, result }
            }
            NetworkRequest::FetchExternalStats { session, fetch } => {
                debug!(
                    "fetching external stats from {} (persist: {}, game: {:?})",
                    fetch.url, fetch.persist, fetch.game_id
                );
                let result = outcome("fetch external stats", self.client.fetch_external_stats(&fetch).await);
                NetworkResponse::ExternalStatsFetched { session, persist: fetch.persist, result }
            }
            NetworkRequest::LoadUnverified { generation } => {
                debug!("loading unverified stats");
                let result = outcome("load unverified stats", self.client.unverified_stats().await);
                NetworkResponse::UnverifiedLoaded { generation, result }
            }
            NetworkRequest::VerifyStat { id } => {
                debug!("verifying stat {id}");
                NetworkResponse::StatVerified { id, result: outcome("verify stat", self.client.verify_stat(id).await) }
            }
            NetworkRequest::RejectStat { id } => {
                debug!("rejecting stat {id}");
                NetworkResponse::StatRejected { id, result: outcome("reject stat", self.client.reject_stat(id).await) }
            }

            NetworkRequest::LoadLadder { limit, generation } => {
                debug!("loading ladder (top {limit})");
                let result = outcome("load ladder", self.client.ladder(limit).await);
                NetworkResponse::LadderLoaded { generation, result }
            }
            NetworkRequest::LoadTeamPosition { team_name, generation } => {
                debug!("loading ladder position for {team_name}");
                let result = outcome("load team position", self.client.team_position(&team_name).await);
                NetworkResponse::TeamPositionLoaded { generation, result }
            }
            NetworkRequest::UpdateLadder => {
                debug!("requesting ladder update");
                let result = outcome("update ladder", self.client.refresh_ladder(None).await);
                NetworkResponse::LadderUpdated { result }
            }
            NetworkRequest::LoadFixtures { limit } => {
                debug!("loading fixtures (next {limit})");
                NetworkResponse::FixturesLoaded { result: outcome("load fixtures", self.client.fixtures(limit).await) }
            }
            NetworkRequest::UpdateFixtures => {
                debug!("requesting fixtures update");
                let result = outcome("update fixtures", self.client.refresh_fixtures().await);
                NetworkResponse::FixturesUpdated { result }
            }
            NetworkRequest::SyncFixtures => {
                debug!("syncing fixtures with games");
                let result = outcome("sync fixtures", self.client.sync_fixtures().await);
                NetworkResponse::FixturesSynced { result }
            }

            NetworkRequest::LoadPlayers { include_inactive, generation } => {
                debug!("loading players (inactive: {include_inactive})");
                let result = outcome("load players", self.client.list_players(include_inactive).await);
                NetworkResponse::PlayersLoaded { generation, result }
            }
            NetworkRequest::SavePlayer { id, draft } => {
                debug!("saving player {id:?}");
                let result = match id {
                    Some(id) => self.client.update_player(id, &draft).await,
                    None => self.client.create_player(&draft).await,
                };
                NetworkResponse::PlayerSaved { result: outcome("save player", result) }
            }
            NetworkRequest::SetPlayerActive { id, active } => {
                debug!("setting player {id} active={active}");
                let result = outcome("set player active", self.client.set_player_active(id, active).await);
                NetworkResponse::PlayerActiveSet { id, active, result }
            }
            NetworkRequest::MergePlayers { source, target } => {
                debug!("merging player {source} into {target}");
                let result = outcome("merge players", self.client.merge_players(source, target).await);
                NetworkResponse::PlayersMerged { result }
            }

            NetworkRequest::LoadUsers { generation } => {
                debug!("loading users");
                let result = outcome("load users", self.client.list_users().await);
                NetworkResponse::UsersLoaded { generation, result }
            }
            NetworkRequest::CreateManager { registration } => {
                debug!("creating manager {}", registration.email);
                let result = outcome("create manager", self.client.create_manager(&registration).await);
                NetworkResponse::ManagerCreated { result }
            }
            NetworkRequest::DeleteUser { id } => {
                debug!("deleting user {id}");
                NetworkResponse::UserDeleted { id, result: outcome("delete user", self.client.delete_user(id).await) }
            }
            NetworkRequest::VerifyUser { id } => {
                debug!("verifying user {id}");
                NetworkResponse::UserVerified { id, result: outcome("verify user", self.client.verify_user(id).await) }
            }
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
