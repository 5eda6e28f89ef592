use crate::state::form::Form;
use courtside_api::{ExternalStats, GameId, StatsFetch};
use log::debug;
use secrecy::SecretString;
use std::fmt;
use std::time::Duration;

/// How long the modal lingers on a successful save before closing itself.
pub const INTAKE_AUTO_CLOSE: Duration = Duration::from_secs(1);

const URL_FIELD: usize = 0;
const CREDENTIAL_FIELD: usize = 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum IntakeStage {
    #[default]
    Idle,
    Fetched(ExternalStats),
    Committed(ExternalStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeCall {
    Fetch,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    MissingUrl,
    MissingCredential,
    NothingFetched,
    NoTargetGame,
    AlreadySaved,
    Busy,
    Closed,
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeError::MissingUrl => write!(f, "URL is required"),
            IntakeError::MissingCredential => write!(f, "Access cookie value is required"),
            IntakeError::NothingFetched => write!(f, "No stats to save: fetch them first"),
            IntakeError::NoTargetGame => write!(f, "No stats to save or no game context"),
            IntakeError::AlreadySaved => write!(f, "These stats are already saved"),
            IntakeError::Busy => write!(f, "A request is already in progress"),
            IntakeError::Closed => write!(f, "The stats intake is not open"),
        }
    }
}

/// Result of applying a commit response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Saved. Refresh dependent data and schedule `auto_close(session)`.
    Committed { session: u64 },
    Failed,
    /// Response for a session that is gone or a call that was not pending.
    Ignored,
}

#[derive(Debug, Clone)]
struct FetchInputs {
    url: String,
    credential: SecretString,
}

/// One stats intake modal session: fetch external stats, review them, then
/// commit them against the target game or discard.
#[derive(Debug, Default)]
pub struct StatsIntake {
    session: u64,
    open: bool,
    target_game: Option<GameId>,
    pub form: Form,
    stage: IntakeStage,
    pending: Option<IntakeCall>,
    error: Option<String>,
    in_flight: Option<FetchInputs>,
    captured: Option<FetchInputs>,
}

impl StatsIntake {
    /// Start a fresh session. Anything left from an earlier one is dropped.
    pub fn open(&mut self, target_game: Option<GameId>) -> u64 {
        let session = self.session + 1;
        *self = Self {
            session,
            open: true,
            target_game,
            form: Form::intake(),
            ..Self::default()
        };
        debug!("stats intake session {session} opened for {target_game:?}");
        session
    }

    pub fn close(&mut self) {
        let session = self.session;
        *self = Self { session, ..Self::default() };
    }

    /// Close only if `session` is still the live one and it ended in a save.
    pub fn auto_close(&mut self, session: u64) -> bool {
        if !self.open || session != self.session || !matches!(self.stage, IntakeStage::Committed(_)) {
            return false;
        }
        self.close();
        true
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn target_game(&self) -> Option<GameId> {
        self.target_game
    }

    pub fn stage(&self) -> &IntakeStage {
        &self.stage
    }

    pub fn pending(&self) -> Option<IntakeCall> {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_commit(&self) -> bool {
        self.pending.is_none()
            && self.target_game.is_some()
            && matches!(self.stage, IntakeStage::Fetched(_))
    }

    fn reject(&mut self, error: IntakeError) -> Result<StatsFetch, IntakeError> {
        self.error = Some(error.to_string());
        Err(error)
    }

    /// Validate the form and produce the preview request. Allowed from
    /// `Idle` and, to re-fetch, from `Fetched`.
    pub fn submit_fetch(&mut self) -> Result<StatsFetch, IntakeError> {
        if !self.open {
            return Err(IntakeError::Closed);
        }
        if self.pending.is_some() {
            return Err(IntakeError::Busy);
        }
        if matches!(self.stage, IntakeStage::Committed(_)) {
            return self.reject(IntakeError::AlreadySaved);
        }

        let url = self.form.value(URL_FIELD).trim().to_owned();
        if url.is_empty() {
            return self.reject(IntakeError::MissingUrl);
        }
        let credential = self.form.value(CREDENTIAL_FIELD).trim().to_owned();
        if credential.is_empty() {
            return self.reject(IntakeError::MissingCredential);
        }

        let inputs = FetchInputs { url, credential: SecretString::new(credential.into_boxed_str()) };
        let request = StatsFetch {
            url: inputs.url.clone(),
            credential: inputs.credential.clone(),
            game_id: self.target_game,
            persist: false,
        };
        self.in_flight = Some(inputs);
        self.pending = Some(IntakeCall::Fetch);
        self.error = None;
        Ok(request)
    }

    /// A failed fetch returns to `Idle`; nothing from it is kept.
    pub fn fetch_completed(&mut self, session: u64, result: Result<ExternalStats, String>) {
        if session != self.session || self.pending != Some(IntakeCall::Fetch) {
            debug!("dropping stale intake fetch for session {session}");
            return;
        }
        self.pending = None;
        let inputs = self.in_flight.take();
        match result {
            Ok(stats) => {
                self.stage = IntakeStage::Fetched(stats);
                self.captured = inputs;
                self.error = None;
            }
            Err(message) => {
                self.stage = IntakeStage::Idle;
                self.captured = None;
                self.error = Some(message);
            }
        }
    }

    /// Resubmit the url and credential that produced the preview, this time
    /// persisting against the target game.
    pub fn submit_commit(&mut self) -> Result<StatsFetch, IntakeError> {
        if !self.open {
            return Err(IntakeError::Closed);
        }
        if self.pending.is_some() {
            return Err(IntakeError::Busy);
        }
        match self.stage {
            IntakeStage::Idle => return self.reject(IntakeError::NothingFetched),
            IntakeStage::Committed(_) => return self.reject(IntakeError::AlreadySaved),
            IntakeStage::Fetched(_) => {}
        }
        let Some(game_id) = self.target_game else {
            return self.reject(IntakeError::NoTargetGame);
        };
        let Some(inputs) = self.captured.as_ref() else {
            return self.reject(IntakeError::NothingFetched);
        };

        let request = StatsFetch {
            url: inputs.url.clone(),
            credential: inputs.credential.clone(),
            game_id: Some(game_id),
            persist: true,
        };
        self.pending = Some(IntakeCall::Commit);
        self.error = None;
        Ok(request)
    }

    /// A failed commit stays in `Fetched` so it can be retried without
    /// fetching again.
    pub fn commit_completed(&mut self, session: u64, result: Result<ExternalStats, String>) -> IntakeOutcome {
        if session != self.session || self.pending != Some(IntakeCall::Commit) {
            debug!("dropping stale intake commit for session {session}");
            return IntakeOutcome::Ignored;
        }
        self.pending = None;
        match result {
            Ok(stats) if stats.saved => {
                self.stage = IntakeStage::Committed(stats);
                self.error = None;
                IntakeOutcome::Committed { session }
            }
            Ok(stats) => {
                self.error = Some(if stats.message.is_empty() {
                    "The server did not save the stats".to_owned()
                } else {
                    stats.message
                });
                IntakeOutcome::Failed
            }
            Err(message) => {
                self.error = Some(message);
                IntakeOutcome::Failed
            }
        }
    }

    /// The source url the preview was fetched from, for display.
    pub fn fetched_from(&self) -> Option<&str> {
        self.captured.as_ref().map(|c| c.url.as_str())
    }

    #[cfg(test)]
    fn captured_credential(&self) -> Option<&str> {
        use secrecy::ExposeSecret;
        self.captured.as_ref().map(|c| c.credential.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_api::ExternalStatLine;
    use secrecy::ExposeSecret;

    fn fill(intake: &mut StatsIntake, url: &str, credential: &str) {
        intake.form = Form::intake().with_value(0, url).with_value(1, credential);
    }

    fn preview(saved: bool) -> ExternalStats {
        ExternalStats {
            message: "ok".into(),
            lines: vec![ExternalStatLine { player_name: "Amy".into(), points: Some(12), fouls: None }],
            raw_content: None,
            saved,
        }
    }

    fn fetched(target: Option<GameId>) -> (StatsIntake, u64) {
        let mut intake = StatsIntake::default();
        let session = intake.open(target);
        fill(&mut intake, "https://league.example/g/7", "abc");
        intake.submit_fetch().unwrap();
        intake.fetch_completed(session, Ok(preview(false)));
        (intake, session)
    }

    #[test]
    fn fetch_requires_url_and_credential() {
        let mut intake = StatsIntake::default();
        intake.open(Some(GameId(7)));

        fill(&mut intake, "  ", "abc");
        assert_eq!(intake.submit_fetch().unwrap_err(), IntakeError::MissingUrl);
        assert_eq!(intake.error(), Some("URL is required"));
        assert_eq!(intake.pending(), None);

        fill(&mut intake, "https://x", "");
        assert_eq!(intake.submit_fetch().unwrap_err(), IntakeError::MissingCredential);
        assert_eq!(intake.stage(), &IntakeStage::Idle);
    }

    #[test]
    fn successful_fetch_moves_to_fetched_with_preview_request() {
        let mut intake = StatsIntake::default();
        let session = intake.open(Some(GameId(7)));
        fill(&mut intake, " https://league.example/g/7 ", " abc ");

        let request = intake.submit_fetch().unwrap();
        assert_eq!(request.url, "https://league.example/g/7");
        assert_eq!(request.credential.expose_secret(), "abc");
        assert!(!request.persist);
        assert_eq!(intake.pending(), Some(IntakeCall::Fetch));
        assert_eq!(intake.submit_fetch().unwrap_err(), IntakeError::Busy);

        intake.fetch_completed(session, Ok(preview(false)));
        assert!(matches!(intake.stage(), IntakeStage::Fetched(s) if s.lines.len() == 1));
        assert_eq!(intake.pending(), None);
        assert!(intake.can_commit());
    }

    #[test]
    fn failed_fetch_returns_to_idle_without_keeping_anything() {
        let mut intake = StatsIntake::default();
        let session = intake.open(Some(GameId(7)));
        fill(&mut intake, "https://x", "abc");
        intake.submit_fetch().unwrap();
        intake.fetch_completed(session, Err("403 from source".into()));

        assert_eq!(intake.stage(), &IntakeStage::Idle);
        assert_eq!(intake.error(), Some("403 from source"));
        assert_eq!(intake.fetched_from(), None);
        assert_eq!(intake.submit_commit().unwrap_err(), IntakeError::NothingFetched);
    }

    #[test]
    fn commit_resubmits_the_captured_inputs_with_persist() {
        let (mut intake, _) = fetched(Some(GameId(7)));
        // Edits after the preview do not change what gets saved.
        fill(&mut intake, "https://elsewhere", "zzz");

        let request = intake.submit_commit().unwrap();
        assert_eq!(request.url, "https://league.example/g/7");
        assert_eq!(request.credential.expose_secret(), "abc");
        assert_eq!(request.game_id, Some(GameId(7)));
        assert!(request.persist);
        assert_eq!(intake.pending(), Some(IntakeCall::Commit));
        assert_eq!(intake.captured_credential(), Some("abc"));
    }

    #[test]
    fn commit_in_idle_is_inert() {
        let mut intake = StatsIntake::default();
        intake.open(Some(GameId(7)));
        assert_eq!(intake.submit_commit().unwrap_err(), IntakeError::NothingFetched);
        assert_eq!(intake.pending(), None);
        assert_eq!(intake.stage(), &IntakeStage::Idle);
    }

    #[test]
    fn commit_without_target_game_is_rejected() {
        let (mut intake, _) = fetched(None);
        assert!(!intake.can_commit());
        assert_eq!(intake.submit_commit().unwrap_err(), IntakeError::NoTargetGame);
        assert_eq!(intake.error(), Some("No stats to save or no game context"));
        assert!(matches!(intake.stage(), IntakeStage::Fetched(_)));
    }

    #[test]
    fn failed_commit_stays_fetched_and_can_retry() {
        let (mut intake, session) = fetched(Some(GameId(7)));
        intake.submit_commit().unwrap();
        assert_eq!(intake.commit_completed(session, Err("database locked".into())), IntakeOutcome::Failed);
        assert!(matches!(intake.stage(), IntakeStage::Fetched(_)));
        assert_eq!(intake.error(), Some("database locked"));

        assert!(intake.submit_commit().is_ok());
    }

    #[test]
    fn unsaved_commit_response_is_a_failure() {
        let (mut intake, session) = fetched(Some(GameId(7)));
        intake.submit_commit().unwrap();
        let outcome = intake.commit_completed(session, Ok(ExternalStats { message: String::new(), ..preview(false) }));
        assert_eq!(outcome, IntakeOutcome::Failed);
        assert_eq!(intake.error(), Some("The server did not save the stats"));
    }

    #[test]
    fn successful_commit_then_auto_close() {
        let (mut intake, session) = fetched(Some(GameId(7)));
        intake.submit_commit().unwrap();
        assert_eq!(
            intake.commit_completed(session, Ok(preview(true))),
            IntakeOutcome::Committed { session }
        );
        assert!(matches!(intake.stage(), IntakeStage::Committed(_)));
        assert_eq!(intake.submit_commit().unwrap_err(), IntakeError::AlreadySaved);

        assert!(intake.auto_close(session));
        assert!(!intake.is_open());
        assert_eq!(intake.stage(), &IntakeStage::Idle);
    }

    #[test]
    fn stale_timer_never_closes_a_newer_session() {
        let (mut intake, old) = fetched(Some(GameId(7)));
        intake.submit_commit().unwrap();
        intake.commit_completed(old, Ok(preview(true)));

        intake.close();
        let new = intake.open(Some(GameId(8)));
        assert_ne!(old, new);
        assert!(!intake.auto_close(old));
        assert!(intake.is_open());
    }

    #[test]
    fn responses_for_a_closed_session_are_ignored() {
        let mut intake = StatsIntake::default();
        let old = intake.open(Some(GameId(7)));
        fill(&mut intake, "https://x", "abc");
        intake.submit_fetch().unwrap();
        intake.close();

        intake.open(Some(GameId(7)));
        intake.fetch_completed(old, Ok(preview(false)));
        assert_eq!(intake.stage(), &IntakeStage::Idle);
        assert_eq!(intake.commit_completed(old, Ok(preview(true))), IntakeOutcome::Ignored);
    }

    #[test]
    fn close_discards_everything() {
        let (mut intake, _) = fetched(Some(GameId(7)));
        intake.close();
        assert!(!intake.is_open());
        assert_eq!(intake.fetched_from(), None);
        assert_eq!(intake.error(), None);
        assert_eq!(intake.submit_fetch().unwrap_err(), IntakeError::Closed);
    }
}
