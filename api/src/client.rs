use crate::wire::{
    ErrorBody, FetchStatsBody, GameBody, LadderUpdateBody, LoginBody, MergeBody, PlayerBody,
    RegisterBody, WireAuthResponse, WireFetchStatsResponse, WireFixture, WireFixturesResponse,
    WireGame, WireLadderEntry, WireMessage, WirePlayer, WireStat, WireUser,
};
use crate::{
    Acknowledgement, AuthGrant, Credentials, ExternalStatLine, ExternalStats, Fixture, Game,
    GameDraft, GameId, LadderEntry, Player, PlayerDraft, PlayerGameStat, PlayerId, PlayerRef,
    Registration, Role, StatId, StatsFetch, User, UserId, VerificationStatus,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// REST client for the team service. Every request carries the bearer token
/// once one has been set.
#[derive(Debug)]
pub struct TeamApi {
    client: Client,
    base_url: Url,
    timeout: Duration,
    token: Option<SecretString>,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api { status: u16, url: String, detail: String },
    Parsing(reqwest::Error, String),
    Unauthorized(String),
    NotFound(String),
    Invalid(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api { status, detail, .. } => write!(f, "{detail} (HTTP {status})"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Unauthorized(msg) => write!(f, "Not authorized: {msg}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Invalid(msg) => write!(f, "Invalid data: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        let detail = detail_message(body)
            .or_else(|| status.canonical_reason().map(str::to_owned))
            .unwrap_or_else(|| "request failed".to_owned());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(detail),
            StatusCode::NOT_FOUND => ApiError::NotFound(detail),
            _ => ApiError::Api { status: status.as_u16(), url: url.to_owned(), detail },
        }
    }
}

impl TeamApi {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Invalid(format!("base url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Invalid(format!("base url {base_url} cannot carry a path")));
        }
        Ok(Self {
            client: Client::builder()
                .user_agent("courtside/0.1 (terminal team dashboard)")
                .build()
                .unwrap_or_default(),
            base_url,
            timeout: Duration::from_secs(10),
            token: None,
        })
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn set_token(&mut self, token: Option<SecretString>) {
        self.token = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthGrant> {
        let url = self.url(&["auth", "login"])?;
        let body = LoginBody {
            email: credentials.email.trim(),
            password: credentials.password.expose_secret(),
        };
        let raw: WireAuthResponse = self.send_json(Method::POST, &url, &body).await?;
        Ok(AuthGrant {
            token: SecretString::new(raw.access_token.into_boxed_str()),
            user: map_user(raw.user)?,
        })
    }

    pub async fn register(&self, registration: &Registration) -> ApiResult<User> {
        let url = self.url(&["auth", "register"])?;
        let raw: WireUser = self.send_json(Method::POST, &url, &register_body(registration)).await?;
        map_user(raw)
    }

    pub async fn verify_email(&self, token: &str) -> ApiResult<Acknowledgement> {
        let mut url = self.url(&["auth", "verify-email"])?;
        url.query_pairs_mut().append_pair("token", token);
        self.send_ack(self.request(Method::POST, &url), &url).await
    }

    pub async fn resend_verification(&self, email: &str) -> ApiResult<Acknowledgement> {
        let mut url = self.url(&["auth", "resend-verification"])?;
        url.query_pairs_mut().append_pair("email", email.trim());
        self.send_ack(self.request(Method::POST, &url), &url).await
    }

    // -----------------------------------------------------------------------
    // Games
    // -----------------------------------------------------------------------

    pub async fn list_games(&self) -> ApiResult<Vec<Game>> {
        let url = self.url(&["games"])?;
        let raw: Vec<WireGame> = self.send(self.request(Method::GET, &url), &url).await?;
        raw.into_iter().map(map_game).collect()
    }

    pub async fn get_game(&self, id: GameId) -> ApiResult<Game> {
        let id = id.to_string();
        let url = self.url(&["games", &id])?;
        let raw: WireGame = self.send(self.request(Method::GET, &url), &url).await?;
        map_game(raw)
    }

    pub async fn create_game(&self, draft: &GameDraft) -> ApiResult<Game> {
        let url = self.url(&["games"])?;
        let raw: WireGame = self.send_json(Method::POST, &url, &game_body(draft)).await?;
        map_game(raw)
    }

    pub async fn update_game(&self, id: GameId, draft: &GameDraft) -> ApiResult<Game> {
        let id = id.to_string();
        let url = self.url(&["games", &id])?;
        let raw: WireGame = self.send_json(Method::PUT, &url, &game_body(draft)).await?;
        map_game(raw)
    }

    pub async fn delete_game(&self, id: GameId) -> ApiResult<Acknowledgement> {
        let id = id.to_string();
        let url = self.url(&["games", &id])?;
        self.send_ack(self.request(Method::DELETE, &url), &url).await
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Active players only, unless `include_inactive` (manager endpoint).
    pub async fn list_players(&self, include_inactive: bool) -> ApiResult<Vec<Player>> {
        let url = if include_inactive {
            self.url(&["admin", "players"])?
        } else {
            self.url(&["players"])?
        };
        let raw: Vec<WirePlayer> = self.send(self.request(Method::GET, &url), &url).await?;
        Ok(raw.into_iter().map(map_player).collect())
    }

    pub async fn create_player(&self, draft: &PlayerDraft) -> ApiResult<Player> {
        let url = self.url(&["admin", "players"])?;
        let raw: WirePlayer = self.send_json(Method::POST, &url, &player_body(draft)?).await?;
        Ok(map_player(raw))
    }

    pub async fn update_player(&self, id: PlayerId, draft: &PlayerDraft) -> ApiResult<Player> {
        let id = id.to_string();
        let url = self.url(&["admin", "players", &id])?;
        let raw: WirePlayer = self.send_json(Method::PUT, &url, &player_body(draft)?).await?;
        Ok(map_player(raw))
    }

    pub async fn set_player_active(&self, id: PlayerId, active: bool) -> ApiResult<Acknowledgement> {
        let id = id.to_string();
        let action = if active { "activate" } else { "deactivate" };
        let url = self.url(&["admin", "players", &id, action])?;
        self.send_ack(self.request(Method::PUT, &url), &url).await
    }

    /// Moves all stats of `source` onto `target` and deactivates `source`.
    pub async fn merge_players(&self, source: PlayerId, target: PlayerId) -> ApiResult<Acknowledgement> {
        let url = self.url(&["admin", "players", "merge"])?;
        let body = MergeBody { source_player_id: source.0, target_player_id: target.0 };
        let builder = self.request(Method::POST, &url).json(&body);
        self.send_ack(builder, &url).await
    }

    // -----------------------------------------------------------------------
    // Users (manager only)
    // -----------------------------------------------------------------------

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let url = self.url(&["admin", "users"])?;
        let raw: Vec<WireUser> = self.send(self.request(Method::GET, &url), &url).await?;
        raw.into_iter().map(map_user).collect()
    }

    pub async fn create_manager(&self, registration: &Registration) -> ApiResult<User> {
        let url = self.url(&["admin", "create-manager"])?;
        let raw: WireUser = self.send_json(Method::POST, &url, &register_body(registration)).await?;
        map_user(raw)
    }

    pub async fn delete_user(&self, id: UserId) -> ApiResult<Acknowledgement> {
        let id = id.to_string();
        let url = self.url(&["admin", "users", &id])?;
        self.send_ack(self.request(Method::DELETE, &url), &url).await
    }

    pub async fn verify_user(&self, id: UserId) -> ApiResult<Acknowledgement> {
        let id = id.to_string();
        let url = self.url(&["admin", "users", &id, "verify"])?;
        self.send_ack(self.request(Method::PUT, &url), &url).await
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub async fn game_stats(&self, game_id: GameId) -> ApiResult<Vec<PlayerGameStat>> {
        let id = game_id.to_string();
        let url = self.url(&["stats", "game", &id])?;
        let raw: Vec<WireStat> = self.send(self.request(Method::GET, &url), &url).await?;
        Ok(raw.into_iter().map(map_stat).collect())
    }

    pub async fn player_stats(&self, player_id: PlayerId) -> ApiResult<Vec<PlayerGameStat>> {
        let id = player_id.to_string();
        let url = self.url(&["stats", "player", &id])?;
        let raw: Vec<WireStat> = self.send(self.request(Method::GET, &url), &url).await?;
        Ok(raw.into_iter().map(map_stat).collect())
    }

    /// Scrape an external stats page through the server. With `persist` set
    /// the server also stores the lines against `game_id`.
    pub async fn fetch_external_stats(&self, fetch: &StatsFetch) -> ApiResult<ExternalStats> {
        if fetch.persist && fetch.game_id.is_none() {
            return Err(ApiError::Invalid("a target game is required to save stats".into()));
        }
        let url = self.url(&["stats", "fetch-game-stats"])?;
        let body = FetchStatsBody {
            url: fetch.url.trim(),
            cookies: fetch.credential.expose_secret().trim(),
            game_id: fetch.game_id.map(|id| id.0),
            save_to_db: fetch.persist,
        };
        let raw: WireFetchStatsResponse = self.send_json(Method::POST, &url, &body).await?;
        Ok(map_external_stats(raw))
    }

    pub async fn unverified_stats(&self) -> ApiResult<Vec<PlayerGameStat>> {
        let url = self.url(&["stats", "unverified"])?;
        let raw: Vec<WireStat> = self.send(self.request(Method::GET, &url), &url).await?;
        Ok(raw.into_iter().map(map_stat).collect())
    }

    pub async fn verify_stat(&self, id: StatId) -> ApiResult<Acknowledgement> {
        let id = id.to_string();
        let url = self.url(&["stats", &id, "verify"])?;
        self.send_ack(self.request(Method::PUT, &url), &url).await
    }

    /// Permanently deletes the record.
    pub async fn reject_stat(&self, id: StatId) -> ApiResult<Acknowledgement> {
        let id = id.to_string();
        let url = self.url(&["stats", &id, "reject"])?;
        self.send_ack(self.request(Method::DELETE, &url), &url).await
    }

    // -----------------------------------------------------------------------
    // Ladder / fixtures
    // -----------------------------------------------------------------------

    pub async fn ladder(&self, limit: usize) -> ApiResult<Vec<LadderEntry>> {
        let mut url = self.url(&["ladder"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let raw: Vec<WireLadderEntry> = self.send(self.request(Method::GET, &url), &url).await?;
        let mut entries: Vec<LadderEntry> = raw.into_iter().map(map_ladder_entry).collect();
        entries.sort_by_key(|e| e.position);
        Ok(entries)
    }

    pub async fn team_position(&self, team_name: &str) -> ApiResult<LadderEntry> {
        let url = self.url(&["ladder", "team", team_name])?;
        let raw: WireLadderEntry = self.send(self.request(Method::GET, &url), &url).await?;
        Ok(map_ladder_entry(raw))
    }

    /// Ask the server to re-scrape the ladder. Only an acknowledgement comes back.
    pub async fn refresh_ladder(&self, source_url: Option<&str>) -> ApiResult<Acknowledgement> {
        let url = self.url(&["ladder", "update"])?;
        let body = LadderUpdateBody { url: source_url };
        let builder = self.request(Method::POST, &url).json(&body);
        self.send_ack(builder, &url).await
    }

    pub async fn fixtures(&self, limit: usize) -> ApiResult<Vec<Fixture>> {
        let mut url = self.url(&["fixtures"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let raw: WireFixturesResponse = self.send(self.request(Method::GET, &url), &url).await?;
        raw.fixtures.into_iter().map(map_fixture).collect()
    }

    pub async fn refresh_fixtures(&self) -> ApiResult<Acknowledgement> {
        let url = self.url(&["fixtures", "update"])?;
        self.send_ack(self.request(Method::POST, &url), &url).await
    }

    pub async fn sync_fixtures(&self) -> ApiResult<Acknowledgement> {
        let url = self.url(&["fixtures", "sync-with-games"])?;
        self.send_ack(self.request(Method::POST, &url), &url).await
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Invalid(format!("base url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone()).timeout(self.timeout);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send_json<T, B>(&self, method: Method, url: &Url, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(method, url).json(body), url).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, url: &Url) -> ApiResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, url.as_str(), &body))
    }

    /// Trigger-style endpoints may answer with an empty body or with an
    /// object that is not a plain message; both count as acknowledged.
    async fn send_ack(&self, builder: RequestBuilder, url: &Url) -> ApiResult<Acknowledgement> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, url.as_str(), &body));
        }

        let message = serde_json::from_str::<WireMessage>(&body)
            .map(|m| m.message)
            .unwrap_or_default();
        Ok(Acknowledgement { message })
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

fn game_body(draft: &GameDraft) -> GameBody<'_> {
    GameBody {
        opponent_name: draft.opponent_name.trim(),
        datetime: draft.scheduled_at.to_rfc3339(),
        date: draft.scheduled_at.date_naive().to_string(),
        venue: draft.venue.as_deref(),
        final_score_skywalkers: draft.final_score,
        final_score_opponent: draft.opponent_score,
        video_url: draft.video_url.as_deref(),
    }
}

fn player_body(draft: &PlayerDraft) -> ApiResult<PlayerBody<'_>> {
    if !Player::jersey_in_range(u32::from(draft.jersey_number)) {
        return Err(ApiError::Invalid(format!(
            "jersey number {} is outside 0-{}",
            draft.jersey_number,
            Player::MAX_JERSEY
        )));
    }
    Ok(PlayerBody { name: draft.name.trim(), jersey_number: draft.jersey_number })
}

fn register_body(registration: &Registration) -> RegisterBody<'_> {
    RegisterBody {
        email: registration.email.trim(),
        password: registration.password.expose_secret(),
        name: registration.name.trim(),
        role: match registration.role {
            Role::Manager => "manager",
            Role::Player => "player",
        },
        jersey_number: registration.jersey_number,
    }
}

// ---------------------------------------------------------------------------
// Mapping: wire types → clean domain types
// ---------------------------------------------------------------------------

fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            if messages.is_empty() { None } else { Some(messages.join("; ")) }
        }
        other => Some(other.to_string()),
    }
}

/// Accepts RFC 3339, naive ISO-8601 date-times (taken as UTC) and bare dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn map_game(raw: WireGame) -> ApiResult<Game> {
    let scheduled_at = raw
        .datetime
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| raw.date.as_deref().and_then(parse_timestamp))
        .ok_or_else(|| ApiError::Invalid(format!("game {} has no usable date", raw.id)))?;

    Ok(Game {
        id: GameId(raw.id),
        opponent_name: raw.opponent_name,
        scheduled_at,
        venue: raw.venue.filter(|v| !v.trim().is_empty()),
        final_score: raw.final_score_skywalkers,
        opponent_score: raw.final_score_opponent,
        video_url: raw.video_url.filter(|v| !v.trim().is_empty()),
    })
}

fn parse_role(raw: &str) -> Option<Role> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "manager" => Some(Role::Manager),
        "player" => Some(Role::Player),
        _ => None,
    }
}

fn map_user(raw: WireUser) -> ApiResult<User> {
    let role = parse_role(&raw.role)
        .ok_or_else(|| ApiError::Invalid(format!("user {} has unknown role {:?}", raw.id, raw.role)))?;
    Ok(User {
        id: UserId(raw.id),
        email: raw.email,
        name: raw.name,
        role,
        is_verified: raw.is_verified.map(|f| f.is_set()).unwrap_or(false),
        jersey_number: raw.jersey_number,
    })
}

fn map_player(raw: WirePlayer) -> Player {
    let user_name = raw.user.as_ref().map(|u| u.name.clone());
    let user_jersey = raw.user.as_ref().and_then(|u| u.jersey_number);
    Player {
        id: PlayerId(raw.id),
        name: raw
            .name
            .or(user_name)
            .unwrap_or_else(|| format!("Player #{}", raw.id)),
        jersey_number: raw.jersey_number.or(user_jersey).unwrap_or_default(),
        is_active: raw.is_active.map(|f| f.is_set()).unwrap_or(true),
        joined_on: raw
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .map(|dt| dt.date_naive()),
    }
}

fn map_player_ref(raw: &WirePlayer) -> Option<PlayerRef> {
    let name = raw
        .name
        .clone()
        .or_else(|| raw.user.as_ref().map(|u| u.name.clone()))?;
    Some(PlayerRef {
        id: Some(PlayerId(raw.id)),
        name,
        jersey_number: raw
            .jersey_number
            .or_else(|| raw.user.as_ref().and_then(|u| u.jersey_number)),
    })
}

/// An explicit status wins; otherwise the verified flag; otherwise scraped
/// records are pending and hand-entered ones count as verified.
fn map_verification(raw: &WireStat, scraped: bool) -> VerificationStatus {
    if let Some(status) = raw.verification_status.as_deref() {
        match status.trim().to_ascii_lowercase().as_str() {
            "verified" => return VerificationStatus::Verified,
            "rejected" => return VerificationStatus::Rejected,
            "unverified" | "pending" => return VerificationStatus::Unverified,
            _ => {}
        }
    }
    match raw.is_verified {
        Some(flag) if flag.is_set() => VerificationStatus::Verified,
        Some(_) => VerificationStatus::Unverified,
        None if scraped => VerificationStatus::Unverified,
        None => VerificationStatus::Verified,
    }
}

fn map_stat(raw: WireStat) -> PlayerGameStat {
    let scraped = raw
        .is_scraped
        .map(|f| f.is_set())
        .unwrap_or(raw.scrape_source.is_some());
    PlayerGameStat {
        id: StatId(raw.id),
        game_id: GameId(raw.game_id),
        player_id: PlayerId(raw.player_id),
        player: raw.player.as_ref().and_then(map_player_ref),
        points: raw.points,
        fouls: raw.fouls,
        verification: map_verification(&raw, scraped),
        source_url: raw.scrape_source.clone().filter(|s| !s.trim().is_empty()),
        scraped,
    }
}

fn non_negative(value: i64) -> Option<u32> {
    u32::try_from(value).ok()
}

fn map_external_stats(raw: WireFetchStatsResponse) -> ExternalStats {
    let data = raw.data.unwrap_or_default();
    let lines = data
        .player_stats
        .into_iter()
        .map(|(player_name, line)| ExternalStatLine {
            player_name: player_name.trim().trim_end_matches(':').trim().to_owned(),
            points: non_negative(line.points),
            fouls: non_negative(line.fouls),
        })
        .collect();
    ExternalStats {
        message: raw.message,
        lines,
        raw_content: data.raw_content.filter(|c| !c.is_empty()),
        saved: data.saved_to_db,
    }
}

fn map_ladder_entry(raw: WireLadderEntry) -> LadderEntry {
    LadderEntry {
        position: raw.position,
        team_name: raw.team_name,
        wins: raw.wins,
        draws: raw.draws,
        losses: raw.losses,
        points_for: raw.points_for,
        points_against: raw.points_against,
        win_percentage: raw.win_percentage,
        games_played: raw.games_played,
        season: raw.season,
        division: raw.division,
        last_updated: raw.last_updated.as_deref().and_then(parse_timestamp),
    }
}

fn map_fixture(raw: WireFixture) -> ApiResult<Fixture> {
    let scheduled_at = raw
        .datetime
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| raw.date.as_deref().and_then(parse_timestamp))
        .ok_or_else(|| ApiError::Invalid(format!("fixture {} has no usable date", raw.id)))?;
    Ok(Fixture {
        id: GameId(raw.id),
        opponent_name: raw.opponent_name,
        scheduled_at,
        venue: raw.venue,
        is_today: raw.is_today,
        days_until: raw.days_until,
        has_scores: raw.has_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_owned().into_boxed_str())
    }

    async fn api(server: &mockito::ServerGuard) -> TeamApi {
        TeamApi::new(&server.url()).unwrap().with_token(secret("tok-123"))
    }

    #[test]
    fn timestamps_accept_offsets_naive_values_and_bare_dates() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 4, 19, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-04T19:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T21:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T19:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T19:30:00.000"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-04"),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn error_detail_is_extracted_from_string_and_validation_lists() {
        assert_eq!(detail_message(r#"{"detail":"URL is required"}"#).as_deref(), Some("URL is required"));
        assert_eq!(
            detail_message(r#"{"detail":[{"msg":"field required"},{"msg":"bad date"}]}"#).as_deref(),
            Some("field required; bad date")
        );
        assert_eq!(detail_message("<html>oops</html>"), None);
    }

    #[test]
    fn verification_falls_back_to_flags_and_provenance() {
        let raw: WireStat = serde_json::from_str(
            r#"{"id":1,"game_id":2,"player_id":3,"points":4,"fouls":1,"scrape_source":"https://x"}"#,
        )
        .unwrap();
        let stat = map_stat(raw);
        assert!(stat.scraped);
        assert_eq!(stat.verification, VerificationStatus::Unverified);

        let raw: WireStat = serde_json::from_str(
            r#"{"id":1,"game_id":2,"user_id":3,"points":4,"fouls":1}"#,
        )
        .unwrap();
        let stat = map_stat(raw);
        assert_eq!(stat.player_id, PlayerId(3));
        assert_eq!(stat.verification, VerificationStatus::Verified);

        let raw: WireStat = serde_json::from_str(
            r#"{"id":1,"game_id":2,"player_id":3,"is_verified":1,"verification_status":"rejected"}"#,
        )
        .unwrap();
        assert_eq!(map_stat(raw).verification, VerificationStatus::Rejected);
    }

    #[tokio::test]
    async fn list_games_sends_bearer_token_and_maps_both_date_shapes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/games")
            .match_header("authorization", "Bearer tok-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id":1,"opponent_name":"Comets","datetime":"2025-03-04T19:30:00Z",
                     "final_score_skywalkers":61,"final_score_opponent":55,"venue":""},
                    {"id":2,"opponent_name":"Rockets","date":"2025-04-01"}
                ]"#,
            )
            .create_async()
            .await;

        let games = api(&server).await.list_games().await.unwrap();
        mock.assert_async().await;

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, GameId(1));
        assert!(games[0].is_completed());
        assert_eq!(games[0].venue, None);
        assert_eq!(
            games[1].scheduled_at,
            Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()
        );
        assert!(!games[1].is_completed());
    }

    #[tokio::test]
    async fn server_detail_surfaces_in_the_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/stats/fetch-game-stats")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"URL is required"}"#)
            .create_async()
            .await;

        let fetch = StatsFetch {
            url: " ".into(),
            credential: secret("cookie"),
            game_id: None,
            persist: false,
        };
        let err = api(&server).await.fetch_external_stats(&fetch).await.unwrap_err();
        match &err {
            ApiError::Api { status, detail, .. } => {
                assert_eq!(*status, 400);
                assert_eq!(detail, "URL is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("URL is required"));
    }

    #[tokio::test]
    async fn unauthorized_and_not_found_are_distinguished() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/users")
            .with_status(403)
            .with_body(r#"{"detail":"Manager access required"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/games/9")
            .with_status(404)
            .with_body(r#"{"detail":"Game not found"}"#)
            .create_async()
            .await;

        let api = api(&server).await;
        assert!(matches!(api.list_users().await, Err(ApiError::Unauthorized(m)) if m == "Manager access required"));
        assert!(matches!(api.get_game(GameId(9)).await, Err(ApiError::NotFound(m)) if m == "Game not found"));
    }

    #[tokio::test]
    async fn fetch_external_stats_sends_credential_and_maps_missing_columns() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/stats/fetch-game-stats")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "url": "https://league.example/game/7",
                "cookies": "abc",
                "game_id": 7,
                "save_to_db": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"message":"Stats fetched and saved to database successfully",
                    "data":{"success":true,"saved_to_db":true,
                            "player_stats":{"Zed:":{"points":12,"fouls":2},"Amy":{"points":-1,"fouls":3}}}}"#,
            )
            .create_async()
            .await;

        let fetch = StatsFetch {
            url: "https://league.example/game/7".into(),
            credential: secret(" abc "),
            game_id: Some(GameId(7)),
            persist: true,
        };
        let stats = api(&server).await.fetch_external_stats(&fetch).await.unwrap();
        mock.assert_async().await;

        assert!(stats.saved);
        assert_eq!(stats.lines.len(), 2);
        assert_eq!(stats.lines[0].player_name, "Amy");
        assert_eq!(stats.lines[0].points, None);
        assert_eq!(stats.lines[0].fouls, Some(3));
        assert_eq!(stats.lines[1].player_name, "Zed");
        assert_eq!(stats.lines[1].points, Some(12));
    }

    #[tokio::test]
    async fn persisting_without_a_game_never_hits_the_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/stats/fetch-game-stats")
            .expect(0)
            .create_async()
            .await;

        let fetch = StatsFetch {
            url: "https://league.example/game/7".into(),
            credential: secret("abc"),
            game_id: None,
            persist: true,
        };
        let err = api(&server).await.fetch_external_stats(&fetch).await.unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reject_uses_delete_and_tolerates_empty_bodies() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/stats/42/reject")
            .with_status(204)
            .create_async()
            .await;

        let ack = api(&server).await.reject_stat(StatId(42)).await.unwrap();
        mock.assert_async().await;
        assert_eq!(ack.message, "");
    }

    #[tokio::test]
    async fn ladder_is_ordered_by_position_and_team_names_are_encoded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ladder")
            .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"position":2,"team_name":"Comets","wins":5,"losses":2,"win_percentage":0.714},
                    {"position":1,"team_name":"Skywalkers","wins":6,"losses":1,"win_percentage":0.857,
                     "last_updated":"2025-03-04T10:00:00"}]"#,
            )
            .create_async()
            .await;
        let team = server
            .mock("GET", "/ladder/team/Red%20Dragons")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"position":3,"team_name":"Red Dragons"}"#)
            .create_async()
            .await;

        let api = api(&server).await;
        let ladder = api.ladder(10).await.unwrap();
        assert_eq!(ladder[0].team_name, "Skywalkers");
        assert!(ladder[0].last_updated.is_some());
        assert_eq!(ladder[1].position, 2);
        assert!((ladder[1].win_percentage - 0.714).abs() < 1e-9);

        let entry = api.team_position("Red Dragons").await.unwrap();
        team.assert_async().await;
        assert_eq!(entry.position, 3);
        assert_eq!(entry.wins, 0);
    }

    #[tokio::test]
    async fn login_returns_grant_without_sending_a_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::PartialJson(serde_json::json!({"email": "coach@club.test"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"jwt-abc","token_type":"bearer",
                    "user":{"id":1,"email":"coach@club.test","name":"Coach","role":"MANAGER","is_verified":true}}"#,
            )
            .create_async()
            .await;

        let api = TeamApi::new(&server.url()).unwrap();
        let grant = api
            .login(&Credentials { email: " coach@club.test ".into(), password: secret("pw") })
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(grant.token.expose_secret(), "jwt-abc");
        assert_eq!(grant.user.role, Role::Manager);
        assert!(grant.user.is_verified);
    }

    #[tokio::test]
    async fn players_accept_integer_flags_and_legacy_user_names() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/players")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":1,"name":"Amy","jersey_number":7,"is_active":0,"created_at":"2024-09-01T12:00:00"},
                    {"id":2,"jersey_number":11,"user":{"id":5,"email":"b@x","name":"Ben","role":"player"}}]"#,
            )
            .create_async()
            .await;

        let players = api(&server).await.list_players(true).await.unwrap();
        assert!(!players[0].is_active);
        assert_eq!(players[0].joined_on, NaiveDate::from_ymd_opt(2024, 9, 1));
        assert_eq!(players[1].name, "Ben");
        assert!(players[1].is_active);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(TeamApi::new("not a url"), Err(ApiError::Invalid(_))));
        assert!(matches!(TeamApi::new("mailto:coach@club.test"), Err(ApiError::Invalid(_))));
    }
}
