use chrono::{DateTime, Utc};
use courtside_api::{Game, GameId, GameResult};

/// The two derived views over the game list, evaluated at one instant.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GameViews {
    /// `scheduled_at <= now`, most recent first.
    pub completed: Vec<Game>,
    /// `scheduled_at > now`, soonest first.
    pub upcoming: Vec<Game>,
}

/// Split `games` around `now`. A game exactly at `now` counts as completed.
/// Both sorts are stable, so games sharing a timestamp keep their input order.
pub fn partition_games(games: &[Game], now: DateTime<Utc>) -> GameViews {
    let (mut completed, mut upcoming): (Vec<Game>, Vec<Game>) =
        games.iter().cloned().partition(|g| g.scheduled_at <= now);

    completed.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
    upcoming.sort_by_key(|g| g.scheduled_at);

    GameViews { completed, upcoming }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl TeamRecord {
    pub fn from_games<'a>(games: impl IntoIterator<Item = &'a Game>) -> Self {
        games
            .into_iter()
            .filter_map(Game::result)
            .fold(Self::default(), |mut record, result| {
                match result {
                    GameResult::Win => record.wins += 1,
                    GameResult::Loss => record.losses += 1,
                    GameResult::Tie => record.ties += 1,
                }
                record
            })
    }

    pub fn played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

// ---------------------------------------------------------------------------
// GameStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct GameStore {
    games: Vec<Game>,
    views: GameViews,
    evaluated_at: Option<DateTime<Utc>>,
    refreshing: bool,
    pub last_error: Option<String>,
    /// Index into `listing()`.
    pub selected: usize,
}

impl GameStore {
    /// Take the in-flight guard. `false` means a refresh is already pending
    /// and the caller must not issue another fetch.
    pub fn begin_refresh(&mut self) -> bool {
        if self.refreshing {
            return false;
        }
        self.refreshing = true;
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Release the guard. A failure leaves the cached games and views as they
    /// were.
    pub fn finish_refresh(&mut self, result: Result<Vec<Game>, String>, now: DateTime<Utc>) {
        self.refreshing = false;
        match result {
            Ok(games) => {
                let selected_id = self.selected_game().map(|g| g.id);
                self.games = games;
                self.last_error = None;
                self.reclassify(now);
                self.reselect(selected_id);
            }
            Err(message) => self.last_error = Some(message),
        }
    }

    /// Recompute both views from the cached list.
    pub fn reclassify(&mut self, now: DateTime<Utc>) {
        self.views = partition_games(&self.games, now);
        self.evaluated_at = Some(now);
        self.clamp_selection();
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    #[cfg(test)]
    pub fn views(&self) -> &GameViews {
        &self.views
    }

    pub fn completed(&self) -> &[Game] {
        &self.views.completed
    }

    pub fn upcoming(&self) -> &[Game] {
        &self.views.upcoming
    }

    pub fn evaluated_at(&self) -> Option<DateTime<Utc>> {
        self.evaluated_at
    }

    pub fn find(&self, id: GameId) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    pub fn record(&self) -> TeamRecord {
        TeamRecord::from_games(&self.views.completed)
    }

    /// Results of the `n` most recent completed games that have scores.
    pub fn recent_form(&self, n: usize) -> Vec<GameResult> {
        self.views
            .completed
            .iter()
            .filter_map(Game::result)
            .take(n)
            .collect()
    }

    /// Ids of completed games, newest first. These are the games that can
    /// carry stats.
    pub fn completed_ids(&self) -> Vec<GameId> {
        self.views.completed.iter().map(|g| g.id).collect()
    }

    // -----------------------------------------------------------------------
    // Selection over the Games tab listing: upcoming first, then completed.
    // -----------------------------------------------------------------------

    pub fn listing(&self) -> impl Iterator<Item = &Game> {
        self.views.upcoming.iter().chain(self.views.completed.iter())
    }

    pub fn selected_game(&self) -> Option<&Game> {
        self.listing().nth(self.selected)
    }

    pub fn select_next(&mut self) {
        let len = self.games.len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn reselect(&mut self, id: Option<GameId>) {
        let found = id.and_then(|id| self.listing().position(|g| g.id == id));
        if let Some(idx) = found {
            self.selected = idx;
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.views.upcoming.len() + self.views.completed.len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn game(id: i64, when: DateTime<Utc>) -> Game {
        Game {
            id: GameId(id),
            opponent_name: format!("Team {id}"),
            scheduled_at: when,
            venue: None,
            final_score: None,
            opponent_score: None,
            video_url: None,
        }
    }

    fn scored(id: i64, when: DateTime<Utc>, ours: u16, theirs: u16) -> Game {
        Game { final_score: Some(ours), opponent_score: Some(theirs), ..game(id, when) }
    }

    fn ids(games: &[Game]) -> Vec<i64> {
        games.iter().map(|g| g.id.0).collect()
    }

    #[test]
    fn partition_sorts_each_view_and_keeps_every_game_once() {
        let now = at(10, 12);
        let games = vec![
            game(1, at(3, 19)),
            game(2, at(20, 19)),
            game(3, at(8, 19)),
            game(4, at(12, 19)),
        ];

        let views = partition_games(&games, now);
        assert_eq!(ids(&views.completed), vec![3, 1]);
        assert_eq!(ids(&views.upcoming), vec![4, 2]);
        assert_eq!(views.completed.len() + views.upcoming.len(), games.len());
    }

    #[test]
    fn a_game_at_the_evaluation_instant_is_completed() {
        let now = at(10, 19);
        let views = partition_games(&[game(1, now), game(2, now + Duration::seconds(1))], now);
        assert_eq!(ids(&views.completed), vec![1]);
        assert_eq!(ids(&views.upcoming), vec![2]);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let now = at(10, 12);
        let past = at(5, 19);
        let future = at(15, 19);
        let games = vec![game(7, past), game(3, future), game(5, past), game(1, future)];

        let views = partition_games(&games, now);
        assert_eq!(ids(&views.completed), vec![7, 5]);
        assert_eq!(ids(&views.upcoming), vec![3, 1]);
    }

    #[test]
    fn empty_input_gives_empty_views() {
        assert_eq!(partition_games(&[], at(1, 0)), GameViews::default());
    }

    #[test]
    fn overlapping_refresh_is_dropped_until_the_first_finishes() {
        let mut store = GameStore::default();
        assert!(store.begin_refresh());
        assert!(!store.begin_refresh());

        store.finish_refresh(Ok(vec![game(1, at(1, 19))]), at(10, 12));
        assert!(!store.is_refreshing());
        assert!(store.begin_refresh());
    }

    #[test]
    fn failed_refresh_keeps_previous_views_and_releases_the_guard() {
        let mut store = GameStore::default();
        let now = at(10, 12);
        store.begin_refresh();
        store.finish_refresh(Ok(vec![game(1, at(1, 19)), game(2, at(20, 19))]), now);
        let before = store.views().clone();

        assert!(store.begin_refresh());
        store.finish_refresh(Err("connection refused".into()), at(25, 12));

        assert_eq!(store.views(), &before);
        assert_eq!(store.games().len(), 2);
        assert_eq!(store.last_error.as_deref(), Some("connection refused"));
        assert!(!store.is_refreshing());
    }

    #[test]
    fn applying_the_same_list_twice_is_idempotent() {
        let mut store = GameStore::default();
        let now = at(10, 12);
        let games = vec![game(1, at(1, 19)), game(2, at(20, 19)), game(3, at(9, 8))];

        store.begin_refresh();
        store.finish_refresh(Ok(games.clone()), now);
        let first = store.views().clone();
        store.begin_refresh();
        store.finish_refresh(Ok(games), now);
        assert_eq!(store.views(), &first);
    }

    #[test]
    fn reclassify_rolls_games_into_completed() {
        let mut store = GameStore::default();
        store.begin_refresh();
        store.finish_refresh(Ok(vec![game(1, at(11, 19))]), at(10, 12));
        assert_eq!(store.upcoming().len(), 1);

        store.reclassify(at(12, 0));
        assert!(store.upcoming().is_empty());
        assert_eq!(ids(store.completed()), vec![1]);
        assert_eq!(store.evaluated_at(), Some(at(12, 0)));
    }

    #[test]
    fn record_and_form_count_only_scored_games() {
        let mut store = GameStore::default();
        store.begin_refresh();
        store.finish_refresh(
            Ok(vec![
                scored(1, at(1, 19), 50, 40),
                scored(2, at(2, 19), 30, 45),
                game(3, at(3, 19)),
                scored(4, at(4, 19), 40, 40),
                scored(5, at(5, 19), 61, 55),
            ]),
            at(10, 12),
        );

        assert_eq!(store.record(), TeamRecord { wins: 2, losses: 1, ties: 1 });
        assert_eq!(store.record().played(), 4);
        assert_eq!(
            store.recent_form(3),
            vec![GameResult::Win, GameResult::Tie, GameResult::Loss]
        );
    }

    #[test]
    fn selection_follows_the_selected_game_across_refreshes() {
        let mut store = GameStore::default();
        let now = at(10, 12);
        store.begin_refresh();
        store.finish_refresh(Ok(vec![game(1, at(1, 19)), game(2, at(20, 19))]), now);
        store.select_next();
        assert_eq!(store.selected_game().map(|g| g.id), Some(GameId(1)));

        store.begin_refresh();
        store.finish_refresh(
            Ok(vec![game(1, at(1, 19)), game(2, at(20, 19)), game(3, at(15, 19))]),
            now,
        );
        assert_eq!(store.selected_game().map(|g| g.id), Some(GameId(1)));
        assert_eq!(store.find(GameId(3)).map(|g| g.opponent_name.as_str()), Some("Team 3"));
    }

    #[test]
    fn selection_stays_put_when_the_selected_game_disappears() {
        let mut store = GameStore::default();
        let now = at(10, 12);
        store.begin_refresh();
        store.finish_refresh(
            Ok(vec![game(1, at(1, 19)), game(2, at(2, 19)), game(3, at(20, 19))]),
            now,
        );
        // upcoming: 3, completed: 2, 1
        store.select_next();
        store.select_next();
        assert_eq!(store.selected_game().map(|g| g.id), Some(GameId(1)));

        store.begin_refresh();
        store.finish_refresh(Ok(vec![game(3, at(20, 19)), game(4, at(25, 19))]), now);
        assert_eq!(store.selected, 1);
        assert_eq!(store.selected_game().map(|g| g.id), Some(GameId(4)));
    }
}
