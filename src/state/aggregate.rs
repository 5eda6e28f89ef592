use courtside_api::{GameId, Player, PlayerGameStat, PlayerId};
use log::warn;
use std::collections::{BTreeSet, HashMap};

pub const UNKNOWN_PLAYER: &str = "Unknown";

/// Season totals for one player. `player_id` is `None` for the bucket that
/// collects records whose player could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPlayerStat {
    pub player_id: Option<PlayerId>,
    pub name: String,
    pub jersey_number: Option<u8>,
    pub total_points: u32,
    pub total_fouls: u32,
    pub games_played: u32,
    pub avg_points: f64,
    pub avg_fouls: f64,
}

struct Bucket {
    player_id: Option<PlayerId>,
    name: String,
    jersey_number: Option<u8>,
    points: u32,
    fouls: u32,
    games: BTreeSet<GameId>,
}

/// Fold per-game records into per-player totals and averages, sorted by total
/// points descending. Ties keep the order in which players were first seen.
pub fn aggregate(records: &[PlayerGameStat], roster: &[Player]) -> Vec<AggregatedPlayerStat> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<Option<PlayerId>, usize> = HashMap::new();

    for record in records {
        let (key, name, jersey) = resolve(record, roster);
        let slot = *index.entry(key).or_insert_with(|| {
            buckets.push(Bucket {
                player_id: key,
                name,
                jersey_number: jersey,
                points: 0,
                fouls: 0,
                games: BTreeSet::new(),
            });
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        bucket.points = bucket.points.saturating_add(record.points);
        bucket.fouls = bucket.fouls.saturating_add(record.fouls);
        bucket.games.insert(record.game_id);
    }

    let mut rows: Vec<AggregatedPlayerStat> = buckets
        .into_iter()
        .filter(|b| !b.games.is_empty())
        .map(|b| {
            let games = b.games.len() as u32;
            AggregatedPlayerStat {
                player_id: b.player_id,
                name: b.name,
                jersey_number: b.jersey_number,
                total_points: b.points,
                total_fouls: b.fouls,
                games_played: games,
                avg_points: one_decimal_average(b.points, games),
                avg_fouls: one_decimal_average(b.fouls, games),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    rows
}

fn resolve(record: &PlayerGameStat, roster: &[Player]) -> (Option<PlayerId>, String, Option<u8>) {
    if let Some(embedded) = &record.player {
        let id = embedded.id.unwrap_or(record.player_id);
        let jersey = embedded
            .jersey_number
            .or_else(|| roster.iter().find(|p| p.id == id).map(|p| p.jersey_number));
        return (Some(id), embedded.name.clone(), jersey);
    }
    match roster.iter().find(|p| p.id == record.player_id) {
        Some(player) => (Some(player.id), player.name.clone(), Some(player.jersey_number)),
        None => (None, UNKNOWN_PLAYER.to_owned(), None),
    }
}

/// `total / games` rounded half-up to one decimal. Integer arithmetic keeps
/// the .x5 boundary exact.
fn one_decimal_average(total: u32, games: u32) -> f64 {
    if games == 0 {
        return 0.0;
    }
    let (total, games) = (u64::from(total), u64::from(games));
    let tenths = (20 * total + games) / (2 * games);
    tenths as f64 / 10.0
}

// ---------------------------------------------------------------------------
// SeasonStats: per-game loads collected into one leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SeasonStats {
    records: Vec<PlayerGameStat>,
    rows: Vec<AggregatedPlayerStat>,
    failed_games: Vec<GameId>,
    loading: bool,
    pub selected: usize,
    pub history: Option<PlayerHistory>,
    pub last_error: Option<String>,
}

/// Game-by-game lines for one player, shown under the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHistory {
    pub player_id: PlayerId,
    pub lines: Vec<PlayerGameStat>,
}

impl SeasonStats {
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Games that failed to load are logged and skipped; the leaderboard is
    /// built from the rest.
    pub fn finish_load(
        &mut self,
        per_game: Vec<(GameId, Result<Vec<PlayerGameStat>, String>)>,
        roster: &[Player],
    ) {
        self.loading = false;
        self.records.clear();
        self.failed_games.clear();

        for (game_id, result) in per_game {
            match result {
                Ok(stats) => self.records.extend(stats),
                Err(e) => {
                    warn!("skipping stats for game {game_id}: {e}");
                    self.failed_games.push(game_id);
                }
            }
        }

        self.recompute(roster);
    }

    /// Rebuild the rows, e.g. after the roster changed names.
    pub fn recompute(&mut self, roster: &[Player]) {
        self.rows = aggregate(&self.records, roster);
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn rows(&self) -> &[AggregatedPlayerStat] {
        &self.rows
    }

    pub fn records(&self) -> &[PlayerGameStat] {
        &self.records
    }

    pub fn failed_games(&self) -> &[GameId] {
        &self.failed_games
    }

    pub fn selected_row(&self) -> Option<&AggregatedPlayerStat> {
        self.rows.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.rows.is_empty() {
            self.selected = (self.selected + 1).min(self.rows.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn history_loaded(&mut self, player_id: PlayerId, result: Result<Vec<PlayerGameStat>, String>) {
        match result {
            Ok(mut lines) => {
                lines.sort_by_key(|l| std::cmp::Reverse(l.game_id));
                self.history = Some(PlayerHistory { player_id, lines });
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
