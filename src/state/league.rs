use courtside_api::{Acknowledgement, Fixture, LadderEntry};

/// Rows shown on the dashboard's ladder excerpt.
pub const DASHBOARD_LADDER_ROWS: usize = 6;
pub const LADDER_LIMIT: usize = 20;
pub const FIXTURES_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Ladder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LadderView {
    entries: Vec<LadderEntry>,
    /// Our own row, fetched separately so it is known even outside the limit.
    own: Option<LadderEntry>,
    loading: bool,
    updating: bool,
    pub notice: Option<String>,
    pub last_error: Option<String>,
}

impl LadderView {
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn loaded(&mut self, result: Result<Vec<LadderEntry>, String>) {
        self.loading = false;
        match result {
            Ok(entries) => {
                self.entries = entries;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn own_loaded(&mut self, result: Result<LadderEntry, String>) {
        match result {
            Ok(entry) => self.own = Some(entry),
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn begin_update(&mut self) -> bool {
        if self.updating {
            return false;
        }
        self.updating = true;
        self.notice = Some("Updating ladder...".to_owned());
        true
    }

    /// Returns true when the ladder should be reloaded.
    pub fn updated(&mut self, result: Result<Acknowledgement, String>) -> bool {
        self.updating = false;
        match result {
            Ok(ack) => {
                self.notice = Some(if ack.message.is_empty() {
                    "Ladder updated".to_owned()
                } else {
                    ack.message
                });
                true
            }
            Err(e) => {
                self.notice = None;
                self.last_error = Some(e);
                false
            }
        }
    }

    pub fn entries(&self) -> &[LadderEntry] {
        &self.entries
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn top(&self, n: usize) -> &[LadderEntry] {
        &self.entries[..self.entries.len().min(n)]
    }

    /// Our row: the separately fetched one, else a name match in the table.
    pub fn own_entry(&self, team_name: &str) -> Option<&LadderEntry> {
        self.own.as_ref().or_else(|| {
            self.entries
                .iter()
                .find(|e| e.team_name.trim().eq_ignore_ascii_case(team_name.trim()))
        })
    }

    pub fn is_own(&self, entry: &LadderEntry, team_name: &str) -> bool {
        entry.team_name.trim().eq_ignore_ascii_case(team_name.trim())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixturesAction {
    Update,
    Sync,
}

#[derive(Debug, Default)]
pub struct FixturesSync {
    fixtures: Vec<Fixture>,
    loading: bool,
    running: Option<FixturesAction>,
    pub notice: Option<String>,
    pub last_error: Option<String>,
}

impl FixturesSync {
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn loaded(&mut self, result: Result<Vec<Fixture>, String>) {
        self.loading = false;
        match result {
            Ok(mut fixtures) => {
                fixtures.sort_by_key(|f| f.scheduled_at);
                self.fixtures = fixtures;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn begin(&mut self, action: FixturesAction) -> bool {
        if self.running.is_some() {
            return false;
        }
        self.running = Some(action);
        self.notice = Some(match action {
            FixturesAction::Update => "Updating fixtures...".to_owned(),
            FixturesAction::Sync => "Syncing fixtures with games...".to_owned(),
        });
        true
    }

    /// Returns true when fixtures (and, after a sync, games) should be reloaded.
    pub fn finished(&mut self, action: FixturesAction, result: Result<Acknowledgement, String>) -> bool {
        if self.running == Some(action) {
            self.running = None;
        }
        match result {
            Ok(ack) => {
                self.notice = Some(if ack.message.is_empty() {
                    match action {
                        FixturesAction::Update => "Fixtures updated".to_owned(),
                        FixturesAction::Sync => "Fixtures synced with games".to_owned(),
                    }
                } else {
                    ack.message
                });
                true
            }
            Err(e) => {
                self.notice = None;
                self.last_error = Some(e);
                false
            }
        }
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn running(&self) -> Option<FixturesAction> {
        self.running
    }

    pub fn next(&self) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.days_until >= 0)
    }
}
