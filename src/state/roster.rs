use courtside_api::{Player, PlayerId};

#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
    loading: bool,
    pub show_inactive: bool,
    pub query: String,
    pub selected: usize,
    /// Player marked as the source of a pending merge.
    pub merge_source: Option<PlayerId>,
    pub last_error: Option<String>,
}

impl Roster {
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn loaded(&mut self, result: Result<Vec<Player>, String>) {
        self.loading = false;
        match result {
            Ok(players) => {
                self.players = players;
                self.last_error = None;
                if self.merge_source.is_some_and(|id| self.find(id).is_none()) {
                    self.merge_source = None;
                }
                self.clamp();
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn find(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Players shown in the list: active only unless `show_inactive`, filtered
    /// by name or jersey number, ordered by jersey then name.
    pub fn visible(&self) -> Vec<&Player> {
        let query = self.query.trim().to_lowercase();
        let mut visible: Vec<&Player> = self
            .players
            .iter()
            .filter(|p| self.show_inactive || p.is_active)
            .filter(|p| {
                query.is_empty()
                    || p.name.to_lowercase().contains(&query)
                    || p.jersey_number.to_string() == query
            })
            .collect();
        visible.sort_by(|a, b| a.jersey_number.cmp(&b.jersey_number).then_with(|| a.name.cmp(&b.name)));
        visible
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.visible().get(self.selected).copied()
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
        self.selected = 0;
    }

    pub fn toggle_inactive(&mut self) {
        self.show_inactive = !self.show_inactive;
        self.clamp();
    }

    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Local update after an activate/deactivate call succeeded.
    pub fn set_active(&mut self, id: PlayerId, active: bool) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.is_active = active;
        }
        self.clamp();
    }

    pub fn upsert(&mut self, player: Player) {
        match self.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => self.players.push(player),
        }
    }

    /// Marks or unmarks the selected player as merge source. With a source
    /// already marked, returns `(source, target)` for confirmation.
    pub fn merge_step(&mut self) -> Option<(PlayerId, PlayerId)> {
        let selected = self.selected_player()?.id;
        match self.merge_source {
            None => {
                self.merge_source = Some(selected);
                None
            }
            Some(source) if source == selected => {
                self.merge_source = None;
                None
            }
            Some(source) => Some((source, selected)),
        }
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.visible().len().saturating_sub(1));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: i64, name: &str, jersey: u8, active: bool) -> Player {
        Player { id: PlayerId(id), name: name.into(), jersey_number: jersey, is_active: active, joined_on: None }
    }

    fn roster() -> Roster {
        let mut r = Roster::default();
        r.begin_load();
        r.loaded(Ok(vec![
            player(1, "Zed", 4, true),
            player(2, "Amy", 23, true),
            player(3, "Old Timer", 1, false),
            player(4, "Ann", 4, true),
        ]));
        r
    }

    fn names(r: &Roster) -> Vec<&str> {
        r.visible().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn inactive_players_are_hidden_by_default() {
        let mut r = roster();
        assert_eq!(names(&r), vec!["Ann", "Zed", "Amy"]);
        r.toggle_inactive();
        assert_eq!(names(&r), vec!["Old Timer", "Ann", "Zed", "Amy"]);
    }

    #[test]
    fn search_matches_name_or_jersey() {
        let mut r = roster();
        r.set_query("a".into());
        assert_eq!(names(&r), vec!["Ann", "Amy"]);
        r.set_query("23".into());
        assert_eq!(names(&r), vec!["Amy"]);
        r.set_query("  ".into());
        assert_eq!(names(&r).len(), 3);
    }

    #[test]
    fn deactivating_clamps_selection() {
        let mut r = roster();
        r.select_next();
        r.select_next();
        assert_eq!(r.selected_player().map(|p| p.id), Some(PlayerId(2)));
        r.set_active(PlayerId(2), false);
        assert_eq!(r.selected, 1);
    }

    #[test]
    fn merge_takes_two_steps() {
        let mut r = roster();
        assert_eq!(r.merge_step(), None);
        assert_eq!(r.merge_source, Some(PlayerId(4)));

        r.select_next();
        assert_eq!(r.merge_step(), Some((PlayerId(4), PlayerId(1))));

        r.select_prev();
        assert_eq!(r.merge_step(), None);
        assert_eq!(r.merge_source, None);
    }

    #[test]
    fn upsert_replaces_or_appends() {
        let mut r = roster();
        r.upsert(player(2, "Amy B", 23, true));
        r.upsert(player(9, "New", 9, true));
        assert_eq!(r.find(PlayerId(2)).map(|p| p.name.as_str()), Some("Amy B"));
        assert_eq!(r.players().len(), 5);
    }
}
