use courtside_api::{PlayerGameStat, StatId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Verify,
    Reject,
}

/// Persisted stat records still waiting for a manager's verdict.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    items: Vec<PlayerGameStat>,
    acting: BTreeMap<StatId, ReviewAction>,
    confirming: Option<StatId>,
    loading: bool,
    pub selected: usize,
    pub last_error: Option<String>,
}

impl ReviewQueue {
    pub fn load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn loaded(&mut self, result: Result<Vec<PlayerGameStat>, String>) {
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.acting.retain(|id, _| self.items.iter().any(|s| s.id == *id));
                self.last_error = None;
                self.clamp();
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn items(&self) -> &[PlayerGameStat] {
        &self.items
    }

    pub fn selected_item(&self) -> Option<&PlayerGameStat> {
        self.items.get(self.selected)
    }

    pub fn action_for(&self, id: StatId) -> Option<ReviewAction> {
        self.acting.get(&id).copied()
    }

    pub fn confirming(&self) -> Option<StatId> {
        self.confirming
    }

    fn is_actionable(&self, id: StatId) -> bool {
        !self.acting.contains_key(&id) && self.items.iter().any(|s| s.id == id)
    }

    /// Returns the id to send, or `None` if the record is unknown or already
    /// has an action running.
    pub fn verify(&mut self, id: StatId) -> Option<StatId> {
        if !self.is_actionable(id) {
            return None;
        }
        self.acting.insert(id, ReviewAction::Verify);
        Some(id)
    }

    pub fn verified(&mut self, id: StatId, result: Result<(), String>) {
        self.settle(id, result);
    }

    /// First step of a rejection. Nothing is sent until `confirm_reject`.
    pub fn request_reject(&mut self, id: StatId) -> bool {
        if !self.is_actionable(id) {
            return false;
        }
        self.confirming = Some(id);
        true
    }

    pub fn confirm_reject(&mut self) -> Option<StatId> {
        let id = self.confirming.take()?;
        if !self.is_actionable(id) {
            return None;
        }
        self.acting.insert(id, ReviewAction::Reject);
        Some(id)
    }

    pub fn cancel_reject(&mut self) {
        self.confirming = None;
    }

    pub fn rejected(&mut self, id: StatId, result: Result<(), String>) {
        self.settle(id, result);
    }

    fn settle(&mut self, id: StatId, result: Result<(), String>) {
        self.acting.remove(&id);
        match result {
            Ok(()) => {
                self.items.retain(|s| s.id != id);
                self.last_error = None;
                self.clamp();
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1).min(self.items.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_api::{GameId, PlayerId, VerificationStatus};

    fn pending(id: i64) -> PlayerGameStat {
        PlayerGameStat {
            id: StatId(id),
            game_id: GameId(1),
            player_id: PlayerId(id),
            player: None,
            points: 10,
            fouls: 2,
            verification: VerificationStatus::Unverified,
            source_url: Some("https://league.example".into()),
            scraped: true,
        }
    }

    fn queue(ids: &[i64]) -> ReviewQueue {
        let mut q = ReviewQueue::default();
        assert!(q.load());
        q.loaded(Ok(ids.iter().copied().map(pending).collect()));
        q
    }

    #[test]
    fn load_guard_drops_overlaps() {
        let mut q = ReviewQueue::default();
        assert!(q.load());
        assert!(!q.load());
        q.loaded(Err("offline".into()));
        assert!(!q.is_loading());
        assert_eq!(q.last_error.as_deref(), Some("offline"));
        assert!(q.load());
    }

    #[test]
    fn verify_removes_on_success_only() {
        let mut q = queue(&[1, 2]);
        assert_eq!(q.verify(StatId(1)), Some(StatId(1)));
        assert_eq!(q.action_for(StatId(1)), Some(ReviewAction::Verify));
        assert_eq!(q.verify(StatId(1)), None);

        q.verified(StatId(1), Err("server error".into()));
        assert_eq!(q.items().len(), 2);
        assert_eq!(q.last_error.as_deref(), Some("server error"));

        assert_eq!(q.verify(StatId(1)), Some(StatId(1)));
        q.verified(StatId(1), Ok(()));
        assert_eq!(q.items().len(), 1);
        assert_eq!(q.items()[0].id, StatId(2));
    }

    #[test]
    fn reject_needs_confirmation() {
        let mut q = queue(&[1, 2]);
        assert!(q.request_reject(StatId(2)));
        assert_eq!(q.confirming(), Some(StatId(2)));
        assert_eq!(q.action_for(StatId(2)), None);

        q.cancel_reject();
        assert_eq!(q.confirm_reject(), None);
        assert_eq!(q.items().len(), 2);

        q.request_reject(StatId(2));
        assert_eq!(q.confirm_reject(), Some(StatId(2)));
        q.rejected(StatId(2), Ok(()));
        assert_eq!(q.items().len(), 1);
        assert_eq!(q.confirming(), None);
    }

    #[test]
    fn one_action_per_record() {
        let mut q = queue(&[1]);
        q.verify(StatId(1));
        assert!(!q.request_reject(StatId(1)));
        assert_eq!(q.verify(StatId(9)), None);
    }

    #[test]
    fn selection_is_clamped_after_removal() {
        let mut q = queue(&[1, 2, 3]);
        q.select_next();
        q.select_next();
        q.select_next();
        assert_eq!(q.selected, 2);
        q.verify(StatId(3));
        q.verified(StatId(3), Ok(()));
        assert_eq!(q.selected, 1);
        assert_eq!(q.selected_item().map(|s| s.id), Some(StatId(2)));
    }
}
