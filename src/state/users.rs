use courtside_api::{User, UserId};

/// Manager-side user administration list.
#[derive(Debug, Default)]
pub struct UserAdmin {
    users: Vec<User>,
    loading: bool,
    pub selected: usize,
    pub last_error: Option<String>,
}

impl UserAdmin {
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn loaded(&mut self, result: Result<Vec<User>, String>) {
        self.loading = false;
        match result {
            Ok(mut users) => {
                users.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
                self.users = users;
                self.last_error = None;
                self.clamp();
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.users.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.users.is_empty() {
            self.selected = (self.selected + 1).min(self.users.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn removed(&mut self, id: UserId) {
        self.users.retain(|u| u.id != id);
        self.clamp();
    }

    pub fn mark_verified(&mut self, id: UserId) {
        if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
            user.is_verified = true;
        }
    }

    pub fn added(&mut self, user: User) {
        self.users.push(user);
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.users.len().saturating_sub(1));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_api::Role;

    fn user(id: i64, name: &str) -> User {
        User {
            id: UserId(id),
            email: format!("{id}@club.test"),
            name: name.into(),
            role: Role::Player,
            is_verified: false,
            jersey_number: None,
        }
    }

    #[test]
    fn loaded_users_are_sorted_by_name() {
        let mut admin = UserAdmin::default();
        assert!(admin.begin_load());
        admin.loaded(Ok(vec![user(1, "zoe"), user(2, "Adam"), user(3, "ben")]));
        let names: Vec<&str> = admin.users().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Adam", "ben", "zoe"]);
    }

    #[test]
    fn remove_and_verify_update_in_place() {
        let mut admin = UserAdmin::default();
        admin.begin_load();
        admin.loaded(Ok(vec![user(1, "A"), user(2, "B")]));
        admin.select_next();

        admin.mark_verified(UserId(2));
        assert!(admin.selected_user().is_some_and(|u| u.is_verified));

        admin.removed(UserId(2));
        assert_eq!(admin.selected, 0);
        assert_eq!(admin.users().len(), 1);
    }

    #[test]
    fn failed_load_keeps_previous_list() {
        let mut admin = UserAdmin::default();
        admin.begin_load();
        admin.loaded(Ok(vec![user(1, "A")]));
        admin.begin_load();
        admin.loaded(Err("forbidden".into()));
        assert_eq!(admin.users().len(), 1);
        assert_eq!(admin.last_error.as_deref(), Some("forbidden"));
    }
}
