use courtside_api::{Role, User};

/// What the signed-in user may see and do. Computed once per login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub view_games: bool,
    pub view_fixtures: bool,
    pub view_stats: bool,
    pub view_ladder: bool,
    pub view_roster: bool,
    pub edit_games: bool,
    pub ingest_stats: bool,
    pub review_stats: bool,
    pub manage_players: bool,
    pub manage_users: bool,
}

impl Capabilities {
    pub const ANONYMOUS: Self = Self {
        view_games: true,
        view_fixtures: true,
        view_stats: false,
        view_ladder: false,
        view_roster: false,
        edit_games: false,
        ingest_stats: false,
        review_stats: false,
        manage_players: false,
        manage_users: false,
    };

    pub const PLAYER: Self = Self {
        view_stats: true,
        view_ladder: true,
        view_roster: true,
        ..Self::ANONYMOUS
    };

    pub const MANAGER: Self = Self {
        edit_games: true,
        ingest_stats: true,
        review_stats: true,
        manage_players: true,
        manage_users: true,
        ..Self::PLAYER
    };

    pub fn for_role(role: Option<Role>) -> Self {
        match role {
            None => Self::ANONYMOUS,
            Some(Role::Player) => Self::PLAYER,
            Some(Role::Manager) => Self::MANAGER,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ANONYMOUS
    }
}

#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
    capabilities: Capabilities,
    signing_in: bool,
    /// Bumped on every sign-in and sign-out.
    generation: u64,
}

impl Session {
    pub fn begin_sign_in(&mut self) -> bool {
        if self.signing_in {
            return false;
        }
        self.signing_in = true;
        true
    }

    pub fn is_signing_in(&self) -> bool {
        self.signing_in
    }

    pub fn signed_in(&mut self, user: User) {
        self.capabilities = Capabilities::for_role(Some(user.role));
        self.user = Some(user);
        self.signing_in = false;
        self.generation += 1;
    }

    pub fn sign_in_failed(&mut self) {
        self.signing_in = false;
    }

    pub fn sign_out(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_api::UserId;

    fn user(role: Role) -> User {
        User {
            id: UserId(1),
            email: "coach@club.test".into(),
            name: "Coach".into(),
            role,
            is_verified: true,
            jersey_number: None,
        }
    }

    #[test]
    fn capabilities_widen_with_role() {
        let anon = Capabilities::for_role(None);
        assert!(anon.view_games && anon.view_fixtures);
        assert!(!anon.view_stats && !anon.view_ladder && !anon.edit_games);

        let player = Capabilities::for_role(Some(Role::Player));
        assert!(player.view_stats && player.view_ladder && player.view_roster);
        assert!(!player.ingest_stats && !player.manage_users);

        assert_eq!(Capabilities::for_role(Some(Role::Manager)), Capabilities::MANAGER);
        assert!(Capabilities::MANAGER.view_games);
    }

    #[test]
    fn sign_in_and_out() {
        let mut session = Session::default();
        assert_eq!(session.capabilities(), Capabilities::ANONYMOUS);
        assert!(session.begin_sign_in());
        assert!(!session.begin_sign_in());

        session.signed_in(user(Role::Manager));
        assert_eq!(session.generation(), 1);
        assert!(!session.is_signing_in());
        assert!(session.capabilities().review_stats);
        assert_eq!(session.user().map(|u| u.name.as_str()), Some("Coach"));

        session.sign_out();
        assert!(!session.is_signed_in());
        assert_eq!(session.capabilities(), Capabilities::ANONYMOUS);
        assert_eq!(session.generation(), 2);

        session.signed_in(user(Role::Player));
        assert_eq!(session.generation(), 3);
    }
}
