//! In-memory session state.
//!
//! The session holds the current token and user profile. It is initialized
//! from `TokenStore` when the auth store is constructed, mutated only by
//! auth operations, and cleared entirely by logout. Nothing here touches
//! disk; persistence is the token store's job.

/// Profile information returned by the identity API on sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// The current user's authentication state.
/// The token field is private: it is never empty while set, so
/// `is_authenticated` holds exactly when a token is present.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    pub user: Option<User>,
    /// Email captured at registration, carried to the verification screen
    pub pending_email: Option<String>,
}

impl Session {
    /// Build a session from a previously stored token.
    /// Empty strings are treated as no token at all.
    pub fn from_token(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            user: None,
            pending_email: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replace the session with a fresh sign-in.
    /// Callers must not pass an empty token.
    pub fn establish(&mut self, token: String, user: User) {
        debug_assert!(!token.is_empty());
        self.token = Some(token);
        self.user = Some(user);
    }

    /// Drop everything, including any pending registration email
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
        self.pending_email = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            email: "a@x.com".to_string(),
            username: "a".to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.user.is_none());
    }

    #[test]
    fn test_from_token_filters_empty() {
        let session = Session::from_token(Some(String::new()));
        assert!(!session.is_authenticated());

        let session = Session::from_token(Some("t1".to_string()));
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("t1"));

        let session = Session::from_token(None);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_establish_sets_token_and_user() {
        let mut session = Session::default();
        session.establish("t1".to_string(), test_user());
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(session.user.as_ref().map(|u| u.username.as_str()), Some("a"));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = Session::default();
        session.pending_email = Some("a@x.com".to_string());
        session.establish("t1".to_string(), test_user());

        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.user.is_none());
        assert!(session.pending_email.is_none());
    }
}
