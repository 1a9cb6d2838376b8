//! Two-tier persisted sign-in token.
//!
//! The durable tier is the OS keychain and survives restarts; it backs
//! "remember me" logins. The session tier is a file under the user's
//! runtime directory, which the OS clears when the login session ends.
//! A token is written to exactly one tier per sign-in, and reads prefer
//! the durable tier. The token is an opaque string; nothing here
//! inspects it.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use tracing::debug;

/// Key under which the token is stored in the keychain
const TOKEN_USER: &str = "token";

/// File name for the session tier
const TOKEN_FILE: &str = "token";

/// Persisted token storage across both tiers.
/// Clone is cheap - the keyring entry is shared behind an Arc.
#[derive(Clone)]
pub struct TokenStore {
    durable: Arc<Entry>,
    session_dir: PathBuf,
}

impl TokenStore {
    /// `service` names the keychain entry and `session_dir` holds the
    /// session-scoped token file. Both are injectable so tests can isolate
    /// their storage from the real application's.
    pub fn new(service: &str, session_dir: PathBuf) -> Result<Self> {
        let durable = Entry::new(service, TOKEN_USER).context("Failed to create keyring entry")?;
        Ok(Self {
            durable: Arc::new(durable),
            session_dir,
        })
    }

    /// Write the token to exactly one tier; the other tier is left untouched
    pub fn save(&self, token: &str, durable: bool) -> Result<()> {
        if durable {
            self.durable
                .set_password(token)
                .context("Failed to store token in keychain")?;
        } else {
            let path = self.session_file();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create session token directory")?;
            }
            std::fs::write(&path, token).context("Failed to write session token file")?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                    .context("Failed to restrict session token file permissions")?;
            }
        }
        Ok(())
    }

    /// Read the stored token, preferring the durable tier.
    /// Unreadable records are treated as absent.
    pub fn load(&self) -> Option<String> {
        self.load_durable().or_else(|| self.load_session())
    }

    /// Read the durable tier alone
    pub fn load_durable(&self) -> Option<String> {
        match self.durable.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!(error = %e, "keychain read failed, treating token as absent");
                None
            }
        }
    }

    /// Read the session tier alone
    pub fn load_session(&self) -> Option<String> {
        match std::fs::read_to_string(self.session_file()) {
            Ok(token) => Some(token),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                debug!(error = %e, "session token read failed, treating token as absent");
                None
            }
        }
    }

    /// Remove the token from both tiers. Missing records are not an error,
    /// and a failure in one tier does not stop the other from being cleared.
    pub fn clear(&self) -> Result<()> {
        let durable = match self.durable.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow!(e).context("Failed to delete token from keychain")),
        };
        let session = match std::fs::remove_file(self.session_file()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow!(e).context("Failed to remove session token file")),
        };
        durable.and(session)
    }

    fn session_file(&self) -> PathBuf {
        self.session_dir.join(TOKEN_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_store(dir: &tempfile::TempDir) -> TokenStore {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        TokenStore::new("wicket-test", dir.path().to_path_buf())
            .expect("Failed to create token store")
    }

    #[test]
    fn test_nothing_stored_loads_none() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = mock_store(&dir);
        assert!(store.load().is_none());
        assert!(store.load_durable().is_none());
        assert!(store.load_session().is_none());
    }

    #[test]
    fn test_durable_save_leaves_session_tier_untouched() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = mock_store(&dir);

        store.save("t1", true).expect("Failed to save token");
        assert_eq!(store.load_durable().as_deref(), Some("t1"));
        assert!(store.load_session().is_none());
        assert_eq!(store.load().as_deref(), Some("t1"));
    }

    #[test]
    fn test_session_save_leaves_durable_tier_untouched() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = mock_store(&dir);

        store.save("t1", false).expect("Failed to save token");
        assert_eq!(store.load_session().as_deref(), Some("t1"));
        assert!(store.load_durable().is_none());
        assert_eq!(store.load().as_deref(), Some("t1"));

        // The session tier is a plain file under the injected directory
        assert!(dir.path().join("token").exists());
    }

    #[test]
    fn test_load_prefers_durable_tier() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = mock_store(&dir);

        store.save("stale", false).expect("Failed to save token");
        store.save("fresh", true).expect("Failed to save token");
        assert_eq!(store.load().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_clear_removes_both_tiers() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = mock_store(&dir);

        store.save("d", true).expect("Failed to save token");
        store.save("s", false).expect("Failed to save token");
        store.clear().expect("Failed to clear tokens");

        assert!(store.load().is_none());
        assert!(store.load_durable().is_none());
        assert!(store.load_session().is_none());

        // Clearing an already-empty store succeeds
        store.clear().expect("Failed to clear empty store");
    }
}
