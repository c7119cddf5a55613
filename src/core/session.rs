//! Signed-in user persisted between runs.
//!
//! The user is kept as JSON under a single key of a [`SessionStore`]. The
//! lifecycle is `init` (load, clearing anything unreadable), `set` after a
//! successful login and `clear` on logout.

use crate::core::backend::{Backend, authenticated_user};
use crate::core::model::{Credentials, ProfileUpdate, UserContext};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub const SESSION_KEY: &str = "oracle_user";

/// Minimal key-value storage for session data.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

pub struct Session {
    store: Box<dyn SessionStore>,
    user: Option<UserContext>,
}

impl Session {
    /// Loads the stored user. A value that no longer parses is removed and
    /// the session starts signed out.
    pub fn init(store: Box<dyn SessionStore>) -> Result<Self> {
        let user = match store.get(SESSION_KEY)? {
            Some(bytes) => match serde_json::from_slice::<UserContext>(&bytes) {
                Ok(user) => {
                    debug!(user_id = user.id, "Restored session");
                    Some(user)
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable session");
                    store.remove(SESSION_KEY)?;
                    None
                }
            },
            None => None,
        };
        Ok(Self { store, user })
    }

    pub fn user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn set(&mut self, user: UserContext) -> Result<()> {
        let bytes = serde_json::to_vec(&user).context("Failed to serialize session user")?;
        self.store.put(SESSION_KEY, &bytes)?;
        info!(user_id = user.id, "Session started");
        self.user = Some(user);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(SESSION_KEY)?;
        self.user = None;
        info!("Session cleared");
        Ok(())
    }

    /// Mirrors an accepted profile update into the stored user.
    pub fn apply_profile(&mut self, profile: &ProfileUpdate) -> Result<()> {
        let Some(mut user) = self.user.clone() else {
            return Ok(());
        };
        user.monthly_income = Some(profile.income);
        user.monthly_savings = Some(profile.savings);
        user.risk_tolerance = Some(profile.risk.clone());
        self.set(user)
    }
}

/// Logs in and stores the resulting user.
pub async fn sign_in(
    backend: &dyn Backend,
    session: &mut Session,
    credentials: &Credentials,
) -> Result<UserContext> {
    let response = backend.login(credentials).await.context("Login failed")?;
    debug!(has_token = response.access_token.is_some(), "Login accepted");
    let user = authenticated_user(response);
    session.set(user.clone())?;
    Ok(user)
}

/// Registers, then logs in with the same credentials.
pub async fn sign_up(
    backend: &dyn Backend,
    session: &mut Session,
    credentials: &Credentials,
) -> Result<UserContext> {
    backend
        .register(credentials)
        .await
        .context("Registration failed")?;
    sign_in(backend, session, credentials).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    fn user() -> UserContext {
        UserContext {
            id: 12,
            email: "ada@example.com".to_string(),
            monthly_income: Some(5000.0),
            monthly_savings: None,
            risk_tolerance: None,
        }
    }

    #[test]
    fn test_session_round_trip_through_store() {
        let store = Arc::new(MemoryStore::new());

        let mut session = Session::init(Box::new(store.clone())).unwrap();
        assert!(session.user().is_none());
        session.set(user()).unwrap();

        let restored = Session::init(Box::new(store.clone())).unwrap();
        assert_eq!(restored.user(), Some(&user()));
        assert_eq!(restored.user_id(), Some(12));
    }

    #[test]
    fn test_corrupt_session_is_cleared() {
        let store = Arc::new(MemoryStore::new());
        store.put(SESSION_KEY, b"{not json").unwrap();

        let session = Session::init(Box::new(store.clone())).unwrap();

        assert!(session.user().is_none());
        assert!(store.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_user() {
        let store = Arc::new(MemoryStore::new());
        let mut session = Session::init(Box::new(store.clone())).unwrap();
        session.set(user()).unwrap();

        session.clear().unwrap();

        assert!(session.user().is_none());
        assert!(store.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_apply_profile_updates_savings() {
        let store = Arc::new(MemoryStore::new());
        let mut session = Session::init(Box::new(store)).unwrap();
        session.set(user()).unwrap();

        session
            .apply_profile(&ProfileUpdate {
                income: 6000.0,
                savings: 1200.0,
                risk: "Aggressive".to_string(),
            })
            .unwrap();

        let user = session.user().unwrap();
        assert_eq!(user.monthly_savings, Some(1200.0));
        assert_eq!(user.risk_tolerance.as_deref(), Some("Aggressive"));
    }
}
