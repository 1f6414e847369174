//! Session management.
//!
//! A [`Session`] is an opaque bearer token. It carries no expiry; it is
//! created by login (or supplied pre-obtained in configuration), overwritten
//! by a later login, and never invalidated explicitly.
//!
//! [`SessionManager::establish`] performs the one-shot startup login. It is
//! never retried: if it fails, the session stays unset and every update cycle
//! is skipped until the process is restarted.

use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{error, info, warn};

use crate::error::Result;
use crate::traits::CanaryApi;

/// Opaque bearer token used in the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(<redacted>)")
    }
}

/// Username and password for the login flow.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Owns the login flow and holds the current bearer token.
pub struct SessionManager {
    api: Arc<dyn CanaryApi>,
    credentials: Option<Credentials>,
    current: RwLock<Option<Session>>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("has_session", &self.has_session())
            .finish()
    }
}

impl SessionManager {
    /// Create a manager with an optional pre-obtained session and optional credentials.
    pub fn new(
        api: Arc<dyn CanaryApi>,
        session: Option<Session>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            api,
            credentials,
            current: RwLock::new(session),
        }
    }

    /// The session currently held, if any.
    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether a session is currently held.
    pub fn has_session(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Overwrite the held session.
    pub fn set(&self, session: Session) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
    }

    /// Log in with the configured credentials and store the resulting session.
    pub async fn login(&self) -> Result<Session> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            crate::error::Error::InvalidConfig("no credentials configured".to_string())
        })?;
        let session = self.api.login(credentials).await?;
        self.set(session.clone());
        Ok(session)
    }

    /// Make sure a session is held, logging in once if necessary.
    ///
    /// Failures are logged and leave the session unset. Returns whether a
    /// session is held afterwards.
    pub async fn establish(&self) -> bool {
        if self.has_session() {
            info!("Using pre-configured session");
            return true;
        }

        let Some(credentials) = &self.credentials else {
            warn!("No session and no credentials configured, updates will be skipped");
            return false;
        };

        info!("Logging in as {}", credentials.username);
        match self.login().await {
            Ok(_) => {
                info!("Login succeeded");
                true
            }
            Err(e) => {
                error!("Error on login: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthFailure, Error};
    use crate::mock::MockApi;

    fn manager(api: Arc<MockApi>, session: Option<Session>, with_credentials: bool) -> SessionManager {
        let credentials = with_credentials.then(|| Credentials::new("user@example.com", "hunter2"));
        SessionManager::new(api, session, credentials)
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let session = Session::new("very-secret-token");
        assert!(!format!("{:?}", session).contains("very-secret-token"));

        let credentials = Credentials::new("me", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("me"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_preconfigured_session_skips_login() {
        let api = Arc::new(MockApi::new());
        let manager = manager(Arc::clone(&api), Some(Session::new("preset")), true);

        assert!(manager.establish().await);
        assert_eq!(manager.current().unwrap().token(), "preset");
        assert_eq!(api.login_count(), 0);
    }

    #[tokio::test]
    async fn test_establish_logs_in_once() {
        let api = Arc::new(MockApi::new().with_token("issued"));
        let manager = manager(Arc::clone(&api), None, true);

        assert!(!manager.has_session());
        assert!(manager.establish().await);
        assert_eq!(manager.current().unwrap().token(), "issued");
        assert_eq!(api.login_count(), 1);

        // Already established: no second login
        assert!(manager.establish().await);
        assert_eq!(api.login_count(), 1);
    }

    #[tokio::test]
    async fn test_establish_failure_leaves_session_unset() {
        let api = Arc::new(MockApi::new());
        api.fail_login(AuthFailure::MissingXsrfToken);
        let manager = manager(Arc::clone(&api), None, true);

        assert!(!manager.establish().await);
        assert!(manager.current().is_none());
        assert_eq!(api.login_count(), 1);
    }

    #[tokio::test]
    async fn test_establish_without_credentials() {
        let api = Arc::new(MockApi::new());
        let manager = manager(Arc::clone(&api), None, false);

        assert!(!manager.establish().await);
        assert_eq!(api.login_count(), 0);
        assert!(matches!(
            manager.login().await,
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_set_overwrites() {
        let manager = manager(Arc::new(MockApi::new()), Some(Session::new("old")), false);
        manager.set(Session::new("new"));
        assert_eq!(manager.current(), Some(Session::new("new")));
    }
}
