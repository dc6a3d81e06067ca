/*!
 * Login gate for the dashboard
 *
 * This is a convenience gate, not a security boundary: credentials are
 * compared as plain strings. State lives in an explicit `SessionContext`
 * owned by whoever serves one user.
 */

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Result, TurnoverError};

/// Username/password pair accepted by the gate
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn accepts(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Where a session currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated {
        username: String,
        since: DateTime<Utc>,
    },
}

/// Per-user session context
#[derive(Debug, Clone)]
pub struct SessionContext {
    credentials: Option<Credentials>,
    state: SessionState,
}

impl SessionContext {
    /// Start an unauthenticated session. Without credentials the gate is open.
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            credentials,
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn requires_login(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Anonymous => None,
        }
    }

    /// Check a username/password pair and move to `Authenticated` on success
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let accepted = match &self.credentials {
            Some(credentials) => credentials.accepts(username, password),
            None => true,
        };

        if !accepted {
            warn!(username, "login rejected");
            return Err(TurnoverError::Authentication {
                message: "invalid username or password".to_string(),
            });
        }

        info!(username, "login accepted");
        self.state = SessionState::Authenticated {
            username: username.to_string(),
            since: Utc::now(),
        };
        Ok(())
    }

    /// Return to the unauthenticated state
    pub fn logout(&mut self) {
        if let Some(username) = self.username() {
            info!(username, "logged out");
        }
        self.state = SessionState::Anonymous;
    }

    /// Gate for operations that need a logged-in user
    pub fn require_authenticated(&self) -> Result<()> {
        if !self.requires_login() || self.is_authenticated() {
            Ok(())
        } else {
            Err(TurnoverError::Authentication {
                message: "login required".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gated() -> SessionContext {
        SessionContext::new(Some(Credentials::new("analyst", "s3cret")))
    }

    #[test]
    fn test_starts_anonymous() {
        let session = gated();
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(session.require_authenticated().is_err());
    }

    #[test]
    fn test_login_logout_cycle() {
        let mut session = gated();
        session.login("analyst", "s3cret").unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.username(), Some("analyst"));
        assert!(session.require_authenticated().is_ok());

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.require_authenticated().is_err());
    }

    #[test]
    fn test_wrong_password_keeps_anonymous() {
        let mut session = gated();
        let err = session.login("analyst", "guess").unwrap_err();
        assert!(matches!(err, TurnoverError::Authentication { .. }));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_open_gate_without_credentials() {
        let session = SessionContext::new(None);
        assert!(!session.requires_login());
        assert!(session.require_authenticated().is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("analyst", "s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
