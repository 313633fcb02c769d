//! Session lifecycle: one authenticated principal, explicit login/logout,
//! persisted as a single JSON object so a restarted client resumes without
//! re-authenticating.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use shared::{domain::Role, protocol::AuthenticatedUser};
use tracing::{debug, warn};

/// Authenticated principal handed to every gateway call that needs a bearer
/// credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub principal: AuthenticatedUser,
}

impl Session {
    pub fn new(principal: AuthenticatedUser) -> Self {
        Self { principal }
    }

    pub fn token(&self) -> &str {
        &self.principal.token
    }

    pub fn role(&self) -> Role {
        self.principal.user.rol
    }
}

/// Owns the current session and its on-disk copy. There is no global state:
/// callers borrow the session from here and pass it to the gateways.
pub struct SessionService {
    path: PathBuf,
    current: Option<Session>,
}

impl SessionService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            current: None,
        }
    }

    /// Default store location: `<platform data dir>/reinserta/session.json`.
    pub fn at_default_path() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("reinserta").join("session.json"))
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Reads the persisted principal, if any. A corrupt file is treated as
    /// no session rather than an error.
    pub fn restore(&mut self) -> Option<&Session> {
        if self.current.is_none() {
            match read_principal(&self.path) {
                Ok(Some(principal)) => {
                    debug!(user = %principal.user.email, "restored persisted session");
                    self.current = Some(Session::new(principal));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, path = %self.path.display(), "ignoring unreadable session file");
                }
            }
        }
        self.current.as_ref()
    }

    /// Sets the in-memory session first; a failed write still leaves the
    /// caller authenticated for this run.
    pub fn login(&mut self, principal: AuthenticatedUser) -> Result<&Session> {
        let session = self.current.insert(Session::new(principal));
        write_principal(&self.path, &session.principal)?;
        Ok(session)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.current = None;
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("failed to remove session file {}", self.path.display())
            })?;
        }
        Ok(())
    }
}

fn read_principal(path: &Path) -> Result<Option<AuthenticatedUser>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    let principal = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse session file {}", path.display()))?;
    Ok(Some(principal))
}

fn write_principal(path: &Path, principal: &AuthenticatedUser) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create session directory {}", parent.display())
        })?;
    }
    let raw = serde_json::to_string_pretty(principal).context("failed to encode session")?;
    fs::write(path, raw)
        .with_context(|| format!("failed to write session file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use shared::domain::{Role, User, UserId};

    use super::*;

    fn principal() -> AuthenticatedUser {
        AuthenticatedUser {
            user: User {
                id: UserId::from("1"),
                nombre: "Ana".to_string(),
                apellido: "Sosa".to_string(),
                dni: "11223344".to_string(),
                email: "ana@correo.gov".to_string(),
                telefono: None,
                rol: Role::Admin,
            },
            token: "jwt-abc".to_string(),
        }
    }

    fn temp_session_path() -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("reinserta_session_test_{suffix}"))
            .join("session.json")
    }

    #[test]
    fn login_persists_and_restore_round_trips() {
        let path = temp_session_path();
        let mut service = SessionService::new(path.clone());
        service.login(principal()).expect("login");

        let mut restarted = SessionService::new(path.clone());
        let restored = restarted.restore().expect("session restored");
        assert_eq!(restored.token(), "jwt-abc");
        assert_eq!(restored.role(), Role::Admin);

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }

    #[test]
    fn logout_removes_the_persisted_file() {
        let path = temp_session_path();
        let mut service = SessionService::new(path.clone());
        service.login(principal()).expect("login");
        service.logout().expect("logout");

        assert!(service.current().is_none());
        assert!(!path.exists());

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }

    #[test]
    fn corrupt_session_file_restores_to_none() {
        let path = temp_session_path();
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "{ not json").expect("write");

        let mut service = SessionService::new(path.clone());
        assert!(service.restore().is_none());

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }
}
