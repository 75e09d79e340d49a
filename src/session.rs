//! The identity cached on this machine between requests.
//!
//! The real credentials live in cookies managed by the HTTP client; this is
//! just enough local state to know who we think is logged in and which part
//! of the API they talk to.

use crate::id::UserId;
use parking_lot::Mutex;
use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug, Display, Formatter},
    io,
    path::{Path, PathBuf},
};

/// Who a session belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Has access to the dashboard.
    Admin,
    /// An ordinary shopper.
    User,
}

impl Role {
    /// The REST namespace this role's requests live under.
    pub fn namespace(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "users",
        }
    }

    pub fn login_path(self) -> &'static str {
        match self {
            Role::Admin => "/api/admin/login",
            Role::User => "/api/users/login",
        }
    }

    pub fn logout_path(self) -> &'static str {
        match self {
            Role::Admin => "/api/admin/logout",
            Role::User => "/api/users/logout",
        }
    }

    pub fn refresh_path(self) -> &'static str {
        match self {
            Role::Admin => "/api/admin/refresh-token",
            Role::User => "/api/users/refresh-token",
        }
    }

    /// Where to send someone whose session could not be refreshed.
    pub fn expired_entry_point(self) -> EntryPoint {
        match self {
            Role::Admin => EntryPoint::AdminLogin,
            Role::User => EntryPoint::Login,
        }
    }

    /// Where to send someone after they log out.
    pub fn logout_entry_point(self) -> EntryPoint {
        match self {
            Role::Admin => EntryPoint::Home,
            Role::User => EntryPoint::Login,
        }
    }

    /// Where someone lands after logging in.
    pub fn landing_entry_point(self) -> EntryPoint {
        match self {
            Role::Admin => EntryPoint::Dashboard,
            Role::User => EntryPoint::Home,
        }
    }
}

impl Default for Role {
    fn default() -> Role { Role::User }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// A place in the storefront the caller should take the user to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    Home,
    Login,
    AdminLogin,
    Dashboard,
}

impl EntryPoint {
    pub fn path(self) -> &'static str {
        match self {
            EntryPoint::Home => "/",
            EntryPoint::Login => "/login",
            EntryPoint::AdminLogin => "/admin/login",
            EntryPoint::Dashboard => "/dashboard",
        }
    }
}

impl Display for EntryPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The locally cached identity.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Session {
    pub role: Role,
    /// Only shoppers have a user ID.
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    /// A bearer token, when the backend hands one out (admin logins do).
    #[serde(default)]
    pub token: Option<String>,
}

impl Session {
    pub fn user(user_id: UserId, name: &str, email: &str) -> Self {
        Session {
            role: Role::User,
            user_id: Some(user_id),
            name: name.to_string(),
            email: email.to_string(),
            token: None,
        }
    }

    pub fn admin(name: &str, email: &str, token: Option<String>) -> Self {
        Session {
            role: Role::Admin,
            user_id: None,
            name: name.to_string(),
            email: email.to_string(),
            token,
        }
    }

    /// Does this look like a usable login (a name, plus either a user ID or
    /// the admin role)?
    pub fn is_logged_in(&self) -> bool {
        !self.name.is_empty()
            && (self.user_id.is_some() || self.role == Role::Admin)
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Somewhere to keep the [`Session`] between requests.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StoreError>;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    /// Forget everything. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// A [`SessionStore`] that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    session: Mutex<Option<Session>>,
}

impl MemoryStore {
    pub fn new() -> Self { MemoryStore::default() }

    pub fn with_session(session: Session) -> Self {
        MemoryStore {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.session.lock().clone())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.session.lock() = None;
        Ok(())
    }
}

/// A [`SessionStore`] backed by a JSON file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { FileStore { path: path.into() } }

    /// `$CONFIG_DIR/motlupets/session.json`, if the platform has a config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("session.json"))
    }

    pub fn path(&self) -> &Path { &self.path }

    fn io_error(&self, inner: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            inner,
        }
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&raw).map(Some).map_err(StoreError::from)
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let serialized = serde_json::to_string_pretty(session)?;
        log::trace!("Saving the session to {}", self.path.display());
        std::fs::write(&self.path, serialized).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Errors that may occur while reading or writing a [`SessionStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unable to access \"{}\"", path.display())]
    Io {
        path: PathBuf,
        #[source]
        inner: io::Error,
    },
    #[error("The stored session is corrupted")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shopper() -> Session { Session::user(UserId::from("u1"), "Asha", "asha@example.com") }

    #[test]
    fn roles_pick_their_refresh_endpoint() {
        assert_eq!(Role::Admin.refresh_path(), "/api/admin/refresh-token");
        assert_eq!(Role::User.refresh_path(), "/api/users/refresh-token");
        assert_eq!(Role::Admin.expired_entry_point().path(), "/admin/login");
        assert_eq!(Role::User.expired_entry_point().path(), "/login");
    }

    #[test]
    fn logged_in_needs_a_name_and_an_identity() {
        assert!(shopper().is_logged_in());
        assert!(Session::admin("Root", "root@example.com", None).is_logged_in());

        let mut anonymous = shopper();
        anonymous.user_id = None;
        assert!(!anonymous.is_logged_in());

        let mut nameless = shopper();
        nameless.name.clear();
        assert!(!nameless.is_logged_in());
    }

    #[test]
    fn tokens_are_redacted_when_debugging() {
        let session = Session::admin("Root", "root@example.com", Some(String::from("s3cr3t")));

        let got = format!("{:?}", session);

        assert!(!got.contains("s3cr3t"));
        assert!(got.contains("<redacted>"));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&shopper()).unwrap();
        assert_eq!(store.load().unwrap(), Some(shopper()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileStore::new(&path);

        assert_eq!(store.load().unwrap(), None);
        store.save(&shopper()).unwrap();
        assert!(path.exists());

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(shopper()));

        reopened.clear().unwrap();
        assert!(!path.exists());
        reopened.clear().unwrap();
    }

    #[test]
    fn corrupted_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileStore::new(&path).load().unwrap_err();

        assert!(matches!(err, StoreError::Json(_)));
    }
}
