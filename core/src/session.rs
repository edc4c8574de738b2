//! Bearer-token session and where it is kept.
//!
//! # Design
//! The session is an explicit object handed to `ApiClient`, not ambient
//! global state. It is read on every outgoing request, written once at
//! login, and cleared at logout or whenever any authenticated call comes
//! back 401. `invalidate` also fires an optional callback so the host can
//! react (e.g. route to the login page) without polling.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

const TOKEN_ENTRY: &str = "auth_token";
const EXPIRES_AT_ENTRY: &str = "auth_expires_at";
const EMAIL_ENTRY: &str = "auth_email";

/// An authenticated session: an opaque bearer token plus its metadata.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_at: String,
    pub email: String,
}

// Keep the token out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Client-local persistence for the session.
pub trait SessionStore {
    fn load(&self) -> Option<Session>;
    fn save(&mut self, session: &Session) -> Result<(), SessionError>;
    fn clear(&mut self) -> Result<(), SessionError>;
}

/// Keeps the session in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Option<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.session.clone()
    }

    fn save(&mut self, session: &Session) -> Result<(), SessionError> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.session = None;
        Ok(())
    }
}

/// Keeps the session as three independent entries (one file each) in a
/// directory: `auth_token`, `auth_expires_at`, `auth_email`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_entry(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(name)).ok()
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let token = self.read_entry(TOKEN_ENTRY).filter(|t| !t.is_empty())?;
        Some(Session {
            token,
            expires_at: self.read_entry(EXPIRES_AT_ENTRY).unwrap_or_default(),
            email: self.read_entry(EMAIL_ENTRY).unwrap_or_default(),
        })
    }

    fn save(&mut self, session: &Session) -> Result<(), SessionError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(TOKEN_ENTRY), &session.token)?;
        fs::write(self.dir.join(EXPIRES_AT_ENTRY), &session.expires_at)?;
        fs::write(self.dir.join(EMAIL_ENTRY), &session.email)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        for name in [TOKEN_ENTRY, EXPIRES_AT_ENTRY, EMAIL_ENTRY] {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// The session handed to `ApiClient`.
pub struct SessionContext {
    store: Box<dyn SessionStore>,
    on_invalidate: Option<Box<dyn FnMut()>>,
}

impl SessionContext {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            on_invalidate: None,
        }
    }

    /// A context with an in-memory store and no session.
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    /// Register a callback run every time the session is invalidated.
    pub fn on_invalidate(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_invalidate = Some(Box::new(callback));
        self
    }

    pub fn current(&self) -> Option<Session> {
        self.store.load()
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persist a freshly issued session.
    pub fn begin(&mut self, session: Session) -> Result<(), SessionError> {
        info!(email = %session.email, "session started");
        self.store.save(&session)
    }

    /// User-initiated logout.
    pub fn end(&mut self) {
        info!("session ended");
        self.clear_store();
    }

    /// The backend rejected the token. Clears the session and notifies.
    pub fn invalidate(&mut self) {
        warn!("session invalidated by 401 response");
        self.clear_store();
        if let Some(callback) = self.on_invalidate.as_mut() {
            callback();
        }
    }

    fn clear_store(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear session store");
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
