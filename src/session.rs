//! Where the authentication token lives between requests.
//!
//! Request code never looks the token up on its own; it asks a
//! [`SessionProvider`] handed to the [`Client`](crate::Client).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::warn;

use crate::token::Token;

/// Key the token is persisted under.
pub const TOKEN_KEY: &str = "token";

/// Something that can tell whether the user is logged in.
pub trait SessionProvider {
    /// The current token, or `None` when not logged in.
    fn auth_token(&self) -> Option<Token>;

    fn is_logged_in(&self) -> bool {
        self.auth_token().is_some()
    }
}

impl<'a, P: SessionProvider + ?Sized> SessionProvider for &'a P {
    fn auth_token(&self) -> Option<Token> {
        (**self).auth_token()
    }
}

impl<P: SessionProvider + ?Sized> SessionProvider for Arc<P> {
    fn auth_token(&self) -> Option<Token> {
        (**self).auth_token()
    }
}

/// A session kept in memory only. Clones share the same token.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
    token: Arc<Mutex<Option<Token>>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        let session = Self::new();
        session.set(token);
        session
    }

    pub fn set(&self, token: Token) {
        *self.lock() = Some(token);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Token>> {
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionProvider for MemorySession {
    fn auth_token(&self) -> Option<Token> {
        self.lock().clone()
    }
}

/// A JSON key-value file holding the token under [`TOKEN_KEY`].
///
/// The file is read on every lookup, so a login from another process is picked
/// up without restarting. Other keys in the file are preserved.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &Token) -> io::Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_owned(), Value::String(token.as_str().to_owned()));
        self.write_entries(&entries)
    }

    pub fn clear(&self) -> io::Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn read_entries(&self) -> io::Result<BTreeMap<String, Value>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write_entries(&self, entries: &BTreeMap<String, Value>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, data)
    }
}

impl SessionProvider for TokenStore {
    fn auth_token(&self) -> Option<Token> {
        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), "failed to read the token store: {}", e);
                return None;
            }
        };
        match entries.get(TOKEN_KEY) {
            Some(Value::String(t)) if !t.is_empty() => Some(Token::new(t.as_str())),
            _ => None,
        }
    }
}
