//! Login credentials referenced by device targets
//!
//! Secrets are held as [`SecretString`] so they never show up in `Debug`
//! output or log lines. The engine only reads credentials; it never writes
//! them anywhere.

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

/// Username plus password, enable secret and/or private key
#[derive(Debug, Clone)]
pub struct Credential {
    /// Login username
    pub username: String,
    /// Login password (absent for key-only authentication)
    pub secret: Option<SecretString>,
    /// Secret for privileged mode (`enable` on Cisco)
    pub enable_secret: Option<SecretString>,
    /// Private key file used instead of, or in addition to, the password
    pub key_path: Option<PathBuf>,
}

impl Credential {
    /// Creates a password credential
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Some(SecretString::from(password.into())),
            enable_secret: None,
            key_path: None,
        }
    }

    /// Creates a key-based credential
    #[must_use]
    pub fn key(username: impl Into<String>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            username: username.into(),
            secret: None,
            enable_secret: None,
            key_path: Some(key_path.into()),
        }
    }

    /// Adds an enable secret
    #[must_use]
    pub fn with_enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Returns true if a login password is available
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }
}

/// Named credentials passed into a collection run
///
/// Targets refer to entries by name; the store is shared read-only between
/// all workers of a run.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<String, Credential>,
}

impl CredentialStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a credential
    pub fn insert(&mut self, name: impl Into<String>, credential: Credential) {
        self.entries.insert(name.into(), credential);
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, credential: Credential) -> Self {
        self.insert(name, credential);
        self
    }

    /// Looks up a credential by reference name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Credential> {
        self.entries.get(name)
    }

    /// Mutable lookup, used when secrets are filled in interactively
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Credential> {
        self.entries.get_mut(name)
    }

    /// Returns true if the reference exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Reference names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of stored credentials
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no credentials are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
