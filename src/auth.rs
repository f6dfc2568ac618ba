//! Session credential persistence and authentication gating
//!
//! The bearer token issued at login is stored in the operating system's
//! native credential store (Keychain on macOS, Secret Service on Linux,
//! Windows Credential Manager on Windows), serialized as JSON together
//! with the time it was saved. The keyring is stateless; [`CredentialStore`]
//! is a namespaced accessor around it.
//!
//! Absence of a credential is the unauthenticated state, never an error.
//! Protected commands consult [`AuthGate`] before doing anything else and
//! bail out to the login hint without touching the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParlanceError, Result};

/// Default keyring service name for the stored session credential
const DEFAULT_SERVICE: &str = "parlance";

/// Keyring account name under which the credential is stored
const CREDENTIAL_ACCOUNT: &str = "backend-session";

// ---------------------------------------------------------------------------
// StoredCredential
// ---------------------------------------------------------------------------

/// The persisted session credential.
///
/// `access_token` is the opaque bearer token returned by the backend's
/// login endpoint. `saved_at` records when it was written; the backend
/// decides validity, the client only reports the age on `/status`-style
/// displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Opaque bearer token issued at login
    pub access_token: String,

    /// UTC timestamp at which the token was stored
    pub saved_at: DateTime<Utc>,
}

impl StoredCredential {
    /// Wrap a freshly issued token with the current timestamp
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            saved_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Namespaced accessor for the OS native keyring.
///
/// The credential lives under a fixed service/account pair so that every
/// part of the client reads and writes the same entry. Tests construct a
/// store with a throwaway service name to avoid clobbering a real session.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Store accessor for the standard service name
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Store accessor for an explicit service name
    ///
    /// # Arguments
    ///
    /// * `service` - Keyring service name (tests pass a unique name)
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, CREDENTIAL_ACCOUNT)
            .map_err(|e| ParlanceError::Keyring(e).into())
    }

    /// Persist the credential, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns [`ParlanceError::Serialization`] if JSON serialization fails
    /// or [`ParlanceError::Keyring`] if the OS credential store rejects the
    /// write.
    pub fn save(&self, credential: &StoredCredential) -> Result<()> {
        let json_str = serde_json::to_string(credential).map_err(ParlanceError::Serialization)?;
        self.entry()?
            .set_password(&json_str)
            .map_err(ParlanceError::Keyring)?;
        tracing::debug!(service = %self.service, "Stored session credential");
        Ok(())
    }

    /// Load the credential, if one is stored
    ///
    /// A missing entry is `Ok(None)`; a corrupt payload is discarded (and
    /// logged) rather than propagated, since the only recovery is to sign
    /// in again.
    pub fn load(&self) -> Result<Option<StoredCredential>> {
        let raw = match self.entry()?.get_password() {
            Ok(raw) => raw,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(ParlanceError::Keyring(e).into()),
        };

        match serde_json::from_str(&raw) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!("Discarding unreadable stored credential: {}", e);
                Ok(None)
            }
        }
    }

    /// Delete the stored credential
    ///
    /// Deleting an absent entry is a no-op, so sign-out is idempotent.
    pub fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) => {
                tracing::debug!(service = %self.service, "Cleared session credential");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ParlanceError::Keyring(e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthGate
// ---------------------------------------------------------------------------

/// Authentication state as seen by a view before and after the gate check
///
/// `Unknown` is the initial state before the store has been consulted;
/// views render a neutral placeholder for it instead of flashing protected
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// The store has not been consulted yet
    Unknown,
    /// A credential is present and presumed valid
    Authenticated(StoredCredential),
    /// No credential is stored
    Unauthenticated,
}

impl Default for AuthStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl AuthStatus {
    /// True only once the check resolved to a present credential
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Gate protecting data-fetching commands behind the stored credential
pub struct AuthGate;

impl AuthGate {
    /// Resolve the current authentication status from the store
    ///
    /// A keyring failure is treated as unauthenticated (and logged): the
    /// caller cannot do better than ask the user to sign in again.
    pub fn resolve(store: &CredentialStore) -> AuthStatus {
        match store.load() {
            Ok(Some(credential)) => AuthStatus::Authenticated(credential),
            Ok(None) => AuthStatus::Unauthenticated,
            Err(e) => {
                tracing::warn!("Credential lookup failed, treating as signed out: {}", e);
                AuthStatus::Unauthenticated
            }
        }
    }

    /// Require a credential, short-circuiting the protected operation
    ///
    /// # Errors
    ///
    /// Returns [`ParlanceError::AuthRequired`] when no credential is
    /// stored; no network request may be issued past that point.
    pub fn require(store: &CredentialStore) -> Result<StoredCredential> {
        match Self::resolve(store) {
            AuthStatus::Authenticated(credential) => Ok(credential),
            _ => Err(
                ParlanceError::AuthRequired("sign in with `parlance login`".to_string()).into(),
            ),
        }
    }
}
