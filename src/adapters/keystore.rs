//! Keystore, credential and password collaborators.

use crate::domain::constants::{
    EXTRA_ALLOW_EXTERNAL_STORES, EXTRA_FILTER, EXTRA_FILTERS, EXTRA_HEADLESS,
    EXTRA_MANDATORY_CERT_SELECTION,
};
use crate::domain::extra_params::ExtraParams;
use crate::domain::types::{KeyStoreSelection, SignatureAlgorithm};
use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use x509_cert::Certificate;

/// Handle to a private key held by a keystore.
///
/// Key material never leaves the store; engines ask the handle to sign.
pub trait PrivateKey: Send + Sync + fmt::Debug {
    fn alias(&self) -> &str;

    /// Raw signature over `data` with the given algorithm.
    fn sign(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>, String>;
}

/// Private key plus its certificate chain, leaf first.
#[derive(Debug, Clone)]
pub struct PrivateKeyEntry {
    pub key: Arc<dyn PrivateKey>,
    pub chain: Vec<Certificate>,
}

impl PrivateKeyEntry {
    #[must_use]
    pub fn leaf(&self) -> Option<&Certificate> {
        self.chain.first()
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        self.key.alias()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeystoreFault {
    #[error("no keystore named {0}")]
    NotFound(String),

    #[error("keystore access failed: {0}")]
    Access(String),
}

/// Supplies keystore passwords
pub trait PasswordCallback: Send + Sync {
    /// `None` when no password is available.
    fn password(&self, prompt: &str) -> Option<SecretString>;
}

/// Password callback that always returns the same preset password.
#[derive(Clone)]
pub struct CachedPasswordCallback {
    password: SecretString,
}

impl CachedPasswordCallback {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: SecretString::from(password.into()),
        }
    }
}

impl PasswordCallback for CachedPasswordCallback {
    fn password(&self, _prompt: &str) -> Option<SecretString> {
        Some(self.password.clone())
    }
}

impl fmt::Debug for CachedPasswordCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CachedPasswordCallback([REDACTED])")
    }
}

/// An opened keystore
pub trait KeyStoreManager: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    /// [`KeystoreFault::Access`] when the store cannot be enumerated.
    fn aliases(&self) -> Result<Vec<String>, KeystoreFault>;

    /// # Errors
    /// [`KeystoreFault::Access`] when the entry cannot be read.
    fn key_entry(&self, alias: &str) -> Result<PrivateKeyEntry, KeystoreFault>;
}

/// Resolves and opens keystores by name.
pub trait KeyStoreProvider: Send + Sync {
    /// Whether a keystore with this name exists on this platform.
    fn is_known(&self, name: &str) -> bool;

    /// Open a keystore.
    ///
    /// # Errors
    /// Any [`KeystoreFault`]; the caller reports it as a keystore access failure.
    fn open(
        &self,
        selection: &KeyStoreSelection,
        password: &dyn PasswordCallback,
    ) -> Result<Box<dyn KeyStoreManager>, KeystoreFault>;

    /// Password source for the named keystore.
    fn password_callback(&self, name: &str) -> Box<dyn PasswordCallback>;
}

/// Why the certificate selection did not produce a credential
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionFault {
    #[error("certificate selection cancelled")]
    Cancelled,

    #[error("no valid certificates: {0}")]
    NoCertificates(String),

    #[error("certificate selection failed: {0}")]
    Failed(String),
}

/// Hints forwarded to the certificate-selection collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateSelectionHints {
    /// Select without showing a dialog when only one certificate matches
    pub headless: bool,
    /// Raw filter expressions, in declaration order
    pub filters: Vec<String>,
    /// The filters must leave exactly one certificate
    pub mandatory: bool,
    pub allow_external_stores: bool,
}

impl CertificateSelectionHints {
    #[must_use]
    pub fn from_params(params: &ExtraParams) -> Self {
        let filters = params
            .iter()
            .filter(|(key, _)| {
                *key == EXTRA_FILTER
                    || *key == EXTRA_FILTERS
                    || key
                        .strip_prefix(EXTRA_FILTERS)
                        .and_then(|rest| rest.strip_prefix('.'))
                        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            })
            .map(|(_, value)| value.to_string())
            .collect();

        Self {
            headless: params.get_bool(EXTRA_HEADLESS).unwrap_or(false),
            filters,
            mandatory: params
                .get_bool(EXTRA_MANDATORY_CERT_SELECTION)
                .unwrap_or(false),
            allow_external_stores: params.get_bool(EXTRA_ALLOW_EXTERNAL_STORES).unwrap_or(true),
        }
    }
}

/// Lets the user pick a signing credential.
pub trait CertificateSelector: Send + Sync {
    /// # Errors
    /// [`SelectionFault`] describing why no credential was chosen.
    fn select(
        &self,
        manager: &dyn KeyStoreManager,
        hints: &CertificateSelectionHints,
    ) -> Result<PrivateKeyEntry, SelectionFault>;
}
