//! Validated newtypes for request values.
//!
//! Each type checks its invariant on construction so the rest of the pipeline
//! can rely on it without re-validating.

use crate::domain::constants::{
    CIPHER_KEY_LENGTH, MAX_SESSION_ID_LENGTH, RESERVED_FILENAME_CHARS,
    SUPPORTED_SIGNATURE_ALGORITHMS,
};
use crate::infra::error::{SigningError, SigningResult};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use url::{Host, Url};

/// Session identifier, safe to use as a filename component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session identifier after validation
    ///
    /// # Errors
    /// [`SigningError::InvalidParameter`] when longer than 20 characters or not ASCII alphanumeric.
    pub fn new(id: impl AsRef<str>) -> SigningResult<Self> {
        let id = id.as_ref();
        if id.chars().count() > MAX_SESSION_ID_LENGTH {
            return Err(SigningError::InvalidParameter(format!(
                "session identifier is longer than {MAX_SESSION_ID_LENGTH} characters"
            )));
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SigningError::InvalidParameter(
                "session identifier must be alphanumeric".to_string(),
            ));
        }
        Ok(Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signature algorithm from the fixed allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "SHA1withRSA")]
    Sha1WithRsa,
    #[serde(rename = "SHA256withRSA")]
    Sha256WithRsa,
    #[serde(rename = "SHA384withRSA")]
    Sha384WithRsa,
    #[serde(rename = "SHA512withRSA")]
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    /// Protocol name of the algorithm
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha1WithRsa => "SHA1withRSA",
            Self::Sha256WithRsa => "SHA256withRSA",
            Self::Sha384WithRsa => "SHA384withRSA",
            Self::Sha512WithRsa => "SHA512withRSA",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SigningError;

    /// Names are matched exactly; `sha256withrsa` is not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHA1withRSA" => Ok(Self::Sha1WithRsa),
            "SHA256withRSA" => Ok(Self::Sha256WithRsa),
            "SHA384withRSA" => Ok(Self::Sha384WithRsa),
            "SHA512withRSA" => Ok(Self::Sha512WithRsa),
            other => {
                debug_assert!(!SUPPORTED_SIGNATURE_ALGORITHMS.contains(&other));
                Err(SigningError::UnsupportedAlgorithm(other.to_string()))
            }
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output filename free of reserved filesystem characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Filename(String);

impl Filename {
    /// # Errors
    /// [`SigningError::InvalidFilename`] naming the first reserved character found,
    /// checked in the order `\ / : * ? " < > |`.
    pub fn new(name: impl AsRef<str>) -> SigningResult<Self> {
        let name = name.as_ref();
        if let Some(c) = RESERVED_FILENAME_CHARS
            .iter()
            .copied()
            .find(|c| name.contains(*c))
        {
            return Err(SigningError::InvalidFilename(c));
        }
        Ok(Self(name.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key used to encrypt the response before it is returned
#[derive(Clone)]
pub struct CipherKey(SecretString);

impl CipherKey {
    /// # Errors
    /// [`SigningError::InvalidParameter`] unless the key is exactly 8 characters.
    pub fn new(key: impl AsRef<str>) -> SigningResult<Self> {
        let key = key.as_ref();
        if key.chars().count() != CIPHER_KEY_LENGTH {
            return Err(SigningError::InvalidParameter(format!(
                "cipher key must be {CIPHER_KEY_LENGTH} characters"
            )));
        }
        Ok(Self(SecretString::from(key.to_string())))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

impl PartialEq for CipherKey {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for CipherKey {}

/// Dotted numeric version; missing components compare as zero.
#[derive(Debug, Clone, Serialize)]
#[serde(into = "String")]
pub struct ClientVersion {
    components: Vec<u64>,
    text: String,
}

impl ClientVersion {
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for ClientVersion {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(SigningError::InvalidParameter(
                "empty version string".to_string(),
            ));
        }
        let components = text
            .split('.')
            .map(|part| {
                // Trailing qualifiers such as "1.8.2-rc1" keep their numeric prefix
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse::<u64>().map_err(|_| {
                    SigningError::InvalidParameter(format!("invalid version string: {s}"))
                })
            })
            .collect::<SigningResult<Vec<_>>>()?;
        Ok(Self {
            components,
            text: text.to_string(),
        })
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<ClientVersion> for String {
    fn from(version: ClientVersion) -> Self {
        version.text
    }
}

impl Ord for ClientVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ClientVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ClientVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ClientVersion {}

/// Keystore requested by the caller, `NAME[:LIB]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStoreSelection {
    pub name: String,
    pub library: Option<String>,
}

impl KeyStoreSelection {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            library: None,
        }
    }
}

impl FromStr for KeyStoreSelection {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, library) = match s.split_once(':') {
            Some((name, lib)) if !lib.is_empty() => (name, Some(lib.to_string())),
            Some((name, _)) => (name, None),
            None => (s, None),
        };
        if name.trim().is_empty() {
            return Err(SigningError::InvalidParameter(format!(
                "invalid keystore selection: {s}"
            )));
        }
        Ok(Self {
            name: name.trim().to_string(),
            library,
        })
    }
}

/// Validate a servlet URL supplied by the caller.
///
/// Only `http`/`https` URLs with a host are accepted. Hosts naming the local
/// machine are rejected with [`SigningError::LocalAccessNotAllowed`] unless
/// `allow_local` is set. Host names are not resolved.
///
/// # Errors
/// [`SigningError::InvalidParameter`] for malformed URLs.
pub fn validate_url(raw: &str, allow_local: bool) -> SigningResult<Url> {
    let url = Url::parse(raw)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SigningError::InvalidParameter(format!(
            "unsupported URL scheme '{}': {raw}",
            url.scheme()
        )));
    }

    let host = url
        .host()
        .ok_or_else(|| SigningError::InvalidParameter(format!("URL has no host: {raw}")))?;

    if !allow_local && is_local_host(&host) {
        return Err(SigningError::LocalAccessNotAllowed(raw.to_string()));
    }

    Ok(url)
}

fn is_local_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(addr) => is_local_ip(IpAddr::V4(*addr)),
        Host::Ipv6(addr) => is_local_ip(IpAddr::V6(*addr)),
    }
}

fn is_local_ip(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_local_ipv4(v4),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fe80::/10
                || (v6.segments()[0] & 0xffc0) == 0xfe80
                || v6.to_ipv4_mapped().is_some_and(is_local_ipv4)
        }
    }
}

fn is_local_ipv4(v4: Ipv4Addr) -> bool {
    v4.is_loopback() || v4.is_unspecified() || v4.is_link_local()
}
