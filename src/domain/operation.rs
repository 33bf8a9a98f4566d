//! Operation kinds and the per-item operation/result records.

use crate::domain::extra_params::ExtraParams;
use crate::domain::format::SignFormat;
use crate::domain::types::SignatureAlgorithm;
use crate::infra::error::SigningError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Cryptographic operation requested through `cop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CryptoOperation {
    Sign,
    Cosign,
    Countersign,
}

impl CryptoOperation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Cosign => "cosign",
            Self::Countersign => "countersign",
        }
    }

    /// Whether the input is an existing signature rather than fresh data
    #[must_use]
    pub const fn is_multisign(&self) -> bool {
        matches!(self, Self::Cosign | Self::Countersign)
    }
}

impl FromStr for CryptoOperation {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sign" => Ok(Self::Sign),
            "cosign" => Ok(Self::Cosign),
            "countersign" => Ok(Self::Countersign),
            _ => Err(SigningError::UnsupportedOperation(s.to_string())),
        }
    }
}

impl fmt::Display for CryptoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which signers a countersignature applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CounterSignTarget {
    /// Every signer in the signature tree
    Tree,
    /// Only the leaf signers
    #[default]
    Leafs,
}

impl CounterSignTarget {
    /// `tree` (any case) selects the whole tree; anything else means leaves.
    #[must_use]
    pub fn from_config(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case(crate::domain::constants::TARGET_TREE) => Self::Tree,
            _ => Self::Leafs,
        }
    }
}

/// One unit of work for the signing executor.
///
/// `operation` is `None` when the caller sent an operation the pipeline
/// does not know; the executor rejects it before doing any work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOperation {
    pub operation: Option<CryptoOperation>,
    pub raw_operation: Option<String>,
    pub format: SignFormat,
    pub algorithm: SignatureAlgorithm,
    pub data: Option<Vec<u8>>,
    pub extra_params: ExtraParams,
    pub unrecognized: IndexMap<String, String>,
}

/// Output of one successful operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignResult {
    pub signature: Vec<u8>,
    /// DER encoding of the signing certificate
    pub certificate: Vec<u8>,
    pub metadata: Option<ResultMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResultMetadata {
    /// Name of the file the user picked as input
    pub filename: Option<String>,
}

impl SignResult {
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.filename.as_deref())
    }
}
