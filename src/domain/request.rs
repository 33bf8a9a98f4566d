//! Typed request descriptors produced by parameter validation.

use crate::domain::extra_params::ExtraParams;
use crate::domain::format::SignFormat;
use crate::domain::operation::{CryptoOperation, SignOperation};
use crate::domain::types::{
    CipherKey, ClientVersion, Filename, KeyStoreSelection, SessionId, SignatureAlgorithm,
};
use indexmap::IndexMap;
use serde::Serialize;
use url::Url;

/// Raw, case-sensitive request parameters in arrival order
pub type ParameterMap = IndexMap<String, String>;

/// A fully validated sign/cosign/countersign request.
#[derive(Debug, Clone, Serialize)]
pub struct SignRequest {
    /// `cop` exactly as received; unknown values are rejected at execution
    pub raw_operation: Option<String>,
    pub format: SignFormat,
    pub algorithm: SignatureAlgorithm,
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
    pub session_id: Option<SessionId>,
    pub protocol_version: String,
    pub extra_params: ExtraParams,
    pub sticky: bool,
    pub reset_sticky: bool,
    pub keystore: Option<KeyStoreSelection>,
    pub filename: Option<Filename>,
    pub retrieve_servlet: Option<Url>,
    pub storage_servlet: Option<Url>,
    #[serde(skip)]
    pub cipher_key: Option<CipherKey>,
    pub active_waiting: bool,
    pub minimum_client_version: Option<ClientVersion>,
    pub unrecognized: ParameterMap,
}

impl SignRequest {
    /// Parsed operation kind, `None` when `cop` is missing or unknown
    #[must_use]
    pub fn operation(&self) -> Option<CryptoOperation> {
        self.raw_operation.as_deref().and_then(|op| op.parse().ok())
    }

    /// Materialize the single operation this request describes.
    #[must_use]
    pub fn to_operation(&self) -> SignOperation {
        SignOperation {
            operation: self.operation(),
            raw_operation: self.raw_operation.clone(),
            format: self.format.clone(),
            algorithm: self.algorithm,
            data: self.data.clone(),
            extra_params: self.extra_params.clone(),
            unrecognized: self.unrecognized.clone(),
        }
    }
}

/// Request that only names a stored configuration to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredConfigRequest {
    pub file_id: String,
    pub session_id: Option<SessionId>,
    pub raw_operation: Option<String>,
    pub protocol_version: String,
    pub retrieve_servlet: Option<Url>,
    pub unrecognized: ParameterMap,
}

/// Result of validating a parameter map.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatedRequest {
    Sign(Box<SignRequest>),
    StoredConfig(StoredConfigRequest),
}
