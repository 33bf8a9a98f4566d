//! Signer engine interface.
//!
//! Engines physically build signatures for one container format. The
//! pipeline only decides which engine runs and with what inputs; every
//! engine failure comes back as an [`EngineFault`] and is mapped to an
//! error code by the classifier.

use crate::adapters::keystore::PrivateKeyEntry;
use crate::domain::extra_params::ExtraParams;
use crate::domain::operation::{CounterSignTarget, CryptoOperation};
use crate::domain::types::SignatureAlgorithm;
use thiserror::Error;

/// Failure categories an engine can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineFault {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("triphase server error: {0}")]
    Triphase(String),

    #[error("invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("PDF password missing or wrong: {0}")]
    BadPassword(String),

    #[error("PDF is certified: {0}")]
    CertifiedPdf(String),

    #[error("PDF has unregistered signatures: {0}")]
    UnregisteredSignatures(String),

    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("file does not match the format: {0}")]
    InvalidFileFormat(String),

    #[error("malformed electronic invoice: {0}")]
    MalformedInvoice(String),

    #[error("electronic invoice already signed: {0}")]
    InvoiceAlreadySigned(String),

    #[error("signature contains no data: {0}")]
    ContainsNoData(String),

    #[error("input is not a supported signature: {0}")]
    NotASignature(String),

    #[error("operation not supported by this engine: {0}")]
    UnsupportedOperation(String),

    #[error("input signature is not valid: {0}")]
    InvalidSignature(String),

    #[error("cancelled by the user")]
    Cancelled,

    #[error("signature failed: {0}")]
    Signature(String),

    #[error("{0}")]
    Other(String),
}

/// Why a validator rejected a prior signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidityError {
    /// The input is not a signature at all
    NoSign,
    UnknownError,
    Other(String),
}

/// Verdict of a prior-signature validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignValidity {
    Valid,
    /// The validator could not reach a verdict
    Unknown,
    Invalid(ValidityError),
}

/// Checks existing signatures before they are extended.
pub trait SignValidator: Send + Sync {
    /// # Errors
    /// Returns an I/O error when the data cannot be analysed.
    fn validate(&self, data: &[u8]) -> std::io::Result<SignValidity>;
}

/// A signature engine for one container format.
pub trait SignerEngine: Send + Sync {
    /// Native format name, as used in requests.
    fn format(&self) -> &str;

    /// Sign fresh data.
    fn sign(
        &self,
        data: &[u8],
        algorithm: SignatureAlgorithm,
        key: &PrivateKeyEntry,
        params: &ExtraParams,
    ) -> Result<Vec<u8>, EngineFault>;

    /// Add a parallel signature to an existing one.
    fn cosign(
        &self,
        signature: &[u8],
        algorithm: SignatureAlgorithm,
        key: &PrivateKeyEntry,
        params: &ExtraParams,
    ) -> Result<Vec<u8>, EngineFault>;

    /// Countersign the selected signers of an existing signature.
    fn countersign(
        &self,
        signature: &[u8],
        algorithm: SignatureAlgorithm,
        target: CounterSignTarget,
        key: &PrivateKeyEntry,
        params: &ExtraParams,
    ) -> Result<Vec<u8>, EngineFault>;

    /// Whether `data` is a signature this engine produced.
    fn is_sign(&self, data: &[u8]) -> bool;

    /// Whether the operation needs input data supplied by the user.
    ///
    /// Engines that can fetch or synthesise their own input (triphase
    /// engines, for example) return `false`.
    fn needs_data(&self, _operation: CryptoOperation, _params: &ExtraParams) -> bool {
        true
    }

    /// Filename proposed for the signed output, given the input's stem.
    fn signed_name(&self, stem: &str) -> String {
        format!("{stem}.sig")
    }

    /// Validator for signatures of this format, if one exists.
    fn validator(&self) -> Option<&dyn SignValidator> {
        None
    }
}
