//! Error types for signature-request processing.
//!
//! Every failure the pipeline can report maps onto exactly one [`ErrorCode`]
//! from a closed taxonomy. User cancellation is not an error and travels as
//! [`Abort::Cancelled`] instead.

use std::fmt;
use thiserror::Error;

/// Result type for operations that can only fail with a coded error
pub type SigningResult<T> = Result<T, SigningError>;

/// Result type for operations that may also be cancelled by the user
pub type SignFlow<T> = Result<T, Abort>;

/// Stable wire strings for every [`ErrorCode`].
pub mod error_codes {
    pub const INVALID_PARAMETER: &str = "INVALID_PARAMETER";
    pub const MISSING_FORMAT: &str = "MISSING_FORMAT";
    pub const MISSING_ALGORITHM: &str = "MISSING_ALGORITHM";
    pub const UNSUPPORTED_ALGORITHM: &str = "UNSUPPORTED_ALGORITHM";
    pub const INVALID_FILENAME: &str = "INVALID_FILENAME";
    pub const LOCAL_ACCESS_NOT_ALLOWED: &str = "LOCAL_ACCESS_NOT_ALLOWED";
    pub const INCOMPATIBLE_POLICY: &str = "INCOMPATIBLE_POLICY";

    pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
    pub const UNKNOWN_SIGNER_OR_FORMAT: &str = "UNKNOWN_SIGNER_OR_FORMAT";
    pub const UNSUPPORTED_OPERATION: &str = "UNSUPPORTED_OPERATION";
    pub const UNSUPPORTED_PROTOCOL_VERSION: &str = "UNSUPPORTED_PROTOCOL_VERSION";
    pub const MINIMUM_VERSION_NOT_SATISFIED: &str = "MINIMUM_VERSION_NOT_SATISFIED";

    pub const INVALID_PRIOR_SIGNATURE: &str = "INVALID_PRIOR_SIGNATURE";
    pub const BAD_CONTAINER_PASSWORD: &str = "BAD_CONTAINER_PASSWORD";
    pub const CERTIFIED_CONTAINER: &str = "CERTIFIED_CONTAINER";
    pub const UNREGISTERED_SIGNATURE_CONTAINER: &str = "UNREGISTERED_SIGNATURE_CONTAINER";
    pub const INVALID_PDF: &str = "INVALID_PDF";
    pub const MALFORMED_MARKUP: &str = "MALFORMED_MARKUP";
    pub const INVALID_DATA: &str = "INVALID_DATA";
    pub const MALFORMED_STRUCTURED_DOCUMENT: &str = "MALFORMED_STRUCTURED_DOCUMENT";
    pub const STRUCTURED_DOCUMENT_ALREADY_SIGNED: &str = "STRUCTURED_DOCUMENT_ALREADY_SIGNED";
    pub const NO_SIGNABLE_DATA: &str = "NO_SIGNABLE_DATA";
    pub const NO_SIGN_DATA: &str = "NO_SIGN_DATA";
    pub const SIGNATURE_FAILED: &str = "SIGNATURE_FAILED";
    pub const RECOVER_SERVER_DOCUMENT: &str = "RECOVER_SERVER_DOCUMENT";
    pub const CANNOT_FIND_KEYSTORE: &str = "CANNOT_FIND_KEYSTORE";
    pub const KEYSTORE_ACCESS: &str = "KEYSTORE_ACCESS";
    pub const NO_CERTIFICATES: &str = "NO_CERTIFICATES";
    pub const CERTIFICATE_DECODING: &str = "CERTIFICATE_DECODING";
    pub const VISIBLE_SIGNATURE_MANDATORY: &str = "VISIBLE_SIGNATURE_MANDATORY";

    pub const CANNOT_READ_DATA: &str = "CANNOT_READ_DATA";
    pub const CANNOT_SAVE_DATA: &str = "CANNOT_SAVE_DATA";
    pub const POST_PROCESSING_FAILED: &str = "POST_PROCESSING_FAILED";
    pub const ENCRYPTION_FAILED: &str = "ENCRYPTION_FAILED";

    /// Marker returned instead of an error code when the user aborted.
    pub const CANCEL: &str = "CANCEL";
}

/// Closed taxonomy of symbolic error codes returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Input / configuration
    InvalidParameter,
    MissingFormat,
    MissingAlgorithm,
    UnsupportedAlgorithm,
    InvalidFilename,
    LocalAccessNotAllowed,
    IncompatiblePolicy,
    // Resolution
    UnsupportedFormat,
    UnknownSignerOrFormat,
    UnsupportedOperation,
    UnsupportedProtocolVersion,
    MinimumVersionNotSatisfied,
    // Data / engine faults
    InvalidPriorSignature,
    BadContainerPassword,
    CertifiedContainer,
    UnregisteredSignatureContainer,
    InvalidPdf,
    MalformedMarkup,
    InvalidData,
    MalformedStructuredDocument,
    StructuredDocumentAlreadySigned,
    NoSignableData,
    NoSignData,
    SignatureFailed,
    RecoverServerDocument,
    CannotFindKeystore,
    KeystoreAccess,
    NoCertificates,
    CertificateDecoding,
    VisibleSignatureMandatory,
    // I/O
    CannotReadData,
    CannotSaveData,
    PostProcessingFailed,
    EncryptionFailed,
}

impl ErrorCode {
    /// Stable string sent back to the caller.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        use error_codes as c;
        match self {
            Self::InvalidParameter => c::INVALID_PARAMETER,
            Self::MissingFormat => c::MISSING_FORMAT,
            Self::MissingAlgorithm => c::MISSING_ALGORITHM,
            Self::UnsupportedAlgorithm => c::UNSUPPORTED_ALGORITHM,
            Self::InvalidFilename => c::INVALID_FILENAME,
            Self::LocalAccessNotAllowed => c::LOCAL_ACCESS_NOT_ALLOWED,
            Self::IncompatiblePolicy => c::INCOMPATIBLE_POLICY,
            Self::UnsupportedFormat => c::UNSUPPORTED_FORMAT,
            Self::UnknownSignerOrFormat => c::UNKNOWN_SIGNER_OR_FORMAT,
            Self::UnsupportedOperation => c::UNSUPPORTED_OPERATION,
            Self::UnsupportedProtocolVersion => c::UNSUPPORTED_PROTOCOL_VERSION,
            Self::MinimumVersionNotSatisfied => c::MINIMUM_VERSION_NOT_SATISFIED,
            Self::InvalidPriorSignature => c::INVALID_PRIOR_SIGNATURE,
            Self::BadContainerPassword => c::BAD_CONTAINER_PASSWORD,
            Self::CertifiedContainer => c::CERTIFIED_CONTAINER,
            Self::UnregisteredSignatureContainer => c::UNREGISTERED_SIGNATURE_CONTAINER,
            Self::InvalidPdf => c::INVALID_PDF,
            Self::MalformedMarkup => c::MALFORMED_MARKUP,
            Self::InvalidData => c::INVALID_DATA,
            Self::MalformedStructuredDocument => c::MALFORMED_STRUCTURED_DOCUMENT,
            Self::StructuredDocumentAlreadySigned => c::STRUCTURED_DOCUMENT_ALREADY_SIGNED,
            Self::NoSignableData => c::NO_SIGNABLE_DATA,
            Self::NoSignData => c::NO_SIGN_DATA,
            Self::SignatureFailed => c::SIGNATURE_FAILED,
            Self::RecoverServerDocument => c::RECOVER_SERVER_DOCUMENT,
            Self::CannotFindKeystore => c::CANNOT_FIND_KEYSTORE,
            Self::KeystoreAccess => c::KEYSTORE_ACCESS,
            Self::NoCertificates => c::NO_CERTIFICATES,
            Self::CertificateDecoding => c::CERTIFICATE_DECODING,
            Self::VisibleSignatureMandatory => c::VISIBLE_SIGNATURE_MANDATORY,
            Self::CannotReadData => c::CANNOT_READ_DATA,
            Self::CannotSaveData => c::CANNOT_SAVE_DATA,
            Self::PostProcessingFailed => c::POST_PROCESSING_FAILED,
            Self::EncryptionFailed => c::ENCRYPTION_FAILED,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced by the signing pipeline, each naming its code precisely.
#[derive(Error, Debug, Clone, PartialEq, Eq, miette::Diagnostic)]
pub enum SigningError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Signature format parameter was not received")]
    MissingFormat,

    #[error("Signature algorithm parameter was not received")]
    MissingAlgorithm,

    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Filename contains the invalid character '{0}'")]
    InvalidFilename(char),

    #[error("Local access not allowed: {0}")]
    LocalAccessNotAllowed(String),

    #[error("Incompatible signature policy: {0}")]
    IncompatiblePolicy(String),

    #[error("No signer configured for format: {0}")]
    UnsupportedFormat(String),

    #[error("Data is not a recognised signature or could not be analysed: {0}")]
    UnknownSignerOrFormat(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unsupported protocol version {requested} (highest supported: {supported})")]
    UnsupportedProtocolVersion { requested: String, supported: u32 },

    #[error("Minimum client version {required} is greater than running version {running}")]
    MinimumVersionNotSatisfied { required: String, running: String },

    #[error("Prior signature is not valid: {0}")]
    InvalidPriorSignature(String),

    #[error("Wrong container password: {0}")]
    BadContainerPassword(String),

    #[error("Container is certified and cannot be signed: {0}")]
    CertifiedContainer(String),

    #[error("Container holds unregistered signatures: {0}")]
    UnregisteredSignatureContainer(String),

    #[error("Invalid PDF document: {0}")]
    InvalidPdf(String),

    #[error("Malformed XML: {0}")]
    MalformedMarkup(String),

    #[error("Data does not match the signature format: {0}")]
    InvalidData(String),

    #[error("Malformed electronic invoice: {0}")]
    MalformedStructuredDocument(String),

    #[error("Electronic invoice is already signed: {0}")]
    StructuredDocumentAlreadySigned(String),

    #[error("Signature contains no signable data: {0}")]
    NoSignableData(String),

    #[error("Input is not a valid signature for this operation: {0}")]
    NoSignData(String),

    #[error("Signature operation failed: {0}")]
    SignatureFailed(String),

    #[error("Could not recover the document from the signing server: {0}")]
    RecoverServerDocument(String),

    #[error("Keystore not found: {0}")]
    CannotFindKeystore(String),

    #[error("Keystore access error: {0}")]
    KeystoreAccess(String),

    #[error("No valid certificates in keystore: {0}")]
    NoCertificates(String),

    #[error("Certificate encoding error: {0}")]
    CertificateDecoding(String),

    #[error("Visible PDF signature is mandatory: {0}")]
    VisibleSignatureMandatory(String),

    #[error("Cannot read input data: {0}")]
    CannotReadData(String),

    #[error("Cannot save output data: {0}")]
    CannotSaveData(String),

    #[error("Post-processing failed: {0}")]
    PostProcessingFailed(String),

    #[error("Encryption of the response failed: {0}")]
    EncryptionFailed(String),
}

impl SigningError {
    /// Symbolic code reported to the caller for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidParameter(_) => ErrorCode::InvalidParameter,
            Self::MissingFormat => ErrorCode::MissingFormat,
            Self::MissingAlgorithm => ErrorCode::MissingAlgorithm,
            Self::UnsupportedAlgorithm(_) => ErrorCode::UnsupportedAlgorithm,
            Self::InvalidFilename(_) => ErrorCode::InvalidFilename,
            Self::LocalAccessNotAllowed(_) => ErrorCode::LocalAccessNotAllowed,
            Self::IncompatiblePolicy(_) => ErrorCode::IncompatiblePolicy,
            Self::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            Self::UnknownSignerOrFormat(_) => ErrorCode::UnknownSignerOrFormat,
            Self::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            Self::UnsupportedProtocolVersion { .. } => ErrorCode::UnsupportedProtocolVersion,
            Self::MinimumVersionNotSatisfied { .. } => ErrorCode::MinimumVersionNotSatisfied,
            Self::InvalidPriorSignature(_) => ErrorCode::InvalidPriorSignature,
            Self::BadContainerPassword(_) => ErrorCode::BadContainerPassword,
            Self::CertifiedContainer(_) => ErrorCode::CertifiedContainer,
            Self::UnregisteredSignatureContainer(_) => ErrorCode::UnregisteredSignatureContainer,
            Self::InvalidPdf(_) => ErrorCode::InvalidPdf,
            Self::MalformedMarkup(_) => ErrorCode::MalformedMarkup,
            Self::InvalidData(_) => ErrorCode::InvalidData,
            Self::MalformedStructuredDocument(_) => ErrorCode::MalformedStructuredDocument,
            Self::StructuredDocumentAlreadySigned(_) => ErrorCode::StructuredDocumentAlreadySigned,
            Self::NoSignableData(_) => ErrorCode::NoSignableData,
            Self::NoSignData(_) => ErrorCode::NoSignData,
            Self::SignatureFailed(_) => ErrorCode::SignatureFailed,
            Self::RecoverServerDocument(_) => ErrorCode::RecoverServerDocument,
            Self::CannotFindKeystore(_) => ErrorCode::CannotFindKeystore,
            Self::KeystoreAccess(_) => ErrorCode::KeystoreAccess,
            Self::NoCertificates(_) => ErrorCode::NoCertificates,
            Self::CertificateDecoding(_) => ErrorCode::CertificateDecoding,
            Self::VisibleSignatureMandatory(_) => ErrorCode::VisibleSignatureMandatory,
            Self::CannotReadData(_) => ErrorCode::CannotReadData,
            Self::CannotSaveData(_) => ErrorCode::CannotSaveData,
            Self::PostProcessingFailed(_) => ErrorCode::PostProcessingFailed,
            Self::EncryptionFailed(_) => ErrorCode::EncryptionFailed,
        }
    }
}

impl From<der::Error> for SigningError {
    fn from(error: der::Error) -> Self {
        SigningError::CertificateDecoding(error.to_string())
    }
}

impl From<std::io::Error> for SigningError {
    fn from(error: std::io::Error) -> Self {
        SigningError::CannotReadData(error.to_string())
    }
}

impl From<base64::DecodeError> for SigningError {
    fn from(error: base64::DecodeError) -> Self {
        SigningError::InvalidParameter(format!("invalid base64: {error}"))
    }
}

impl From<url::ParseError> for SigningError {
    fn from(error: url::ParseError) -> Self {
        SigningError::InvalidParameter(format!("invalid URL: {error}"))
    }
}

/// Why a request stopped before producing a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    /// The user dismissed an interactive step. Not an error.
    #[error("operation cancelled by the user")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] SigningError),
}

impl Abort {
    /// Wire string for this outcome: an error code or the cancellation marker.
    #[must_use]
    pub fn wire_code(&self) -> &'static str {
        match self {
            Abort::Cancelled => error_codes::CANCEL,
            Abort::Failed(error) => error.code().as_str(),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Abort::Cancelled)
    }

    /// The underlying error, unless this was a cancellation.
    #[must_use]
    pub fn error(&self) -> Option<&SigningError> {
        match self {
            Abort::Cancelled => None,
            Abort::Failed(error) => Some(error),
        }
    }
}
