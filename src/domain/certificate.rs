//! Signing certificate helpers.

use crate::infra::error::{SigningError, SigningResult};
use der::{Decode, Encode};
use sha2::{Digest, Sha256};
use std::time::SystemTime;
use x509_cert::Certificate;

/// Whether `now` falls outside the certificate's validity window.
#[must_use]
pub fn is_expired(cert: &Certificate, now: SystemTime) -> bool {
    let validity = &cert.tbs_certificate.validity;
    now < validity.not_before.to_system_time() || now > validity.not_after.to_system_time()
}

/// DER encoding of a certificate, as returned to the caller.
///
/// # Errors
/// [`SigningError::CertificateDecoding`] when the certificate cannot be encoded.
pub fn encode_der(cert: &Certificate) -> SigningResult<Vec<u8>> {
    cert.to_der()
        .map_err(|e| SigningError::CertificateDecoding(format!("leaf certificate: {e}")))
}

/// Parse a DER certificate.
///
/// # Errors
/// [`SigningError::CertificateDecoding`] when `der` is not an X.509 certificate.
pub fn decode_der(der: &[u8]) -> SigningResult<Certificate> {
    Certificate::from_der(der).map_err(|e| SigningError::CertificateDecoding(e.to_string()))
}

/// Subject distinguished name, for log messages.
#[must_use]
pub fn subject_name(cert: &Certificate) -> String {
    cert.tbs_certificate.subject.to_string()
}

/// Uppercase hex SHA-256 of a DER certificate.
#[must_use]
pub fn fingerprint(der: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(der))
}
