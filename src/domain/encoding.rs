//! Base64 and gzip helpers for request payloads.

use crate::infra::error::{SigningError, SigningResult};
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use flate2::read::GzDecoder;
use std::io::Read;

/// Decode base64 in either the standard or the URL-safe alphabet, with or
/// without padding. ASCII whitespace (line breaks from MIME wrapping) is ignored.
pub fn decode_base64_lenient(input: &str) -> SigningResult<Vec<u8>> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let unpadded = cleaned.trim_end_matches('=');

    if unpadded.contains(['-', '_']) {
        Ok(URL_SAFE_NO_PAD.decode(unpadded)?)
    } else {
        Ok(STANDARD_NO_PAD.decode(unpadded)?)
    }
}

/// Decode a base64 gzip stream and inflate it.
pub fn decode_gzipped_base64(input: &str) -> SigningResult<Vec<u8>> {
    let compressed = decode_base64_lenient(input)?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| SigningError::InvalidParameter(format!("invalid gzip payload: {e}")))?;
    Ok(inflated)
}

/// URL-safe base64 with padding, as placed in protocol responses.
#[must_use]
pub fn encode_base64_url(data: &[u8]) -> String {
    URL_SAFE.encode(data)
}
