//! Protocol and client version gating, applied once before any work.

use crate::domain::types::ClientVersion;
use crate::infra::error::{SigningError, SigningResult};

pub struct ProtocolGate {
    max_protocol_version: u32,
    running_version: ClientVersion,
}

impl ProtocolGate {
    pub fn new(max_protocol_version: u32, running_version: ClientVersion) -> Self {
        Self {
            max_protocol_version,
            running_version,
        }
    }

    #[must_use]
    pub fn max_protocol_version(&self) -> u32 {
        self.max_protocol_version
    }

    /// Reject requests this client cannot serve.
    ///
    /// # Errors
    /// - [`SigningError::UnsupportedProtocolVersion`] when `protocol_version` is
    ///   not a number or exceeds the supported maximum
    /// - [`SigningError::MinimumVersionNotSatisfied`] when the caller requires a
    ///   newer client than the one running
    pub fn check(
        &self,
        protocol_version: &str,
        minimum_client_version: Option<&ClientVersion>,
    ) -> SigningResult<u32> {
        let requested = protocol_version
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v <= self.max_protocol_version)
            .ok_or_else(|| {
                log::error!(
                    "Unsupported protocol version ({protocol_version}). Supported up to {}",
                    self.max_protocol_version
                );
                SigningError::UnsupportedProtocolVersion {
                    requested: protocol_version.to_string(),
                    supported: self.max_protocol_version,
                }
            })?;

        if let Some(required) = minimum_client_version {
            if *required > self.running_version {
                log::error!(
                    "Caller requires client version {required}, running {}",
                    self.running_version
                );
                return Err(SigningError::MinimumVersionNotSatisfied {
                    required: required.to_string(),
                    running: self.running_version.to_string(),
                });
            }
        }

        Ok(requested)
    }
}
