//! Pre/post processors around the native signing path.
//!
//! A processor may expand one request into several operations (a batch) and
//! renders the collected results into the response string. Plugins can
//! provide their own processor; the native one is always the fallback.

use crate::domain::constants::RESULT_SEPARATOR;
use crate::domain::encoding::encode_base64_url;
use crate::domain::operation::{SignOperation, SignResult};
use crate::domain::types::CipherKey;
use std::sync::Arc;
use thiserror::Error;

/// Failure while turning results into a response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostProcessFault {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("{0}")]
    Other(String),
}

/// Failure raised by a plugin while deciding whether it applies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("plugin error: {0}")]
pub struct PluginFault(pub String);

pub trait SignDataProcessor: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this processor wants to handle the operation.
    ///
    /// # Errors
    /// [`PluginFault`] when the decision cannot be made; the processor is skipped.
    fn check_trigger(&self, operation: &SignOperation) -> Result<bool, PluginFault>;

    /// Expand the request into the operations to run, in order.
    fn pre_process(&self, operation: SignOperation) -> Vec<SignOperation>;

    /// Whether individual operation failures are tolerated.
    fn is_errors_allowed(&self) -> bool;

    /// Render the successful results.
    ///
    /// # Errors
    /// [`PostProcessFault`] when rendering or encryption fails.
    fn post_process(
        &self,
        results: &[SignResult],
        operation: &SignOperation,
    ) -> Result<String, PostProcessFault>;

    fn set_cipher_key(&mut self, key: Option<CipherKey>);
}

/// Encrypts response fields with the caller-provided key.
pub trait DataCipher: Send + Sync {
    /// # Errors
    /// Returns a description of the failure.
    fn cipher(&self, data: &[u8], key: &CipherKey) -> Result<String, String>;
}

/// Processor used when no plugin claims the operation.
///
/// Handles exactly one operation and renders
/// `base64url(certificate)|base64url(signature)[|base64url(filename)]`.
/// With a cipher key each field is encrypted instead of plain-encoded.
pub struct NativeSignDataProcessor {
    protocol_version: u32,
    cipher_key: Option<CipherKey>,
    cipher: Option<Arc<dyn DataCipher>>,
}

impl NativeSignDataProcessor {
    pub fn new(protocol_version: u32, cipher: Option<Arc<dyn DataCipher>>) -> Self {
        Self {
            protocol_version,
            cipher_key: None,
            cipher,
        }
    }

    #[must_use]
    pub fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn encode_field(&self, data: &[u8]) -> Result<String, PostProcessFault> {
        let Some(key) = &self.cipher_key else {
            return Ok(encode_base64_url(data));
        };
        let cipher = self.cipher.as_ref().ok_or_else(|| {
            PostProcessFault::Encryption("no cipher available for the provided key".to_string())
        })?;
        cipher.cipher(data, key).map_err(PostProcessFault::Encryption)
    }
}

impl SignDataProcessor for NativeSignDataProcessor {
    fn name(&self) -> &str {
        "native"
    }

    fn check_trigger(&self, _operation: &SignOperation) -> Result<bool, PluginFault> {
        Ok(true)
    }

    fn pre_process(&self, operation: SignOperation) -> Vec<SignOperation> {
        vec![operation]
    }

    fn is_errors_allowed(&self) -> bool {
        false
    }

    fn post_process(
        &self,
        results: &[SignResult],
        _operation: &SignOperation,
    ) -> Result<String, PostProcessFault> {
        let result = results
            .first()
            .ok_or_else(|| PostProcessFault::Other("no signature was produced".to_string()))?;

        let mut response = self.encode_field(&result.certificate)?;
        response.push(RESULT_SEPARATOR);
        response.push_str(&self.encode_field(&result.signature)?);

        if let Some(filename) = result.filename() {
            response.push(RESULT_SEPARATOR);
            response.push_str(&self.encode_field(filename.as_bytes())?);
        }
        Ok(response)
    }

    fn set_cipher_key(&mut self, key: Option<CipherKey>) {
        self.cipher_key = key;
    }
}

/// Capabilities a plugin must hold before it may intercept the native path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    InlineProcess,
}

/// A loaded plugin that may provide an inline processor.
pub trait InlinePlugin: Send + Sync {
    fn name(&self) -> &str;

    fn permissions(&self) -> &[Permission];

    /// # Errors
    /// [`PluginFault`] when the plugin fails to build its processor.
    fn inline_processor(
        &self,
        protocol_version: u32,
    ) -> Result<Option<Box<dyn SignDataProcessor>>, PluginFault>;
}

/// Picks the processor for a request: the first permitted plugin whose
/// trigger accepts the operation, else the native processor.
pub struct ProcessorSelector<'a> {
    plugins: &'a [Arc<dyn InlinePlugin>],
    cipher: Option<Arc<dyn DataCipher>>,
}

impl<'a> ProcessorSelector<'a> {
    pub fn new(plugins: &'a [Arc<dyn InlinePlugin>], cipher: Option<Arc<dyn DataCipher>>) -> Self {
        Self { plugins, cipher }
    }

    #[must_use]
    pub fn select(
        &self,
        protocol_version: u32,
        operation: &SignOperation,
    ) -> Box<dyn SignDataProcessor> {
        for plugin in self.plugins {
            if !plugin.permissions().contains(&Permission::InlineProcess) {
                continue;
            }
            let processor = match plugin.inline_processor(protocol_version) {
                Ok(Some(processor)) => processor,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Plugin {} could not build its processor: {e}", plugin.name());
                    continue;
                }
            };
            match processor.check_trigger(operation) {
                Ok(true) => {
                    log::info!("Operation handled by plugin {}", plugin.name());
                    return processor;
                }
                Ok(false) => {}
                Err(e) => log::warn!("Plugin {} failed its trigger check: {e}", plugin.name()),
            }
        }
        Box::new(NativeSignDataProcessor::new(
            protocol_version,
            self.cipher.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extra_params::ExtraParams;
    use crate::domain::format::SignFormat;
    use crate::domain::operation::{CryptoOperation, ResultMetadata};
    use crate::domain::types::SignatureAlgorithm;

    fn operation() -> SignOperation {
        SignOperation {
            operation: Some(CryptoOperation::Sign),
            raw_operation: Some("sign".to_string()),
            format: SignFormat::new("CAdES"),
            algorithm: SignatureAlgorithm::Sha256WithRsa,
            data: Some(b"data".to_vec()),
            extra_params: ExtraParams::new(),
            unrecognized: Default::default(),
        }
    }

    fn result(filename: Option<&str>) -> SignResult {
        SignResult {
            signature: vec![0xfb, 0xff],
            certificate: vec![0x30, 0x00],
            metadata: filename.map(|f| ResultMetadata {
                filename: Some(f.to_string()),
            }),
        }
    }

    struct Upper;

    impl DataCipher for Upper {
        fn cipher(&self, data: &[u8], key: &CipherKey) -> Result<String, String> {
            Ok(format!("{}:{}", key.expose(), hex::encode_upper(data)))
        }
    }

    #[test]
    fn test_native_rendering() {
        let processor = NativeSignDataProcessor::new(4, None);
        let response = processor
            .post_process(&[result(None)], &operation())
            .unwrap();
        assert_eq!(response, "MAA=|-_8=");

        let response = processor
            .post_process(&[result(Some("a.pdf"))], &operation())
            .unwrap();
        assert_eq!(response, "MAA=|-_8=|YS5wZGY=");
    }

    #[test]
    fn test_native_rendering_with_cipher() {
        let mut processor = NativeSignDataProcessor::new(4, Some(Arc::new(Upper)));
        processor.set_cipher_key(Some(CipherKey::new("12345678").unwrap()));
        let response = processor
            .post_process(&[result(None)], &operation())
            .unwrap();
        assert_eq!(response, "12345678:3000|12345678:FBFF");
    }

    #[test]
    fn test_key_without_cipher_is_encryption_failure() {
        let mut processor = NativeSignDataProcessor::new(4, None);
        processor.set_cipher_key(Some(CipherKey::new("12345678").unwrap()));
        assert!(matches!(
            processor.post_process(&[result(None)], &operation()),
            Err(PostProcessFault::Encryption(_))
        ));
    }

    #[test]
    fn test_native_processor_contract() {
        let processor = NativeSignDataProcessor::new(4, None);
        assert_eq!(processor.protocol_version(), 4);
        assert_eq!(processor.pre_process(operation()).len(), 1);
        assert!(!processor.is_errors_allowed());
        assert!(matches!(
            processor.post_process(&[], &operation()),
            Err(PostProcessFault::Other(_))
        ));
    }
}
