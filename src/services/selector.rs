//! Operation selection: bind a signer engine and the input data to an operation.

use crate::adapters::engine::SignerEngine;
use crate::adapters::interaction::{FileChooser, InteractionFault, LoadRequest};
use crate::adapters::registry::SignerRegistry;
use crate::domain::constants::{EXTRA_MIME_TYPE, EXTRA_MODE, MIME_TYPE_SHA1_HASH, SIGN_MODE_EXPLICIT};
use crate::domain::extra_params::ExtraParams;
use crate::domain::format::SignFormat;
use crate::domain::operation::CryptoOperation;
use crate::infra::error::{Abort, SignFlow, SigningError, SigningResult};
use crate::services::sniffer::ContainerSniffer;
use sha1::{Digest, Sha1};
use std::sync::Arc;

/// An operation with its engine and input resolved.
#[derive(Clone)]
pub struct PreparedOperation {
    pub format: SignFormat,
    pub engine: Arc<dyn SignerEngine>,
    /// `None` only when the engine supplies its own input
    pub data: Option<Vec<u8>>,
    pub extra_params: ExtraParams,
    /// Name of the file the user loaded, if the data came from the file chooser
    pub input_filename: Option<String>,
}

impl PreparedOperation {
    /// Input filename without its last extension.
    #[must_use]
    pub fn input_stem(&self) -> Option<&str> {
        let name = self.input_filename.as_deref()?;
        Some(match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        })
    }
}

pub struct OperationSelector<'a> {
    registry: &'a dyn SignerRegistry,
    file_chooser: &'a dyn FileChooser,
}

impl<'a> OperationSelector<'a> {
    pub fn new(registry: &'a dyn SignerRegistry, file_chooser: &'a dyn FileChooser) -> Self {
        Self {
            registry,
            file_chooser,
        }
    }

    /// Engine for an explicit format; `None` for AUTO.
    ///
    /// # Errors
    /// [`SigningError::UnsupportedFormat`] when no engine handles the format.
    pub fn engine_for_format(
        &self,
        format: &SignFormat,
    ) -> SigningResult<Option<Arc<dyn SignerEngine>>> {
        if format.is_auto() {
            return Ok(None);
        }
        self.registry
            .signer_for_format(format.as_str())
            .map(Some)
            .ok_or_else(|| {
                log::error!("No signer available for format {format}");
                SigningError::UnsupportedFormat(format.to_string())
            })
    }

    /// Load data if needed, resolve AUTO and apply the explicit-XAdES shim.
    ///
    /// # Errors
    /// - [`Abort::Cancelled`] when the user dismisses the file chooser
    /// - [`SigningError::CannotReadData`] when the chosen file cannot be read
    /// - [`SigningError::UnknownSignerOrFormat`] when AUTO cannot be resolved
    pub fn prepare(
        &self,
        operation: CryptoOperation,
        format: SignFormat,
        engine: Option<Arc<dyn SignerEngine>>,
        data: Option<Vec<u8>>,
        mut extra_params: ExtraParams,
    ) -> SignFlow<PreparedOperation> {
        let needs_data = data.is_none()
            && engine
                .as_ref()
                .map_or(true, |e| e.needs_data(operation, &extra_params));

        let (mut data, input_filename) = if needs_data {
            let loaded = self
                .file_chooser
                .load_file(&LoadRequest::from_params(operation, &extra_params))
                .map_err(|fault| match fault {
                    InteractionFault::Cancelled => {
                        log::info!("File selection cancelled by the user");
                        Abort::Cancelled
                    }
                    InteractionFault::Failed(msg) => SigningError::CannotReadData(msg).into(),
                })?;
            log::debug!("Loaded {} bytes from {}", loaded.data.len(), loaded.name);
            (Some(loaded.data), Some(loaded.name))
        } else {
            (data, None)
        };

        let (format, engine) = match engine {
            Some(engine) => (format, engine),
            None => self.resolve_auto(operation, data.as_deref())?,
        };

        if operation == CryptoOperation::Sign {
            if let Some(payload) = data.as_mut() {
                apply_explicit_xades_shim(&format, payload, &mut extra_params);
            }
        }

        Ok(PreparedOperation {
            format,
            engine,
            data,
            extra_params,
            input_filename,
        })
    }

    fn resolve_auto(
        &self,
        operation: CryptoOperation,
        data: Option<&[u8]>,
    ) -> SigningResult<(SignFormat, Arc<dyn SignerEngine>)> {
        let data = data.ok_or_else(|| {
            SigningError::UnknownSignerOrFormat("no data to detect the format from".to_string())
        })?;

        let format = ContainerSniffer::new(self.registry)
            .sniff(data, operation)
            .map_err(|e| SigningError::UnknownSignerOrFormat(e.to_string()))?;
        log::info!("Detected signature format: {format}");

        let engine = self
            .registry
            .signer_for_format(format.as_str())
            .ok_or_else(|| {
                SigningError::UnknownSignerOrFormat(format!("no signer for detected format {format}"))
            })?;
        Ok((format, engine))
    }
}

/// Legacy explicit XAdES: sign the SHA-1 digest of the data instead of the data.
fn apply_explicit_xades_shim(format: &SignFormat, data: &mut Vec<u8>, params: &mut ExtraParams) {
    let explicit = params
        .get(EXTRA_MODE)
        .is_some_and(|mode| mode.eq_ignore_ascii_case(SIGN_MODE_EXPLICIT));
    if !explicit || !format.is_xades_family() || format.is_xades_triphase() {
        return;
    }

    log::warn!(
        "Explicit XAdES signatures are deprecated; signing the SHA-1 digest of the data instead"
    );
    *data = Sha1::digest(data.as_slice()).to_vec();
    params.set(EXTRA_MIME_TYPE, MIME_TYPE_SHA1_HASH);
}
