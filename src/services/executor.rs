//! Signing executor: runs one operation from engine binding to saved output.
//!
//! Steps, in order:
//! 1. Bind the engine for an explicit format and resolve the keystore
//! 2. Load and sniff the input data when needed
//! 3. Validate any prior signature
//! 4. Expand the extra parameters and place a visible signature
//! 5. Obtain the credential (sticky cache or interactive selection)
//! 6. Dispatch to the engine and save the output

use crate::adapters::engine::{SignValidity, ValidityError};
use crate::adapters::interaction::{InteractionFault, SaveProposal};
use crate::adapters::keystore::{CertificateSelectionHints, PrivateKeyEntry, SelectionFault};
use crate::adapters::Collaborators;
use crate::domain::certificate;
use crate::domain::constants::{DEFAULT_SIGNED_FILE_STEM, EXTRA_CHECK_SIGNATURES, EXTRA_TARGET};
use crate::domain::operation::{
    CounterSignTarget, CryptoOperation, ResultMetadata, SignOperation, SignResult,
};
use crate::domain::request::SignRequest;
use crate::domain::types::{Filename, KeyStoreSelection};
use crate::infra::config::HandlerConfiguration;
use crate::infra::error::{Abort, SignFlow, SigningError};
use crate::services::classifier::classify_engine_fault;
use crate::services::selector::{OperationSelector, PreparedOperation};
use crate::services::session::SigningSession;
use crate::services::visible_signature::VisibleSignaturePolicy;
use std::time::SystemTime;

/// Request-wide settings shared by every operation of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub keystore: KeyStoreSelection,
    pub sticky: bool,
    pub reset_sticky: bool,
    /// Output filename requested by the caller
    pub filename: Option<Filename>,
    /// Prior-signature check default when `checkSignatures` is not configured
    pub check_signatures: bool,
}

impl ExecutionContext {
    #[must_use]
    pub fn from_request(request: &SignRequest, config: &HandlerConfiguration) -> Self {
        Self {
            keystore: request
                .keystore
                .clone()
                .unwrap_or_else(|| KeyStoreSelection::named(config.default_keystore.as_str())),
            sticky: request.sticky,
            reset_sticky: request.reset_sticky,
            filename: request.filename.clone(),
            check_signatures: config.check_signatures,
        }
    }
}

pub struct SigningExecutor<'a> {
    collaborators: &'a Collaborators,
    session: &'a SigningSession,
    context: &'a ExecutionContext,
}

impl<'a> SigningExecutor<'a> {
    pub fn new(
        collaborators: &'a Collaborators,
        session: &'a SigningSession,
        context: &'a ExecutionContext,
    ) -> Self {
        Self {
            collaborators,
            session,
            context,
        }
    }

    /// Run one operation. `massive` marks operations that belong to a batch.
    ///
    /// # Errors
    /// [`Abort::Cancelled`] when the user dismisses an interactive step,
    /// otherwise [`Abort::Failed`] carrying the precise failure.
    pub fn execute(&self, operation: SignOperation, massive: bool) -> SignFlow<SignResult> {
        let SignOperation {
            operation: kind,
            raw_operation,
            format,
            algorithm,
            data,
            extra_params,
            ..
        } = operation;

        let kind = kind.ok_or_else(|| {
            let raw = raw_operation.unwrap_or_default();
            log::error!("Unsupported operation: '{raw}'");
            SigningError::UnsupportedOperation(raw)
        })?;
        log::info!("Starting {kind} operation with format {format} and {algorithm}");

        let selector = OperationSelector::new(
            self.collaborators.registry.as_ref(),
            self.collaborators.file_chooser.as_ref(),
        );
        let engine = selector.engine_for_format(&format)?;
        self.ensure_keystore_exists()?;

        let prepared = selector.prepare(kind, format, engine, data, extra_params)?;
        self.validate_prior_signature(kind, &prepared)?;

        let stem = prepared
            .input_stem()
            .unwrap_or(DEFAULT_SIGNED_FILE_STEM)
            .to_string();
        let PreparedOperation {
            format,
            engine,
            data,
            extra_params,
            input_filename,
        } = prepared;

        let mut params = self
            .collaborators
            .expander
            .expand(&extra_params, data.as_deref(), &format)
            .map_err(|e| SigningError::IncompatiblePolicy(e.0))?;
        let hints = CertificateSelectionHints::from_params(&params);

        let payload = data.as_deref().unwrap_or_default();
        VisibleSignaturePolicy::apply(
            self.collaborators.signature_placer.as_ref(),
            payload,
            &format,
            &mut params,
            massive,
        )?;

        let credential = self.credential(&hints)?;
        log::debug!("Signing with certificate alias {}", credential.alias());

        let leaf = credential.leaf().ok_or_else(|| {
            SigningError::CertificateDecoding("credential has no certificate".to_string())
        })?;
        if certificate::is_expired(leaf, SystemTime::now()) {
            log::warn!(
                "Signing certificate is expired or not yet valid: {}",
                certificate::subject_name(leaf)
            );
        }
        let certificate = certificate::encode_der(leaf)?;
        log::debug!(
            "Signing certificate fingerprint (SHA-256): {}",
            certificate::fingerprint(&certificate)
        );

        let signature = match kind {
            CryptoOperation::Sign => engine.sign(payload, algorithm, &credential, &params),
            CryptoOperation::Cosign => engine.cosign(payload, algorithm, &credential, &params),
            CryptoOperation::Countersign => {
                let target = CounterSignTarget::from_config(params.get(EXTRA_TARGET));
                engine.countersign(payload, algorithm, target, &credential, &params)
            }
        }
        .map_err(classify_engine_fault)?;
        log::info!("Signature created ({} bytes)", signature.len());

        let proposed = match &self.context.filename {
            Some(filename) => filename.as_str().to_string(),
            None => engine.signed_name(&stem),
        };
        self.save(&signature, SaveProposal::from_params(proposed, &params))?;

        Ok(SignResult {
            signature,
            certificate,
            metadata: input_filename.map(|filename| ResultMetadata {
                filename: Some(filename),
            }),
        })
    }

    fn ensure_keystore_exists(&self) -> Result<(), SigningError> {
        let name = &self.context.keystore.name;
        if self.collaborators.keystores.is_known(name) {
            Ok(())
        } else {
            log::error!("Keystore {name} does not exist on this system");
            Err(SigningError::CannotFindKeystore(name.clone()))
        }
    }

    fn validate_prior_signature(
        &self,
        kind: CryptoOperation,
        prepared: &PreparedOperation,
    ) -> Result<(), SigningError> {
        let Some(data) = prepared.data.as_deref() else {
            return Ok(());
        };
        let check = prepared
            .extra_params
            .get_bool(EXTRA_CHECK_SIGNATURES)
            .unwrap_or(self.context.check_signatures);
        if !check {
            return Ok(());
        }
        let Some(validator) = prepared.engine.validator() else {
            return Ok(());
        };

        let validity = validator.validate(data).unwrap_or_else(|e| {
            log::warn!("Prior signature could not be analysed: {e}");
            SignValidity::Invalid(ValidityError::UnknownError)
        });

        match validity {
            SignValidity::Invalid(ValidityError::NoSign) if kind == CryptoOperation::Sign => Ok(()),
            SignValidity::Invalid(reason) => {
                log::error!("Prior signature is not valid: {reason:?}");
                Err(SigningError::InvalidPriorSignature(format!("{reason:?}")))
            }
            SignValidity::Valid | SignValidity::Unknown => Ok(()),
        }
    }

    fn credential(&self, hints: &CertificateSelectionHints) -> SignFlow<PrivateKeyEntry> {
        if self.context.sticky && !self.context.reset_sticky {
            if let Some(entry) = self.session.sticky_credential() {
                log::info!("Reusing sticky credential {}", entry.alias());
                return Ok(entry);
            }
        }

        let keystores = &self.collaborators.keystores;
        let selection = &self.context.keystore;
        let password = keystores.password_callback(&selection.name);
        let manager = keystores
            .open(selection, &*password)
            .map_err(|e| SigningError::KeystoreAccess(e.to_string()))?;

        let entry = self
            .collaborators
            .certificate_selector
            .select(&*manager, hints)
            .map_err(|fault| match fault {
                SelectionFault::Cancelled => {
                    log::info!("Certificate selection cancelled by the user");
                    Abort::Cancelled
                }
                SelectionFault::NoCertificates(msg) => SigningError::NoCertificates(msg).into(),
                SelectionFault::Failed(msg) => SigningError::KeystoreAccess(msg).into(),
            })?;

        if self.context.sticky {
            self.session.set_sticky_credential(entry.clone());
        } else {
            self.session.clear_sticky_credential();
        }
        Ok(entry)
    }

    fn save(&self, signature: &[u8], proposal: SaveProposal) -> SignFlow<()> {
        self.collaborators
            .save_target
            .save(signature, &proposal)
            .map_err(|fault| match fault {
                InteractionFault::Cancelled => {
                    log::info!("Saving cancelled by the user");
                    Abort::Cancelled
                }
                InteractionFault::Failed(msg) => {
                    log::error!("Could not save the signature: {msg}");
                    SigningError::CannotSaveData(msg).into()
                }
            })
    }
}
