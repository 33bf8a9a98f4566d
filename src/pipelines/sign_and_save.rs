//! `SignAndSavePipeline` orchestrates one protocol request end to end.
//!
//! Validates the parameters, gates the protocol version, lets a processor
//! expand the request into operations, runs them as a batch and renders
//! the response string.

use crate::{
    adapters::{processor::ProcessorSelector, Collaborators},
    domain::{
        constants::EXTRA_PROFILE,
        request::{ParameterMap, SignRequest, StoredConfigRequest, ValidatedRequest},
    },
    infra::{config::ConfigResult, config::HandlerConfiguration},
    services::{
        BatchCoordinator, ExecutionContext, ParameterValidator, ProtocolGate, SigningExecutor,
        SigningSession,
    },
    SignFlow, SigningError,
};
use std::sync::Arc;

pub struct SignAndSavePipeline {
    config: HandlerConfiguration,
    collaborators: Collaborators,
    session: Arc<SigningSession>,
    gate: ProtocolGate,
}

impl SignAndSavePipeline {
    /// # Errors
    /// Returns a configuration error when the configured client version is unparseable.
    pub fn new(config: HandlerConfiguration, collaborators: Collaborators) -> ConfigResult<Self> {
        let gate = ProtocolGate::new(config.max_protocol_version, config.running_version()?);
        Ok(Self {
            config,
            collaborators,
            session: Arc::new(SigningSession::new()),
            gate,
        })
    }

    /// Share the sticky credential cache with other pipelines in this process.
    #[must_use]
    pub fn with_session(mut self, session: Arc<SigningSession>) -> Self {
        self.session = session;
        self
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SigningSession> {
        &self.session
    }

    #[must_use]
    pub fn config(&self) -> &HandlerConfiguration {
        &self.config
    }

    /// Handle a raw parameter map, fetching a stored request first when the
    /// map only names one.
    pub fn process_parameters(&self, params: &ParameterMap) -> SignFlow<String> {
        let validator = ParameterValidator::new(&self.config);
        match validator.validate(params).into_result()? {
            ValidatedRequest::Sign(request) => self.process(*request),
            ValidatedRequest::StoredConfig(stored) => {
                let fetched = self.fetch_stored(&stored)?;
                match validator.validate(&fetched).into_result()? {
                    ValidatedRequest::Sign(request) => self.process(*request),
                    ValidatedRequest::StoredConfig(_) => Err(SigningError::InvalidParameter(
                        "stored request refers to another stored request".to_string(),
                    )
                    .into()),
                }
            }
        }
    }

    /// Handle a validated request.
    pub fn process(&self, request: SignRequest) -> SignFlow<String> {
        let version = self.gate.check(
            &request.protocol_version,
            request.minimum_client_version.as_ref(),
        )?;
        log::info!(
            "Processing {} request (protocol {version}, session {})",
            request.raw_operation.as_deref().unwrap_or("-"),
            request
                .session_id
                .as_ref()
                .map_or("-", |id| id.as_str())
        );

        let mut operation = request.to_operation();
        if operation.extra_params.remove(EXTRA_PROFILE).is_some() {
            log::debug!("Ignoring the signature profile setting");
        }

        let selector = ProcessorSelector::new(
            &self.collaborators.plugins,
            self.collaborators.cipher.clone(),
        );
        let mut processor = selector.select(version, &operation);
        processor.set_cipher_key(request.cipher_key.clone());

        let operations = processor.pre_process(operation.clone());
        log::debug!(
            "Processor {} produced {} operation(s)",
            processor.name(),
            operations.len()
        );

        let context = ExecutionContext::from_request(&request, &self.config);
        let executor = SigningExecutor::new(&self.collaborators, &self.session, &context);
        BatchCoordinator::new(&executor).run_with(processor.as_ref(), operations, &operation)
    }

    fn fetch_stored(&self, stored: &StoredConfigRequest) -> Result<ParameterMap, SigningError> {
        let source = self.collaborators.stored_requests.as_ref().ok_or_else(|| {
            SigningError::InvalidParameter("stored requests are not available".to_string())
        })?;
        log::info!("Fetching stored request {}", stored.file_id);
        source
            .fetch(&stored.file_id, stored.retrieve_servlet.as_ref())
            .map_err(|e| {
                log::error!("Could not fetch stored request {}: {e}", stored.file_id);
                SigningError::CannotReadData(e.to_string())
            })
    }
}
