//! Batch coordination over the operations a processor expands a request into.

use crate::adapters::processor::{PostProcessFault, SignDataProcessor};
use crate::domain::operation::{SignOperation, SignResult};
use crate::infra::error::{Abort, SignFlow, SigningError};
use crate::services::executor::SigningExecutor;

pub struct BatchCoordinator<'a> {
    executor: &'a SigningExecutor<'a>,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(executor: &'a SigningExecutor<'a>) -> Self {
        Self { executor }
    }

    /// Execute `operations` strictly in order.
    ///
    /// Cancellation and a missing mandatory visible signature always end the
    /// batch. Other failures end it unless the processor allows errors, in
    /// which case the item is skipped.
    ///
    /// # Errors
    /// The first fatal outcome.
    pub fn run(
        &self,
        operations: Vec<SignOperation>,
        errors_allowed: bool,
    ) -> SignFlow<Vec<SignResult>> {
        let massive = operations.len() > 1;
        let total = operations.len();
        let mut results = Vec::with_capacity(total);

        for (index, operation) in operations.into_iter().enumerate() {
            log::debug!("Batch item {}/{total}", index + 1);
            match self.executor.execute(operation, massive) {
                Ok(result) => results.push(result),
                Err(Abort::Cancelled) => return Err(Abort::Cancelled),
                Err(Abort::Failed(error @ SigningError::VisibleSignatureMandatory(_))) => {
                    log::error!("Batch item {} aborted the batch: {error}", index + 1);
                    return Err(error.into());
                }
                Err(Abort::Failed(error)) if errors_allowed => {
                    log::warn!("Batch item {} failed and was skipped: {error}", index + 1);
                }
                Err(abort) => return Err(abort),
            }
        }

        Ok(results)
    }

    /// Run the batch and render the results through `processor`.
    ///
    /// # Errors
    /// Any batch failure, or [`SigningError::EncryptionFailed`] /
    /// [`SigningError::PostProcessingFailed`] from rendering.
    pub fn run_with(
        &self,
        processor: &dyn SignDataProcessor,
        operations: Vec<SignOperation>,
        original: &SignOperation,
    ) -> SignFlow<String> {
        let results = self.run(operations, processor.is_errors_allowed())?;
        processor
            .post_process(&results, original)
            .map_err(|fault| {
                log::error!("Post-processing by {} failed: {fault}", processor.name());
                let error = match fault {
                    PostProcessFault::Encryption(msg) => SigningError::EncryptionFailed(msg),
                    PostProcessFault::Other(msg) => SigningError::PostProcessingFailed(msg),
                };
                Abort::from(error)
            })
    }
}
