//! Workflow pipelines orchestrating stateless services.

pub mod sign_and_save;

pub use sign_and_save::SignAndSavePipeline;

use crate::SignFlow;

/// Wire form of a request outcome: the response string, an error code or
/// the cancellation marker.
#[must_use]
pub fn render_response(outcome: &SignFlow<String>) -> String {
    match outcome {
        Ok(response) => response.clone(),
        Err(abort) => abort.wire_code().to_string(),
    }
}
