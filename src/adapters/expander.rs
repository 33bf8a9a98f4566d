//! Policy-driven expansion of extra parameters.

use crate::domain::extra_params::ExtraParams;
use crate::domain::format::SignFormat;
use thiserror::Error;

/// The requested policy cannot be applied to this format or data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("incompatible signature policy: {0}")]
pub struct IncompatiblePolicy(pub String);

/// Expands macro entries (such as a named signature policy) into the
/// concrete configuration an engine understands. Runs once per operation.
pub trait ExtraParamsExpander: Send + Sync {
    /// # Errors
    /// [`IncompatiblePolicy`] when the configuration cannot be expanded.
    fn expand(
        &self,
        params: &ExtraParams,
        data: Option<&[u8]>,
        format: &SignFormat,
    ) -> Result<ExtraParams, IncompatiblePolicy>;
}

/// Expander that leaves the configuration untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityExpander;

impl ExtraParamsExpander for IdentityExpander {
    fn expand(
        &self,
        params: &ExtraParams,
        _data: Option<&[u8]>,
        _format: &SignFormat,
    ) -> Result<ExtraParams, IncompatiblePolicy> {
        Ok(params.clone())
    }
}
