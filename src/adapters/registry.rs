//! Format name to signer engine lookup.

use crate::adapters::engine::SignerEngine;
use std::sync::Arc;

pub trait SignerRegistry: Send + Sync {
    /// Engine registered for a format name (case-insensitive).
    fn signer_for_format(&self, format: &str) -> Option<Arc<dyn SignerEngine>>;

    /// First engine that recognises `data` as one of its signatures.
    fn signer_for_data(&self, data: &[u8]) -> Option<Arc<dyn SignerEngine>>;
}

/// Registry backed by an ordered list of engines.
///
/// Detection walks engines in registration order, so more specific engines
/// must be registered before generic ones.
#[derive(Default, Clone)]
pub struct InMemorySignerRegistry {
    engines: Vec<(String, Arc<dyn SignerEngine>)>,
}

impl InMemorySignerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine under its native format name.
    pub fn register(&mut self, engine: Arc<dyn SignerEngine>) -> &mut Self {
        let name = engine.format().to_string();
        self.engines.push((name, engine));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl SignerRegistry for InMemorySignerRegistry {
    fn signer_for_format(&self, format: &str) -> Option<Arc<dyn SignerEngine>> {
        self.engines
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(format))
            .map(|(_, engine)| Arc::clone(engine))
    }

    fn signer_for_data(&self, data: &[u8]) -> Option<Arc<dyn SignerEngine>> {
        self.engines
            .iter()
            .map(|(_, engine)| engine)
            .find(|engine| engine.is_sign(data))
            .map(Arc::clone)
    }
}
