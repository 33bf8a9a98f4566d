//! Adapter layer: interfaces to everything outside the orchestration core.
//!
//! Provides collaborator traits for:
//! - Signer engines and the format registry
//! - Keystores, certificate selection and password callbacks
//! - Interactive file loading, saving and visible-signature placement
//! - Policy expansion of extra parameters
//! - Plugin processors and response encryption
//! - Desktop integration and stored-request retrieval

pub mod desktop;
pub mod engine;
pub mod expander;
pub mod interaction;
pub mod keystore;
pub mod processor;
pub mod registry;

use crate::domain::request::ParameterMap;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use expander::{ExtraParamsExpander, IdentityExpander};
use interaction::{FileChooser, SaveTarget, VisibleSignaturePlacer};
use keystore::{CertificateSelector, KeyStoreProvider};
use processor::{DataCipher, InlinePlugin};
use registry::SignerRegistry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stored request unavailable: {0}")]
pub struct RetrievalFault(pub String);

/// Downloads the parameters of a request stored under a file identifier.
pub trait StoredRequestSource: Send + Sync {
    /// # Errors
    /// [`RetrievalFault`] when the stored request cannot be fetched or decoded.
    fn fetch(
        &self,
        file_id: &str,
        retrieve_servlet: Option<&Url>,
    ) -> Result<ParameterMap, RetrievalFault>;
}

/// Every collaborator the signing pipeline consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn SignerRegistry>,
    pub keystores: Arc<dyn KeyStoreProvider>,
    pub certificate_selector: Arc<dyn CertificateSelector>,
    pub file_chooser: Arc<dyn FileChooser>,
    pub save_target: Arc<dyn SaveTarget>,
    pub signature_placer: Arc<dyn VisibleSignaturePlacer>,
    pub expander: Arc<dyn ExtraParamsExpander>,
    pub plugins: Vec<Arc<dyn InlinePlugin>>,
    pub cipher: Option<Arc<dyn DataCipher>>,
    pub stored_requests: Option<Arc<dyn StoredRequestSource>>,
}

impl Collaborators {
    /// Collaborators with no plugins, no cipher, no stored-request source
    /// and the identity expander.
    pub fn new(
        registry: Arc<dyn SignerRegistry>,
        keystores: Arc<dyn KeyStoreProvider>,
        certificate_selector: Arc<dyn CertificateSelector>,
        file_chooser: Arc<dyn FileChooser>,
        save_target: Arc<dyn SaveTarget>,
        signature_placer: Arc<dyn VisibleSignaturePlacer>,
    ) -> Self {
        Self {
            registry,
            keystores,
            certificate_selector,
            file_chooser,
            save_target,
            signature_placer,
            expander: Arc::new(IdentityExpander),
            plugins: Vec::new(),
            cipher: None,
            stored_requests: None,
        }
    }

    #[must_use]
    pub fn with_expander(mut self, expander: Arc<dyn ExtraParamsExpander>) -> Self {
        self.expander = expander;
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin: Arc<dyn InlinePlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    #[must_use]
    pub fn with_cipher(mut self, cipher: Arc<dyn DataCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    #[must_use]
    pub fn with_stored_requests(mut self, source: Arc<dyn StoredRequestSource>) -> Self {
        self.stored_requests = Some(source);
        self
    }
}
