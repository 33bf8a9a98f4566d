//! Protocol Signer Library
//!
//! Orchestrates signature requests arriving through a local protocol handler:
//! validates the untrusted parameters, resolves the container format (sniffing
//! it when the caller asks for AUTO), runs sign/cosign/countersign through a
//! pluggable signer engine and maps every failure onto a stable error code.
//!
//! Signer engines, keystores and every interactive step are collaborators
//! supplied by the embedding application (see [`adapters`]).

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use adapters::Collaborators;
pub use domain::cms::{classify as classify_cms, CmsClassification};
pub use domain::format::{ContainerClassification, SignFormat};
pub use domain::operation::{CounterSignTarget, CryptoOperation, SignOperation, SignResult};
pub use domain::request::{ParameterMap, SignRequest, ValidatedRequest};
pub use domain::types::{ClientVersion, Filename, SessionId, SignatureAlgorithm};
pub use infra::config::{ConfigManager, HandlerConfiguration};
pub use infra::error::{Abort, ErrorCode, SignFlow, SigningError, SigningResult};
pub use pipelines::{render_response, SignAndSavePipeline};
pub use services::{classify_container, parse_query, ParameterValidator, SigningSession};
