//! Service layer module root.
//! Contains the stateless components of the signing pipeline.

pub mod batch;
pub mod classifier;
pub mod executor;
pub mod params;
pub mod protocol_gate;
pub mod selector;
pub mod session;
pub mod sniffer;
pub mod visible_signature;

pub use batch::BatchCoordinator;
pub use classifier::classify_engine_fault;
pub use executor::{ExecutionContext, SigningExecutor};
pub use params::{parse_query, unrecognized_parameters, ParameterReport, ParameterValidator};
pub use protocol_gate::ProtocolGate;
pub use selector::{OperationSelector, PreparedOperation};
pub use session::SigningSession;
pub use sniffer::{classify_container, ContainerSniffer, SniffError};
pub use visible_signature::VisibleSignaturePolicy;
