//! Maps engine faults onto the stable error taxonomy.

use crate::adapters::engine::EngineFault;
use crate::infra::error::{Abort, SigningError};

/// Single mapping table from engine fault to request outcome.
#[must_use]
pub fn classify_engine_fault(fault: EngineFault) -> Abort {
    let error = match fault {
        EngineFault::Cancelled => {
            log::info!("Operation cancelled by the user during signing");
            return Abort::Cancelled;
        }
        EngineFault::InvalidArgument(msg) => SigningError::InvalidParameter(msg),
        EngineFault::Triphase(msg) => SigningError::RecoverServerDocument(msg),
        EngineFault::InvalidPdf(msg) => SigningError::InvalidPdf(msg),
        EngineFault::BadPassword(msg) => SigningError::BadContainerPassword(msg),
        EngineFault::CertifiedPdf(msg) => SigningError::CertifiedContainer(msg),
        EngineFault::UnregisteredSignatures(msg) => {
            SigningError::UnregisteredSignatureContainer(msg)
        }
        EngineFault::MalformedXml(msg) => SigningError::MalformedMarkup(msg),
        EngineFault::InvalidFileFormat(msg) => SigningError::InvalidData(msg),
        EngineFault::MalformedInvoice(msg) => SigningError::MalformedStructuredDocument(msg),
        EngineFault::InvoiceAlreadySigned(msg) => {
            SigningError::StructuredDocumentAlreadySigned(msg)
        }
        EngineFault::ContainsNoData(msg) => SigningError::NoSignableData(msg),
        EngineFault::NotASignature(msg) => SigningError::NoSignData(msg),
        EngineFault::UnsupportedOperation(msg) => SigningError::UnsupportedOperation(msg),
        EngineFault::InvalidSignature(msg) => SigningError::InvalidPriorSignature(msg),
        EngineFault::Signature(msg) | EngineFault::Other(msg) => {
            SigningError::SignatureFailed(msg)
        }
    };
    log::error!("Signing engine failed: {error}");
    Abort::Failed(error)
}
