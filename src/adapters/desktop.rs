//! Optional desktop integration (opening files with the system viewer).
//!
//! Platforms without such a capability use [`UnsupportedDesktop`]; callers
//! fall back to offering the file for saving.

use crate::adapters::interaction::{InteractionFault, SaveProposal, SaveTarget};
use crate::domain::extra_params::ExtraParams;
use crate::infra::error::{Abort, SignFlow, SigningError};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DesktopFault {
    #[error("desktop integration is not supported on this platform")]
    Unsupported,

    #[error("could not open {0}")]
    OpenFailed(String),
}

pub trait DesktopIntegration: Send + Sync {
    fn is_supported(&self) -> bool;

    /// # Errors
    /// [`DesktopFault`] when the file cannot be shown.
    fn open_file(&self, path: &Path) -> Result<(), DesktopFault>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDesktop;

impl DesktopIntegration for UnsupportedDesktop {
    fn is_supported(&self) -> bool {
        false
    }

    fn open_file(&self, _path: &Path) -> Result<(), DesktopFault> {
        Err(DesktopFault::Unsupported)
    }
}

/// Show a certificate to the user.
///
/// The DER bytes are written to a temporary `.cer` file and handed to the
/// desktop; if that is unavailable or fails, the certificate is offered
/// through the save collaborator instead.
pub fn open_certificate(
    certificate_der: &[u8],
    desktop: &dyn DesktopIntegration,
    save_target: &dyn SaveTarget,
) -> SignFlow<()> {
    if desktop.is_supported() {
        match open_with_desktop(certificate_der, desktop) {
            Ok(()) => return Ok(()),
            Err(e) => log::warn!("Could not open certificate with the desktop: {e}"),
        }
    }

    let proposal = SaveProposal::from_params("certificate.cer".to_string(), &ExtraParams::new());
    save_target
        .save(certificate_der, &proposal)
        .map_err(|fault| match fault {
            InteractionFault::Cancelled => Abort::Cancelled,
            InteractionFault::Failed(msg) => SigningError::CannotSaveData(msg).into(),
        })
}

fn open_with_desktop(
    certificate_der: &[u8],
    desktop: &dyn DesktopIntegration,
) -> Result<(), DesktopFault> {
    let mut file = tempfile::Builder::new()
        .prefix("certificate")
        .suffix(".cer")
        .tempfile()
        .map_err(|e| DesktopFault::OpenFailed(e.to_string()))?;
    file.write_all(certificate_der)
        .and_then(|()| file.flush())
        .map_err(|e| DesktopFault::OpenFailed(e.to_string()))?;

    // The viewer may still be reading when we return, so the file is kept.
    let (_, path) = file
        .keep()
        .map_err(|e| DesktopFault::OpenFailed(e.to_string()))?;
    desktop.open_file(&path)
}
