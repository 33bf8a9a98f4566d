//! Interactive collaborators: file loading, saving and visible-signature placement.
//!
//! All calls block until the user answers. Dismissing a dialog is reported as
//! [`InteractionFault::Cancelled`], never as a failure.

use crate::domain::extra_params::ExtraParams;
use crate::domain::operation::CryptoOperation;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionFault {
    #[error("cancelled by the user")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

const LOAD_FILE_EXTS: &str = "loadFileExtension";
const LOAD_FILE_DESCRIPTION: &str = "loadFileDescription";
const LOAD_FILE_CURRENT_DIR: &str = "loadFileCurrentDir";
const LOAD_FILE_FILENAME: &str = "loadFileName";
const SAVE_FILE_EXTS: &str = "saveFileExtension";
const SAVE_FILE_DESCRIPTION: &str = "saveFileDescription";
const SAVE_FILE_CURRENT_DIR: &str = "saveFileCurrentDir";

/// What the file chooser should offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub operation: CryptoOperation,
    pub extensions: Vec<String>,
    pub description: Option<String>,
    pub current_dir: Option<String>,
    pub filename: Option<String>,
}

impl LoadRequest {
    #[must_use]
    pub fn from_params(operation: CryptoOperation, params: &ExtraParams) -> Self {
        Self {
            operation,
            extensions: split_extensions(params.get(LOAD_FILE_EXTS)),
            description: params.get(LOAD_FILE_DESCRIPTION).map(str::to_string),
            current_dir: params.get(LOAD_FILE_CURRENT_DIR).map(str::to_string),
            filename: params.get(LOAD_FILE_FILENAME).map(str::to_string),
        }
    }
}

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// Name of the file without directories
    pub name: String,
    pub data: Vec<u8>,
}

pub trait FileChooser: Send + Sync {
    /// # Errors
    /// [`InteractionFault::Cancelled`] when dismissed, `Failed` when the file cannot be read.
    fn load_file(&self, request: &LoadRequest) -> Result<LoadedFile, InteractionFault>;
}

/// How the saved signature should be proposed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveProposal {
    pub filename: String,
    pub extensions: Vec<String>,
    pub description: Option<String>,
    pub current_dir: Option<String>,
}

impl SaveProposal {
    #[must_use]
    pub fn from_params(filename: String, params: &ExtraParams) -> Self {
        Self {
            filename,
            extensions: split_extensions(params.get(SAVE_FILE_EXTS)),
            description: params.get(SAVE_FILE_DESCRIPTION).map(str::to_string),
            current_dir: params.get(SAVE_FILE_CURRENT_DIR).map(str::to_string),
        }
    }
}

pub trait SaveTarget: Send + Sync {
    /// # Errors
    /// [`InteractionFault::Cancelled`] when dismissed, `Failed` on write errors.
    fn save(&self, data: &[u8], proposal: &SaveProposal) -> Result<(), InteractionFault>;
}

/// Writes into a fixed directory under the proposed name, for hosts that
/// have no save dialog.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&self, data: &[u8], proposal: &SaveProposal) -> Result<(), InteractionFault> {
        let name = Path::new(&proposal.filename).file_name().ok_or_else(|| {
            InteractionFault::Failed(format!("invalid file name: {}", proposal.filename))
        })?;
        let path = self.dir.join(name);
        std::fs::write(&path, data)
            .map_err(|e| InteractionFault::Failed(format!("{}: {e}", path.display())))?;
        log::info!("Saved {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

/// Result of asking the user where the visible signature goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// New position and appearance properties
    Placed(ExtraParams),
    /// The dialog was closed without choosing an area
    Dismissed,
}

pub trait VisibleSignaturePlacer: Send + Sync {
    /// `massive` is set when the document is one of several in a batch.
    ///
    /// # Errors
    /// [`InteractionFault`] when the dialog cannot be shown or is aborted.
    fn place(
        &self,
        document: &[u8],
        params: &ExtraParams,
        massive: bool,
    ) -> Result<Placement, InteractionFault>;
}

fn split_extensions(value: Option<&str>) -> Vec<String> {
    value
        .map(|exts| {
            exts.split(',')
                .map(str::trim)
                .filter(|ext| !ext.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
