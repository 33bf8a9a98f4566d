//! Pure domain types and structural parsing. Nothing here performs I/O.

pub mod certificate;
pub mod cms;
pub mod constants;
pub mod encoding;
pub mod extra_params;
pub mod format;
pub mod operation;
pub mod request;
pub mod types;
