//! Container sniffing for requests with the AUTO format.
//!
//! Fresh data is classified by its structure (PDF, invoice XML, XML, ODF,
//! OOXML, else a generic CMS container). Existing signatures must be
//! recognised by an engine; there is no sensible default for them.

use crate::adapters::registry::SignerRegistry;
use crate::domain::cms::{self, CmsClassification};
use crate::domain::constants::{
    FACTURAE_ROOT, ODF_MIMETYPE_ENTRY, ODF_MIMETYPE_PREFIX, OOXML_CONTENT_TYPES_ENTRY, PDF_MAGIC,
    ZIP_MAGIC,
};
use crate::domain::format::{formats, ContainerClassification, SignFormat};
use crate::domain::operation::CryptoOperation;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use thiserror::Error;
use zip::ZipArchive;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SniffError {
    #[error("no signer recognises the data as a signature")]
    UnidentifiableSigner,
}

/// Classify unsigned data. Tests run in priority order and the first match wins.
#[must_use]
pub fn classify_container(data: &[u8]) -> ContainerClassification {
    if is_pdf(data) {
        return ContainerClassification::Pdf;
    }

    if let Some(root) = xml_root_local_name(data) {
        return if root == FACTURAE_ROOT {
            ContainerClassification::LegalInvoice
        } else {
            ContainerClassification::Xml
        };
    }

    if let Some(mut archive) = open_zip(data) {
        if is_odf(&mut archive) {
            return ContainerClassification::Odf;
        }
        if archive.by_name(OOXML_CONTENT_TYPES_ENTRY).is_ok() {
            return ContainerClassification::Ooxml;
        }
    }

    ContainerClassification::Unknown
}

#[must_use]
pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Resolves the format to use when the caller asked for AUTO.
pub struct ContainerSniffer<'a> {
    registry: &'a dyn SignerRegistry,
}

impl<'a> ContainerSniffer<'a> {
    pub fn new(registry: &'a dyn SignerRegistry) -> Self {
        Self { registry }
    }

    /// Pick a format for `data` given the operation kind.
    ///
    /// # Errors
    /// [`SniffError::UnidentifiableSigner`] when a cosign/countersign input is
    /// not recognised as a signature.
    pub fn sniff(
        &self,
        data: &[u8],
        operation: CryptoOperation,
    ) -> Result<SignFormat, SniffError> {
        if !operation.is_multisign() {
            let classification = classify_container(data);
            log::debug!("Input data classified as {classification}");
            return Ok(classification.default_format());
        }

        if let Some(engine) = self.registry.signer_for_data(data) {
            log::debug!("Input signature recognised by the {} signer", engine.format());
            return Ok(SignFormat::new(engine.format()));
        }

        match cms::classify(data) {
            CmsClassification::CmsSignedData => Ok(SignFormat::new(formats::CMS)),
            CmsClassification::CadesSignedData => Ok(SignFormat::new(formats::CADES)),
            CmsClassification::NotCmsSignedData => Err(SniffError::UnidentifiableSigner),
        }
    }
}

/// Local name of the root element if `data` is a well-formed XML document.
fn xml_root_local_name(data: &[u8]) -> Option<Vec<u8>> {
    let body = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let first = body.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'<' {
        return None;
    }

    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);
    reader.check_end_names(true);

    let mut buf = Vec::new();
    let mut root: Option<Vec<u8>> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) => {
                if depth == 0 {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(element.local_name().as_ref().to_vec());
                }
                depth += 1;
            }
            Ok(Event::Empty(element)) => {
                if depth == 0 {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(element.local_name().as_ref().to_vec());
                }
            }
            Ok(Event::End(_)) => depth = depth.checked_sub(1)?,
            Ok(Event::Text(text)) => {
                if depth == 0 && !text.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
        buf.clear();
    }

    if depth == 0 {
        root
    } else {
        None
    }
}

fn open_zip(data: &[u8]) -> Option<ZipArchive<Cursor<&[u8]>>> {
    if !data.starts_with(ZIP_MAGIC) {
        return None;
    }
    ZipArchive::new(Cursor::new(data)).ok()
}

fn is_odf(archive: &mut ZipArchive<Cursor<&[u8]>>) -> bool {
    let Ok(mut entry) = archive.by_name(ODF_MIMETYPE_ENTRY) else {
        return false;
    };
    let mut mimetype = String::new();
    entry.read_to_string(&mut mimetype).is_ok() && mimetype.starts_with(ODF_MIMETYPE_PREFIX)
}
