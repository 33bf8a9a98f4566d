//! Signature format identifiers and container classifications.

use serde::Serialize;
use std::fmt;

/// Well-known signature format names.
pub mod formats {
    pub const AUTO: &str = "AUTO";
    pub const CADES: &str = "CAdES";
    pub const CMS: &str = "CMS/PKCS#7";
    pub const XADES: &str = "XAdES";
    pub const XADES_TRI: &str = "XAdEStri";
    pub const PADES: &str = "PAdES";
    pub const PADES_TRI: &str = "PAdEStri";
    pub const PDF: &str = "Adobe PDF";
    pub const PDF_TRI: &str = "Adobe PDF TriPhase";
    pub const FACTURAE: &str = "FacturaE";
    pub const ODF: &str = "ODF (Open Document Format)";
    pub const OOXML: &str = "OOXML (Office Open XML)";
    pub const PADES_SUBFILTER_BES: &str = "ETSI.CAdES.detached";
    pub const PADES_SUBFILTER_BASIC: &str = "adbe.pkcs7.detached";

    /// Format names that produce PDF-embedded signatures (exact match)
    pub const PDF_FAMILY: &[&str] = &[
        PDF,
        PDF_TRI,
        PADES,
        PADES_TRI,
        PADES_SUBFILTER_BES,
        PADES_SUBFILTER_BASIC,
    ];
}

/// Signature format name as requested by the caller or resolved by sniffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SignFormat(String);

impl SignFormat {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn auto() -> Self {
        Self(formats::AUTO.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The AUTO sentinel, compared case-insensitively
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.0.eq_ignore_ascii_case(formats::AUTO)
    }

    /// Any member of the XAdES family, by case-insensitive name prefix
    #[must_use]
    pub fn is_xades_family(&self) -> bool {
        self.0
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("xades"))
    }

    #[must_use]
    pub fn is_xades_triphase(&self) -> bool {
        self.0.eq_ignore_ascii_case(formats::XADES_TRI)
    }

    #[must_use]
    pub fn is_pdf_family(&self) -> bool {
        formats::PDF_FAMILY.contains(&self.0.as_str())
    }
}

impl fmt::Display for SignFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignFormat {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Kind of document detected in unsigned input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerClassification {
    Pdf,
    /// Spanish electronic invoice (Facturae schema)
    LegalInvoice,
    Xml,
    Odf,
    Ooxml,
    Unknown,
}

impl ContainerClassification {
    /// Format used to sign fresh data of this kind.
    #[must_use]
    pub fn default_format(&self) -> SignFormat {
        let name = match self {
            Self::Pdf => formats::PADES,
            Self::LegalInvoice => formats::FACTURAE,
            Self::Xml => formats::XADES,
            Self::Odf => formats::ODF,
            Self::Ooxml => formats::OOXML,
            Self::Unknown => formats::CADES,
        };
        SignFormat::new(name)
    }
}

impl fmt::Display for ContainerClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdf => "PDF",
            Self::LegalInvoice => "LEGAL_INVOICE",
            Self::Xml => "XML",
            Self::Odf => "ODF",
            Self::Ooxml => "OOXML",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}
