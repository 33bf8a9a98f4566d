//! Structural CMS / CAdES discrimination.
//!
//! A CAdES signature is valid CMS `SignedData` whose signers carry the
//! `id-aa-ets-sigPolicyId` signed attribute. Plain CMS consumers must treat
//! the two differently, so the distinction is made from the bytes alone.
//!
//! DER input goes through the typed `cms` structures. Anything they reject is
//! walked again as BER (indefinite lengths, unsorted `SET OF`), which RFC 5652
//! permits for `SignedData`.

use crate::domain::constants::{ID_AA_ETS_SIG_POLICY_ID, ID_SIGNED_DATA};
use bcder::decode::{Constructed, DecodeError, Source};
use bcder::oid::ConstOid;
use bcder::{Mode, Oid, Tag};
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerInfo};
use der::{Decode, SliceReader};
use serde::Serialize;
use std::fmt;

/// id-signedData, as BER content octets
const SIGNED_DATA_OID: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 2]);

/// id-aa-ets-sigPolicyId, as BER content octets
const SIG_POLICY_ID_OID: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 15]);

/// Outcome of inspecting a buffer believed to be a signature container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CmsClassification {
    NotCmsSignedData,
    CmsSignedData,
    CadesSignedData,
}

impl fmt::Display for CmsClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotCmsSignedData => "NOT_CMS_SIGNED_DATA",
            Self::CmsSignedData => "CMS_SIGNED_DATA",
            Self::CadesSignedData => "CADES_SIGNED_DATA",
        };
        f.write_str(name)
    }
}

/// Classify `data` without ever failing.
///
/// Malformed or truncated input is [`CmsClassification::NotCmsSignedData`].
/// Bytes after a DER `ContentInfo` are ignored; a BER `ContentInfo` must fill
/// the buffer. A signer without signed attributes carries no policy attribute.
#[must_use]
pub fn classify(data: &[u8]) -> CmsClassification {
    let policy = der_signature_policy(data).or_else(|| ber_signature_policy(data));
    match policy {
        None => CmsClassification::NotCmsSignedData,
        Some(false) => CmsClassification::CmsSignedData,
        Some(true) => CmsClassification::CadesSignedData,
    }
}

/// Convenience wrapper for callers that only care about plain CMS.
#[must_use]
pub fn is_cms_signed_data(data: &[u8]) -> bool {
    classify(data) == CmsClassification::CmsSignedData
}

/// `Some(true)` when a DER `SignedData` has a signer with a signature policy.
fn der_signature_policy(data: &[u8]) -> Option<bool> {
    let mut reader = SliceReader::new(data).ok()?;
    let content_info = ContentInfo::decode(&mut reader).ok()?;
    if content_info.content_type != ID_SIGNED_DATA {
        return None;
    }
    let signed_data = content_info.content.decode_as::<SignedData>().ok()?;

    let position = signed_data
        .signer_infos
        .0
        .iter()
        .position(carries_signature_policy);
    if let Some(index) = position {
        log::debug!("Signer {index} carries a signature policy, treating as CAdES");
    }
    Some(position.is_some())
}

fn carries_signature_policy(signer: &SignerInfo) -> bool {
    signer
        .signed_attrs
        .as_ref()
        .is_some_and(|attrs| attrs.iter().any(|attr| attr.oid == ID_AA_ETS_SIG_POLICY_ID))
}

/// Same question as [`der_signature_policy`], answered by walking BER.
fn ber_signature_policy(data: &[u8]) -> Option<bool> {
    match Mode::Ber.decode(data, take_content_info) {
        Ok(found) => {
            log::debug!("Decoded BER SignedData (signature policy: {found})");
            Some(found)
        }
        Err(_) => None,
    }
}

fn take_content_info<S: Source>(cons: &mut Constructed<S>) -> Result<bool, DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        SIGNED_DATA_OID.skip_if(cons)?;
        cons.take_constructed_if(Tag::CTX_0, |cons| {
            cons.take_sequence(|cons| {
                cons.skip_one()?; // version
                cons.skip_one()?; // digestAlgorithms
                cons.skip_one()?; // encapContentInfo
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| cons.skip_all())?;
                cons.take_opt_constructed_if(Tag::CTX_1, |cons| cons.skip_all())?;
                cons.take_set(|cons| {
                    let mut found = false;
                    while let Some(policy) = cons.take_opt_sequence(take_signer_info)? {
                        found |= policy;
                    }
                    Ok(found)
                })
            })
        })
    })
}

fn take_signer_info<S: Source>(cons: &mut Constructed<S>) -> Result<bool, DecodeError<S::Error>> {
    cons.skip_one()?; // version
    cons.skip_one()?; // sid
    cons.skip_one()?; // digestAlgorithm
    let policy = cons
        .take_opt_constructed_if(Tag::CTX_0, |cons| {
            let mut found = false;
            while let Some(oid) = cons.take_opt_sequence(|cons| {
                let oid = Oid::take_from(cons)?;
                cons.skip_all()?;
                Ok(oid)
            })? {
                found |= oid == SIG_POLICY_ID_OID;
            }
            Ok(found)
        })?
        .unwrap_or(false);
    // signatureAlgorithm, signature, unsignedAttrs
    cons.skip_all()?;
    Ok(policy)
}
