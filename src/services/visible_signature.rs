//! Visible PDF signature placement rules.

use crate::adapters::interaction::{InteractionFault, Placement, VisibleSignaturePlacer};
use crate::domain::constants::EXTRA_VISIBLE_SIGNATURE;
use crate::domain::extra_params::ExtraParams;
use crate::domain::format::SignFormat;
use crate::infra::error::{SigningError, SigningResult};

const VISIBLE_WANT: &str = "want";
const VISIBLE_OPTIONAL: &str = "optional";

const LOWER_LEFT_X: &str = "signaturePositionOnPageLowerLeftX";
const LOWER_LEFT_Y: &str = "signaturePositionOnPageLowerLeftY";
const UPPER_RIGHT_X: &str = "signaturePositionOnPageUpperRightX";
const UPPER_RIGHT_Y: &str = "signaturePositionOnPageUpperRightY";
const SIGNATURE_PAGE: &str = "signaturePage";
const SIGNATURE_PAGES: &str = "signaturePages";

/// Keys copied from the placement dialog when present.
const APPEARANCE_KEYS: &[&str] = &[
    "layer2Text",
    "layer2FontFamily",
    "layer2FontSize",
    "signatureRotation",
    "layer2FontStyle",
    "layer2FontColor",
    "signatureRubricImage",
];

pub struct VisibleSignaturePolicy;

impl VisibleSignaturePolicy {
    /// PDF-family format and `visibleSignature` of `want` or `optional`.
    #[must_use]
    pub fn is_placement_required(format: &SignFormat, params: &ExtraParams) -> bool {
        format.is_pdf_family()
            && params.get(EXTRA_VISIBLE_SIGNATURE).is_some_and(|v| {
                v.eq_ignore_ascii_case(VISIBLE_WANT) || v.eq_ignore_ascii_case(VISIBLE_OPTIONAL)
            })
    }

    fn is_mandatory(params: &ExtraParams) -> bool {
        params
            .get(EXTRA_VISIBLE_SIGNATURE)
            .is_some_and(|v| v.eq_ignore_ascii_case(VISIBLE_WANT))
    }

    /// Whether the configuration already fixes the signature area.
    #[must_use]
    pub fn has_position(params: &ExtraParams) -> bool {
        [LOWER_LEFT_X, LOWER_LEFT_Y, UPPER_RIGHT_X, UPPER_RIGHT_Y]
            .iter()
            .all(|key| params.contains_key(key))
            && (params.contains_key(SIGNATURE_PAGE) || params.contains_key(SIGNATURE_PAGES))
    }

    /// Ask the placer for a signature area when the format and configuration
    /// call for one, merging the answer into `params`.
    ///
    /// # Errors
    /// [`SigningError::VisibleSignatureMandatory`] when a mandatory placement
    /// was dismissed and the configuration does not already fix the area.
    pub fn apply(
        placer: &dyn VisibleSignaturePlacer,
        document: &[u8],
        format: &SignFormat,
        params: &mut ExtraParams,
        massive: bool,
    ) -> SigningResult<()> {
        if !Self::is_placement_required(format, params) {
            return Ok(());
        }

        match placer.place(document, params, massive) {
            Ok(Placement::Placed(placed)) if !placed.is_empty() => {
                merge_placement(params, &placed);
                return Ok(());
            }
            Ok(_) => log::info!("Visible signature placement dismissed"),
            Err(InteractionFault::Cancelled) => {
                log::info!("Visible signature placement cancelled");
                return Err(SigningError::VisibleSignatureMandatory(
                    "placement was cancelled".to_string(),
                ));
            }
            // A broken dialog counts as no answer.
            Err(InteractionFault::Failed(msg)) => {
                log::warn!("Visible signature placement failed: {msg}");
            }
        }

        if Self::is_mandatory(params) && !Self::has_position(params) {
            Err(SigningError::VisibleSignatureMandatory(
                "the signature area was not selected".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

fn merge_placement(params: &mut ExtraParams, placed: &ExtraParams) {
    for key in [LOWER_LEFT_X, LOWER_LEFT_Y, UPPER_RIGHT_X, UPPER_RIGHT_Y, SIGNATURE_PAGE] {
        if let Some(value) = placed.get(key) {
            params.set(key, value);
        }
    }
    for key in APPEARANCE_KEYS {
        if let Some(value) = placed.get(key) {
            params.set(*key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPlacer(Result<Placement, InteractionFault>);

    impl VisibleSignaturePlacer for FixedPlacer {
        fn place(
            &self,
            _document: &[u8],
            _params: &ExtraParams,
            _massive: bool,
        ) -> Result<Placement, InteractionFault> {
            self.0.clone()
        }
    }

    fn pades() -> SignFormat {
        SignFormat::new("PAdES")
    }

    #[test]
    fn test_placement_required() {
        let want = ExtraParams::parse_properties("visibleSignature=WANT");
        let never = ExtraParams::parse_properties("visibleSignature=never");
        assert!(VisibleSignaturePolicy::is_placement_required(&pades(), &want));
        assert!(!VisibleSignaturePolicy::is_placement_required(&pades(), &never));
        assert!(!VisibleSignaturePolicy::is_placement_required(
            &SignFormat::new("CAdES"),
            &want
        ));
    }

    #[test]
    fn test_placed_properties_are_merged() {
        let placed = ExtraParams::parse_properties(
            "signaturePositionOnPageLowerLeftX=10\nsignaturePositionOnPageLowerLeftY=20\nsignaturePositionOnPageUpperRightX=110\nsignaturePositionOnPageUpperRightY=70\nsignaturePage=1\nlayer2Text=Signed\nunrelated=x",
        );
        let placer = FixedPlacer(Ok(Placement::Placed(placed)));
        let mut params = ExtraParams::parse_properties("visibleSignature=want");
        VisibleSignaturePolicy::apply(&placer, b"%PDF-", &pades(), &mut params, false).unwrap();
        assert!(VisibleSignaturePolicy::has_position(&params));
        assert_eq!(params.get("layer2Text"), Some("Signed"));
        assert!(!params.contains_key("unrelated"));
    }

    #[test]
    fn test_dismissed_mandatory_fails() {
        let placer = FixedPlacer(Ok(Placement::Dismissed));
        let mut params = ExtraParams::parse_properties("visibleSignature=want");
        let err = VisibleSignaturePolicy::apply(&placer, b"%PDF-", &pades(), &mut params, false)
            .unwrap_err();
        assert!(matches!(err, SigningError::VisibleSignatureMandatory(_)));
    }

    #[test]
    fn test_dismissed_optional_continues() {
        let placer = FixedPlacer(Ok(Placement::Dismissed));
        let mut params = ExtraParams::parse_properties("visibleSignature=optional");
        assert!(
            VisibleSignaturePolicy::apply(&placer, b"%PDF-", &pades(), &mut params, false).is_ok()
        );
    }

    #[test]
    fn test_dismissed_with_preset_area_continues() {
        let placer = FixedPlacer(Ok(Placement::Dismissed));
        let mut params = ExtraParams::parse_properties(
            "visibleSignature=want\nsignaturePositionOnPageLowerLeftX=1\nsignaturePositionOnPageLowerLeftY=1\nsignaturePositionOnPageUpperRightX=2\nsignaturePositionOnPageUpperRightY=2\nsignaturePages=all",
        );
        assert!(
            VisibleSignaturePolicy::apply(&placer, b"%PDF-", &pades(), &mut params, false).is_ok()
        );
    }

    #[test]
    fn test_failed_dialog_behaves_like_dismissal() {
        let placer = FixedPlacer(Err(InteractionFault::Failed("no display".into())));
        let mut optional = ExtraParams::parse_properties("visibleSignature=optional");
        assert!(
            VisibleSignaturePolicy::apply(&placer, b"%PDF-", &pades(), &mut optional, false)
                .is_ok()
        );
        let mut want = ExtraParams::parse_properties("visibleSignature=want");
        assert!(
            VisibleSignaturePolicy::apply(&placer, b"%PDF-", &pades(), &mut want, false).is_err()
        );
    }

    #[test]
    fn test_cancelled_dialog_is_mandatory_failure() {
        let placer = FixedPlacer(Err(InteractionFault::Cancelled));
        let mut params = ExtraParams::parse_properties("visibleSignature=optional");
        let err = VisibleSignaturePolicy::apply(&placer, b"%PDF-", &pades(), &mut params, true)
            .unwrap_err();
        assert!(matches!(err, SigningError::VisibleSignatureMandatory(_)));
    }
}
