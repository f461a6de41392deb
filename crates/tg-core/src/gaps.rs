//! Gap classification
//!
//! Cross-references one artifact's claims against its verification results
//! and assigns every discrepancy to a category. Classification is a pure
//! function of the (claims, results) pair: recomputing it always yields the
//! same gap set, and every gap traces back to a claim or result from the
//! same run.

use crate::extract::{Claim, ClaimCategory, ClaimSet};
use crate::verify::{checks, CheckId, VerificationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tg_patterns as patterns;

/// Trust gap taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapCategory {
    /// A check found the claimed-fixed (or independently scanned) defect
    Contradicted,
    /// A claim no check covers; it stands without independent confirmation
    Unverified,
    /// Clean today, but nothing prevents silent regression
    Unmonitored,
    /// Completion asserted without an evidence trail
    PrematureVictory,
}

impl GapCategory {
    pub fn name(&self) -> &'static str {
        match self {
            GapCategory::Contradicted => "CONTRADICTED",
            GapCategory::Unverified => "UNVERIFIED",
            GapCategory::Unmonitored => "UNMONITORED",
            GapCategory::PrematureVictory => "PREMATURE_VICTORY",
        }
    }
}

impl std::fmt::Display for GapCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a gap traces back to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReference {
    Check { name: String },
    Claim { category: ClaimCategory, text: String },
}

/// A classified discrepancy between claimed and verified state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub category: GapCategory,
    pub reference: GapReference,
    pub detail: String,
}

/// Classify one artifact's gaps.
///
/// Precedence: failed checks first (a defect found independently is still
/// reportable), then per-claim classification. Each underlying
/// (claim, check) fact produces exactly one gap: a failure already surfaced
/// as CONTRADICTED suppresses the matching claim, and a verified
/// regression-prone check collapses however many matching claims into one
/// UNMONITORED gap.
pub fn classify(claims: &ClaimSet, results: &[VerificationResult]) -> Vec<Gap> {
    let mut gaps = Vec::new();

    for result in results.iter().filter(|r| r.status.is_failed()) {
        gaps.push(Gap {
            category: GapCategory::Contradicted,
            reference: GapReference::Check {
                name: result.check.name().to_string(),
            },
            detail: result.evidence.clone(),
        });
    }

    let mut unmonitored_seen: BTreeSet<&'static str> = BTreeSet::new();

    for claim in &claims.claims {
        if is_premature_victory(claim) {
            gaps.push(Gap {
                category: GapCategory::PrematureVictory,
                reference: claim_reference(claim),
                detail: "completion asserted without a corresponding evidence trail".to_string(),
            });
            continue;
        }

        let mapped: Vec<&VerificationResult> = results
            .iter()
            .filter(|r| claim_maps_to(claim, &r.check))
            .collect();

        if mapped.iter().any(|r| r.status.is_failed()) {
            // Already surfaced as CONTRADICTED above.
            continue;
        }

        if let Some(verified) = mapped.iter().find(|r| r.status.is_verified()) {
            if verified.check.regression_prone() && unmonitored_seen.insert(verified.check.name()) {
                gaps.push(Gap {
                    category: GapCategory::Unmonitored,
                    reference: GapReference::Check {
                        name: verified.check.name().to_string(),
                    },
                    detail: format!(
                        "claim \"{}\" holds today, but no automated guard prevents the pattern from returning",
                        claim.text
                    ),
                });
            }
            continue;
        }

        let detail = if mapped.is_empty() {
            "no check covers this claim; it stands without independent confirmation".to_string()
        } else {
            "the covering check could not be evaluated against the artifact".to_string()
        };
        gaps.push(Gap {
            category: GapCategory::Unverified,
            reference: claim_reference(claim),
            detail,
        });
    }

    gaps
}

fn claim_reference(claim: &Claim) -> GapReference {
    GapReference::Claim {
        category: claim.category,
        text: claim.text.clone(),
    }
}

/// Premature victory is carried through from the upstream pattern category:
/// a behavioral-pattern claim flagged by the producer, or one asserting
/// unconditional completion, with no evidence attached.
fn is_premature_victory(claim: &Claim) -> bool {
    claim.category == ClaimCategory::BehavioralPattern
        && claim.evidence.is_none()
        && (patterns::has_premature_victory_marker(&claim.text)
            || patterns::is_completion_claim(&claim.text))
}

/// Direct claim-to-check mapping: a routine existence check covers the
/// resolution claim naming that routine; a content scan covers resolution
/// and unresolved-issue claims whose text mentions its pattern vocabulary.
fn claim_maps_to(claim: &Claim, check: &CheckId) -> bool {
    match check {
        CheckId::RoutineExists { routine } => {
            claim.category == ClaimCategory::Resolution
                && checks::routine_in_claim(&claim.text).as_deref() == Some(routine.as_str())
        }
        CheckId::ArtifactPresent => false,
        _ => {
            if !matches!(
                claim.category,
                ClaimCategory::Resolution | ClaimCategory::UnresolvedIssue
            ) {
                return false;
            }
            let text = claim.text.to_lowercase();
            check.claim_hints().iter().any(|hint| text.contains(hint))
        }
    }
}
