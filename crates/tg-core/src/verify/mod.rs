//! Static verification engine
//!
//! Runs the check registry against one artifact's current content and
//! returns an ordered list of tri-state results with line-citing evidence.

pub mod checks;
pub mod content;

pub use checks::CheckId;
pub use content::ArtifactContent;

use crate::artifact::LoadOutcome;
use crate::extract::ClaimSet;
use crate::{BackendPolicy, CheckStatus};
use serde::{Deserialize, Serialize};

/// Output of running one check against one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub check: CheckId,
    pub status: CheckStatus,
    /// Human-readable justification citing concrete content
    pub evidence: String,
    /// Occurrence count, when the check counts matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl VerificationResult {
    pub fn verified(check: CheckId, evidence: String) -> Self {
        debug_assert!(!evidence.is_empty(), "verified result requires evidence");
        Self {
            check,
            status: CheckStatus::Verified,
            evidence,
            count: None,
        }
    }

    pub fn failed(check: CheckId, evidence: String) -> Self {
        debug_assert!(!evidence.is_empty(), "failed result requires evidence");
        Self {
            check,
            status: CheckStatus::Failed,
            evidence,
            count: None,
        }
    }

    pub fn unverifiable(check: CheckId, evidence: String) -> Self {
        Self {
            check,
            status: CheckStatus::Unverifiable,
            evidence,
            count: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// Runs the full check registry against one artifact
pub struct Verifier {
    policy: BackendPolicy,
}

impl Verifier {
    pub fn new(policy: BackendPolicy) -> Self {
        Self { policy }
    }

    /// Verify one artifact. The result list order is deterministic:
    /// universal checks in registry order, then claim-bound checks sorted
    /// by subject.
    pub fn verify(
        &self,
        artifact: &str,
        outcome: &LoadOutcome,
        claims: &ClaimSet,
    ) -> Vec<VerificationResult> {
        let data = match outcome {
            LoadOutcome::Loaded(data) => data,
            LoadOutcome::Missing => {
                return vec![VerificationResult::failed(
                    CheckId::ArtifactPresent,
                    format!("artifact not found: {}", artifact),
                )];
            }
            LoadOutcome::TimedOut => {
                return vec![VerificationResult::failed(
                    CheckId::ArtifactPresent,
                    format!("artifact not found: {} (load timed out)", artifact),
                )];
            }
            LoadOutcome::Unreadable(reason) => {
                return vec![VerificationResult::failed(
                    CheckId::ArtifactPresent,
                    format!("artifact not found: {} ({})", artifact, reason),
                )];
            }
        };

        let registry = checks::registry_for(claims);

        let content = match ArtifactContent::from_bytes(data) {
            Ok(content) => content,
            // Malformed content is "no independent confirmation", never a
            // contradiction.
            Err(reason) => {
                return registry
                    .into_iter()
                    .map(|check| VerificationResult::unverifiable(check, reason.clone()))
                    .collect();
            }
        };

        registry
            .iter()
            .map(|check| checks::run(check, &content, &self.policy))
            .collect()
    }
}
