//! Report generation
//!
//! Per-artifact and aggregate documents are deterministic functions of the
//! run's inputs: fixed check order, sorted keys, rounded scores, no
//! timestamps or random identifiers. Re-running on unchanged inputs
//! reproduces both byte-for-byte.

pub mod json;
pub mod markdown;

use crate::extract::Extraction;
use crate::gaps::{Gap, GapCategory};
use crate::verify::VerificationResult;
use crate::CoreResult;
use serde::{Deserialize, Serialize};

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
}

/// Generate one artifact report in the given format
pub fn generate_artifact(report: &ArtifactReport, format: ReportFormat) -> CoreResult<String> {
    match format {
        ReportFormat::Json => json::generate(report),
        ReportFormat::Markdown => Ok(markdown::generate(report)),
    }
}

/// Generate the aggregate report in the given format
pub fn generate_aggregate(report: &AggregateReport, format: ReportFormat) -> CoreResult<String> {
    match format {
        ReportFormat::Json => json::generate_aggregate(report),
        ReportFormat::Markdown => Ok(markdown::generate_aggregate(report)),
    }
}

/// Credibility score: verified / (verified + failed), two decimals, 0.0 on
/// a zero denominator.
pub fn credibility_score(verified: usize, failed: usize) -> f64 {
    let denominator = verified + failed;
    if denominator == 0 {
        return 0.0;
    }
    round2(verified as f64 / denominator as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-artifact report, rebuilt from scratch each run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub artifact: String,
    pub located: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub credibility: f64,
    pub verified_count: usize,
    pub failed_count: usize,
    pub unverifiable_count: usize,
    pub claim_count: usize,
    pub results: Vec<VerificationResult>,
    pub gaps: Vec<Gap>,
    /// Total count of open items across all gap categories
    pub unfinished_business: usize,
}

impl ArtifactReport {
    pub fn build(
        artifact: String,
        located: bool,
        content_hash: Option<String>,
        claim_count: usize,
        results: Vec<VerificationResult>,
        gaps: Vec<Gap>,
    ) -> Self {
        let verified_count = results.iter().filter(|r| r.status.is_verified()).count();
        let failed_count = results.iter().filter(|r| r.status.is_failed()).count();
        let unverifiable_count = results.iter().filter(|r| r.status.is_unverifiable()).count();
        let credibility = credibility_score(verified_count, failed_count);
        let unfinished_business = gaps.len();

        Self {
            artifact,
            located,
            content_hash,
            credibility,
            verified_count,
            failed_count,
            unverifiable_count,
            claim_count,
            results,
            gaps,
            unfinished_business,
        }
    }
}

/// Global gap counts per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapTotals {
    pub contradicted: usize,
    pub unverified: usize,
    pub unmonitored: usize,
    pub premature_victory: usize,
}

impl GapTotals {
    pub fn add(&mut self, category: GapCategory) {
        match category {
            GapCategory::Contradicted => self.contradicted += 1,
            GapCategory::Unverified => self.unverified += 1,
            GapCategory::Unmonitored => self.unmonitored += 1,
            GapCategory::PrematureVictory => self.premature_victory += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.contradicted + self.unverified + self.unmonitored + self.premature_victory
    }
}

/// One aggregate summary row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub artifact: String,
    pub located: bool,
    pub credibility: f64,
    pub verified_count: usize,
    pub failed_count: usize,
    pub gap_count: usize,
}

/// Aggregate over the complete artifact set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub artifact_count: usize,
    pub rows: Vec<SummaryRow>,
    pub gap_totals: GapTotals,
    pub mean_credibility: f64,
    pub not_found: usize,
    pub dropped_claims: usize,
    pub skipped_sources: usize,
}

impl AggregateReport {
    /// Reduce completed per-artifact reports. Must only be called after all
    /// artifact-level work has finished; a partial set would misrepresent
    /// the run.
    pub fn from_run(reports: &[ArtifactReport], extraction: &Extraction) -> Self {
        let rows: Vec<SummaryRow> = reports
            .iter()
            .map(|r| SummaryRow {
                artifact: r.artifact.clone(),
                located: r.located,
                credibility: r.credibility,
                verified_count: r.verified_count,
                failed_count: r.failed_count,
                gap_count: r.gaps.len(),
            })
            .collect();

        let mut gap_totals = GapTotals::default();
        for report in reports {
            for gap in &report.gaps {
                gap_totals.add(gap.category);
            }
        }

        let mean_credibility = if reports.is_empty() {
            0.0
        } else {
            round2(reports.iter().map(|r| r.credibility).sum::<f64>() / reports.len() as f64)
        };

        Self {
            artifact_count: reports.len(),
            rows,
            gap_totals,
            mean_credibility,
            not_found: reports.iter().filter(|r| !r.located).count(),
            dropped_claims: extraction.dropped_claims,
            skipped_sources: extraction.skipped_sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps::GapReference;
    use crate::verify::CheckId;

    #[test]
    fn test_credibility_score_rounding() {
        assert_eq!(credibility_score(0, 0), 0.0);
        assert_eq!(credibility_score(0, 1), 0.0);
        assert_eq!(credibility_score(5, 0), 1.0);
        assert_eq!(credibility_score(1, 2), 0.33);
        assert_eq!(credibility_score(2, 1), 0.67);
    }

    #[test]
    fn test_report_build_counts() {
        let results = vec![
            VerificationResult::verified(CheckId::CatchAllHandler, "clean".to_string()),
            VerificationResult::failed(CheckId::TruncationLimit, "line 3: `[:10]`".to_string()),
            VerificationResult::unverifiable(CheckId::DuplicateRoutine, "binary".to_string()),
        ];
        let gaps = vec![Gap {
            category: GapCategory::Contradicted,
            reference: GapReference::Check {
                name: "truncation_limit".to_string(),
            },
            detail: "line 3: `[:10]`".to_string(),
        }];
        let report = ArtifactReport::build("a.py".into(), true, None, 2, results, gaps);
        assert_eq!(report.verified_count, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.unverifiable_count, 1);
        assert_eq!(report.credibility, 0.5);
        assert_eq!(report.unfinished_business, 1);
    }

    #[test]
    fn test_aggregate_totals_and_mean() {
        let extraction = Extraction {
            by_artifact: Default::default(),
            dropped_claims: 2,
            skipped_sources: 1,
        };
        let reports = vec![
            ArtifactReport::build(
                "a.py".into(),
                true,
                None,
                0,
                vec![VerificationResult::verified(
                    CheckId::CatchAllHandler,
                    "clean".to_string(),
                )],
                vec![],
            ),
            ArtifactReport::build(
                "b.py".into(),
                false,
                None,
                0,
                vec![VerificationResult::failed(
                    CheckId::ArtifactPresent,
                    "artifact not found: b.py".to_string(),
                )],
                vec![Gap {
                    category: GapCategory::Contradicted,
                    reference: GapReference::Check {
                        name: "artifact_present".to_string(),
                    },
                    detail: "artifact not found: b.py".to_string(),
                }],
            ),
        ];
        let aggregate = AggregateReport::from_run(&reports, &extraction);
        assert_eq!(aggregate.artifact_count, 2);
        assert_eq!(aggregate.mean_credibility, 0.5);
        assert_eq!(aggregate.not_found, 1);
        assert_eq!(aggregate.gap_totals.contradicted, 1);
        assert_eq!(aggregate.gap_totals.total(), 1);
        assert_eq!(aggregate.dropped_claims, 2);
        assert_eq!(aggregate.skipped_sources, 1);
    }

}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Credibility is always within [0, 1] and zero exactly when no
        /// check resolved to verified or failed.
        #[test]
        fn test_credibility_bounds(verified in 0usize..500, failed in 0usize..500) {
            let score = credibility_score(verified, failed);
            prop_assert!((0.0..=1.0).contains(&score));
            if verified + failed == 0 {
                prop_assert_eq!(score, 0.0);
            }
        }
    }
}
