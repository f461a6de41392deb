//! Markdown report generation

use super::{AggregateReport, ArtifactReport};

pub fn generate(report: &ArtifactReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Trust audit: {}\n\n", report.artifact));

    if !report.located {
        output.push_str("**Artifact could not be located.**\n\n");
    }
    if let Some(hash) = &report.content_hash {
        output.push_str(&format!("Content SHA-256: `{}`\n\n", hash));
    }

    output.push_str(&format!(
        "Credibility: **{:.2}** ({} verified, {} failed, {} unverifiable across {} claims)\n\n",
        report.credibility,
        report.verified_count,
        report.failed_count,
        report.unverifiable_count,
        report.claim_count
    ));

    output.push_str("## Checks\n\n");
    output.push_str("| Check | Status | Evidence |\n");
    output.push_str("|-------|--------|----------|\n");
    for result in &report.results {
        output.push_str(&format!(
            "| {} | {} | {} |\n",
            result.check,
            result.status,
            result.evidence.replace('|', "\\|")
        ));
    }
    output.push('\n');

    output.push_str("## Gaps\n\n");
    if report.gaps.is_empty() {
        output.push_str("No gaps.\n");
    } else {
        for gap in &report.gaps {
            output.push_str(&format!("- **{}**: {}\n", gap.category, gap.detail));
        }
        output.push_str(&format!(
            "\nUnfinished business: {}\n",
            report.unfinished_business
        ));
    }

    output
}

pub fn generate_aggregate(report: &AggregateReport) -> String {
    let mut output = String::new();

    output.push_str("# Trust audit: aggregate\n\n");
    output.push_str(&format!(
        "{} artifacts, mean credibility **{:.2}**, {} not found\n\n",
        report.artifact_count, report.mean_credibility, report.not_found
    ));

    output.push_str("| Artifact | Located | Credibility | Verified | Failed | Gaps |\n");
    output.push_str("|----------|---------|-------------|----------|--------|------|\n");
    for row in &report.rows {
        output.push_str(&format!(
            "| {} | {} | {:.2} | {} | {} | {} |\n",
            row.artifact,
            if row.located { "yes" } else { "no" },
            row.credibility,
            row.verified_count,
            row.failed_count,
            row.gap_count
        ));
    }
    output.push('\n');

    output.push_str("## Gap totals\n\n");
    output.push_str(&format!(
        "- CONTRADICTED: {}\n- UNVERIFIED: {}\n- UNMONITORED: {}\n- PREMATURE_VICTORY: {}\n",
        report.gap_totals.contradicted,
        report.gap_totals.unverified,
        report.gap_totals.unmonitored,
        report.gap_totals.premature_victory
    ));

    if report.dropped_claims > 0 || report.skipped_sources > 0 {
        output.push_str(&format!(
            "\nExtraction diagnostics: {} claims dropped (unresolvable target), {} sources skipped (unparseable)\n",
            report.dropped_claims, report.skipped_sources
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extraction;
    use crate::verify::{CheckId, VerificationResult};

    #[test]
    fn test_markdown_artifact_report() {
        let report = ArtifactReport::build(
            "a.py".into(),
            true,
            Some("abc123".into()),
            1,
            vec![VerificationResult::verified(
                CheckId::CatchAllHandler,
                "no catch-all error handlers in 5 code lines".to_string(),
            )],
            vec![],
        );
        let md = generate(&report);
        assert!(md.contains("# Trust audit: a.py"));
        assert!(md.contains("`abc123`"));
        assert!(md.contains("catch_all_handler"));
        assert!(md.contains("No gaps."));
    }

    #[test]
    fn test_markdown_aggregate_report() {
        let extraction = Extraction {
            by_artifact: Default::default(),
            dropped_claims: 1,
            skipped_sources: 0,
        };
        let reports = vec![ArtifactReport::build(
            "a.py".into(),
            true,
            None,
            0,
            vec![],
            vec![],
        )];
        let aggregate = AggregateReport::from_run(&reports, &extraction);
        let md = generate_aggregate(&aggregate);
        assert!(md.contains("1 artifacts"));
        assert!(md.contains("| a.py |"));
        assert!(md.contains("1 claims dropped"));
    }
}
