//! JSON report generation

use super::{AggregateReport, ArtifactReport};
use crate::{CoreError, CoreResult};

pub fn generate(report: &ArtifactReport) -> CoreResult<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| CoreError::Report(format!("JSON serialization failed: {}", e)))
}

pub fn generate_aggregate(report: &AggregateReport) -> CoreResult<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| CoreError::Report(format!("JSON serialization failed: {}", e)))
}
