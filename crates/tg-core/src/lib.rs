//! Trust Gap Analysis Engine
//!
//! This crate provides the core engine for verifying claims made by
//! upstream analysis sessions against the current content of source
//! artifacts, and for classifying every discrepancy into a trust-gap
//! taxonomy with a per-artifact credibility score.

pub mod artifact;
pub mod extract;
pub mod gaps;
pub mod report;
pub mod verify;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use artifact::{ArtifactStore, FsArtifactStore, LoadOutcome, MemoryArtifactStore};
pub use extract::{Claim, ClaimCategory, ClaimSet, ClaimSource, Extraction};
pub use gaps::{Gap, GapCategory, GapReference};
pub use report::{AggregateReport, ArtifactReport};
pub use verify::{CheckId, VerificationResult, Verifier};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Tri-state outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    Verified,
    Failed,
    Unverifiable,
}

impl CheckStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, CheckStatus::Verified)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CheckStatus::Failed)
    }

    pub fn is_unverifiable(&self) -> bool {
        matches!(self, CheckStatus::Unverifiable)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Verified => write!(f, "VERIFIED"),
            CheckStatus::Failed => write!(f, "FAILED"),
            CheckStatus::Unverifiable => write!(f, "UNABLE_TO_VERIFY"),
        }
    }
}

/// A named artifact group with the target phrases that select it
///
/// Group membership is injected through configuration so that "every
/// artifact that calls the model service" style targets resolve against an
/// explicit list instead of a constant baked into the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactGroup {
    pub name: String,
    pub phrases: Vec<String>,
    pub members: Vec<String>,
}

/// The single sanctioned processing backend and the alternative client
/// tokens that are disallowed in its place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendPolicy {
    pub sanctioned: String,
    pub forbidden: Vec<String>,
}

impl Default for BackendPolicy {
    fn default() -> Self {
        Self {
            sanctioned: tg_patterns::SANCTIONED_BACKEND_DEFAULT.to_string(),
            forbidden: tg_patterns::FORBIDDEN_BACKEND_DEFAULTS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// The known artifact set; every identifier appears in the output
    pub artifacts: Vec<String>,
    /// Injectable group membership for phrase-based targets
    #[serde(default)]
    pub groups: Vec<ArtifactGroup>,
    /// Backend policy for the forbidden-backend check
    #[serde(default)]
    pub backend_policy: BackendPolicy,
    /// Worker threads for the per-artifact fan-out
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Timeout for the artifact content load step (milliseconds)
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

fn default_jobs() -> usize {
    4
}

fn default_load_timeout_ms() -> u64 {
    5_000
}

impl RunConfig {
    pub fn new(artifacts: Vec<String>) -> Self {
        Self {
            artifacts,
            groups: Vec::new(),
            backend_policy: BackendPolicy::default(),
            jobs: default_jobs(),
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Complete run result: per-artifact reports plus the aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub reports: Vec<ArtifactReport>,
    pub aggregate: AggregateReport,
}

/// Main engine interface
///
/// Runs the three stages in order: claim extraction (computed once and
/// shared read-only), per-artifact verification and gap classification
/// (fanned out over worker threads, no shared mutable state), and the
/// aggregate reduction after all artifact-level work has joined.
pub struct Engine {
    config: RunConfig,
    store: Box<dyn ArtifactStore>,
    verifier: Verifier,
}

impl Engine {
    pub fn new(config: RunConfig, store: Box<dyn ArtifactStore>) -> Self {
        let verifier = Verifier::new(config.backend_policy.clone());
        Self {
            config,
            store,
            verifier,
        }
    }

    /// Run the full pipeline over the configured artifact set
    pub fn run(&self, sources: &[ClaimSource]) -> CoreResult<RunResult> {
        if self.config.artifacts.is_empty() {
            return Err(CoreError::Config(
                "artifact set is empty; nothing to audit".to_string(),
            ));
        }

        let extraction = extract::extract_claims(sources, &self.config);
        info!(
            "extracted claims for {} artifacts ({} dropped, {} sources skipped)",
            extraction.by_artifact.len(),
            extraction.dropped_claims,
            extraction.skipped_sources
        );

        let reports = self.audit_all(&extraction);

        // The aggregate is a reduction over the complete artifact set; it is
        // only built once every per-artifact report has joined.
        let aggregate = AggregateReport::from_run(&reports, &extraction);
        Ok(RunResult { reports, aggregate })
    }

    /// Run extraction only, for dry-run diagnostics
    pub fn extract(&self, sources: &[ClaimSource]) -> CoreResult<Extraction> {
        if self.config.artifacts.is_empty() {
            return Err(CoreError::Config(
                "artifact set is empty; nothing to audit".to_string(),
            ));
        }
        Ok(extract::extract_claims(sources, &self.config))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Verify and classify each artifact on a bounded worker pool.
    /// Reports land in configured artifact order regardless of worker
    /// interleaving.
    fn audit_all(&self, extraction: &Extraction) -> Vec<ArtifactReport> {
        let artifacts = &self.config.artifacts;
        let jobs = self.config.jobs.clamp(1, artifacts.len());
        let chunk = artifacts.len().div_ceil(jobs);

        let mut slots: Vec<Option<ArtifactReport>> = Vec::with_capacity(artifacts.len());
        slots.resize_with(artifacts.len(), || None);

        std::thread::scope(|scope| {
            for (ids, out) in artifacts.chunks(chunk).zip(slots.chunks_mut(chunk)) {
                scope.spawn(move || {
                    for (id, slot) in ids.iter().zip(out.iter_mut()) {
                        *slot = Some(self.audit_one(id, extraction));
                    }
                });
            }
        });

        slots.into_iter().flatten().collect()
    }

    fn audit_one(&self, artifact: &str, extraction: &Extraction) -> ArtifactReport {
        let empty = ClaimSet::default();
        let claims = extraction.by_artifact.get(artifact).unwrap_or(&empty);

        let outcome = self.store.load(artifact);
        debug!(
            "auditing {}: {} claims, content {}",
            artifact,
            claims.len(),
            if outcome.is_loaded() { "loaded" } else { "unavailable" }
        );

        let results = self.verifier.verify(artifact, &outcome, claims);
        let gaps = gaps::classify(claims, &results);

        let content_hash = match &outcome {
            LoadOutcome::Loaded(data) => Some(artifact::content_hash(data)),
            _ => None,
        };

        ArtifactReport::build(
            artifact.to_string(),
            outcome.is_loaded(),
            content_hash,
            claims.len(),
            results,
            gaps,
        )
    }
}
