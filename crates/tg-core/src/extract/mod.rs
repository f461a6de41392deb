//! Claim extraction from upstream analysis documents
//!
//! Upstream producers emit arbitrarily-shaped records. Everything is
//! normalized into one canonical claim shape here, before any downstream
//! logic runs; resolution then maps each claim onto zero or more known
//! artifacts.

pub mod normalize;
pub mod resolve;

use crate::RunConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Claim category taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimCategory {
    Resolution,
    UnresolvedIssue,
    Confidence,
    BehavioralPattern,
    RuleEstablishment,
    IdeaConfidence,
}

impl ClaimCategory {
    pub const ALL: [ClaimCategory; 6] = [
        ClaimCategory::Resolution,
        ClaimCategory::UnresolvedIssue,
        ClaimCategory::Confidence,
        ClaimCategory::BehavioralPattern,
        ClaimCategory::RuleEstablishment,
        ClaimCategory::IdeaConfidence,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClaimCategory::Resolution => "resolution",
            ClaimCategory::UnresolvedIssue => "unresolved-issue",
            ClaimCategory::Confidence => "confidence",
            ClaimCategory::BehavioralPattern => "behavioral-pattern",
            ClaimCategory::RuleEstablishment => "rule-establishment",
            ClaimCategory::IdeaConfidence => "idea-confidence",
        }
    }

    /// Confidence-style claims carry no target field and resolve by text
    /// overlap instead.
    pub fn has_explicit_target(&self) -> bool {
        !matches!(self, ClaimCategory::Confidence | ClaimCategory::IdeaConfidence)
    }
}

impl std::fmt::Display for ClaimCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An assertion about one artifact, immutable once extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Which upstream producer generated it
    pub source: String,
    pub category: ClaimCategory,
    /// Literal assertion text
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Position reference in the producing session, for traceability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<usize>,
}

/// Ordered claims attached to one artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub claims: Vec<Claim>,
}

impl ClaimSet {
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn push(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    pub fn by_category(&self, category: ClaimCategory) -> impl Iterator<Item = &Claim> {
        self.claims.iter().filter(move |c| c.category == category)
    }

    /// Per-category claim counts, for diagnostics output
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for category in ClaimCategory::ALL {
            let n = self.by_category(category).count();
            if n > 0 {
                counts.insert(category.name(), n);
            }
        }
        counts
    }
}

/// One upstream claim document, unparsed
#[derive(Debug, Clone)]
pub struct ClaimSource {
    pub name: String,
    pub raw: String,
}

impl ClaimSource {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
        }
    }
}

/// Extraction output: every configured artifact keyed, empty sets included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub by_artifact: BTreeMap<String, ClaimSet>,
    /// Claims whose target resolved to no known artifact
    pub dropped_claims: usize,
    /// Sources skipped because they could not be parsed
    pub skipped_sources: usize,
}

impl Extraction {
    pub fn total_claims(&self) -> usize {
        self.by_artifact.values().map(ClaimSet::len).sum()
    }
}

/// Extract and resolve claims from all sources against the configured
/// artifact set. A malformed source is skipped and logged, never fatal.
pub fn extract_claims(sources: &[ClaimSource], config: &RunConfig) -> Extraction {
    let mut by_artifact: BTreeMap<String, ClaimSet> = config
        .artifacts
        .iter()
        .map(|a| (a.clone(), ClaimSet::default()))
        .collect();

    let resolver = resolve::TargetResolver::new(&config.artifacts, &config.groups);
    let mut dropped_claims = 0;
    let mut skipped_sources = 0;

    for source in sources {
        let doc: Value = match serde_json::from_str(&source.raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("skipping unparseable claim source {}: {}", source.name, e);
                skipped_sources += 1;
                continue;
            }
        };

        for claim in normalize::normalize_document(&source.name, &doc) {
            let targets = resolver.resolve(&claim);
            if targets.is_empty() {
                debug!(
                    "dropping {} claim with unresolvable target: {}",
                    claim.category, claim.text
                );
                dropped_claims += 1;
                continue;
            }
            for target in targets {
                if let Some(set) = by_artifact.get_mut(&target) {
                    set.push(claim.clone());
                }
            }
        }
    }

    Extraction {
        by_artifact,
        dropped_claims,
        skipped_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(artifacts: &[&str]) -> RunConfig {
        RunConfig::new(artifacts.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn test_every_artifact_keyed_even_without_claims() {
        let extraction = extract_claims(&[], &config(&["a.py", "b.py"]));
        assert_eq!(extraction.by_artifact.len(), 2);
        assert!(extraction.by_artifact["a.py"].is_empty());
        assert!(extraction.by_artifact["b.py"].is_empty());
    }

    #[test]
    fn test_malformed_source_skipped_not_fatal() {
        let sources = vec![
            ClaimSource::new("bad.json", "{not json"),
            ClaimSource::new(
                "good.json",
                r#"{"markers": [{"type": "resolution", "file": "a.py", "text": "fixed it"}]}"#,
            ),
        ];
        let extraction = extract_claims(&sources, &config(&["a.py"]));
        assert_eq!(extraction.skipped_sources, 1);
        assert_eq!(extraction.by_artifact["a.py"].len(), 1);
    }

    #[test]
    fn test_unresolvable_target_dropped_with_count() {
        let sources = vec![ClaimSource::new(
            "review.json",
            r#"{"markers": [{"type": "resolution", "file": "unknown.py", "text": "fixed it"}]}"#,
        )];
        let extraction = extract_claims(&sources, &config(&["a.py"]));
        assert_eq!(extraction.dropped_claims, 1);
        assert_eq!(extraction.total_claims(), 0);
    }

    #[test]
    fn test_claim_set_counts() {
        let mut set = ClaimSet::default();
        set.push(Claim {
            source: "s".into(),
            category: ClaimCategory::Resolution,
            text: "fixed".into(),
            target: None,
            evidence: None,
            locator: None,
        });
        let counts = set.counts();
        assert_eq!(counts.get("resolution"), Some(&1));
        assert_eq!(counts.get("confidence"), None);
    }
}
