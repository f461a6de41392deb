//! Claim target resolution
//!
//! Maps a claim's textual target onto the known artifact set: direct
//! identifier/stem matching, wildcard phrases, and configured group
//! membership. Confidence-style claims carry no target and resolve by
//! token overlap with artifact stems instead; ties attach to every match
//! rather than silently dropping the claim.

use super::{Claim, ClaimCategory};
use crate::ArtifactGroup;

pub struct TargetResolver<'a> {
    artifacts: &'a [String],
    stems: Vec<String>,
    groups: &'a [ArtifactGroup],
}

impl<'a> TargetResolver<'a> {
    pub fn new(artifacts: &'a [String], groups: &'a [ArtifactGroup]) -> Self {
        let stems = artifacts.iter().map(|a| stem_of(a)).collect();
        Self {
            artifacts,
            stems,
            groups,
        }
    }

    /// Resolve a claim to the artifacts it applies to, in configured
    /// artifact order. Empty means the claim must be dropped.
    pub fn resolve(&self, claim: &Claim) -> Vec<String> {
        if !claim.category.has_explicit_target() {
            return self.resolve_by_overlap(&claim.text);
        }

        match &claim.target {
            Some(target) => self.resolve_target(target),
            // A session-wide behavioral pattern arrives without a target and
            // applies to the whole artifact set.
            None if claim.category == ClaimCategory::BehavioralPattern => {
                self.artifacts.to_vec()
            }
            None => Vec::new(),
        }
    }

    fn resolve_target(&self, target: &str) -> Vec<String> {
        let target = target.trim().to_lowercase();
        if target.is_empty() {
            return Vec::new();
        }

        if tg_patterns::is_wildcard_target(&target) {
            return self.artifacts.to_vec();
        }

        if let Some(members) = self.group_members(&target) {
            return members;
        }

        self.artifacts
            .iter()
            .zip(&self.stems)
            .filter(|(artifact, stem)| direct_match(&target, &artifact.to_lowercase(), stem))
            .map(|(artifact, _)| artifact.clone())
            .collect()
    }

    /// Group phrases come from configuration, not from a constant: "every
    /// artifact that calls the model service" resolves to the configured
    /// member list intersected with the known set.
    fn group_members(&self, target: &str) -> Option<Vec<String>> {
        for group in self.groups {
            let hit = group
                .phrases
                .iter()
                .any(|phrase| target.contains(&phrase.to_lowercase()));
            if hit {
                let members: Vec<String> = self
                    .artifacts
                    .iter()
                    .filter(|a| group.members.iter().any(|m| m == *a))
                    .cloned()
                    .collect();
                return Some(members);
            }
        }
        None
    }

    fn resolve_by_overlap(&self, text: &str) -> Vec<String> {
        let text_tokens = tokens_of(text);
        self.artifacts
            .iter()
            .zip(&self.stems)
            .filter(|(_, stem)| {
                let lower = text.to_lowercase();
                (stem.len() >= 3 && lower.contains(stem.as_str()))
                    || tokens_of(stem).iter().any(|t| text_tokens.contains(t))
            })
            .map(|(artifact, _)| artifact.clone())
            .collect()
    }
}

fn direct_match(target: &str, artifact: &str, stem: &str) -> bool {
    if target == artifact || target == stem {
        return true;
    }
    // Substring in either direction, with a length floor against noise.
    if target.len() >= 3 && artifact.contains(target) {
        return true;
    }
    if artifact.len() >= 3 && target.contains(artifact) {
        return true;
    }
    stem.len() >= 3 && target.contains(stem)
}

/// Base name with the extension stripped, lowercased.
fn stem_of(artifact: &str) -> String {
    let base = artifact
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(artifact);
    let stem = match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => base,
    };
    stem.to_lowercase()
}

/// Lowercased alphanumeric words of length >= 3.
fn tokens_of(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(category: ClaimCategory, text: &str, target: Option<&str>) -> Claim {
        Claim {
            source: "s".into(),
            category,
            text: text.into(),
            target: target.map(|t| t.into()),
            evidence: None,
            locator: None,
        }
    }

    fn artifacts() -> Vec<String> {
        vec![
            "src/worker.py".to_string(),
            "src/scheduler.py".to_string(),
            "tools/report.py".to_string(),
        ]
    }

    #[test]
    fn test_exact_and_stem_match() {
        let artifacts = artifacts();
        let resolver = TargetResolver::new(&artifacts, &[]);
        let c = claim(ClaimCategory::Resolution, "fixed", Some("worker.py"));
        assert_eq!(resolver.resolve(&c), vec!["src/worker.py"]);
        let c = claim(ClaimCategory::Resolution, "fixed", Some("the scheduler module"));
        assert_eq!(resolver.resolve(&c), vec!["src/scheduler.py"]);
    }

    #[test]
    fn test_wildcard_attaches_to_all() {
        let artifacts = artifacts();
        let resolver = TargetResolver::new(&artifacts, &[]);
        let c = claim(ClaimCategory::RuleEstablishment, "rule", Some("all files"));
        assert_eq!(resolver.resolve(&c).len(), 3);
    }

    #[test]
    fn test_group_membership() {
        let artifacts = artifacts();
        let groups = vec![ArtifactGroup {
            name: "model-service-callers".to_string(),
            phrases: vec!["model service".to_string()],
            members: vec!["src/worker.py".to_string(), "tools/report.py".to_string()],
        }];
        let resolver = TargetResolver::new(&artifacts, &groups);
        let c = claim(
            ClaimCategory::RuleEstablishment,
            "rule",
            Some("every artifact that calls the model service"),
        );
        assert_eq!(resolver.resolve(&c), vec!["src/worker.py", "tools/report.py"]);
    }

    #[test]
    fn test_unresolvable_target_is_empty() {
        let artifacts = artifacts();
        let resolver = TargetResolver::new(&artifacts, &[]);
        let c = claim(ClaimCategory::Resolution, "fixed", Some("nonexistent.rb"));
        assert!(resolver.resolve(&c).is_empty());
    }

    #[test]
    fn test_confidence_resolves_by_text_overlap() {
        let artifacts = artifacts();
        let resolver = TargetResolver::new(&artifacts, &[]);
        let c = claim(
            ClaimCategory::Confidence,
            "the worker now retries transient failures",
            None,
        );
        assert_eq!(resolver.resolve(&c), vec!["src/worker.py"]);
    }

    #[test]
    fn test_overlap_tie_attaches_to_all_matches() {
        let artifacts = artifacts();
        let resolver = TargetResolver::new(&artifacts, &[]);
        let c = claim(
            ClaimCategory::IdeaConfidence,
            "worker and scheduler agree on the queue format",
            None,
        );
        assert_eq!(
            resolver.resolve(&c),
            vec!["src/worker.py", "src/scheduler.py"]
        );
    }

    #[test]
    fn test_untargeted_pattern_is_session_wide() {
        let artifacts = artifacts();
        let resolver = TargetResolver::new(&artifacts, &[]);
        let c = claim(ClaimCategory::BehavioralPattern, "premature victory", None);
        assert_eq!(resolver.resolve(&c).len(), 3);
    }

    #[test]
    fn test_stem_of() {
        assert_eq!(stem_of("src/worker.py"), "worker");
        assert_eq!(stem_of("Worker.PY"), "worker");
        assert_eq!(stem_of("Makefile"), "makefile");
        assert_eq!(stem_of(".hidden"), ".hidden");
    }
}
