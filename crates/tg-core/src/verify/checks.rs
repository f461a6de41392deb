//! Typed check registry and check implementations
//!
//! Every check is identified by a `CheckId` variant, giving a closed set
//! with a defined claim-category mapping instead of name-string dispatch.
//! Checks are pure functions of artifact content: two runs on unchanged
//! content produce byte-identical results.

use super::content::ArtifactContent;
use super::VerificationResult;
use crate::extract::{ClaimCategory, ClaimSet};
use crate::BackendPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tg_patterns as patterns;

/// Registered check identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    /// Synthetic load check; fails when the artifact cannot be located
    ArtifactPresent,
    /// Error handlers that swallow every failure type
    CatchAllHandler,
    /// Hard-coded truncation limits on otherwise-unbounded collections
    TruncationLimit,
    /// Multiple definitions of a routine that should be singular
    DuplicateRoutine,
    /// References to a processing backend other than the sanctioned one
    ForbiddenBackend,
    /// Subscript access into a response structure that may be absent
    UnguardedResponseAccess,
    /// Claim-bound: does the named routine exist in the artifact
    RoutineExists { routine: String },
}

impl CheckId {
    pub fn name(&self) -> &'static str {
        match self {
            CheckId::ArtifactPresent => "artifact_present",
            CheckId::CatchAllHandler => "catch_all_handler",
            CheckId::TruncationLimit => "truncation_limit",
            CheckId::DuplicateRoutine => "duplicate_routine",
            CheckId::ForbiddenBackend => "forbidden_backend",
            CheckId::UnguardedResponseAccess => "unguarded_response_access",
            CheckId::RoutineExists { .. } => "routine_exists",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CheckId::ArtifactPresent => "artifact can be located and read",
            CheckId::CatchAllHandler => "no error handler swallows every failure type",
            CheckId::TruncationLimit => {
                "no hard-coded truncation limit outside display-only output"
            }
            CheckId::DuplicateRoutine => "no routine is defined more than once",
            CheckId::ForbiddenBackend => "only the sanctioned processing backend is referenced",
            CheckId::UnguardedResponseAccess => {
                "no unguarded subscript access into a response structure"
            }
            CheckId::RoutineExists { .. } => "a routine named by a resolution claim exists",
        }
    }

    /// Universal checks run against every artifact regardless of claims.
    pub fn applies_universally(&self) -> bool {
        !matches!(self, CheckId::RoutineExists { .. })
    }

    /// A verified anti-pattern scan can regress silently: nothing guards
    /// against the pattern being reintroduced.
    pub fn regression_prone(&self) -> bool {
        matches!(
            self,
            CheckId::CatchAllHandler
                | CheckId::TruncationLimit
                | CheckId::DuplicateRoutine
                | CheckId::ForbiddenBackend
                | CheckId::UnguardedResponseAccess
        )
    }

    /// Claim-text vocabulary that maps a claim onto this check.
    pub fn claim_hints(&self) -> &'static [&'static str] {
        match self {
            CheckId::CatchAllHandler => patterns::CATCH_ALL_CLAIM_HINTS,
            CheckId::TruncationLimit => patterns::TRUNCATION_CLAIM_HINTS,
            CheckId::DuplicateRoutine => patterns::DUPLICATE_CLAIM_HINTS,
            CheckId::ForbiddenBackend => patterns::BACKEND_CLAIM_HINTS,
            CheckId::UnguardedResponseAccess => patterns::RESPONSE_ACCESS_CLAIM_HINTS,
            CheckId::ArtifactPresent | CheckId::RoutineExists { .. } => &[],
        }
    }
}

impl std::fmt::Display for CheckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckId::RoutineExists { routine } => write!(f, "routine_exists({})", routine),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// The universal content scans, in registry order.
pub fn universal_checks() -> Vec<CheckId> {
    vec![
        CheckId::CatchAllHandler,
        CheckId::TruncationLimit,
        CheckId::DuplicateRoutine,
        CheckId::ForbiddenBackend,
        CheckId::UnguardedResponseAccess,
    ]
}

/// Checks triggered by the artifact's claims: one existence check per
/// routine named by a resolution claim, deduplicated and sorted.
pub fn claim_bound_checks(claims: &ClaimSet) -> Vec<CheckId> {
    let mut routines: Vec<String> = claims
        .by_category(ClaimCategory::Resolution)
        .filter_map(|c| routine_in_claim(&c.text))
        .collect();
    routines.sort();
    routines.dedup();
    routines
        .into_iter()
        .map(|routine| CheckId::RoutineExists { routine })
        .collect()
}

/// The full registry for one artifact: universal scans then claim-bound
/// checks, in deterministic order.
pub fn registry_for(claims: &ClaimSet) -> Vec<CheckId> {
    let mut registry = universal_checks();
    registry.extend(claim_bound_checks(claims));
    registry
}

/// Routine name referenced in claim text, backtick-quoted or `name()` form.
pub fn routine_in_claim(text: &str) -> Option<String> {
    patterns::ROUTINE_MENTION_RE
        .captures(text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
}

/// Run one check against parsed content.
pub fn run(check: &CheckId, content: &ArtifactContent, policy: &BackendPolicy) -> VerificationResult {
    match check {
        CheckId::ArtifactPresent => VerificationResult::verified(
            check.clone(),
            "artifact located and readable".to_string(),
        ),
        CheckId::CatchAllHandler => check_catch_all(content),
        CheckId::TruncationLimit => check_truncation(content),
        CheckId::DuplicateRoutine => check_duplicate_routine(content),
        CheckId::ForbiddenBackend => check_forbidden_backend(content, policy),
        CheckId::UnguardedResponseAccess => check_response_access(content),
        CheckId::RoutineExists { routine } => check_routine_exists(routine, content),
    }
}

fn cite(hits: &[(usize, String)]) -> String {
    hits.iter()
        .map(|(number, text)| format!("line {}: `{}`", number, text))
        .collect::<Vec<_>>()
        .join("; ")
}

fn check_catch_all(content: &ArtifactContent) -> VerificationResult {
    let hits: Vec<(usize, String)> = content
        .code_lines()
        .filter(|l| patterns::CATCH_ALL_MATCHER.is_match(&l.text))
        .map(|l| (l.number, l.text.trim().to_string()))
        .collect();

    if hits.is_empty() {
        VerificationResult::verified(
            CheckId::CatchAllHandler,
            format!(
                "no catch-all error handlers in {} code lines",
                content.code_line_count()
            ),
        )
    } else {
        VerificationResult::failed(
            CheckId::CatchAllHandler,
            format!("catch-all error handler at {}", cite(&hits)),
        )
        .with_count(hits.len())
    }
}

fn check_truncation(content: &ArtifactContent) -> VerificationResult {
    let hits: Vec<(usize, String)> = content
        .code_lines()
        .filter(|l| !patterns::is_display_context(&l.text))
        .filter_map(|l| {
            patterns::TRUNCATION_RE
                .find(&l.text)
                .map(|m| (l.number, m.as_str().to_string()))
        })
        .collect();

    if hits.is_empty() {
        VerificationResult::verified(
            CheckId::TruncationLimit,
            format!(
                "no hard-coded truncation limits in {} code lines (display-only output excluded)",
                content.code_line_count()
            ),
        )
    } else {
        VerificationResult::failed(
            CheckId::TruncationLimit,
            format!("hard-coded truncation limit at {}", cite(&hits)),
        )
        .with_count(hits.len())
    }
}

fn check_duplicate_routine(content: &ArtifactContent) -> VerificationResult {
    let mut definitions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for line in content.code_lines() {
        if let Some(caps) = patterns::ROUTINE_DEF_RE.captures(&line.text) {
            definitions
                .entry(caps[1].to_string())
                .or_default()
                .push(line.number);
        }
    }

    let duplicates: Vec<(String, Vec<usize>)> = definitions
        .into_iter()
        .filter(|(_, lines)| lines.len() > 1)
        .collect();

    if duplicates.is_empty() {
        VerificationResult::verified(
            CheckId::DuplicateRoutine,
            "no duplicate routine definitions".to_string(),
        )
    } else {
        let cites: Vec<String> = duplicates
            .iter()
            .map(|(name, lines)| {
                let numbers: Vec<String> = lines.iter().map(|n| n.to_string()).collect();
                format!("`{}` defined {} times (lines {})", name, lines.len(), numbers.join(", "))
            })
            .collect();
        let count = duplicates.len();
        VerificationResult::failed(
            CheckId::DuplicateRoutine,
            format!("duplicate routine definitions: {}", cites.join("; ")),
        )
        .with_count(count)
    }
}

fn check_forbidden_backend(content: &ArtifactContent, policy: &BackendPolicy) -> VerificationResult {
    if policy.forbidden.is_empty() {
        return VerificationResult::verified(
            CheckId::ForbiddenBackend,
            "no alternative backends are disallowed by policy".to_string(),
        );
    }

    let mut hits: Vec<(usize, String)> = Vec::new();
    for line in content.code_lines() {
        for token in &policy.forbidden {
            if line.text.contains(token.as_str()) {
                hits.push((line.number, token.clone()));
            }
        }
    }

    if hits.is_empty() {
        VerificationResult::verified(
            CheckId::ForbiddenBackend,
            format!(
                "no references to backends other than the sanctioned `{}`",
                policy.sanctioned
            ),
        )
    } else {
        VerificationResult::failed(
            CheckId::ForbiddenBackend,
            format!(
                "disallowed backend reference (sanctioned backend is `{}`) at {}",
                policy.sanctioned,
                cite(&hits)
            ),
        )
        .with_count(hits.len())
    }
}

fn check_response_access(content: &ArtifactContent) -> VerificationResult {
    let hits: Vec<(usize, String)> = content
        .code_lines()
        .filter(|l| !l.text.contains(".get("))
        .filter_map(|l| {
            patterns::RESPONSE_ACCESS_RE
                .find(&l.text)
                .map(|_| (l.number, l.text.trim().to_string()))
        })
        .collect();

    if hits.is_empty() {
        VerificationResult::verified(
            CheckId::UnguardedResponseAccess,
            "no unguarded subscripts into response structures".to_string(),
        )
    } else {
        VerificationResult::failed(
            CheckId::UnguardedResponseAccess,
            format!("unguarded response access at {}", cite(&hits)),
        )
        .with_count(hits.len())
    }
}

fn check_routine_exists(routine: &str, content: &ArtifactContent) -> VerificationResult {
    let check = CheckId::RoutineExists {
        routine: routine.to_string(),
    };

    let re = match patterns::routine_def_regex(routine) {
        Ok(re) => re,
        Err(e) => return VerificationResult::unverifiable(check, e.to_string()),
    };

    match content.code_lines().find(|l| re.is_match(&l.text)) {
        Some(line) => VerificationResult::verified(
            check,
            format!("routine `{}` defined at line {}", routine, line.number),
        ),
        None => VerificationResult::failed(
            check,
            format!(
                "no definition of routine `{}` in {} code lines",
                routine,
                content.code_line_count()
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Claim;

    fn content(text: &str) -> ArtifactContent {
        ArtifactContent::from_text(text)
    }

    fn policy() -> BackendPolicy {
        BackendPolicy::default()
    }

    #[test]
    fn test_catch_all_failure_cites_line() {
        let c = content("def f():\n    try:\n        g()\n    except:\n        pass\n");
        let result = check_catch_all(&c);
        assert!(result.status.is_failed());
        assert!(result.evidence.contains("line 4"));
        assert_eq!(result.count, Some(1));
    }

    #[test]
    fn test_catch_all_ignores_comments_and_dead_code() {
        let c = content("# except: is documented here\nif False:\n    except_block()\nx = 1\n");
        assert!(check_catch_all(&c).status.is_verified());
    }

    #[test]
    fn test_truncation_skips_display_lines() {
        let c = content("print(items[:20])\nbatch = items[:20]\n");
        let result = check_truncation(&c);
        assert!(result.status.is_failed());
        assert!(result.evidence.contains("line 2"));
        assert_eq!(result.count, Some(1));
    }

    #[test]
    fn test_duplicate_routine_detection() {
        let c = content("def f():\n    pass\n\ndef g():\n    pass\n\ndef f():\n    pass\n");
        let result = check_duplicate_routine(&c);
        assert!(result.status.is_failed());
        assert!(result.evidence.contains("`f`"));
        assert!(result.evidence.contains("lines 1, 7"));
    }

    #[test]
    fn test_forbidden_backend_uses_policy() {
        let c = content("client = openai.Client()\n");
        let result = check_forbidden_backend(&c, &policy());
        assert!(result.status.is_failed());
        assert!(result.evidence.contains("openai."));

        let custom = BackendPolicy {
            sanctioned: "gateway".to_string(),
            forbidden: vec![],
        };
        assert!(check_forbidden_backend(&c, &custom).status.is_verified());
    }

    #[test]
    fn test_response_access_guarded_by_get() {
        let failing = content(r#"value = response["choices"][0]"#);
        assert!(check_response_access(&failing).status.is_failed());

        let guarded = content(r#"value = response.get("choices")"#);
        assert!(check_response_access(&guarded).status.is_verified());
    }

    #[test]
    fn test_routine_exists_both_ways() {
        let c = content("def load_config(path):\n    return path\n");
        assert!(check_routine_exists("load_config", &c).status.is_verified());
        let missing = check_routine_exists("save_config", &c);
        assert!(missing.status.is_failed());
        assert!(missing.evidence.contains("save_config"));
    }

    #[test]
    fn test_claim_bound_registry_is_deduplicated_and_sorted() {
        let mut claims = ClaimSet::default();
        for text in ["fixed `zeta`", "repaired `alpha`", "fixed `zeta` again"] {
            claims.push(Claim {
                source: "s".into(),
                category: ClaimCategory::Resolution,
                text: text.into(),
                target: None,
                evidence: None,
                locator: None,
            });
        }
        let checks = claim_bound_checks(&claims);
        assert_eq!(
            checks,
            vec![
                CheckId::RoutineExists { routine: "alpha".into() },
                CheckId::RoutineExists { routine: "zeta".into() },
            ]
        );
    }

    #[test]
    fn test_registry_order_is_fixed() {
        let registry = registry_for(&ClaimSet::default());
        assert_eq!(registry, universal_checks());
        assert!(registry.iter().all(|c| c.applies_universally()));
    }
}
