//! Signature database for source-artifact anti-pattern detection
//!
//! This crate provides the pattern vocabularies and compiled matchers used
//! by the trustgap verification checks: catch-all error handlers, hard-coded
//! truncation limits, routine definitions, response-structure access, and
//! the phrase lists used for claim target resolution and completion-claim
//! detection.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Pattern compilation error: {0}")]
    PatternCompilation(String),
}

pub type PatternResult<T> = Result<T, PatternError>;

/// Error-handler forms that swallow every failure type.
pub const CATCH_ALL_HANDLERS: &[&str] = &[
    "except:",
    "except Exception",
    "except BaseException",
    "catch (...)",
    "catch(...)",
    "catch (Exception",
    "catch(Exception",
    "catch {}",
];

/// Tokens marking a line as display-only output (console previews, log
/// formatting). Truncation limits on such lines are not defects.
pub const DISPLAY_CONTEXT_TOKENS: &[&str] = &[
    "print(",
    "println!",
    "eprintln!",
    "console.log",
    "logger.",
    "logging.",
    "log.debug",
    "log.info",
    "preview",
];

/// Phrases in a claim target meaning "applies to every artifact".
pub const WILDCARD_PHRASES: &[&str] = &[
    "all files",
    "all artifacts",
    "all modules",
    "every file",
    "every artifact",
    "every module",
    "entire codebase",
    "whole codebase",
    "everywhere",
];

/// Phrases that mark a claim as asserting unconditional completion.
pub const COMPLETION_PHRASES: &[&str] = &[
    "all done",
    "fully fixed",
    "fully resolved",
    "completely fixed",
    "completely resolved",
    "everything works",
    "everything is working",
    "all tests pass",
    "no remaining issues",
    "nothing left to do",
    "100%",
    "works perfectly",
];

/// Upstream pattern-registry names that mark a premature-victory claim.
pub const PREMATURE_VICTORY_MARKERS: &[&str] = &[
    "premature victory",
    "premature_victory",
    "premature-victory",
    "victory lap",
    "declared success",
];

/// Default backend policy: the single sanctioned model-service client and
/// the alternative client tokens that are disallowed in its place.
pub const SANCTIONED_BACKEND_DEFAULT: &str = "llm_gateway";
pub const FORBIDDEN_BACKEND_DEFAULTS: &[&str] = &[
    "openai.",
    "litellm.",
    "ollama.",
    "raw_completion(",
];

/// Claim-text vocabularies used to map a claim onto the check that covers
/// the same underlying fact.
pub const CATCH_ALL_CLAIM_HINTS: &[&str] = &["except", "catch-all", "catch all", "swallow"];
pub const TRUNCATION_CLAIM_HINTS: &[&str] = &["truncat", "hardcoded limit", "hard-coded limit", "slice limit"];
pub const DUPLICATE_CLAIM_HINTS: &[&str] = &["duplicate"];
pub const BACKEND_CLAIM_HINTS: &[&str] = &["backend", "sanctioned client", "alternative client"];
pub const RESPONSE_ACCESS_CLAIM_HINTS: &[&str] = &["unguarded", "keyerror", "missing key", "response access"];

/// Compiled matcher over the catch-all handler forms.
pub static CATCH_ALL_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostLongest)
        .build(CATCH_ALL_HANDLERS)
        .expect("failed to compile catch-all handler matcher")
});

/// Compiled matcher over display-context tokens.
pub static DISPLAY_CONTEXT_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(DISPLAY_CONTEXT_TOKENS)
        .expect("failed to compile display-context matcher")
});

/// Compiled matcher over completion phrases, case-insensitive.
pub static COMPLETION_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(COMPLETION_PHRASES)
        .expect("failed to compile completion-phrase matcher")
});

/// Hard-coded truncation forms: Python slices, Rust range slices, and
/// explicit truncate calls with a literal bound.
pub static TRUNCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*:\s*\d+\s*\]|\[\s*\.\.\s*\d+\s*\]|\.truncate\(\s*\d+")
        .expect("failed to compile truncation regex")
});

/// Routine definition line: captures the routine name.
pub static ROUTINE_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:pub\s+)?(?:async\s+)?(?:def|fn|function|func)\s+([A-Za-z_][A-Za-z0-9_]*)")
        .expect("failed to compile routine definition regex")
});

/// Subscript access into a response-like structure.
pub static RESPONSE_ACCESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:response|resp|reply|payload|completion)\b\s*\[")
        .expect("failed to compile response access regex")
});

/// Routine name referenced in claim text: backtick-quoted or `name()` form.
pub static ROUTINE_MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"`([A-Za-z_][A-Za-z0-9_]*)(?:\(\))?`|\b([A-Za-z_][A-Za-z0-9_]*)\(\)")
        .expect("failed to compile routine mention regex")
});

/// Build a definition matcher for one specific routine name.
pub fn routine_def_regex(routine: &str) -> PatternResult<Regex> {
    let pattern = format!(
        r"^\s*(?:pub\s+)?(?:async\s+)?(?:def|fn|function|func)\s+{}\s*\(",
        regex::escape(routine)
    );
    Regex::new(&pattern).map_err(|e| PatternError::PatternCompilation(e.to_string()))
}

/// True when the line is display-only output rather than data flow.
pub fn is_display_context(line: &str) -> bool {
    DISPLAY_CONTEXT_MATCHER.is_match(line)
}

/// True when the claim text asserts unconditional completion.
pub fn is_completion_claim(text: &str) -> bool {
    COMPLETION_MATCHER.is_match(text)
}

/// True when the claim text carries an upstream premature-victory marker.
pub fn has_premature_victory_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    PREMATURE_VICTORY_MARKERS.iter().any(|m| lower.contains(m))
}

/// True when the target phrase means "every artifact".
pub fn is_wildcard_target(target: &str) -> bool {
    let lower = target.to_lowercase();
    WILDCARD_PHRASES.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all_matching() {
        assert!(CATCH_ALL_MATCHER.is_match("    except Exception as e:"));
        assert!(CATCH_ALL_MATCHER.is_match("} catch (...) {"));
        assert!(!CATCH_ALL_MATCHER.is_match("except ValueError:"));
    }

    #[test]
    fn test_truncation_matching() {
        assert!(TRUNCATION_RE.is_match("items = results[:100]"));
        assert!(TRUNCATION_RE.is_match("let head = &buf[..512];"));
        assert!(TRUNCATION_RE.is_match("entries.truncate(50);"));
        assert!(!TRUNCATION_RE.is_match("items = results[start:end]"));
    }

    #[test]
    fn test_routine_definition_capture() {
        let caps = ROUTINE_DEF_RE.captures("def load_config(path):").unwrap();
        assert_eq!(&caps[1], "load_config");
        let caps = ROUTINE_DEF_RE.captures("pub fn verify_claim(c: &Claim) {").unwrap();
        assert_eq!(&caps[1], "verify_claim");
        assert!(ROUTINE_DEF_RE.captures("x = define(y)").is_none());
    }

    #[test]
    fn test_routine_mention_capture() {
        let caps = ROUTINE_MENTION_RE.captures("fixed `retry_request` to backoff").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "retry_request");
        let caps = ROUTINE_MENTION_RE.captures("resolved the bug in parse_header()").unwrap();
        assert_eq!(caps.get(2).unwrap().as_str(), "parse_header");
    }

    #[test]
    fn test_response_access_matching() {
        assert!(RESPONSE_ACCESS_RE.is_match(r#"value = response["choices"][0]"#));
        assert!(!RESPONSE_ACCESS_RE.is_match("value = response.get(\"choices\")"));
    }

    #[test]
    fn test_display_context() {
        assert!(is_display_context("print(items[:20])"));
        assert!(is_display_context("logger.info(head)"));
        assert!(!is_display_context("batch = items[:20]"));
    }

    #[test]
    fn test_completion_phrases() {
        assert!(is_completion_claim("Everything works, all tests pass."));
        assert!(!is_completion_claim("fixed one case, more to review"));
    }

    #[test]
    fn test_wildcard_target() {
        assert!(is_wildcard_target("applies to all files"));
        assert!(is_wildcard_target("Every artifact in the repo"));
        assert!(!is_wildcard_target("src/worker.py"));
    }

    #[test]
    fn test_routine_def_regex_builder() {
        let re = routine_def_regex("load_config").unwrap();
        assert!(re.is_match("def load_config(path):"));
        assert!(re.is_match("    fn load_config() {"));
        assert!(!re.is_match("def load_config_v2(path):"));
    }
}
