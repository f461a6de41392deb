//! Tagged-variant normalization of producer record shapes
//!
//! Producers disagree on field names and value shapes: the same logical
//! field arrives as a string, an object, or a list depending on who wrote
//! the record. Every access here goes through defensive helpers with
//! explicit fallbacks; unknown shapes degrade to zero claims.

use super::{Claim, ClaimCategory};
use serde_json::{Map, Value};

/// Keys under which producers nest their record arrays.
const RECORD_CONTAINERS: &[&str] = &["markers", "annotations", "observations", "nodes", "claims"];

const CATEGORY_KEYS: &[&str] = &["category", "type", "tag", "kind"];
const TEXT_KEYS: &[&str] = &["text", "claim", "statement", "note", "message", "label"];
const TARGET_KEYS: &[&str] = &["target", "file", "path", "artifact", "subject"];
const EVIDENCE_KEYS: &[&str] = &["evidence", "quote", "support"];
const LOCATOR_KEYS: &[&str] = &["locator", "index", "message_index", "event_index", "position"];

/// Normalize one upstream document into canonical claims.
pub fn normalize_document(source: &str, doc: &Value) -> Vec<Claim> {
    let mut claims = Vec::new();

    match doc {
        Value::Array(records) => {
            for record in records {
                claims.extend(normalize_record(source, record));
            }
        }
        Value::Object(map) => {
            for key in RECORD_CONTAINERS {
                if let Some(Value::Array(records)) = map.get(*key) {
                    for record in records {
                        claims.extend(normalize_record(source, record));
                    }
                }
            }
            // Pattern registries: a named behavioral pattern with a list of
            // observed instances.
            if let Some(Value::Array(patterns)) = map.get("patterns") {
                for pattern in patterns {
                    claims.extend(normalize_pattern_entry(source, pattern));
                }
            }
        }
        _ => {}
    }

    claims
}

fn normalize_record(source: &str, record: &Value) -> Vec<Claim> {
    let map = match record.as_object() {
        Some(m) => m,
        None => return Vec::new(),
    };

    let category = match category_of(map) {
        Some(c) => c,
        None => return Vec::new(),
    };

    let text = match string_field(map, TEXT_KEYS) {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Vec::new(),
    };

    let evidence = string_field(map, EVIDENCE_KEYS);
    let locator = index_field(map, LOCATOR_KEYS);
    let targets = strings_field(map, TARGET_KEYS);

    if targets.is_empty() {
        return vec![Claim {
            source: source.to_string(),
            category,
            text,
            target: None,
            evidence,
            locator,
        }];
    }

    // A list-valued target yields one claim per entry.
    targets
        .into_iter()
        .map(|target| Claim {
            source: source.to_string(),
            category,
            text: text.clone(),
            target: Some(target),
            evidence: evidence.clone(),
            locator,
        })
        .collect()
}

fn normalize_pattern_entry(source: &str, entry: &Value) -> Vec<Claim> {
    let map = match entry.as_object() {
        Some(m) => m,
        None => return Vec::new(),
    };

    let name = match string_field(map, &["name", "pattern", "id"]) {
        Some(n) if !n.trim().is_empty() => n,
        _ => return Vec::new(),
    };

    let instances = match map.get("instances").or_else(|| map.get("occurrences")) {
        Some(Value::Array(list)) => list.clone(),
        // A registry entry without an instance list is itself one instance.
        _ => vec![Value::Object(map.clone())],
    };

    let mut claims = Vec::new();
    for instance in &instances {
        let (detail, target, evidence, locator) = match instance.as_object() {
            Some(inst) => (
                string_field(inst, &["text", "detail", "note", "message"]),
                string_field(inst, TARGET_KEYS),
                string_field(inst, EVIDENCE_KEYS),
                index_field(inst, LOCATOR_KEYS),
            ),
            None => (value_as_string(instance), None, None, None),
        };

        let text = match detail {
            Some(d) if !d.trim().is_empty() && d != name => format!("{}: {}", name, d),
            _ => name.clone(),
        };

        claims.push(Claim {
            source: source.to_string(),
            category: ClaimCategory::BehavioralPattern,
            text,
            target,
            evidence,
            locator,
        });
    }

    claims
}

fn category_of(map: &Map<String, Value>) -> Option<ClaimCategory> {
    if let Some(label) = string_field(map, CATEGORY_KEYS) {
        let label = label.to_lowercase();
        // "unresolved" contains "resol"; order matters.
        return if label.contains("idea") {
            Some(ClaimCategory::IdeaConfidence)
        } else if label.contains("confidence") {
            Some(ClaimCategory::Confidence)
        } else if label.contains("unresolved") || label.contains("issue") || label.contains("open")
        {
            Some(ClaimCategory::UnresolvedIssue)
        } else if label.contains("resol") || label.contains("fix") {
            Some(ClaimCategory::Resolution)
        } else if label.contains("pattern") || label.contains("behavio") {
            Some(ClaimCategory::BehavioralPattern)
        } else if label.contains("rule") || label.contains("convention") {
            Some(ClaimCategory::RuleEstablishment)
        } else {
            None
        };
    }

    // Confidence-labeled graph nodes carry a numeric confidence field
    // instead of a category tag.
    if map.get("confidence").is_some_and(Value::is_number) {
        return Some(ClaimCategory::Confidence);
    }

    None
}

/// First present key wins.
fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(map, keys).and_then(value_as_string)
}

/// Coerce a value to a string across the shapes producers use: a plain
/// string, an object with a nested name/text field, or a list whose first
/// usable entry stands for the whole.
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => field(map, &["name", "file", "path", "text", "value"])
            .and_then(value_as_string),
        Value::Array(list) => list.iter().find_map(value_as_string),
        _ => None,
    }
}

/// All string coercions of a possibly list-valued field.
fn strings_field(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    match field(map, keys) {
        Some(Value::Array(list)) => list.iter().filter_map(value_as_string).collect(),
        Some(value) => value_as_string(value).into_iter().collect(),
        None => Vec::new(),
    }
}

fn index_field(map: &Map<String, Value>, keys: &[&str]) -> Option<usize> {
    match field(map, keys)? {
        Value::Number(n) => n.as_u64().map(|v| v as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_marker_record() {
        let doc = json!({"markers": [
            {"type": "resolution", "file": "a.py", "text": "fixed `run`", "index": 4}
        ]});
        let claims = normalize_document("review.json", &doc);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].category, ClaimCategory::Resolution);
        assert_eq!(claims[0].target.as_deref(), Some("a.py"));
        assert_eq!(claims[0].locator, Some(4));
        assert_eq!(claims[0].source, "review.json");
    }

    #[test]
    fn test_observation_with_object_target() {
        let doc = json!({"observations": [
            {"tag": "open-issue", "note": "retry loop still missing", "subject": {"file": "b.py"}}
        ]});
        let claims = normalize_document("s", &doc);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].category, ClaimCategory::UnresolvedIssue);
        assert_eq!(claims[0].target.as_deref(), Some("b.py"));
    }

    #[test]
    fn test_list_target_fans_out() {
        let doc = json!({"markers": [
            {"type": "rule", "text": "always use the gateway", "file": ["a.py", "b.py"]}
        ]});
        let claims = normalize_document("s", &doc);
        assert_eq!(claims.len(), 2);
        assert!(claims.iter().all(|c| c.category == ClaimCategory::RuleEstablishment));
    }

    #[test]
    fn test_confidence_graph_node_without_tag() {
        let doc = json!({"nodes": [
            {"label": "worker handles retries correctly", "confidence": 0.85}
        ]});
        let claims = normalize_document("s", &doc);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].category, ClaimCategory::Confidence);
        assert!(claims[0].target.is_none());
    }

    #[test]
    fn test_pattern_registry_instances() {
        let doc = json!({"patterns": [
            {"name": "premature victory", "instances": [
                {"detail": "declared everything works", "index": 9},
                "second sighting"
            ]}
        ]});
        let claims = normalize_document("s", &doc);
        assert_eq!(claims.len(), 2);
        assert!(claims.iter().all(|c| c.category == ClaimCategory::BehavioralPattern));
        assert!(claims[0].text.starts_with("premature victory"));
        assert_eq!(claims[0].locator, Some(9));
    }

    #[test]
    fn test_unknown_shapes_degrade_to_nothing() {
        assert!(normalize_document("s", &json!(42)).is_empty());
        assert!(normalize_document("s", &json!({"widgets": [{"x": 1}]})).is_empty());
        assert!(normalize_document("s", &json!({"markers": [{"type": "mystery", "text": "?"}]}))
            .is_empty());
        assert!(normalize_document("s", &json!({"markers": [{"type": "resolution"}]})).is_empty());
    }
}
