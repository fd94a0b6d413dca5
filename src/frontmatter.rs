/// YAML frontmatter extraction for vault notes.
///
/// Scalar fields become document metadata; sequences of scalars are joined
/// with `", "`. Nested mappings are ignored.
use serde_yaml::Value;

use crate::document::{Metadata, MetadataValue};

/// Split `content` into `(frontmatter metadata, body)`.
///
/// Content without a leading `---` block is returned unchanged with empty
/// metadata. An unclosed block or invalid YAML is an error message.
pub fn parse(content: &str) -> Result<(Metadata, String), String> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 2 || lines[0].trim() != "---" {
        return Ok((Metadata::new(), content.to_string()));
    }

    let end_idx = lines[1..]
        .iter()
        .position(|l| l.trim() == "---")
        .map(|i| i + 1)
        .ok_or_else(|| "frontmatter not closed".to_string())?;

    let yaml = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..].join("\n");

    if yaml.trim().is_empty() {
        return Ok((Metadata::new(), body));
    }

    let value: Value =
        serde_yaml::from_str(&yaml).map_err(|e| format!("invalid frontmatter: {e}"))?;

    let mut metadata = Metadata::new();
    if let Value::Mapping(map) = value {
        for (key, value) in map {
            let Some(key) = key.as_str() else { continue };
            if let Some(v) = to_scalar(&value) {
                metadata.insert(key.to_string(), v);
            }
        }
    }

    Ok((metadata, body))
}

fn to_scalar(value: &Value) -> Option<MetadataValue> {
    match value {
        Value::Bool(b) => Some(MetadataValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(MetadataValue::Int)
            .or_else(|| n.as_f64().map(MetadataValue::Float)),
        Value::String(s) => Some(MetadataValue::Str(s.clone())),
        Value::Sequence(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(to_scalar)
                .map(|v| v.to_string())
                .collect();
            Some(MetadataValue::Str(parts.join(", ")))
        }
        Value::Tagged(tagged) => to_scalar(&tagged.value),
        Value::Null | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_frontmatter() {
        let (meta, body) = parse("# Hello\n\nWorld").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "# Hello\n\nWorld");
    }

    #[test]
    fn test_parse_with_frontmatter() {
        let content = "---\ndomain: backend\npriority: 2\ndraft: false\ntags: [auth, db]\n---\n# Doc\nbody";
        let (meta, body) = parse(content).unwrap();
        assert_eq!(meta["domain"], MetadataValue::from("backend"));
        assert_eq!(meta["priority"], MetadataValue::Int(2));
        assert_eq!(meta["draft"], MetadataValue::Bool(false));
        assert_eq!(meta["tags"], MetadataValue::from("auth, db"));
        assert_eq!(body, "# Doc\nbody");
    }

    #[test]
    fn test_nested_mapping_skipped() {
        let content = "---\nauthor:\n  name: x\ntitle: Notes\n---\ntext";
        let (meta, _) = parse(content).unwrap();
        assert!(!meta.contains_key("author"));
        assert_eq!(meta["title"], MetadataValue::from("Notes"));
    }

    #[test]
    fn test_unclosed_frontmatter() {
        assert!(parse("---\ndomain: x\nno end").is_err());
    }
}
