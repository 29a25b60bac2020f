// ABOUTME: Output contracts for agents - JSON extraction from model text and schema validation.
// ABOUTME: Supports a JSON-Schema subset: type, required, properties and items.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("Valid regex")
});

/// Where and why a value failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON path to the offending value, e.g. `$.items[2].title`.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Extract a JSON value from model output.
///
/// Returns the first of [`json_candidates`].
pub fn parse_json_output(text: &str) -> Result<Value, String> {
    if text.trim().is_empty() {
        return Err("output was empty".to_string());
    }
    json_candidates(text)
        .into_iter()
        .next()
        .ok_or_else(|| "output is not valid JSON".to_string())
}

/// Every JSON value the output could hold, most likely first.
///
/// The trimmed text, then the contents of the first Markdown code fence,
/// then each balanced `{...}` or `[...]` span in order of appearance.
pub fn json_candidates(text: &str) -> Vec<Value> {
    let trimmed = text.trim();
    let mut found = Vec::new();
    if trimmed.is_empty() {
        return found;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        found.push(value);
    }

    let unfenced = FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim());
    if let Some(inner) = unfenced {
        if let Ok(value) = serde_json::from_str(inner) {
            push_unique(&mut found, value);
        }
    }

    let haystack = unfenced.unwrap_or(trimmed);
    for (start, _) in haystack.match_indices(['{', '[']) {
        if let Some(span) = balanced_span(&haystack[start..]) {
            if let Ok(value) = serde_json::from_str(span) {
                push_unique(&mut found, value);
            }
        }
    }
    found
}

fn push_unique(found: &mut Vec<Value>, value: Value) {
    if !found.contains(&value) {
        found.push(value);
    }
}

/// The `{...}` or `[...]` span opening at the start of `text`, ignoring brackets in strings.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Validate `value` against `schema`.
///
/// Schemas that are not objects accept everything. Unknown type names are ignored.
pub fn validate(value: &Value, schema: &Value) -> Result<(), SchemaViolation> {
    validate_at(value, schema, "$")
}

fn validate_at(value: &Value, schema: &Value, path: &str) -> Result<(), SchemaViolation> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    if let Some(expected) = schema.get("type") {
        let names: Vec<&str> = match expected {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if !names.is_empty() && !names.iter().any(|name| matches_type(value, name)) {
            return Err(SchemaViolation {
                path: path.to_string(),
                message: format!("expected {}, got {}", names.join(" or "), type_name(value)),
            });
        }
    }

    if let Value::Object(fields) = value {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !fields.contains_key(name) {
                    return Err(SchemaViolation {
                        path: path.to_string(),
                        message: format!("missing required property '{}'", name),
                    });
                }
            }
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, property_schema) in properties {
                if let Some(field) = fields.get(name) {
                    validate_at(field, property_schema, &format!("{}.{}", path, name))?;
                }
            }
        }
    }

    if let (Value::Array(items), Some(item_schema)) = (value, schema.get("items")) {
        for (index, item) in items.iter().enumerate() {
            validate_at(item, item_schema, &format!("{}[{}]", path, index))?;
        }
    }

    Ok(())
}

fn matches_type(value: &Value, name: &str) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
