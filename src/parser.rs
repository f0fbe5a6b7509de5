/**
This module turns the free-form text returned by a model into an `EntityMap`.

Models often wrap their answer in a fenced code block or surround it with prose. The parser
strips the fences, finds the first brace-delimited object (one level of nested braces is
tolerated) and decodes it. Parsing never fails: anything it cannot make sense of yields an empty
map.
*/
use crate::entity::{EntityMap, EntityType, EntityValue};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

const FENCE: &str = "```";

/// Pattern of the first JSON object in a response, with at most one level of nested braces.
const JSON_OBJECT_PATTERN: &str = r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}";

fn json_object_regex() -> Result<&'static Regex, &'static regex::Error> {
    static JSON_OBJECT: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    JSON_OBJECT
        .get_or_init(|| Regex::new(JSON_OBJECT_PATTERN))
        .as_ref()
}

/// Removes an opening fence (with its language tag line) and everything from the last closing
/// fence onwards.
fn strip_code_fences(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if cleaned.starts_with(FENCE) {
        if let Some(first_newline) = cleaned.find('\n') {
            cleaned = &cleaned[first_newline + 1..];
        }
    }
    if let Some(last_fence) = cleaned.rfind(FENCE) {
        cleaned = &cleaned[..last_fence];
    }
    cleaned.trim()
}

/// Truthiness of a JSON value: null, false, zero, and empty strings, arrays and objects are
/// falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Coerces the value found under an entity key into a sequence. Arrays are kept element by
/// element; any other truthy value becomes a single string.
fn coerce_entities(value: Value) -> Vec<EntityValue> {
    match value {
        Value::Array(values) => values.into_iter().map(EntityValue::from).collect(),
        Value::String(s) if !s.is_empty() => vec![EntityValue::Plain(s)],
        other if is_truthy(&other) => vec![EntityValue::Plain(other.to_string())],
        _ => Vec::new(),
    }
}

/// Takes the value of the first key present in the object. A key that is present wins over the
/// following aliases, whatever its value.
fn take_first(object: &mut Map<String, Value>, keys: &[&str]) -> Value {
    keys.iter()
        .find_map(|key| object.remove(*key))
        .unwrap_or(Value::Null)
}

fn entity_keys(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Person => &["person"],
        EntityType::Organizations => &["organizations", "organization"],
        EntityType::Address => &["address", "addresses"],
    }
}

/// Parses a model response into an entity map. Malformed responses yield the empty map.
///
/// ```rust
/// use vner_eval::{parse_response, EntityType};
///
/// let raw = "```json\n{\"person\": [\"Đức Phúc\"], \"organization\": \"VTV\"}\n```";
/// let parsed = parse_response(raw);
/// assert_eq!(parsed.normalized(EntityType::Person), vec!["Đức Phúc"]);
/// assert_eq!(parsed.normalized(EntityType::Organizations), vec!["VTV"]);
/// assert!(parsed.address.is_empty());
///
/// assert!(parse_response("Sure, here are the entities: {bad json").is_empty());
/// ```
pub fn parse_response(raw: &str) -> EntityMap {
    let cleaned = strip_code_fences(raw);
    let regex = match json_object_regex() {
        Ok(regex) => regex,
        Err(e) => {
            debug!(error = %e, "invalid JSON object pattern");
            return EntityMap::default();
        }
    };
    let Some(found) = regex.find(cleaned) else {
        debug!("no JSON object found in model response");
        return EntityMap::default();
    };
    let mut object = match serde_json::from_str::<Value>(found.as_str()) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return EntityMap::default(),
        Err(e) => {
            debug!(error = %e, "could not decode model response");
            return EntityMap::default();
        }
    };
    let mut parsed = EntityMap::default();
    for entity_type in EntityType::all_types() {
        let value = take_first(&mut object, entity_keys(entity_type));
        *parsed.get_mut(entity_type) = coerce_entities(value);
    }
    parsed
}
