//! Runtime parameter values and their wire encoding.
//!
//! Values travel through URLs as text. Deserialization never fails: a value
//! that does not parse as its declared kind degrades to a documented fallback
//! (NaN, `true`, or the raw string) and the problem is reported as a
//! `tracing` event, so navigation is never aborted by a malformed parameter.
//!
//! Array values have two encodings. In a path segment the elements are joined
//! with `-` and string elements escape a literal `-` as `\-`; in a query
//! string each element is one repeated `key=value` pair, unescaped.

use navtree_config::ParamKind;
use std::collections::BTreeMap;

/// A deserialized route or query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Num(f64),
    Bool(bool),
    StrList(Vec<String>),
    NumList(Vec<f64>),
    BoolList(Vec<bool>),
    /// The `object` kind: an opaque JSON value.
    Json(serde_json::Value),
}

/// The parameter assignment of a route: name to deserialized value.
pub type Params = BTreeMap<String, ParamValue>;

impl ParamValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// ==== SERIALIZATION ====

/// Render a value as one path segment, before percent-encoding.
pub(crate) fn path_segment_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Str(s) => s.clone(),
        ParamValue::Num(n) => n.to_string(),
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::StrList(items) => {
            let escaped: Vec<String> = items.iter().map(|item| escape_dash(item)).collect();
            escaped.join("-")
        }
        ParamValue::NumList(items) => {
            let parts: Vec<String> = items.iter().map(f64::to_string).collect();
            parts.join("-")
        }
        ParamValue::BoolList(items) => {
            let parts: Vec<String> = items.iter().map(bool::to_string).collect();
            parts.join("-")
        }
        ParamValue::Json(json) => json.to_string(),
    }
}

/// Render a value as its query-string occurrences, one string per
/// `key=value` pair. Empty and null values yield no occurrence at all.
pub(crate) fn query_values(value: &ParamValue) -> Vec<String> {
    match value {
        ParamValue::Str(s) if s.is_empty() => Vec::new(),
        ParamValue::Str(s) => vec![s.clone()],
        ParamValue::Num(n) => vec![n.to_string()],
        ParamValue::Bool(b) => vec![b.to_string()],
        ParamValue::StrList(items) => items.clone(),
        ParamValue::NumList(items) => items.iter().map(f64::to_string).collect(),
        ParamValue::BoolList(items) => items.iter().map(bool::to_string).collect(),
        ParamValue::Json(serde_json::Value::Null) => Vec::new(),
        ParamValue::Json(json) => vec![json.to_string()],
    }
}

fn escape_dash(s: &str) -> String {
    s.replace('-', "\\-")
}

/// Split a path-encoded array on every `-` that is not preceded by `\`,
/// unescaping `\-` back to `-` in the process.
pub(crate) fn split_escaped_dash(s: &str) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'-') => {
                chars.next();
                if let Some(part) = parts.last_mut() {
                    part.push('-');
                }
            }
            '-' => parts.push(String::new()),
            _ => {
                if let Some(part) = parts.last_mut() {
                    part.push(c);
                }
            }
        }
    }
    parts
}

// ==== DESERIALIZATION ====

/// Deserialize one decoded path segment according to the declared kind.
pub(crate) fn decode_path_segment(
    name: &str,
    decoded: &str,
    kind: ParamKind,
    route: &str,
) -> ParamValue {
    if kind.is_array() {
        let elements = split_escaped_dash(decoded);
        decode_elements(name, &elements, kind, route)
    } else {
        decode_scalar(name, decoded, kind, route)
    }
}

/// Deserialize the query-string occurrences of one declared name. Scalar
/// kinds take the first occurrence, array kinds take all of them.
pub(crate) fn decode_occurrences(
    name: &str,
    values: &[String],
    kind: ParamKind,
    route: &str,
) -> ParamValue {
    if kind.is_array() {
        decode_elements(name, values, kind, route)
    } else {
        let first = values.first().map(String::as_str).unwrap_or_default();
        decode_scalar(name, first, kind, route)
    }
}

fn decode_elements(name: &str, elements: &[String], kind: ParamKind, route: &str) -> ParamValue {
    match kind {
        ParamKind::NumberArray => {
            ParamValue::NumList(elements.iter().map(|v| parse_number(name, v, route)).collect())
        }
        ParamKind::BooleanArray => ParamValue::BoolList(
            elements.iter().map(|v| parse_boolean(name, v, route)).collect(),
        ),
        _ => ParamValue::StrList(elements.to_vec()),
    }
}

fn decode_scalar(name: &str, raw: &str, kind: ParamKind, route: &str) -> ParamValue {
    match kind {
        ParamKind::Number => ParamValue::Num(parse_number(name, raw, route)),
        ParamKind::Boolean => ParamValue::Bool(parse_boolean(name, raw, route)),
        ParamKind::Object => parse_object(name, raw, route),
        _ => ParamValue::Str(raw.to_string()),
    }
}

fn parse_number(name: &str, raw: &str, route: &str) -> f64 {
    match raw.parse::<f64>() {
        Ok(n) => n,
        Err(_) => {
            tracing::error!(
                param = name,
                value = raw,
                route,
                "the value is not a valid number; interpreting it as NaN"
            );
            f64::NAN
        }
    }
}

fn parse_boolean(name: &str, raw: &str, route: &str) -> bool {
    match raw {
        "true" | "" => true,
        "false" => false,
        _ => {
            tracing::error!(
                param = name,
                value = raw,
                route,
                "the value is not a valid boolean; interpreting it as true"
            );
            true
        }
    }
}

fn parse_object(name: &str, raw: &str, route: &str) -> ParamValue {
    match serde_json::from_str(raw) {
        Ok(json) => ParamValue::Json(json),
        Err(_) => {
            tracing::error!(
                param = name,
                value = raw,
                route,
                "the value is not valid JSON; interpreting it as a raw string"
            );
            ParamValue::Str(raw.to_string())
        }
    }
}
