//! Parser for historical audit params snapshots.
//!
//! New entries are written as JSON, but older rows used a bare
//! `{key:value,key:value}` layout. Reading tools get one parser that tries
//! JSON first and falls back to the delimiter format. This is a
//! compatibility shim for stored data, not a forward format.

use std::collections::BTreeMap;

use serde_json::Value;

/// Which layout a snapshot was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamFormat {
    Json,
    KeyValue,
}

/// Key/value view over a params snapshot. Keys are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParams {
    pub format: ParamFormat,
    pub values: BTreeMap<String, String>,
}

pub fn parse(params: &str) -> ParsedParams {
    let trimmed = params.trim();
    if trimmed.is_empty() {
        return ParsedParams {
            format: ParamFormat::KeyValue,
            values: BTreeMap::new(),
        };
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        let values = map
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.to_ascii_lowercase(), stringify(value)))
            .collect();
        return ParsedParams {
            format: ParamFormat::Json,
            values,
        };
    }

    let inner = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed)
        .trim();

    let mut values = BTreeMap::new();
    for pair in inner.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        if let Some((key, value)) = pair.split_once(':') {
            values.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    ParsedParams {
        format: ParamFormat::KeyValue,
        values,
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
