//! Output documents handed to callers.
//!
//! Items are free-form JSON objects: the reference metadata of a candidate
//! (or its name when it has none) plus coordinates and annotations. Keys are
//! camelCased and duplicate items are dropped.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::{CallType, CityRecord, ResultSet, SentQuery};

/// Resolution result in the shape exposed to callers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeOutput {
    pub items: Vec<Value>,

    pub total: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_type: Option<CallType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_addr: Option<SentQuery>,

    pub call_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformers: Option<String>,

    /// Upstream candidates without reference metadata or annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pelias_raw: Option<Value>,
}

impl GeocodeOutput {
    /// Convert a result set, optionally echoing the raw candidates.
    pub fn from_result(result: &ResultSet, with_raw: bool) -> Self {
        let items = dedup(result.candidates.iter().map(candidate_item).collect());

        let pelias_raw = with_raw.then(|| {
            let features: Vec<Value> = result.candidates.iter().filter_map(raw_feature).collect();
            serde_json::json!({ "features": features })
        });

        Self {
            total: items.len(),
            items,
            call_type: result.meta.call_type,
            in_addr: result.meta.sent_query.clone(),
            call_count: result.meta.call_count,
            transformers: result.meta.transformers.clone(),
            pelias_raw,
        }
    }

    /// Convert search index records.
    pub fn from_records(records: &[CityRecord]) -> Self {
        let items = dedup(
            records
                .iter()
                .map(|r| to_camel_case(Value::Object(r.to_item())))
                .collect(),
        );
        Self {
            total: items.len(),
            items,
            ..Self::default()
        }
    }

    /// Keep at most `size` items.
    pub fn truncate(&mut self, size: usize) {
        self.items.truncate(size);
        self.total = self.items.len();
    }
}

/// Upstream view of a candidate: no reference metadata, no annotations.
/// A candidate that cannot be serialized is logged and left out.
fn raw_feature(candidate: &crate::models::Candidate) -> Option<Value> {
    let mut raw = candidate.clone();
    if let Some(props) = raw.properties.as_mut() {
        props.addendum = None;
    }
    serde_json::to_value(&raw)
        .map_err(|e| warn!("Cannot serialize raw feature: {}", e))
        .ok()
}

fn candidate_item(candidate: &crate::models::Candidate) -> Value {
    let mut item = match candidate.best().map(serde_json::to_value) {
        Some(Ok(Value::Object(map))) => map,
        _ => {
            let mut map = Map::new();
            let name = candidate
                .properties
                .as_ref()
                .and_then(|p| p.name.clone())
                .map(Value::String)
                .unwrap_or(Value::Null);
            map.insert("name".to_string(), name);
            map
        }
    };

    let point = candidate.coordinates();
    item.insert(
        "coordinates".to_string(),
        serde_json::json!({"lat": point.lat, "lon": point.lon}),
    );
    if let Ok(Value::Object(annotations)) = serde_json::to_value(&candidate.annotations) {
        item.extend(annotations);
    }

    to_camel_case(Value::Object(item))
}

fn dedup(items: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// camelCase every object key, recursively. Values are left untouched.
pub fn to_camel_case(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (camel_key(&k), to_camel_case(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(to_camel_case).collect()),
        other => other,
    }
}

fn camel_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_lowercase() || next.is_ascii_digit() {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
