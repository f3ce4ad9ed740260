//! Untrusted graph documents → trusted [`Graph`]
//!
//! Ingestion runs in two stages. [`RawGraph::from_value`] checks only the
//! top-level shape and keeps every entry as a loose `serde_json::Value`;
//! [`normalize_graph`] then coerces each entry into the strict model,
//! renaming colliding ids and silently dropping links that would dangle,
//! loop, or duplicate an existing pair.

use std::collections::HashSet;

use serde_json::Value;

use crate::graph::{DEFAULT_EDGE_WEIGHT, Graph, NodeSpec};
use crate::io::{IngestError, IngestResult};

/// Loosely typed graph document with the required top-level shape
#[derive(Debug, Clone, Default)]
pub struct RawGraph {
    pub nodes: Vec<Value>,
    pub links: Vec<Value>,
}

impl RawGraph {
    /// Check the top-level shape of a parsed document
    pub fn from_value(value: Value) -> IngestResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(shape_error());
        };
        match (map.remove("nodes"), map.remove("links")) {
            (Some(Value::Array(nodes)), Some(Value::Array(links))) => {
                Ok(Self { nodes, links })
            }
            _ => Err(shape_error()),
        }
    }
}

fn shape_error() -> IngestError {
    IngestError::Validation(r#"graph JSON must include "nodes" and "links" arrays"#.to_string())
}

/// Convert a raw document into a graph that upholds every model invariant
///
/// Every kept link gets `rest_length`; ingested documents carry no positions
/// to measure from.
pub fn normalize_graph(raw: RawGraph, rest_length: f64) -> IngestResult<Graph> {
    let mut graph = Graph::new();
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.nodes.len());

    for (index, entry) in raw.nodes.iter().enumerate() {
        let id = unique_id(base_id(entry, index), &taken);
        taken.insert(id.clone());

        let (label, group) = match entry {
            Value::Object(fields) => (
                fields.get("label").filter(|v| is_truthy(v)).map(stringify),
                fields.get("group").map(coerce_group).unwrap_or(0),
            ),
            _ => (None, 0),
        };

        let mut spec = NodeSpec::new(id).with_group(group);
        spec.label = label;
        graph
            .add_node(spec)
            .map_err(|e| IngestError::Validation(e.to_string()))?;
    }

    let mut dropped = 0usize;
    for link in &raw.links {
        if !is_truthy(link) {
            continue;
        }
        let endpoints = (
            link.get("source").and_then(endpoint_id),
            link.get("target").and_then(endpoint_id),
        );
        let (Some(source), Some(target)) = endpoints else {
            dropped += 1;
            continue;
        };
        let weight = link
            .get("weight")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_EDGE_WEIGHT);

        // Unknown ids and self-loops are errors from the arena; duplicates are Ok(false).
        match graph.connect_ids(&source, &target, rest_length, weight) {
            Ok(true) => {}
            Ok(false) | Err(_) => dropped += 1,
        }
    }

    tracing::debug!(
        nodes = graph.len(),
        links = graph.edge_count(),
        dropped,
        "normalized graph document"
    );
    Ok(graph)
}

/// The id a node entry asks for, before collision handling
fn base_id(entry: &Value, index: usize) -> String {
    let candidate = match entry {
        Value::Object(fields) => fields.get("id").filter(|v| is_truthy(v)).map(stringify),
        other => Some(stringify(other)).filter(|s| !s.is_empty()),
    };
    candidate.unwrap_or_else(|| format!("node-{index}"))
}

fn unique_id(base: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut suffix = 1u64;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Link endpoints are either bare ids or embedded node objects
fn endpoint_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Object(fields) => fields.get("id").filter(|v| !v.is_null()).map(stringify),
        other => Some(stringify(other)),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(n),
        other => other.to_string(),
    }
}

/// Integral numbers print without a fractional part (`3.0` → `"3"`)
fn format_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn coerce_group(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_leading_int(s).unwrap_or(0),
        _ => 0,
    }
}

/// Parse the leading integer of a string (`" 12px"` → 12), like a lenient `parseInt`
fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
