//! Local structural checks and the validation-summary shape exchanged with
//! the control plane.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ir::GraphSpec;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphValidationError {
    #[error("duplicate node_id: {0}")]
    DuplicateNode(String),
    #[error("edge {side} node not found: {id}")]
    DanglingEdge { side: &'static str, id: String },
    #[error("graph contains a cycle (strict DAG mode): {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// Strict DAG check: unique ids, resolvable endpoints, no cycles.
pub fn validate_graph(spec: &GraphSpec) -> Result<(), GraphValidationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &spec.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(GraphValidationError::DuplicateNode(node.id.clone()));
        }
    }

    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for edge in &spec.edges {
        if !seen.contains(edge.src.as_str()) {
            return Err(GraphValidationError::DanglingEdge {
                side: "src",
                id: edge.src.clone(),
            });
        }
        if !seen.contains(edge.dst.as_str()) {
            return Err(GraphValidationError::DanglingEdge {
                side: "dst",
                id: edge.dst.clone(),
            });
        }
        children.entry(edge.src.as_str()).or_default().push(edge.dst.as_str());
    }

    match find_cycle(spec, &children) {
        Some(cycle) => Err(GraphValidationError::Cycle(cycle)),
        None => Ok(()),
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Temp,
    Perm,
}

fn find_cycle(spec: &GraphSpec, children: &BTreeMap<&str, Vec<&str>>) -> Option<Vec<String>> {
    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    // (node, index of the next child to visit)
    let mut stack: Vec<(&str, usize)> = Vec::new();
    for node in &spec.nodes {
        let root = node.id.as_str();
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::Temp);
        stack.clear();
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (v, next) = *frame;
            let kids = children.get(v).map(Vec::as_slice).unwrap_or(&[][..]);
            let Some(&k) = kids.get(next) else {
                marks.insert(v, Mark::Perm);
                stack.pop();
                continue;
            };
            frame.1 += 1;
            match marks.get(k) {
                Some(Mark::Perm) => {}
                Some(Mark::Temp) => {
                    // k is on the current path: report the loop starting at k.
                    let start = stack.iter().position(|(id, _)| *id == k).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|(id, _)| id.to_string()).collect();
                    cycle.push(k.to_string());
                    return Some(cycle);
                }
                None => {
                    marks.insert(k, Mark::Temp);
                    stack.push((k, 0));
                }
            }
        }
    }
    None
}

/// The `{ok, node_count, edge_count, error}` shape used on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub ok: bool,
    #[serde(default)]
    pub node_count: usize,
    #[serde(default)]
    pub edge_count: usize,
    #[serde(default)]
    pub error: String,
}

pub fn summarize(spec: &GraphSpec) -> ValidationSummary {
    match validate_graph(spec) {
        Ok(()) => ValidationSummary {
            ok: true,
            node_count: spec.nodes.len(),
            edge_count: spec.edges.len(),
            error: String::new(),
        },
        Err(err) => ValidationSummary {
            ok: false,
            node_count: 0,
            edge_count: 0,
            error: err.to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Ok,
    Error,
}

/// What the editor shows after a validate round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorValidationSummary {
    pub status: ValidationStatus,
    pub node_count: u64,
    pub edge_count: u64,
    pub message: String,
}

/// Lenient reader for a summary produced elsewhere. Missing or non-numeric
/// counts read as 0; a failure without text gets a generic message.
pub fn parse_validation_summary(raw: &Value) -> Option<EditorValidationSummary> {
    let row = raw.as_object()?;
    let ok = row.get("ok").is_some_and(truthy);
    let count = |keys: [&str; 2]| {
        keys.iter()
            .filter_map(|key| row.get(*key))
            .find(|value| !value.is_null())
            .and_then(as_count)
            .unwrap_or(0)
    };
    let error_text = ["error", "reason"]
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
        .map(|value| match value {
            Value::String(text) => text.trim().to_string(),
            other => other.to_string(),
        })
        .unwrap_or_default();

    Some(EditorValidationSummary::new(
        ok,
        count(["node_count", "nodeCount"]),
        count(["edge_count", "edgeCount"]),
        error_text,
    ))
}

impl EditorValidationSummary {
    fn new(ok: bool, node_count: u64, edge_count: u64, error_text: String) -> Self {
        let message = if ok {
            "graph validation passed".to_string()
        } else if error_text.is_empty() {
            "graph validation failed".to_string()
        } else {
            error_text
        };
        Self {
            status: if ok {
                ValidationStatus::Ok
            } else {
                ValidationStatus::Error
            },
            node_count,
            edge_count,
            message,
        }
    }
}

impl From<&ValidationSummary> for EditorValidationSummary {
    fn from(summary: &ValidationSummary) -> Self {
        Self::new(
            summary.ok,
            summary.node_count as u64,
            summary.edge_count as u64,
            summary.error.trim().to_string(),
        )
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(num) => num.as_f64().is_some_and(|v| v != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    let number = match value {
        Value::Number(num) => num.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then(|| number as u64)
}
