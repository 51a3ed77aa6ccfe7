use crate::ir::{ConfigMap, Edge, GraphSpec, Node, NodeKind, SPEC_VERSION};
use serde_json::{Map, Value};
use thiserror::Error;

/// Malformed graph input. `path` names the offending field, e.g. `spec.nodes[2].plugin`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path} {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

type Result<T> = std::result::Result<T, ValidationError>;

/// Build a canonical [`GraphSpec`] from loosely-typed input.
///
/// Accepts the legacy aliases `node_id`, `from`, `to`, `from_port` and
/// `to_port`. Either the whole input is accepted or nothing is.
pub fn normalize(raw: &Value) -> Result<GraphSpec> {
    let payload = as_mapping(raw, "spec")?;

    if let Some(version) = present(payload, &["version"]) {
        check_version(version)?;
    }

    let nodes_raw = as_list(present(payload, &["nodes"]), "spec.nodes")?;
    let edges_raw = as_list(present(payload, &["edges"]), "spec.edges")?;
    let config = as_config(present(payload, &["config"]), "spec.config")?;

    let mut nodes = Vec::with_capacity(nodes_raw.len());
    for (idx, item) in nodes_raw.iter().enumerate() {
        nodes.push(normalize_node(item, idx)?);
    }

    let mut edges = Vec::with_capacity(edges_raw.len());
    for (idx, item) in edges_raw.iter().enumerate() {
        edges.push(normalize_edge(item, idx)?);
    }

    Ok(GraphSpec {
        version: SPEC_VERSION,
        nodes,
        edges,
        config,
    })
}

fn normalize_node(item: &Value, idx: usize) -> Result<Node> {
    let path = format!("spec.nodes[{}]", idx);
    let obj = as_mapping(item, &path)?;

    let id = required_text(obj, &["id", "node_id"], &format!("{}.id", path))?;
    let plugin = required_text(obj, &["plugin"], &format!("{}.plugin", path))?;
    let kind = optional_text(obj, &["kind"], &format!("{}.kind", path))?
        .map(|text| NodeKind::parse(&text))
        .unwrap_or_default();
    let config = as_config(present(obj, &["config"]), &format!("{}.config", path))?;

    Ok(Node {
        id,
        kind,
        plugin,
        config,
    })
}

fn normalize_edge(item: &Value, idx: usize) -> Result<Edge> {
    let path = format!("spec.edges[{}]", idx);
    let obj = as_mapping(item, &path)?;

    let src = optional_text(obj, &["src", "from"], &format!("{}.src", path))?;
    let dst = optional_text(obj, &["dst", "to"], &format!("{}.dst", path))?;
    let (Some(src), Some(dst)) = (src, dst) else {
        return Err(ValidationError::new(path, "requires src/dst"));
    };
    let src_port = optional_text(obj, &["src_port", "from_port"], &format!("{}.src_port", path))?;
    let dst_port = optional_text(obj, &["dst_port", "to_port"], &format!("{}.dst_port", path))?;

    Ok(Edge {
        src,
        dst,
        src_port,
        dst_port,
    })
}

fn check_version(version: &Value) -> Result<()> {
    let parsed = match version {
        Value::Number(num) => num
            .as_u64()
            .or_else(|| num.as_f64().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v == u64::from(SPEC_VERSION) => Ok(()),
        Some(_) => Err(ValidationError::new("spec.version", "must be 2")),
        None => Err(ValidationError::new("spec.version", "must be int")),
    }
}

fn as_mapping<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::new(path, "must be a mapping"))
}

fn as_list<'a>(value: Option<&'a Value>, path: &str) -> Result<&'a [Value]> {
    match value {
        None => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(ValidationError::new(path, "must be a list")),
    }
}

fn as_config(value: Option<&Value>, path: &str) -> Result<ConfigMap> {
    match value {
        None => Ok(ConfigMap::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ValidationError::new(path, "must be a mapping")),
    }
}

/// First non-null value among `keys`; the canonical key comes first.
fn present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Trimmed scalar text, `None` when absent or blank.
fn optional_text(obj: &Map<String, Value>, keys: &[&str], path: &str) -> Result<Option<String>> {
    let text = match present(obj, keys) {
        None => return Ok(None),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(num)) => num.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(_) => return Err(ValidationError::new(path, "must be a string")),
    };
    Ok(if text.is_empty() { None } else { Some(text) })
}

fn required_text(obj: &Map<String, Value>, keys: &[&str], path: &str) -> Result<String> {
    optional_text(obj, keys, path)?.ok_or_else(|| ValidationError::new(path, "is required"))
}

pub fn from_json_str(text: &str) -> std::result::Result<GraphSpec, CodecError> {
    let raw: Value = serde_json::from_str(text)?;
    Ok(normalize(&raw)?)
}

/// YAML is a JSON superset, so this also accepts JSON text.
pub fn from_yaml_str(text: &str) -> std::result::Result<GraphSpec, CodecError> {
    let raw: Value = serde_yaml::from_str(text)?;
    Ok(normalize(&raw)?)
}

pub fn to_json_string(spec: &GraphSpec) -> std::result::Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(spec)?)
}

pub fn to_yaml_string(spec: &GraphSpec) -> std::result::Result<String, CodecError> {
    Ok(serde_yaml::to_string(spec)?)
}
