use serde::{Deserialize, Serialize};
use serde_json::Value;
use stream_graph_editor::config::LayoutConfig;
use stream_graph_editor::ir::{Edge, NodeKind};
use stream_graph_editor::layout::{Axis, PositionMap, SizeMap, align_positions, compute_layout};
use stream_graph_editor::parser::{normalize, to_json_string};
use stream_graph_editor::policy::{ConnectionRequest, check_connection};
use stream_graph_editor::snap::{SnapCandidate, find_snap_target};
use stream_graph_editor::NodePosition;
use wasm_bindgen::prelude::*;

fn js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn layout_config(options_json: Option<String>) -> Result<LayoutConfig, String> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(LayoutConfig::default()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutRequest {
    #[serde(default)]
    node_ids: Vec<String>,
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapRequest {
    point: NodePosition,
    #[serde(default)]
    candidates: Vec<SnapCandidate>,
    source_node_id: String,
    threshold: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeCheckRequest {
    source_id: String,
    target_id: String,
    #[serde(default)]
    source_kind: String,
    #[serde(default)]
    target_kind: String,
    #[serde(default)]
    existing_edges: Vec<Edge>,
    #[serde(default)]
    source_port: Option<String>,
    #[serde(default)]
    target_port: Option<String>,
}

#[derive(Debug, Serialize)]
struct EdgeCheckResult {
    ok: bool,
    reason: Option<&'static str>,
    message: Option<String>,
}

fn normalize_json(spec_json: &str) -> Result<String, String> {
    let raw: Value = serde_json::from_str(spec_json).map_err(|error| error.to_string())?;
    let spec = normalize(&raw).map_err(|error| error.to_string())?;
    to_json_string(&spec).map_err(|error| error.to_string())
}

fn layout_json(request_json: &str, options_json: Option<String>) -> Result<String, String> {
    let request: LayoutRequest =
        serde_json::from_str(request_json).map_err(|error| error.to_string())?;
    let config = layout_config(options_json)?;
    let positions = compute_layout(request.node_ids.iter().map(String::as_str), &request.edges, &config);
    serde_json::to_string(&positions).map_err(|error| error.to_string())
}

fn align_json(
    positions_json: &str,
    ids_json: &str,
    axis: &str,
    sizes_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, String> {
    let positions: PositionMap =
        serde_json::from_str(positions_json).map_err(|error| error.to_string())?;
    let ids: Vec<String> = serde_json::from_str(ids_json).map_err(|error| error.to_string())?;
    let axis = Axis::from_token(axis).ok_or_else(|| format!("unknown axis: {}", axis))?;
    let sizes: SizeMap = match sizes_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string())?,
        None => SizeMap::new(),
    };
    let config = layout_config(options_json)?;
    let aligned = align_positions(&positions, &ids, axis, &sizes, &config);
    serde_json::to_string(&aligned).map_err(|error| error.to_string())
}

fn snap_json(request_json: &str) -> Result<String, String> {
    let request: SnapRequest =
        serde_json::from_str(request_json).map_err(|error| error.to_string())?;
    let target = find_snap_target(
        request.point,
        &request.candidates,
        &request.source_node_id,
        request.threshold,
    );
    serde_json::to_string(&target).map_err(|error| error.to_string())
}

fn check_edge_json(request_json: &str) -> Result<String, String> {
    let request: EdgeCheckRequest =
        serde_json::from_str(request_json).map_err(|error| error.to_string())?;
    let candidate = Edge::new(request.source_id.trim(), request.target_id.trim())
        .with_ports(request.source_port.as_deref(), request.target_port.as_deref());
    let verdict = check_connection(&ConnectionRequest {
        source_id: &request.source_id,
        target_id: &request.target_id,
        source_kind: NodeKind::parse(&request.source_kind),
        target_kind: NodeKind::parse(&request.target_kind),
        existing_edges: &request.existing_edges,
        candidate: &candidate,
    });
    let result = match verdict {
        Ok(()) => EdgeCheckResult {
            ok: true,
            reason: None,
            message: None,
        },
        Err(reason) => EdgeCheckResult {
            ok: false,
            reason: Some(reason.code()),
            message: Some(reason.to_string()),
        },
    };
    serde_json::to_string(&result).map_err(|error| error.to_string())
}

/// Canonical JSON for a loosely-shaped spec.
#[wasm_bindgen]
pub fn normalize_spec(spec_json: &str) -> Result<String, JsValue> {
    normalize_json(spec_json).map_err(js_error)
}

#[wasm_bindgen]
pub fn auto_layout(request_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    layout_json(request_json, options_json).map_err(js_error)
}

#[wasm_bindgen]
pub fn align_nodes(
    positions_json: &str,
    ids_json: &str,
    axis: &str,
    sizes_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    align_json(positions_json, ids_json, axis, sizes_json, options_json).map_err(js_error)
}

/// `null` when the release should be dropped.
#[wasm_bindgen]
pub fn snap_target(request_json: &str) -> Result<String, JsValue> {
    snap_json(request_json).map_err(js_error)
}

#[wasm_bindgen]
pub fn check_edge(request_json: &str) -> Result<String, JsValue> {
    check_edge_json(request_json).map_err(js_error)
}
