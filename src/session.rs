//! Editor application state.
//!
//! [`EditorSession`] owns the graph, the position side map and the selection.
//! Every structural edit builds a new [`GraphSpec`] and hands it to
//! [`EditorSession::apply_spec`], which reconciles positions and selection.

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::ir::{ConfigMap, Edge, GraphSpec, NodeKind, default_node_template, default_spec, next_node_id};
use crate::layout::{
    Axis, NodePosition, NodeSize, PositionMap, SizeMap, align_positions, default_position, layout_spec,
};
use crate::parser::{self, CodecError, ValidationError};
use crate::policy::{ConnectionRequest, RejectReason, check_connection};
use crate::snap::{SnapCandidate, find_snap_target};
use crate::validate::{EditorValidationSummary, ValidationSummary, parse_validation_summary, summarize};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Rejected(#[from] RejectReason),
    #[error("node not found: {0}")]
    UnknownNode(String),
    #[error("node id is required")]
    MissingNodeId,
    #[error("node id already exists ({0})")]
    DuplicateNodeId(String),
    #[error("node plugin is required")]
    MissingPlugin,
    #[error("source/target must refer to existing nodes")]
    UnknownEndpoint,
}

/// Field edits for one node. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub id: Option<String>,
    pub kind: Option<NodeKind>,
    pub plugin: Option<String>,
    pub config: Option<ConfigMap>,
    pub position: Option<NodePosition>,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    spec: GraphSpec,
    positions: PositionMap,
    sizes: SizeMap,
    selected_node: Option<String>,
    edge_src: Option<String>,
    edge_dst: Option<String>,
    validation: Option<EditorValidationSummary>,
    config: Config,
}

impl EditorSession {
    pub fn new(config: Config) -> Self {
        let mut session = Self {
            spec: GraphSpec::new(),
            positions: PositionMap::new(),
            sizes: SizeMap::new(),
            selected_node: None,
            edge_src: None,
            edge_dst: None,
            validation: None,
            config,
        };
        session.apply_spec(default_spec(), PositionMap::new());
        session
    }

    pub fn spec(&self) -> &GraphSpec {
        &self.spec
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn sizes(&self) -> &SizeMap {
        &self.sizes
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    /// Current (src, dst) picks of the manual edge form.
    pub fn edge_endpoints(&self) -> (Option<&str>, Option<&str>) {
        (self.edge_src.as_deref(), self.edge_dst.as_deref())
    }

    pub fn validation(&self) -> Option<&EditorValidationSummary> {
        self.validation.as_ref()
    }

    /// Replace the graph wholesale. Positions of removed nodes are dropped,
    /// new nodes get a grid slot, and the selection is remapped.
    pub fn apply_spec(&mut self, spec: GraphSpec, positions: PositionMap) {
        let mut reconciled = PositionMap::new();
        for (idx, node) in spec.nodes.iter().enumerate() {
            let pos = positions
                .get(&node.id)
                .copied()
                .unwrap_or_else(|| default_position(idx, &self.config.editor));
            reconciled.insert(node.id.clone(), pos);
        }
        self.sizes.retain(|id, _| spec.contains_node(id));

        let keep = |current: &Option<String>, fallback: Option<usize>| -> Option<String> {
            current
                .as_deref()
                .filter(|id| spec.contains_node(id))
                .map(str::to_string)
                .or_else(|| fallback.and_then(|idx| spec.nodes.get(idx)).map(|n| n.id.clone()))
        };
        let last = spec.nodes.len().checked_sub(1);
        self.selected_node = keep(&self.selected_node, Some(0));
        self.edge_src = keep(&self.edge_src, Some(0));
        self.edge_dst = keep(&self.edge_dst, last.map(|last| last.min(1)));

        self.spec = spec;
        self.positions = reconciled;
        self.validation = None;
    }

    pub fn select_node(&mut self, id: &str) -> bool {
        if !self.spec.contains_node(id) {
            return false;
        }
        self.selected_node = Some(id.to_string());
        true
    }

    pub fn set_edge_endpoints(&mut self, src: &str, dst: &str) {
        self.edge_src = Some(src.trim().to_string());
        self.edge_dst = Some(dst.trim().to_string());
    }

    /// Load a graph rendered by the control plane from a profile; every node
    /// starts on the default grid.
    pub fn load_profile_spec(&mut self, raw: &Value) -> Result<(), EditorError> {
        let spec = parser::normalize(raw)?;
        tracing::info!(
            action = "editor.profile.load",
            nodes = spec.nodes.len(),
            edges = spec.edges.len(),
            "applied editor action"
        );
        self.apply_spec(spec, PositionMap::new());
        Ok(())
    }

    /// Replace the graph from YAML text, keeping positions of surviving ids.
    pub fn import_yaml(&mut self, text: &str) -> Result<(), EditorError> {
        let spec = parser::from_yaml_str(text)?;
        tracing::info!(
            action = "editor.yaml.import",
            nodes = spec.nodes.len(),
            edges = spec.edges.len(),
            "applied editor action"
        );
        let positions = self.positions.clone();
        self.apply_spec(spec, positions);
        Ok(())
    }

    pub fn export_yaml(&self) -> Result<String, EditorError> {
        let text = parser::to_yaml_string(&self.spec)?;
        tracing::info!(
            action = "editor.yaml.export",
            nodes = self.spec.nodes.len(),
            edges = self.spec.edges.len(),
            "applied editor action"
        );
        Ok(text)
    }

    /// Append a templated node of `kind` and return its generated id.
    pub fn add_node(&mut self, kind: NodeKind) -> String {
        let node_id = next_node_id(kind.as_str(), &self.spec);
        let mut spec = self.spec.clone();
        spec.nodes.push(default_node_template(kind, &node_id));
        let mut positions = self.positions.clone();
        positions.insert(
            node_id.clone(),
            default_position(spec.nodes.len() - 1, &self.config.editor),
        );
        tracing::info!(action = "editor.node.add", node_id = %node_id, kind = %kind, "applied editor action");
        self.apply_spec(spec, positions);
        node_id
    }

    /// Edit one node. A rename rewrites incident edges and moves the position entry.
    pub fn update_node(&mut self, target: &str, update: NodeUpdate) -> Result<(), EditorError> {
        let target = target.trim();
        let idx = self
            .spec
            .node_index(target)
            .ok_or_else(|| EditorError::UnknownNode(target.to_string()))?;

        let next_id = match update.id.as_deref().map(str::trim) {
            None => target.to_string(),
            Some("") => return Err(EditorError::MissingNodeId),
            Some(id) => id.to_string(),
        };
        if next_id != target && self.spec.contains_node(&next_id) {
            return Err(EditorError::DuplicateNodeId(next_id));
        }
        let plugin = match update.plugin.as_deref().map(str::trim) {
            None => None,
            Some("") => return Err(EditorError::MissingPlugin),
            Some(plugin) => Some(plugin.to_string()),
        };

        let mut spec = self.spec.clone();
        let node = &mut spec.nodes[idx];
        node.id = next_id.clone();
        if let Some(kind) = update.kind {
            node.kind = kind;
        }
        if let Some(plugin) = plugin {
            node.plugin = plugin;
        }
        if let Some(config) = update.config {
            node.config = config;
        }
        for edge in &mut spec.edges {
            if edge.src == target {
                edge.src = next_id.clone();
            }
            if edge.dst == target {
                edge.dst = next_id.clone();
            }
        }

        let mut positions = self.positions.clone();
        let previous = positions.remove(target);
        if let Some(pos) = update.position.or(previous) {
            positions.insert(next_id.clone(), pos);
        }
        if let Some(size) = self.sizes.remove(target) {
            self.sizes.insert(next_id.clone(), size);
        }
        for slot in [&mut self.selected_node, &mut self.edge_src, &mut self.edge_dst] {
            if slot.as_deref() == Some(target) {
                *slot = Some(next_id.clone());
            }
        }

        tracing::info!(
            action = "editor.node.save",
            node_id = %next_id,
            previous_id = %target,
            "applied editor action"
        );
        self.apply_spec(spec, positions);
        Ok(())
    }

    pub fn remove_node(&mut self, id: &str) -> bool {
        self.remove_nodes(&[id.to_string()]) > 0
    }

    /// Remove nodes and every edge touching them. Returns how many nodes went away.
    pub fn remove_nodes(&mut self, ids: &[String]) -> usize {
        let doomed: Vec<&str> = ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| self.spec.contains_node(id))
            .collect();
        if doomed.is_empty() {
            tracing::debug!(action = "editor.node.remove", "no matching nodes");
            return 0;
        }

        let mut spec = self.spec.clone();
        spec.nodes.retain(|node| !doomed.contains(&node.id.as_str()));
        spec.edges
            .retain(|edge| !doomed.iter().any(|id| edge.touches(id)));
        let removed = self.spec.nodes.len() - spec.nodes.len();

        let mut positions = self.positions.clone();
        for id in &doomed {
            positions.remove(*id);
        }
        tracing::info!(action = "editor.node.remove", nodes = ?doomed, "applied editor action");
        self.apply_spec(spec, positions);
        removed
    }

    /// Add an edge after the connection policy accepts it.
    pub fn connect(
        &mut self,
        src: &str,
        dst: &str,
        src_port: Option<&str>,
        dst_port: Option<&str>,
    ) -> Result<Edge, EditorError> {
        let src = src.trim();
        let dst = dst.trim();
        if src.is_empty() || dst.is_empty() {
            return Err(RejectReason::SourceTargetRequired.into());
        }
        let (Some(src_node), Some(dst_node)) = (self.spec.node(src), self.spec.node(dst)) else {
            return Err(EditorError::UnknownEndpoint);
        };

        let candidate = Edge::new(src, dst).with_ports(src_port, dst_port);
        let verdict = check_connection(&ConnectionRequest {
            source_id: src,
            target_id: dst,
            source_kind: src_node.kind,
            target_kind: dst_node.kind,
            existing_edges: &self.spec.edges,
            candidate: &candidate,
        });
        if let Err(reason) = verdict {
            tracing::debug!(action = "editor.edge.connect", reason = reason.code(), "connection rejected");
            return Err(reason.into());
        }

        let mut spec = self.spec.clone();
        spec.edges.push(candidate.clone());
        tracing::info!(action = "editor.edge.add", src = %src, dst = %dst, "applied editor action");
        let positions = self.positions.clone();
        self.apply_spec(spec, positions);
        Ok(candidate)
    }

    /// Use the manual form's src/dst picks.
    pub fn connect_selected(&mut self) -> Result<Edge, EditorError> {
        let src = self.edge_src.clone().unwrap_or_default();
        let dst = self.edge_dst.clone().unwrap_or_default();
        self.connect(&src, &dst, None, None)
    }

    pub fn remove_edge(&mut self, index: usize) -> Option<Edge> {
        if index >= self.spec.edges.len() {
            return None;
        }
        let mut spec = self.spec.clone();
        let removed = spec.edges.remove(index);
        tracing::info!(
            action = "editor.edge.remove",
            src = %removed.src,
            dst = %removed.dst,
            "applied editor action"
        );
        let positions = self.positions.clone();
        self.apply_spec(spec, positions);
        Some(removed)
    }

    /// Take the canvas' edge list. Returns `false` (and changes nothing)
    /// when every edge identity matches the current spec.
    pub fn sync_edges(&mut self, edges: Vec<Edge>) -> bool {
        let next: Vec<Edge> = edges
            .into_iter()
            .map(|edge| {
                let Edge {
                    src,
                    dst,
                    src_port,
                    dst_port,
                } = edge;
                Edge::new(src, dst).with_ports(src_port.as_deref(), dst_port.as_deref())
            })
            .collect();
        let current = self.spec.edge_identities();
        let changed = current.len() != next.len()
            || next
                .iter()
                .enumerate()
                .any(|(idx, edge)| edge.identity(idx) != current[idx]);
        if !changed {
            tracing::debug!(action = "editor.edge.sync.canvas", "no structural change");
            return false;
        }

        let mut spec = self.spec.clone();
        spec.edges = next;
        tracing::info!(action = "editor.edge.sync.canvas", edges = spec.edges.len(), "applied editor action");
        let positions = self.positions.clone();
        self.apply_spec(spec, positions);
        true
    }

    /// Finish a drag that was released off-handle. `zoom` scales the snap
    /// radius so it stays constant on screen. `Ok(None)` leaves the graph as is.
    pub fn connect_from_drop(
        &mut self,
        source_id: &str,
        source_port: Option<&str>,
        point: NodePosition,
        zoom: f32,
    ) -> Result<Option<Edge>, EditorError> {
        let threshold = self.config.editor.snap_radius / zoom.max(0.001);
        let Some(target) = find_snap_target(point, &self.snap_candidates(), source_id, threshold)
        else {
            tracing::debug!(action = "editor.edge.snap", source = %source_id, "no snap target");
            return Ok(None);
        };
        let source_port = source_port
            .map(str::trim)
            .filter(|port| !port.is_empty())
            .unwrap_or(self.config.editor.default_source_port.as_str())
            .to_string();
        self.connect(
            source_id,
            &target.node_id,
            Some(&source_port),
            Some(&target.handle_id),
        )
        .map(Some)
    }

    pub fn snap_candidates(&self) -> Vec<SnapCandidate> {
        self.spec
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| SnapCandidate {
                id: node.id.clone(),
                kind: node.kind,
                position: self
                    .positions
                    .get(&node.id)
                    .copied()
                    .unwrap_or_else(|| default_position(idx, &self.config.editor)),
                size: self.sizes.get(&node.id).copied(),
            })
            .collect()
    }

    pub fn auto_layout(&mut self) {
        let positions = layout_spec(&self.spec, &self.config.layout);
        tracing::info!(action = "editor.layout.auto", nodes = self.spec.nodes.len(), "applied editor action");
        self.commit_positions(positions);
    }

    /// Align every node of the graph.
    pub fn align(&mut self, axis: Axis) {
        let ids: Vec<String> = self.spec.node_ids().map(str::to_string).collect();
        self.align_nodes(&ids, axis);
    }

    pub fn align_nodes(&mut self, ids: &[String], axis: Axis) {
        let positions = align_positions(&self.positions, ids, axis, &self.sizes, &self.config.layout);
        tracing::info!(action = "editor.layout.align", axis = ?axis, nodes = ids.len(), "applied editor action");
        self.commit_positions(positions);
    }

    /// Accept positions from the canvas. Unknown ids are ignored, nodes the
    /// map does not mention keep their current position.
    pub fn commit_positions(&mut self, positions: PositionMap) {
        for (id, pos) in positions {
            if self.spec.contains_node(&id) && pos.is_finite() {
                self.positions.insert(id, pos);
            }
        }
    }

    /// Record a size measured by the rendering surface.
    pub fn set_node_size(&mut self, id: &str, size: NodeSize) -> bool {
        if !self.spec.contains_node(id) {
            return false;
        }
        self.sizes.insert(id.to_string(), size);
        true
    }

    /// Store the summary returned by a remote validate call.
    pub fn record_validation(&mut self, raw: &Value) -> Option<&EditorValidationSummary> {
        self.validation = parse_validation_summary(raw);
        self.validation.as_ref()
    }

    /// Run the strict DAG check locally and keep the result as the current summary.
    pub fn validate_locally(&mut self) -> ValidationSummary {
        let summary = summarize(&self.spec);
        self.validation = Some(EditorValidationSummary::from(&summary));
        summary
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
