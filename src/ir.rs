use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Opaque key-value bag carried verbatim through normalization and serialization.
pub type ConfigMap = Map<String, Value>;

pub const SPEC_VERSION: u32 = 2;

pub const DEFAULT_SOURCE_PLUGIN: &str = "schnitzel_stream.nodes.dev:StaticSource";
pub const DEFAULT_NODE_PLUGIN: &str = "schnitzel_stream.nodes.dev:Identity";
pub const DEFAULT_SINK_PLUGIN: &str = "schnitzel_stream.nodes.dev:PrintSink";

/// Serialized lowercase. Deserialization goes through [`NodeKind::parse`], so
/// unrecognized text reads as a plain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum NodeKind {
    Source,
    #[default]
    Node,
    Sink,
}

impl NodeKind {
    /// Case-insensitive; anything that is not `source` or `sink` is a plain node.
    pub fn parse(text: &str) -> Self {
        let raw = text.trim();
        if raw.eq_ignore_ascii_case("source") {
            Self::Source
        } else if raw.eq_ignore_ascii_case("sink") {
            Self::Sink
        } else {
            Self::Node
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Node => "node",
            Self::Sink => "sink",
        }
    }

    pub fn accepts_incoming(self) -> bool {
        self != Self::Source
    }

    pub fn accepts_outgoing(self) -> bool {
        self != Self::Sink
    }
}

impl From<String> for NodeKind {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub plugin: String,
    #[serde(default)]
    pub config: ConfigMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub src: String,
    pub dst: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<String>,
}

impl Edge {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            src_port: None,
            dst_port: None,
        }
    }

    /// Blank port names collapse to the default handle.
    pub fn with_ports(mut self, src_port: Option<&str>, dst_port: Option<&str>) -> Self {
        self.src_port = non_blank(src_port);
        self.dst_port = non_blank(dst_port);
        self
    }

    /// Identity string used for change detection. The index is part of the
    /// identity so a pure reorder still counts as a structural change.
    pub fn identity(&self, index: usize) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.src,
            self.dst,
            self.src_port.as_deref().unwrap_or("*"),
            self.dst_port.as_deref().unwrap_or("*"),
            index
        )
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.src == node_id || self.dst == node_id
    }
}

fn non_blank(port: Option<&str>) -> Option<String> {
    port.map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub version: u32,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub config: ConfigMap,
}

impl GraphSpec {
    pub fn new() -> Self {
        Self {
            version: SPEC_VERSION,
            nodes: Vec::new(),
            edges: Vec::new(),
            config: ConfigMap::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.id.as_str())
    }

    pub fn edge_identities(&self) -> Vec<String> {
        self.edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| edge.identity(idx))
            .collect()
    }
}

impl Default for GraphSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// The two-node graph the editor opens with.
pub fn default_spec() -> GraphSpec {
    let mut spec = GraphSpec::new();
    spec.nodes.push(Node {
        id: "src".to_string(),
        kind: NodeKind::Source,
        plugin: DEFAULT_SOURCE_PLUGIN.to_string(),
        config: object(json!({
            "packets": [
                {
                    "kind": "demo",
                    "source_id": "editor_demo",
                    "payload": { "message": "hello from block editor" }
                }
            ]
        })),
    });
    spec.nodes.push(Node {
        id: "out".to_string(),
        kind: NodeKind::Sink,
        plugin: DEFAULT_SINK_PLUGIN.to_string(),
        config: object(json!({ "prefix": "EDITOR " })),
    });
    spec.edges.push(Edge::new("src", "out"));
    spec
}

pub fn default_node_template(kind: NodeKind, id: &str) -> Node {
    let (plugin, config) = match kind {
        NodeKind::Source => (
            DEFAULT_SOURCE_PLUGIN,
            object(json!({
                "packets": [
                    { "kind": "demo", "source_id": id, "payload": { "value": id } }
                ]
            })),
        ),
        NodeKind::Sink => (
            DEFAULT_SINK_PLUGIN,
            object(json!({ "prefix": format!("{} ", id.to_uppercase()) })),
        ),
        NodeKind::Node => (DEFAULT_NODE_PLUGIN, ConfigMap::new()),
    };
    Node {
        id: id.to_string(),
        kind,
        plugin: plugin.to_string(),
        config,
    }
}

/// First unused id of the form `base`, `base_2`, `base_3`, ...
pub fn next_node_id(base: &str, spec: &GraphSpec) -> String {
    let base = match base.trim() {
        "" => "node",
        trimmed => trimmed,
    };
    if !spec.contains_node(base) {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !spec.contains_node(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn object(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        _ => ConfigMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_permissive() {
        assert_eq!(NodeKind::parse("SOURCE"), NodeKind::Source);
        assert_eq!(NodeKind::parse(" sink "), NodeKind::Sink);
        assert_eq!(NodeKind::parse("node"), NodeKind::Node);
        assert_eq!(NodeKind::parse(""), NodeKind::Node);
        assert_eq!(NodeKind::parse("transform"), NodeKind::Node);
    }

    #[test]
    fn kind_deserializes_like_parse() {
        let read = |raw: &str| serde_json::from_str::<NodeKind>(raw).unwrap();
        assert_eq!(read("\"Source\""), NodeKind::Source);
        assert_eq!(read("\"SINK\""), NodeKind::Sink);
        assert_eq!(read("\"transform\""), NodeKind::Node);
        assert_eq!(read("\"\""), NodeKind::Node);
        assert_eq!(serde_json::to_string(&NodeKind::Sink).unwrap(), "\"sink\"");
    }

    #[test]
    fn edge_identity_uses_star_for_default_ports() {
        let edge = Edge::new("a", "b").with_ports(Some("out"), Some("  "));
        assert_eq!(edge.dst_port, None);
        assert_eq!(edge.identity(3), "a|b|out|*|3");
    }

    #[test]
    fn next_node_id_skips_taken_suffixes() {
        let mut spec = GraphSpec::new();
        assert_eq!(next_node_id("  ", &spec), "node");
        spec.nodes.push(default_node_template(NodeKind::Node, "node"));
        spec.nodes.push(default_node_template(NodeKind::Node, "node_2"));
        assert_eq!(next_node_id("node", &spec), "node_3");
        assert_eq!(next_node_id("sink", &spec), "sink");
    }

    #[test]
    fn default_spec_connects_source_to_sink() {
        let spec = default_spec();
        assert_eq!(spec.version, SPEC_VERSION);
        assert_eq!(spec.node("src").map(|n| n.kind), Some(NodeKind::Source));
        assert_eq!(spec.node("out").map(|n| n.kind), Some(NodeKind::Sink));
        assert_eq!(spec.edges, vec![Edge::new("src", "out")]);
    }

    #[test]
    fn sink_template_prefix_is_uppercased() {
        let node = default_node_template(NodeKind::Sink, "sink_2");
        assert_eq!(node.plugin, DEFAULT_SINK_PLUGIN);
        assert_eq!(node.config.get("prefix"), Some(&json!("SINK_2 ")));
    }

    #[test]
    fn absent_ports_are_not_serialized() {
        let text = serde_json::to_string(&Edge::new("a", "b")).unwrap();
        assert_eq!(text, r#"{"src":"a","dst":"b"}"#);
    }
}
