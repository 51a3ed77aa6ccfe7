use crate::ir::GraphSpec;
use crate::layout::{NodeSize, PositionMap, SizeMap, size_for};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub plugin: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub src: String,
    pub dst: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<String>,
}

impl LayoutDump {
    /// Nodes without a position are left out; edges are copied in spec order.
    pub fn from_spec(
        spec: &GraphSpec,
        positions: &PositionMap,
        sizes: &SizeMap,
        default_size: NodeSize,
    ) -> Self {
        let nodes = spec
            .nodes
            .iter()
            .filter_map(|node| {
                let pos = positions.get(&node.id)?;
                let size = size_for(&node.id, sizes, default_size);
                Some(NodeDump {
                    id: node.id.clone(),
                    kind: node.kind.to_string(),
                    plugin: node.plugin.clone(),
                    x: pos.x,
                    y: pos.y,
                    width: size.width,
                    height: size.height,
                })
            })
            .collect();

        let edges = spec
            .edges
            .iter()
            .map(|edge| EdgeDump {
                src: edge.src.clone(),
                dst: edge.dst.clone(),
                src_port: edge.src_port.clone(),
                dst_port: edge.dst_port.clone(),
            })
            .collect();

        LayoutDump { nodes, edges }
    }
}

pub fn write_layout_dump<W: Write>(writer: W, dump: &LayoutDump) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}

pub fn write_layout_dump_file(path: &Path, dump: &LayoutDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_layout_dump(&mut writer, dump)?;
    writer.flush()?;
    Ok(())
}
