use crate::ir::NodeKind;
use crate::layout::{NodePosition, NodeSize};
use serde::{Deserialize, Serialize};

/// Every resolved connection lands on the target's input side.
pub const INPUT_HANDLE: &str = "in";

/// Added to handle-proximity hits so a body hit within range always wins.
const HANDLE_PENALTY: f32 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapCandidate {
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: NodePosition,
    /// Measured size; the default node size is used when absent.
    #[serde(default)]
    pub size: Option<NodeSize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTarget {
    pub node_id: String,
    pub handle_id: String,
}

/// Resolve a drag release at `point` to the closest node that can accept an
/// incoming edge from `source_node_id`. `None` means the gesture should be
/// dropped.
pub fn find_snap_target(
    point: NodePosition,
    candidates: &[SnapCandidate],
    source_node_id: &str,
    threshold: f32,
) -> Option<SnapTarget> {
    let source_node_id = source_node_id.trim();
    if source_node_id.is_empty() || candidates.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f32)> = None;
    for candidate in candidates {
        let node_id = candidate.id.trim();
        if node_id.is_empty() || node_id == source_node_id {
            continue;
        }
        if !candidate.kind.accepts_incoming() {
            continue;
        }

        let size = candidate
            .size
            .unwrap_or(NodeSize::DEFAULT)
            .sanitized(NodeSize::DEFAULT);
        let pos = candidate.position;

        let score = {
            let body = distance_to_rect(point, pos, size);
            if body <= threshold {
                Some(body)
            } else {
                let handle = NodePosition::new(pos.x, pos.y + size.height / 2.0);
                let dist = (point.x - handle.x).hypot(point.y - handle.y);
                (dist <= threshold).then_some(dist + HANDLE_PENALTY)
            }
        };

        if let Some(score) = score {
            if best.is_none_or(|(_, current)| score < current) {
                best = Some((node_id, score));
            }
        }
    }

    best.map(|(node_id, _)| SnapTarget {
        node_id: node_id.to_string(),
        handle_id: INPUT_HANDLE.to_string(),
    })
}

/// Euclidean distance from `point` to the box, zero inside it.
fn distance_to_rect(point: NodePosition, origin: NodePosition, size: NodeSize) -> f32 {
    let right = origin.x + size.width;
    let bottom = origin.y + size.height;
    let dx = if point.x < origin.x {
        origin.x - point.x
    } else if point.x > right {
        point.x - right
    } else {
        0.0
    };
    let dy = if point.y < origin.y {
        origin.y - point.y
    } else if point.y > bottom {
        point.y - bottom
    } else {
        0.0
    };
    dx.hypot(dy)
}
