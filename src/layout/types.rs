use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f32,
    pub y: f32,
}

impl NodePosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f32,
    pub height: f32,
}

impl NodeSize {
    pub const DEFAULT: NodeSize = NodeSize {
        width: 200.0,
        height: 90.0,
    };
    pub const MIN_DIMENSION: f32 = 20.0;

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Non-finite dimensions fall back to the default, everything else is
    /// clamped to [`NodeSize::MIN_DIMENSION`].
    pub fn sanitized(self, fallback: NodeSize) -> Self {
        let fix = |value: f32, default: f32| {
            if value.is_finite() {
                value.max(Self::MIN_DIMENSION)
            } else {
                default
            }
        };
        Self {
            width: fix(self.width, fallback.width),
            height: fix(self.height, fallback.height),
        }
    }
}

impl Default for NodeSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" | "x" => Some(Self::Horizontal),
            "vertical" | "v" | "y" => Some(Self::Vertical),
            _ => None,
        }
    }
}

pub type PositionMap = BTreeMap<String, NodePosition>;
pub type SizeMap = BTreeMap<String, NodeSize>;

/// Size for `id`, defaulted and clamped when missing or degenerate.
pub fn size_for(id: &str, sizes: &SizeMap, fallback: NodeSize) -> NodeSize {
    sizes
        .get(id)
        .copied()
        .unwrap_or(fallback)
        .sanitized(fallback)
}
