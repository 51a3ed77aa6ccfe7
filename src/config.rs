use crate::layout::NodeSize;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub margin_x: f32,
    pub margin_y: f32,
    /// Horizontal distance between layers.
    pub gap_x: f32,
    /// Vertical distance between rows inside a layer.
    pub gap_y: f32,
    /// Unranked (cyclic) nodes are spread over extra layers of this many nodes.
    pub cycle_bucket_size: usize,
    pub align_gap: f32,
    pub default_node_size: NodeSize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_x: 80.0,
            margin_y: 80.0,
            gap_x: 340.0,
            gap_y: 180.0,
            cycle_bucket_size: 6,
            align_gap: 36.0,
            default_node_size: NodeSize::DEFAULT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap radius in screen pixels; divided by the zoom factor before use.
    pub snap_radius: f32,
    pub default_source_port: String,
    pub grid_columns: usize,
    pub grid_origin_x: f32,
    pub grid_origin_y: f32,
    pub grid_step_x: f32,
    pub grid_step_y: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_radius: 42.0,
            default_source_port: "out".to_string(),
            grid_columns: 4,
            grid_origin_x: 100.0,
            grid_origin_y: 80.0,
            grid_step_x: 250.0,
            grid_step_y: 180.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub editor: EditorConfig,
}

/// Load a JSON5 config file; every field is optional. `None` yields defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = json5::from_str(contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.layout.gap_x, 340.0);
        assert_eq!(config.editor.snap_radius, 42.0);
    }

    #[test]
    fn partial_json5_overrides_only_named_fields() {
        let config = parse_config(
            r#"{
                // tighter columns
                layout: { gap_x: 200, default_node_size: { width: 120, height: 60 } },
                editor: { snap_radius: 30 },
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.gap_x, 200.0);
        assert_eq!(config.layout.gap_y, 180.0);
        assert_eq!(config.layout.default_node_size, NodeSize::new(120.0, 60.0));
        assert_eq!(config.editor.snap_radius, 30.0);
        assert_eq!(config.editor.default_source_port, "out");
    }

    #[test]
    fn rejects_malformed_file() {
        assert!(parse_config("{ layout: ").is_err());
    }
}
