mod align;
mod ranking;
pub(crate) mod types;
pub use align::align_positions;
pub use types::*;
use ranking::*;

use crate::config::{EditorConfig, LayoutConfig};
use crate::ir::{Edge, GraphSpec};
use std::collections::BTreeSet;

/// Deterministic left-to-right layered layout.
///
/// Ids are trimmed, deduplicated and sorted before anything else, so the
/// result does not depend on input order. Cycles never fail; their members
/// land in fallback layers after the deepest ranked one.
pub fn compute_layout<'a, I>(node_ids: I, edges: &[Edge], config: &LayoutConfig) -> PositionMap
where
    I: IntoIterator<Item = &'a str>,
{
    let ids: Vec<String> = node_ids
        .into_iter()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return PositionMap::new();
    }

    let layers = compute_layers(&ids, edges, config.cycle_bucket_size);
    let mut positions = PositionMap::new();
    for (layer, bucket) in bucket_by_layer(&layers).into_iter().enumerate() {
        for (row, id) in bucket.into_iter().enumerate() {
            positions.insert(
                id,
                NodePosition::new(
                    config.margin_x + layer as f32 * config.gap_x,
                    config.margin_y + row as f32 * config.gap_y,
                ),
            );
        }
    }
    positions
}

pub fn layout_spec(spec: &GraphSpec, config: &LayoutConfig) -> PositionMap {
    compute_layout(spec.node_ids(), &spec.edges, config)
}

/// Grid slot handed to a node that has no position yet.
pub fn default_position(index: usize, config: &EditorConfig) -> NodePosition {
    let columns = config.grid_columns.max(1);
    NodePosition::new(
        config.grid_origin_x + (index % columns) as f32 * config.grid_step_x,
        config.grid_origin_y + (index / columns) as f32 * config.grid_step_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chain_moves_right_per_hop() {
        let edges = vec![Edge::new("src", "mid"), Edge::new("mid", "out")];
        let config = LayoutConfig::default();
        let first = compute_layout(["src", "mid", "out"], &edges, &config);
        let second = compute_layout(["src", "mid", "out"], &edges, &config);
        assert_eq!(first, second);
        assert!(first["src"].x < first["mid"].x);
        assert!(first["mid"].x < first["out"].x);
        assert_eq!(first["src"], NodePosition::new(80.0, 80.0));
        assert_eq!(first["out"], NodePosition::new(80.0 + 2.0 * 340.0, 80.0));
    }

    #[test]
    fn two_cycle_still_places_every_node() {
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "a")];
        let pos = compute_layout(["a", "b", "c"], &edges, &LayoutConfig::default());
        let keys: Vec<&str> = pos.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(pos.values().all(NodePosition::is_finite));
        assert_eq!(pos["c"].x, 80.0);
        assert_eq!(pos["a"].x, 80.0 + 340.0);
        assert_eq!(pos["b"].y, 80.0 + 180.0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let edges = vec![
            Edge::new("b", "d"),
            Edge::new("a", "c"),
            Edge::new("c", "d"),
            Edge::new("a", "b"),
        ];
        let mut reversed = edges.clone();
        reversed.reverse();
        let config = LayoutConfig::default();
        assert_eq!(
            compute_layout(["a", "b", "c", "d"], &edges, &config),
            compute_layout(["d", " c", "b", "a", "a"], &reversed, &config)
        );
    }

    #[test]
    fn isolated_nodes_stack_in_id_order() {
        let pos = compute_layout(["zeta", "alpha", "mid"], &[], &LayoutConfig::default());
        assert_eq!(pos["alpha"], NodePosition::new(80.0, 80.0));
        assert_eq!(pos["mid"], NodePosition::new(80.0, 260.0));
        assert_eq!(pos["zeta"], NodePosition::new(80.0, 440.0));
    }

    #[test]
    fn empty_input_gives_empty_map() {
        assert!(compute_layout(["", "  "], &[], &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn custom_margins_and_gaps_apply() {
        let config = LayoutConfig {
            margin_x: 0.0,
            margin_y: 10.0,
            gap_x: 100.0,
            gap_y: 50.0,
            ..LayoutConfig::default()
        };
        let pos = compute_layout(["a", "b", "c"], &[Edge::new("a", "b"), Edge::new("a", "c")], &config);
        assert_eq!(pos["a"], NodePosition::new(0.0, 10.0));
        assert_eq!(pos["b"], NodePosition::new(100.0, 10.0));
        assert_eq!(pos["c"], NodePosition::new(100.0, 60.0));
    }

    #[test]
    fn default_position_walks_a_four_column_grid() {
        let config = EditorConfig::default();
        assert_eq!(default_position(0, &config), NodePosition::new(100.0, 80.0));
        assert_eq!(default_position(3, &config), NodePosition::new(850.0, 80.0));
        assert_eq!(default_position(5, &config), NodePosition::new(350.0, 260.0));
    }
}
