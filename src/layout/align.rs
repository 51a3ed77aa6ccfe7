use std::collections::HashSet;

use crate::config::LayoutConfig;

use super::types::{Axis, NodePosition, PositionMap, SizeMap, size_for};

/// Line the targets up on `axis` and push them apart so no two boxes overlap.
///
/// Returns a new map; ids not present in `positions` are skipped.
pub fn align_positions(
    positions: &PositionMap,
    target_ids: &[String],
    axis: Axis,
    sizes: &SizeMap,
    config: &LayoutConfig,
) -> PositionMap {
    let mut seen: HashSet<&str> = HashSet::new();
    let ids: Vec<&str> = target_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| positions.contains_key(*id) && seen.insert(*id))
        .collect();

    let mut out = positions.clone();
    if ids.is_empty() {
        return out;
    }

    let gap = config.align_gap;
    let fallback = config.default_node_size;

    // (id, coordinate along the axis, extent along the axis)
    let mut ordered: Vec<(&str, f32, f32)> = ids
        .iter()
        .map(|id| {
            let pos = positions[*id];
            let size = size_for(id, sizes, fallback);
            match axis {
                Axis::Horizontal => (*id, pos.x, size.width),
                Axis::Vertical => (*id, pos.y, size.height),
            }
        })
        .collect();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let shared = ids
        .iter()
        .map(|id| match axis {
            Axis::Horizontal => positions[*id].y,
            Axis::Vertical => positions[*id].x,
        })
        .fold(f32::INFINITY, f32::min);

    let mut cursor = ordered[0].1;
    for (idx, (id, along, extent)) in ordered.into_iter().enumerate() {
        let placed = if idx == 0 { along } else { along.max(cursor) };
        let pos = match axis {
            Axis::Horizontal => NodePosition::new(placed, shared),
            Axis::Vertical => NodePosition::new(shared, placed),
        };
        out.insert(id.to_string(), pos);
        cursor = placed + extent + gap;
    }
    out
}
