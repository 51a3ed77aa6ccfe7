use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use crate::ir::Edge;

/// Longest-path layering over a Kahn traversal. Every id in `node_ids` gets a
/// layer; ids never released by the traversal (cycle members and anything
/// downstream of them) are spread over extra layers after the deepest one,
/// `bucket_size` per layer.
pub(super) fn compute_layers(
    node_ids: &[String],
    edges: &[Edge],
    bucket_size: usize,
) -> HashMap<String, usize> {
    let known: HashSet<&str> = node_ids.iter().map(String::as_str).collect();

    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = HashMap::new();
    for id in node_ids {
        outgoing.insert(id.as_str(), Vec::new());
        indeg.insert(id.as_str(), 0);
    }
    for edge in edges {
        let src = edge.src.trim();
        let dst = edge.dst.trim();
        if !known.contains(src) || !known.contains(dst) {
            continue;
        }
        if let Some(list) = outgoing.get_mut(src) {
            list.push(dst);
        }
        if let Some(deg) = indeg.get_mut(dst) {
            *deg += 1;
        }
    }
    for list in outgoing.values_mut() {
        list.sort_unstable();
    }

    let mut layer: HashMap<&str, usize> = HashMap::new();
    let mut ready: BinaryHeap<Reverse<&str>> = BinaryHeap::new();
    for id in node_ids {
        if indeg.get(id.as_str()).copied().unwrap_or(0) == 0 {
            layer.insert(id.as_str(), 0);
            ready.push(Reverse(id.as_str()));
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    while let Some(Reverse(id)) = ready.pop() {
        visited.insert(id);
        let base = layer.get(id).copied().unwrap_or(0);
        let Some(nexts) = outgoing.get(id) else {
            continue;
        };
        for &next in nexts {
            let entry = layer.entry(next).or_insert(0);
            *entry = (*entry).max(base + 1);
            if let Some(deg) = indeg.get_mut(next) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
    }

    // Partially relaxed cycle members still count towards the deepest layer.
    let max_layer = layer.values().copied().max().unwrap_or(0);
    let bucket_size = bucket_size.max(1);
    let unresolved: BTreeSet<&str> = node_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !visited.contains(id))
        .collect();
    for (idx, id) in unresolved.into_iter().enumerate() {
        layer.insert(id, max_layer + 1 + idx / bucket_size);
    }

    layer
        .into_iter()
        .map(|(id, rank)| (id.to_string(), rank))
        .collect()
}

/// Group ids by layer, each bucket sorted.
pub(super) fn bucket_by_layer(layers: &HashMap<String, usize>) -> Vec<Vec<String>> {
    let depth = layers.values().copied().max().map_or(0, |max| max + 1);
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); depth];
    for (id, rank) in layers {
        buckets[*rank].push(id.clone());
    }
    for bucket in &mut buckets {
        bucket.sort();
    }
    buckets
}
