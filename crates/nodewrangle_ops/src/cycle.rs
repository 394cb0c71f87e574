// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded reachability check guarding link rewires.

use nodewrangle_graph::{Graph, Link, NodeId};
use std::collections::{HashMap, HashSet};

/// Deepest hop count the search follows
pub const MAX_DEPTH: usize = 255;

/// Whether following `link` downstream reaches any node in `targets`.
///
/// Nodes further than [`MAX_DEPTH`] hops from the link's destination are
/// not examined; a search cut off there reports no cycle.
pub fn link_creates_cycle(graph: &Graph, link: &Link, targets: &HashSet<NodeId>) -> bool {
    let mut stack = vec![(link.to_node, 0usize)];
    // Shallowest depth each node was expanded at
    let mut expanded: HashMap<NodeId, usize> = HashMap::new();
    let mut truncated = false;

    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_DEPTH {
            truncated = true;
            continue;
        }
        if targets.contains(&node) {
            return true;
        }
        if expanded.get(&node).is_some_and(|seen| *seen <= depth) {
            continue;
        }
        expanded.insert(node, depth);
        stack.extend(graph.links_leaving(node).map(|l| (l.to_node, depth + 1)));
    }

    if truncated {
        tracing::debug!(link = ?link.id, "cycle search hit the depth limit, assuming no cycle");
    }
    false
}
