// SPDX-License-Identifier: MIT OR Apache-2.0
//! Row/column alignment of a node selection.

use crate::error::{OperatorError, Result};
use crate::report::{OperatorStatus, Reports};
use nodewrangle_graph::{Graph, NodeId, NodeKind};

/// Share of the margin used between vertically stacked nodes
const VERTICAL_MARGIN_FACTOR: f32 = 0.3;

/// Lay the selected nodes out in a row or column.
///
/// Frames never take part. With nothing selected every node is aligned.
/// Only positions change.
pub fn align_nodes(graph: &mut Graph, margin: i32, reports: &mut Reports) -> Result<OperatorStatus> {
    let mut selection: Vec<NodeId> = graph
        .nodes()
        .filter(|n| n.selected && n.kind != NodeKind::Frame)
        .map(|n| n.id)
        .collect();
    let active_position = graph
        .active()
        .filter(|id| selection.contains(id))
        .and_then(|id| graph.node(id).map(|n| (id, n.position)));
    if selection.is_empty() {
        selection = graph
            .nodes()
            .filter(|n| n.kind != NodeKind::Frame)
            .map(|n| n.id)
            .collect();
    }
    if selection.is_empty() {
        return Err(OperatorError::EmptyGraph);
    }

    let centers: Vec<(NodeId, [f32; 2])> = selection
        .iter()
        .filter_map(|id| graph.node(*id).map(|n| (*id, n.center())))
        .collect();
    let (min_x, max_x) = extent(centers.iter().map(|(_, c)| c[0]));
    let (min_y, max_y) = extent(centers.iter().map(|(_, c)| c[1]));
    let mid_x = (max_x + min_x) / 2.0;
    let mid_y = (max_y + min_y) / 2.0;
    let horizontal = max_x - min_x > max_y - min_y;

    let mut order = centers;
    if horizontal {
        order.sort_by(|a, b| a.1[0].total_cmp(&b.1[0]));
    } else {
        order.sort_by(|a, b| b.1[1].total_cmp(&a.1[1]));
    }

    let margin = margin as f32;
    let mut cursor = 0.0;
    for (id, _) in &order {
        let Some(node) = graph.node_mut(*id) else {
            continue;
        };
        let gap = if node.hidden { margin * 0.5 } else { margin };
        let [width, height] = node.size;
        if horizontal {
            node.position = [cursor, mid_y + height / 2.0];
            cursor += gap + width;
        } else {
            node.position = [mid_x - width / 2.0, cursor];
            cursor -= gap * VERTICAL_MARGIN_FACTOR + height;
        }
    }

    let shift = match active_position.and_then(|(id, old)| graph.node(id).map(|n| (old, n.position))) {
        Some((old, new)) => [old[0] - new[0], old[1] - new[1]],
        None => {
            let axis = usize::from(!horizontal);
            let (low, high) = extent(
                order
                    .iter()
                    .filter_map(|(id, _)| graph.node(*id).map(|n| n.center()[axis])),
            );
            let new_mid = (high + low) / 2.0;
            if horizontal {
                [mid_x - new_mid, 0.0]
            } else {
                [0.0, mid_y - new_mid]
            }
        }
    };
    for (id, _) in &order {
        if let Some(node) = graph.node_mut(*id) {
            node.position[0] += shift[0];
            node.position[1] += shift[1];
        }
    }

    tracing::info!(count = order.len(), horizontal, "aligned nodes");
    reports.info(format!(
        "Aligned {} node(s) in a {}",
        order.len(),
        if horizontal { "row" } else { "column" }
    ));
    Ok(OperatorStatus::Finished)
}

fn extent(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), v| (low.min(v), high.max(v)))
}
