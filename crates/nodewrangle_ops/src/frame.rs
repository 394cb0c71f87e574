// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wrap the selection in a new frame.

use crate::error::{OperatorError, Result};
use crate::report::OperatorStatus;
use nodewrangle_graph::{catalog, Graph, NodeId};

/// Padding between a frame's border and its members
const FRAME_PADDING: f32 = 20.0;
/// Room for the frame's label above its members
const LABEL_HEIGHT: f32 = 20.0;

/// Add a frame around the selected nodes and parent them to it.
///
/// The frame becomes the active node.
pub fn frame_selected(graph: &mut Graph, label: &str, color: Option<[f32; 3]>) -> Result<OperatorStatus> {
    let selected = graph.selected_nodes();
    if selected.is_empty() {
        return Err(OperatorError::EmptySelection);
    }

    let (mut left, mut top) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut right, mut bottom) = (f32::NEG_INFINITY, f32::INFINITY);
    for node in selected.iter().filter_map(|id| graph.node(*id)) {
        left = left.min(node.position[0]);
        top = top.max(node.position[1]);
        right = right.max(node.position[0] + node.size[0]);
        bottom = bottom.min(node.position[1] - node.size[1]);
    }

    let frame = catalog::frame(label, color)
        .with_position(left - FRAME_PADDING, top + FRAME_PADDING + LABEL_HEIGHT)
        .with_size(
            right - left + 2.0 * FRAME_PADDING,
            top - bottom + 2.0 * FRAME_PADDING + LABEL_HEIGHT,
        );
    let frame: NodeId = graph.add_node(frame);
    for id in &selected {
        graph.set_parent(*id, Some(frame))?;
    }
    graph.set_active(Some(frame));

    tracing::info!(members = selected.len(), label, "framed selection");
    Ok(OperatorStatus::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{select, source};
    use nodewrangle_graph::{NodeKind, SocketType, TreeType};

    #[test]
    fn test_frame_encloses_selection() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let b = graph.add_node(source("B", SocketType::Value, 300.0, -200.0));
        let c = graph.add_node(source("C", SocketType::Value, 900.0, 0.0));
        select(&mut graph, &[a, b]);

        frame_selected(&mut graph, "Inputs", Some([0.2, 0.4, 0.6])).unwrap();

        let frame_id = graph.active().unwrap();
        let frame = graph.node(frame_id).unwrap();
        assert_eq!(frame.kind, NodeKind::Frame);
        assert_eq!(frame.label, "Inputs");
        assert_eq!(frame.color, Some([0.2, 0.4, 0.6]));
        for id in [a, b] {
            let node = graph.node(id).unwrap();
            assert_eq!(node.parent(), Some(frame_id));
            assert!(frame.contains(node.center()));
        }
        assert_eq!(graph.node(c).unwrap().parent(), None);
    }

    #[test]
    fn test_nested_frames() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        select(&mut graph, &[a]);
        frame_selected(&mut graph, "Inner", None).unwrap();
        let inner = graph.active().unwrap();
        select(&mut graph, &[inner]);
        frame_selected(&mut graph, "Outer", None).unwrap();
        let outer = graph.active().unwrap();

        assert_eq!(graph.node(inner).unwrap().parent(), Some(outer));
        assert_eq!(graph.node(a).unwrap().parent(), Some(inner));
    }

    #[test]
    fn test_empty_selection_cancels() {
        let mut graph = Graph::new("T", TreeType::Shader);
        assert!(matches!(
            frame_selected(&mut graph, "", None),
            Err(OperatorError::EmptySelection)
        ));
    }
}
