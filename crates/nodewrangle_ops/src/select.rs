// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection growth along frame membership.

use crate::error::{OperatorError, Result};
use crate::report::OperatorStatus;
use nodewrangle_graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};

/// Direction to grow the selection in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectRelative {
    /// Frames containing selected nodes
    #[default]
    Parent,
    /// Direct members of selected frames
    Child,
}

/// Add the parents or children of the selected nodes to the selection
pub fn select_parent_children(graph: &mut Graph, relative: SelectRelative) -> Result<OperatorStatus> {
    let selected = graph.selected_nodes();
    if selected.is_empty() {
        return Err(OperatorError::EmptySelection);
    }

    let extra: Vec<NodeId> = match relative {
        SelectRelative::Parent => selected
            .iter()
            .filter_map(|id| graph.node(*id).and_then(|n| n.parent()))
            .collect(),
        SelectRelative::Child => selected.iter().flat_map(|id| graph.children(*id)).collect(),
    };
    for id in extra {
        graph.set_selected(id, true);
    }
    Ok(OperatorStatus::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{select, source};
    use nodewrangle_graph::catalog::frame;
    use nodewrangle_graph::{SocketType, TreeType};

    #[test]
    fn test_parent_and_children() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let outer = graph.add_node(frame("Outer", None));
        let inner = graph.add_node(frame("Inner", None));
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let b = graph.add_node(source("B", SocketType::Value, 0.0, 0.0));
        graph.set_parent(inner, Some(outer)).unwrap();
        graph.set_parent(a, Some(inner)).unwrap();
        graph.set_parent(b, Some(inner)).unwrap();

        select(&mut graph, &[a]);
        select_parent_children(&mut graph, SelectRelative::Parent).unwrap();
        assert_eq!(graph.selected_nodes(), vec![inner, a]);

        select(&mut graph, &[outer]);
        select_parent_children(&mut graph, SelectRelative::Child).unwrap();
        assert_eq!(graph.selected_nodes(), vec![outer, inner]);

        select(&mut graph, &[inner]);
        select_parent_children(&mut graph, SelectRelative::Child).unwrap();
        assert_eq!(graph.selected_nodes(), vec![inner, a, b]);
    }
}
