// SPDX-License-Identifier: MIT OR Apache-2.0
//! Removal of nodes that contribute nothing downstream.

use crate::error::{OperatorError, Result};
use crate::report::{OperatorStatus, Reports};
use nodewrangle_graph::{Graph, NodeId, NodeKind, TreeType};
use serde::{Deserialize, Serialize};

/// Options for [`delete_unused`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteUnused {
    /// Also delete muted nodes, bridging their links
    pub delete_muted: bool,
    /// Also delete frames without members
    pub delete_frames: bool,
}

impl Default for DeleteUnused {
    fn default() -> Self {
        Self {
            delete_muted: true,
            delete_frames: true,
        }
    }
}

/// Delete nodes whose outputs feed nothing, repeating until stable
pub fn delete_unused(graph: &mut Graph, options: DeleteUnused, reports: &mut Reports) -> Result<OperatorStatus> {
    let tree = graph.tree_type();
    if tree == TreeType::Custom {
        return Err(OperatorError::WrongTree(tree));
    }
    if graph.node_count() == 0 {
        return Err(OperatorError::EmptyGraph);
    }

    let mut deleted: Vec<String> = Vec::new();

    loop {
        let unused: Vec<NodeId> = graph
            .nodes()
            .filter(|n| !n.kind.is_terminal() && !n.outputs.iter().any(|s| graph.is_linked(s.id)))
            .map(|n| n.id)
            .collect();
        if unused.is_empty() {
            break;
        }
        for id in unused {
            if let Some(node) = graph.remove_node(id) {
                deleted.push(node.name);
            }
        }
    }

    if options.delete_frames {
        // Removing an inner frame can leave its parent empty
        loop {
            let empty: Vec<NodeId> = graph
                .nodes()
                .filter(|n| n.kind == NodeKind::Frame && graph.children(n.id).is_empty())
                .map(|n| n.id)
                .collect();
            if empty.is_empty() {
                break;
            }
            for id in empty {
                if let Some(node) = graph.remove_node(id) {
                    deleted.push(node.name);
                }
            }
        }
    }

    if options.delete_muted {
        let muted: Vec<NodeId> = graph.nodes().filter(|n| n.muted).map(|n| n.id).collect();
        for id in muted {
            bridge_through(graph, id)?;
            if let Some(node) = graph.remove_node(id) {
                deleted.push(node.name);
            }
        }
    }

    for name in &deleted {
        reports.info(format!("Node {name} deleted"));
    }
    match deleted.len() {
        0 => reports.info("Nothing deleted"),
        1 => reports.info("Deleted 1 node"),
        n => reports.info(format!("Deleted {n} nodes")),
    }
    tracing::info!(count = deleted.len(), "deleted unused nodes");
    Ok(OperatorStatus::Finished)
}

/// Connect what feeds a node straight to what it feeds
pub(crate) fn bridge_through(graph: &mut Graph, node_id: NodeId) -> Result<()> {
    let Some(node) = graph.node(node_id) else {
        return Ok(());
    };
    let sources: Vec<_> = node
        .inputs
        .iter()
        .filter_map(|input| {
            graph
                .links_to(input.id)
                .next()
                .map(|l| (input.socket_type, l.from_node, l.from_socket))
        })
        .collect();
    let outgoing: Vec<_> = node
        .outputs
        .iter()
        .flat_map(|output| graph.links_from(output.id).map(move |l| (output.socket_type, l.clone())))
        .collect();

    for (socket_type, link) in outgoing {
        let source = sources
            .iter()
            .find(|(t, _, _)| *t == socket_type)
            .or_else(|| sources.first());
        if let Some(&(_, from_node, from_socket)) = source {
            if from_node == link.to_node {
                continue;
            }
            graph.relink(link.id, from_node, from_socket)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportLevel;
    use crate::test_support::{link, sink, source, upstream};
    use nodewrangle_graph::catalog::frame;
    use nodewrangle_graph::{Node, NodeCategory, Socket, SocketType};

    fn output_node() -> Node {
        Node::new("Material Output", NodeKind::Output, NodeCategory::Other)
            .with_input(Socket::input("Surface", SocketType::Shader))
    }

    #[test]
    fn test_deletes_chains_iteratively() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let used = graph.add_node(source("Used", SocketType::Shader, 0.0, 0.0));
        let out = graph.add_node(output_node());
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let b = graph.add_node(source("B", SocketType::Value, 0.0, 0.0));
        link(&mut graph, used, 0, out, 0);
        link(&mut graph, a, 0, b, 0);

        let mut reports = Reports::new();
        delete_unused(&mut graph, DeleteUnused::default(), &mut reports).unwrap();

        assert!(graph.contains_node(used));
        assert!(graph.contains_node(out));
        assert!(!graph.contains_node(a));
        assert!(!graph.contains_node(b));
        let messages: Vec<&str> = reports.with_level(ReportLevel::Info).map(|r| r.message.as_str()).collect();
        assert!(messages.contains(&"Node A deleted"));
        assert_eq!(messages.last(), Some(&"Deleted 2 nodes"));
    }

    #[test]
    fn test_nested_empty_frames() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let out = graph.add_node(output_node());
        let outer = graph.add_node(frame("Outer", None));
        let inner = graph.add_node(frame("Inner", None));
        graph.set_parent(inner, Some(outer)).unwrap();
        let kept = graph.add_node(frame("Kept", None));
        graph.set_parent(out, Some(kept)).unwrap();

        delete_unused(&mut graph, DeleteUnused::default(), &mut Reports::new()).unwrap();
        assert!(!graph.contains_node(inner));
        assert!(!graph.contains_node(outer));
        assert!(graph.contains_node(kept));

        let mut graph = Graph::new("T", TreeType::Shader);
        graph.add_node(output_node());
        let lone = graph.add_node(frame("Lone", None));
        let options = DeleteUnused {
            delete_frames: false,
            ..DeleteUnused::default()
        };
        let mut reports = Reports::new();
        delete_unused(&mut graph, options, &mut reports).unwrap();
        assert!(graph.contains_node(lone));
        assert_eq!(reports.entries().last().unwrap().message, "Nothing deleted");
    }

    #[test]
    fn test_muted_nodes_are_bridged() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let mut muted = source("Muted", SocketType::Value, 0.0, 0.0);
        muted.muted = true;
        let muted = graph.add_node(muted);
        let out = graph.add_node(sink("Out", SocketType::Value, 1));
        let mut out_node = graph.node(out).unwrap().clone();
        out_node.kind = NodeKind::Output;
        *graph.node_mut(out).unwrap() = out_node;
        link(&mut graph, a, 0, muted, 0);
        link(&mut graph, muted, 0, out, 0);

        delete_unused(&mut graph, DeleteUnused::default(), &mut Reports::new()).unwrap();
        assert!(!graph.contains_node(muted));
        assert_eq!(upstream(&graph, out, 0), Some(a));
    }

    #[test]
    fn test_custom_tree_cancelled() {
        let mut graph = Graph::new("T", TreeType::Custom);
        graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let result = delete_unused(&mut graph, DeleteUnused::default(), &mut Reports::new());
        assert!(matches!(result, Err(OperatorError::WrongTree(_))));
    }
}
