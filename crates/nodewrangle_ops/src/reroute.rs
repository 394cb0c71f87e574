// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reroute insertion on the outputs of selected nodes.

use crate::error::{OperatorError, Result};
use crate::report::{OperatorStatus, Reports};
use nodewrangle_graph::catalog::{self, output_pass_enabled};
use nodewrangle_graph::{Graph, NodeId, NodeKind, SocketType};
use serde::{Deserialize, Serialize};

/// Gap between a node's right edge and its reroutes
const REROUTE_MARGIN_X: f32 = 20.0;
/// Drop from a node's top edge to its first output row
const FIRST_ROW_DROP: f32 = 35.0;
/// Ladder step next to an expanded node
const STEP_EXPANDED: f32 = -22.0;
/// Ladder step next to a collapsed node
const STEP_COLLAPSED: f32 = -16.0;

/// Which outputs receive a reroute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RerouteFilter {
    /// Every output
    #[default]
    All,
    /// Outputs without links
    Loose,
    /// Outputs with at least one link
    Linked,
}

impl RerouteFilter {
    fn accepts(&self, linked: bool) -> bool {
        match self {
            Self::All => true,
            Self::Loose => !linked,
            Self::Linked => linked,
        }
    }
}

/// Insert a reroute on each matching output of every selected node.
///
/// Each reroute takes over all links of the output it serves. The new
/// reroutes end up selected, the processed nodes deselected.
pub fn add_reroutes(graph: &mut Graph, filter: RerouteFilter, reports: &mut Reports) -> Result<OperatorStatus> {
    let selected = graph.selected_nodes();
    if selected.is_empty() {
        return Err(OperatorError::EmptySelection);
    }

    let mut created = Vec::new();
    for node_id in selected {
        created.extend(reroute_node(graph, node_id, filter)?);
        graph.set_selected(node_id, false);
    }

    if created.is_empty() {
        return Ok(OperatorStatus::PassThrough);
    }
    for id in &created {
        graph.set_selected(*id, true);
    }
    graph.set_active(created.last().copied());

    tracing::info!(count = created.len(), ?filter, "added reroutes");
    reports.info(format!("Added {} reroute(s)", created.len()));
    Ok(OperatorStatus::Finished)
}

fn reroute_node(graph: &mut Graph, node_id: NodeId, filter: RerouteFilter) -> Result<Vec<NodeId>> {
    let Some(node) = graph.node_mut(node_id) else {
        return Ok(Vec::new());
    };
    if node.outputs.is_empty() {
        return Ok(Vec::new());
    }
    let is_reroute = node.kind == NodeKind::Reroute;
    if is_reroute {
        node.hidden = false;
    }
    let hidden = node.hidden;
    let [x, top] = node.position;
    // Collapsed nodes report their collapsed width
    let width = node.size[0];

    let step = if hidden { STEP_COLLAPSED } else { STEP_EXPANDED };
    let loc_x = x + width + REROUTE_MARGIN_X;
    let mut loc_y = if is_reroute { top } else { top - FIRST_ROW_DROP };

    // Snapshot the outputs before the graph changes under us
    let outputs: Vec<(usize, SocketType, bool)> = match graph.node(node_id) {
        Some(node) => node
            .outputs
            .iter()
            .enumerate()
            .filter(|(i, _)| output_pass_enabled(node, *i))
            .map(|(i, s)| (i, s.socket_type, graph.is_linked(s.id)))
            .collect(),
        None => Vec::new(),
    };

    let mut created = Vec::new();
    let mut rows = 0usize;
    for (index, socket_type, linked) in outputs {
        if filter.accepts(linked) {
            let template = catalog::reroute(socket_type).with_position(loc_x, loc_y);
            let reroute_output = template.outputs[0].id;
            let reroute = graph.add_node(template);
            for link in graph.output_links(node_id, index) {
                graph.relink(link.id, reroute, reroute_output)?;
            }
            graph.connect_indices(node_id, index, reroute, 0)?;
            created.push(reroute);
        }
        // Skipped outputs still occupy a row
        rows += 1;
        loc_y += step;
    }

    if hidden {
        let translate = rows as f32 * step / 2.0 - step - FIRST_ROW_DROP;
        for id in &created {
            if let Some(reroute) = graph.node_mut(*id) {
                reroute.position[1] -= translate;
            }
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{downstream, link, select, sink, source};
    use nodewrangle_graph::catalog::{render_layers, RenderPass};
    use nodewrangle_graph::{Socket, SocketId, TreeType};
    use std::collections::HashSet;

    fn two_output_node() -> nodewrangle_graph::Node {
        source("Src", SocketType::Rgba, 0.0, 0.0).with_output(Socket::output("Alpha", SocketType::Value))
    }

    /// Input sockets reachable from `node`'s output `index`, looking through reroutes
    fn reached_inputs(graph: &Graph, node: NodeId, index: usize) -> HashSet<SocketId> {
        let mut found = HashSet::new();
        for link in graph.output_links(node, index) {
            match graph.node(link.to_node).map(|n| &n.kind) {
                Some(NodeKind::Reroute) => found.extend(reached_inputs(graph, link.to_node, 0)),
                _ => {
                    found.insert(link.to_socket);
                }
            }
        }
        found
    }

    #[test]
    fn test_reroute_all_outputs() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let src = graph.add_node(two_output_node());
        let out = graph.add_node(sink("Out", SocketType::Rgba, 2));
        link(&mut graph, src, 0, out, 0);
        link(&mut graph, src, 0, out, 1);
        select(&mut graph, &[src]);
        let before = reached_inputs(&graph, src, 0);

        let mut reports = Reports::new();
        let status = add_reroutes(&mut graph, RerouteFilter::All, &mut reports).unwrap();
        assert_eq!(status, OperatorStatus::Finished);

        let reroutes: Vec<NodeId> = graph
            .nodes()
            .filter(|n| n.kind == NodeKind::Reroute)
            .map(|n| n.id)
            .collect();
        assert_eq!(reroutes.len(), 2);
        assert_eq!(downstream(&graph, src, 0), vec![reroutes[0]]);
        assert_eq!(downstream(&graph, src, 1), vec![reroutes[1]]);
        assert_eq!(downstream(&graph, reroutes[0], 0), vec![out, out]);
        assert!(downstream(&graph, reroutes[1], 0).is_empty());
        assert_eq!(reached_inputs(&graph, src, 0), before);

        // Ladder to the right of the node, one row per output
        let first = graph.node(reroutes[0]).unwrap().position;
        let second = graph.node(reroutes[1]).unwrap().position;
        assert_eq!(first, [140.0 + REROUTE_MARGIN_X, -FIRST_ROW_DROP]);
        assert_eq!(second[1], first[1] + STEP_EXPANDED);

        assert!(!graph.node(src).unwrap().selected);
        assert!(reroutes.iter().all(|r| graph.node(*r).unwrap().selected));
        assert_eq!(graph.active(), Some(reroutes[1]));
    }

    #[test]
    fn test_reroute_keeps_multi_input_order() {
        let mut graph = Graph::new("T", TreeType::Geometry);
        let src = graph.add_node(source("Src", SocketType::Geometry, 0.0, 0.0));
        let other = graph.add_node(source("Other", SocketType::Geometry, 0.0, -200.0));
        let mut join = sink("Join", SocketType::Geometry, 1);
        join.inputs[0].multi_input = true;
        let join = graph.add_node(join);
        link(&mut graph, src, 0, join, 0);
        link(&mut graph, other, 0, join, 0);
        select(&mut graph, &[src]);

        add_reroutes(&mut graph, RerouteFilter::All, &mut Reports::new()).unwrap();

        let reroute = graph.active().unwrap();
        let socket = graph.node(join).unwrap().inputs[0].id;
        let sources: Vec<NodeId> = graph.links_to(socket).map(|l| l.from_node).collect();
        assert_eq!(sources, vec![reroute, other]);
    }

    #[test]
    fn test_filters() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let src = graph.add_node(two_output_node());
        let out = graph.add_node(sink("Out", SocketType::Rgba, 1));
        link(&mut graph, src, 0, out, 0);

        select(&mut graph, &[src]);
        add_reroutes(&mut graph, RerouteFilter::Loose, &mut Reports::new()).unwrap();
        let loose: Vec<_> = graph.nodes().filter(|n| n.kind == NodeKind::Reroute).collect();
        assert_eq!(loose.len(), 1);
        // Second row even though the first output was skipped
        assert_eq!(loose[0].position[1], -FIRST_ROW_DROP + STEP_EXPANDED);
        assert_eq!(downstream(&graph, src, 0), vec![out]);

        let mut graph = Graph::new("T", TreeType::Shader);
        let src = graph.add_node(two_output_node());
        let out = graph.add_node(sink("Out", SocketType::Rgba, 1));
        link(&mut graph, src, 0, out, 0);
        select(&mut graph, &[src]);
        add_reroutes(&mut graph, RerouteFilter::Linked, &mut Reports::new()).unwrap();
        assert_eq!(graph.nodes().filter(|n| n.kind == NodeKind::Reroute).count(), 1);
        assert!(downstream(&graph, src, 1).is_empty());
    }

    #[test]
    fn test_render_layers_skip_disabled_passes() {
        let mut graph = Graph::new("T", TreeType::Compositing);
        let layers = graph.add_node(render_layers([RenderPass::Combined, RenderPass::Z]));
        select(&mut graph, &[layers]);
        add_reroutes(&mut graph, RerouteFilter::All, &mut Reports::new()).unwrap();
        // Image, Alpha, Depth
        assert_eq!(graph.nodes().filter(|n| n.kind == NodeKind::Reroute).count(), 3);
    }

    #[test]
    fn test_collapsed_node_centres_reroutes() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let src = graph.add_node(two_output_node().collapsed());
        select(&mut graph, &[src]);
        let nodes_before = graph.node_count();
        add_reroutes(&mut graph, RerouteFilter::All, &mut Reports::new()).unwrap();
        assert_eq!(graph.node_count(), nodes_before + 2);

        let ys: Vec<f32> = graph
            .nodes()
            .filter(|n| n.kind == NodeKind::Reroute)
            .map(|n| n.position[1])
            .collect();
        let translate = 2.0 * STEP_COLLAPSED / 2.0 - STEP_COLLAPSED - FIRST_ROW_DROP;
        assert_eq!(ys, vec![-FIRST_ROW_DROP - translate, -FIRST_ROW_DROP + STEP_COLLAPSED - translate]);
    }

    #[test]
    fn test_no_eligible_output_passes_through() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let src = graph.add_node(source("Src", SocketType::Rgba, 0.0, 0.0));
        select(&mut graph, &[src]);
        let status = add_reroutes(&mut graph, RerouteFilter::Linked, &mut Reports::new()).unwrap();
        assert_eq!(status, OperatorStatus::PassThrough);
        assert_eq!(graph.node_count(), 1);

        select(&mut graph, &[]);
        let result = add_reroutes(&mut graph, RerouteFilter::All, &mut Reports::new());
        assert!(matches!(result, Err(OperatorError::EmptySelection)));
    }
}
