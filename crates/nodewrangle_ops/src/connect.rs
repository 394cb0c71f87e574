// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket-picking link helpers.

use crate::cleanup::bridge_through;
use crate::error::{OperatorError, Result};
use crate::report::{OperatorStatus, Reports};
use nodewrangle_graph::catalog::{self, output_pass_enabled, render_output_names};
use nodewrangle_graph::{Graph, Link, NodeId, NodeKind, Socket, SocketId, SocketType, TreeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gap between the active node and an output node created for it
const OUTPUT_MARGIN_X: f32 = 80.0;

/// Link `from` to `to`, choosing the sockets automatically.
///
/// Tries in order: a free input named like an output, a free input of an
/// output's type, any free input fed by the first output, any input of an
/// output's type, any input at all. Only enabled sockets take part.
/// Returns whether a link was made.
pub fn autolink(graph: &mut Graph, from: NodeId, to: NodeId) -> Result<bool> {
    let outputs: Vec<Socket> = enabled_sockets(graph, from, true);
    let inputs: Vec<(Socket, bool)> = enabled_sockets(graph, to, false)
        .into_iter()
        .map(|s| {
            let linked = graph.is_linked(s.id);
            (s, linked)
        })
        .collect();

    let pairs = || outputs.iter().flat_map(|o| inputs.iter().map(move |(i, linked)| (o, i, *linked)));
    let choice = pairs()
        .find(|(o, i, linked)| !linked && i.name == o.name)
        .or_else(|| pairs().find(|(o, i, linked)| !linked && i.socket_type == o.socket_type))
        .or_else(|| {
            let first = outputs.first()?;
            inputs.iter().find(|(_, linked)| !linked).map(|(i, _)| (first, i, false))
        })
        .or_else(|| pairs().find(|(o, i, _)| i.socket_type == o.socket_type))
        .or_else(|| pairs().next())
        .map(|(o, i, _)| (o.id, i.id));

    let Some((output, input)) = choice else {
        tracing::debug!(?from, ?to, "no sockets to link");
        return Ok(false);
    };
    graph.connect(from, output, to, input)?;
    Ok(true)
}

fn enabled_sockets(graph: &Graph, node: NodeId, outputs: bool) -> Vec<Socket> {
    let Some(node) = graph.node(node) else {
        return Vec::new();
    };
    let sockets = if outputs { &node.outputs } else { &node.inputs };
    sockets.iter().filter(|s| s.enabled).cloned().collect()
}

/// Link output `output` of the node named `from` to input `input` of the
/// node named `to`
pub fn make_link(graph: &mut Graph, from: &str, output: usize, to: &str, input: usize) -> Result<OperatorStatus> {
    let from_id = graph
        .node_by_name(from)
        .map(|n| n.id)
        .ok_or_else(|| OperatorError::MissingNode(from.to_string()))?;
    let to_id = graph
        .node_by_name(to)
        .map(|n| n.id)
        .ok_or_else(|| OperatorError::MissingNode(to.to_string()))?;
    graph.connect_indices(from_id, output, to_id, input)?;
    Ok(OperatorStatus::Finished)
}

/// Options for [`link_active_to_selected`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkActiveOptions {
    /// Replace existing input links
    pub replace: bool,
    /// Only link nodes whose label/name equals the active node's
    pub use_node_name: bool,
    /// Only link nodes whose label/name equals the output's name
    pub use_outputs_names: bool,
}

/// Link outputs of the active node into the selected nodes.
///
/// Without name matching only the first output that links anywhere is
/// used. Each selected node receives at most one link per output, into
/// its first input of the output's type (any input for reroutes).
pub fn link_active_to_selected(
    graph: &mut Graph,
    options: LinkActiveOptions,
    reports: &mut Reports,
) -> Result<OperatorStatus> {
    let active = graph
        .active()
        .filter(|id| graph.node(*id).is_some_and(|n| n.selected))
        .ok_or(OperatorError::NoActiveNode)?;
    let Some(active_node) = graph.node(active) else {
        return Err(OperatorError::NoActiveNode);
    };
    let active_name = active_node.display_name().to_string();
    let outputs: Vec<Socket> = active_node
        .outputs
        .iter()
        .enumerate()
        .filter(|(i, _)| output_pass_enabled(active_node, *i))
        .map(|(_, s)| s.clone())
        .collect();
    let targets: Vec<NodeId> = graph
        .selected_nodes()
        .into_iter()
        .filter(|id| *id != active)
        .collect();

    let mut made = 0;
    for output in &outputs {
        let accepted: Vec<String> = if options.use_node_name {
            vec![active_name.clone()]
        } else if options.use_outputs_names {
            match render_output_names(&output.name) {
                Some((name, exr)) => vec![name.to_string(), exr.to_string()],
                None => vec![output.name.clone()],
            }
        } else {
            Vec::new()
        };
        let name_matching = options.use_node_name || options.use_outputs_names;

        let mut linked_any = false;
        for target in &targets {
            let Some(node) = graph.node(*target) else { continue };
            if name_matching && !accepted.iter().any(|n| n == node.display_name()) {
                continue;
            }
            let is_reroute = node.kind == NodeKind::Reroute;
            let input = node
                .inputs
                .iter()
                .find(|i| {
                    (i.socket_type == output.socket_type || is_reroute)
                        && (options.replace || !graph.is_linked(i.id))
                })
                .map(|i| i.id);
            if let Some(input) = input {
                graph.connect(active, output.id, *target, input)?;
                linked_any = true;
                made += 1;
            }
        }
        if linked_any && !name_matching {
            break;
        }
    }

    tracing::info!(links = made, "linked active node to selection");
    if made == 0 {
        reports.info("No matching inputs to link");
    }
    Ok(OperatorStatus::Finished)
}

/// Link the active node into the tree's output node.
///
/// Uses the first enabled output whose type matches the output node's
/// first input, else the first enabled output. Shader `Volume` and
/// `Displacement` outputs land on the inputs of the same name. When the
/// tree has no output node one is created to the right of the active
/// node. Geometry trees only take geometry.
pub fn link_to_output(graph: &mut Graph, reports: &mut Reports) -> Result<OperatorStatus> {
    let tree = graph.tree_type();
    let template = catalog::output_node(tree).ok_or(OperatorError::WrongTree(tree))?;
    let active = graph.active().ok_or(OperatorError::NoActiveNode)?;
    let Some(active_node) = graph.node(active) else {
        return Err(OperatorError::NoActiveNode);
    };

    let existing = graph.nodes().find(|n| n.kind == template.kind).map(|n| n.id);
    let wanted = existing
        .and_then(|id| graph.node(id))
        .unwrap_or(&template)
        .inputs
        .first()
        .map(|s| s.socket_type);
    let visible: Vec<(usize, &Socket)> = active_node
        .outputs
        .iter()
        .enumerate()
        .filter(|(i, s)| s.enabled && output_pass_enabled(active_node, *i))
        .collect();
    let Some(&(output_index, output)) = visible
        .iter()
        .find(|(_, s)| Some(s.socket_type) == wanted)
        .or_else(|| visible.first())
    else {
        return Err(OperatorError::NoOutputs);
    };

    if tree == TreeType::Geometry && output.socket_type != SocketType::Geometry {
        reports.warning("Only geometry can be linked to the group output");
        return Ok(OperatorStatus::Cancelled);
    }
    let input_index = match (tree, output.name.as_str()) {
        (TreeType::Shader, "Volume") => 1,
        (TreeType::Shader, "Displacement") => 2,
        _ => 0,
    };
    let [x, y] = active_node.position;
    let location = [x + active_node.size[0] + OUTPUT_MARGIN_X, y];

    let output_node = match existing {
        Some(id) => id,
        None => {
            graph.deselect_all();
            let id = graph.add_node(template.with_position(location[0], location[1]).selected());
            tracing::debug!(?tree, "created output node");
            id
        }
    };
    graph.connect_indices(active, output_index, output_node, input_index)?;
    tracing::info!(output = output_index, input = input_index, "linked to output");
    Ok(OperatorStatus::Finished)
}

/// Replace the selected nodes with copies that keep their input links
/// and feed nothing.
///
/// Links between selected nodes are copied along. Whatever fed an
/// original now feeds its former destinations directly. The copies end
/// up selected.
pub fn detach_outputs(graph: &mut Graph) -> Result<OperatorStatus> {
    let selected = graph.selected_nodes();
    if selected.is_empty() {
        return Err(OperatorError::EmptySelection);
    }
    let active = graph.active();

    let mut copies: HashMap<NodeId, NodeId> = HashMap::new();
    let mut sockets: HashMap<SocketId, SocketId> = HashMap::new();
    for id in &selected {
        let Some(node) = graph.node(*id) else { continue };
        let copy = node.duplicate();
        sockets.extend(node.sockets().zip(copy.sockets()).map(|(old, new)| (old.id, new.id)));
        copies.insert(*id, graph.add_node(copy));
    }
    for (original, copy) in &copies {
        let parent = graph.node(*original).and_then(|n| n.parent());
        if let Some(&copied_parent) = parent.and_then(|p| copies.get(&p)) {
            graph.set_parent(*copy, Some(copied_parent))?;
        }
    }

    let incoming: Vec<Link> = graph
        .links()
        .filter(|l| copies.contains_key(&l.to_node))
        .cloned()
        .collect();
    for link in incoming {
        let (Some(&to_node), Some(&to_socket)) = (copies.get(&link.to_node), sockets.get(&link.to_socket)) else {
            continue;
        };
        let from = match copies.get(&link.from_node) {
            Some(copy) => sockets.get(&link.from_socket).map(|socket| (*copy, *socket)),
            None => Some((link.from_node, link.from_socket)),
        };
        if let Some((from_node, from_socket)) = from {
            graph.connect(from_node, from_socket, to_node, to_socket)?;
        }
    }

    for id in &selected {
        bridge_through(graph, *id)?;
        let Some(original) = graph.remove_node(*id) else { continue };
        if let Some(copy) = copies.get(id).and_then(|copy| graph.node_mut(*copy)) {
            copy.name = original.name;
        }
    }

    graph.deselect_all();
    for copy in copies.values() {
        graph.set_selected(*copy, true);
    }
    if let Some(copy) = active.and_then(|id| copies.get(&id)) {
        graph.set_active(Some(*copy));
    }
    tracing::info!(count = copies.len(), "detached outputs");
    Ok(OperatorStatus::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{link, select, sink, source, upstream};
    use nodewrangle_graph::catalog::{render_layers, reroute, RenderPass};
    use nodewrangle_graph::{Node, NodeCategory, SocketType, TreeType};

    #[test]
    fn test_autolink_prefers_matching_name() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let tex = graph.add_node(
            source("Tex", SocketType::Rgba, 0.0, 0.0).with_output(Socket::output("Alpha", SocketType::Value)),
        );
        let mut target = sink("Target", SocketType::Value, 1);
        target.inputs.push(Socket::input("Alpha", SocketType::Value));
        let target = graph.add_node(target);

        assert!(autolink(&mut graph, tex, target).unwrap());
        let alpha = graph.node(target).unwrap().inputs[1].id;
        let link = graph.links_to(alpha).next().unwrap();
        assert_eq!(graph.node(tex).unwrap().output_index(link.from_socket), Some(1));
    }

    #[test]
    fn test_autolink_falls_back_in_order() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let a = graph.add_node(source("A", SocketType::Rgba, 0.0, 0.0));
        let b = graph.add_node(source("B", SocketType::Shader, 0.0, 0.0));
        let x = graph.add_node(source("X", SocketType::Value, 0.0, 0.0));

        // Type mismatch, free input: forced link from the first output
        assert!(autolink(&mut graph, a, b).unwrap());
        assert_eq!(upstream(&graph, b, 0), Some(a));

        // Occupied input of another type: still linked, replacing
        assert!(autolink(&mut graph, x, b).unwrap());
        assert_eq!(upstream(&graph, b, 0), Some(x));

        // Nothing to link into
        let mut bare = source("Bare", SocketType::Value, 0.0, 0.0);
        bare.inputs.clear();
        let bare = graph.add_node(bare);
        assert!(!autolink(&mut graph, a, bare).unwrap());
    }

    #[test]
    fn test_autolink_skips_disabled_sockets() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let mut target = Node::new("T", NodeKind::Generic, NodeCategory::Other)
            .with_input(Socket::input("Hidden", SocketType::Value).disabled())
            .with_input(Socket::input("Shown", SocketType::Value));
        target.position = [300.0, 0.0];
        let target = graph.add_node(target);
        autolink(&mut graph, a, target).unwrap();
        assert_eq!(upstream(&graph, target, 1), Some(a));
        assert_eq!(upstream(&graph, target, 0), None);
    }

    #[test]
    fn test_make_link_by_name() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let b = graph.add_node(sink("B", SocketType::Value, 2));
        make_link(&mut graph, "A", 0, "B", 1).unwrap();
        assert_eq!(upstream(&graph, b, 1), Some(a));
        assert!(matches!(
            make_link(&mut graph, "A", 0, "Missing", 0),
            Err(OperatorError::MissingNode(_))
        ));
        assert!(matches!(
            make_link(&mut graph, "A", 3, "B", 0),
            Err(OperatorError::Connection(_))
        ));
    }

    #[test]
    fn test_link_active_first_output_only() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let active = graph.add_node(
            source("Tex", SocketType::Rgba, 0.0, 0.0).with_output(Socket::output("Alpha", SocketType::Value)),
        );
        let colour = graph.add_node(sink("Colour", SocketType::Rgba, 1));
        let value = graph.add_node(sink("Value", SocketType::Value, 1));
        let route = graph.add_node(reroute(SocketType::Vector));
        select(&mut graph, &[active, colour, value, route]);
        graph.set_active(Some(active));

        link_active_to_selected(&mut graph, LinkActiveOptions::default(), &mut Reports::new()).unwrap();
        assert_eq!(upstream(&graph, colour, 0), Some(active));
        assert_eq!(upstream(&graph, route, 0), Some(active));
        // Stopped after the first output made links
        assert_eq!(upstream(&graph, value, 0), None);
    }

    #[test]
    fn test_link_active_respects_replace() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let other = graph.add_node(source("Other", SocketType::Value, 0.0, 0.0));
        let active = graph.add_node(source("Active", SocketType::Value, 0.0, 0.0));
        let target = graph.add_node(sink("Target", SocketType::Value, 1));
        link(&mut graph, other, 0, target, 0);
        select(&mut graph, &[active, target]);
        graph.set_active(Some(active));

        link_active_to_selected(&mut graph, LinkActiveOptions::default(), &mut Reports::new()).unwrap();
        assert_eq!(upstream(&graph, target, 0), Some(other));

        let options = LinkActiveOptions {
            replace: true,
            ..LinkActiveOptions::default()
        };
        link_active_to_selected(&mut graph, options, &mut Reports::new()).unwrap();
        assert_eq!(upstream(&graph, target, 0), Some(active));
    }

    #[test]
    fn test_link_active_by_output_names() {
        let mut graph = Graph::new("T", TreeType::Compositing);
        let layers = graph.add_node(render_layers([RenderPass::Combined, RenderPass::Z]));
        let mut z = sink("Z", SocketType::Value, 1);
        z.label = "Z".into();
        let z = graph.add_node(z);
        let mut mist = sink("Mist", SocketType::Value, 1);
        mist.label = "Mist".into();
        let mist = graph.add_node(mist);
        select(&mut graph, &[layers, z, mist]);
        graph.set_active(Some(layers));

        let options = LinkActiveOptions {
            use_outputs_names: true,
            ..LinkActiveOptions::default()
        };
        link_active_to_selected(&mut graph, options, &mut Reports::new()).unwrap();
        let depth = graph.node(layers).unwrap().outputs.iter().position(|s| s.name == "Depth");
        let link = graph.links_to(graph.node(z).unwrap().inputs[0].id).next().unwrap();
        assert_eq!(graph.node(layers).unwrap().output_index(link.from_socket), depth);
        // Mist pass is disabled
        assert_eq!(upstream(&graph, mist, 0), None);
    }

    #[test]
    fn test_link_to_output_creates_output_once() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let bsdf = graph.add_node(source("BSDF", SocketType::Shader, 0.0, 0.0).selected());
        graph.set_active(Some(bsdf));

        let status = link_to_output(&mut graph, &mut Reports::new()).unwrap();
        assert_eq!(status, OperatorStatus::Finished);
        let output = graph.node_by_name("Material Output").unwrap();
        assert_eq!(output.position, [140.0 + OUTPUT_MARGIN_X, 0.0]);
        assert!(output.selected);
        assert!(!graph.node(bsdf).unwrap().selected);
        let output = output.id;
        assert_eq!(upstream(&graph, output, 0), Some(bsdf));

        link_to_output(&mut graph, &mut Reports::new()).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_link_to_output_routes_volume_and_displacement() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let output = graph.add_node(catalog::output_node(TreeType::Shader).unwrap());
        let volume = graph.add_node(
            Node::new("Volume", NodeKind::Generic, NodeCategory::Shader)
                .with_output(Socket::output("Color", SocketType::Rgba))
                .with_output(Socket::output("Volume", SocketType::Shader)),
        );
        let displace = graph.add_node(
            Node::new("Displace", NodeKind::Generic, NodeCategory::Vector)
                .with_output(Socket::output("Displacement", SocketType::Vector)),
        );

        graph.set_active(Some(volume));
        link_to_output(&mut graph, &mut Reports::new()).unwrap();
        graph.set_active(Some(displace));
        link_to_output(&mut graph, &mut Reports::new()).unwrap();

        assert_eq!(upstream(&graph, output, 0), None);
        assert_eq!(upstream(&graph, output, 1), Some(volume));
        assert_eq!(upstream(&graph, output, 2), Some(displace));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_link_to_output_geometry_only_takes_geometry() {
        let mut graph = Graph::new("T", TreeType::Geometry);
        let value = graph.add_node(source("Value", SocketType::Value, 0.0, 0.0));
        graph.set_active(Some(value));
        let mut reports = Reports::new();
        let status = link_to_output(&mut graph, &mut reports).unwrap();
        assert_eq!(status, OperatorStatus::Cancelled);
        assert_eq!(reports.warning_count(), 1);
        assert_eq!((graph.node_count(), graph.link_count()), (1, 0));

        let mesh = graph.add_node(source("Mesh", SocketType::Geometry, 0.0, -200.0));
        graph.set_active(Some(mesh));
        link_to_output(&mut graph, &mut Reports::new()).unwrap();
        let group_output = graph.nodes().find(|n| n.kind == NodeKind::GroupOutput).unwrap().id;
        assert_eq!(upstream(&graph, group_output, 0), Some(mesh));
    }

    #[test]
    fn test_link_to_output_preconditions() {
        let mut graph = Graph::new("T", TreeType::Compositing);
        let mut bare = source("Bare", SocketType::Rgba, 0.0, 0.0);
        bare.outputs.clear();
        let bare = graph.add_node(bare);
        let mut reports = Reports::new();
        assert!(matches!(link_to_output(&mut graph, &mut reports), Err(OperatorError::NoActiveNode)));
        graph.set_active(Some(bare));
        assert!(matches!(link_to_output(&mut graph, &mut reports), Err(OperatorError::NoOutputs)));

        let mut graph = Graph::new("T", TreeType::Custom);
        let a = graph.add_node(source("A", SocketType::Rgba, 0.0, 0.0));
        graph.set_active(Some(a));
        assert!(matches!(
            link_to_output(&mut graph, &mut reports),
            Err(OperatorError::WrongTree(TreeType::Custom))
        ));
    }

    #[test]
    fn test_detach_outputs_bridges_and_keeps_inputs() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let feed = graph.add_node(source("Feed", SocketType::Value, 0.0, 0.0));
        let node = graph.add_node(source("Node", SocketType::Value, 200.0, 0.0));
        let out = graph.add_node(sink("Out", SocketType::Value, 1));
        link(&mut graph, feed, 0, node, 0);
        link(&mut graph, node, 0, out, 0);
        select(&mut graph, &[node]);
        graph.set_active(Some(node));

        assert_eq!(detach_outputs(&mut graph).unwrap(), OperatorStatus::Finished);

        assert!(!graph.contains_node(node));
        let copy = graph.active().unwrap();
        assert_eq!(graph.node(copy).unwrap().name, "Node");
        assert_eq!(graph.selected_nodes(), vec![copy]);
        assert_eq!(upstream(&graph, copy, 0), Some(feed));
        assert!(graph.links_leaving(copy).next().is_none());
        assert_eq!(upstream(&graph, out, 0), Some(feed));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_detach_outputs_copies_internal_links() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let feed = graph.add_node(source("Feed", SocketType::Value, 0.0, 0.0));
        let first = graph.add_node(source("First", SocketType::Value, 200.0, 0.0));
        let second = graph.add_node(source("Second", SocketType::Value, 400.0, 0.0));
        let out = graph.add_node(sink("Out", SocketType::Value, 1));
        link(&mut graph, feed, 0, first, 0);
        link(&mut graph, first, 0, second, 0);
        link(&mut graph, second, 0, out, 0);
        select(&mut graph, &[first, second]);

        detach_outputs(&mut graph).unwrap();

        let copy_of = |name: &str| graph.node_by_name(name).unwrap().id;
        let (first, second) = (copy_of("First"), copy_of("Second"));
        assert_eq!(upstream(&graph, first, 0), Some(feed));
        assert_eq!(upstream(&graph, second, 0), Some(first));
        assert_eq!(upstream(&graph, out, 0), Some(feed));
        assert_eq!(graph.link_count(), 3);

        select(&mut graph, &[]);
        assert!(matches!(detach_outputs(&mut graph), Err(OperatorError::EmptySelection)));
    }

    #[test]
    fn test_detach_outputs_inside_loop() {
        let mut graph = Graph::new("T", TreeType::Compositing);
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        let b = graph.add_node(source("B", SocketType::Value, 200.0, 0.0));
        link(&mut graph, a, 0, b, 0);
        link(&mut graph, b, 0, a, 0);
        select(&mut graph, &[b]);

        detach_outputs(&mut graph).unwrap();

        let copy = graph.node_by_name("B").unwrap().id;
        assert_eq!(upstream(&graph, copy, 0), Some(a));
        assert_eq!(upstream(&graph, a, 0), None);
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_link_active_requires_selected_active() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let a = graph.add_node(source("A", SocketType::Value, 0.0, 0.0));
        graph.set_active(Some(a));
        let result = link_active_to_selected(&mut graph, LinkActiveOptions::default(), &mut Reports::new());
        assert!(matches!(result, Err(OperatorError::NoActiveNode)));
    }
}
