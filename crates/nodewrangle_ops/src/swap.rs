// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link endpoint exchange between two nodes or within one node.

use crate::error::{OperatorError, Result};
use crate::report::{OperatorStatus, Reports};
use nodewrangle_graph::{Graph, NodeId, SocketId, SocketType};

/// Swap links for the current selection.
///
/// Two selected nodes exchange their outgoing links; a single selected
/// node exchanges the sources of two of its inputs.
pub fn swap_links(graph: &mut Graph, reports: &mut Reports) -> Result<OperatorStatus> {
    match graph.selected_nodes().as_slice() {
        [] => Err(OperatorError::EmptySelection),
        [node] => swap_inputs(graph, *node, reports),
        [first, second] => swap_outputs(graph, *first, *second, reports),
        more => Err(OperatorError::SelectionSize {
            expected: "1 or 2",
            found: more.len(),
        }),
    }
}

/// Outgoing connections of a node as (output index, destination node, destination socket)
fn take_output_links(graph: &mut Graph, node: NodeId) -> Vec<(usize, NodeId, SocketId)> {
    let Some(count) = graph.node(node).map(|n| n.outputs.len()) else {
        return Vec::new();
    };
    let mut taken = Vec::new();
    for index in 0..count {
        for link in graph.output_links(node, index) {
            graph.disconnect(link.id);
            taken.push((index, link.to_node, link.to_socket));
        }
    }
    taken
}

/// Reattach `connections` to `node`, returning how many could not be made
fn give_output_links(graph: &mut Graph, node: NodeId, connections: &[(usize, NodeId, SocketId)]) -> usize {
    let mut lost = 0;
    for &(index, to_node, to_socket) in connections {
        let Some(output) = graph.node(node).and_then(|n| n.output(index)).map(|s| s.id) else {
            lost += 1;
            continue;
        };
        if let Err(err) = graph.connect(node, output, to_node, to_socket) {
            tracing::debug!(%err, "dropped swapped link");
            lost += 1;
        }
    }
    lost
}

fn swap_outputs(graph: &mut Graph, first: NodeId, second: NodeId, reports: &mut Reports) -> Result<OperatorStatus> {
    let has_outputs = |id: NodeId| graph.node(id).is_some_and(|n| !n.outputs.is_empty());
    match (has_outputs(first), has_outputs(second)) {
        (true, true) => {}
        (false, false) => {
            reports.warning("Neither of the nodes have outputs");
            return Ok(OperatorStatus::Finished);
        }
        _ => {
            reports.warning("One of the nodes has no outputs");
            return Ok(OperatorStatus::Finished);
        }
    }

    let from_first = take_output_links(graph, first);
    let from_second = take_output_links(graph, second);
    let lost = give_output_links(graph, second, &from_first) + give_output_links(graph, first, &from_second);
    for _ in 0..lost {
        reports.warning("Some connections have been lost due to differing numbers of output sockets");
    }

    tracing::info!(
        moved = from_first.len() + from_second.len() - lost,
        lost,
        "swapped output links"
    );
    Ok(OperatorStatus::Finished)
}

/// A linked single input and how many linked siblings share its type
struct LinkedInput {
    index: usize,
    socket_type: SocketType,
    rank: usize,
}

fn swap_inputs(graph: &mut Graph, node_id: NodeId, reports: &mut Reports) -> Result<OperatorStatus> {
    let node = graph
        .node(node_id)
        .ok_or_else(|| OperatorError::MissingNode(format!("{node_id:?}")))?;
    let Some(first_input) = node.inputs.first() else {
        reports.warning("This node has no inputs to swap");
        return Ok(OperatorStatus::Finished);
    };
    if first_input.multi_input {
        reports.warning("Can't swap inputs of a multi input socket");
        return Ok(OperatorStatus::Finished);
    }

    let linked: Vec<(usize, SocketType)> = node
        .inputs
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.multi_input && graph.is_linked(s.id))
        .map(|(i, s)| (i, s.socket_type))
        .collect();
    let mut ranked: Vec<LinkedInput> = linked
        .iter()
        .map(|&(index, socket_type)| LinkedInput {
            index,
            socket_type,
            rank: linked.iter().filter(|(_, t)| *t == socket_type).count(),
        })
        .collect();
    // Stable: equal ranks keep socket order
    ranked.sort_by(|a, b| b.rank.cmp(&a.rank));

    let Some(top) = ranked.first() else {
        reports.warning("This node has no input connections to swap");
        return Ok(OperatorStatus::Finished);
    };

    match (top.rank, ranked.len()) {
        (2, _) => {
            let partner = ranked
                .iter()
                .find(|r| r.index != top.index && r.socket_type == top.socket_type)
                .map(|r| r.index);
            if let Some(partner) = partner {
                exchange_sources(graph, node_id, top.index, partner)?;
            }
        }
        (1, 1) => move_source(graph, node_id, top.index, top.socket_type, reports)?,
        (1, 2) => exchange_sources(graph, node_id, ranked[0].index, ranked[1].index)?,
        _ => tracing::debug!(rank = top.rank, "no unambiguous input pair to swap"),
    }
    Ok(OperatorStatus::Finished)
}

/// Source socket linked into input `index` of `node`
fn input_source(graph: &Graph, node: NodeId, index: usize) -> Option<(NodeId, SocketId, SocketId)> {
    let input = graph.node(node)?.input(index)?.id;
    graph
        .links_to(input)
        .next()
        .map(|l| (l.from_node, l.from_socket, input))
}

fn exchange_sources(graph: &mut Graph, node: NodeId, a: usize, b: usize) -> Result<()> {
    let (Some((a_from, a_socket, a_input)), Some((b_from, b_socket, b_input))) =
        (input_source(graph, node, a), input_source(graph, node, b))
    else {
        return Ok(());
    };
    graph.connect(a_from, a_socket, node, b_input)?;
    graph.connect(b_from, b_socket, node, a_input)?;
    tracing::debug!(a, b, "exchanged input sources");
    Ok(())
}

fn move_source(
    graph: &mut Graph,
    node: NodeId,
    index: usize,
    socket_type: SocketType,
    reports: &mut Reports,
) -> Result<()> {
    let Some(inputs) = graph.node(node).map(|n| n.inputs.clone()) else {
        return Ok(());
    };
    let count = inputs.len();
    let target = (1..count)
        .map(|offset| (index + offset) % count)
        .find(|&i| {
            let socket = &inputs[i];
            socket.enabled && socket.socket_type == socket_type && !graph.is_linked(socket.id)
        });
    let (Some(target), Some((from, from_socket, input))) = (target, input_source(graph, node, index)) else {
        reports.warning("No free input of the same type to move the link to");
        return Ok(());
    };

    let old: Vec<_> = graph.links_to(input).map(|l| l.id).collect();
    for id in old {
        graph.disconnect(id);
    }
    graph.connect(from, from_socket, node, inputs[target].id)?;
    tracing::debug!(from = index, to = target, "moved input link");
    Ok(())
}
