// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph fixtures shared by the operator tests.

use nodewrangle_graph::{Graph, LinkId, Node, NodeCategory, NodeId, NodeKind, Socket, SocketType};

/// Source node with one output of `socket_type`
pub fn source(name: &str, socket_type: SocketType, x: f32, y: f32) -> Node {
    let category = match socket_type {
        SocketType::Shader => NodeCategory::Shader,
        SocketType::Geometry => NodeCategory::Geometry,
        SocketType::Rgba => NodeCategory::Color,
        SocketType::Value => NodeCategory::Value,
        SocketType::Vector => NodeCategory::Vector,
        _ => NodeCategory::Other,
    };
    Node::new(name, NodeKind::Generic, category)
        .with_position(x, y)
        .with_size(140.0, 100.0)
        .with_input(Socket::input("In", socket_type))
        .with_output(Socket::output("Out", socket_type))
}

/// Node with `count` inputs of `socket_type` and one output
pub fn sink(name: &str, socket_type: SocketType, count: usize) -> Node {
    let mut node = Node::new(name, NodeKind::Generic, NodeCategory::Other).with_position(600.0, 0.0);
    for i in 0..count {
        node.inputs.push(Socket::input(format!("In {i}"), socket_type));
    }
    node.outputs.push(Socket::output("Out", socket_type));
    node
}

/// Link output `output` of `from` into input `input` of `to`
pub fn link(graph: &mut Graph, from: NodeId, output: usize, to: NodeId, input: usize) -> LinkId {
    graph.connect_indices(from, output, to, input).unwrap()
}

/// Select exactly `ids`
pub fn select(graph: &mut Graph, ids: &[NodeId]) {
    graph.deselect_all();
    for id in ids {
        graph.set_selected(*id, true);
    }
}

/// Node feeding input `input` of `node`, if linked
pub fn upstream(graph: &Graph, node: NodeId, input: usize) -> Option<NodeId> {
    let socket = graph.node(node)?.input(input)?.id;
    graph.links_to(socket).next().map(|l| l.from_node)
}

/// Nodes fed by output `output` of `node`
pub fn downstream(graph: &Graph, node: NodeId, output: usize) -> Vec<NodeId> {
    graph.output_links(node, output).iter().map(|l| l.to_node).collect()
}

/// Combiner nodes in the graph, in creation order
pub fn combiners(graph: &Graph) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|n| matches!(n.kind, NodeKind::Combiner(_)))
        .map(|n| n.id)
        .collect()
}
