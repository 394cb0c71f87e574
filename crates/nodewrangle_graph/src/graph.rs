// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and links.

use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeKind};
use crate::socket::{Socket, SocketDirection, SocketId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Kind of tree a graph belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeType {
    /// Material/world/light shading
    Shader,
    /// Compositing
    Compositing,
    /// Procedural texture
    Texture,
    /// Geometry nodes
    Geometry,
    /// Add-on defined tree with unknown node semantics
    Custom,
}

/// A node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Tree kind
    tree_type: TreeType,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Links between sockets
    links: IndexMap<LinkId, Link>,
    /// Active node
    active: Option<NodeId>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>, tree_type: TreeType) -> Self {
        Self {
            name: name.into(),
            tree_type,
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            active: None,
        }
    }

    /// Tree kind
    pub fn tree_type(&self) -> TreeType {
        self.tree_type
    }

    /// Add a node to the graph, renaming it if the name is taken
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        if self.nodes.values().any(|n| n.name == node.name) {
            node.name = self.unique_name(&node.name);
        }
        if let Some(parent) = node.parent {
            if !self.nodes.contains_key(&parent) {
                node.parent = None;
            }
        }
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// First free name of the form `base`, `base.001`, `base.002`, ...
    pub fn unique_name(&self, base: &str) -> String {
        let stem = match base.rsplit_once('.') {
            Some((stem, suffix)) if suffix.len() == 3 && suffix.chars().all(|c| c.is_ascii_digit()) => stem,
            _ => base,
        };
        if !self.nodes.values().any(|n| n.name == stem) {
            return stem.to_string();
        }
        (1..)
            .map(|i| format!("{stem}.{i:03}"))
            .find(|candidate| !self.nodes.values().any(|n| n.name == *candidate))
            .unwrap_or_else(|| stem.to_string())
    }

    /// Remove a node and its links.
    ///
    /// Children of a removed frame move to the frame's own parent.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let removed = self.nodes.shift_remove(&node_id)?;
        self.links.retain(|_, l| !l.involves_node(node_id));
        for node in self.nodes.values_mut() {
            if node.parent == Some(node_id) {
                node.parent = removed.parent;
            }
        }
        if self.active == Some(node_id) {
            self.active = None;
        }
        Some(removed)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Look a node up by name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// Whether the node exists
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all nodes mutably
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// IDs of selected nodes, in graph order
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes.values().filter(|n| n.selected).map(|n| n.id).collect()
    }

    /// Set the selection flag of one node
    pub fn set_selected(&mut self, node_id: NodeId, selected: bool) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.selected = selected;
        }
    }

    /// Clear every selection flag
    pub fn deselect_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.selected = false;
        }
    }

    /// Active node
    pub fn active(&self) -> Option<NodeId> {
        self.active.filter(|id| self.nodes.contains_key(id))
    }

    /// Set the active node; unknown IDs clear it
    pub fn set_active(&mut self, node_id: Option<NodeId>) {
        self.active = node_id.filter(|id| self.nodes.contains_key(id));
    }

    /// Parent a node to a frame, or detach it with `None`
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&child) {
            return Err(GraphError::NodeNotFound(child));
        }
        if let Some(frame) = parent {
            let frame_node = self.nodes.get(&frame).ok_or(GraphError::NodeNotFound(frame))?;
            if frame_node.kind != NodeKind::Frame {
                return Err(GraphError::NotAFrame(frame));
            }
            // Walk up from the new parent; meeting the child closes a loop
            let mut cursor = Some(frame);
            while let Some(current) = cursor {
                if current == child {
                    return Err(GraphError::ParentCycle(child));
                }
                cursor = self.nodes.get(&current).and_then(|n| n.parent);
            }
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = parent;
        }
        Ok(())
    }

    /// Direct children of a frame
    pub fn children(&self, frame: NodeId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.parent == Some(frame))
            .map(|n| n.id)
            .collect()
    }

    /// Look up a socket
    pub fn socket(&self, node_id: NodeId, socket_id: SocketId) -> Option<&Socket> {
        self.nodes.get(&node_id)?.socket(&socket_id)
    }

    /// Add a link between sockets.
    ///
    /// Linking into an occupied single-input socket replaces its link.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_socket: SocketId,
        to_node: NodeId,
        to_socket: SocketId,
    ) -> Result<LinkId, ConnectionError> {
        let source_node = self.nodes.get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target_node = self.nodes.get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source = source_node.socket(&from_socket)
            .ok_or(ConnectionError::SocketNotFound(from_socket))?;
        let target = target_node.socket(&to_socket)
            .ok_or(ConnectionError::SocketNotFound(to_socket))?;

        if source.direction != SocketDirection::Output || target.direction != SocketDirection::Input {
            return Err(ConnectionError::DirectionMismatch);
        }

        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        if let Some(existing) = self.links.values().find(|l| l.from_socket == from_socket && l.to_socket == to_socket) {
            return Ok(existing.id);
        }

        if !target.multi_input {
            self.links.retain(|_, l| l.to_socket != to_socket);
        }

        let link = Link::new(from_node, from_socket, to_node, to_socket);
        let id = link.id;
        self.links.insert(id, link);
        Ok(id)
    }

    /// Link an output index to an input index
    pub fn connect_indices(
        &mut self,
        from_node: NodeId,
        output: usize,
        to_node: NodeId,
        input: usize,
    ) -> Result<LinkId, ConnectionError> {
        let from_socket = self.nodes.get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?
            .output(output)
            .ok_or(ConnectionError::OutputIndex(output))?
            .id;
        let to_socket = self.nodes.get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?
            .input(input)
            .ok_or(ConnectionError::InputIndex(input))?
            .id;
        self.connect(from_node, from_socket, to_node, to_socket)
    }

    /// Move the source end of a link, keeping its place among the links
    /// entering the same socket.
    ///
    /// If the new source already feeds that socket, the moved link is
    /// dropped and the existing one returned.
    pub fn relink(
        &mut self,
        link_id: LinkId,
        from_node: NodeId,
        from_socket: SocketId,
    ) -> Result<LinkId, ConnectionError> {
        let (to_node, to_socket) = self.links.get(&link_id)
            .map(|l| (l.to_node, l.to_socket))
            .ok_or(ConnectionError::LinkNotFound(link_id))?;
        let source = self.nodes.get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?
            .socket(&from_socket)
            .ok_or(ConnectionError::SocketNotFound(from_socket))?;

        if source.direction != SocketDirection::Output {
            return Err(ConnectionError::DirectionMismatch);
        }
        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        let existing = self.links.values()
            .find(|l| l.id != link_id && l.from_socket == from_socket && l.to_socket == to_socket)
            .map(|l| l.id);
        if let Some(existing) = existing {
            self.links.shift_remove(&link_id);
            return Ok(existing);
        }

        if let Some(link) = self.links.get_mut(&link_id) {
            link.from_node = from_node;
            link.from_socket = from_socket;
        }
        Ok(link_id)
    }

    /// Remove a link
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        self.links.shift_remove(&link_id)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get links leaving a specific socket
    pub fn links_from(&self, socket_id: SocketId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.from_socket == socket_id)
    }

    /// Get links entering a specific socket, in attachment order
    pub fn links_to(&self, socket_id: SocketId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.to_socket == socket_id)
    }

    /// Get links leaving any output of a node
    pub fn links_leaving(&self, node_id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.from_node == node_id)
    }

    /// Get links involving a node
    pub fn links_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.involves_node(node_id))
    }

    /// Links leaving output `index` of a node
    pub fn output_links(&self, node_id: NodeId, index: usize) -> Vec<Link> {
        let Some(socket) = self.nodes.get(&node_id).and_then(|n| n.output(index)) else {
            return Vec::new();
        };
        self.links_from(socket.id).cloned().collect()
    }

    /// Whether any link touches the socket
    pub fn is_linked(&self, socket_id: SocketId) -> bool {
        self.links.values().any(|l| l.involves_socket(socket_id))
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Get nodes in topological order
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut upstream: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for link in self.links.values() {
            upstream.entry(link.to_node).or_default().push(link.from_node);
        }
        // Popped from the back, so reversed to visit in link order
        let pending = |node_id: NodeId| -> Vec<NodeId> {
            upstream
                .get(&node_id)
                .map(|from| from.iter().rev().copied().collect())
                .unwrap_or_default()
        };

        let mut visited = HashSet::new();
        let mut on_path = HashSet::new();
        let mut order = Vec::new();

        for root in self.nodes.keys() {
            if visited.contains(root) {
                continue;
            }
            // Upstream nodes come first
            let mut stack = vec![(*root, pending(*root))];
            on_path.insert(*root);
            while let Some(top) = stack.last_mut() {
                match top.1.pop() {
                    Some(from_node) => {
                        if on_path.contains(&from_node) {
                            return Err(CycleError);
                        }
                        if !visited.contains(&from_node) {
                            on_path.insert(from_node);
                            stack.push((from_node, pending(from_node)));
                        }
                    }
                    None => {
                        let node_id = top.0;
                        stack.pop();
                        on_path.remove(&node_id);
                        visited.insert(node_id);
                        order.push(node_id);
                    }
                }
            }
        }

        Ok(order)
    }

    /// Whether `to` can be reached from `from` by following links downstream
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            for link in self.links_leaving(current) {
                if link.to_node == to {
                    return true;
                }
                stack.push(link.to_node);
            }
        }
        false
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("NodeTree", TreeType::Shader)
    }
}

/// Error when creating a link
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Socket not found
    #[error("Socket not found: {0:?}")]
    SocketNotFound(SocketId),

    /// Link not found
    #[error("Link not found: {0:?}")]
    LinkNotFound(LinkId),

    /// No output at this index
    #[error("No output socket at index {0}")]
    OutputIndex(usize),

    /// No input at this index
    #[error("No input socket at index {0}")]
    InputIndex(usize),

    /// Links must run from an output to an input
    #[error("Links must run from an output to an input")]
    DirectionMismatch,

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,
}

/// Error when editing graph structure
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Parent is not a frame
    #[error("Node {0:?} is not a frame")]
    NotAFrame(NodeId),

    /// Parent chain would loop
    #[error("Parenting would make {0:?} its own ancestor")]
    ParentCycle(NodeId),

    /// Link failure
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Error when graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;
