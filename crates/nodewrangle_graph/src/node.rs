// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph model.

use crate::catalog::{CombinerKind, RenderPass};
use crate::operation::Operation;
use crate::socket::{Socket, SocketId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Category tag of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Produces or combines shaders
    Shader,
    /// Produces or combines geometry
    Geometry,
    /// Colour producing/processing
    Color,
    /// Scalar math
    Value,
    /// Vector math
    Vector,
    /// Visual grouping container
    Frame,
    /// Pass-through
    Reroute,
    /// Anything else
    Other,
}

/// Behavioural kind of a node.
///
/// Most nodes are [`NodeKind::Generic`]; the remaining variants are the
/// kinds operators need to recognise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Ordinary node
    Generic,
    /// Single-input/single-output pass-through
    Reroute,
    /// Grouping container
    Frame,
    /// Tree output (material output, composite, ...)
    Output,
    /// Viewer/preview
    Viewer,
    /// Group input
    GroupInput,
    /// Group output
    GroupOutput,
    /// Render layer source; only outputs of enabled passes are usable
    RenderLayers {
        /// Passes enabled on the view layer
        passes: BTreeSet<RenderPass>,
    },
    /// Synthesised combiner
    Combiner(CombinerKind),
}

impl NodeKind {
    /// Kinds that terminate a tree and are never considered unused
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Frame | Self::Output | Self::Viewer | Self::GroupInput | Self::GroupOutput
        )
    }
}

/// A node instance in the graph.
///
/// `position` is the top-left corner in y-up graph space and `size` the
/// drawn extent, which is smaller than the expanded extent while `hidden`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Unique name within the graph
    pub name: String,
    /// Display label; empty means "use the name"
    pub label: String,
    /// Behavioural kind
    pub kind: NodeKind,
    /// Category tag
    pub category: NodeCategory,
    /// Top-left corner
    pub position: [f32; 2],
    /// Width and height
    pub size: [f32; 2],
    /// Collapsed in the editor
    pub hidden: bool,
    /// Selection flag
    pub selected: bool,
    /// Muted nodes pass their inputs through
    pub muted: bool,
    /// Blend type / operation of combiners
    pub operation: Option<Operation>,
    /// Custom colour (frames)
    pub color: Option<[f32; 3]>,
    /// Input sockets
    pub inputs: Vec<Socket>,
    /// Output sockets
    pub outputs: Vec<Socket>,
    /// Frame this node belongs to; changed through `Graph::set_parent`
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    /// Create an empty node
    pub fn new(name: impl Into<String>, kind: NodeKind, category: NodeCategory) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            label: String::new(),
            kind,
            category,
            position: [0.0, 0.0],
            size: [140.0, 100.0],
            hidden: false,
            selected: false,
            muted: false,
            operation: None,
            color: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parent: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }

    /// Append an input socket
    pub fn with_input(mut self, socket: Socket) -> Self {
        self.inputs.push(socket);
        self
    }

    /// Append an output socket
    pub fn with_output(mut self, socket: Socket) -> Self {
        self.outputs.push(socket);
        self
    }

    /// Set the operation
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Mark as selected
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Mark as collapsed
    pub fn collapsed(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Frame membership
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Label if set, otherwise the name
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Get an input socket by index
    pub fn input(&self, index: usize) -> Option<&Socket> {
        self.inputs.get(index)
    }

    /// Get an output socket by index
    pub fn output(&self, index: usize) -> Option<&Socket> {
        self.outputs.get(index)
    }

    /// Get a socket by ID
    pub fn socket(&self, socket_id: &SocketId) -> Option<&Socket> {
        self.inputs
            .iter()
            .find(|s| s.id == *socket_id)
            .or_else(|| self.outputs.iter().find(|s| s.id == *socket_id))
    }

    /// Get a mutable socket by ID
    pub fn socket_mut(&mut self, socket_id: &SocketId) -> Option<&mut Socket> {
        if let Some(index) = self.inputs.iter().position(|s| s.id == *socket_id) {
            return self.inputs.get_mut(index);
        }
        self.outputs.iter_mut().find(|s| s.id == *socket_id)
    }

    /// Index of an output socket
    pub fn output_index(&self, socket_id: SocketId) -> Option<usize> {
        self.outputs.iter().position(|s| s.id == socket_id)
    }

    /// Index of an input socket
    pub fn input_index(&self, socket_id: SocketId) -> Option<usize> {
        self.inputs.iter().position(|s| s.id == socket_id)
    }

    /// Index of the first enabled output, falling back to the first output
    pub fn first_enabled_output(&self) -> Option<usize> {
        if self.outputs.is_empty() {
            return None;
        }
        Some(self.outputs.iter().position(|s| s.enabled).unwrap_or(0))
    }

    /// Unselected copy with fresh node and socket IDs
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = NodeId::new();
        for socket in copy.inputs.iter_mut().chain(copy.outputs.iter_mut()) {
            socket.id = SocketId::new();
        }
        copy.selected = false;
        copy
    }

    /// Get all sockets
    pub fn sockets(&self) -> impl Iterator<Item = &Socket> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Centre point in graph space
    pub fn center(&self) -> [f32; 2] {
        [
            self.position[0] + self.size[0] / 2.0,
            self.position[1] - self.size[1] / 2.0,
        ]
    }

    /// Whether a graph-space point lies inside the node rectangle
    pub fn contains(&self, point: [f32; 2]) -> bool {
        point[0] >= self.position[0]
            && point[0] <= self.position[0] + self.size[0]
            && point[1] <= self.position[1]
            && point[1] >= self.position[1] - self.size[1]
    }
}
