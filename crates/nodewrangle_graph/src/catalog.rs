// SPDX-License-Identifier: MIT OR Apache-2.0
//! Templates for the nodes operators synthesise.
//!
//! Combiner socket layouts are static data: each [`CombinerKind`] knows
//! which input indices receive the two merged values, whether it merges
//! through a multi-input socket, and which inputs carry depth.

use crate::graph::TreeType;
use crate::node::{Node, NodeCategory, NodeKind};
use crate::operation::Operation;
use crate::socket::{Socket, SocketType, SocketValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Expanded node width
pub const NODE_WIDTH: f32 = 140.0;
/// Height of a collapsed node
pub const COLLAPSED_HEIGHT: f32 = 30.0;
/// Header height of an expanded node
const HEADER_HEIGHT: f32 = 30.0;
/// Height of one socket row
const SOCKET_ROW: f32 = 22.0;
/// Drawn extent of a reroute
pub const REROUTE_SIZE: f32 = 16.0;

/// Node synthesised to merge upstream outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombinerKind {
    /// Shader/texture/geometry mix node in colour mode
    Mix,
    /// Compositor mix node
    MixRgb,
    /// Scalar math
    Math,
    /// Vector math
    VectorMath,
    /// Mix shader
    MixShader,
    /// Add shader
    AddShader,
    /// N-ary geometry join
    JoinGeometry,
    /// N-ary mesh boolean
    MeshBoolean,
    /// Compositor depth combine
    ZCombine,
    /// Compositor alpha over
    AlphaOver,
}

impl CombinerKind {
    /// Default node name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Mix | Self::MixRgb => "Mix",
            Self::Math => "Math",
            Self::VectorMath => "Vector Math",
            Self::MixShader => "Mix Shader",
            Self::AddShader => "Add Shader",
            Self::JoinGeometry => "Join Geometry",
            Self::MeshBoolean => "Mesh Boolean",
            Self::ZCombine => "Z Combine",
            Self::AlphaOver => "Alpha Over",
        }
    }

    /// Category tag of the synthesised node
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Mix | Self::MixRgb | Self::ZCombine | Self::AlphaOver => NodeCategory::Color,
            Self::Math => NodeCategory::Value,
            Self::VectorMath => NodeCategory::Vector,
            Self::MixShader | Self::AddShader => NodeCategory::Shader,
            Self::JoinGeometry | Self::MeshBoolean => NodeCategory::Geometry,
        }
    }

    /// Whether the combiner merges through a multi-input socket
    pub fn is_multi_input(&self) -> bool {
        matches!(self, Self::JoinGeometry | Self::MeshBoolean)
    }

    /// Input indices receiving the first and second merged values
    pub fn primary_inputs(&self) -> Option<(usize, usize)> {
        match self {
            Self::Mix => Some((6, 7)),
            Self::MixRgb | Self::MixShader | Self::AlphaOver => Some((1, 2)),
            Self::Math | Self::VectorMath | Self::AddShader => Some((0, 1)),
            Self::ZCombine => Some((0, 2)),
            Self::JoinGeometry | Self::MeshBoolean => None,
        }
    }

    /// Input indices receiving the depth channels of the two merged values
    pub fn depth_inputs(&self) -> Option<(usize, usize)> {
        match self {
            Self::ZCombine => Some((1, 3)),
            _ => None,
        }
    }

    /// Ordered input indices for N-ary combiners; the last one is the
    /// multi-input socket and absorbs every remaining member
    pub fn multi_input_indices(&self, operation: Operation) -> &'static [usize] {
        match (self, operation) {
            (Self::MeshBoolean, Operation::Difference) => &[0, 1],
            (Self::MeshBoolean, _) => &[1],
            _ => &[0],
        }
    }

    /// Index of the blend factor input, if the combiner has one
    pub fn factor_input(&self) -> Option<usize> {
        match self {
            Self::Mix | Self::MixRgb | Self::MixShader | Self::AlphaOver => Some(0),
            _ => None,
        }
    }

    fn sockets(&self) -> (Vec<Socket>, Vec<Socket>) {
        use SocketType::{Boolean, Geometry, Rgba, Shader, Value, Vector};
        match self {
            Self::Mix => (
                vec![
                    Socket::input("Factor", Value).with_default(SocketValue::Float(0.5)),
                    Socket::input("Factor", Vector).disabled(),
                    Socket::input("A", Value).disabled(),
                    Socket::input("B", Value).disabled(),
                    Socket::input("A", Vector).disabled(),
                    Socket::input("B", Vector).disabled(),
                    Socket::input("A", Rgba).with_default(SocketValue::Color([0.5, 0.5, 0.5, 1.0])),
                    Socket::input("B", Rgba).with_default(SocketValue::Color([0.5, 0.5, 0.5, 1.0])),
                ],
                vec![
                    Socket::output("Result", Value).disabled(),
                    Socket::output("Result", Vector).disabled(),
                    Socket::output("Result", Rgba),
                ],
            ),
            Self::MixRgb => (
                vec![
                    Socket::input("Fac", Value).with_default(SocketValue::Float(1.0)),
                    Socket::input("Image", Rgba),
                    Socket::input("Image", Rgba),
                ],
                vec![Socket::output("Image", Rgba)],
            ),
            Self::Math => (
                vec![
                    Socket::input("Value", Value).with_default(SocketValue::Float(0.5)),
                    Socket::input("Value", Value).with_default(SocketValue::Float(0.5)),
                    Socket::input("Value", Value).disabled(),
                ],
                vec![Socket::output("Value", Value)],
            ),
            Self::VectorMath => (
                vec![
                    Socket::input("Vector", Vector),
                    Socket::input("Vector", Vector),
                    Socket::input("Vector", Vector).disabled(),
                    Socket::input("Scale", Value).disabled(),
                ],
                vec![
                    Socket::output("Vector", Vector),
                    Socket::output("Value", Value).disabled(),
                ],
            ),
            Self::MixShader => (
                vec![
                    Socket::input("Fac", Value).with_default(SocketValue::Float(0.5)),
                    Socket::input("Shader", Shader),
                    Socket::input("Shader", Shader),
                ],
                vec![Socket::output("Shader", Shader)],
            ),
            Self::AddShader => (
                vec![Socket::input("Shader", Shader), Socket::input("Shader", Shader)],
                vec![Socket::output("Shader", Shader)],
            ),
            Self::JoinGeometry => (
                vec![Socket::input("Geometry", Geometry).multi()],
                vec![Socket::output("Geometry", Geometry)],
            ),
            Self::MeshBoolean => (
                vec![
                    Socket::input("Mesh 1", Geometry),
                    Socket::input("Mesh 2", Geometry).multi(),
                    Socket::input("Self Intersection", Boolean),
                    Socket::input("Hole Tolerant", Boolean),
                ],
                vec![Socket::output("Mesh", Geometry)],
            ),
            Self::ZCombine => (
                vec![
                    Socket::input("Image", Rgba),
                    Socket::input("Z", Value),
                    Socket::input("Image", Rgba),
                    Socket::input("Z", Value),
                ],
                vec![Socket::output("Image", Rgba), Socket::output("Z", Value)],
            ),
            Self::AlphaOver => (
                vec![
                    Socket::input("Fac", Value).with_default(SocketValue::Float(1.0)),
                    Socket::input("Image", Rgba),
                    Socket::input("Image", Rgba),
                ],
                vec![Socket::output("Image", Rgba)],
            ),
        }
    }
}

/// Build a combiner node, positioned at the origin
pub fn combiner(kind: CombinerKind, operation: Option<Operation>, hidden: bool) -> Node {
    let (inputs, outputs) = kind.sockets();
    let rows = inputs.iter().chain(outputs.iter()).filter(|s| s.enabled).count();
    let mut node = Node::new(kind.display_name(), NodeKind::Combiner(kind), kind.category());
    node.inputs = inputs;
    node.outputs = outputs;
    node.operation = operation;
    node.hidden = hidden;
    node.size = if hidden {
        [NODE_WIDTH, COLLAPSED_HEIGHT]
    } else {
        [NODE_WIDTH, HEADER_HEIGHT + SOCKET_ROW * rows as f32]
    };

    if kind == CombinerKind::MeshBoolean && operation != Some(Operation::Difference) {
        node.inputs[0].enabled = false;
    }
    if kind == CombinerKind::Mix && operation.is_some_and(|op| op != Operation::Mix) {
        node.inputs[0].default_value = Some(SocketValue::Float(1.0));
    }
    node
}

/// Build a reroute carrying `socket_type`
pub fn reroute(socket_type: SocketType) -> Node {
    Node::new("Reroute", NodeKind::Reroute, NodeCategory::Reroute)
        .with_size(REROUTE_SIZE, REROUTE_SIZE)
        .with_input(Socket::input("Input", socket_type))
        .with_output(Socket::output("Output", socket_type))
}

/// Build the node a tree's result flows into.
///
/// Material output takes surface, volume and displacement in that
/// order. Custom trees have no known output.
pub fn output_node(tree: TreeType) -> Option<Node> {
    use SocketType::{Geometry, Rgba, Shader, Vector};
    let node = match tree {
        TreeType::Shader => Node::new("Material Output", NodeKind::Output, NodeCategory::Other)
            .with_input(Socket::input("Surface", Shader))
            .with_input(Socket::input("Volume", Shader))
            .with_input(Socket::input("Displacement", Vector)),
        TreeType::Compositing => Node::new("Composite", NodeKind::Output, NodeCategory::Other)
            .with_input(Socket::input("Image", Rgba)),
        TreeType::Texture => Node::new("Output", NodeKind::Output, NodeCategory::Other)
            .with_input(Socket::input("Color", Rgba)),
        TreeType::Geometry => Node::new("Group Output", NodeKind::GroupOutput, NodeCategory::Other)
            .with_input(Socket::input("Geometry", Geometry)),
        TreeType::Custom => return None,
    };
    let rows = node.inputs.len() as f32;
    Some(node.with_size(NODE_WIDTH, HEADER_HEIGHT + SOCKET_ROW * rows))
}

/// Build an empty frame
pub fn frame(label: impl Into<String>, color: Option<[f32; 3]>) -> Node {
    let mut node = Node::new("Frame", NodeKind::Frame, NodeCategory::Frame).with_size(200.0, 200.0);
    node.label = label.into();
    node.color = color;
    node
}

/// View-layer render pass
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RenderPass {
    Combined,
    Z,
    Mist,
    Normal,
    Vector,
    Uv,
    ObjectIndex,
    MaterialIndex,
    DiffuseDirect,
    DiffuseIndirect,
    DiffuseColor,
    GlossyDirect,
    GlossyIndirect,
    GlossyColor,
    TransmissionDirect,
    TransmissionIndirect,
    TransmissionColor,
    Emission,
    Environment,
    AmbientOcclusion,
    Shadow,
}

/// Render-layer outputs: pass, output name, multilayer EXR name
pub const RENDER_LAYER_OUTPUTS: &[(RenderPass, &str, &str)] = &[
    (RenderPass::Combined, "Image", "Image"),
    (RenderPass::Z, "Depth", "Z"),
    (RenderPass::Mist, "Mist", "Mist"),
    (RenderPass::Normal, "Normal", "Normal"),
    (RenderPass::Vector, "Vector", "Vector"),
    (RenderPass::Uv, "UV", "UV"),
    (RenderPass::ObjectIndex, "IndexOB", "IndexOB"),
    (RenderPass::MaterialIndex, "IndexMA", "IndexMA"),
    (RenderPass::DiffuseDirect, "DiffDir", "DiffDir"),
    (RenderPass::DiffuseIndirect, "DiffInd", "DiffInd"),
    (RenderPass::DiffuseColor, "DiffCol", "DiffCol"),
    (RenderPass::GlossyDirect, "GlossDir", "GlossDir"),
    (RenderPass::GlossyIndirect, "GlossInd", "GlossInd"),
    (RenderPass::GlossyColor, "GlossCol", "GlossCol"),
    (RenderPass::TransmissionDirect, "TransDir", "TransDir"),
    (RenderPass::TransmissionIndirect, "TransInd", "TransInd"),
    (RenderPass::TransmissionColor, "TransCol", "TransCol"),
    (RenderPass::Emission, "Emit", "Emission"),
    (RenderPass::Environment, "Env", "Env"),
    (RenderPass::AmbientOcclusion, "AO", "AO"),
    (RenderPass::Shadow, "Shadow", "Shadow"),
];

/// The pass an output name belongs to
pub fn render_pass_for_output(name: &str) -> Option<RenderPass> {
    RENDER_LAYER_OUTPUTS
        .iter()
        .find(|(_, output, exr)| *output == name || *exr == name)
        .map(|(pass, _, _)| *pass)
}

/// Both names a render-layer output may carry
pub fn render_output_names(name: &str) -> Option<(&'static str, &'static str)> {
    RENDER_LAYER_OUTPUTS
        .iter()
        .find(|(_, output, exr)| *output == name || *exr == name)
        .map(|(_, output, exr)| (*output, *exr))
}

/// Whether output `index` of `node` represents data that is actually produced.
///
/// Render layers expose an output for every pass; only enabled passes and
/// `Alpha` count. Every other node's outputs always count.
pub fn output_pass_enabled(node: &Node, index: usize) -> bool {
    let Some(output) = node.output(index) else {
        return false;
    };
    match &node.kind {
        NodeKind::RenderLayers { passes } => {
            output.name == "Alpha"
                || render_pass_for_output(&output.name).is_some_and(|pass| passes.contains(&pass))
        }
        _ => true,
    }
}

/// Build a render-layers node exposing every known pass plus `Alpha`
pub fn render_layers(passes: impl IntoIterator<Item = RenderPass>) -> Node {
    let passes: BTreeSet<RenderPass> = passes.into_iter().collect();
    let mut node = Node::new("Render Layers", NodeKind::RenderLayers { passes }, NodeCategory::Color)
        .with_size(NODE_WIDTH, 300.0);
    node.outputs.push(Socket::output("Image", SocketType::Rgba));
    node.outputs.push(Socket::output("Alpha", SocketType::Value));
    for (pass, name, _) in RENDER_LAYER_OUTPUTS.iter().skip(1) {
        let socket_type = match pass {
            RenderPass::Z | RenderPass::Mist | RenderPass::ObjectIndex | RenderPass::MaterialIndex => {
                SocketType::Value
            }
            RenderPass::Normal | RenderPass::Vector | RenderPass::Uv => SocketType::Vector,
            _ => SocketType::Rgba,
        };
        node.outputs.push(Socket::output(*name, socket_type));
    }
    node
}
