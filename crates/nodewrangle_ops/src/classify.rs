// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bucketing of selected nodes by the combiner that can merge them.

use nodewrangle_graph::operation::{
    BLEND_TYPES, GEOMETRY_OPERATIONS, MATH_OPERATIONS, SHADER_OPERATIONS,
};
use nodewrangle_graph::{Graph, NodeId, Operation, SocketType, TreeType};
use serde::{Deserialize, Serialize};

/// Merge-type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MergeType {
    /// Detect from each node's output type
    #[default]
    Auto,
    /// Mix or add shaders
    Shader,
    /// Join or boolean geometry
    Geometry,
    /// Colour mix nodes
    Mix,
    /// Math nodes
    Math,
    /// Depth combine (compositing only)
    ZCombine,
    /// Alpha over (compositing only)
    AlphaOver,
}

impl MergeType {
    /// Bucket an explicit selector fills; `None` for [`MergeType::Auto`]
    pub fn category(&self) -> Option<BucketCategory> {
        match self {
            Self::Auto => None,
            Self::Shader => Some(BucketCategory::Shader),
            Self::Geometry => Some(BucketCategory::Geometry),
            Self::Mix => Some(BucketCategory::Color),
            Self::Math => Some(BucketCategory::Value),
            Self::ZCombine => Some(BucketCategory::ZDepth),
            Self::AlphaOver => Some(BucketCategory::AlphaOver),
        }
    }
}

/// Combiner family a bucket is merged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketCategory {
    /// Colour mix
    Color,
    /// Shader mix/add
    Shader,
    /// Geometry join/boolean
    Geometry,
    /// Scalar math
    Value,
    /// Vector math
    Vector,
    /// Depth combine
    ZDepth,
    /// Alpha over
    AlphaOver,
}

impl BucketCategory {
    /// Every category, in merge order
    pub const ALL: [BucketCategory; 7] = [
        Self::Color,
        Self::Shader,
        Self::Geometry,
        Self::Value,
        Self::Vector,
        Self::ZDepth,
        Self::AlphaOver,
    ];

    /// Categories considered by automatic detection, in test order
    const AUTO: [BucketCategory; 5] = [
        Self::Shader,
        Self::Geometry,
        Self::Color,
        Self::Value,
        Self::Vector,
    ];

    fn index(&self) -> usize {
        match self {
            Self::Color => 0,
            Self::Shader => 1,
            Self::Geometry => 2,
            Self::Value => 3,
            Self::Vector => 4,
            Self::ZDepth => 5,
            Self::AlphaOver => 6,
        }
    }

    /// Operations the category's combiner supports
    pub fn allowed_operations(&self) -> &'static [Operation] {
        match self {
            Self::Color => BLEND_TYPES,
            Self::Shader => SHADER_OPERATIONS,
            Self::Geometry => GEOMETRY_OPERATIONS,
            Self::Value => MATH_OPERATIONS,
            Self::Vector => &[],
            Self::ZDepth | Self::AlphaOver => &[Operation::Mix],
        }
    }

    /// Output type automatic detection matches against
    pub fn socket_type(&self) -> Option<SocketType> {
        match self {
            Self::Color => Some(SocketType::Rgba),
            Self::Shader => Some(SocketType::Shader),
            Self::Geometry => Some(SocketType::Geometry),
            Self::Value => Some(SocketType::Value),
            Self::Vector => Some(SocketType::Vector),
            Self::ZDepth | Self::AlphaOver => None,
        }
    }

    /// Whether one N-ary combiner merges the whole bucket
    pub fn is_n_ary(&self) -> bool {
        *self == Self::Geometry
    }
}

/// Requested merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Operation symbol
    pub mode: Operation,
    /// Merge-type selector
    pub merge_type: MergeType,
}

impl MergeRequest {
    /// Create a request
    pub fn new(mode: Operation, merge_type: MergeType) -> Self {
        Self { mode, merge_type }
    }

    /// Adjust the request to what `tree` supports
    pub fn normalized(self, tree: TreeType) -> Self {
        let mut request = self;
        if matches!(request.merge_type, MergeType::ZCombine | MergeType::AlphaOver)
            && tree != TreeType::Compositing
        {
            request.merge_type = MergeType::Mix;
            request.mode = Operation::Mix;
        }
        if tree == TreeType::Geometry
            && !matches!(request.merge_type, MergeType::Math | MergeType::Geometry)
        {
            request.merge_type = MergeType::Auto;
        }
        request
    }
}

/// A classified node with the layout data merging needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketEntry {
    /// Node handle
    pub node: NodeId,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Drawn width
    pub width: f32,
    /// Collapsed
    pub hidden: bool,
}

/// Classifier result: one bucket per category
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    buckets: [Vec<BucketEntry>; 7],
}

impl Buckets {
    /// Members of one bucket
    pub fn get(&self, category: BucketCategory) -> &[BucketEntry] {
        &self.buckets[category.index()]
    }

    fn push(&mut self, category: BucketCategory, entry: BucketEntry) {
        self.buckets[category.index()].push(entry);
    }

    /// Whether no node was classified
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Total number of classified nodes
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Non-empty buckets in merge order
    pub fn into_non_empty(self) -> Vec<(BucketCategory, Vec<BucketEntry>)> {
        BucketCategory::ALL
            .into_iter()
            .zip(self.buckets)
            .filter(|(_, entries)| !entries.is_empty())
            .collect()
    }
}

/// Sort the selected nodes of `graph` into buckets.
///
/// `request` is expected to be normalised for the graph's tree.
pub fn classify(graph: &Graph, request: &MergeRequest) -> Buckets {
    let tree = graph.tree_type();
    let mode = request.mode;
    let mut buckets = Buckets::default();

    for node in graph.nodes().filter(|n| n.selected) {
        let Some(output_index) = node.first_enabled_output() else {
            continue;
        };
        let output_type = node.outputs[output_index].socket_type;
        let entry = BucketEntry {
            node: node.id,
            x: node.position[0],
            y: node.position[1],
            width: node.size[0],
            hidden: node.hidden,
        };

        let category = match request.merge_type.category() {
            Some(category) => category.allowed_operations().contains(&mode).then_some(category),
            None => auto_category(tree, mode, output_type),
        };
        if let Some(category) = category {
            buckets.push(category, entry);
        }
    }

    // Mixed colour and scalar fan-in collapses onto one mix chain
    if request.merge_type == MergeType::Auto
        && !buckets.get(BucketCategory::Color).is_empty()
        && !buckets.get(BucketCategory::Value).is_empty()
    {
        let values = std::mem::take(&mut buckets.buckets[BucketCategory::Value.index()]);
        buckets.buckets[BucketCategory::Color.index()].extend(values);
    }

    tracing::debug!(classified = buckets.len(), mode = mode.symbol(), "classified selection");
    buckets
}

fn auto_category(tree: TreeType, mode: Operation, output_type: SocketType) -> Option<BucketCategory> {
    BucketCategory::AUTO.into_iter().find(|category| {
        let mut matched_type = output_type;
        let mut valid = category.allowed_operations().contains(&mode);
        if tree == TreeType::Geometry {
            // Geometry trees have no colour mix; MIX means "add" for
            // numeric outputs and "join" for geometry
            if mode == Operation::Mix {
                valid |= matches!(
                    (output_type, category),
                    (SocketType::Value, BucketCategory::Value)
                        | (SocketType::Vector, BucketCategory::Vector)
                        | (_, BucketCategory::Geometry)
                );
            }
        } else if output_type != SocketType::Shader && mode == Operation::Mix {
            matched_type = SocketType::Rgba;
            valid = true;
        }
        valid && category.socket_type() == Some(matched_type)
    })
}
