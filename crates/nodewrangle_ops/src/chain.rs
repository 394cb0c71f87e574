// SPDX-License-Identifier: MIT OR Apache-2.0
//! Combiner synthesis and placement for one bucket.

use crate::classify::{BucketCategory, BucketEntry};
use crate::settings::{MergePosition, WranglerSettings};
use nodewrangle_graph::catalog::{self, CombinerKind};
use nodewrangle_graph::{Graph, NodeId, Operation, TreeType};

/// Horizontal gap between the rightmost merged node and the chain
pub const MERGE_MARGIN_X: f32 = 70.0;

/// Vertical step between collapsed combiners
const STEP_COLLAPSED: f32 = 100.0;
/// Vertical step between expanded combiners
const STEP_EXPANDED: f32 = 200.0;
/// Vertical step between expanded shader combiners
const STEP_EXPANDED_SHADER: f32 = 150.0;
/// Extra drop applied to every collapsed combiner
const COLLAPSED_DROP: f32 = 50.0;

/// Combiner node and operation used for a bucket
pub fn combiner_kind(
    category: BucketCategory,
    tree: TreeType,
    mode: Operation,
) -> (CombinerKind, Option<Operation>) {
    // Geometry trees have no plain mix for colour, value or vector merges
    let blend_mode = if tree == TreeType::Geometry && mode == Operation::Mix {
        Operation::Add
    } else {
        mode
    };
    match category {
        BucketCategory::Color if tree == TreeType::Compositing => (CombinerKind::MixRgb, Some(mode)),
        BucketCategory::Color => (CombinerKind::Mix, Some(blend_mode)),
        BucketCategory::Value => (CombinerKind::Math, Some(blend_mode)),
        BucketCategory::Vector => (CombinerKind::VectorMath, Some(blend_mode)),
        BucketCategory::Shader if mode == Operation::Add => (CombinerKind::AddShader, None),
        BucketCategory::Shader => (CombinerKind::MixShader, None),
        BucketCategory::Geometry if matches!(mode, Operation::Join | Operation::Mix) => {
            (CombinerKind::JoinGeometry, None)
        }
        BucketCategory::Geometry => (CombinerKind::MeshBoolean, Some(mode)),
        BucketCategory::ZDepth => (CombinerKind::ZCombine, None),
        BucketCategory::AlphaOver => (CombinerKind::AlphaOver, None),
    }
}

/// Combiners built for one bucket
#[derive(Debug, Clone)]
pub struct Chain {
    /// Combiner family
    pub kind: CombinerKind,
    /// Operation the combiners were built with
    pub operation: Option<Operation>,
    /// Bucket members, top to bottom
    pub members: Vec<BucketEntry>,
    /// Combiners, innermost first; the last one carries the merged result
    pub combiners: Vec<NodeId>,
}

impl Chain {
    /// Combiner carrying the merged result
    pub fn outermost(&self) -> Option<NodeId> {
        self.combiners.last().copied()
    }

    /// Combiner receiving the first two members
    pub fn innermost(&self) -> Option<NodeId> {
        self.combiners.first().copied()
    }
}

/// Create and place the combiners merging `entries`.
///
/// Binary categories get one combiner per extra member (at least one);
/// N-ary categories get a single multi-input combiner. Members are
/// deselected, the combiners selected and the outermost made active.
/// No links are made here.
pub fn build_chain(
    graph: &mut Graph,
    category: BucketCategory,
    mut entries: Vec<BucketEntry>,
    mode: Operation,
    settings: &WranglerSettings,
) -> Chain {
    let (kind, operation) = combiner_kind(category, graph.tree_type(), mode);
    let hidden = if category == BucketCategory::Shader {
        settings.hide_shader_combiners()
    } else {
        settings.hide_combiners()
    };

    entries.sort_by(|a, b| b.x.total_cmp(&a.x));
    let loc_x = entries.first().map_or(0.0, |e| e.x + e.width) + MERGE_MARGIN_X;
    entries.sort_by(|a, b| b.y.total_cmp(&a.y));

    let combiners = if kind.is_multi_input() {
        let node = catalog::combiner(kind, operation, hidden)
            .with_position(loc_x, multi_input_anchor(&entries, settings));
        vec![graph.add_node(node)]
    } else {
        let step = if hidden {
            STEP_COLLAPSED
        } else if category == BucketCategory::Shader {
            STEP_EXPANDED_SHADER
        } else {
            STEP_EXPANDED
        };
        let count = entries.len().saturating_sub(1).max(1);
        let mut loc_y = binary_anchor(&entries, settings);
        let mut created = Vec::with_capacity(count);
        // Outermost sits at the anchor, the rest stack upwards
        for _ in 0..count {
            if hidden {
                loc_y -= COLLAPSED_DROP;
            }
            let node = catalog::combiner(kind, operation, hidden).with_position(loc_x, loc_y);
            created.push(graph.add_node(node));
            loc_y += step;
        }
        created.reverse();
        created
    };

    for entry in &entries {
        graph.set_selected(entry.node, false);
    }
    for id in &combiners {
        graph.set_selected(*id, true);
    }
    graph.set_active(combiners.last().copied());

    tracing::debug!(
        kind = kind.display_name(),
        members = entries.len(),
        combiners = combiners.len(),
        "built combiner chain"
    );

    Chain {
        kind,
        operation,
        members: entries,
        combiners,
    }
}

/// Y of the outermost binary combiner; `entries` sorted top to bottom.
///
/// The lift over a collapsed lowest member follows the non-shader
/// collapse setting for every category.
fn binary_anchor(entries: &[BucketEntry], settings: &WranglerSettings) -> f32 {
    let Some(lowest) = entries.last() else {
        return 0.0;
    };
    match settings.merge_position {
        MergePosition::Bottom => lowest.y,
        MergePosition::Center => {
            let second = entries.len().checked_sub(2).map_or(lowest, |i| &entries[i]);
            let mut loc_y = (lowest.y + second.y) / 2.0;
            if lowest.hidden {
                loc_y += if settings.hide_combiners() { 40.0 } else { 80.0 };
            }
            loc_y
        }
    }
}

/// Y of an N-ary combiner; `entries` sorted top to bottom
fn multi_input_anchor(entries: &[BucketEntry], settings: &WranglerSettings) -> f32 {
    match settings.merge_position {
        MergePosition::Bottom => entries.last().map_or(0.0, |e| e.y),
        MergePosition::Center if !entries.is_empty() => {
            entries.iter().map(|e| e.y).sum::<f32>() / entries.len() as f32
        }
        MergePosition::Center => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MergeHide;

    fn entry(graph: &mut Graph, x: f32, y: f32, hidden: bool) -> BucketEntry {
        let mut node = crate::test_support::source("N", nodewrangle_graph::SocketType::Rgba, x, y);
        node.hidden = hidden;
        node.selected = true;
        let id = graph.add_node(node);
        BucketEntry { node: id, x, y, width: 140.0, hidden }
    }

    #[test]
    fn test_kind_selection() {
        use BucketCategory::*;
        assert_eq!(combiner_kind(Color, TreeType::Compositing, Operation::Mix).0, CombinerKind::MixRgb);
        assert_eq!(combiner_kind(Color, TreeType::Shader, Operation::Mix).0, CombinerKind::Mix);
        assert_eq!(
            combiner_kind(Value, TreeType::Geometry, Operation::Mix),
            (CombinerKind::Math, Some(Operation::Add))
        );
        assert_eq!(
            combiner_kind(Color, TreeType::Geometry, Operation::Mix),
            (CombinerKind::Mix, Some(Operation::Add))
        );
        assert_eq!(
            combiner_kind(Color, TreeType::Geometry, Operation::Multiply),
            (CombinerKind::Mix, Some(Operation::Multiply))
        );
        assert_eq!(
            combiner_kind(Color, TreeType::Compositing, Operation::Mix),
            (CombinerKind::MixRgb, Some(Operation::Mix))
        );
        assert_eq!(combiner_kind(Shader, TreeType::Shader, Operation::Add).0, CombinerKind::AddShader);
        assert_eq!(combiner_kind(Geometry, TreeType::Geometry, Operation::Mix).0, CombinerKind::JoinGeometry);
        assert_eq!(
            combiner_kind(Geometry, TreeType::Geometry, Operation::Union),
            (CombinerKind::MeshBoolean, Some(Operation::Union))
        );
    }

    #[test]
    fn test_binary_chain_layout() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let entries = vec![
            entry(&mut graph, 0.0, -400.0, false),
            entry(&mut graph, 100.0, 0.0, false),
            entry(&mut graph, 50.0, -200.0, false),
        ];
        let settings = WranglerSettings {
            merge_hide: MergeHide::Never,
            ..WranglerSettings::default()
        };
        let chain = build_chain(&mut graph, BucketCategory::Color, entries, Operation::Mix, &settings);

        assert_eq!(chain.combiners.len(), 2);
        let ys: Vec<f32> = chain.members.iter().map(|e| e.y).collect();
        assert_eq!(ys, vec![0.0, -200.0, -400.0]);

        let outer = graph.node(chain.outermost().unwrap()).unwrap();
        assert_eq!(outer.position, [100.0 + 140.0 + MERGE_MARGIN_X, -300.0]);
        assert!(outer.selected);
        let inner = graph.node(chain.innermost().unwrap()).unwrap();
        assert_eq!(inner.position[1], -300.0 + STEP_EXPANDED);
        assert_eq!(graph.active(), chain.outermost());
        assert!(chain.members.iter().all(|e| !graph.node(e.node).unwrap().selected));
    }

    #[test]
    fn test_collapsed_chain_drops() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let entries = vec![
            entry(&mut graph, 0.0, 0.0, true),
            entry(&mut graph, 0.0, -100.0, true),
            entry(&mut graph, 0.0, -200.0, true),
        ];
        let settings = WranglerSettings::default();
        let chain = build_chain(&mut graph, BucketCategory::Value, entries, Operation::Add, &settings);

        // Centre of the two lowest, lifted for a collapsed lowest member
        let anchor = -150.0 + 40.0;
        let outer = graph.node(chain.outermost().unwrap()).unwrap();
        let inner = graph.node(chain.innermost().unwrap()).unwrap();
        assert!(outer.hidden);
        assert_eq!(outer.position[1], anchor - 50.0);
        assert_eq!(inner.position[1], anchor - 50.0 + 100.0 - 50.0);
    }

    #[test]
    fn test_shader_lift_follows_non_shader_collapse() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let entries = vec![
            entry(&mut graph, 0.0, 0.0, false),
            entry(&mut graph, 0.0, -100.0, true),
        ];
        // Shader combiners stay expanded, other combiners collapse
        let settings = WranglerSettings::default();
        let chain = build_chain(&mut graph, BucketCategory::Shader, entries, Operation::Mix, &settings);

        let outer = graph.node(chain.outermost().unwrap()).unwrap();
        assert!(!outer.hidden);
        assert_eq!(outer.position[1], -50.0 + 40.0);

        let entries = vec![
            entry(&mut graph, 0.0, 0.0, false),
            entry(&mut graph, 0.0, -100.0, true),
        ];
        let settings = WranglerSettings {
            merge_hide: MergeHide::Never,
            ..WranglerSettings::default()
        };
        let chain = build_chain(&mut graph, BucketCategory::Shader, entries, Operation::Mix, &settings);
        let outer = graph.node(chain.outermost().unwrap()).unwrap();
        assert_eq!(outer.position[1], -50.0 + 80.0);
    }

    #[test]
    fn test_single_member_gets_one_combiner() {
        let mut graph = Graph::new("T", TreeType::Shader);
        let entries = vec![entry(&mut graph, 0.0, 0.0, false)];
        let chain = build_chain(
            &mut graph,
            BucketCategory::Color,
            entries,
            Operation::Multiply,
            &WranglerSettings::default(),
        );
        assert_eq!(chain.combiners.len(), 1);
    }

    #[test]
    fn test_multi_input_anchor() {
        let mut graph = Graph::new("T", TreeType::Geometry);
        let entries = vec![
            entry(&mut graph, 0.0, 0.0, false),
            entry(&mut graph, 0.0, -300.0, false),
        ];
        let chain = build_chain(
            &mut graph,
            BucketCategory::Geometry,
            entries.clone(),
            Operation::Join,
            &WranglerSettings::default(),
        );
        assert_eq!(chain.combiners.len(), 1);
        let node = graph.node(chain.combiners[0]).unwrap();
        assert_eq!(node.position[1], -150.0);

        let settings = WranglerSettings {
            merge_position: MergePosition::Bottom,
            ..WranglerSettings::default()
        };
        let chain = build_chain(&mut graph, BucketCategory::Geometry, entries, Operation::Join, &settings);
        assert_eq!(graph.node(chain.combiners[0]).unwrap().position[1], -300.0);
    }
}
