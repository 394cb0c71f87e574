// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bulk edits of combiner settings.

use crate::error::{OperatorError, Result};
use crate::report::{OperatorStatus, Reports};
use nodewrangle_graph::catalog::CombinerKind;
use nodewrangle_graph::operation::{cycle_in, BLEND_TYPES, MATH_OPERATIONS};
use nodewrangle_graph::{Graph, Node, NodeCategory, NodeKind, Operation, SocketValue};
use serde::{Deserialize, Serialize};

/// New value for a blend type or math operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStep {
    /// Use this operation
    Set(Operation),
    /// Next entry of the table, wrapping
    Next,
    /// Previous entry of the table, wrapping
    Prev,
}

/// Which table a node's operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Blend,
    Math,
}

/// Colour mix and math nodes, synthesised or not.
///
/// Ordinary nodes count when they carry an operation: colour nodes
/// blend, value nodes do math.
fn family(node: &Node) -> Option<Family> {
    match (&node.kind, node.category) {
        (NodeKind::Combiner(CombinerKind::Mix | CombinerKind::MixRgb), _) => Some(Family::Blend),
        (NodeKind::Combiner(CombinerKind::Math), _) => Some(Family::Math),
        (NodeKind::Generic, NodeCategory::Color) if node.operation.is_some() => Some(Family::Blend),
        (NodeKind::Generic, NodeCategory::Value) if node.operation.is_some() => Some(Family::Math),
        _ => None,
    }
}

/// Change the blend type of selected colour mix nodes and the operation
/// of selected math nodes. `None` leaves that family untouched.
pub fn batch_change(
    graph: &mut Graph,
    blend_type: Option<OperationStep>,
    operation: Option<OperationStep>,
    reports: &mut Reports,
) -> Result<OperatorStatus> {
    let selected = graph.selected_nodes();
    if selected.is_empty() {
        return Err(OperatorError::EmptySelection);
    }

    let mut changed = 0;
    for id in selected {
        let Some(node) = graph.node_mut(id) else { continue };
        let (table, step) = match family(node) {
            Some(Family::Blend) => (BLEND_TYPES, blend_type),
            Some(Family::Math) => (MATH_OPERATIONS, operation),
            None => continue,
        };
        let Some(step) = step else { continue };
        let next = match step {
            OperationStep::Set(op) if table.contains(&op) => Some(op),
            OperationStep::Set(op) => {
                reports.warning(format!("{} does not support {}", node.display_name(), op.symbol()));
                None
            }
            OperationStep::Next | OperationStep::Prev => node
                .operation
                .and_then(|current| cycle_in(table, current, step == OperationStep::Next)),
        };
        if let Some(op) = next {
            node.operation = Some(op);
            changed += 1;
        }
    }

    tracing::info!(changed, "batch changed nodes");
    Ok(OperatorStatus::Finished)
}

/// Set (0.0 or 1.0) or nudge (anything else) the factor of selected mix
/// nodes, expanding them
pub fn change_mix_factor(graph: &mut Graph, option: f32) -> Result<OperatorStatus> {
    let selected = graph.selected_nodes();
    if selected.is_empty() {
        return Err(OperatorError::EmptySelection);
    }

    for id in selected {
        let Some(node) = graph.node_mut(id) else { continue };
        let NodeKind::Combiner(kind @ (CombinerKind::Mix | CombinerKind::MixRgb | CombinerKind::MixShader)) =
            node.kind
        else {
            continue;
        };
        let Some(factor) = kind.factor_input().and_then(|i| node.inputs.get_mut(i)) else {
            continue;
        };
        let value = if option == 0.0 || option == 1.0 {
            option
        } else {
            factor.default_value.as_ref().and_then(SocketValue::as_float).unwrap_or(0.0) + option
        };
        factor.default_value = Some(SocketValue::Float(value));
        node.hidden = false;
    }
    Ok(OperatorStatus::Finished)
}
