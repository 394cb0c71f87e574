// SPDX-License-Identifier: MIT OR Apache-2.0
//! Label editing on selected nodes.

use crate::error::{OperatorError, Result};
use crate::report::OperatorStatus;
use nodewrangle_graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};

/// Where a copied label comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelSource {
    /// The active node's label
    #[default]
    FromActive,
    /// The label of the node feeding the first linked input
    FromNode,
    /// The name of the socket feeding the first linked input
    FromSocket,
}

/// Text edits applied by [`modify_labels`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelEdit {
    /// Added to the beginning
    pub prepend: String,
    /// Added to the end
    pub append: String,
    /// Text to replace; empty disables replacement
    pub replace_from: String,
    /// Replacement text
    pub replace_to: String,
}

fn selection(graph: &Graph) -> Result<Vec<NodeId>> {
    let selected = graph.selected_nodes();
    if selected.is_empty() {
        return Err(OperatorError::EmptySelection);
    }
    Ok(selected)
}

/// Copy a label onto every selected node
pub fn copy_label(graph: &mut Graph, source: LabelSource) -> Result<OperatorStatus> {
    let selected = selection(graph)?;
    let mut updates: Vec<(NodeId, String)> = Vec::new();

    match source {
        LabelSource::FromActive => {
            let active = graph.active().ok_or(OperatorError::NoActiveNode)?;
            let label = graph.node(active).map(|n| n.label.clone()).unwrap_or_default();
            updates.extend(
                selected
                    .into_iter()
                    .filter(|id| *id != active)
                    .map(|id| (id, label.clone())),
            );
        }
        LabelSource::FromNode | LabelSource::FromSocket => {
            for id in selected {
                let Some(node) = graph.node(id) else { continue };
                let upstream = node
                    .inputs
                    .iter()
                    .find_map(|input| graph.links_to(input.id).next());
                let Some(link) = upstream else { continue };
                let label = if source == LabelSource::FromNode {
                    graph.node(link.from_node).map(|n| n.label.clone())
                } else {
                    graph.socket(link.from_node, link.from_socket).map(|s| s.name.clone())
                };
                if let Some(label) = label {
                    updates.push((id, label));
                }
            }
        }
    }

    for (id, label) in updates {
        if let Some(node) = graph.node_mut(id) {
            node.label = label;
        }
    }
    Ok(OperatorStatus::Finished)
}

/// Remove the label of every selected node
pub fn clear_label(graph: &mut Graph) -> Result<OperatorStatus> {
    for id in selection(graph)? {
        if let Some(node) = graph.node_mut(id) {
            node.label.clear();
        }
    }
    Ok(OperatorStatus::Finished)
}

/// Rewrite the label of every selected node
pub fn modify_labels(graph: &mut Graph, edit: &LabelEdit) -> Result<OperatorStatus> {
    for id in selection(graph)? {
        if let Some(node) = graph.node_mut(id) {
            let body = if edit.replace_from.is_empty() {
                node.label.clone()
            } else {
                node.label.replace(&edit.replace_from, &edit.replace_to)
            };
            node.label = format!("{}{}{}", edit.prepend, body, edit.append);
        }
    }
    Ok(OperatorStatus::Finished)
}
