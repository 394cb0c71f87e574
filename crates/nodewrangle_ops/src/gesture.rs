// SPDX-License-Identifier: MIT OR Apache-2.0
//! Press-drag-release gestures that merge or connect two nodes.
//!
//! A gesture starts on the node under the pointer, follows pointer
//! motion without touching the graph, and resolves on release against the
//! node under the pointer at that moment. All transient state lives in the
//! gesture's own [`GestureContext`].

use crate::classify::{MergeRequest, MergeType};
use crate::connect::autolink;
use crate::error::Result;
use crate::merge::merge_nodes;
use crate::report::{OperatorStatus, Reports};
use crate::settings::WranglerSettings;
use nodewrangle_graph::{Graph, NodeId, NodeKind, Operation};
use serde::{Deserialize, Serialize};

/// What a gesture does on release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    /// Merge the two nodes with a mix chain
    Mix,
    /// Link the two nodes
    Connect,
}

/// Pointer input fed to a running gesture, in graph space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Pointer moved
    Move([f32; 2]),
    /// Button released
    Release([f32; 2]),
    /// Escape or right click
    Cancel,
}

/// Transient state of one gesture
#[derive(Debug, Clone, PartialEq)]
pub struct GestureContext {
    /// Node the gesture started on
    pub source: NodeId,
    /// Node currently under the pointer
    pub hovered: Option<NodeId>,
    /// Pointer positions seen so far, for drawing the drag line
    pub path: Vec<[f32; 2]>,
    saved_selection: Vec<NodeId>,
    saved_active: Option<NodeId>,
}

/// Result of feeding an event to a gesture
#[derive(Debug)]
pub enum GestureStep {
    /// Still waiting for more input
    Running(LazyGesture),
    /// Resolved
    Done(OperatorStatus),
}

impl GestureStep {
    /// Status to report to the caller
    pub fn status(&self) -> OperatorStatus {
        match self {
            Self::Running(_) => OperatorStatus::RunningModal,
            Self::Done(status) => *status,
        }
    }
}

/// A lazy mix or lazy connect gesture
#[derive(Debug)]
pub struct LazyGesture {
    kind: GestureKind,
    context: GestureContext,
}

impl LazyGesture {
    /// Start a gesture at `pos`.
    ///
    /// Passes through when no node is under the pointer.
    pub fn begin(graph: &Graph, kind: GestureKind, pos: [f32; 2]) -> GestureStep {
        let Some(source) = node_at_pos(graph, pos) else {
            return GestureStep::Done(OperatorStatus::PassThrough);
        };
        tracing::debug!(?kind, ?source, "gesture started");
        GestureStep::Running(Self {
            kind,
            context: GestureContext {
                source,
                hovered: Some(source),
                path: vec![pos],
                saved_selection: graph.selected_nodes(),
                saved_active: graph.active(),
            },
        })
    }

    /// Gesture kind
    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// Transient gesture state
    pub fn context(&self) -> &GestureContext {
        &self.context
    }

    /// Advance the gesture with one pointer event
    pub fn handle(
        mut self,
        graph: &mut Graph,
        settings: &WranglerSettings,
        reports: &mut Reports,
        event: PointerEvent,
    ) -> Result<GestureStep> {
        match event {
            PointerEvent::Move(pos) => {
                self.context.path.push(pos);
                self.context.hovered = node_at_pos(graph, pos);
                Ok(GestureStep::Running(self))
            }
            PointerEvent::Cancel => {
                tracing::debug!(kind = ?self.kind, "gesture cancelled");
                Ok(GestureStep::Done(OperatorStatus::Cancelled))
            }
            PointerEvent::Release(pos) => {
                self.context.hovered = node_at_pos(graph, pos);
                self.release(graph, settings, reports).map(GestureStep::Done)
            }
        }
    }

    fn release(self, graph: &mut Graph, settings: &WranglerSettings, reports: &mut Reports) -> Result<OperatorStatus> {
        let GestureContext {
            source,
            hovered,
            saved_selection,
            saved_active,
            ..
        } = self.context;
        if !graph.contains_node(source) {
            return Ok(OperatorStatus::Cancelled);
        }
        let Some(target) = hovered.filter(|t| *t != source) else {
            return Ok(OperatorStatus::Finished);
        };

        match self.kind {
            GestureKind::Mix => {
                graph.deselect_all();
                graph.set_selected(source, true);
                graph.set_selected(target, true);
                let merged = merge_nodes(
                    graph,
                    MergeRequest::new(Operation::Mix, MergeType::Auto),
                    settings,
                    reports,
                );
                if !matches!(merged, Ok(OperatorStatus::Finished)) {
                    restore_selection(graph, &saved_selection, saved_active);
                }
                merged
            }
            GestureKind::Connect => {
                if !autolink(graph, source, target)? {
                    reports.warning("No sockets to link");
                }
                restore_selection(graph, &saved_selection, saved_active);
                Ok(OperatorStatus::Finished)
            }
        }
    }
}

fn restore_selection(graph: &mut Graph, selection: &[NodeId], active: Option<NodeId>) {
    graph.deselect_all();
    for id in selection {
        graph.set_selected(*id, true);
    }
    graph.set_active(active);
}

/// Topmost non-frame node containing `point`
pub fn node_at_pos(graph: &Graph, point: [f32; 2]) -> Option<NodeId> {
    graph
        .nodes()
        .filter(|n| n.kind != NodeKind::Frame && n.contains(point))
        .last()
        .map(|n| n.id)
}
