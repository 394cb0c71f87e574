// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named operators and their parameter records.
//!
//! Every operator is reachable through [`OperatorCall`], whose serde
//! representation doubles as the stable operator name, e.g.
//! `merge_nodes(mode: Mix, merge_type: Auto)` in RON.

use crate::align::align_nodes;
use crate::batch::{batch_change, change_mix_factor, OperationStep};
use crate::classify::{MergeRequest, MergeType};
use crate::cleanup::{delete_unused, DeleteUnused};
use crate::connect::{detach_outputs, link_active_to_selected, link_to_output, make_link, LinkActiveOptions};
use crate::error::Result;
use crate::frame::frame_selected;
use crate::gesture::{GestureKind, GestureStep, LazyGesture, PointerEvent};
use crate::history::{History, HistoryError, Snapshot};
use crate::labels::{clear_label, copy_label, modify_labels, LabelEdit, LabelSource};
use crate::merge::merge_nodes;
use crate::report::{OperatorStatus, Report, Reports};
use crate::reroute::{add_reroutes, RerouteFilter};
use crate::select::{select_parent_children, SelectRelative};
use crate::settings::WranglerSettings;
use crate::swap::swap_links;
use nodewrangle_graph::{Graph, Operation};
use serde::{Deserialize, Serialize};

/// An operator invocation with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCall {
    /// Merge the selection through combiner chains
    MergeNodes {
        /// Operation symbol
        mode: Operation,
        /// Merge-type selector
        #[serde(default)]
        merge_type: MergeType,
    },
    /// Add reroutes after the selected nodes' outputs
    AddReroutes {
        /// Which outputs get a reroute
        #[serde(default)]
        filter: RerouteFilter,
    },
    /// Swap outputs of two nodes or inputs of one
    SwapLinks,
    /// Line the selection up
    AlignNodes {
        /// Gap between nodes; the configured margin when absent
        #[serde(default)]
        margin: Option<i32>,
    },
    /// Copy a label onto the selection
    CopyLabel {
        /// Where the label comes from
        #[serde(default)]
        source: LabelSource,
    },
    /// Clear the selection's labels
    ClearLabel,
    /// Edit the selection's labels
    ModifyLabels(LabelEdit),
    /// Grow the selection to parents or children
    SelectParentChildren {
        /// Direction
        #[serde(default)]
        relative: SelectRelative,
    },
    /// Change blend types and math operations
    BatchChange {
        /// New blend type for colour mix nodes
        #[serde(default)]
        blend_type: Option<OperationStep>,
        /// New operation for math nodes
        #[serde(default)]
        operation: Option<OperationStep>,
    },
    /// Set or nudge mix factors
    ChangeMixFactor {
        /// 0.0 or 1.0 set the factor, anything else is added
        option: f32,
    },
    /// Delete nodes that feed nothing
    DeleteUnused(DeleteUnused),
    /// Frame the selection
    FrameSelected {
        /// Frame label
        #[serde(default)]
        label: String,
        /// Frame colour
        #[serde(default)]
        color: Option<[f32; 3]>,
    },
    /// Link two named nodes by socket index
    MakeLink {
        /// Source node name
        from: String,
        /// Output index
        output: usize,
        /// Destination node name
        to: String,
        /// Input index
        input: usize,
    },
    /// Link the active node into the selection
    LinkActiveToSelected(LinkActiveOptions),
    /// Link the active node into the tree output
    LinkToOutput,
    /// Swap the selection for copies that keep only their inputs
    DetachOutputs,
    /// Drag from one node to another and mix them
    LazyMix {
        /// Press position
        from: [f32; 2],
        /// Release position
        to: [f32; 2],
    },
    /// Drag from one node to another and link them
    LazyConnect {
        /// Press position
        from: [f32; 2],
        /// Release position
        to: [f32; 2],
    },
}

impl OperatorCall {
    /// Stable operator name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MergeNodes { .. } => "merge_nodes",
            Self::AddReroutes { .. } => "add_reroutes",
            Self::SwapLinks => "swap_links",
            Self::AlignNodes { .. } => "align_nodes",
            Self::CopyLabel { .. } => "copy_label",
            Self::ClearLabel => "clear_label",
            Self::ModifyLabels(_) => "modify_labels",
            Self::SelectParentChildren { .. } => "select_parent_children",
            Self::BatchChange { .. } => "batch_change",
            Self::ChangeMixFactor { .. } => "change_mix_factor",
            Self::DeleteUnused(_) => "delete_unused",
            Self::FrameSelected { .. } => "frame_selected",
            Self::MakeLink { .. } => "make_link",
            Self::LinkActiveToSelected(_) => "link_active_to_selected",
            Self::LinkToOutput => "link_to_output",
            Self::DetachOutputs => "detach_outputs",
            Self::LazyMix { .. } => "lazy_mix",
            Self::LazyConnect { .. } => "lazy_connect",
        }
    }

    /// Run the operator against `graph`
    pub fn execute(&self, graph: &mut Graph, settings: &WranglerSettings, reports: &mut Reports) -> Result<OperatorStatus> {
        match self {
            Self::MergeNodes { mode, merge_type } => {
                merge_nodes(graph, MergeRequest::new(*mode, *merge_type), settings, reports)
            }
            Self::AddReroutes { filter } => add_reroutes(graph, *filter, reports),
            Self::SwapLinks => swap_links(graph, reports),
            Self::AlignNodes { margin } => align_nodes(graph, margin.unwrap_or(settings.align_margin), reports),
            Self::CopyLabel { source } => copy_label(graph, *source),
            Self::ClearLabel => clear_label(graph),
            Self::ModifyLabels(edit) => modify_labels(graph, edit),
            Self::SelectParentChildren { relative } => select_parent_children(graph, *relative),
            Self::BatchChange { blend_type, operation } => batch_change(graph, *blend_type, *operation, reports),
            Self::ChangeMixFactor { option } => change_mix_factor(graph, *option),
            Self::DeleteUnused(options) => delete_unused(graph, *options, reports),
            Self::FrameSelected { label, color } => frame_selected(graph, label, *color),
            Self::MakeLink { from, output, to, input } => make_link(graph, from, *output, to, *input),
            Self::LinkActiveToSelected(options) => link_active_to_selected(graph, *options, reports),
            Self::LinkToOutput => link_to_output(graph, reports),
            Self::DetachOutputs => detach_outputs(graph),
            Self::LazyMix { from, to } => drag(graph, settings, reports, GestureKind::Mix, *from, *to),
            Self::LazyConnect { from, to } => drag(graph, settings, reports, GestureKind::Connect, *from, *to),
        }
    }
}

/// Press at `from`, move to `to` and release there
fn drag(
    graph: &mut Graph,
    settings: &WranglerSettings,
    reports: &mut Reports,
    kind: GestureKind,
    from: [f32; 2],
    to: [f32; 2],
) -> Result<OperatorStatus> {
    let mut step = LazyGesture::begin(graph, kind, from);
    for event in [PointerEvent::Move(to), PointerEvent::Release(to)] {
        step = match step {
            GestureStep::Running(gesture) => gesture.handle(graph, settings, reports, event)?,
            done @ GestureStep::Done(_) => return Ok(done.status()),
        };
    }
    Ok(step.status())
}

/// How an operator run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorOutcome {
    /// Completion status
    pub status: OperatorStatus,
    /// Notifications emitted during the run
    pub reports: Vec<Report>,
}

/// Run one operator, turning precondition failures into
/// [`OperatorStatus::Cancelled`] with an error report
pub fn run_operator(graph: &mut Graph, settings: &WranglerSettings, call: &OperatorCall) -> OperatorOutcome {
    let mut reports = Reports::new();
    let status = match call.execute(graph, settings, &mut reports) {
        Ok(status) => status,
        Err(err) => {
            reports.error(err.to_string());
            OperatorStatus::Cancelled
        }
    };
    tracing::debug!(operator = call.name(), ?status, "operator done");
    OperatorOutcome {
        status,
        reports: reports.into_entries(),
    }
}

/// Like [`run_operator`], committing finished runs to `history`
pub fn run_recorded(
    graph: &mut Graph,
    settings: &WranglerSettings,
    call: &OperatorCall,
    history: &mut History,
) -> std::result::Result<OperatorOutcome, HistoryError> {
    let before = Snapshot::take(graph)?;
    let outcome = run_operator(graph, settings, call);
    if outcome.status == OperatorStatus::Finished {
        history.commit(call.name(), before, graph)?;
    }
    Ok(outcome)
}
