// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph-rewriting operators for `NodeWrangle`.
//!
//! This crate holds the engines that restructure a [`nodewrangle_graph::Graph`]:
//! - Merging a selection through chains of combiner nodes
//! - Inserting reroutes after node outputs
//! - Swapping links between sockets
//! - Aligning nodes along one axis
//! - Label, selection, frame, cleanup and linking helpers
//! - Press-drag-release gestures
//!
//! ## Architecture
//!
//! Every operator is a plain function taking `&mut Graph` and returning an
//! [`OperatorStatus`]. Preconditions fail with [`OperatorError`] before any
//! mutation; skipped work is reported through [`Reports`].
//! [`OperatorCall`] names each operator and its parameters so they can be
//! driven from RON, and [`History`] records snapshots for undo.

pub mod align;
pub mod batch;
pub mod chain;
pub mod classify;
pub mod cleanup;
pub mod connect;
pub mod cycle;
pub mod error;
pub mod frame;
pub mod gesture;
pub mod history;
pub mod labels;
pub mod merge;
pub mod operators;
pub mod report;
pub mod reroute;
pub mod select;
pub mod settings;
pub mod swap;

#[cfg(test)]
mod test_support;

pub use classify::{BucketCategory, MergeRequest, MergeType};
pub use error::OperatorError;
pub use gesture::{GestureKind, GestureStep, LazyGesture, PointerEvent};
pub use history::{History, HistoryError};
pub use operators::{run_operator, run_recorded, OperatorCall, OperatorOutcome};
pub use report::{OperatorStatus, Report, ReportLevel, Reports};
pub use settings::{MergeHide, MergePosition, SettingsError, WranglerSettings, SETTINGS_FILE_NAME};
