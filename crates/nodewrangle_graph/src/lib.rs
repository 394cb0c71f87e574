// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph model for `NodeWrangle`.
//!
//! This crate holds the editable graph the operators rewrite:
//! - Nodes with ordered, typed input/output sockets
//! - Links from output sockets to input sockets
//! - Frames grouping nodes into a parent forest
//! - Selection and active-node state
//!
//! ## Architecture
//!
//! Nodes and links live in insertion-ordered arenas keyed by opaque
//! UUID handles. Links store handle pairs, so sockets never own or
//! point back at the links touching them; queries go through [`Graph`].

pub mod socket;
pub mod node;
pub mod link;
pub mod graph;
pub mod operation;
pub mod catalog;

pub use node::{Node, NodeCategory, NodeId, NodeKind};
pub use socket::{Socket, SocketDirection, SocketId, SocketType, SocketValue};
pub use link::{Link, LinkId};
pub use graph::{ConnectionError, CycleError, Graph, GraphError, TreeType};
pub use operation::Operation;
pub use catalog::{CombinerKind, RenderPass};
