// SPDX-License-Identifier: MIT OR Apache-2.0
//! Precondition failures that cancel an operator.

use nodewrangle_graph::{ConnectionError, GraphError, TreeType};

/// Reasons an operator refuses to run
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// Operator is not available for this tree
    #[error("Operator not available in {0:?} node trees")]
    WrongTree(TreeType),

    /// Nothing selected
    #[error("No nodes selected")]
    EmptySelection,

    /// Wrong number of selected nodes
    #[error("Expected {expected} selected nodes, found {found}")]
    SelectionSize {
        /// Accepted selection sizes
        expected: &'static str,
        /// Actual selection size
        found: usize,
    },

    /// No active node, or it is not selected
    #[error("No active node")]
    NoActiveNode,

    /// Active node has nothing to link from
    #[error("Active node has no usable outputs")]
    NoOutputs,

    /// Named node does not exist
    #[error("Node not found: {0}")]
    MissingNode(String),

    /// Graph has no nodes
    #[error("Node tree is empty")]
    EmptyGraph,

    /// Structural edit failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Link edit failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Result type for operators
pub type Result<T> = std::result::Result<T, OperatorError>;
