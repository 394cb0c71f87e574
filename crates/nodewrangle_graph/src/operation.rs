// SPDX-License-Identifier: MIT OR Apache-2.0
//! Operation symbols carried by combiner nodes.
//!
//! A single closed vocabulary covers colour blend types, scalar math
//! operations and geometry combine operations. Several symbols (`Add`,
//! `Difference`, ...) belong to more than one family; the family tables
//! below are the source of truth for membership.

use serde::{Deserialize, Serialize};

/// Blend type, math operation or geometry combine operation
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    // Blend types
    Mix,
    Darken,
    Multiply,
    Burn,
    Lighten,
    Screen,
    Dodge,
    Add,
    Overlay,
    SoftLight,
    LinearLight,
    Difference,
    Exclusion,
    Subtract,
    Divide,
    Hue,
    Saturation,
    Color,
    Value,

    // Math-only operations
    MultiplyAdd,
    Power,
    Logarithm,
    Sqrt,
    Absolute,
    Minimum,
    Maximum,
    LessThan,
    GreaterThan,
    Round,
    Floor,
    Ceil,
    Fract,
    Modulo,
    Sine,
    Cosine,
    Tangent,

    // Geometry-only operations
    Join,
    Intersect,
    Union,
}

/// Colour blend types, in menu order
pub const BLEND_TYPES: &[Operation] = &[
    Operation::Mix,
    Operation::Darken,
    Operation::Multiply,
    Operation::Burn,
    Operation::Lighten,
    Operation::Screen,
    Operation::Dodge,
    Operation::Add,
    Operation::Overlay,
    Operation::SoftLight,
    Operation::LinearLight,
    Operation::Difference,
    Operation::Exclusion,
    Operation::Subtract,
    Operation::Divide,
    Operation::Hue,
    Operation::Saturation,
    Operation::Color,
    Operation::Value,
];

/// Scalar math operations, in menu order
pub const MATH_OPERATIONS: &[Operation] = &[
    Operation::Add,
    Operation::Subtract,
    Operation::Multiply,
    Operation::Divide,
    Operation::MultiplyAdd,
    Operation::Power,
    Operation::Logarithm,
    Operation::Sqrt,
    Operation::Absolute,
    Operation::Minimum,
    Operation::Maximum,
    Operation::LessThan,
    Operation::GreaterThan,
    Operation::Round,
    Operation::Floor,
    Operation::Ceil,
    Operation::Fract,
    Operation::Modulo,
    Operation::Sine,
    Operation::Cosine,
    Operation::Tangent,
];

/// Geometry combine operations
pub const GEOMETRY_OPERATIONS: &[Operation] = &[
    Operation::Join,
    Operation::Intersect,
    Operation::Union,
    Operation::Difference,
];

/// Shader combine operations
pub const SHADER_OPERATIONS: &[Operation] = &[Operation::Mix, Operation::Add];

impl Operation {
    /// Upper-case symbol, as shown in menus and notifications
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Mix => "MIX",
            Self::Darken => "DARKEN",
            Self::Multiply => "MULTIPLY",
            Self::Burn => "BURN",
            Self::Lighten => "LIGHTEN",
            Self::Screen => "SCREEN",
            Self::Dodge => "DODGE",
            Self::Add => "ADD",
            Self::Overlay => "OVERLAY",
            Self::SoftLight => "SOFT_LIGHT",
            Self::LinearLight => "LINEAR_LIGHT",
            Self::Difference => "DIFFERENCE",
            Self::Exclusion => "EXCLUSION",
            Self::Subtract => "SUBTRACT",
            Self::Divide => "DIVIDE",
            Self::Hue => "HUE",
            Self::Saturation => "SATURATION",
            Self::Color => "COLOR",
            Self::Value => "VALUE",
            Self::MultiplyAdd => "MULTIPLY_ADD",
            Self::Power => "POWER",
            Self::Logarithm => "LOGARITHM",
            Self::Sqrt => "SQRT",
            Self::Absolute => "ABSOLUTE",
            Self::Minimum => "MINIMUM",
            Self::Maximum => "MAXIMUM",
            Self::LessThan => "LESS_THAN",
            Self::GreaterThan => "GREATER_THAN",
            Self::Round => "ROUND",
            Self::Floor => "FLOOR",
            Self::Ceil => "CEIL",
            Self::Fract => "FRACT",
            Self::Modulo => "MODULO",
            Self::Sine => "SINE",
            Self::Cosine => "COSINE",
            Self::Tangent => "TANGENT",
            Self::Join => "JOIN",
            Self::Intersect => "INTERSECT",
            Self::Union => "UNION",
        }
    }

    /// Whether this symbol is a colour blend type
    pub fn is_blend_type(&self) -> bool {
        BLEND_TYPES.contains(self)
    }

    /// Whether this symbol is a scalar math operation
    pub fn is_math(&self) -> bool {
        MATH_OPERATIONS.contains(self)
    }

    /// Whether this symbol is a geometry combine operation
    pub fn is_geometry(&self) -> bool {
        GEOMETRY_OPERATIONS.contains(self)
    }
}

/// Step to the neighbouring entry of `table`, wrapping at both ends.
///
/// Returns `None` when `current` is not part of the table.
pub fn cycle_in(table: &[Operation], current: Operation, forward: bool) -> Option<Operation> {
    let index = table.iter().position(|op| *op == current)?;
    let len = table.len();
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    Some(table[next])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_symbols() {
        assert!(Operation::Add.is_blend_type());
        assert!(Operation::Add.is_math());
        assert!(Operation::Difference.is_geometry());
        assert!(Operation::Difference.is_blend_type());
        assert!(!Operation::Join.is_blend_type());
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(cycle_in(BLEND_TYPES, Operation::Value, true), Some(Operation::Mix));
        assert_eq!(cycle_in(BLEND_TYPES, Operation::Mix, false), Some(Operation::Value));
        assert_eq!(cycle_in(MATH_OPERATIONS, Operation::Add, true), Some(Operation::Subtract));
        assert_eq!(cycle_in(MATH_OPERATIONS, Operation::Join, true), None);
    }
}
