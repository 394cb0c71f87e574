// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketId(pub Uuid);

impl SocketId {
    /// Create a new random socket ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketDirection {
    /// Input socket
    Input,
    /// Output socket
    Output,
}

/// Data type carried by a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketType {
    /// Closure/BSDF
    Shader,
    /// Geometry set
    Geometry,
    /// RGBA colour
    Rgba,
    /// Scalar float
    Value,
    /// 3D vector
    Vector,
    /// Integer
    Int,
    /// Boolean
    Boolean,
    /// String
    String,
    /// Anything else (custom trees, data-block references)
    Custom,
}

impl SocketType {
    /// Display name used in notifications
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shader => "Shader",
            Self::Geometry => "Geometry",
            Self::Rgba => "Color",
            Self::Value => "Value",
            Self::Vector => "Vector",
            Self::Int => "Integer",
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::Custom => "Custom",
        }
    }
}

/// A socket on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Socket {
    /// Unique socket ID
    pub id: SocketId,
    /// Socket name
    pub name: String,
    /// Socket direction
    pub direction: SocketDirection,
    /// Data type
    pub socket_type: SocketType,
    /// Accepts more than one incoming link (inputs only)
    pub multi_input: bool,
    /// Disabled sockets are hidden by the node's current mode
    pub enabled: bool,
    /// Unlinked value (inputs only)
    pub default_value: Option<SocketValue>,
}

impl Socket {
    /// Create a new input socket
    pub fn input(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            id: SocketId::new(),
            name: name.into(),
            direction: SocketDirection::Input,
            socket_type,
            multi_input: false,
            enabled: true,
            default_value: None,
        }
    }

    /// Create a new output socket
    pub fn output(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            id: SocketId::new(),
            name: name.into(),
            direction: SocketDirection::Output,
            socket_type,
            multi_input: false,
            enabled: true,
            default_value: None,
        }
    }

    /// Allow several incoming links; ignored on outputs
    pub fn multi(mut self) -> Self {
        self.multi_input = self.direction == SocketDirection::Input;
        self
    }

    /// Mark the socket as disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: SocketValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Whether this is an input socket
    pub fn is_input(&self) -> bool {
        self.direction == SocketDirection::Input
    }

    /// Whether this is an output socket
    pub fn is_output(&self) -> bool {
        self.direction == SocketDirection::Output
    }
}

/// Value that can be stored in an unlinked input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SocketValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// 3D vector
    Vector([f32; 3]),
    /// Colour
    Color([f32; 4]),
    /// String
    String(String),
}

impl SocketValue {
    /// Get the socket type for this value
    pub fn socket_type(&self) -> SocketType {
        match self {
            Self::Bool(_) => SocketType::Boolean,
            Self::Int(_) => SocketType::Int,
            Self::Float(_) => SocketType::Value,
            Self::Vector(_) => SocketType::Vector,
            Self::Color(_) => SocketType::Rgba,
            Self::String(_) => SocketType::String,
        }
    }

    /// The float payload, if any
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}
