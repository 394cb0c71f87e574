// SPDX-License-Identifier: MIT OR Apache-2.0
//! Operator preferences.
//!
//! Stored as RON next to the graph files the runner processes.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "nodewrangle.ron";

/// Which synthesised combiners start collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergeHide {
    /// Collapse every combiner
    Always,
    /// Collapse everything except shader combiners
    #[default]
    NonShader,
    /// Never collapse
    Never,
}

/// Vertical anchor of a new combiner chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergePosition {
    /// Between the two lowest merged nodes
    #[default]
    Center,
    /// Level with the lowest merged node
    Bottom,
}

/// Operator preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WranglerSettings {
    /// Combiner collapsing
    pub merge_hide: MergeHide,
    /// Combiner chain anchor
    pub merge_position: MergePosition,
    /// Default gap between aligned nodes
    pub align_margin: i32,
}

impl Default for WranglerSettings {
    fn default() -> Self {
        Self {
            merge_hide: MergeHide::default(),
            merge_position: MergePosition::default(),
            align_margin: 50,
        }
    }
}

impl WranglerSettings {
    /// Whether non-shader combiners are collapsed
    pub fn hide_combiners(&self) -> bool {
        matches!(self.merge_hide, MergeHide::Always | MergeHide::NonShader)
    }

    /// Whether shader combiners are collapsed
    pub fn hide_shader_combiners(&self) -> bool {
        self.merge_hide == MergeHide::Always
    }

    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default();
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Settings I/O failure
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Invalid settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialised
    #[error("Failed to serialise settings: {0}")]
    Serialize(#[from] ron::Error),
}
