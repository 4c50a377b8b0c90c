//! Pipeline configuration.
//!
//! [`PipelineConfig`] carries everything one invocation needs: which column to group by, which
//! column positions to drop, how to name outputs, and what to do when two outputs share a name.
//! It can be built in code, deserialized from a JSON file, or assembled by the CLI.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, ProcessingResult};
use crate::output::OutputFormat;
use crate::processing::DropPositions;

/// Default grouping column.
pub const DEFAULT_GROUP_COLUMN: &str = "Class";

/// Name used for a partition whose group value is empty after cleanup.
pub const DEFAULT_EMPTY_GROUP_PLACEHOLDER: &str = "unnamed";

/// Default base name when no input file name is known.
pub const DEFAULT_BASE_NAME: &str = "output";

/// What to do when two outputs resolve to the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fold same-named partitions into one, rows in input order, and report a warning.
    /// Attribute tables cannot be merged and fall back to [`CollisionPolicy::Overwrite`].
    #[default]
    Merge,
    /// Keep the later output in place of the earlier one and report a warning.
    Overwrite,
    /// Abort with [`ProcessingError::NameCollision`].
    Error,
}

/// Named drop-position sets matching the two layouts the tool was first used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPreset {
    /// Keep every column.
    None,
    /// Positions 0, 2, 3 and 22 through 26 of a fixed-width score sheet.
    Fixed,
    /// Positions 0, 2, 3 and the last five columns, whatever the width.
    Trailing,
}

impl DropPreset {
    /// Drop positions for this preset.
    pub fn positions(self) -> DropPositions {
        match self {
            DropPreset::None => DropPositions::none(),
            DropPreset::Fixed => DropPositions::new(vec![0, 2, 3, 22, 23, 24, 25, 26]),
            DropPreset::Trailing => DropPositions::new(vec![0, 2, 3, -5, -4, -3, -2, -1]),
        }
    }
}

/// Configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column whose values partition the rows (exact, case-sensitive header match).
    pub group_column: String,
    /// Column positions removed from every partition. Negative positions count from the end.
    pub drop_positions: DropPositions,
    /// Prefix of every partition name. The CLI always sets it to the input file stem.
    pub base_name: String,
    /// Replaces a group value that is empty after newline/whitespace cleanup.
    pub empty_group_placeholder: String,
    /// Handling of duplicate output names.
    pub collision_policy: CollisionPolicy,
    /// Serialization format for written and packaged outputs.
    pub output_format: OutputFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            group_column: DEFAULT_GROUP_COLUMN.to_string(),
            drop_positions: DropPositions::none(),
            base_name: DEFAULT_BASE_NAME.to_string(),
            empty_group_placeholder: DEFAULT_EMPTY_GROUP_PLACEHOLDER.to_string(),
            collision_policy: CollisionPolicy::default(),
            output_format: OutputFormat::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> ProcessingResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> ProcessingResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Set `base_name` (builder style).
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Set `drop_positions` (builder style).
    pub fn with_drop_positions(mut self, drop_positions: DropPositions) -> Self {
        self.drop_positions = drop_positions;
        self
    }

    /// Reject configs that cannot produce usable output names.
    pub fn validate(&self) -> ProcessingResult<()> {
        if self.group_column.is_empty() {
            return Err(ProcessingError::InvalidConfig {
                message: "group_column must not be empty".to_string(),
            });
        }
        if self.empty_group_placeholder.trim().is_empty() {
            return Err(ProcessingError::InvalidConfig {
                message: "empty_group_placeholder must not be blank".to_string(),
            });
        }
        Ok(())
    }
}
