//! Storage-layer configuration types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happens to an existing table when a repository is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Create the table if it is missing; keep existing rows.
    #[default]
    Preserve,
    /// Drop and recreate the table, discarding every row.
    Reset,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::Preserve => f.write_str("preserve"),
            OpenMode::Reset => f.write_str("reset"),
        }
    }
}
