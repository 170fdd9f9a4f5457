//! Boundary value types for PacketPress runs.
//!
//! These are the shapes that cross the core's seams: the file index coming
//! in from a provider, the per-slot and per-run results going out to callers
//! and progress sinks. All of them are plain serializable values created
//! fresh per run; nothing here is shared mutable state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one assembly run (time-sortable).
///
/// Each run gets its own isolated working directory keyed by this id, so
/// concurrent runs never collide on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// FileIndexEntry
// ---------------------------------------------------------------------------

/// One discovered remote object in the flattened file index.
///
/// The index is a complete recursive listing under a fixed root, treated as
/// a read-only snapshot for the duration of one resolution pass. Iteration
/// order is an external contract: the provider must return a stable order
/// across repeated listings within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndexEntry {
    /// Full slash-separated path, case preserved.
    pub path: String,
    /// Final path component.
    pub name: String,
    /// Whether this entry is a folder.
    pub is_folder: bool,
}

impl FileIndexEntry {
    /// Convenience constructor for a file entry; derives `name` from `path`.
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            is_folder: false,
        }
    }

    /// Convenience constructor for a folder entry.
    pub fn folder(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            is_folder: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SlotResult
// ---------------------------------------------------------------------------

/// Resolution status of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// The selection policy was fully met.
    Satisfied,
    /// Some but not all expected content made it into the output
    /// (e.g. a corrupt input was skipped during assembly).
    Partial,
    /// Zero matches.
    Missing,
}

/// Outcome of resolving (and later assembling) one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResult {
    pub slot_id: u32,
    pub name: String,
    pub status: SlotStatus,
    /// Matched index paths, in file-index iteration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_paths: Vec<String>,
    /// Why the slot is `Missing`, when it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub required: bool,
    /// Generator name for `Generated` slots, carried for the orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Non-fatal problems recorded during assembly (e.g. corrupt inputs
    /// skipped by the merger).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SlotResult {
    /// True if the slot contributed at least one matched path.
    pub fn has_files(&self) -> bool {
        !self.matched_paths.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AssemblyReport
// ---------------------------------------------------------------------------

/// Final report for one assembly run, suitable for direct serialization to
/// a caller-facing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub success: bool,
    pub total_slots: usize,
    /// Slots whose status is not `Missing`.
    pub completed_slots: usize,
    /// Names of required slots that resolved to `Missing`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required_slots: Vec<String>,
    pub slot_results: Vec<SlotResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_output_path: Option<PathBuf>,
    /// Terminal failure description when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the run finished (success or failure).
    pub finished_at: DateTime<Utc>,
}

impl AssemblyReport {
    /// Items worth flagging to a human: required-but-missing slots and
    /// slots that ended up incomplete.
    pub fn missing_items(&self) -> Vec<String> {
        let mut items = Vec::new();
        for result in &self.slot_results {
            if result.required && result.status == SlotStatus::Missing {
                items.push(format!("{} (required)", result.name));
            } else if result.status == SlotStatus::Partial {
                items.push(format!("{} (incomplete)", result.name));
            }
        }
        items
    }
}

// ---------------------------------------------------------------------------
// ProgressUpdate
// ---------------------------------------------------------------------------

/// A progress notification emitted at the pipeline's fixed checkpoints.
///
/// Checkpoint percentages are fixed regardless of manifest size; a failed
/// run emits `Failed` instead of a percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressUpdate {
    Checkpoint { percent: u8, message: String },
    Failed { message: String },
}

impl ProgressUpdate {
    pub fn checkpoint(percent: u8, message: impl Into<String>) -> Self {
        Self::Checkpoint {
            percent,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
