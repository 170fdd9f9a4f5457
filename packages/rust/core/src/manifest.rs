//! Manifest and slot model.
//!
//! A [`PacketManifest`] is an immutable, declarative description of the
//! target document: an ordered collection of [`Slot`]s, each with a matching
//! strategy and a required/optional flag. Manifests validate on construction
//! and never reach resolution malformed; deserialization routes through the
//! same validating constructor.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use packetpress_shared::{PacketPressError, Result};

/// How many winning candidates a slot expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Exactly one winning candidate (first survivor in index order).
    Single,
    /// All surviving candidates, in index order.
    Multiple,
}

fn default_selection() -> Selection {
    Selection::Multiple
}

/// How a slot locates its source files in the index.
///
/// A closed sum type: adding a new strategy means adding a variant here and
/// a matching branch in the resolver, not inventing new dictionary keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Search inside folders matched fuzzily by keyword, then filter file
    /// names by pattern.
    FolderSearch {
        #[serde(default)]
        folder_keywords: Vec<String>,
        /// Empty list means "match everything" (wildcard).
        #[serde(default)]
        file_keywords: Vec<String>,
        #[serde(default = "default_selection")]
        selection: Selection,
    },

    /// Take everything under an ordered folder path. Folder matching uses
    /// ordered path-segment containment instead of keyword substrings.
    RecursiveDownload {
        folder_path: Vec<String>,
        #[serde(default = "default_selection")]
        selection: Selection,
    },

    /// Try file keywords in priority order; the first keyword with a hit
    /// wins. Selection is always single.
    PrioritizedSearch {
        #[serde(default)]
        folder_keywords: Vec<String>,
        file_keywords_by_priority: Vec<String>,
    },

    /// No file lookup; content is produced by an external generator keyed
    /// by name, invoked during assembly.
    Generated { generator: String },
}

fn default_true() -> bool {
    true
}

/// A named, ordered position in the target document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Unique within a manifest; ascending id is the assembly order.
    pub id: u32,
    /// Human label, also used as the cover title fallback.
    pub name: String,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Insert a generated title page before this slot's content.
    #[serde(default = "default_true")]
    pub cover_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub strategy: SearchStrategy,
    /// Opaque caller-defined tags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl Slot {
    /// The title to render on this slot's cover page.
    pub fn effective_cover_title(&self) -> &str {
        self.cover_title.as_deref().unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// PacketManifest
// ---------------------------------------------------------------------------

/// Raw manifest shape as it appears in a JSON file, before validation.
#[derive(Debug, Deserialize)]
struct ManifestFile {
    name: String,
    #[serde(default = "default_version")]
    version: String,
    slots: Vec<Slot>,
}

fn default_version() -> String {
    "1.0.0".into()
}

impl TryFrom<ManifestFile> for PacketManifest {
    type Error = PacketPressError;

    fn try_from(file: ManifestFile) -> Result<Self> {
        PacketManifest::new(file.name, file.version, file.slots)
    }
}

/// The ordered collection of slots describing a target document's structure.
///
/// Constructed once per run configuration, read-only afterwards. Fields are
/// private so every instance has passed validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ManifestFile")]
pub struct PacketManifest {
    name: String,
    version: String,
    slots: Vec<Slot>,
}

impl PacketManifest {
    /// Build a manifest, validating its structure.
    ///
    /// Fails fast on an empty slot collection or duplicate slot ids; a
    /// malformed manifest never reaches resolution.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        slots: Vec<Slot>,
    ) -> Result<Self> {
        if slots.is_empty() {
            return Err(PacketPressError::manifest("manifest has no slots"));
        }

        let mut seen = BTreeSet::new();
        for slot in &slots {
            if !seen.insert(slot.id) {
                return Err(PacketPressError::manifest(format!(
                    "duplicate slot id {}",
                    slot.id
                )));
            }
        }

        Ok(Self {
            name: name.into(),
            version: version.into(),
            slots,
        })
    }

    /// Parse a manifest from JSON, validating on deserialization.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PacketPressError::manifest(format!("invalid manifest JSON: {e}")))
    }

    /// Load a manifest from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PacketPressError::io(path, e))?;
        Self::from_json_str(&content)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slots sorted ascending by id — the single source of truth for final
    /// document order. Nothing downstream may reorder.
    pub fn ordered_slots(&self) -> Vec<&Slot> {
        let mut ordered: Vec<&Slot> = self.slots.iter().collect();
        ordered.sort_by_key(|s| s.id);
        ordered
    }

    /// Look up a slot by id.
    pub fn slot(&self, id: u32) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }
}

/// A sample manifest exercising every search strategy.
///
/// Useful as a starting point for custom manifests (`packetpress example`)
/// and as a fixture in tests. Mirrors a typical evidence-packet layout:
/// keyword search, a generated report, a recursive folder pull, and a
/// prioritized fallback chain.
pub fn example_manifest() -> PacketManifest {
    PacketManifest::new(
        "Standard Evidence Packet",
        "1.0.0",
        vec![
            Slot {
                id: 1,
                name: "Exhibit A – Agency Documents".into(),
                required: true,
                cover_page: true,
                cover_title: None,
                description: Some("Receipts, notices and transfers from the agency".into()),
                strategy: SearchStrategy::FolderSearch {
                    folder_keywords: vec!["Agency".into(), "Receipts".into()],
                    file_keywords: vec!["Notice".into(), "Transfer".into(), "Receipt".into()],
                    selection: Selection::Multiple,
                },
                tags: BTreeSet::new(),
            },
            Slot {
                id: 2,
                name: "Exhibit B – Missing Documents Report".into(),
                required: true,
                cover_page: true,
                cover_title: None,
                description: Some("Auto-generated list of documents not located".into()),
                strategy: SearchStrategy::Generated {
                    generator: "missing_report".into(),
                },
                tags: BTreeSet::new(),
            },
            Slot {
                id: 3,
                name: "Exhibit C – Evidence".into(),
                required: false,
                cover_page: true,
                cover_title: None,
                description: Some("Everything under Case/Evidence".into()),
                strategy: SearchStrategy::RecursiveDownload {
                    folder_path: vec!["Case".into(), "Evidence".into()],
                    selection: Selection::Multiple,
                },
                tags: BTreeSet::new(),
            },
            Slot {
                id: 4,
                name: "Exhibit D – Filed Copy".into(),
                required: true,
                cover_page: true,
                cover_title: None,
                description: Some("Master document, best available variant".into()),
                strategy: SearchStrategy::PrioritizedSearch {
                    folder_keywords: vec!["Filed".into(), "Final".into()],
                    file_keywords_by_priority: vec![
                        "Filed Copy".into(),
                        "Ready to print".into(),
                        "Signed".into(),
                    ],
                },
                tags: BTreeSet::new(),
            },
        ],
    )
    .expect("example manifest is well-formed")
}
