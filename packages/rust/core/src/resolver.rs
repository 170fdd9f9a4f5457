//! Slot resolution engine.
//!
//! Maps an unordered file index onto manifest slots. Resolution is a pure
//! function over `(slot, index)`: no side effects, deterministic for a given
//! input pair. Tie-breaks are always "first in file-index iteration order";
//! the resolver never sorts or re-ranks candidates — stable iteration order
//! is a contract the index provider must uphold within one run.

use tracing::debug;

use packetpress_shared::{FileIndexEntry, Result, SlotResult, SlotStatus};

use crate::manifest::{PacketManifest, SearchStrategy, Selection, Slot};
use crate::matcher::{self, FilePattern};

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Accepted content extensions (lowercase, without the dot). Entries
    /// whose name does not end in one of these never survive filtering.
    pub extensions: Vec<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".into()],
        }
    }
}

/// Outcome of resolving a whole manifest against one index snapshot.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// One result per slot, in ascending slot-id order.
    pub results: Vec<SlotResult>,
    /// Names of required slots that resolved to `Missing`.
    pub missing_required: Vec<String>,
}

impl ResolutionOutcome {
    /// Slots whose status is not `Missing`.
    pub fn completed_slots(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status != SlotStatus::Missing)
            .count()
    }

    /// True when every required slot is covered.
    pub fn required_coverage_met(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Pure slot resolver: `(slot, file index) -> SlotResult`.
#[derive(Debug, Clone, Default)]
pub struct SlotResolver {
    options: ResolverOptions,
}

impl SlotResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// Resolve every slot of the manifest in ascending-id order.
    ///
    /// Total: per-slot pattern errors degrade that slot to `Missing` with a
    /// descriptive message and never abort the pass.
    pub fn resolve_all(
        &self,
        manifest: &PacketManifest,
        index: &[FileIndexEntry],
    ) -> ResolutionOutcome {
        let ordered = manifest.ordered_slots();
        debug!(
            slots = ordered.len(),
            entries = index.len(),
            "resolving manifest against index snapshot"
        );

        let results: Vec<SlotResult> =
            ordered.iter().map(|slot| self.resolve(slot, index)).collect();

        let missing_required = results
            .iter()
            .filter(|r| r.required && r.status == SlotStatus::Missing)
            .map(|r| r.name.clone())
            .collect();

        ResolutionOutcome {
            results,
            missing_required,
        }
    }

    /// Resolve a single slot against the index snapshot.
    pub fn resolve(&self, slot: &Slot, index: &[FileIndexEntry]) -> SlotResult {
        match self.try_resolve(slot, index) {
            Ok(result) => result,
            // Pattern/config problems for one slot degrade it to Missing.
            Err(e) => {
                debug!(slot_id = slot.id, error = %e, "slot degraded to missing");
                missing(slot, e.to_string())
            }
        }
    }

    fn try_resolve(&self, slot: &Slot, index: &[FileIndexEntry]) -> Result<SlotResult> {
        match &slot.strategy {
            SearchStrategy::Generated { generator } => Ok(SlotResult {
                slot_id: slot.id,
                name: slot.name.clone(),
                status: SlotStatus::Satisfied,
                matched_paths: vec![],
                error_message: None,
                required: slot.required,
                generator: Some(generator.clone()),
                warnings: vec![],
            }),

            SearchStrategy::FolderSearch {
                folder_keywords,
                file_keywords,
                selection,
            } => {
                let patterns = FilePattern::compile_all(file_keywords)?;
                let survivors: Vec<&FileIndexEntry> = index
                    .iter()
                    .filter(|e| self.passes_extension_filter(e))
                    .filter(|e| matcher::path_matches_keywords(&e.path, folder_keywords))
                    .filter(|e| matcher::matches_any(&patterns, &e.name))
                    .collect();

                debug!(
                    slot_id = slot.id,
                    survivors = survivors.len(),
                    "folder search filtered"
                );
                Ok(self.select(slot, &survivors, *selection, || {
                    format!(
                        "no file matching folder_keywords={folder_keywords:?}, \
                         file_keywords={file_keywords:?}"
                    )
                }))
            }

            SearchStrategy::RecursiveDownload {
                folder_path,
                selection,
            } => {
                let survivors: Vec<&FileIndexEntry> = index
                    .iter()
                    .filter(|e| self.passes_extension_filter(e))
                    .filter(|e| matcher::path_contains_segments(&e.path, folder_path))
                    .collect();

                debug!(
                    slot_id = slot.id,
                    survivors = survivors.len(),
                    "recursive download filtered"
                );
                Ok(self.select(slot, &survivors, *selection, || {
                    format!("no file under folder path {folder_path:?}")
                }))
            }

            SearchStrategy::PrioritizedSearch {
                folder_keywords,
                file_keywords_by_priority,
            } => {
                for keyword in file_keywords_by_priority {
                    let pattern = FilePattern::compile(keyword)?;
                    let hit = index
                        .iter()
                        .filter(|e| self.passes_extension_filter(e))
                        .filter(|e| {
                            matcher::path_matches_keywords(&e.path, folder_keywords)
                        })
                        .find(|e| pattern.matches(&e.name));

                    if let Some(entry) = hit {
                        debug!(slot_id = slot.id, keyword, path = %entry.path, "priority hit");
                        return Ok(self.select(
                            slot,
                            &[entry],
                            Selection::Single,
                            String::new,
                        ));
                    }
                }

                Ok(missing(
                    slot,
                    format!(
                        "no file matching any priority keyword \
                         {file_keywords_by_priority:?} under {folder_keywords:?}"
                    ),
                ))
            }
        }
    }

    /// Only non-folder entries with an accepted extension pass.
    fn passes_extension_filter(&self, entry: &FileIndexEntry) -> bool {
        if entry.is_folder {
            return false;
        }
        let name = entry.name.to_lowercase();
        self.options
            .extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{ext}")))
    }

    /// Apply the selection policy to the surviving candidates.
    fn select(
        &self,
        slot: &Slot,
        survivors: &[&FileIndexEntry],
        selection: Selection,
        missing_reason: impl FnOnce() -> String,
    ) -> SlotResult {
        if survivors.is_empty() {
            return missing(slot, missing_reason());
        }

        let matched_paths: Vec<String> = match selection {
            Selection::Single => vec![survivors[0].path.clone()],
            Selection::Multiple => survivors.iter().map(|e| e.path.clone()).collect(),
        };

        SlotResult {
            slot_id: slot.id,
            name: slot.name.clone(),
            status: SlotStatus::Satisfied,
            matched_paths,
            error_message: None,
            required: slot.required,
            generator: None,
            warnings: vec![],
        }
    }
}

fn missing(slot: &Slot, reason: String) -> SlotResult {
    SlotResult {
        slot_id: slot.id,
        name: slot.name.clone(),
        status: SlotStatus::Missing,
        matched_paths: vec![],
        error_message: Some(reason),
        required: slot.required,
        generator: None,
        warnings: vec![],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::manifest::PacketManifest;

    fn folder_search_slot(
        id: u32,
        name: &str,
        folder_keywords: &[&str],
        file_keywords: &[&str],
        selection: Selection,
    ) -> Slot {
        Slot {
            id,
            name: name.into(),
            required: true,
            cover_page: false,
            cover_title: None,
            description: None,
            strategy: SearchStrategy::FolderSearch {
                folder_keywords: folder_keywords.iter().map(|s| s.to_string()).collect(),
                file_keywords: file_keywords.iter().map(|s| s.to_string()).collect(),
                selection,
            },
            tags: BTreeSet::new(),
        }
    }

    fn index(paths: &[&str]) -> Vec<FileIndexEntry> {
        paths.iter().map(|p| FileIndexEntry::file(*p)).collect()
    }

    #[test]
    fn single_selection_takes_first_in_index_order() {
        let slot = folder_search_slot(1, "cover", &["EXHIBIT 1"], &["cover"], Selection::Single);
        let index = index(&[
            "/EXHIBIT 1/cover_draft.pdf",
            "/EXHIBIT 1/cover_final.pdf",
        ]);

        let result = SlotResolver::default().resolve(&slot, &index);
        assert_eq!(result.status, SlotStatus::Satisfied);
        assert_eq!(result.matched_paths, vec!["/EXHIBIT 1/cover_draft.pdf"]);
    }

    #[test]
    fn single_selection_with_exactly_one_candidate() {
        let slot =
            folder_search_slot(1, "cover", &["EXHIBIT 1"], &["cover*.pdf"], Selection::Single);
        let index = index(&["/EXHIBIT 1/cover_final.pdf", "/EXHIBIT 2/extra.pdf"]);

        let result = SlotResolver::default().resolve(&slot, &index);
        assert_eq!(result.status, SlotStatus::Satisfied);
        assert_eq!(result.matched_paths, vec!["/EXHIBIT 1/cover_final.pdf"]);
    }

    #[test]
    fn multiple_selection_keeps_index_order() {
        let slot = folder_search_slot(1, "docs", &["Agency"], &[], Selection::Multiple);
        let index = index(&[
            "/Agency/receipt_b.pdf",
            "/Agency/receipt_a.pdf",
            "/Other/receipt_c.pdf",
        ]);

        let result = SlotResolver::default().resolve(&slot, &index);
        assert_eq!(
            result.matched_paths,
            vec!["/Agency/receipt_b.pdf", "/Agency/receipt_a.pdf"]
        );
    }

    #[test]
    fn zero_candidates_is_missing_with_message() {
        let slot = folder_search_slot(1, "cover", &["EXHIBIT 1"], &["cover"], Selection::Single);
        let result = SlotResolver::default().resolve(&slot, &index(&["/EXHIBIT 2/extra.pdf"]));

        assert_eq!(result.status, SlotStatus::Missing);
        let message = result.error_message.expect("missing reason populated");
        assert!(message.contains("EXHIBIT 1"));
    }

    #[test]
    fn folder_match_tolerates_naming_drift() {
        let slot =
            folder_search_slot(1, "filed", &["Filed Copy"], &[], Selection::Single);
        let index = index(&["/Case/FILED-COPY/master.pdf"]);

        let result = SlotResolver::default().resolve(&slot, &index);
        assert_eq!(result.status, SlotStatus::Satisfied);
    }

    #[test]
    fn extension_filter_drops_folders_and_foreign_types() {
        let slot = folder_search_slot(1, "docs", &[], &[], Selection::Multiple);
        let mut entries = index(&["/a/scan.pdf", "/a/notes.txt"]);
        entries.push(FileIndexEntry::folder("/a/subfolder.pdf"));

        let result = SlotResolver::default().resolve(&slot, &entries);
        assert_eq!(result.matched_paths, vec!["/a/scan.pdf"]);
    }

    #[test]
    fn configurable_extensions() {
        let resolver = SlotResolver::new(ResolverOptions {
            extensions: vec!["pdf".into(), "docx".into()],
        });
        let slot = folder_search_slot(1, "docs", &[], &[], Selection::Multiple);
        let result = resolver.resolve(&slot, &index(&["/a/x.docx", "/a/y.png"]));
        assert_eq!(result.matched_paths, vec!["/a/x.docx"]);
    }

    #[test]
    fn invalid_regex_degrades_slot_to_missing() {
        let slot = folder_search_slot(
            1,
            "broken",
            &[],
            &["regex:([unclosed"],
            Selection::Single,
        );
        let result = SlotResolver::default().resolve(&slot, &index(&["/a/x.pdf"]));

        assert_eq!(result.status, SlotStatus::Missing);
        assert!(result.error_message.unwrap().contains("invalid regex"));
    }

    #[test]
    fn prioritized_search_first_keyword_with_hit_wins() {
        let slot = Slot {
            id: 4,
            name: "Filed Copy".into(),
            required: true,
            cover_page: false,
            cover_title: None,
            description: None,
            strategy: SearchStrategy::PrioritizedSearch {
                folder_keywords: vec!["Filed".into()],
                file_keywords_by_priority: vec![
                    "Filed Copy".into(),
                    "Ready to print".into(),
                    "Signed".into(),
                ],
            },
            tags: BTreeSet::new(),
        };
        // Candidates exist for priorities #2 and #3 but not #1.
        let index = index(&[
            "/Filed/signed petition.pdf",
            "/Filed/ready to print v3.pdf",
        ]);

        let result = SlotResolver::default().resolve(&slot, &index);
        assert_eq!(result.status, SlotStatus::Satisfied);
        assert_eq!(result.matched_paths, vec!["/Filed/ready to print v3.pdf"]);
    }

    #[test]
    fn prioritized_search_missing_when_no_keyword_hits() {
        let slot = Slot {
            id: 4,
            name: "Filed Copy".into(),
            required: true,
            cover_page: false,
            cover_title: None,
            description: None,
            strategy: SearchStrategy::PrioritizedSearch {
                folder_keywords: vec!["Filed".into()],
                file_keywords_by_priority: vec!["Filed Copy".into()],
            },
            tags: BTreeSet::new(),
        };
        let result = SlotResolver::default().resolve(&slot, &index(&["/Filed/draft.pdf"]));
        assert_eq!(result.status, SlotStatus::Missing);
        assert!(result.error_message.is_some());
    }

    #[test]
    fn recursive_download_uses_segment_containment() {
        let slot = Slot {
            id: 3,
            name: "Evidence".into(),
            required: false,
            cover_page: false,
            cover_title: None,
            description: None,
            strategy: SearchStrategy::RecursiveDownload {
                folder_path: vec!["Case".into(), "Evidence".into()],
                selection: Selection::Multiple,
            },
            tags: BTreeSet::new(),
        };
        let index = index(&[
            "/Case/Evidence/photos/scan1.pdf",
            "/Case/Evidence/scan2.pdf",
            "/Evidence/Case/wrong-order.pdf",
            "/Case/Notes/unrelated.pdf",
        ]);

        let result = SlotResolver::default().resolve(&slot, &index);
        assert_eq!(
            result.matched_paths,
            vec!["/Case/Evidence/photos/scan1.pdf", "/Case/Evidence/scan2.pdf"]
        );
    }

    #[test]
    fn generated_slot_is_satisfied_without_paths() {
        let slot = Slot {
            id: 2,
            name: "Missing Report".into(),
            required: true,
            cover_page: true,
            cover_title: None,
            description: None,
            strategy: SearchStrategy::Generated {
                generator: "missing_report".into(),
            },
            tags: BTreeSet::new(),
        };

        let result = SlotResolver::default().resolve(&slot, &[]);
        assert_eq!(result.status, SlotStatus::Satisfied);
        assert!(result.matched_paths.is_empty());
        assert_eq!(result.generator.as_deref(), Some("missing_report"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let slot = folder_search_slot(1, "docs", &["Agency"], &["receipt"], Selection::Multiple);
        let index = index(&["/Agency/receipt_1.pdf", "/Agency/receipt_2.pdf"]);
        let resolver = SlotResolver::default();

        let first = resolver.resolve(&slot, &index);
        let second = resolver.resolve(&slot, &index);
        assert_eq!(first, second);
    }

    #[test]
    fn resolve_all_partitions_missing_required() {
        let manifest = PacketManifest::new(
            "test",
            "1.0.0",
            vec![
                folder_search_slot(1, "present", &["EXHIBIT 1"], &["cover*.pdf"], Selection::Single),
                {
                    let mut s = folder_search_slot(
                        2,
                        "optional-absent",
                        &["EXHIBIT 9"],
                        &[],
                        Selection::Multiple,
                    );
                    s.required = false;
                    s
                },
                folder_search_slot(3, "required-absent", &["EXHIBIT 8"], &[], Selection::Single),
            ],
        )
        .unwrap();
        let index = index(&["/EXHIBIT 1/cover_final.pdf", "/EXHIBIT 2/extra.pdf"]);

        let outcome = SlotResolver::default().resolve_all(&manifest, &index);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.completed_slots(), 1);
        assert_eq!(outcome.missing_required, vec!["required-absent"]);
        assert!(!outcome.required_coverage_met());
    }

    #[test]
    fn worked_example_both_slots_satisfied() {
        // Manifest from the worked example: slot 1 required with a folder
        // hint and glob, slot 2 optional taking anything under its folder.
        let manifest = PacketManifest::new(
            "example",
            "1.0.0",
            vec![
                folder_search_slot(1, "one", &["EXHIBIT 1"], &["cover*.pdf"], Selection::Single),
                {
                    let mut s =
                        folder_search_slot(2, "two", &["EXHIBIT 2"], &[], Selection::Multiple);
                    s.required = false;
                    s
                },
            ],
        )
        .unwrap();
        let index = index(&["/EXHIBIT 1/cover_final.pdf", "/EXHIBIT 2/extra.pdf"]);

        let outcome = SlotResolver::default().resolve_all(&manifest, &index);
        assert_eq!(outcome.results[0].status, SlotStatus::Satisfied);
        assert_eq!(
            outcome.results[0].matched_paths,
            vec!["/EXHIBIT 1/cover_final.pdf"]
        );
        assert_eq!(outcome.results[1].status, SlotStatus::Satisfied);
        assert_eq!(outcome.results[1].matched_paths, vec!["/EXHIBIT 2/extra.pdf"]);
        assert!(outcome.missing_required.is_empty());
    }
}
