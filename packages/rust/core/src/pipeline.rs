//! Assembly orchestration pipeline.
//!
//! Sequences one run through a fixed state machine:
//! `Init → Resolving → Validating → Retrieving → Assembling → Reporting →
//! Done`, with a terminal `Failed(reason)` reachable from any state. The
//! pipeline performs no I/O itself — index listing, file retrieval, merging,
//! content generation and progress reporting all go through externally
//! supplied capability traits.
//!
//! Every terminal failure yields a structured [`AssemblyReport`], never a
//! bare error; the only hard error is failing to obtain the file index,
//! which gates entry to the state machine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use packetpress_shared::{
    AssemblyReport, FileIndexEntry, PacketPressError, ProgressUpdate, Result, SlotResult,
    SlotStatus,
};

use crate::manifest::PacketManifest;
use crate::resolver::{ResolutionOutcome, SlotResolver};

/// Reserved generator name used to render cover/title pages.
pub const COVER_GENERATOR: &str = "cover_page";

// ---------------------------------------------------------------------------
// Capability traits (consumed, not implemented here)
// ---------------------------------------------------------------------------

/// Lists the complete, flattened, recursive file index under a root.
/// Iteration order must be stable across repeated listings within one run.
pub trait FileIndexProvider: Send + Sync {
    fn list(&self, root: &str) -> Result<Vec<FileIndexEntry>>;
}

/// Fetches one remote path into a local directory.
pub trait Downloader: Send + Sync {
    fn fetch(&self, remote_path: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// Outcome of a merge: which inputs made it in, which were skipped as
/// corrupt.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub merged: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Combines ordered local files into the output document. Individually
/// corrupt inputs are skipped, not fatal; the merge fails only if no valid
/// input remains.
pub trait Merger: Send + Sync {
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<MergeOutcome>;
}

/// Receives progress checkpoints and the final output locator.
/// Idempotent, last-write-wins; the pipeline treats it as fire-and-forget.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: &ProgressUpdate) -> Result<()>;
    fn report_output(&self, locator: &str) -> Result<()>;
}

/// Context handed to a content generator.
#[derive(Debug, Clone)]
pub struct GenerateContext<'a> {
    pub packet_name: &'a str,
    pub slot_id: u32,
    pub slot_name: &'a str,
    /// Title to render, for cover pages.
    pub title: Option<&'a str>,
    /// Human-readable list of items not located during resolution.
    pub missing_items: &'a [String],
}

/// Produces content for `Generated` slots and cover pages.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        name: &str,
        context: &GenerateContext<'_>,
        dest_dir: &Path,
    ) -> Result<PathBuf>;
}

/// The external collaborators one run needs, borrowed for its duration.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub index: &'a dyn FileIndexProvider,
    pub downloader: &'a dyn Downloader,
    pub merger: &'a dyn Merger,
    pub progress: &'a dyn ProgressSink,
    pub generator: &'a dyn Generator,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Pipeline stages, in order. `Failed` is terminal and reachable from any
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Resolving,
    Validating,
    Retrieving,
    Assembling,
    Reporting,
    Done,
    Failed(FailureReason),
}

/// Why a run failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// One or more required slots unresolved; nothing was retrieved.
    MissingRequiredSlots(Vec<String>),
    /// An external fetch failed; the owning slot is named.
    Retrieval { slot: String, message: String },
    /// The merge failed fatally (no valid inputs remained) or a generator
    /// could not produce its content.
    Assembly(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequiredSlots(names) => {
                write!(f, "missing required slots: {}", names.join(", "))
            }
            Self::Retrieval { slot, message } => {
                write!(f, "retrieval failed for slot '{slot}': {message}")
            }
            Self::Assembly(message) => write!(f, "assembly failed: {message}"),
        }
    }
}

/// Per-run configuration: where to look, where to work, where to write.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root path handed to the index provider.
    pub source_root: String,
    /// Isolated working directory for this run. Never shared across runs.
    pub work_dir: PathBuf,
    /// Where the merged output document is written.
    pub output_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Sequences resolution, validation, retrieval, assembly and reporting for
/// one manifest. The manifest is read-only and may be shared across many
/// runs; all mutable state is run-scoped.
pub struct Orchestrator<'a> {
    manifest: &'a PacketManifest,
    resolver: SlotResolver,
    caps: Capabilities<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        manifest: &'a PacketManifest,
        resolver: SlotResolver,
        caps: Capabilities<'a>,
    ) -> Self {
        Self {
            manifest,
            resolver,
            caps,
        }
    }

    /// Run the full pipeline once.
    ///
    /// Returns `Err` only when the file index cannot be obtained; every
    /// failure past that point is reported through the returned
    /// [`AssemblyReport`] with `success = false`.
    #[instrument(skip_all, fields(manifest = %self.manifest.name(), root = %config.source_root))]
    pub fn run(&self, config: &RunConfig) -> Result<AssemblyReport> {
        let mut state = PipelineState::Init;

        // Index acquisition gates entry to the state machine.
        let index = match self.caps.index.list(&config.source_root) {
            Ok(index) => index,
            Err(e) => {
                self.notify(&ProgressUpdate::failed(format!(
                    "could not list source root: {e}"
                )));
                return Err(PacketPressError::Index(e.to_string()));
            }
        };
        info!(entries = index.len(), "file index obtained");

        // --- Resolving ---
        self.transition(&mut state, PipelineState::Resolving);
        self.notify(&ProgressUpdate::checkpoint(10, "Resolving slots"));
        let outcome = self.resolver.resolve_all(self.manifest, &index);

        // --- Validating ---
        self.transition(&mut state, PipelineState::Validating);
        if !outcome.required_coverage_met() {
            let reason = FailureReason::MissingRequiredSlots(outcome.missing_required.clone());
            return Ok(self.fail(&mut state, outcome, reason));
        }

        // --- Retrieving ---
        self.transition(&mut state, PipelineState::Retrieving);
        self.notify(&ProgressUpdate::checkpoint(40, "Retrieving files"));
        let local_files = match self.retrieve(&outcome, config) {
            Ok(files) => files,
            Err(reason) => return Ok(self.fail(&mut state, outcome, reason)),
        };

        // --- Assembling ---
        self.transition(&mut state, PipelineState::Assembling);
        self.notify(&ProgressUpdate::checkpoint(70, "Assembling packet"));
        let mut outcome = outcome;
        if let Err(reason) = self.assemble(&mut outcome, &local_files, config) {
            return Ok(self.fail(&mut state, outcome, reason));
        }

        // --- Reporting ---
        self.transition(&mut state, PipelineState::Reporting);
        if let Err(e) = self
            .caps
            .progress
            .report_output(&config.output_path.to_string_lossy())
        {
            warn!(error = %e, "output locator report failed");
        }

        self.transition(&mut state, PipelineState::Done);
        self.notify(&ProgressUpdate::checkpoint(100, "Done"));

        let report = build_report(
            outcome,
            true,
            Some(config.output_path.clone()),
            None,
        );
        info!(
            completed = report.completed_slots,
            total = report.total_slots,
            output = %config.output_path.display(),
            "run complete"
        );
        Ok(report)
    }

    /// Fetch every matched path of every satisfied slot into the run's work
    /// dir. All-or-nothing: the first fetch error fails the run. No retry;
    /// partial downloads are left for the caller to clean up.
    fn retrieve(
        &self,
        outcome: &ResolutionOutcome,
        config: &RunConfig,
    ) -> std::result::Result<HashMap<u32, Vec<PathBuf>>, FailureReason> {
        let mut local_files: HashMap<u32, Vec<PathBuf>> = HashMap::new();

        for result in &outcome.results {
            if result.matched_paths.is_empty() {
                continue;
            }

            let slot_dir = config.work_dir.join(format!("slot_{}", result.slot_id));
            if let Err(e) = std::fs::create_dir_all(&slot_dir) {
                return Err(FailureReason::Retrieval {
                    slot: result.name.clone(),
                    message: format!("could not create {}: {e}", slot_dir.display()),
                });
            }

            for remote_path in &result.matched_paths {
                match self.caps.downloader.fetch(remote_path, &slot_dir) {
                    Ok(local) => {
                        debug!(slot_id = result.slot_id, path = %remote_path, "fetched");
                        local_files.entry(result.slot_id).or_default().push(local);
                    }
                    Err(e) => {
                        return Err(FailureReason::Retrieval {
                            slot: result.name.clone(),
                            message: format!("{remote_path}: {e}"),
                        });
                    }
                }
            }
        }

        Ok(local_files)
    }

    /// Build the ordered input list (covers, generated content, slot files)
    /// and invoke the merger. Skipped corrupt inputs are recorded as
    /// warnings on their owning slot, demoting it to `Partial`.
    fn assemble(
        &self,
        outcome: &mut ResolutionOutcome,
        local_files: &HashMap<u32, Vec<PathBuf>>,
        config: &RunConfig,
    ) -> std::result::Result<(), FailureReason> {
        let missing_items = collect_missing_items(&outcome.results);

        let mut inputs: Vec<PathBuf> = Vec::new();
        // Maps each content input back to its owning slot for skip
        // bookkeeping. Covers are not content: a skipped cover is a warning
        // but never demotes the slot.
        let mut owners: HashMap<PathBuf, (u32, bool)> = HashMap::new();

        // Results arrive in ascending slot-id order, which is also the
        // document order.
        for result in &outcome.results {
            if result.status == SlotStatus::Missing {
                continue;
            }
            let Some(slot) = self.manifest.slot(result.slot_id) else {
                continue;
            };

            let context = GenerateContext {
                packet_name: self.manifest.name(),
                slot_id: slot.id,
                slot_name: &slot.name,
                title: Some(slot.effective_cover_title()),
                missing_items: &missing_items,
            };

            if slot.cover_page {
                let cover = self
                    .caps
                    .generator
                    .generate(COVER_GENERATOR, &context, &config.work_dir)
                    .map_err(|e| FailureReason::Assembly(e.to_string()))?;
                owners.insert(cover.clone(), (slot.id, true));
                inputs.push(cover);
            }

            if let Some(generator_name) = &result.generator {
                let generated = self
                    .caps
                    .generator
                    .generate(generator_name, &context, &config.work_dir)
                    .map_err(|e| FailureReason::Assembly(e.to_string()))?;
                owners.insert(generated.clone(), (slot.id, false));
                inputs.push(generated);
            }

            if let Some(files) = local_files.get(&slot.id) {
                for file in files {
                    owners.insert(file.clone(), (slot.id, false));
                    inputs.push(file.clone());
                }
            }
        }

        let merge = self
            .caps
            .merger
            .merge(&inputs, &config.output_path)
            .map_err(|e| FailureReason::Assembly(e.to_string()))?;

        if merge.merged.is_empty() {
            return Err(FailureReason::Assembly(
                "no valid input files remained".into(),
            ));
        }

        for skipped in &merge.skipped {
            let Some((slot_id, is_cover)) = owners.get(skipped).copied() else {
                continue;
            };
            let Some(result) = outcome.results.iter_mut().find(|r| r.slot_id == slot_id)
            else {
                continue;
            };

            result.warnings.push(format!(
                "skipped corrupt input: {}",
                skipped.display()
            ));
            if !is_cover && result.status == SlotStatus::Satisfied {
                result.status = SlotStatus::Partial;
            }
            warn!(slot_id, file = %skipped.display(), "corrupt input skipped");
        }

        Ok(())
    }

    /// Terminal failure: emit the distinct failure marker and produce the
    /// structured report. Progress already reported stays visible as the
    /// last known state.
    fn fail(
        &self,
        state: &mut PipelineState,
        outcome: ResolutionOutcome,
        reason: FailureReason,
    ) -> AssemblyReport {
        let message = reason.to_string();
        self.transition(state, PipelineState::Failed(reason));
        self.notify(&ProgressUpdate::failed(&message));
        build_report(outcome, false, None, Some(message))
    }

    fn transition(&self, state: &mut PipelineState, next: PipelineState) {
        debug!(from = ?state, to = ?next, "pipeline transition");
        *state = next;
    }

    /// Checkpoint reporting is fire-and-forget: a sink failure is logged,
    /// never escalated to a pipeline failure.
    fn notify(&self, update: &ProgressUpdate) {
        if let Err(e) = self.caps.progress.report(update) {
            warn!(error = %e, "progress report failed");
        }
    }
}

/// Items worth surfacing to a human reader: required slots with no files and
/// slots that ended up incomplete.
fn collect_missing_items(results: &[SlotResult]) -> Vec<String> {
    let mut items = Vec::new();
    for result in results {
        if result.required && result.status == SlotStatus::Missing {
            items.push(format!("{} (required)", result.name));
        } else if result.status == SlotStatus::Partial {
            items.push(format!("{} (incomplete)", result.name));
        }
    }
    items
}

fn build_report(
    outcome: ResolutionOutcome,
    success: bool,
    final_output_path: Option<PathBuf>,
    error_message: Option<String>,
) -> AssemblyReport {
    AssemblyReport {
        success,
        total_slots: outcome.results.len(),
        completed_slots: outcome.completed_slots(),
        missing_required_slots: outcome.missing_required,
        slot_results: outcome.results,
        final_output_path,
        error_message,
        finished_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// No-op progress sink for headless/test usage
// ---------------------------------------------------------------------------

/// Progress sink that discards everything.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn report(&self, _update: &ProgressUpdate) -> Result<()> {
        Ok(())
    }

    fn report_output(&self, _locator: &str) -> Result<()> {
        Ok(())
    }
}
