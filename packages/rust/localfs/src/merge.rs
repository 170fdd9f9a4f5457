//! Concatenating merger.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use packetpress_core::{MergeOutcome, Merger};
use packetpress_shared::{PacketPressError, Result};

/// Merges inputs by byte concatenation, in the order given.
///
/// An unreadable or empty input counts as corrupt and is skipped; the merge
/// fails only when no valid input remains or the output itself cannot be
/// written. Format-aware merging (PDF page streams and the like) belongs in
/// a different `Merger` implementation, not here.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcatMerger;

impl Merger for ConcatMerger {
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<MergeOutcome> {
        let mut merged = Vec::new();
        let mut skipped = Vec::new();
        let mut chunks: Vec<Vec<u8>> = Vec::new();

        for input in inputs {
            match std::fs::read(input) {
                Ok(bytes) if !bytes.is_empty() => {
                    chunks.push(bytes);
                    merged.push(input.clone());
                }
                Ok(_) => {
                    warn!(file = %input.display(), "skipping empty input");
                    skipped.push(input.clone());
                }
                Err(e) => {
                    warn!(file = %input.display(), error = %e, "skipping unreadable input");
                    skipped.push(input.clone());
                }
            }
        }

        if merged.is_empty() {
            return Err(PacketPressError::Assembly(
                "no valid input files to merge".into(),
            ));
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PacketPressError::io(parent, e))?;
        }

        // Write to a sibling temp file and rename, so a failed merge never
        // leaves a truncated output behind.
        let tmp = output.with_extension("tmp");
        let mut out = std::fs::File::create(&tmp).map_err(|e| PacketPressError::io(&tmp, e))?;
        for chunk in &chunks {
            out.write_all(chunk).map_err(|e| PacketPressError::io(&tmp, e))?;
        }
        drop(out);
        std::fs::rename(&tmp, output).map_err(|e| PacketPressError::io(output, e))?;

        Ok(MergeOutcome { merged, skipped })
    }
}
