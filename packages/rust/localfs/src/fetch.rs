//! Local file retrieval.

use std::path::{Path, PathBuf};

use tracing::debug;

use packetpress_core::Downloader;
use packetpress_shared::{PacketPressError, Result};

/// "Downloads" by copying from the indexed tree into the run's work dir.
///
/// Copying rather than referencing in place keeps the assembly stage
/// uniform: every input the merger sees lives under the work dir, whatever
/// backend produced it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDownloader;

impl Downloader for LocalDownloader {
    fn fetch(&self, remote_path: &str, dest_dir: &Path) -> Result<PathBuf> {
        let source = Path::new(remote_path);
        let name = source
            .file_name()
            .ok_or_else(|| PacketPressError::Retrieval {
                slot: String::new(),
                path: remote_path.into(),
                message: "path has no file name".into(),
            })?;

        let dest = dest_dir.join(name);
        std::fs::copy(source, &dest).map_err(|e| PacketPressError::Retrieval {
            slot: String::new(),
            path: remote_path.into(),
            message: e.to_string(),
        })?;
        debug!(from = %remote_path, to = %dest.display(), "copied");
        Ok(dest)
    }
}
