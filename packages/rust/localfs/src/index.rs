//! Filesystem-backed file index.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use packetpress_core::FileIndexProvider;
use packetpress_shared::{FileIndexEntry, PacketPressError, Result};

/// Recursively lists a local directory tree as a flat file index.
///
/// Entries use forward-slash paths and are sorted by path, so repeated
/// listings of an unchanged tree yield the same order. Unreadable
/// subdirectories are skipped with a warning rather than failing the whole
/// listing; only an unreadable root is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalIndexProvider;

impl FileIndexProvider for LocalIndexProvider {
    fn list(&self, root: &str) -> Result<Vec<FileIndexEntry>> {
        let root_path = Path::new(root);
        if !root_path.is_dir() {
            return Err(PacketPressError::Index(format!(
                "not a directory: {root}"
            )));
        }

        let mut entries = Vec::new();
        for item in WalkDir::new(root_path).min_depth(1) {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable index entry");
                    continue;
                }
            };

            let path = normalize_path(&item.path().to_string_lossy());
            if item.file_type().is_dir() {
                entries.push(FileIndexEntry::folder(path));
            } else if item.file_type().is_file() {
                entries.push(FileIndexEntry::file(path));
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root, entries = entries.len(), "listed local tree");
        Ok(entries)
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
