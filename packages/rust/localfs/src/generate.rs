//! Plain-text content generation for cover pages and reports.

use std::path::{Path, PathBuf};

use packetpress_core::{GenerateContext, Generator, COVER_GENERATOR};
use packetpress_shared::{PacketPressError, Result};

/// Name of the generator producing a missing-documents report.
pub const MISSING_REPORT_GENERATOR: &str = "missing_report";

/// Renders cover pages and missing-document reports as plain text files.
///
/// Good enough for concatenated text packets and for exercising the
/// pipeline; a PDF-producing generator would implement the same trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextGenerator;

impl Generator for TextGenerator {
    fn generate(
        &self,
        name: &str,
        context: &GenerateContext<'_>,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        let content = match name {
            COVER_GENERATOR => render_cover(context),
            MISSING_REPORT_GENERATOR => render_missing_report(context),
            other => {
                return Err(PacketPressError::Generator {
                    name: other.into(),
                    message: "unknown generator".into(),
                });
            }
        };

        std::fs::create_dir_all(dest_dir).map_err(|e| PacketPressError::io(dest_dir, e))?;
        let path = dest_dir.join(format!("{name}_{:03}.txt", context.slot_id));
        std::fs::write(&path, content).map_err(|e| PacketPressError::io(&path, e))?;
        Ok(path)
    }
}

fn render_cover(context: &GenerateContext<'_>) -> String {
    let title = context.title.unwrap_or(context.slot_name);
    format!(
        "{rule}\n\n{title}\n\n{packet}\n\n{rule}\n",
        rule = "=".repeat(60),
        packet = context.packet_name,
    )
}

fn render_missing_report(context: &GenerateContext<'_>) -> String {
    let mut out = format!(
        "MISSING DOCUMENTS REPORT\nPacket: {}\n\n",
        context.packet_name
    );
    if context.missing_items.is_empty() {
        out.push_str("All expected documents were located.\n");
    } else {
        for item in context.missing_items {
            out.push_str("  - ");
            out.push_str(item);
            out.push('\n');
        }
    }
    out
}
