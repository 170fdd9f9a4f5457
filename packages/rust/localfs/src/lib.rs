//! Local-filesystem implementations of the packet-assembly capabilities:
//! walkdir-backed indexing, copy-based retrieval, byte-concatenation merging
//! and plain-text generation.

pub mod fetch;
pub mod generate;
pub mod index;
pub mod merge;

pub use fetch::LocalDownloader;
pub use generate::{TextGenerator, MISSING_REPORT_GENERATOR};
pub use index::LocalIndexProvider;
pub use merge::ConcatMerger;
