//! Core packet-assembly engine: manifest model, slot resolution and the
//! orchestration pipeline.
//!
//! This crate is deliberately I/O-free. It decides *which* files belong in
//! *which* order; listing, fetching, merging and rendering are injected via
//! the capability traits in [`pipeline`].

pub mod manifest;
pub mod matcher;
pub mod pipeline;
pub mod resolver;

pub use manifest::{example_manifest, PacketManifest, SearchStrategy, Selection, Slot};
pub use pipeline::{
    Capabilities, Downloader, FailureReason, FileIndexProvider, GenerateContext, Generator,
    MergeOutcome, Merger, Orchestrator, PipelineState, ProgressSink, RunConfig, SilentProgress,
    COVER_GENERATOR,
};
pub use resolver::{ResolutionOutcome, ResolverOptions, SlotResolver};
