//! Explicit event sink handed to the decipherer, the fetcher and the
//! downloader instead of a process-wide logger.
//!
//! [`TracingObserver`] is the default and forwards every event to `tracing`.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::download::planner::ByteRange;

/// Something worth reporting while resolving or downloading a stream.
#[derive(Debug, Clone)]
pub enum Event<'a> {
    /// A player script compiled into a transform program.
    ProgramBuilt { operations: usize },
    /// A player script could not be compiled; streams keep no decipherer.
    ProgramFailed { reason: &'a str },
    /// A stream's final URL is ready.
    UrlResolved { url: &'a str },
    /// A stream descriptor was rejected.
    StreamSkipped { reason: &'a str },
    /// Extraction could not find an optional field.
    FieldMissing { field: &'a str },
    /// The content-length probe succeeded and a partition was planned.
    Planned { size: u64, chunks: usize },
    /// A range request timed out and is tried once more.
    ChunkRetry { index: usize, range: ByteRange },
    /// A range request failed for good.
    ChunkFailed { index: usize, range: ByteRange, reason: &'a str },
    /// All requested bytes arrived.
    Completed { bytes: u64, elapsed: Duration },
}

pub trait Observer: Send + Sync {
    fn notify(&self, event: Event<'_>);
}

/// Routes events to `tracing` at a level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: Event<'_>) {
        match event {
            Event::ProgramBuilt { operations } => {
                debug!("Built transform program with {} operations", operations)
            }
            Event::ProgramFailed { reason } => {
                warn!("Failed to build decipherer: {}", reason)
            }
            Event::UrlResolved { url } => debug!("download url prepared: {}", url),
            Event::StreamSkipped { reason } => warn!("Skipping stream: {}", reason),
            Event::FieldMissing { field } => debug!("no {} is extracted", field),
            Event::Planned { size, chunks } => {
                debug!("Planned {} bytes in {} chunks", size, chunks)
            }
            Event::ChunkRetry { index, range } => {
                warn!("range {} (chunk {}) timed out -> retry", range, index)
            }
            Event::ChunkFailed {
                index,
                range,
                reason,
            } => warn!("range {} (chunk {}) failed: {}", range, index, reason),
            Event::Completed { bytes, elapsed } => {
                info!("download completed: {} bytes in {:?}", bytes, elapsed)
            }
        }
    }
}
