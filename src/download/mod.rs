//! Byte-range planning and the chunked downloader.

pub mod chunked;
pub mod planner;

#[cfg(test)]
pub(crate) mod mock;

pub use chunked::{Chunk, ChunkStream, ChunkedDownloader, DownloadOptions};
pub use planner::{BytePartition, ByteRange, plan, probe_size};

/// Seconds of media per range in bulk-parallel mode.
pub const DEFAULT_SLICE_SECS: u64 = 20;

/// In-flight range requests allowed while streaming.
pub const MAX_SIMULTANEOUS_REQUESTS: usize = 20;
