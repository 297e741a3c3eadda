use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::download::{DEFAULT_SLICE_SECS, MAX_SIMULTANEOUS_REQUESTS};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DownloadConfig {
    /// Seconds of media per range request in bulk-parallel mode.
    #[serde(default = "default_slice_secs")]
    pub slice_secs: u64,
    /// Seconds of media per chunk in ordered-streaming mode.
    #[serde(default = "default_slice_secs")]
    pub streaming_slice_secs: u64,
    /// Cap on in-flight range requests in ordered-streaming mode.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_slice_secs() -> u64 {
    DEFAULT_SLICE_SECS
}

fn default_max_concurrent_requests() -> usize {
    MAX_SIMULTANEOUS_REQUESTS
}

impl DownloadConfig {
    pub fn slice(&self) -> Duration {
        Duration::from_secs(self.slice_secs)
    }

    pub fn streaming_slice(&self) -> Duration {
        Duration::from_secs(self.streaming_slice_secs)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            slice_secs: default_slice_secs(),
            streaming_slice_secs: default_slice_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}
