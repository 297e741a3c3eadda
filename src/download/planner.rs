use std::{fmt, time::Duration};

use crate::common::{errors::PlanError, http::Transport};

/// Half-open byte interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Query suffix for the remote service, which wants an inclusive end.
    pub fn query(&self) -> String {
        format!("&range={}-{}", self.start, self.end.saturating_sub(1))
    }

    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base, self.query())
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end.saturating_sub(1))
    }
}

/// Ascending offsets `[0, o1, ..., size]`. Consecutive pairs are the ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePartition {
    offsets: Vec<u64>,
}

impl BytePartition {
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn total(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ranges(&self) -> impl ExactSizeIterator<Item = ByteRange> + '_ {
        self.offsets.windows(2).map(|w| ByteRange {
            start: w[0],
            end: w[1],
        })
    }
}

/// Splits `total` bytes into ranges of roughly `slice` worth of playback.
///
/// The chunk size is `floor(total / duration * slice)`, at least one byte.
/// Without a usable duration the whole body is a single range.
pub fn plan(total: u64, slice: Duration, duration: Option<Duration>) -> BytePartition {
    if total == 0 {
        return BytePartition { offsets: vec![0] };
    }

    let chunk = match duration.filter(|d| !d.is_zero()) {
        Some(d) => ((total as f64 / d.as_secs_f64() * slice.as_secs_f64()).floor() as u64).max(1),
        None => total,
    };

    let mut offsets: Vec<u64> = (0..total).step_by(chunk as usize).collect();
    offsets.push(total);
    BytePartition { offsets }
}

/// `HEAD` the resolved URL and read its `Content-Length`.
pub async fn probe_size(transport: &dyn Transport, url: &str) -> Result<u64, PlanError> {
    let res = transport
        .head(url)
        .await
        .map_err(|e| PlanError::SizeUnavailable(e.to_string()))?;

    if !res.status.is_success() {
        return Err(PlanError::SizeUnavailable(format!(
            "HEAD {} got status {}",
            url, res.status
        )));
    }

    res.content_length().ok_or_else(|| {
        PlanError::SizeUnavailable("header does not contain a valid Content-Length".into())
    })
}
