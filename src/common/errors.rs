use reqwest::StatusCode;
use thiserror::Error;

/// Staged failures while compiling a player script into a transform program.
///
/// Each variant names the stage that did not find what it was looking for, so
/// a site-side change to the script layout points straight at the step that
/// broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("decipher function name not found in player script")]
    FuncNameNotFound,

    #[error("decipher procedure of `{0}` not found in player script")]
    ProcedureNotFound(String),

    #[error("helper object `{0}` not found in player script")]
    ConvertersNotFound(String),

    #[error("operation `{0}` could not be resolved to a known transform")]
    OperationUnresolved(String),

    #[error("operation `{0}` has a non-numeric parameter")]
    ParamNotNumeric(String),
}

/// Failures while replaying a transform program over a concrete signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("index {index} out of range for signature of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot transform an empty signature")]
    EmptySequence,

    #[error("deciphered signature is not valid UTF-8")]
    InvalidUtf8,
}

/// A stream could not produce a usable download URL.
///
/// Clonable because the outcome of resolution is memoized on the stream and
/// handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unresolvable signature: {0}")]
    UnresolvableSignature(String),
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("request to {url} got status {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },
}

impl TransportError {
    /// Whether the failure is a timeout, the only class the streaming
    /// downloader retries.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("content size unavailable: {0}")]
    SizeUnavailable(String),
}

/// Umbrella error for every download strategy.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("range task for chunk {index} ended without a result")]
    Aborted { index: usize },

    #[error("chunk {index} returned {got} bytes, expected {expected}")]
    LengthMismatch {
        index: usize,
        expected: u64,
        got: u64,
    },
}

/// Failures of the watch-page extraction layer.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unexpected URL format {0}")]
    InvalidUrl(String),

    #[error("no video id found in {0}")]
    NoVideoId(String),

    #[error("failed to obtain sts for video info url")]
    StsNotFound,

    #[error("no streams found")]
    NoStreams,

    #[error("stream descriptor has no url")]
    MissingUrl,

    #[error("malformed stream descriptor field `{0}`")]
    MalformedField(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
