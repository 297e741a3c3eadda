use std::{collections::HashMap, convert::Infallible, str::FromStr};

/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

/// Percent-decoded `key -> value` fields of one stream descriptor
/// (`url`, `s`, `type`, `quality`, `quality_label`, `itag`, `duration`, ...).
/// Only `url` is guaranteed to be present.
pub type RawStreamDescriptor = HashMap<String, String>;

/// Container/media kind parsed from a descriptor's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Video,
    Audio,
    Unknown,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unknown => "",
        }
    }
}

impl FromStr for MediaType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Unknown,
        })
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
