use std::{
    fmt,
    sync::{Arc, LazyLock, OnceLock},
    time::Duration,
};

use regex::Regex;

use super::{cipher::Decipher, formats::format_profile};
use crate::common::{
    errors::{ExtractError, ResolveError},
    observer::{Event, Observer},
    types::{MediaType, RawStreamDescriptor},
};

static MIME_CODECS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-z]+?)/([a-z0-9]+?);\s*codecs="([\w\s.,]+?)""#).unwrap()
});

/// One downloadable variant of a video.
pub struct Stream {
    pub itag: Option<u32>,
    pub abr: String,
    pub fps: String,
    pub resolution: String,
    pub media_type: MediaType,
    /// `hd720`, `medium`, ...
    pub quality: String,
    /// Container, e.g. `mp4`.
    pub format: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub is_3d: bool,
    pub is_live: bool,
    pub duration: Option<Duration>,
    url: String,
    signature: Option<String>,
    decipherer: Option<Arc<dyn Decipher>>,
    observer: Arc<dyn Observer>,
    resolved: OnceLock<Result<String, ResolveError>>,
}

impl Stream {
    /// Builds a stream from a percent-decoded descriptor. Only `url` is
    /// mandatory; every other field falls back to an empty value.
    pub fn new(
        descriptor: &RawStreamDescriptor,
        decipherer: Option<Arc<dyn Decipher>>,
        observer: Arc<dyn Observer>,
    ) -> Result<Self, ExtractError> {
        let url = descriptor.get("url").cloned().ok_or(ExtractError::MissingUrl)?;

        let mut stream = Self {
            itag: None,
            abr: String::new(),
            fps: String::new(),
            resolution: String::new(),
            media_type: MediaType::Unknown,
            quality: String::new(),
            format: String::new(),
            video_codec: String::new(),
            audio_codec: String::new(),
            is_3d: false,
            is_live: false,
            duration: None,
            url,
            signature: descriptor.get("s").cloned(),
            decipherer,
            observer,
            resolved: OnceLock::new(),
        };

        if stream.signature.is_none() {
            stream.observer.notify(Event::FieldMissing { field: "signature" });
        }

        match descriptor.get("quality").or_else(|| descriptor.get("quality_label")) {
            Some(q) => stream.quality = q.clone(),
            None => stream.observer.notify(Event::FieldMissing { field: "quality" }),
        }

        match descriptor.get("type") {
            Some(mime) => stream.apply_mime(mime),
            None => stream.observer.notify(Event::FieldMissing { field: "type" }),
        }

        if let Some(raw) = descriptor.get("itag") {
            match raw.parse::<u32>() {
                Ok(itag) => stream.apply_itag(itag),
                Err(_) => stream.observer.notify(Event::FieldMissing { field: "itag" }),
            }
        }

        stream.duration = descriptor
            .get("duration")
            .and_then(|d| d.parse::<u64>().ok())
            .map(Duration::from_secs);

        Ok(stream)
    }

    fn apply_mime(&mut self, mime: &str) {
        let Some(caps) = MIME_CODECS_RE.captures(mime) else {
            self.observer.notify(Event::FieldMissing { field: "codecs" });
            return;
        };

        self.media_type = caps[1].parse().unwrap_or(MediaType::Unknown);
        self.format = caps[2].to_string();

        let codecs: Vec<&str> = caps[3].split(", ").collect();
        match codecs.as_slice() {
            [only] if self.media_type == MediaType::Audio => {
                self.audio_codec = only.to_string();
            }
            [only] => self.video_codec = only.to_string(),
            [video, audio, ..] => {
                self.video_codec = video.to_string();
                self.audio_codec = audio.to_string();
            }
            [] => {}
        }
    }

    fn apply_itag(&mut self, itag: u32) {
        let profile = format_profile(itag);
        self.itag = Some(itag);
        self.fps = if profile.is_60fps { "60" } else { "30" }.to_string();
        self.abr = profile.bitrate.to_string();
        self.resolution = profile.resolution.to_string();
        self.is_3d = profile.is_3d;
        self.is_live = profile.is_live;
    }

    /// The URL every download request starts from.
    ///
    /// Computed once; racing first callers block on the same computation and
    /// later calls return the memoized outcome, failures included.
    pub fn resolve_url(&self) -> Result<String, ResolveError> {
        self.resolved
            .get_or_init(|| {
                let resolved = self.build_url();
                if let Ok(url) = &resolved {
                    self.observer.notify(Event::UrlResolved { url });
                }
                resolved
            })
            .clone()
    }

    fn build_url(&self) -> Result<String, ResolveError> {
        if self.url.contains("&signature=") {
            return Ok(self.url.clone());
        }

        let signature = self.signature.as_deref().ok_or_else(|| {
            ResolveError::UnresolvableSignature("stream has no signature".into())
        })?;
        let decipherer = self.decipherer.as_ref().ok_or_else(|| {
            ResolveError::UnresolvableSignature("no decipherer for player script".into())
        })?;

        let deciphered = decipherer
            .decipher(signature)
            .map_err(|e| ResolveError::UnresolvableSignature(e.to_string()))?;

        Ok(format!("{}&signature={}", self.url, deciphered))
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stream<MediaType:{} Quality:{} Format:{} Resolution:{}",
            self.media_type, self.quality, self.format, self.resolution
        )?;
        if self.is_3d {
            write!(f, " 3D")?;
        }
        if self.is_live {
            write!(f, " Live")?;
        }
        write!(f, ">")
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("itag", &self.itag)
            .field("media_type", &self.media_type)
            .field("quality", &self.quality)
            .field("format", &self.format)
            .field("resolution", &self.resolution)
            .field("duration", &self.duration)
            .field("url", &self.url)
            .field("has_signature", &self.signature.is_some())
            .field("has_decipherer", &self.decipherer.is_some())
            .finish()
    }
}
