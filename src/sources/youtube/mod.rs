pub mod cipher;
pub mod extractor;
pub mod formats;
pub mod stream;

use std::sync::Arc;

use tracing::{debug, warn};

pub use cipher::{Decipher, SignatureDecipherer};
pub use formats::{FormatProfile, format_profile};
pub use stream::Stream;

use crate::common::{
    errors::ExtractError,
    http::{Transport, fetch_ok},
    observer::{Event, Observer},
};

/// What a watch page yields.
#[derive(Debug)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub streams: Vec<Stream>,
}

/// Turns a watch URL into a [`Video`].
pub struct VideoFetcher {
    url: String,
    video_id: String,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn Observer>,
}

/// Page texts a fetch works from, depending on the age-restriction branch.
struct PageSources {
    /// Page holding the title and the player script location.
    meta: String,
    /// Page or video-info body holding the stream maps.
    streams: String,
    age_restricted: bool,
}

impl VideoFetcher {
    pub fn new(
        url: &str,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn Observer>,
    ) -> Result<Self, ExtractError> {
        if !extractor::is_watch_url(url) {
            return Err(ExtractError::InvalidUrl(url.to_string()));
        }
        let video_id = extractor::extract_video_id(url)?;

        Ok(Self {
            url: url.to_string(),
            video_id,
            transport,
            observer,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Fetches the page, compiles the player script and builds one
    /// [`Stream`] per descriptor.
    ///
    /// A missing title or player script is reported and tolerated; streams
    /// then carry no decipherer. Descriptors that cannot be parsed are
    /// skipped. Having no stream left is an error.
    pub async fn fetch_streams(&self) -> Result<Video, ExtractError> {
        let sources = self.load_sources().await?;

        let title = extractor::extract_title(&sources.meta).unwrap_or_else(|| {
            self.observer.notify(Event::FieldMissing { field: "title" });
            String::new()
        });

        let maps = extractor::extract_stream_maps(&sources.streams, sources.age_restricted)?;

        let decipherer = match extractor::extract_player_url(&sources.meta, sources.age_restricted)
        {
            Some(player_url) => self.load_decipherer(&player_url).await,
            None => {
                self.observer.notify(Event::FieldMissing {
                    field: "player script url",
                });
                None
            }
        };

        let mut streams = Vec::new();
        for raw in extractor::split_descriptors(&maps) {
            let built = extractor::inflate_descriptor(raw).and_then(|descriptor| {
                Stream::new(&descriptor, decipherer.clone(), self.observer.clone())
            });
            match built {
                Ok(stream) => streams.push(stream),
                Err(e) => self.observer.notify(Event::StreamSkipped {
                    reason: &e.to_string(),
                }),
            }
        }

        if streams.is_empty() {
            return Err(ExtractError::NoStreams);
        }

        debug!(
            "Extracted {} streams for {} ({})",
            streams.len(),
            self.video_id,
            title
        );
        Ok(Video {
            id: self.video_id.clone(),
            title,
            streams,
        })
    }

    async fn load_sources(&self) -> Result<PageSources, ExtractError> {
        let html = self.get_text(&self.url).await?;
        if !extractor::is_age_restricted(&html) {
            return Ok(PageSources {
                meta: html.clone(),
                streams: html,
                age_restricted: false,
            });
        }

        debug!("{} is age-restricted, using the embed page", self.video_id);
        let embed = self.get_text(&extractor::embed_url(&self.video_id)).await?;
        let sts = extractor::extract_sts(&embed)?;
        let info = self
            .get_text(&extractor::video_info_url(&self.video_id, &sts))
            .await?;

        Ok(PageSources {
            meta: embed,
            streams: info,
            age_restricted: true,
        })
    }

    async fn load_decipherer(&self, player_url: &str) -> Option<Arc<dyn Decipher>> {
        let script = match self.get_text(player_url).await {
            Ok(script) => script,
            Err(e) => {
                warn!("Failed to fetch player script {}: {}", player_url, e);
                return None;
            }
        };

        SignatureDecipherer::from_script(&script, self.observer.clone())
            .ok()
            .map(|d| Arc::new(d) as Arc<dyn Decipher>)
    }

    async fn get_text(&self, url: &str) -> Result<String, ExtractError> {
        let body = fetch_ok(self.transport.as_ref(), url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
