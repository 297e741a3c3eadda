//! Watch-page scraping: video id, title, player script location and the raw
//! stream maps, for both the regular and the age-restricted page.

use std::sync::LazyLock;

use regex::Regex;

use crate::common::{errors::ExtractError, types::RawStreamDescriptor};

static WATCH_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://www.youtube.com/watch\?v=(\w{11})").unwrap());
static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"watch\?v=([\w-]{11})").unwrap());

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""title":"(.+?)","#).unwrap());
static JS_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"."js":"(.+?)""#).unwrap());
static RESTRICTED_JS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#";yt\.setConfig\(\{'PLAYER_CONFIG':\s*\{.+?"js":"(.+?)"\}.+?\}(,'EXPERIMENT_FLAGS'|;)"#,
    )
    .unwrap()
});

static ADAPTIVE_FMTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""adaptive_fmts":"(.+?)""#).unwrap());
static URL_FMTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""url_encoded_fmt_stream_map":"(.+?)""#).unwrap());
static RESTRICTED_ADAPTIVE_FMTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"adaptive_fmts=(.+?)&").unwrap());
static RESTRICTED_URL_FMTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url_encoded_fmt_stream_map=(.+?)&").unwrap());

static STS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""sts"\s*:\s*(\d+)"#).unwrap());

const SITE_ROOT: &str = "https://youtube.com";
const ESCAPED_AMPERSAND: &str = r"\u0026";

pub fn is_watch_url(url: &str) -> bool {
    WATCH_URL_RE.is_match(url)
}

pub fn extract_video_id(url: &str) -> Result<String, ExtractError> {
    VIDEO_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ExtractError::NoVideoId(url.to_string()))
}

pub fn is_age_restricted(html: &str) -> bool {
    html.contains("og:restrictions:age")
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

pub fn video_info_url(video_id: &str, sts: &str) -> String {
    let eurl = format!("https://youtube.googleapis.com/v/{}", video_id);
    format!(
        "{}/get_video_info?video_id={}&eurl={}&sts={}",
        SITE_ROOT,
        video_id,
        urlencoding::encode(&eurl),
        sts
    )
}

/// Signature timestamp embedded in the embed page.
pub fn extract_sts(embed_html: &str) -> Result<String, ExtractError> {
    STS_RE
        .captures(embed_html)
        .map(|caps| caps[1].to_string())
        .ok_or(ExtractError::StsNotFound)
}

pub fn extract_title(page: &str) -> Option<String> {
    TITLE_RE.captures(page).map(|caps| caps[1].to_string())
}

/// Absolute URL of the player script. `page` is the embed page when the
/// video is age-restricted.
pub fn extract_player_url(page: &str, age_restricted: bool) -> Option<String> {
    let re = if age_restricted {
        &RESTRICTED_JS_URL_RE
    } else {
        &JS_URL_RE
    };
    re.captures(page)
        .map(|caps| format!("{}{}", SITE_ROOT, caps[1].replace(r"\/", "/")))
}

/// The adaptive and the legacy stream maps, whichever are present.
///
/// `source` is the watch page, or the video-info body when the video is
/// age-restricted; the latter carries its maps percent-encoded once more.
pub fn extract_stream_maps(source: &str, age_restricted: bool) -> Result<Vec<String>, ExtractError> {
    let maps: Vec<String> = if age_restricted {
        [&RESTRICTED_ADAPTIVE_FMTS_RE, &RESTRICTED_URL_FMTS_RE]
            .into_iter()
            .filter_map(|re| re.captures(source))
            .filter_map(|caps| query_unescape(&caps[1]))
            .collect()
    } else {
        [&ADAPTIVE_FMTS_RE, &URL_FMTS_RE]
            .into_iter()
            .filter_map(|re| re.captures(source))
            .map(|caps| caps[1].to_string())
            .collect()
    };

    if maps.is_empty() {
        return Err(ExtractError::NoStreams);
    }
    Ok(maps)
}

/// Individual raw descriptors of the given stream maps.
pub fn split_descriptors(maps: &[String]) -> impl Iterator<Item = &str> {
    maps.iter()
        .flat_map(|map| map.split(','))
        .filter(|raw| !raw.is_empty())
}

/// Turns `k=v&k=v...` (or `k=v\u0026k=v...`) into a map, percent-decoding
/// every value twice.
pub fn inflate_descriptor(raw: &str) -> Result<RawStreamDescriptor, ExtractError> {
    let separator = if raw.contains(ESCAPED_AMPERSAND) {
        ESCAPED_AMPERSAND
    } else {
        "&"
    };

    let mut descriptor = RawStreamDescriptor::new();
    for item in raw.split(separator) {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| ExtractError::MalformedField(item.to_string()))?;
        let value = query_unescape(value)
            .and_then(|once| query_unescape(&once))
            .ok_or_else(|| ExtractError::MalformedField(key.to_string()))?;
        descriptor.insert(key.to_string(), value);
    }
    Ok(descriptor)
}

/// Query-string unescaping: `+` is a space, `%XX` a byte.
fn query_unescape(s: &str) -> Option<String> {
    urlencoding::decode(&s.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}
