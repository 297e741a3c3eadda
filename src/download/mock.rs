use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, header::HeaderMap};

use crate::common::{
    errors::TransportError,
    http::{HttpResponse, Transport},
    observer::{Event, Observer},
};

/// Fault key for requests without a `&range=` suffix.
pub(crate) const WHOLE_BODY: u64 = u64::MAX;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    Timeout,
    Status(StatusCode),
    /// Answers with the requested bytes minus the last one.
    Short,
}

/// Serves `payload`, honouring `&range=a-b` on GET, with a per-range delay so
/// completions arrive out of order. Ranges past the payload are cut short, as
/// a server would.
pub(crate) struct MockTransport {
    payload: Bytes,
    content_length: Option<String>,
    faults: Mutex<HashMap<u64, VecDeque<Fault>>>,
    delay_ms: u64,
    pub(crate) requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        Self {
            content_length: Some(payload.len().to_string()),
            payload,
            faults: Mutex::new(HashMap::new()),
            delay_ms: 0,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_content_length(mut self, value: Option<&str>) -> Self {
        self.content_length = value.map(str::to_string);
        self
    }

    pub(crate) fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Queues faults for the GETs of the range starting at `start`, or of the
    /// whole body with [`WHOLE_BODY`].
    pub(crate) fn with_faults(self, start: u64, faults: &[Fault]) -> Self {
        self.faults
            .lock()
            .unwrap()
            .insert(start, faults.iter().copied().collect());
        self
    }

    pub(crate) fn gets(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.strip_prefix("GET ").map(str::to_string))
            .collect()
    }

    fn parse_range(url: &str) -> Option<(u64, u64)> {
        let (_, range) = url.rsplit_once("&range=")?;
        let (start, end) = range.split_once('-')?;
        Some((start.parse().ok()?, end.parse().ok()?))
    }

    fn body(&self, range: Option<(u64, u64)>) -> Bytes {
        let len = self.payload.len();
        match range {
            Some((start, end)) => {
                let start = (start as usize).min(len);
                let end = (end as usize).saturating_add(1).min(len);
                self.payload.slice(start..end.max(start))
            }
            None => self.payload.clone(),
        }
    }

    fn jitter(&self, start: u64) -> Duration {
        let spread = (start.wrapping_mul(31).wrapping_add(7)) % 11;
        Duration::from_millis(self.delay_ms + spread)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(format!("GET {}", url));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let range = Self::parse_range(url);
        tokio::time::sleep(self.jitter(range.map_or(0, |(s, _)| s))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = range.map_or(WHOLE_BODY, |(start, _)| start);
        let fault = self
            .faults
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        match fault {
            Some(Fault::Timeout) => Err(TransportError::Timeout {
                url: url.to_string(),
            }),
            Some(Fault::Status(status)) => Ok(HttpResponse {
                status,
                headers: HeaderMap::new(),
                body: Bytes::new(),
            }),
            Some(Fault::Short) => {
                let body = self.body(range);
                Ok(HttpResponse {
                    status: StatusCode::PARTIAL_CONTENT,
                    headers: HeaderMap::new(),
                    body: body.slice(..body.len().saturating_sub(1)),
                })
            }
            None => Ok(HttpResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: self.body(range),
            }),
        }
    }

    async fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(format!("HEAD {}", url));
        let mut headers = HeaderMap::new();
        if let Some(len) = &self.content_length {
            headers.insert(reqwest::header::CONTENT_LENGTH, len.parse().unwrap());
        }
        Ok(HttpResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::new(),
        })
    }
}

/// Keeps the `Debug` rendering of every event.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub(crate) events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: Event<'_>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}
