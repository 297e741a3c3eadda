//! Three ways of pulling a stream's bytes.
//!
//! - [`ChunkedDownloader::download`]: one GET for the whole body.
//! - [`ChunkedDownloader::parallel_download`]: every range at once, fail-fast,
//!   concatenated in partition order.
//! - [`ChunkedDownloader::sequential_chunks`]: ranges fetched under a
//!   concurrency cap and handed out one by one, in order, as they complete.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};
use tokio::{
    sync::{Semaphore, mpsc, oneshot},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::{
    DEFAULT_SLICE_SECS, MAX_SIMULTANEOUS_REQUESTS,
    planner::{BytePartition, ByteRange, plan, probe_size},
};
use crate::{
    common::{
        errors::DownloadError,
        http::{Transport, fetch_ok},
        observer::{Event, Observer},
    },
    configs::DownloadConfig,
    sources::youtube::Stream,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Playback time covered by one range in `parallel_download`.
    pub slice: Duration,
    /// In-flight range requests allowed by `sequential_chunks`.
    pub max_concurrent_requests: usize,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            slice: Duration::from_secs(DEFAULT_SLICE_SECS),
            max_concurrent_requests: MAX_SIMULTANEOUS_REQUESTS,
        }
    }
}

impl From<&DownloadConfig> for DownloadOptions {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            slice: config.slice(),
            max_concurrent_requests: config.max_concurrent_requests.max(1),
        }
    }
}

/// One range of an ordered stream. A failed range still takes its place.
#[derive(Debug)]
pub struct Chunk {
    pub index: usize,
    pub range: ByteRange,
    pub data: Result<Bytes, DownloadError>,
}

pub struct ChunkedDownloader {
    transport: Arc<dyn Transport>,
    observer: Arc<dyn Observer>,
    options: DownloadOptions,
}

impl ChunkedDownloader {
    pub fn new(
        transport: Arc<dyn Transport>,
        observer: Arc<dyn Observer>,
        options: DownloadOptions,
    ) -> Self {
        Self {
            transport,
            observer,
            options,
        }
    }

    /// Content length of the stream's resolved URL.
    pub async fn size(&self, stream: &Stream) -> Result<u64, DownloadError> {
        let url = stream.resolve_url()?;
        Ok(probe_size(self.transport.as_ref(), &url).await?)
    }

    pub async fn download(&self, stream: &Stream) -> Result<Bytes, DownloadError> {
        let started = Instant::now();
        let url = stream.resolve_url()?;
        let body = fetch_ok(self.transport.as_ref(), &url).await?;

        self.observer.notify(Event::Completed {
            bytes: body.len() as u64,
            elapsed: started.elapsed(),
        });
        Ok(body)
    }

    async fn partition(
        &self,
        stream: &Stream,
        slice: Duration,
    ) -> Result<(String, BytePartition), DownloadError> {
        let url = stream.resolve_url()?;
        let size = probe_size(self.transport.as_ref(), &url).await?;
        let partition = plan(size, slice, stream.duration);

        self.observer.notify(Event::Planned {
            size,
            chunks: partition.len(),
        });
        Ok((url, partition))
    }

    /// Fetches every range concurrently. The first failure aborts the
    /// remaining requests and is returned as is.
    pub async fn parallel_download(&self, stream: &Stream) -> Result<Bytes, DownloadError> {
        let started = Instant::now();
        let (url, partition) = self.partition(stream, self.options.slice).await?;

        let mut tasks = JoinSet::new();
        for (index, range) in partition.ranges().enumerate() {
            let transport = self.transport.clone();
            let url = range.url(&url);
            tasks.spawn(async move {
                let result = fetch_range(transport.as_ref(), &url, index, range).await;
                (index, range, result)
            });
        }

        let mut parts: Vec<Option<Bytes>> = vec![None; partition.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(data))) => parts[index] = Some(data),
                Ok((index, range, Err(e))) => {
                    tasks.abort_all();
                    self.observer.notify(Event::ChunkFailed {
                        index,
                        range,
                        reason: &e.to_string(),
                    });
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    error!("range task did not finish: {}", e);
                    break;
                }
            }
        }

        let parts = parts
            .into_iter()
            .enumerate()
            .map(|(index, part)| part.ok_or(DownloadError::Aborted { index }))
            .collect::<Result<Vec<_>, _>>()?;

        let mut buf = BytesMut::with_capacity(parts.iter().map(Bytes::len).sum());
        for part in &parts {
            buf.extend_from_slice(part);
        }

        self.observer.notify(Event::Completed {
            bytes: buf.len() as u64,
            elapsed: started.elapsed(),
        });
        Ok(buf.freeze())
    }

    /// Starts fetching ranges of `slice` playback time and returns a stream
    /// that yields them in order.
    ///
    /// Probing and planning happen before this returns, so their errors
    /// surface here and no range request is made. Failures of individual
    /// ranges are delivered as [`Chunk`]s whose `data` is an error. Dropping
    /// the returned stream stops launching new requests.
    pub async fn sequential_chunks(
        &self,
        stream: &Stream,
        slice: Duration,
    ) -> Result<ChunkStream, DownloadError> {
        let started = Instant::now();
        let (url, partition) = self.partition(stream, slice).await?;
        let ranges: Vec<ByteRange> = partition.ranges().collect();
        let cap = self.options.max_concurrent_requests.max(1);

        let (senders, receivers): (Vec<_>, Vec<_>) =
            ranges.iter().map(|_| oneshot::channel()).unzip();
        let (tx, rx) = mpsc::channel(cap);
        let cancel = CancellationToken::new();

        let ctx = Arc::new(RangeFetcher {
            transport: self.transport.clone(),
            observer: self.observer.clone(),
            url,
        });

        tokio::spawn(dispatch(
            ctx,
            ranges.clone(),
            senders,
            Arc::new(Semaphore::new(cap)),
            cancel.clone(),
        ));
        tokio::spawn(reorder(
            ranges.clone(),
            receivers,
            tx,
            self.observer.clone(),
            started,
            cancel.clone(),
        ));

        Ok(ChunkStream {
            rx,
            cancel,
            expected: ranges.len(),
            received: 0,
        })
    }
}

struct RangeFetcher {
    transport: Arc<dyn Transport>,
    observer: Arc<dyn Observer>,
    url: String,
}

impl RangeFetcher {
    /// A timed-out request is tried exactly once more.
    async fn fetch(&self, index: usize, range: ByteRange) -> Result<Bytes, DownloadError> {
        let url = range.url(&self.url);
        let transport = self.transport.as_ref();
        let result = match fetch_range(transport, &url, index, range).await {
            Err(DownloadError::Transport(e)) if e.is_timeout() => {
                self.observer.notify(Event::ChunkRetry { index, range });
                fetch_range(transport, &url, index, range).await
            }
            other => other,
        };

        result.inspect_err(|e| {
            self.observer.notify(Event::ChunkFailed {
                index,
                range,
                reason: &e.to_string(),
            });
        })
    }
}

/// GETs one range and checks that the reply covers it exactly.
async fn fetch_range(
    transport: &dyn Transport,
    url: &str,
    index: usize,
    range: ByteRange,
) -> Result<Bytes, DownloadError> {
    let data = fetch_ok(transport, url).await?;
    if data.len() as u64 != range.len() {
        return Err(DownloadError::LengthMismatch {
            index,
            expected: range.len(),
            got: data.len() as u64,
        });
    }
    Ok(data)
}

type Slot = oneshot::Sender<Result<Bytes, DownloadError>>;

async fn dispatch(
    ctx: Arc<RangeFetcher>,
    ranges: Vec<ByteRange>,
    slots: Vec<Slot>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
) {
    for (index, (range, slot)) in ranges.into_iter().zip(slots).enumerate() {
        let permit = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Dispatcher cancelled before chunk {}", index);
                return;
            }
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return,
            },
        };

        let ctx = ctx.clone();
        tokio::spawn(async move {
            let result = ctx.fetch(index, range).await;
            drop(permit);
            // receiver is gone once the consumer dropped the stream
            let _ = slot.send(result);
        });
    }
}

async fn reorder(
    ranges: Vec<ByteRange>,
    slots: Vec<oneshot::Receiver<Result<Bytes, DownloadError>>>,
    tx: mpsc::Sender<Chunk>,
    observer: Arc<dyn Observer>,
    started: Instant,
    cancel: CancellationToken,
) {
    let mut bytes = 0u64;
    let mut failed = false;

    for (index, (range, slot)) in ranges.into_iter().zip(slots).enumerate() {
        // a dropped sender after cancellation is a range that was never requested
        let data = match slot.await {
            Ok(data) => data,
            Err(_) if cancel.is_cancelled() => return,
            Err(_) => Err(DownloadError::Aborted { index }),
        };

        match &data {
            Ok(b) => bytes += b.len() as u64,
            Err(_) => failed = true,
        }

        trace!("Forwarding chunk {} ({})", index, range);
        if tx.send(Chunk { index, range, data }).await.is_err() {
            cancel.cancel();
            return;
        }
    }

    if !failed {
        observer.notify(Event::Completed {
            bytes,
            elapsed: started.elapsed(),
        });
    }
}

/// Ordered chunks of a running download.
///
/// Implements [`futures::Stream`]; dropping it cancels the dispatcher.
pub struct ChunkStream {
    rx: mpsc::Receiver<Chunk>,
    cancel: CancellationToken,
    expected: usize,
    received: usize,
}

impl ChunkStream {
    /// Number of chunks planned.
    pub fn len(&self) -> usize {
        self.expected
    }

    pub fn is_empty(&self) -> bool {
        self.expected == 0
    }

    pub async fn next_chunk(&mut self) -> Option<Chunk> {
        let chunk = self.rx.recv().await;
        if chunk.is_some() {
            self.received += 1;
        }
        chunk
    }

    /// Concatenates every chunk; the first failed chunk ends the download.
    pub async fn collect_bytes(mut self) -> Result<Bytes, DownloadError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await {
            buf.extend_from_slice(&chunk.data?);
        }
        if self.received < self.expected {
            return Err(DownloadError::Aborted {
                index: self.received,
            });
        }
        Ok(buf.freeze())
    }

    /// Stops launching range requests. Ranges already requested are still
    /// delivered; the stream then ends before the first one that was not.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl futures::Stream for ChunkStream {
    type Item = Chunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Chunk>> {
        let this = self.get_mut();
        let polled = this.rx.poll_recv(cx);
        if let Poll::Ready(Some(_)) = &polled {
            this.received += 1;
        }
        polled
    }
}

impl Drop for ChunkStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use futures::StreamExt;
    use reqwest::StatusCode;

    use super::*;
    use crate::{
        common::errors::{PlanError, TransportError},
        download::mock::{Fault, MockTransport, RecordingObserver, WHOLE_BODY},
        sources::youtube::stream::tests::descriptor,
    };

    const BASE: &str = "https://foobar?id=1&signature=xyz";
    const PAYLOAD: &[u8] = b"abcdefghijklmnopq"; // 17 bytes

    fn stream(duration: &str) -> Stream {
        Stream::new(
            &descriptor(&[("url", BASE), ("duration", duration)]),
            None,
            Arc::new(RecordingObserver::default()),
        )
        .unwrap()
    }

    fn downloader(
        transport: Arc<MockTransport>,
        observer: Arc<RecordingObserver>,
        cap: usize,
    ) -> ChunkedDownloader {
        ChunkedDownloader::new(
            transport,
            observer,
            DownloadOptions {
                slice: Duration::from_secs(20),
                max_concurrent_requests: cap,
            },
        )
    }

    fn expected_range_urls() -> Vec<String> {
        [
            "0-1", "2-3", "4-5", "6-7", "8-9", "10-11", "12-13", "14-15", "16-16",
        ]
        .iter()
        .map(|r| format!("{}&range={}", BASE, r))
        .collect()
    }

    #[tokio::test]
    async fn test_download_single_shot() {
        let transport = Arc::new(MockTransport::new(PAYLOAD));
        let d = downloader(transport.clone(), Arc::default(), 20);

        let body = d.download(&stream("150")).await.unwrap();
        assert_eq!(&body[..], PAYLOAD);
        assert_eq!(transport.gets(), vec![BASE.to_string()]);
    }

    #[tokio::test]
    async fn test_download_non_success_status() {
        let transport = Arc::new(
            MockTransport::new(PAYLOAD)
                .with_faults(WHOLE_BODY, &[Fault::Status(StatusCode::FORBIDDEN)]),
        );
        let d = downloader(transport, Arc::default(), 20);

        let err = d.download(&stream("150")).await.unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Transport(TransportError::Status {
                status: StatusCode::FORBIDDEN,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unresolvable_url_makes_no_request() {
        let transport = Arc::new(MockTransport::new(PAYLOAD));
        let d = downloader(transport.clone(), Arc::default(), 20);
        let s = Stream::new(
            &descriptor(&[("url", "https://foobar?id=1"), ("s", "abcd")]),
            None,
            Arc::new(RecordingObserver::default()),
        )
        .unwrap();

        assert!(matches!(
            d.download(&s).await,
            Err(DownloadError::Resolve(_))
        ));
        assert!(matches!(
            d.parallel_download(&s).await,
            Err(DownloadError::Resolve(_))
        ));
        assert!(d.sequential_chunks(&s, Duration::from_secs(20)).await.is_err());
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parallel_download_urls_and_order() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_delay(3));
        let observer = Arc::new(RecordingObserver::default());
        let d = downloader(transport.clone(), observer.clone(), 20);

        let body = d.parallel_download(&stream("150")).await.unwrap();
        assert_eq!(&body[..], PAYLOAD);

        let mut gets = transport.gets();
        gets.sort_by_key(|u| {
            let (_, r) = u.rsplit_once('=').unwrap();
            r.split('-').next().unwrap().parse::<u64>().unwrap()
        });
        assert_eq!(gets, expected_range_urls());
        assert_eq!(observer.count("Planned"), 1);
        assert_eq!(observer.count("Completed"), 1);
    }

    #[tokio::test]
    async fn test_parallel_download_fails_fast() {
        let transport = Arc::new(
            MockTransport::new(PAYLOAD).with_faults(6, &[Fault::Status(StatusCode::FORBIDDEN)]),
        );
        let d = downloader(transport, Arc::default(), 20);

        let err = d.parallel_download(&stream("150")).await.unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Transport(TransportError::Status {
                status: StatusCode::FORBIDDEN,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unknown_duration_is_one_range() {
        let transport = Arc::new(MockTransport::new(PAYLOAD));
        let d = downloader(transport.clone(), Arc::default(), 20);

        let body = d.parallel_download(&stream("0")).await.unwrap();
        assert_eq!(&body[..], PAYLOAD);
        assert_eq!(transport.gets(), vec![format!("{}&range=0-16", BASE)]);
    }

    #[tokio::test]
    async fn test_missing_content_length() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_content_length(None));
        let d = downloader(transport.clone(), Arc::default(), 20);

        assert!(matches!(
            d.parallel_download(&stream("150")).await,
            Err(DownloadError::Plan(PlanError::SizeUnavailable(_)))
        ));
        assert!(matches!(
            d.sequential_chunks(&stream("150"), Duration::from_secs(20))
                .await
                .err(),
            Some(DownloadError::Plan(_))
        ));
        assert!(transport.gets().is_empty());

        let bad = Arc::new(MockTransport::new(PAYLOAD).with_content_length(Some("lots")));
        let d = downloader(bad, Arc::default(), 20);
        assert!(d.size(&stream("150")).await.is_err());
    }

    #[tokio::test]
    async fn test_size() {
        let d = downloader(Arc::new(MockTransport::new(PAYLOAD)), Arc::default(), 20);
        assert_eq!(d.size(&stream("150")).await.unwrap(), 17);
    }

    #[tokio::test]
    async fn test_strategies_agree() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_007).collect();
        let transport = Arc::new(MockTransport::new(payload.clone()).with_delay(1));
        let d = downloader(transport, Arc::default(), 3);
        let s = stream("97");

        let single = d.download(&s).await.unwrap();
        let parallel = d.parallel_download(&s).await.unwrap();
        let streamed = d
            .sequential_chunks(&s, Duration::from_secs(5))
            .await
            .unwrap()
            .collect_bytes()
            .await
            .unwrap();

        assert_eq!(&single[..], &payload[..]);
        assert_eq!(parallel, single);
        assert_eq!(streamed, single);
    }

    #[tokio::test]
    async fn test_sequential_chunks_in_order() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_delay(2));
        let d = downloader(transport.clone(), Arc::default(), 4);

        let chunks: Vec<Chunk> = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 9);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            let expected = &PAYLOAD[chunk.range.start as usize..chunk.range.end as usize];
            assert_eq!(&chunk.data.as_ref().unwrap()[..], expected);
        }
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_sequential_chunks_respects_cap() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_delay(10));
        let d = downloader(transport.clone(), Arc::default(), 2);

        let body = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap()
            .collect_bytes()
            .await
            .unwrap();

        assert_eq!(&body[..], PAYLOAD);
        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_retried_once() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_faults(4, &[Fault::Timeout]));
        let observer = Arc::new(RecordingObserver::default());
        let d = downloader(transport.clone(), observer.clone(), 20);

        let mut chunks = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap();
        let mut got = Vec::new();
        while let Some(chunk) = chunks.next_chunk().await {
            got.push(chunk);
        }

        assert_eq!(&got[2].data.as_ref().unwrap()[..], b"ef");
        let retried = format!("{}&range=4-5", BASE);
        assert_eq!(transport.gets().iter().filter(|u| **u == retried).count(), 2);
        assert_eq!(observer.count("ChunkRetry"), 1);
        assert_eq!(observer.count("Completed"), 1);
    }

    #[tokio::test]
    async fn test_failed_range_is_delivered_in_place() {
        let transport = Arc::new(
            MockTransport::new(PAYLOAD)
                .with_faults(4, &[Fault::Timeout, Fault::Timeout])
                .with_faults(10, &[Fault::Status(StatusCode::FORBIDDEN)]),
        );
        let observer = Arc::new(RecordingObserver::default());
        let d = downloader(transport.clone(), observer.clone(), 20);

        let chunks: Vec<Chunk> = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 9);
        assert!(matches!(
            chunks[2].data,
            Err(DownloadError::Transport(TransportError::Timeout { .. }))
        ));
        assert!(matches!(
            chunks[5].data,
            Err(DownloadError::Transport(TransportError::Status { .. }))
        ));
        assert!(chunks[6].data.is_ok());

        let forbidden = format!("{}&range=10-11", BASE);
        assert_eq!(transport.gets().iter().filter(|u| **u == forbidden).count(), 1);
        assert_eq!(observer.count("ChunkFailed"), 2);
        assert_eq!(observer.count("Completed"), 0);
    }

    #[tokio::test]
    async fn test_collect_bytes_stops_at_failure() {
        let transport = Arc::new(
            MockTransport::new(PAYLOAD).with_faults(2, &[Fault::Status(StatusCode::NOT_FOUND)]),
        );
        let d = downloader(transport, Arc::default(), 20);

        let err = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap()
            .collect_bytes()
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Transport(_)));
    }

    #[tokio::test]
    async fn test_drop_stops_dispatch() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_delay(30));
        let d = downloader(transport.clone(), Arc::default(), 1);

        let mut chunks = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 9);
        let first = chunks.next_chunk().await.unwrap();
        assert_eq!(first.index, 0);
        drop(chunks);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(transport.gets().len() < 9);
    }

    #[tokio::test]
    async fn test_cancel_delivers_requested_chunks() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_delay(30));
        let d = downloader(transport.clone(), Arc::default(), 1);

        let mut chunks = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap();
        let first = chunks.next_chunk().await.unwrap();
        assert_eq!(first.index, 0);
        chunks.cancel();

        let rest: Vec<Chunk> = chunks.collect().await;
        assert!(rest.len() < 8);
        for (i, chunk) in rest.iter().enumerate() {
            assert_eq!(chunk.index, i + 1);
            assert!(chunk.data.is_ok());
        }
        assert_eq!(transport.gets().len(), rest.len() + 1);
    }

    #[tokio::test]
    async fn test_huge_content_length_is_not_trusted() {
        let transport = Arc::new(
            MockTransport::new(PAYLOAD).with_content_length(Some("9000000000000000000")),
        );
        let d = downloader(transport, Arc::default(), 20);

        assert!(matches!(
            d.parallel_download(&stream("150")).await,
            Err(DownloadError::LengthMismatch { .. })
        ));
        let err = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap()
            .collect_bytes()
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::LengthMismatch { .. }));
    }

    #[tokio::test]
    async fn test_short_range_reply_is_an_error() {
        let transport = Arc::new(MockTransport::new(PAYLOAD).with_faults(4, &[Fault::Short]));
        let observer = Arc::new(RecordingObserver::default());
        let d = downloader(transport, observer.clone(), 20);

        assert!(matches!(
            d.parallel_download(&stream("150")).await,
            Err(DownloadError::LengthMismatch {
                index: 2,
                expected: 2,
                got: 1,
            })
        ));
        assert_eq!(observer.count("ChunkFailed"), 1);

        let short = Arc::new(MockTransport::new(PAYLOAD).with_faults(4, &[Fault::Short]));
        let d = downloader(short, Arc::default(), 20);
        let chunks: Vec<Chunk> = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(chunks.len(), 9);
        assert!(matches!(
            chunks[2].data,
            Err(DownloadError::LengthMismatch { index: 2, .. })
        ));
        assert_eq!(chunks.iter().filter(|c| c.data.is_ok()).count(), 8);
    }

    #[tokio::test]
    async fn test_empty_body_yields_no_chunks() {
        let transport = Arc::new(MockTransport::new(Bytes::new()));
        let d = downloader(transport.clone(), Arc::default(), 20);

        let chunks = d
            .sequential_chunks(&stream("150"), Duration::from_secs(20))
            .await
            .unwrap();
        assert!(chunks.is_empty());
        assert!(chunks.collect_bytes().await.unwrap().is_empty());
        assert!(d.parallel_download(&stream("150")).await.unwrap().is_empty());
        assert!(transport.gets().is_empty());
    }
}
