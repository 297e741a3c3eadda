use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tubegrab::{
    common::{
        http::{ReqwestTransport, Transport},
        logger,
        observer::{Observer, TracingObserver},
        types::AnyResult,
    },
    configs::Config,
    download::{ChunkedDownloader, DownloadOptions},
    log_println,
    sources::{Stream, VideoFetcher},
};

const USAGE: &str = "usage: tubegrab <watch-url> [save-path] [--stream]";

struct Args {
    url: String,
    save_path: Option<String>,
    stream: bool,
}

fn parse_args() -> Option<Args> {
    let mut url = None;
    let mut save_path = None;
    let mut stream = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--stream" => stream = true,
            "-h" | "--help" => return None,
            _ if url.is_none() => url = Some(arg),
            _ if save_path.is_none() => save_path = Some(arg),
            _ => return None,
        }
    }

    Some(Args {
        url: url?,
        save_path,
        stream,
    })
}

fn default_file_name(title: &str, video_id: &str, stream: &Stream) -> String {
    let base = if title.is_empty() { video_id } else { title };
    let stem: String = base
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if stream.format.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, stream.format)
    }
}

async fn prompt_index(count: usize) -> AnyResult<usize> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    loop {
        print!("stream id> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut line = String::new();
        if stdin.read_line(&mut line).await? == 0 {
            return Err("no stream selected".into());
        }
        match line.trim().parse::<usize>() {
            Ok(index) if index < count => return Ok(index),
            _ => log_println!("enter a number between 0 and {}", count.saturating_sub(1)),
        }
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let Some(args) = parse_args() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let config = Config::load_or_default()?;
    logger::init(&config);

    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::from_config(&config.http)?);
    let observer: Arc<dyn Observer> = Arc::new(TracingObserver);

    let fetcher = VideoFetcher::new(&args.url, transport.clone(), observer.clone())?;
    let video = fetcher.fetch_streams().await?;

    log_println!("{}", video.title);
    for (index, stream) in video.streams.iter().enumerate() {
        log_println!("{:>3}: {}", index, stream);
    }

    let stream = &video.streams[prompt_index(video.streams.len()).await?];
    let path = args
        .save_path
        .unwrap_or_else(|| default_file_name(&video.title, &video.id, stream));

    let downloader = ChunkedDownloader::new(
        transport,
        observer,
        DownloadOptions::from(&config.download),
    );

    if args.stream {
        let mut chunks = downloader
            .sequential_chunks(stream, config.download.streaming_slice())
            .await?;
        let mut file = tokio::fs::File::create(&path).await?;
        while let Some(chunk) = chunks.next_chunk().await {
            file.write_all(&chunk.data?).await?;
            info!("chunk {}/{} written ({})", chunk.index + 1, chunks.len(), chunk.range);
        }
        file.flush().await?;
    } else {
        let body = downloader.parallel_download(stream).await?;
        tokio::fs::write(&path, &body).await?;
    }

    info!("Saved {} to {}", stream, path);
    Ok(())
}
