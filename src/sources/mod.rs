pub mod youtube;

pub use youtube::{Stream, Video, VideoFetcher};
