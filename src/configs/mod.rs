pub mod base;
pub mod download;
pub mod http;
pub mod logging;

pub use base::*;
pub use download::*;
pub use http::*;
pub use logging::*;
