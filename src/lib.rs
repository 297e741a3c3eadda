pub mod common;
pub mod configs;
pub mod download;
pub mod sources;
