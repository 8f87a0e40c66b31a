pub mod crawler;
pub mod http;
pub mod links;
pub mod scroll;
pub mod web;

pub use crawler::{PageFetcher, RecordTx, ScrollPage};
