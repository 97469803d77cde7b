//! Source resolution: remote URLs, upstream renders and inline payloads.

mod fetcher;
mod resolver;

pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use resolver::{SourceDescriptor, SourceResolver};
