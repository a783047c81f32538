//! 🌐 The HTTP backend: one GET per ID, and a lot of opinions about status codes.
//!
//! 🎬 A worker holds out an integer. The fetcher turns it into a URL, knocks on the
//! API's door, and comes back with one of three answers: here's your record, nobody
//! lives here (404), or something went sideways and we're not trying again.
//!
//! 🦆 (the duck does not make HTTP requests. the duck has people for that.)

mod http_fetcher;

pub use http_fetcher::{HttpFetcher, HttpFetcherConfig};
