//! Terminal front end for the form-submission backend.
//!
//! `pages` holds the home, submit and history controllers; `transport`
//! executes the core's requests over HTTP with ureq.

pub mod pages;
pub mod transport;

pub use pages::{HistoryPage, SubmitPage, SubmitStatus};
pub use transport::UreqTransport;

/// Backend origin used when neither `--base-url` nor
/// `SUBMISSIONS_BASE_URL` is given.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
