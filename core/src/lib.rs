//! API client core for the form-submission backend.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). `FormApi` composes the two
//! halves around an injected `Transport` for callers that just want
//! `submit` / `fetch_history`.
//!
//! # Design
//! - `SubmissionClient` is stateless; it holds only `base_url`.
//! - Backend rejections arrive in two shapes (a 400 error map and a 422
//!   detail list). Both are normalized into `ApiError::Validation` at the
//!   parse boundary; everything else is a transport failure.
//! - `query` round-trips a payload through a URL query string.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod query;
pub mod types;

pub use api::{FormApi, Transport};
pub use client::SubmissionClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::QueryParams;
pub use types::{
    FieldErrors, FormPayload, HistoryRecord, ResultRow, SubmitFailure, SubmitSuccess,
};
