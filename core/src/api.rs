//! `submit` / `fetch_history` as single calls.
//!
//! `FormApi` pairs a `SubmissionClient` with a `Transport`. Every operation is
//! exactly one `build_*`, one `execute`, one `parse_*`: no retry, no timeout of
//! its own, no state carried between calls.

use crate::client::SubmissionClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{FormPayload, HistoryRecord, SubmitSuccess};

/// Executes an `HttpRequest` and hands back whatever the server answered.
///
/// Implementations must return non-2xx responses as `Ok`; status
/// interpretation belongs to `SubmissionClient`. Failures to obtain any
/// response at all map to `ApiError::Network`.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Client bound to a backend origin and a transport.
#[derive(Debug, Clone)]
pub struct FormApi<T> {
    client: SubmissionClient,
    transport: T,
}

impl<T: Transport> FormApi<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: SubmissionClient::new(base_url),
            transport,
        }
    }

    pub fn client(&self) -> &SubmissionClient {
        &self.client
    }

    pub fn submit(&self, payload: &FormPayload) -> Result<SubmitSuccess, ApiError> {
        let request = self.client.build_submit(payload)?;
        let response = self.transport.execute(request)?;
        self.client.parse_submit(response)
    }

    pub fn fetch_history(&self) -> Result<Vec<HistoryRecord>, ApiError> {
        let request = self.client.build_history();
        let response = self.transport.execute(request)?;
        self.client.parse_history(response)
    }
}
