//! Stateless HTTP request builder and response parser for the submission API.
//!
//! # Design
//! `SubmissionClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. Status interpretation and error normalization
//! happen in `parse_*` and nowhere else.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    FieldErrors, FormPayload, HistoryRecord, SubmitFailure, SubmitSuccess, ValidationErrorBody,
    ValidationIssue,
};

const BAD_REQUEST: u16 = 400;
const UNPROCESSABLE_ENTITY: u16 = 422;

/// Field name used for a 422 issue whose `loc` is empty.
pub const ROOT_FIELD: &str = "__root__";

/// Synchronous, stateless client for the submission API.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    base_url: String,
}

impl SubmissionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_submit(&self, payload: &FormPayload) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/submit", self.base_url),
            headers: json_content_type(),
            body: Some(body),
        })
    }

    pub fn build_history(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/history", self.base_url),
            headers: json_content_type(),
            body: None,
        }
    }

    pub fn parse_submit(&self, response: HttpResponse) -> Result<SubmitSuccess, ApiError> {
        if response.is_success() {
            return parse_body(&response);
        }
        match response.status {
            BAD_REQUEST => Err(ApiError::Validation(parse_body(&response)?)),
            UNPROCESSABLE_ENTITY => {
                let body: ValidationErrorBody = parse_body(&response)?;
                Err(ApiError::Validation(normalize_validation_issues(
                    body.detail,
                )))
            }
            status => Err(ApiError::Transport { status }),
        }
    }

    pub fn parse_history(&self, response: HttpResponse) -> Result<Vec<HistoryRecord>, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Transport {
                status: response.status,
            });
        }
        parse_body(&response)
    }
}

/// Fold a 422 `detail` list into the field-error mapping.
///
/// The last `loc` segment names the field. Messages accumulate per field in
/// the order they were received. Nested locations that share a final segment
/// end up under the same key.
pub fn normalize_validation_issues(issues: Vec<ValidationIssue>) -> SubmitFailure {
    let mut errors = FieldErrors::new();
    for issue in issues {
        let field = issue
            .loc
            .last()
            .map(|segment| segment.to_string())
            .unwrap_or_else(|| ROOT_FIELD.to_string());
        errors.entry(field).or_default().push(issue.msg);
    }
    SubmitFailure::new(errors)
}

fn json_content_type() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
