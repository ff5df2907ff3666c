//! Domain DTOs for the submission API.
//!
//! # Design
//! These types mirror the backend's JSON but are defined independently of the
//! mock-server crate. Integration tests catch schema drift between the two.
//!
//! `SubmitFailure` keeps the backend's `error` key on the wire so a 400 body
//! deserializes into it directly; the 422 shape is only ever seen by the
//! normalizer in `client.rs` and never leaves this crate.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::query::{self, QueryParams};

/// Field name to ordered list of human-readable messages. Fields keep the
/// order in which the backend reported them.
pub type FieldErrors = IndexMap<String, Vec<String>>;

/// A record entered by the user and sent to `/submit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormPayload {
    pub date: String,
    pub first_name: String,
    pub last_name: String,
}

impl FormPayload {
    pub fn new(
        date: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Rebuild a payload from decoded query parameters. Returns `None` unless
    /// `date`, `first_name` and `last_name` are all present and non-empty.
    pub fn from_query(params: &QueryParams) -> Option<Self> {
        let field = |key: &str| params.get(key).filter(|v| !v.is_empty());
        Some(Self::new(
            field("date")?,
            field("first_name")?,
            field("last_name")?,
        ))
    }

    /// Query string that reloads this payload, in `date`, `first_name`,
    /// `last_name` order. Empty fields are omitted.
    pub fn to_query_string(&self) -> String {
        query::encode([
            ("date", Some(self.date.as_str())),
            ("first_name", Some(self.first_name.as_str())),
            ("last_name", Some(self.last_name.as_str())),
        ])
    }
}

/// One derived row returned by a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRow {
    pub date: String,
    pub name: String,
}

/// Body of a 2xx `/submit` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitSuccess {
    #[serde(default = "always_true")]
    pub success: bool,
    pub data: Vec<ResultRow>,
}

fn always_true() -> bool {
    true
}

/// The single normalized shape of a rejected submission. `success` is always
/// false, whatever the wire body claimed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitFailure {
    #[serde(skip_deserializing)]
    pub success: bool,
    #[serde(rename = "error")]
    pub errors: FieldErrors,
}

impl SubmitFailure {
    pub fn new(errors: FieldErrors) -> Self {
        Self {
            success: false,
            errors,
        }
    }

    /// Messages reported for `field`, empty when the field has none.
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

/// One row of `/history`. `count` is the number of earlier submissions of the
/// same person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryRecord {
    pub date: String,
    pub first_name: String,
    pub last_name: String,
    pub count: u64,
}

/// A single entry of a 422 `detail` list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub loc: Vec<LocSegment>,
    pub msg: String,
}

/// A `loc` element: field names are strings, list indices are integers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LocSegment {
    Name(String),
    Index(i64),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocSegment::Name(name) => f.write_str(name),
            LocSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Body of a 422 `/submit` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ValidationErrorBody {
    pub detail: Vec<ValidationIssue>,
}
