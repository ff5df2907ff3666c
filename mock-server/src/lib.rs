use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

/// Maximum number of rows returned by `/history`.
pub const HISTORY_LIMIT: usize = 10;

const NAME_FIELDS: [(&str, &str); 2] = [("first_name", "first"), ("last_name", "last")];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub date: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRow {
    pub date: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub data: Vec<ResultRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: BTreeMap<String, Vec<String>>,
}

/// One entry of a 422 body, shaped like FastAPI's request validation errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationDetail {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationBody {
    pub detail: Vec<ValidationDetail>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryItem {
    pub date: String,
    pub first_name: String,
    pub last_name: String,
    pub count: u64,
}

#[derive(Clone, Debug)]
struct Submission {
    date: NaiveDate,
    first_name: String,
    last_name: String,
}

impl Submission {
    fn same_person(&self, other: &Submission) -> bool {
        self.first_name == other.first_name && self.last_name == other.last_name
    }
}

type Db = Arc<RwLock<Vec<Submission>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/submit", post(submit))
        .route("/history", get(history))
        .route("/health", get(health))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn submit(State(db): State<Db>, headers: HeaderMap, body: Bytes) -> Response {
    let submission = match check_content_type(&headers).and_then(|()| validate(&body)) {
        Ok(submission) => submission,
        Err(detail) => {
            tracing::info!(errors = detail.len(), "rejecting malformed submission");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationBody { detail }),
            )
                .into_response();
        }
    };

    if submission.date > chrono::Local::now().date_naive() {
        tracing::info!(date = %submission.date, "rejecting future-dated submission");
        let mut error = BTreeMap::new();
        error.insert(
            "date".to_string(),
            vec!["Date cannot be in the future".to_string()],
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        )
            .into_response();
    }

    let mut submissions = db.write().await;
    submissions.push(submission.clone());

    let mut mine: Vec<&Submission> = submissions
        .iter()
        .filter(|s| s.same_person(&submission))
        .collect();
    mine.sort_by(|a, b| b.date.cmp(&a.date));

    let name = format!("{} {}", submission.first_name, submission.last_name);
    let data = mine
        .into_iter()
        .map(|s| ResultRow {
            date: s.date.to_string(),
            name: name.clone(),
        })
        .collect::<Vec<_>>();
    tracing::info!(%name, rows = data.len(), "accepted submission");

    Json(SubmitResponse {
        success: true,
        data,
    })
    .into_response()
}

async fn history(State(db): State<Db>) -> Json<Vec<HistoryItem>> {
    let submissions = db.read().await;

    let mut ordered: Vec<&Submission> = submissions.iter().collect();
    ordered.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.first_name.cmp(&b.first_name))
            .then_with(|| a.last_name.cmp(&b.last_name))
    });

    let items = ordered
        .into_iter()
        .take(HISTORY_LIMIT)
        .map(|s| HistoryItem {
            date: s.date.to_string(),
            first_name: s.first_name.clone(),
            last_name: s.last_name.clone(),
            count: submissions
                .iter()
                .filter(|other| other.same_person(s) && other.date < s.date)
                .count() as u64,
        })
        .collect::<Vec<_>>();
    tracing::debug!(rows = items.len(), "serving history");
    Json(items)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Only JSON bodies are read; anything else fails like a non-object body.
fn check_content_type(headers: &HeaderMap) -> Result<(), Vec<ValidationDetail>> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        Ok(())
    } else {
        Err(vec![detail(
            &["body"],
            "Input should be a valid dictionary",
            "model_attributes_type",
        )])
    }
}

/// Check a raw `/submit` body, collecting every problem before giving up.
fn validate(body: &[u8]) -> Result<Submission, Vec<ValidationDetail>> {
    let value: Value = serde_json::from_slice(body).map_err(|_| {
        vec![detail(&["body"], "JSON decode error", "json_invalid")]
    })?;
    let Value::Object(fields) = value else {
        return Err(vec![detail(
            &["body"],
            "Input should be a valid dictionary",
            "model_attributes_type",
        )]);
    };

    let mut issues = Vec::new();
    let mut text = |name: &str| match fields.get(name) {
        None => {
            issues.push(detail(&["body", name], "Field required", "missing"));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(detail(
                &["body", name],
                "Input should be a valid string",
                "string_type",
            ));
            None
        }
    };
    let date = text("date");
    let first_name = text("first_name");
    let last_name = text("last_name");

    let date = date.and_then(|raw| match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            issues.push(detail(
                &["body", "date"],
                "Input should be a valid date",
                "date_parsing",
            ));
            None
        }
    });
    for (&(field, label), value) in NAME_FIELDS.iter().zip([&first_name, &last_name]) {
        if value.as_deref().is_some_and(|v| v.contains(' ')) {
            issues.push(detail(
                &["body", field],
                &format!("Value error, No whitespace in {label} name is allowed"),
                "value_error",
            ));
        }
    }

    match (date, first_name, last_name) {
        (Some(date), Some(first_name), Some(last_name)) if issues.is_empty() => Ok(Submission {
            date,
            first_name,
            last_name,
        }),
        _ => Err(issues),
    }
}

fn detail(loc: &[&str], msg: &str, kind: &str) -> ValidationDetail {
    ValidationDetail {
        loc: loc.iter().map(|s| s.to_string()).collect(),
        msg: msg.to_string(),
        kind: kind.to_string(),
    }
}
