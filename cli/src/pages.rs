//! Page controllers: home, submit and history.
//!
//! Each page owns its view state and renders itself as plain text. Pages take
//! `&mut self` for anything that talks to the backend, so a page can never
//! have two requests in flight.

use std::io::{self, Write};

use submissions_core::{
    query, ApiError, FieldErrors, FormApi, FormPayload, HistoryRecord, ResultRow, Transport,
};

pub const NO_DATA: &str = "No data to display.";
pub const HISTORY_UNAVAILABLE: &str = "Could not fetch history. Try again later.";
pub const SUBMIT_UNAVAILABLE: &str = "Could not submit the form. Try again later.";

pub fn render_home(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Welcome")?;
    writeln!(out)?;
    writeln!(out, "  submissions submit    go to the form submission page")?;
    writeln!(out, "  submissions history   go to the history page")
}

/// Result of a single `SubmitPage::submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Accepted,
    Rejected,
    Failed,
}

#[derive(Debug, Default)]
pub struct SubmitPage {
    pub date: String,
    pub first_name: String,
    pub last_name: String,
    errors: FieldErrors,
    rows: Vec<ResultRow>,
    failure: Option<&'static str>,
    query: Option<String>,
}

impl SubmitPage {
    pub fn new(
        date: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    /// Prefill the form from a query string such as `?date=...&first_name=...`.
    /// Missing keys leave their field empty.
    pub fn from_query(raw: &str) -> Self {
        let params = query::decode(raw);
        let field = |key: &str| params.get(key).unwrap_or_default().to_string();
        Self::new(field("date"), field("first_name"), field("last_name"))
    }

    /// Payload for the current field values.
    pub fn payload(&self) -> FormPayload {
        FormPayload::new(&self.date, &self.first_name, &self.last_name)
    }

    /// True when every field is filled, which is what a reloaded query needs
    /// before it is submitted again automatically.
    pub fn is_complete(&self) -> bool {
        [&self.date, &self.first_name, &self.last_name]
            .iter()
            .all(|v| !v.is_empty())
    }

    pub fn submit<T: Transport>(&mut self, api: &FormApi<T>) -> SubmitStatus {
        let payload = self.payload();
        self.errors.clear();
        self.rows.clear();
        self.failure = None;
        self.query = None;

        match api.submit(&payload) {
            Ok(success) => {
                tracing::info!(rows = success.data.len(), "submission accepted");
                self.rows = success.data;
                self.query = Some(payload.to_query_string());
                SubmitStatus::Accepted
            }
            Err(ApiError::Validation(failure)) => {
                tracing::info!(fields = failure.errors.len(), "submission rejected");
                self.errors = failure.errors;
                SubmitStatus::Rejected
            }
            Err(e) => {
                tracing::error!(error = %e, "unexpected error submitting form");
                self.failure = Some(SUBMIT_UNAVAILABLE);
                SubmitStatus::Failed
            }
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Query string that reloads the last accepted submission.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Submit form")?;
        writeln!(out)?;
        for (label, key, value) in [
            ("Date", "date", &self.date),
            ("First name", "first_name", &self.first_name),
            ("Last name", "last_name", &self.last_name),
        ] {
            writeln!(out, "  {label}: {value}")?;
            for message in self.errors.get(key).into_iter().flatten() {
                writeln!(out, "    ! {message}")?;
            }
        }
        // Errors for fields the form does not show.
        for (field, messages) in &self.errors {
            if !matches!(field.as_str(), "date" | "first_name" | "last_name") {
                for message in messages {
                    writeln!(out, "  ! {field}: {message}")?;
                }
            }
        }

        if let Some(failure) = self.failure {
            writeln!(out)?;
            writeln!(out, "{failure}")?;
        }

        if !self.rows.is_empty() {
            writeln!(out)?;
            writeln!(out, "Results:")?;
            let rows: Vec<Vec<String>> = self
                .rows
                .iter()
                .map(|r| vec![r.date.clone(), r.name.clone()])
                .collect();
            write_table(out, &["Date", "Name"], &rows)?;
        }

        if let Some(query) = &self.query {
            writeln!(out)?;
            writeln!(out, "Reload with: --query '?{query}'")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
enum HistoryState {
    #[default]
    NotLoaded,
    Loaded(Vec<HistoryRecord>),
    Failed,
}

#[derive(Debug, Default)]
pub struct HistoryPage {
    state: HistoryState,
}

impl HistoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch history once. Returns false when the fetch failed.
    pub fn load<T: Transport>(&mut self, api: &FormApi<T>) -> bool {
        self.state = match api.fetch_history() {
            Ok(records) => {
                tracing::debug!(rows = records.len(), "history loaded");
                HistoryState::Loaded(records)
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching history");
                HistoryState::Failed
            }
        };
        !matches!(self.state, HistoryState::Failed)
    }

    pub fn records(&self) -> Option<&[HistoryRecord]> {
        match &self.state {
            HistoryState::Loaded(records) => Some(records.as_slice()),
            _ => None,
        }
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Submission history")?;
        writeln!(out)?;
        match &self.state {
            HistoryState::NotLoaded => Ok(()),
            HistoryState::Failed => writeln!(out, "{HISTORY_UNAVAILABLE}"),
            HistoryState::Loaded(records) if records.is_empty() => writeln!(out, "{NO_DATA}"),
            HistoryState::Loaded(records) => {
                let rows: Vec<Vec<String>> = records
                    .iter()
                    .map(|r| {
                        vec![
                            r.date.clone(),
                            r.first_name.clone(),
                            r.last_name.clone(),
                            r.count.to_string(),
                        ]
                    })
                    .collect();
                write_table(out, &["Date", "First name", "Last name", "Count"], &rows)
            }
        }
    }
}

/// Left-aligned columns separated by two spaces.
fn write_table(out: &mut impl Write, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "  {}", format_row(headers.iter().copied(), &widths))?;
    for row in rows {
        writeln!(out, "  {}", format_row(row.iter().map(String::as_str), &widths))?;
    }
    Ok(())
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use submissions_core::{HttpRequest, HttpResponse};

    use super::*;

    /// Answers every request with the same canned response and counts calls.
    struct Canned {
        status: u16,
        body: &'static str,
        calls: Cell<usize>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: Cell::new(0),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.calls.set(self.calls.get() + 1);
            Ok(HttpResponse::new(self.status, self.body))
        }
    }

    fn rendered(render: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        render(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn home_links_both_pages() {
        let text = rendered(|out| render_home(out));
        assert!(text.contains("submissions submit"));
        assert!(text.contains("submissions history"));
    }

    #[test]
    fn from_query_prefills_fields() {
        let page = SubmitPage::from_query("?date=2024-01-01&first_name=Ann&last_name=Lee");
        assert_eq!(page.payload(), FormPayload::new("2024-01-01", "Ann", "Lee"));
        assert!(page.is_complete());

        let partial = SubmitPage::from_query("first_name=Ann");
        assert_eq!(partial.first_name, "Ann");
        assert!(partial.date.is_empty());
        assert!(!partial.is_complete());
    }

    #[test]
    fn accepted_submission_stores_rows_and_query() {
        let transport = Canned::new(
            200,
            r#"{"success":true,"data":[{"date":"2024-01-01","name":"Ann Lee"}]}"#,
        );
        let api = FormApi::new("http://backend", &transport);
        let mut page = SubmitPage::new("2024-01-01", "Ann", "Lee");

        assert_eq!(page.submit(&api), SubmitStatus::Accepted);
        assert_eq!(transport.calls.get(), 1);
        assert_eq!(page.rows().len(), 1);
        assert_eq!(
            page.query(),
            Some("date=2024-01-01&first_name=Ann&last_name=Lee")
        );

        let text = rendered(|out| page.render(out));
        assert!(text.contains("Results:"));
        assert!(text.contains("Ann Lee"));
        assert!(text.contains("--query '?date=2024-01-01&first_name=Ann&last_name=Lee'"));
    }

    #[test]
    fn rejected_submission_shows_messages_under_fields() {
        let transport = Canned::new(
            422,
            r#"{"detail":[{"loc":["body","last_name"],"msg":"Value error, No whitespace in last name is allowed"}]}"#,
        );
        let api = FormApi::new("http://backend", &transport);
        let mut page = SubmitPage::new("2024-01-01", "Ann", "Le e");

        assert_eq!(page.submit(&api), SubmitStatus::Rejected);
        assert!(page.rows().is_empty());
        assert!(page.query().is_none());
        assert_eq!(
            page.errors()["last_name"],
            ["Value error, No whitespace in last name is allowed"]
        );

        let text = rendered(|out| page.render(out));
        let lines: Vec<&str> = text.lines().collect();
        let field = lines
            .iter()
            .position(|l| l.trim() == "Last name: Le e")
            .unwrap();
        assert_eq!(
            lines[field + 1].trim(),
            "! Value error, No whitespace in last name is allowed"
        );
    }

    #[test]
    fn unknown_field_errors_render_in_backend_order() {
        let transport = Canned::new(
            422,
            r#"{"detail":[
                {"loc":["body","zip"],"msg":"bad zip"},
                {"loc":[],"msg":"bad body"}
            ]}"#,
        );
        let api = FormApi::new("http://backend", &transport);
        let mut page = SubmitPage::new("2024-01-01", "Ann", "Lee");
        assert_eq!(page.submit(&api), SubmitStatus::Rejected);

        let text = rendered(|out| page.render(out));
        let zip = text.find("! zip: bad zip").unwrap();
        let root = text.find("! __root__: bad body").unwrap();
        assert!(zip < root);
    }

    #[test]
    fn resubmitting_clears_previous_outcome() {
        let accepted = Canned::new(200, r#"{"success":true,"data":[{"date":"2024-01-01","name":"Ann Lee"}]}"#);
        let rejected = Canned::new(400, r#"{"success":false,"error":{"date":["required"]}}"#);
        let mut page = SubmitPage::new("2024-01-01", "Ann", "Lee");

        page.submit(&FormApi::new("http://backend", &accepted));
        assert_eq!(page.rows().len(), 1);

        page.submit(&FormApi::new("http://backend", &rejected));
        assert!(page.rows().is_empty());
        assert!(page.query().is_none());
        assert_eq!(page.errors().len(), 1);
    }

    #[test]
    fn unexpected_failure_shows_generic_message() {
        let transport = Canned::new(503, "");
        let api = FormApi::new("http://backend", &transport);
        let mut page = SubmitPage::new("2024-01-01", "Ann", "Lee");

        assert_eq!(page.submit(&api), SubmitStatus::Failed);
        assert!(page.errors().is_empty());
        let text = rendered(|out| page.render(out));
        assert!(text.contains(SUBMIT_UNAVAILABLE));
    }

    #[test]
    fn history_renders_table_in_order() {
        let transport = Canned::new(
            200,
            r#"[
                {"date":"2024-03-01","first_name":"Zed","last_name":"Ng","count":2},
                {"date":"2024-01-01","first_name":"Ann","last_name":"Lee","count":0}
            ]"#,
        );
        let api = FormApi::new("http://backend", &transport);
        let mut page = HistoryPage::new();

        assert!(page.load(&api));
        let text = rendered(|out| page.render(out));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "  Date        First name  Last name  Count");
        assert_eq!(lines[3], "  2024-03-01  Zed         Ng         2");
        assert_eq!(lines[4], "  2024-01-01  Ann         Lee        0");
    }

    #[test]
    fn empty_history_says_so() {
        let transport = Canned::new(200, "[]");
        let mut page = HistoryPage::new();
        assert!(page.load(&FormApi::new("http://backend", &transport)));
        assert_eq!(page.records(), Some(&[][..]));
        assert!(rendered(|out| page.render(out)).contains(NO_DATA));
    }

    #[test]
    fn failed_history_shows_no_partial_data() {
        let transport = Canned::new(500, r#"[{"date":"2024-01-01"}]"#);
        let mut page = HistoryPage::new();
        assert!(!page.load(&FormApi::new("http://backend", &transport)));
        assert!(page.records().is_none());

        let text = rendered(|out| page.render(out));
        assert!(text.contains(HISTORY_UNAVAILABLE));
        assert!(!text.contains("2024-01-01"));
    }
}
