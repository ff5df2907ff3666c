//! C-ABI wrapper around `submissions-core`.
//!
//! # Overview
//! Exposes request building, response parsing and the query-string codec
//! through `extern "C"` functions so a host UI written in any language with a
//! C FFI can drive the submission API while doing its own HTTP.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `subm_build_*` / `subm_parse_*` mirror the core client 1:1.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads, field errors and other failures uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `subm_free_*` function to release them.
//! - `build.rs` writes the C header to `$OUT_DIR/submissions.h`; hosts copy
//!   it from there as part of their own build.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use submissions_core::http::HttpResponse;
use submissions_core::query;
use submissions_core::types::FormPayload;

use types::*;

/// Copy a caller-owned C string. Null gives `None`; invalid UTF-8 is replaced.
fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `SubmissionClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `subm_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn subm_client_new(base_url: *const c_char) -> *mut FfiClient {
    catch_unwind(|| match read_str(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiClient {
            inner: submissions_core::SubmissionClient::new(&url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `subm_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn subm_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the `POST /submit` request for a payload.
///
/// Null field pointers are sent as empty strings; the backend reports them.
/// Returns null if `client` is null or if serialization fails.
/// The caller must free the returned pointer with `subm_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn subm_build_submit(
    client: *const FfiClient,
    date: *const c_char,
    first_name: *const c_char,
    last_name: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let payload = FormPayload::new(
            read_str(date).unwrap_or_default(),
            read_str(first_name).unwrap_or_default(),
            read_str(last_name).unwrap_or_default(),
        );
        match client.inner.build_submit(&payload) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the `GET /history` request.
///
/// Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn subm_build_history(client: *const FfiClient) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_history())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, read_str(resp.body).unwrap_or_default())
}

/// Parse the response to a submit request.
///
/// Returns `data_tag = ResultRows` on success, or `error_code = Validation`
/// with `data_tag = FieldErrors` when the backend rejected the payload.
#[unsafe(no_mangle)]
pub extern "C" fn subm_parse_submit(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_submit(ffi_response_to_core(resp)) {
            Ok(success) => FfiResult::ok_rows(success.data),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in subm_parse_submit"))
}

/// Parse the response to a history request.
///
/// Returns `data_tag = HistoryList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn subm_parse_history(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_history(ffi_response_to_core(resp)) {
            Ok(records) => FfiResult::ok_history(records),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in subm_parse_history"))
}

// ---------------------------------------------------------------------------
// Query string
// ---------------------------------------------------------------------------

/// Encode a payload as a query string (no leading `?`). Null or empty fields
/// are omitted. Free the result with `subm_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn subm_query_encode(
    date: *const c_char,
    first_name: *const c_char,
    last_name: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        let date = read_str(date);
        let first_name = read_str(first_name);
        let last_name = read_str(last_name);
        c_string(query::encode([
            ("date", date.as_deref()),
            ("first_name", first_name.as_deref()),
            ("last_name", last_name.as_deref()),
        ]))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Decode a query string into a payload.
///
/// Returns null unless `date`, `first_name` and `last_name` are all present
/// and non-empty. Free the result with `subm_free_payload`.
#[unsafe(no_mangle)]
pub extern "C" fn subm_payload_from_query(raw: *const c_char) -> *mut FfiFormPayload {
    catch_unwind(|| {
        let Some(raw) = read_str(raw) else {
            return std::ptr::null_mut();
        };
        match FormPayload::from_query(&query::decode(&raw)) {
            Some(payload) => FfiFormPayload::from_core(payload),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `subm_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn subm_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.path);
            free_c_string(req.body);
            for h in from_raw_parts(req.headers, req.headers_len) {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiResult` returned by any `subm_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn subm_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        unsafe { free_c_string(result.error_message) };
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::ResultRows => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiResultRowList) };
                for row in unsafe { from_raw_parts(list.items, list.len) } {
                    unsafe {
                        free_c_string(row.date);
                        free_c_string(row.name);
                    }
                }
            }
            FfiDataTag::HistoryList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiHistoryList) };
                for record in unsafe { from_raw_parts(list.items, list.len) } {
                    unsafe {
                        free_c_string(record.date);
                        free_c_string(record.first_name);
                        free_c_string(record.last_name);
                    }
                }
            }
            FfiDataTag::FieldErrors => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiFieldErrorList) };
                for item in unsafe { from_raw_parts(list.items, list.len) } {
                    unsafe {
                        free_c_string(item.field);
                        for message in from_raw_parts(item.messages, item.messages_len) {
                            free_c_string(message);
                        }
                    }
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a payload returned by `subm_payload_from_query`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn subm_free_payload(payload: *mut FfiFormPayload) {
    if payload.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let payload = unsafe { Box::from_raw(payload) };
        unsafe {
            free_c_string(payload.date);
            free_c_string(payload.first_name);
            free_c_string(payload.last_name);
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn subm_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn new_client() -> *mut FfiClient {
        let url = CString::new("http://localhost:8000").unwrap();
        subm_client_new(url.as_ptr())
    }

    fn read(ptr: *const c_char) -> &'static str {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    fn parse_submit(status: u16, body: &str) -> *mut FfiResult {
        let client = new_client();
        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        let result = subm_parse_submit(client, &resp);
        subm_client_free(client);
        result
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client();
        assert!(!client.is_null());
        subm_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        assert!(subm_client_new(std::ptr::null()).is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        subm_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_submit_produces_post_with_json_body() {
        let client = new_client();
        let date = CString::new("2024-01-01").unwrap();
        let first = CString::new("Ann").unwrap();
        let last = CString::new("Lee").unwrap();
        let req = subm_build_submit(client, date.as_ptr(), first.as_ptr(), last.as_ptr());
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Post));
        assert_eq!(read(req_ref.path), "http://localhost:8000/submit");
        assert_eq!(req_ref.headers_len, 1);
        let header = unsafe { &*req_ref.headers };
        assert_eq!(read(header.key), "content-type");
        assert_eq!(read(header.value), "application/json");

        let body: serde_json::Value = serde_json::from_str(read(req_ref.body)).unwrap();
        assert_eq!(body["date"], "2024-01-01");
        assert_eq!(body["first_name"], "Ann");
        assert_eq!(body["last_name"], "Lee");

        subm_free_request(req);
        subm_client_free(client);
    }

    #[test]
    fn build_submit_null_fields_are_empty() {
        let client = new_client();
        let req = subm_build_submit(client, std::ptr::null(), std::ptr::null(), std::ptr::null());
        let req_ref = unsafe { &*req };
        let body: serde_json::Value = serde_json::from_str(read(req_ref.body)).unwrap();
        assert_eq!(body["date"], "");

        subm_free_request(req);
        subm_client_free(client);
    }

    #[test]
    fn build_history_returns_get() {
        let client = new_client();
        let req = subm_build_history(client);
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Get));
        assert_eq!(read(req_ref.path), "http://localhost:8000/history");
        assert!(req_ref.body.is_null());

        subm_free_request(req);
        subm_client_free(client);
    }

    #[test]
    fn build_with_null_client_returns_null() {
        assert!(subm_build_history(std::ptr::null()).is_null());
        assert!(subm_build_submit(
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null()
        )
        .is_null());
    }

    #[test]
    fn parse_submit_success() {
        let result = parse_submit(
            200,
            r#"{"success":true,"data":[{"date":"2024-01-01","name":"Ann Lee"}]}"#,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.data_tag, FfiDataTag::ResultRows);

        let list = unsafe { &*(r.data as *const FfiResultRowList) };
        assert_eq!(list.len, 1);
        let rows = unsafe { std::slice::from_raw_parts(list.items, list.len) };
        assert_eq!(read(rows[0].date), "2024-01-01");
        assert_eq!(read(rows[0].name), "Ann Lee");

        subm_free_result(result);
    }

    #[test]
    fn parse_submit_empty_rows() {
        let result = parse_submit(200, r#"{"success":true,"data":[]}"#);
        let r = unsafe { &*result };
        let list = unsafe { &*(r.data as *const FfiResultRowList) };
        assert_eq!(list.len, 0);
        assert!(list.items.is_null());

        subm_free_result(result);
    }

    #[test]
    fn parse_submit_unprocessable_gives_field_errors() {
        let result = parse_submit(
            422,
            r#"{"detail":[
                {"loc":["body","first_name"],"msg":"too short"},
                {"loc":["body","first_name"],"msg":"must be alpha"}
            ]}"#,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Validation);
        assert_eq!(r.data_tag, FfiDataTag::FieldErrors);
        assert!(!r.error_message.is_null());

        let list = unsafe { &*(r.data as *const FfiFieldErrorList) };
        assert_eq!(list.len, 1);
        let item = unsafe { &*list.items };
        assert_eq!(read(item.field), "first_name");
        let messages =
            unsafe { std::slice::from_raw_parts(item.messages, item.messages_len) };
        let messages: Vec<&str> = messages.iter().map(|m| read(*m)).collect();
        assert_eq!(messages, ["too short", "must be alpha"]);

        subm_free_result(result);
    }

    #[test]
    fn parse_submit_field_errors_keep_backend_order() {
        let result = parse_submit(
            422,
            r#"{"detail":[
                {"loc":["body","last_name"],"msg":"bad last"},
                {"loc":["body","date"],"msg":"bad date"}
            ]}"#,
        );
        let r = unsafe { &*result };
        let list = unsafe { &*(r.data as *const FfiFieldErrorList) };
        let items = unsafe { std::slice::from_raw_parts(list.items, list.len) };
        let fields: Vec<&str> = items.iter().map(|item| read(item.field)).collect();
        assert_eq!(fields, ["last_name", "date"]);

        subm_free_result(result);
    }

    #[test]
    fn parse_submit_bad_request_gives_field_errors() {
        let result = parse_submit(400, r#"{"success":false,"error":{"date":["required"]}}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Validation);
        let list = unsafe { &*(r.data as *const FfiFieldErrorList) };
        assert_eq!(list.len, 1);

        subm_free_result(result);
    }

    #[test]
    fn parse_submit_server_error() {
        let result = parse_submit(500, "oops");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Http);
        assert_eq!(r.http_status, 500);
        assert_eq!(r.data_tag, FfiDataTag::None);
        assert!(r.data.is_null());

        subm_free_result(result);
    }

    #[test]
    fn parse_history_two_records() {
        let client = new_client();
        let body = CString::new(
            r#"[
                {"date":"2024-03-01","first_name":"Zed","last_name":"Ng","count":2},
                {"date":"2024-01-01","first_name":"Ann","last_name":"Lee","count":0}
            ]"#,
        )
        .unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = subm_parse_history(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::HistoryList);

        let list = unsafe { &*(r.data as *const FfiHistoryList) };
        let items = unsafe { std::slice::from_raw_parts(list.items, list.len) };
        assert_eq!(items.len(), 2);
        assert_eq!(read(items[0].first_name), "Zed");
        assert_eq!(items[0].count, 2);
        assert_eq!(read(items[1].last_name), "Lee");

        subm_free_result(result);
        subm_client_free(client);
    }

    #[test]
    fn parse_history_malformed_body() {
        let client = new_client();
        let body = CString::new("not json").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = subm_parse_history(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Deserialization);

        subm_free_result(result);
        subm_client_free(client);
    }

    #[test]
    fn parse_null_arguments() {
        let body = CString::new("[]").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = subm_parse_history(std::ptr::null(), &resp);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        subm_free_result(result);

        let client = new_client();
        let result = subm_parse_submit(client, std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        subm_free_result(result);
        subm_client_free(client);
    }

    #[test]
    fn query_encode_skips_missing_fields() {
        let date = CString::new("2024-01-01").unwrap();
        let last = CString::new("").unwrap();
        let s = subm_query_encode(date.as_ptr(), std::ptr::null(), last.as_ptr());
        assert_eq!(read(s), "date=2024-01-01");
        subm_free_string(s);
    }

    #[test]
    fn payload_from_query_round_trip() {
        let date = CString::new("2024-01-01").unwrap();
        let first = CString::new("Ann Marie").unwrap();
        let last = CString::new("Lee").unwrap();
        let encoded = subm_query_encode(date.as_ptr(), first.as_ptr(), last.as_ptr());

        let payload = subm_payload_from_query(encoded);
        assert!(!payload.is_null());
        let p = unsafe { &*payload };
        assert_eq!(read(p.date), "2024-01-01");
        assert_eq!(read(p.first_name), "Ann Marie");
        assert_eq!(read(p.last_name), "Lee");

        subm_free_payload(payload);
        subm_free_string(encoded);
    }

    #[test]
    fn payload_from_incomplete_query_is_null() {
        let raw = CString::new("?date=2024-01-01&first_name=Ann").unwrap();
        assert!(subm_payload_from_query(raw.as_ptr()).is_null());
        assert!(subm_payload_from_query(std::ptr::null()).is_null());
    }

    #[test]
    fn generated_header_lives_in_out_dir() {
        let header =
            std::fs::read_to_string(concat!(env!("OUT_DIR"), "/submissions.h")).unwrap();
        assert!(header.contains("SUBMISSIONS_FFI_H"));
        assert!(header.contains("subm_parse_submit"));
        assert!(header.contains("FfiFieldErrorList"));
    }

    #[test]
    fn free_null_is_safe() {
        subm_free_request(std::ptr::null_mut());
        subm_free_result(std::ptr::null_mut());
        subm_free_payload(std::ptr::null_mut());
        subm_free_string(std::ptr::null_mut());
    }
}
