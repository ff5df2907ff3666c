//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + `usize` length instead of
//! `Vec`, and tagged enums with explicit discriminants. Arrays are handed out as boxed
//! slices so `len` is also the allocation size when they come back to be
//! freed.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use submissions_core::error::ApiError;
use submissions_core::http::HttpMethod;
use submissions_core::types::{FieldErrors, FormPayload, HistoryRecord, ResultRow};

/// Opaque handle to a `SubmissionClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiClient {
    pub(crate) inner: submissions_core::SubmissionClient,
}

/// Convert a Rust string into an owned C string. Interior NULs are dropped.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Free a C string produced by `c_string`. Null is ignored.
///
/// # Safety
/// `s` must be null or come from `c_string` and not have been freed yet.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak a `Vec` as pointer + length. Empty vectors become null.
pub(crate) fn into_raw_parts<T>(items: Vec<T>) -> (*mut T, usize) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len();
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim an array produced by `into_raw_parts`.
///
/// # Safety
/// `ptr` and `len` must come from one `into_raw_parts` call.
pub(crate) unsafe fn from_raw_parts<T>(ptr: *mut T, len: usize) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `subm_build_*` functions. The C caller executes the request
/// and passes the response back through `subm_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: usize,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: submissions_core::HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_parts(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), c_string),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `subm_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// A form payload decoded from a query string.
#[repr(C)]
pub struct FfiFormPayload {
    pub date: *mut c_char,
    pub first_name: *mut c_char,
    pub last_name: *mut c_char,
}

impl FfiFormPayload {
    pub(crate) fn from_core(payload: FormPayload) -> *mut Self {
        Box::into_raw(Box::new(FfiFormPayload {
            date: c_string(payload.date),
            first_name: c_string(payload.first_name),
            last_name: c_string(payload.last_name),
        }))
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Validation = 1,
    Http = 2,
    Network = 3,
    Deserialization = 4,
    Serialization = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tag that tells `subm_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    ResultRows = 1,
    HistoryList = 2,
    FieldErrors = 3,
}

/// One row returned by an accepted submission.
#[repr(C)]
pub struct FfiResultRow {
    pub date: *mut c_char,
    pub name: *mut c_char,
}

#[repr(C)]
pub struct FfiResultRowList {
    pub items: *mut FfiResultRow,
    pub len: usize,
}

/// One history row.
#[repr(C)]
pub struct FfiHistoryRecord {
    pub date: *mut c_char,
    pub first_name: *mut c_char,
    pub last_name: *mut c_char,
    pub count: u64,
}

#[repr(C)]
pub struct FfiHistoryList {
    pub items: *mut FfiHistoryRecord,
    pub len: usize,
}

/// Messages reported for one field of a rejected submission.
#[repr(C)]
pub struct FfiFieldError {
    pub field: *mut c_char,
    pub messages: *mut *mut c_char,
    pub messages_len: usize,
}

#[repr(C)]
pub struct FfiFieldErrorList {
    pub items: *mut FfiFieldError,
    pub len: usize,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On a validation failure `error_code` is `Validation` and `data` points to
/// an `FfiFieldErrorList`. On any other failure `data` is null and
/// `error_message` is a human-readable C string.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            http_status,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying the rows of an accepted submission.
    pub(crate) fn ok_rows(rows: Vec<ResultRow>) -> *mut Self {
        let rows: Vec<FfiResultRow> = rows
            .into_iter()
            .map(|r| FfiResultRow {
                date: c_string(r.date),
                name: c_string(r.name),
            })
            .collect();
        let (items, len) = into_raw_parts(rows);
        let list = Box::into_raw(Box::new(FfiResultRowList { items, len }));
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            0,
            FfiDataTag::ResultRows,
            list as *mut c_void,
        )
    }

    /// Build a success result carrying history rows.
    pub(crate) fn ok_history(records: Vec<HistoryRecord>) -> *mut Self {
        let records: Vec<FfiHistoryRecord> = records
            .into_iter()
            .map(|r| FfiHistoryRecord {
                date: c_string(r.date),
                first_name: c_string(r.first_name),
                last_name: c_string(r.last_name),
                count: r.count,
            })
            .collect();
        let (items, len) = into_raw_parts(records);
        let list = Box::into_raw(Box::new(FfiHistoryList { items, len }));
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            0,
            FfiDataTag::HistoryList,
            list as *mut c_void,
        )
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let message = c_string(err.to_string());
        match err {
            ApiError::Validation(failure) => {
                let list = field_error_list(failure.errors);
                Self::boxed(
                    FfiErrorCode::Validation,
                    message,
                    0,
                    FfiDataTag::FieldErrors,
                    list as *mut c_void,
                )
            }
            ApiError::Transport { status } => Self::boxed(
                FfiErrorCode::Http,
                message,
                status,
                FfiDataTag::None,
                std::ptr::null_mut(),
            ),
            ApiError::Network(_) => Self::error(FfiErrorCode::Network, message),
            ApiError::Deserialization(_) => Self::error(FfiErrorCode::Deserialization, message),
            ApiError::Serialization(_) => Self::error(FfiErrorCode::Serialization, message),
        }
    }

    fn error(code: FfiErrorCode, message: *mut c_char) -> *mut Self {
        Self::boxed(code, message, 0, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(
            FfiErrorCode::NullArg,
            c_string(format!("null argument: {name}")),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, c_string(msg))
    }
}

fn field_error_list(errors: FieldErrors) -> *mut FfiFieldErrorList {
    let items: Vec<FfiFieldError> = errors
        .into_iter()
        .map(|(field, messages)| {
            let messages: Vec<*mut c_char> = messages.into_iter().map(c_string).collect();
            let (messages, messages_len) = into_raw_parts(messages);
            FfiFieldError {
                field: c_string(field),
                messages,
                messages_len,
            }
        })
        .collect();
    let (items, len) = into_raw_parts(items);
    Box::into_raw(Box::new(FfiFieldErrorList { items, len }))
}
