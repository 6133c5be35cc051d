//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations: owned
//! `*mut c_char` strings, boxed slices handed out as pointer + length, and
//! tagged enums with explicit discriminants. Conversions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use odoo_db::error::DbError;
use odoo_db::http::HttpMethod;

/// Opaque handle to a `DbClient`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiDbClient {
    pub(crate) inner: odoo_db::DbClient,
}

/// Heap C string; interior NULs cannot occur in JSON or base64, an empty
/// string is used if they somehow do.
pub(crate) fn c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Hand a vector to C as a raw pointer; null when empty.
fn leak_slice<T>(items: Vec<T>) -> *mut T {
    if items.is_empty() {
        return std::ptr::null_mut();
    }
    Box::into_raw(items.into_boxed_slice()) as *mut T
}

/// Take back a slice produced by `leak_slice`.
///
/// # Safety
/// `ptr` and `len` must come from the same `leak_slice` call.
pub(crate) unsafe fn reclaim_slice<T>(ptr: *mut T, len: usize) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Post = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
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
/// Built by `odoo_db_build_*` functions. The C caller executes the request
/// and passes the response back through `odoo_db_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: odoo_db::HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = leak_slice(
            req.headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect(),
        );

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: c_string(req.body),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing a request and passes a
/// pointer to an `odoo_db_parse_*` function. The FFI layer reads but does
/// not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiDbResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Rpc = 1,
    Http = 2,
    Deserialization = 3,
    Serialization = 4,
    Decode = 5,
    Internal = 6,
    Transport = 7,
    Io = 8,
    MissingResult = 9,
    Panic = 10,
    NullArg = 11,
}

/// Tag that tells `odoo_db_free_result` what `FfiDbResult::data` points to.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Bool = 1,
    StringList = 2,
    Bytes = 3,
}

/// Database names exposed to C.
#[repr(C)]
pub struct FfiStringList {
    pub items: *mut *mut c_char,
    pub len: u32,
}

/// Raw dump bytes exposed to C.
#[repr(C)]
pub struct FfiBytes {
    pub data: *mut u8,
    pub len: usize,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`). On failure
/// `error_code` describes the category, `error_message` is a C string, and
/// `data` is null.
#[repr(C)]
pub struct FfiDbResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiDbResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiDbResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn err(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiDbResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Success with no payload (create, duplicate, restore, ...).
    pub(crate) fn ok_empty() -> *mut Self {
        Self::ok(FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn ok_bool(value: bool) -> *mut Self {
        Self::ok(FfiDataTag::Bool, Box::into_raw(Box::new(value)) as *mut c_void)
    }

    pub(crate) fn ok_string_list(names: Vec<String>) -> *mut Self {
        let len = names.len() as u32;
        let items = leak_slice(names.into_iter().map(c_string).collect());
        let list = Box::new(FfiStringList { items, len });
        Self::ok(FfiDataTag::StringList, Box::into_raw(list) as *mut c_void)
    }

    pub(crate) fn ok_bytes(bytes: Vec<u8>) -> *mut Self {
        let len = bytes.len();
        let data = leak_slice(bytes);
        let bytes = Box::new(FfiBytes { data, len });
        Self::ok(FfiDataTag::Bytes, Box::into_raw(bytes) as *mut c_void)
    }

    /// Build an error result from a `DbError`.
    pub(crate) fn from_error(err: DbError) -> *mut Self {
        let (code, status) = match &err {
            DbError::Rpc { .. } => (FfiErrorCode::Rpc, 0),
            DbError::Http { status, .. } => (FfiErrorCode::Http, *status),
            DbError::Deserialization(_) => (FfiErrorCode::Deserialization, 0),
            DbError::Serialization(_) => (FfiErrorCode::Serialization, 0),
            DbError::Decode(_) => (FfiErrorCode::Decode, 0),
            DbError::Internal(_) => (FfiErrorCode::Internal, 0),
            DbError::Transport(_) => (FfiErrorCode::Transport, 0),
            DbError::Io(_) => (FfiErrorCode::Io, 0),
            DbError::MissingResult(_) => (FfiErrorCode::MissingResult, 0),
        };
        Self::err(code, status, err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::err(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::err(FfiErrorCode::Panic, 0, msg.to_string())
    }
}
