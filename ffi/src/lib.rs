//! C-ABI wrapper around `odoo-db-core`.
//!
//! # Overview
//! Exposes the `db` service operations through `extern "C"` functions so any
//! language with a C FFI can build JSON-RPC requests and parse the replies
//! while doing the HTTP itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `odoo_db_build_*` / `odoo_db_parse_*` mirror `DbClient` 1:1. Build
//!   functions return null on a null argument or a failed build.
//! - A single `FfiDbResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `odoo_db_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use odoo_db::{CreateDatabase, DbClient, DbError, Dump, HttpRequest, HttpResponse};

use types::*;

/// Borrow a C string, `None` if null or not UTF-8.
fn cstr<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `DbClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `odoo_db_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_client_new(base_url: *const c_char) -> *mut FfiDbClient {
    catch_unwind(|| match cstr(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiDbClient {
            inner: DbClient::new(url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `odoo_db_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_client_free(client: *mut FfiDbClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// `build` yields `None` when one of its string arguments is null.
fn build_request<F>(client: *const FfiDbClient, build: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&DbClient) -> Option<Result<HttpRequest, DbError>>,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(Ok(req)) => FfiHttpRequest::from_core(req),
            _ => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request listing the databases.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_list(client: *const FfiDbClient) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_list()))
}

/// Build a `create_database` request.
///
/// `lang` and `admin_password` may be null to use `en_US` and `admin`.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_create(
    client: *const FfiDbClient,
    password: *const c_char,
    db: *const c_char,
    demo: bool,
    lang: *const c_char,
    admin_password: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| {
        let mut input = CreateDatabase::new(cstr(db)?);
        input.demo = demo;
        if let Some(lang) = cstr(lang) {
            input.lang = lang.to_string();
        }
        if let Some(admin_password) = cstr(admin_password) {
            input.admin_password = admin_password.to_string();
        }
        Some(c.build_create(cstr(password)?, &input))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_drop(
    client: *const FfiDbClient,
    password: *const c_char,
    db: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_drop(cstr(password)?, cstr(db)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_duplicate(
    client: *const FfiDbClient,
    password: *const c_char,
    db: *const c_char,
    new_db: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| {
        Some(c.build_duplicate(cstr(password)?, cstr(db)?, cstr(new_db)?))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_change_password(
    client: *const FfiDbClient,
    password: *const c_char,
    new_password: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| {
        Some(c.build_change_password(cstr(password)?, cstr(new_password)?))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_dump(
    client: *const FfiDbClient,
    password: *const c_char,
    db: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_dump(cstr(password)?, cstr(db)?)))
}

/// Build a `restore` request from `len` bytes at `data`.
///
/// A null `data` stands for a closed dump and yields null.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_restore(
    client: *const FfiDbClient,
    password: *const c_char,
    db: *const c_char,
    data: *const u8,
    len: usize,
    copy: bool,
) -> *mut FfiHttpRequest {
    build_request(client, |c| {
        let dump = if data.is_null() {
            Dump::closed()
        } else {
            Dump::new(unsafe { std::slice::from_raw_parts(data, len) }.to_vec())
        };
        Some(c.build_restore(cstr(password)?, cstr(db)?, dump, copy))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_build_exists(
    client: *const FfiDbClient,
    db: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_exists(cstr(db)?)))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// read as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: cstr(resp.body).unwrap_or("").to_string(),
    }
}

fn parse_response<T>(
    name: &str,
    client: *const FfiDbClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&DbClient, HttpResponse) -> Result<T, DbError>,
    wrap: impl FnOnce(T) -> *mut FfiDbResult,
) -> *mut FfiDbResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiDbResult::null_arg("client");
        }
        if response.is_null() {
            return FfiDbResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match parse(&client.inner, resp) {
            Ok(value) => wrap(value),
            Err(e) => FfiDbResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiDbResult::panic(&format!("panic in {name}")))
}

/// Parse a `list` reply. `data_tag = StringList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_parse_list(
    client: *const FfiDbClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDbResult {
    parse_response(
        "odoo_db_parse_list",
        client,
        response,
        DbClient::parse_list,
        FfiDbResult::ok_string_list,
    )
}

/// Parse a reply whose result is ignored: create, duplicate,
/// change_password and restore. `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_parse_unit(
    client: *const FfiDbClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDbResult {
    parse_response(
        "odoo_db_parse_unit",
        client,
        response,
        DbClient::parse_unit,
        |()| FfiDbResult::ok_empty(),
    )
}

/// Parse a `drop` reply. `data_tag = Bool`; `false` means the database did
/// not exist.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_parse_drop(
    client: *const FfiDbClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDbResult {
    parse_response(
        "odoo_db_parse_drop",
        client,
        response,
        DbClient::parse_drop,
        FfiDbResult::ok_bool,
    )
}

/// Parse a `dump` reply. `data_tag = Bytes` holding the decoded backup.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_parse_dump(
    client: *const FfiDbClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDbResult {
    parse_response(
        "odoo_db_parse_dump",
        client,
        response,
        DbClient::parse_dump,
        |dump| FfiDbResult::ok_bytes(dump.into_bytes().unwrap_or_default()),
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_parse_exists(
    client: *const FfiDbClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDbResult {
    parse_response(
        "odoo_db_parse_exists",
        client,
        response,
        DbClient::parse_exists,
        FfiDbResult::ok_bool,
    )
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `odoo_db_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        odoo_db_free_string(req.url);
        odoo_db_free_string(req.body);
        let headers = unsafe { reclaim_slice(req.headers, req.headers_len as usize) };
        for h in headers {
            odoo_db_free_string(h.key);
            odoo_db_free_string(h.value);
        }
    });
}

/// Free an `FfiDbResult` returned by any `odoo_db_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_free_result(result: *mut FfiDbResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        odoo_db_free_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Bool => drop(unsafe { Box::from_raw(result.data as *mut bool) }),
            FfiDataTag::StringList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiStringList) };
                for item in unsafe { reclaim_slice(list.items, list.len as usize) } {
                    odoo_db_free_string(item);
                }
            }
            FfiDataTag::Bytes => {
                let bytes = unsafe { Box::from_raw(result.data as *mut FfiBytes) };
                drop(unsafe { reclaim_slice(bytes.data, bytes.len) });
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn odoo_db_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
