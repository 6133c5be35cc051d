//! Drive the C ABI against the live mock server, executing each request the
//! way a C host would: read the `FfiHttpRequest`, do the HTTP, hand back an
//! `FfiHttpResponse`.

use std::ffi::{CStr, CString};

use odoo_db_ffi::types::{FfiBytes, FfiDataTag, FfiDbResult, FfiErrorCode, FfiHttpRequest, FfiHttpResponse, FfiStringList};
use odoo_db_ffi::*;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_odoo::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Execute and free `req`, then parse the reply with `parse`.
fn round_trip(
    client: *const types::FfiDbClient,
    req: *mut FfiHttpRequest,
    parse: extern "C" fn(*const types::FfiDbClient, *const FfiHttpResponse) -> *mut FfiDbResult,
) -> *mut FfiDbResult {
    assert!(!req.is_null());
    let (url, body) = {
        let r = unsafe { &*req };
        let url = unsafe { CStr::from_ptr(r.url) }.to_str().unwrap().to_string();
        let body = unsafe { CStr::from_ptr(r.body) }.to_str().unwrap().to_string();
        (url, body)
    };
    odoo_db_free_request(req);

    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let mut response = agent
        .post(&url)
        .content_type("application/json")
        .send(body.as_bytes())
        .expect("HTTP transport error");
    let status = response.status().as_u16();
    let text = CString::new(response.body_mut().read_to_string().unwrap()).unwrap();

    let resp = FfiHttpResponse {
        status,
        body: text.as_ptr(),
    };
    parse(client, &resp)
}

fn assert_ok(result: *mut FfiDbResult) -> &'static FfiDbResult {
    let r = unsafe { &*result };
    if r.error_code != FfiErrorCode::Ok {
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        panic!("expected Ok, got {:?}: {msg}", r.error_code);
    }
    r
}

#[test]
fn create_dump_restore_list() {
    let url = CString::new(start_server()).unwrap();
    let client = odoo_db_client_new(url.as_ptr());
    let admin = CString::new("admin").unwrap();
    let prod = CString::new("prod").unwrap();
    let copy = CString::new("copy").unwrap();

    // create
    let req = odoo_db_build_create(
        client,
        admin.as_ptr(),
        prod.as_ptr(),
        false,
        std::ptr::null(),
        std::ptr::null(),
    );
    let result = round_trip(client, req, odoo_db_parse_unit);
    assert_ok(result);
    odoo_db_free_result(result);

    // dump
    let req = odoo_db_build_dump(client, admin.as_ptr(), prod.as_ptr());
    let result = round_trip(client, req, odoo_db_parse_dump);
    let r = assert_ok(result);
    assert_eq!(r.data_tag, FfiDataTag::Bytes);
    let dump = {
        let bytes = unsafe { &*(r.data as *const FfiBytes) };
        unsafe { std::slice::from_raw_parts(bytes.data, bytes.len) }.to_vec()
    };
    odoo_db_free_result(result);

    // restore
    let req = odoo_db_build_restore(
        client,
        admin.as_ptr(),
        copy.as_ptr(),
        dump.as_ptr(),
        dump.len(),
        true,
    );
    let result = round_trip(client, req, odoo_db_parse_unit);
    assert_ok(result);
    odoo_db_free_result(result);

    // exists
    let req = odoo_db_build_exists(client, copy.as_ptr());
    let result = round_trip(client, req, odoo_db_parse_exists);
    let r = assert_ok(result);
    assert!(unsafe { *(r.data as *const bool) });
    odoo_db_free_result(result);

    // list
    let req = odoo_db_build_list(client);
    let result = round_trip(client, req, odoo_db_parse_list);
    let r = assert_ok(result);
    let list = unsafe { &*(r.data as *const FfiStringList) };
    let names: Vec<String> = unsafe { std::slice::from_raw_parts(list.items, list.len as usize) }
        .iter()
        .map(|p| unsafe { CStr::from_ptr(*p) }.to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["copy", "prod"]);
    odoo_db_free_result(result);

    // drop with the wrong password
    let wrong = CString::new("wrong").unwrap();
    let req = odoo_db_build_drop(client, wrong.as_ptr(), prod.as_ptr());
    let result = round_trip(client, req, odoo_db_parse_drop);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Rpc);
    odoo_db_free_result(result);

    odoo_db_client_free(client);
}
