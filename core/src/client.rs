//! Stateless HTTP request builder and response parser for the `db` service.
//!
//! # Design
//! `DbClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`; the host executes the round-trip in between.
//! Payloads and result decoding are shared with `DB`, so both paths put the
//! same bytes on the wire.

use serde_json::Value;

use crate::db::read_dump;
use crate::dump::{Dump, DumpSource};
use crate::error::DbError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::rpc;
use crate::types::{CreateDatabase, DbPayload, DumpFormat, JSONRPC_PATH};

/// Synchronous, stateless client for the `db` service.
#[derive(Debug, Clone)]
pub struct DbClient {
    base_url: String,
}

impl DbClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wrap a payload into a `POST /jsonrpc` request.
    pub fn build_call(&self, payload: &DbPayload) -> Result<HttpRequest, DbError> {
        tracing::debug!(method = %payload.method, "building db service request");
        let body = serde_json::to_string(&rpc::envelope(&payload.to_value()?))
            .map_err(|e| DbError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{JSONRPC_PATH}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        })
    }

    /// Check status and RPC error, returning the reply object.
    pub fn parse_call(&self, response: HttpResponse) -> Result<Value, DbError> {
        if response.status != 200 {
            return Err(DbError::Http {
                status: response.status,
                body: response.body,
            });
        }
        rpc::parse_reply(&response.body)
    }

    pub fn build_list(&self) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::list())
    }

    pub fn build_create(
        &self,
        password: &str,
        input: &CreateDatabase,
    ) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::create(password, input))
    }

    pub fn build_drop(&self, password: &str, db: &str) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::drop(password, db))
    }

    pub fn build_duplicate(
        &self,
        password: &str,
        db: &str,
        new_db: &str,
    ) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::duplicate(password, db, new_db))
    }

    pub fn build_change_password(
        &self,
        password: &str,
        new_password: &str,
    ) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::change_password(password, new_password))
    }

    pub fn build_dump(&self, password: &str, db: &str) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::dump(password, db))
    }

    pub fn build_dump_with_format(
        &self,
        password: &str,
        db: &str,
        format: DumpFormat,
    ) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::dump_with_format(password, db, format))
    }

    /// Fails with `DbError::Internal` if `dump` is closed.
    pub fn build_restore<S: DumpSource>(
        &self,
        password: &str,
        db: &str,
        dump: S,
        copy: bool,
    ) -> Result<HttpRequest, DbError> {
        let b64_data = read_dump(dump)?;
        self.build_call(&DbPayload::restore(password, db, b64_data, copy))
    }

    pub fn build_exists(&self, db: &str) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::exists(db))
    }

    pub fn build_rename(
        &self,
        password: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::rename(password, old_name, new_name))
    }

    pub fn build_server_version(&self) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::server_version())
    }

    pub fn build_list_lang(&self) -> Result<HttpRequest, DbError> {
        self.build_call(&DbPayload::list_lang())
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<String>, DbError> {
        rpc::decode_list(&self.parse_call(response)?)
    }

    /// For calls whose result is ignored: create, duplicate, change_password,
    /// restore and rename.
    pub fn parse_unit(&self, response: HttpResponse) -> Result<(), DbError> {
        self.parse_call(response).map(|_| ())
    }

    pub fn parse_drop(&self, response: HttpResponse) -> Result<bool, DbError> {
        rpc::decode_required(&self.parse_call(response)?, "drop")
    }

    pub fn parse_dump(&self, response: HttpResponse) -> Result<Dump, DbError> {
        rpc::decode_dump(&self.parse_call(response)?)
    }

    pub fn parse_exists(&self, response: HttpResponse) -> Result<bool, DbError> {
        rpc::decode_required(&self.parse_call(response)?, "db_exist")
    }

    pub fn parse_server_version(&self, response: HttpResponse) -> Result<String, DbError> {
        rpc::decode_required(&self.parse_call(response)?, "server_version")
    }

    pub fn parse_list_lang(&self, response: HttpResponse) -> Result<Vec<(String, String)>, DbError> {
        rpc::decode_list(&self.parse_call(response)?)
    }
}
