//! The database-management service as method calls.
//!
//! # Design
//! `DB` owns nothing but its transport. Each method builds a `DbPayload`,
//! sends it to `/jsonrpc` and decodes the single value in `result`. Database
//! level operations need the server's super administrator password, which is
//! passed per call and never logged.

use crate::dump::{Dump, DumpSource};
use crate::error::DbError;
use crate::rpc;
use crate::transport::Transport;
use crate::types::{CreateDatabase, DbPayload, DumpFormat, JSONRPC_PATH};

/// Client for the `db` service of an Odoo server.
#[derive(Debug, Clone)]
pub struct DB<T> {
    transport: T,
}

impl<T: Transport> DB<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access, e.g. to raise a timeout before a long dump.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn call(&self, payload: DbPayload) -> Result<serde_json::Value, DbError> {
        tracing::debug!(method = %payload.method, "calling db service");
        self.transport.json(JSONRPC_PATH, &payload.to_value()?)
    }

    /// Names of the databases the server lists.
    pub fn list(&self) -> Result<Vec<String>, DbError> {
        let reply = self.call(DbPayload::list())?;
        rpc::decode_list(&reply)
    }

    /// Create a database. Creation can outlast the default timeout when demo
    /// data is loaded.
    pub fn create(&self, password: &str, input: &CreateDatabase) -> Result<(), DbError> {
        self.call(DbPayload::create(password, input))?;
        Ok(())
    }

    /// Drop `db`. `false` means the database did not exist.
    pub fn drop(&self, password: &str, db: &str) -> Result<bool, DbError> {
        let reply = self.call(DbPayload::drop(password, db))?;
        rpc::decode_required(&reply, "drop")
    }

    pub fn duplicate(&self, password: &str, db: &str, new_db: &str) -> Result<(), DbError> {
        self.call(DbPayload::duplicate(password, db, new_db))?;
        Ok(())
    }

    /// Replace the super administrator password.
    pub fn change_password(&self, password: &str, new_password: &str) -> Result<(), DbError> {
        self.call(DbPayload::change_password(password, new_password))?;
        Ok(())
    }

    /// Back up `db`. The dump is usually a ZIP holding `dump.sql` and the
    /// filestore.
    pub fn dump(&self, password: &str, db: &str) -> Result<Dump, DbError> {
        let reply = self.call(DbPayload::dump(password, db))?;
        rpc::decode_dump(&reply)
    }

    pub fn dump_with_format(
        &self,
        password: &str,
        db: &str,
        format: DumpFormat,
    ) -> Result<Dump, DbError> {
        let reply = self.call(DbPayload::dump_with_format(password, db, format))?;
        rpc::decode_dump(&reply)
    }

    /// Restore `dump` into the new database `db`. With `copy` the restored
    /// database gets a new UUID.
    ///
    /// Fails with `DbError::Internal` without contacting the server if `dump`
    /// is closed.
    pub fn restore<S: DumpSource>(
        &self,
        password: &str,
        db: &str,
        dump: S,
        copy: bool,
    ) -> Result<(), DbError> {
        let b64_data = read_dump(dump)?;
        self.call(DbPayload::restore(password, db, b64_data, copy))?;
        Ok(())
    }

    pub fn exists(&self, db: &str) -> Result<bool, DbError> {
        let reply = self.call(DbPayload::exists(db))?;
        rpc::decode_required(&reply, "db_exist")
    }

    pub fn rename(&self, password: &str, old_name: &str, new_name: &str) -> Result<(), DbError> {
        self.call(DbPayload::rename(password, old_name, new_name))?;
        Ok(())
    }

    pub fn server_version(&self) -> Result<String, DbError> {
        let reply = self.call(DbPayload::server_version())?;
        rpc::decode_required(&reply, "server_version")
    }

    /// Installable languages as `(code, name)` pairs.
    pub fn list_lang(&self) -> Result<Vec<(String, String)>, DbError> {
        let reply = self.call(DbPayload::list_lang())?;
        rpc::decode_list(&reply)
    }
}

/// Read a whole restore source and base64 it.
pub(crate) fn read_dump<S: DumpSource>(mut dump: S) -> Result<String, DbError> {
    if dump.is_closed() {
        return Err(DbError::Internal("Dump file closed".to_string()));
    }
    let mut bytes = Vec::new();
    dump.read_to_end(&mut bytes)?;
    Ok(rpc::encode_dump(&bytes))
}
