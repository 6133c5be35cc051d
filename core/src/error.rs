//! Error types for the database-management client.
//!
//! # Design
//! `Internal` is the only error raised locally before any request is sent
//! (restoring from a closed dump source). `Rpc` carries the server-side
//! failure relayed verbatim: `message` is what Odoo reported to the user and
//! `info` is the raw `error` object for debugging. Everything the HTTP layer
//! can go wrong with lands in `Http` or `Transport`.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `DB` methods and `DbClient` parse methods.
#[derive(Debug, Error)]
pub enum DbError {
    /// A local precondition failed; no request was sent.
    #[error("internal error: {0}")]
    Internal(String),

    /// The server answered with a JSON-RPC error (access denied, wrong
    /// database, database already exists, ...).
    #[error("{message}")]
    Rpc { message: String, info: Value },

    /// The server returned a non-200 status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never got an answer (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The reply could not be deserialized into the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The dump returned by the server is not valid base64.
    #[error("invalid base64 dump: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Reading the restore source failed.
    #[error("failed to read dump source: {0}")]
    Io(#[from] std::io::Error),

    /// The reply has no `result` although the method returns a value.
    #[error("reply to `{0}` has no result")]
    MissingResult(&'static str),
}

impl DbError {
    /// The error object sent by the server, if this is an RPC failure.
    pub fn rpc_info(&self) -> Option<&Value> {
        match self {
            DbError::Rpc { info, .. } => Some(info),
            _ => None,
        }
    }
}
