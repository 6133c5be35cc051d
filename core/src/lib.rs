//! Client for the database-management service of an Odoo server.
//!
//! # Overview
//! Lists, creates, drops, duplicates, dumps and restores databases and
//! changes the super administrator password through the `db` service of
//! Odoo's `/jsonrpc` endpoint.
//!
//! # Design
//! - `DB` is a facade over any `Transport`; `Connector` is the blocking HTTP
//!   transport (feature `ureq`, on by default).
//! - `DbClient` offers the same operations in host-does-IO form: `build_*`
//!   produces a request, `parse_*` consumes the response.
//! - Both share `DbPayload` constructors and the decoders in `rpc`.

pub mod client;
pub mod db;
pub mod dump;
pub mod error;
pub mod http;
pub mod rpc;
pub mod transport;
pub mod types;

pub use client::DbClient;
pub use db::DB;
pub use dump::{Dump, DumpSource};
pub use error::DbError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::{Connector, ConnectorConfig};
pub use types::{CreateDatabase, DbMethod, DbPayload, DumpFormat, JSONRPC_PATH};
