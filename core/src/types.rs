//! Payload types for the `db` service.
//!
//! # Design
//! Every call to the database-management service carries the same envelope
//! `{service: "db", method, args}`; only the method name and the positional
//! arguments vary. The constructors on `DbPayload` are the single place where
//! argument order is decided, and both `DB` and `DbClient` go through them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::DbError;

/// Endpoint every `db` service call is posted to.
pub const JSONRPC_PATH: &str = "/jsonrpc";

/// Name of the service in the payload.
pub const DB_SERVICE: &str = "db";

/// Remote methods of the `db` service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbMethod {
    List,
    CreateDatabase,
    Drop,
    DuplicateDatabase,
    ChangeAdminPassword,
    Dump,
    Restore,
    DbExist,
    Rename,
    ServerVersion,
    ListLang,
}

impl DbMethod {
    /// Method name as the server knows it.
    pub fn rpc_name(self) -> &'static str {
        match self {
            DbMethod::List => "list",
            DbMethod::CreateDatabase => "create_database",
            DbMethod::Drop => "drop",
            DbMethod::DuplicateDatabase => "duplicate_database",
            DbMethod::ChangeAdminPassword => "change_admin_password",
            DbMethod::Dump => "dump",
            DbMethod::Restore => "restore",
            DbMethod::DbExist => "db_exist",
            DbMethod::Rename => "rename",
            DbMethod::ServerVersion => "server_version",
            DbMethod::ListLang => "list_lang",
        }
    }
}

/// The `{service, method, args}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbPayload {
    pub service: String,
    pub method: String,
    pub args: Vec<Value>,
}

impl DbPayload {
    pub fn new(method: DbMethod, args: Vec<Value>) -> Self {
        Self {
            service: DB_SERVICE.to_string(),
            method: method.rpc_name().to_string(),
            args,
        }
    }

    pub fn list() -> Self {
        Self::new(DbMethod::List, Vec::new())
    }

    pub fn create(password: &str, input: &CreateDatabase) -> Self {
        Self::new(
            DbMethod::CreateDatabase,
            vec![
                json!(password),
                json!(input.db),
                json!(input.demo),
                json!(input.lang),
                json!(input.admin_password),
            ],
        )
    }

    pub fn drop(password: &str, db: &str) -> Self {
        Self::new(DbMethod::Drop, vec![json!(password), json!(db)])
    }

    pub fn duplicate(password: &str, db: &str, new_db: &str) -> Self {
        Self::new(
            DbMethod::DuplicateDatabase,
            vec![json!(password), json!(db), json!(new_db)],
        )
    }

    pub fn change_password(password: &str, new_password: &str) -> Self {
        Self::new(
            DbMethod::ChangeAdminPassword,
            vec![json!(password), json!(new_password)],
        )
    }

    pub fn dump(password: &str, db: &str) -> Self {
        Self::new(DbMethod::Dump, vec![json!(password), json!(db)])
    }

    /// `dump` with an explicit backup format (servers that accept a third
    /// argument).
    pub fn dump_with_format(password: &str, db: &str, format: DumpFormat) -> Self {
        Self::new(
            DbMethod::Dump,
            vec![json!(password), json!(db), json!(format.as_str())],
        )
    }

    /// `b64_data` is the already-encoded dump.
    pub fn restore(password: &str, db: &str, b64_data: String, copy: bool) -> Self {
        Self::new(
            DbMethod::Restore,
            vec![json!(password), json!(db), Value::String(b64_data), json!(copy)],
        )
    }

    pub fn exists(db: &str) -> Self {
        Self::new(DbMethod::DbExist, vec![json!(db)])
    }

    pub fn rename(password: &str, old_name: &str, new_name: &str) -> Self {
        Self::new(
            DbMethod::Rename,
            vec![json!(password), json!(old_name), json!(new_name)],
        )
    }

    pub fn server_version() -> Self {
        Self::new(DbMethod::ServerVersion, Vec::new())
    }

    pub fn list_lang() -> Self {
        Self::new(DbMethod::ListLang, Vec::new())
    }

    pub fn to_value(&self) -> Result<Value, DbError> {
        serde_json::to_value(self).map_err(|e| DbError::Serialization(e.to_string()))
    }
}

/// Parameters of `create_database`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDatabase {
    pub db: String,
    /// Load demonstration data.
    #[serde(default)]
    pub demo: bool,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Password of the `admin` user of the new database.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

impl CreateDatabase {
    pub fn new(db: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            demo: false,
            lang: default_lang(),
            admin_password: default_admin_password(),
        }
    }
}

fn default_lang() -> String {
    "en_US".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}

/// Backup format accepted by `dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// ZIP archive holding the SQL dump and the filestore.
    #[default]
    Zip,
    /// Plain `pg_dump` custom-format file, no filestore.
    Dump,
}

impl DumpFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DumpFormat::Zip => "zip",
            DumpFormat::Dump => "dump",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_payload_targets_the_db_service() {
        let payloads = [
            DbPayload::list(),
            DbPayload::create("pw", &CreateDatabase::new("prod")),
            DbPayload::drop("pw", "prod"),
            DbPayload::duplicate("pw", "prod", "test"),
            DbPayload::change_password("pw", "new"),
            DbPayload::dump("pw", "prod"),
            DbPayload::restore("pw", "prod", String::new(), false),
            DbPayload::exists("prod"),
            DbPayload::rename("pw", "a", "b"),
            DbPayload::server_version(),
            DbPayload::list_lang(),
        ];
        for payload in payloads {
            assert_eq!(payload.service, "db");
            let value = payload.to_value().unwrap();
            assert_eq!(value["service"], "db");
            assert_eq!(value["method"], payload.method.as_str());
            assert_eq!(value["args"], json!(payload.args));
        }
    }

    #[test]
    fn create_uses_create_database_with_defaults() {
        let payload = DbPayload::create("super", &CreateDatabase::new("prod"));
        assert_eq!(payload.method, "create_database");
        assert_eq!(
            payload.args,
            vec![json!("super"), json!("prod"), json!(false), json!("en_US"), json!("admin")]
        );
    }

    #[test]
    fn method_names_match_server() {
        assert_eq!(DbPayload::duplicate("p", "a", "b").method, "duplicate_database");
        assert_eq!(DbPayload::change_password("p", "n").method, "change_admin_password");
        assert_eq!(DbPayload::exists("a").method, "db_exist");
        assert_eq!(DbPayload::list().args, Vec::<Value>::new());
    }

    #[test]
    fn dump_with_format_appends_format() {
        let payload = DbPayload::dump_with_format("p", "prod", DumpFormat::Dump);
        assert_eq!(payload.method, "dump");
        assert_eq!(payload.args, vec![json!("p"), json!("prod"), json!("dump")]);
    }

    #[test]
    fn restore_argument_order() {
        let payload = DbPayload::restore("p", "prod", "aGk=".to_string(), true);
        assert_eq!(
            payload.args,
            vec![json!("p"), json!("prod"), json!("aGk="), json!(true)]
        );
    }

    #[test]
    fn create_database_deserializes_with_defaults() {
        let input: CreateDatabase = serde_json::from_str(r#"{"db":"prod"}"#).unwrap();
        assert_eq!(input, CreateDatabase::new("prod"));
    }
}
