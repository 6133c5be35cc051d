use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SERVER_VERSION: &str = "17.0";

/// Settings read by the binary.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub admin_password: String,
}

impl ServerConfig {
    /// `PORT` (default 8069) and `ODOO_ADMIN_PASSWD` (default `admin`).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8069);
        let admin_password =
            std::env::var("ODOO_ADMIN_PASSWD").unwrap_or_else(|_| "admin".to_string());
        Self {
            port,
            admin_password,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub uuid: Uuid,
    pub lang: String,
    pub demo: bool,
    pub admin_password: String,
}

/// What `dump` hands out and `restore` takes back, before base64.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    name: String,
    #[serde(flatten)]
    database: Database,
}

#[derive(Debug)]
pub struct ServerState {
    pub admin_password: String,
    pub databases: BTreeMap<String, Database>,
}

impl ServerState {
    pub fn new(admin_password: &str) -> Self {
        Self {
            admin_password: admin_password.to_string(),
            databases: BTreeMap::new(),
        }
    }
}

pub type Shared = Arc<RwLock<ServerState>>;

#[derive(Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub params: RpcParams,
}

#[derive(Deserialize)]
pub struct RpcParams {
    pub service: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// A server-side exception, reported the way Odoo does.
#[derive(Debug)]
struct Fault {
    name: &'static str,
    message: String,
}

impl Fault {
    fn new(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }

    fn access_denied() -> Self {
        Self::new("odoo.exceptions.AccessDenied", "Access Denied")
    }

    fn into_error(self) -> Value {
        json!({
            "code": 200,
            "message": "Odoo Server Error",
            "data": {
                "name": self.name,
                "message": self.message,
                "debug": "",
                "arguments": [self.message],
            }
        })
    }
}

pub fn app() -> Router {
    router(ServerState::new("admin"))
}

pub fn router(state: ServerState) -> Router {
    let shared: Shared = Arc::new(RwLock::new(state));
    Router::new()
        .route("/jsonrpc", post(jsonrpc))
        // restore carries whole backups
        .layer(DefaultBodyLimit::disable())
        .with_state(shared)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, state: ServerState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

async fn jsonrpc(State(state): State<Shared>, Json(req): Json<RpcRequest>) -> Json<Value> {
    let params = req.params;
    debug!(service = %params.service, method = %params.method, "jsonrpc call");
    let outcome = if params.service == "db" {
        dispatch(&state, &params.method, &params.args).await
    } else {
        Err(Fault::new(
            "builtins.KeyError",
            format!("unknown service {}", params.service),
        ))
    };
    match outcome {
        Ok(result) => Json(json!({"jsonrpc": "2.0", "id": req.id, "result": result})),
        Err(fault) => {
            warn!(method = %params.method, message = %fault.message, "db call failed");
            Json(json!({"jsonrpc": "2.0", "id": req.id, "error": fault.into_error()}))
        }
    }
}

async fn dispatch(state: &Shared, method: &str, args: &[Value]) -> Result<Value, Fault> {
    match method {
        "list" => {
            let state = state.read().await;
            Ok(json!(state.databases.keys().collect::<Vec<_>>()))
        }
        "db_exist" => {
            let db = arg_str(args, 0)?;
            Ok(json!(state.read().await.databases.contains_key(db)))
        }
        "server_version" => Ok(json!(SERVER_VERSION)),
        "list_lang" => Ok(json!([
            ["en_US", "English (US)"],
            ["fr_FR", "French / Français"],
        ])),
        _ => {
            let mut state = state.write().await;
            if arg_str(args, 0)? != state.admin_password {
                return Err(Fault::access_denied());
            }
            admin_call(&mut state, method, &args[1..])
        }
    }
}

/// Methods guarded by the super administrator password; `args` excludes it.
fn admin_call(state: &mut ServerState, method: &str, args: &[Value]) -> Result<Value, Fault> {
    match method {
        "create_database" => {
            let name = arg_str(args, 0)?.to_string();
            ensure_free(state, &name)?;
            let database = Database {
                uuid: Uuid::new_v4(),
                demo: arg_bool(args, 1, false)?,
                lang: arg_str_or(args, 2, "en_US")?,
                admin_password: arg_str_or(args, 3, "admin")?,
            };
            info!(db = %name, "database created");
            state.databases.insert(name, database);
            Ok(json!(true))
        }
        "drop" => {
            let name = arg_str(args, 0)?;
            let dropped = state.databases.remove(name).is_some();
            info!(db = %name, dropped, "drop");
            Ok(json!(dropped))
        }
        "duplicate_database" => {
            let source = find(state, arg_str(args, 0)?)?.clone();
            let target = arg_str(args, 1)?.to_string();
            ensure_free(state, &target)?;
            state.databases.insert(
                target,
                Database {
                    uuid: Uuid::new_v4(),
                    ..source
                },
            );
            Ok(json!(true))
        }
        "change_admin_password" => {
            state.admin_password = arg_str(args, 0)?.to_string();
            Ok(json!(true))
        }
        "dump" => {
            let name = arg_str(args, 0)?;
            if let Some(format) = args.get(1) {
                if !matches!(format.as_str(), Some("zip" | "dump")) {
                    return Err(Fault::new("builtins.ValueError", "Unknown backup format"));
                }
            }
            let snapshot = Snapshot {
                name: name.to_string(),
                database: find(state, name)?.clone(),
            };
            let bytes = serde_json::to_vec(&snapshot)
                .map_err(|e| Fault::new("builtins.Exception", e.to_string()))?;
            Ok(json!(BASE64_STANDARD.encode(bytes)))
        }
        "restore" => {
            let name = arg_str(args, 0)?.to_string();
            let data = arg_str(args, 1)?;
            let copy = arg_bool(args, 2, false)?;
            ensure_free(state, &name)?;
            let bytes = BASE64_STANDARD
                .decode(data)
                .map_err(|e| Fault::new("binascii.Error", e.to_string()))?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)
                .map_err(|_| Fault::new("builtins.Exception", "Couldn't restore database"))?;
            let mut database = snapshot.database;
            if copy {
                database.uuid = Uuid::new_v4();
            }
            info!(db = %name, copy, "database restored");
            state.databases.insert(name, database);
            Ok(json!(true))
        }
        "rename" => {
            let old_name = arg_str(args, 0)?;
            let new_name = arg_str(args, 1)?.to_string();
            ensure_free(state, &new_name)?;
            let database = state
                .databases
                .remove(old_name)
                .ok_or_else(|| not_found(old_name))?;
            state.databases.insert(new_name, database);
            Ok(json!(true))
        }
        other => Err(Fault::new(
            "builtins.KeyError",
            format!("unknown method {other}"),
        )),
    }
}

fn find<'a>(state: &'a ServerState, name: &str) -> Result<&'a Database, Fault> {
    state.databases.get(name).ok_or_else(|| not_found(name))
}

fn not_found(name: &str) -> Fault {
    Fault::new(
        "psycopg2.OperationalError",
        format!("database \"{name}\" does not exist"),
    )
}

fn ensure_free(state: &ServerState, name: &str) -> Result<(), Fault> {
    if state.databases.contains_key(name) {
        return Err(Fault::new("builtins.Exception", "Database already exists"));
    }
    Ok(())
}

fn arg_str(args: &[Value], index: usize) -> Result<&str, Fault> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| Fault::new("builtins.TypeError", format!("missing string argument {index}")))
}

fn arg_str_or(args: &[Value], index: usize, default: &str) -> Result<String, Fault> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(_) => arg_str(args, index).map(str::to_string),
    }
}

fn arg_bool(args: &[Value], index: usize, default: bool) -> Result<bool, Fault> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| Fault::new("builtins.TypeError", format!("argument {index} is not a boolean"))),
    }
}
