//! JSON-RPC envelope and result decoding.
//!
//! Odoo's `/jsonrpc` endpoint expects every payload wrapped in a
//! `{"jsonrpc": "2.0", "method": "call", "params": ..., "id": ...}` request
//! and answers with either `result` or an `error` object. Error replies are
//! turned into `DbError::Rpc` here so callers only ever see the reply when
//! it succeeded.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::dump::Dump;
use crate::error::DbError;

/// Wrap `params` into a JSON-RPC `call` request with a fresh id.
pub fn envelope(params: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": params,
        "id": Uuid::new_v4().to_string(),
    })
}

/// Check a decoded reply and return it whole when it carries no error.
pub fn check_reply(reply: Value) -> Result<Value, DbError> {
    let Some(obj) = reply.as_object() else {
        return Err(DbError::Deserialization(format!(
            "expected a JSON object, got {reply}"
        )));
    };
    match obj.get("error").filter(|e| !e.is_null()).map(rpc_error) {
        Some(err) => Err(err),
        None => Ok(reply),
    }
}

/// Parse a raw reply body; see `check_reply`.
pub fn parse_reply(body: &str) -> Result<Value, DbError> {
    let reply: Value =
        serde_json::from_str(body).map_err(|e| DbError::Deserialization(e.to_string()))?;
    check_reply(reply)
}

fn rpc_error(error: &Value) -> DbError {
    let message = error
        .pointer("/data/message")
        .and_then(Value::as_str)
        .or_else(|| error.get("message").and_then(Value::as_str))
        .unwrap_or("unknown RPC error")
        .to_string();
    tracing::warn!(%message, "db service returned an error");
    DbError::Rpc {
        message,
        info: error.clone(),
    }
}

/// `result` of `list`-like methods; an absent result is an empty list, an
/// explicit `null` is not a list.
pub fn decode_list<T: DeserializeOwned>(reply: &Value) -> Result<Vec<T>, DbError> {
    match reply.get("result") {
        None => Ok(Vec::new()),
        Some(result) => serde_json::from_value(result.clone())
            .map_err(|e| DbError::Deserialization(e.to_string())),
    }
}

/// `result` that must be present, deserialized as `T`.
pub fn decode_required<T: DeserializeOwned>(
    reply: &Value,
    method: &'static str,
) -> Result<T, DbError> {
    let result = reply.get("result").ok_or(DbError::MissingResult(method))?;
    serde_json::from_value(result.clone()).map_err(|e| DbError::Deserialization(e.to_string()))
}

/// Decode the base64 `result` of `dump`.
pub fn decode_dump(reply: &Value) -> Result<Dump, DbError> {
    let encoded: String = decode_required(reply, "dump")?;
    let bytes = BASE64_STANDARD.decode(encoded.as_bytes())?;
    Ok(Dump::new(bytes))
}

/// Standard, padded base64 of a restore payload.
pub fn encode_dump(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_params_in_call() {
        let params = json!({"service": "db", "method": "list", "args": []});
        let req = envelope(&params);
        assert_eq!(req["jsonrpc"], "2.0");
        assert_eq!(req["method"], "call");
        assert_eq!(req["params"], params);
        assert!(Uuid::parse_str(req["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn envelope_ids_are_unique() {
        let params = json!({});
        assert_ne!(envelope(&params)["id"], envelope(&params)["id"]);
    }

    #[test]
    fn check_reply_passes_result_through() {
        let reply = json!({"jsonrpc": "2.0", "id": 1, "result": ["prod"]});
        assert_eq!(check_reply(reply.clone()).unwrap(), reply);
    }

    #[test]
    fn check_reply_accepts_null_error() {
        let reply = json!({"result": true, "error": null});
        assert!(check_reply(reply).is_ok());
    }

    #[test]
    fn error_message_comes_from_data() {
        let reply = json!({"error": {
            "code": 200,
            "message": "Odoo Server Error",
            "data": {"name": "odoo.exceptions.AccessDenied", "message": "Access Denied"}
        }});
        let err = check_reply(reply).unwrap_err();
        match &err {
            DbError::Rpc { message, info } => {
                assert_eq!(message, "Access Denied");
                assert_eq!(info["data"]["name"], "odoo.exceptions.AccessDenied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Access Denied");
    }

    #[test]
    fn error_message_falls_back_to_top_level() {
        let reply = json!({"error": {"code": -32601, "message": "Method not found"}});
        let err = check_reply(reply).unwrap_err();
        assert!(matches!(err, DbError::Rpc { ref message, .. } if message == "Method not found"));
    }

    #[test]
    fn non_object_reply_is_rejected() {
        let err = parse_reply("[1, 2]").unwrap_err();
        assert!(matches!(err, DbError::Deserialization(_)));
        let err = parse_reply("not json").unwrap_err();
        assert!(matches!(err, DbError::Deserialization(_)));
    }

    #[test]
    fn decode_list_defaults_to_empty() {
        let names: Vec<String> = decode_list(&json!({"jsonrpc": "2.0"})).unwrap();
        assert!(names.is_empty());
        let names: Vec<String> = decode_list(&json!({"result": ["a", "b"]})).unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn decode_list_null_result_is_not_empty() {
        let err = decode_list::<String>(&json!({"result": null})).unwrap_err();
        assert!(matches!(err, DbError::Deserialization(_)));
    }

    #[test]
    fn decode_list_rejects_wrong_shape() {
        let err = decode_list::<String>(&json!({"result": "prod"})).unwrap_err();
        assert!(matches!(err, DbError::Deserialization(_)));
    }

    #[test]
    fn decode_required_reports_missing_result() {
        let err = decode_required::<bool>(&json!({}), "drop").unwrap_err();
        assert!(matches!(err, DbError::MissingResult("drop")));
    }

    #[test]
    fn dump_decodes_base64() {
        let dump = decode_dump(&json!({"result": "UEsDBA=="})).unwrap();
        assert_eq!(dump.as_bytes(), Some(&b"PK\x03\x04"[..]));
    }

    #[test]
    fn dump_rejects_invalid_base64() {
        let err = decode_dump(&json!({"result": "***"})).unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }
}
