//! RPC method handler for the dotpush JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be tested without stdin/stdout.
//! `handle_method` dispatches one call to the `App`.

use serde_json::{json, Map, Value};

use crate::app::{is_practice_page, App};
use crate::services::language_classifier::classify;
use crate::services::page_snapshot::PageSnapshot;
use crate::types::message::{BackgroundEvent, BackgroundRequest};

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn snapshot_param(params: &Value) -> Result<PageSnapshot, String> {
    let snapshot = params.get("snapshot").cloned().ok_or("missing snapshot")?;
    serde_json::from_value(snapshot).map_err(|e| format!("invalid snapshot: {}", e))
}

/// Builds a `BackgroundRequest` from a method name and its params object.
fn background_request(method: &str, params: &Value) -> Result<BackgroundRequest, String> {
    let mut body = match params {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => return Err("params must be an object".to_string()),
    };
    body.insert("type".to_string(), json!(method));
    serde_json::from_value(Value::Object(body)).map_err(|e| format!("invalid {} request: {}", method, e))
}

/// Wire form of a background event: the event fields plus `"event": <name>`.
pub fn event_message(event: &BackgroundEvent) -> Value {
    let mut value = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        map.remove("type");
        map.insert("event".to_string(), json!(event.name()));
    }
    value
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Auth ───
        "auth.device-code" => {
            let session = app.request_device_code().await.map_err(|e| e.to_string())?;
            Ok(json!({
                "device_code": session.device_code,
                "user_code": session.user_code,
                "verification_uri": session.verification_uri,
                "expires_in": session.expires_in,
                "interval": session.interval,
                "client_id": app.settings.github.client_id,
            }))
        }
        "start-polling" | "stop-polling" => {
            let request = background_request(method, params)?;
            let session_id = app.handle_request(request).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "session_id": session_id}))
        }
        "auth.poller-status" => serde_json::to_value(app.poller.status()).map_err(|e| e.to_string()),
        "auth.status" => {
            let status = app.auth_status().await;
            serde_json::to_value(status).map_err(|e| e.to_string())
        }
        "auth.logout" => {
            app.logout().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Code ───
        "classify" => {
            let text = str_param(params, "text")?;
            Ok(json!({"language": classify(text)}))
        }
        "extract" => {
            let snapshot = snapshot_param(params)?;
            let result = app.extract(&snapshot);
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        "push" => {
            let snapshot = snapshot_param(params)?;
            let url = match params.get("url").and_then(|v| v.as_str()) {
                Some(url) => url.to_string(),
                None => snapshot.url.clone().ok_or("missing url")?,
            };
            if !is_practice_page(&url) {
                return Err("not a problem page".to_string());
            }
            let language = params.get("language").and_then(|v| v.as_str());
            let extraction = app.extract(&snapshot);
            let result = app
                .push_extraction(&extraction, &url, language)
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
