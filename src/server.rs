//! Line-delimited JSON-RPC 2.0 over a byte stream.
//!
//! Handles `initialize`, `tools/list` and `tools/call`. Messages without an
//! `id` are notifications and get no reply.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::{tools, JiraAnalytics};

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Answer one raw message line. `None` for notifications.
pub async fn handle_line(service: &JiraAnalytics, line: &str) -> Option<Value> {
    let message: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("Failed to parse message: {e}");
            return to_value(Response::err(Value::Null, PARSE_ERROR, e.to_string()));
        }
    };
    // Valid JSON that is not a request object
    let request: Request = match Request::deserialize(&message) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("Invalid request: {e}");
            let id = message.get("id").cloned().unwrap_or(Value::Null);
            return to_value(Response::err(id, INVALID_REQUEST, e.to_string()));
        }
    };

    let Some(id) = request.id else {
        log::debug!("Notification: {}", request.method);
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => Response::ok(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "tools/list" => Response::ok(id, json!({ "tools": tools::definitions() })),
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            match serde_json::from_value::<CallParams>(params) {
                Ok(call) => {
                    log::info!("Calling tool {}", call.name);
                    let args = call.arguments.unwrap_or_else(|| json!({}));
                    let output = service.call_tool(&call.name, args).await;
                    match serde_json::to_value(output) {
                        Ok(v) => Response::ok(id, v),
                        Err(e) => Response::err(id, INTERNAL_ERROR, e.to_string()),
                    }
                }
                Err(e) => Response::err(id, INVALID_PARAMS, e.to_string()),
            }
        }
        other => Response::err(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
    };
    to_value(response)
}

/// Read requests until EOF, writing one response line per request.
pub async fn serve<R, W>(service: &JiraAnalytics, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = handle_line(service, &line).await {
            let mut out = serde_json::to_string(&reply)?;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
    }
    log::debug!("Input closed, shutting down");
    Ok(())
}

fn to_value(response: Response) -> Option<Value> {
    serde_json::to_value(response).ok()
}
