//! pdkit-mcp — agent-tool protocol server.
//!
//! Speaks newline-delimited JSON-RPC 2.0 over stdio and exposes the same
//! seven operations as the CLI. Operation failures travel inside normal
//! responses as structured payloads; protocol-level errors are reserved
//! for malformed requests and unknown methods. Stdout carries the wire
//! format only, so logging goes to stderr.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, Level};

use pdkit::{tools, ToolContext};

const PROTOCOL_VERSION: &str = "2024-11-05";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pdkit::logging::init_tracing(Level::INFO);
    let ctx = ToolContext::from_env();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(request) => handle_request(&ctx, &request).await,
            Err(e) => Some(error_response(
                Value::Null,
                -32700,
                format!("Parse error: {e}"),
            )),
        };

        if let Some(response) = response {
            let mut wire = serde_json::to_string(&response)?;
            wire.push('\n');
            stdout.write_all(wire.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

/// Handles one decoded request. Returns `None` for notifications, which
/// get no response by the JSON-RPC contract.
async fn handle_request(ctx: &ToolContext, request: &Value) -> Option<Value> {
    let method = request["method"].as_str().unwrap_or_default();
    let id = match request.get("id") {
        Some(id) if !id.is_null() => id.clone(),
        _ => {
            debug!(method, "notification received");
            return None;
        }
    };

    let result = match method {
        "initialize" => json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "pdkit",
                "version": env!("CARGO_PKG_VERSION"),
            },
        }),
        "ping" => json!({}),
        "tools/list" => {
            let tools: Vec<Value> = tools::tool_specs()
                .into_iter()
                .map(|spec| {
                    json!({
                        "name": spec.name,
                        "description": spec.description,
                        "inputSchema": spec.input_schema,
                    })
                })
                .collect();
            json!({ "tools": tools })
        }
        "tools/call" => {
            let params = request.get("params").cloned().unwrap_or(json!({}));
            let Some(name) = params["name"].as_str() else {
                return Some(error_response(
                    id,
                    -32602,
                    "Invalid params: missing tool name".to_string(),
                ));
            };
            let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

            debug!(tool = name, "tool call");
            let outcome = tools::call_tool(ctx, name, &arguments).await;

            // Operation failures are normal responses, not protocol errors
            json!({
                "content": [{
                    "type": "text",
                    "text": outcome.to_string(),
                }],
                "isError": false,
            })
        }
        _ => {
            return Some(error_response(
                id,
                -32601,
                format!("Method not found: {method}"),
            ))
        }
    };

    Some(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdkit::platform::{OsFamily, Platform};

    fn fixture_ctx(root: &std::path::Path) -> ToolContext {
        ToolContext::with_roots(
            Platform {
                os: OsFamily::Linux,
                arch: "x86_64",
                distro: None,
            },
            root.join("sdk"),
            root.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let root = tempfile::tempdir().unwrap();
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} });

        let response = handle_request(&fixture_ctx(root.path()), &request)
            .await
            .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "pdkit");
    }

    #[tokio::test]
    async fn test_tools_list_enumerates_seven() {
        let root = tempfile::tempdir().unwrap();
        let request = json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" });

        let response = handle_request(&fixture_ctx(root.path()), &request)
            .await
            .unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let root = tempfile::tempdir().unwrap();
        let request = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });

        assert!(handle_request(&fixture_ctx(root.path()), &request)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_is_protocol_error() {
        let root = tempfile::tempdir().unwrap();
        let request = json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/list" });

        let response = handle_request(&fixture_ctx(root.path()), &request)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_failed_operation_is_normal_response() {
        let root = tempfile::tempdir().unwrap();
        let request = json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "create", "arguments": {} },
        });

        let response = handle_request(&fixture_ctx(root.path()), &request)
            .await
            .unwrap();
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], false);

        let payload: Value = serde_json::from_str(
            response["result"]["content"][0]["text"].as_str().unwrap(),
        )
        .unwrap();
        assert_eq!(payload["success"], false);
    }
}
