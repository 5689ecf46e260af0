/// End-to-end tests: MCP client lines in, mock backend behind the HTTP client
use std::sync::Arc;

use gigahard_mcp::mcp::protocol::{error_codes, JsonRpcResponse};
use gigahard_mcp::*;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[cfg(test)]
mod proxy_integration_tests {
    use super::*;

    fn http_server(base_url: &str, mcp_id: Option<&str>) -> McpServer<HttpBackend> {
        let config = Config::new(ConfigInput {
            backend_url: Some(base_url.to_string()),
            api_key: Some("gh-test-key".to_string()),
            mcp_id: mcp_id.map(str::to_string),
            ..Default::default()
        })
        .expect("valid config");
        let backend = HttpBackend::new(Arc::new(config)).expect("backend");
        McpServer::new(backend)
    }

    /// Feed request lines to the server and collect every response by id
    async fn exchange(server: McpServer<HttpBackend>, requests: &[Value]) -> Vec<JsonRpcResponse> {
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);

        for request in requests {
            let line = format!("{}\n", request);
            client_in.write_all(line.as_bytes()).await.expect("write request");
        }
        drop(client_in);

        server.serve(server_in, server_out).await.expect("serve");

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.expect("read responses");
        output
            .lines()
            .map(|l| serde_json::from_str(l).expect("response json"))
            .collect()
    }

    fn by_id(responses: &[JsonRpcResponse], id: i64) -> &JsonRpcResponse {
        responses
            .iter()
            .find(|r| r.id == json!(id))
            .expect("response for id")
    }

    #[tokio::test]
    async fn test_list_tools_exposes_machine_names() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mcp/list-tools"))
            .and(header("x-mcp-api-key", "gh-test-key"))
            .and(query_param("mcpId", "workspace-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tools": [{"name": "Get Weather", "description": "x"}]
            })))
            .expect(1)
            .mount(&backend)
            .await;

        let server = http_server(&backend.uri(), Some("workspace-7"));
        let responses = exchange(
            server,
            &[json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})],
        )
        .await;

        let result = by_id(&responses, 1).result.as_ref().expect("result");
        assert_eq!(result["tools"][0]["name"], "get_weather");
        assert_eq!(result["tools"][0]["description"], "x");
    }

    #[tokio::test]
    async fn test_call_tool_forwards_human_name() {
        let backend = MockServer::start().await;
        let arguments = json!({"location": {"city": "Lisbon"}, "days": 3});

        Mock::given(method("POST"))
            .and(path("/api/mcp/call-tool"))
            .and(body_json(json!({"toolName": "Get Weather", "arguments": arguments.clone()})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "sunny"}]
            })))
            .expect(1)
            .mount(&backend)
            .await;

        let server = http_server(&backend.uri(), None);
        let responses = exchange(
            server,
            &[json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "get_weather", "arguments": arguments}
            })],
        )
        .await;

        let result = by_id(&responses, 2).result.as_ref().expect("result");
        assert_eq!(result, &json!({"content": [{"type": "text", "text": "sunny"}]}));
    }

    #[tokio::test]
    async fn test_backend_failures_surface_as_internal_errors() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/call-tool"))
            .and(body_json(json!({"toolName": "Limited", "arguments": {}})))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "rate limited"})))
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/call-tool"))
            .and(body_json(json!({"toolName": "Down", "arguments": {}})))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&backend)
            .await;

        let server = http_server(&backend.uri(), None);
        let call = |id: i64, name: &str| {
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": {"name": name, "arguments": {}}
            })
        };
        let responses = exchange(server, &[call(1, "limited"), call(2, "down")]).await;

        let limited = by_id(&responses, 1).error.as_ref().expect("error");
        assert_eq!(limited.code, error_codes::INTERNAL_ERROR);
        assert_eq!(limited.message, "rate limited");

        let down = by_id(&responses, 2).error.as_ref().expect("error");
        assert_eq!(down.code, error_codes::INTERNAL_ERROR);
        assert_eq!(down.message, "Backend error: Service Unavailable");
        assert_eq!(down.data.as_ref().expect("data")["status"], 503);
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_later_requests() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mcp/list-tools"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .up_to_n_times(1)
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/mcp/list-tools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": []})))
            .mount(&backend)
            .await;

        let server = http_server(&backend.uri(), None);
        let first = server.list_tools().await;
        let err = first.expect_err("first call fails");
        assert_eq!(err.to_string(), "Backend error: Bad Gateway - upstream down");

        let second = server.list_tools().await.expect("second call succeeds");
        assert_eq!(second, json!({"tools": []}));
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_connectivity() {
        let server = http_server("http://127.0.0.1:1", None);
        let responses = exchange(
            server,
            &[json!({"jsonrpc": "2.0", "id": 5, "method": "tools/list"})],
        )
        .await;

        let error = by_id(&responses, 5).error.as_ref().expect("error");
        assert_eq!(error.code, error_codes::INTERNAL_ERROR);
        assert!(error.message.starts_with("Failed to connect to backend: "));
        assert_eq!(error.data.as_ref().expect("data")["kind"], "connectivity");
    }

    #[tokio::test]
    async fn test_handshake_then_tools() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mcp/list-tools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tools": [{"name": "Create Issue", "inputSchema": {"type": "object"}}]
            })))
            .mount(&backend)
            .await;

        let server = http_server(&backend.uri(), None);
        let responses = exchange(
            server,
            &[
                json!({
                    "jsonrpc": "2.0",
                    "id": 0,
                    "method": "initialize",
                    "params": {
                        "protocolVersion": "2025-03-26",
                        "capabilities": {},
                        "clientInfo": {"name": "integration", "version": "0.0.1"}
                    }
                }),
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
            ],
        )
        .await;

        assert_eq!(responses.len(), 2);
        let init = by_id(&responses, 0).result.as_ref().expect("init result");
        assert_eq!(init["protocolVersion"], "2025-03-26");
        assert_eq!(init["serverInfo"]["name"], "gigahard-mcp-server");

        let list = by_id(&responses, 1).result.as_ref().expect("list result");
        assert_eq!(list["tools"][0]["name"], "create_issue");
    }
}
