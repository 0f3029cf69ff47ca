mod common;
use common::{harness, settings, StubTransport};

use nextdns_mcp::app::App;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io::Write;

async fn rpc(h: &common::Harness, frame: Value) -> Value {
    let server = h.app.mcp_server();
    let response = server
        .handle_frame(&frame.to_string())
        .await
        .expect("response");
    serde_json::to_value(response).unwrap()
}

fn tool_call(name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments},
    })
}

#[tokio::test]
async fn tools_list_has_bulk_and_dns_tools_but_no_excluded_routes() {
    let h = harness(&[]);
    let response = rpc(&h, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await;

    let names: Vec<String> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap().to_string())
        .collect();
    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len());

    for expected in [
        "listProfiles",
        "getDenylist",
        "addToDenylist",
        "updateDenylist",
        "updateAllowlist",
        "updateParentalControlServices",
        "updateParentalControlCategories",
        "updateSecurityTlds",
        "updatePrivacyBlocklists",
        "updatePrivacyNatives",
        "dohLookup",
    ] {
        assert!(unique.contains(&expected.to_string()), "{expected}");
    }
    for excluded in [
        "replaceDenylist",
        "replacePrivacyNatives",
        "streamLogs",
        "getAnalyticsDomainsSeries",
    ] {
        assert!(!unique.contains(&excluded.to_string()), "{excluded}");
    }
}

#[tokio::test]
async fn undeclared_arguments_are_dropped_before_dispatch() {
    let h = harness(&[]);
    let response = rpc(
        &h,
        tool_call(
            "addToDenylist",
            json!({"profile_id": "abc123", "id": "ads.example.com", "verbose": true, "note": "x"}),
        ),
    )
    .await;

    assert_eq!(response["result"]["isError"], json!(false));
    let request = h.api.last();
    assert_eq!(request.path, "/profiles/abc123/denylist");
    assert_eq!(request.body, Some(json!({"id": "ads.example.com"})));
}

#[tokio::test]
async fn query_parameters_are_rendered() {
    let h = harness(&[]);
    rpc(
        &h,
        tool_call(
            "getAnalyticsDomains",
            json!({"profile_id": "abc123", "from": "-7d", "limit": 10, "root": null}),
        ),
    )
    .await;

    let request = h.api.last();
    assert_eq!(request.path, "/profiles/abc123/analytics/domains");
    let query: HashSet<(String, String)> = request.query.into_iter().collect();
    assert_eq!(
        query,
        HashSet::from([
            ("from".to_string(), "-7d".to_string()),
            ("limit".to_string(), "10".to_string()),
        ])
    );
    assert!(request.body.is_none());
}

#[tokio::test]
async fn denial_is_tool_output_with_error_flag() {
    let h = harness(&[("NEXTDNS_READ_ONLY", "yes")]);
    let response = rpc(&h, tool_call("deleteProfile", json!({"profile_id": "abc123"}))).await;

    let result = &response["result"];
    assert_eq!(result["isError"], json!(true));
    let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(
        text,
        json!({
            "error": "Write operation denied: server is in read-only mode",
            "profile_id": "abc123",
        })
    );
    assert_eq!(h.api.calls(), 0);
}

#[tokio::test]
async fn unknown_tool_suggests_close_names() {
    let h = harness(&[]);
    let response = rpc(&h, tool_call("getDenylst", json!({}))).await;

    assert_eq!(response["error"]["code"], json!(-32602));
    let message = response["error"]["message"].as_str().unwrap();
    assert!(message.contains("Unknown tool: getDenylst"), "{message}");
    assert!(message.contains("getDenylist"), "{message}");
}

#[tokio::test]
async fn path_parameters_with_separators_are_rejected() {
    let h = harness(&[]);
    let response = rpc(
        &h,
        tool_call("getProfile", json!({"profile_id": "abc123/../other"})),
    )
    .await;

    assert_eq!(response["error"]["code"], json!(-32602));
    assert_eq!(h.api.calls(), 0);
}

#[tokio::test]
async fn dot_segments_cannot_retarget_an_entry_removal() {
    let h = harness(&[]);
    for entry_id in ["..", "%2e%2e", "%2E."] {
        let response = rpc(
            &h,
            tool_call(
                "removeFromDenylist",
                json!({"profile_id": "abc123", "entry_id": entry_id}),
            ),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(-32602), "{entry_id}");
    }
    assert_eq!(h.api.calls(), 0);
}

#[tokio::test]
async fn missing_default_profile_is_reported_by_dns_lookup() {
    let h = harness(&[]);
    let response = rpc(&h, tool_call("dohLookup", json!({"domain": "example.com"}))).await;

    let text: Value = serde_json::from_str(
        response["result"]["content"][0]["text"].as_str().unwrap(),
    )
    .unwrap();
    assert_eq!(
        text["error"],
        "No profile_id provided and NEXTDNS_DEFAULT_PROFILE not set"
    );
    assert_eq!(h.resolver.calls(), 0);
}

#[tokio::test]
async fn dns_lookup_uses_default_profile() {
    let h = harness(&[("NEXTDNS_DEFAULT_PROFILE", "def456")]);
    let response = rpc(
        &h,
        tool_call("dohLookup", json!({"domain": "example.com", "record_type": "aaaa"})),
    )
    .await;

    assert_eq!(response["result"]["isError"], json!(false));
    let request = h.resolver.last();
    assert_eq!(request.path, "/def456/dns-query");
    assert!(request
        .query
        .contains(&("type".to_string(), "AAAA".to_string())));
}

#[test]
fn colliding_tool_names_fail_startup() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
openapi: 3.0.0
info:
  title: collision
  version: "1"
paths:
  /profiles/{{profile_id}}/extra:
    post:
      operationId: updateDenylist
      parameters:
        - name: profile_id
          in: path
          required: true
          schema:
            type: string
      responses:
        "200":
          description: ok
"#
    )
    .unwrap();
    let path = file.path().to_string_lossy().to_string();

    let settings = settings(&[("NEXTDNS_OPENAPI_PATH", path.as_str())]);
    let result = App::with_transports(&settings, StubTransport::new(), StubTransport::new());
    let err = result.err().expect("duplicate tool name must fail");
    assert!(err.message.contains("Duplicate tool name: updateDenylist"));
}
