//! Questions about the loaded orders, answered by a mocked Claude.

use axum::http::StatusCode;
use serde_json::json;
use urbannue_integration_tests::{TestApp, body_text};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_orders(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/orders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orders": [{
                "id": 7001,
                "name": "#2001",
                "total_price": "80.00",
                "currency": "EUR",
                "created_at": "2026-06-03T12:00:00Z",
                "financial_status": "paid",
                "line_items": [{"quantity": 2}]
            }]
        })))
        .mount(&app.shopify)
        .await;
}

fn text_reply(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "model": "claude-test",
        "stop_reason": "end_turn",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 120, "output_tokens": 12}
    })
}

#[tokio::test]
async fn test_question_is_answered_with_order_context() {
    let mut app = TestApp::spawn().await;
    mount_orders(&app).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(body_string_contains("#2001"))
        .and(body_string_contains("Which order is largest?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Order #2001 at EUR 80.00.")))
        .expect(1)
        .mount(&app.claude)
        .await;

    app.login_with_shop("brand").await;

    let response = app
        .post_form(
            "/assistant",
            &[("question", "Which order is largest?"), ("mode", "narrative")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Order #2001 at EUR 80.00."));
    assert!(html.contains("Which order is largest?"));
}

#[tokio::test]
async fn test_analysis_mode_runs_tools() {
    let mut app = TestApp::spawn().await;
    mount_orders(&app).await;

    // Second round: the tool result is in the conversation
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("tool_result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("One paid order, EUR 80.00 in total.")))
        .expect(1)
        .mount(&app.claude)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_00",
            "model": "claude-test",
            "stop_reason": "tool_use",
            "content": [{
                "type": "tool_use",
                "id": "toolu_01",
                "name": "order_metrics",
                "input": {}
            }],
            "usage": {"input_tokens": 150, "output_tokens": 20}
        })))
        .up_to_n_times(1)
        .mount(&app.claude)
        .await;

    app.login_with_shop("brand").await;

    let response = app
        .post_form(
            "/assistant",
            &[("question", "Summarize revenue"), ("mode", "analysis")],
        )
        .await;

    let html = body_text(response).await;
    assert!(html.contains("One paid order, EUR 80.00 in total."));
}

fn unknown_tool_call() -> serde_json::Value {
    json!({
        "id": "msg_loop",
        "model": "claude-test",
        "stop_reason": "tool_use",
        "content": [{
            "type": "tool_use",
            "id": "toolu_loop",
            "name": "forecast_revenue",
            "input": {}
        }],
        "usage": {"input_tokens": 150, "output_tokens": 20}
    })
}

#[tokio::test]
async fn test_tool_loop_stops_after_max_iterations() {
    let mut app = TestApp::spawn().await;
    mount_orders(&app).await;

    // Follow-up rounds carry the failed tool result back to the model
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("\"is_error\":true"))
        .and(body_string_contains("unknown tool: forecast_revenue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unknown_tool_call()))
        .expect(4)
        .mount(&app.claude)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unknown_tool_call()))
        .expect(1)
        .mount(&app.claude)
        .await;

    app.login_with_shop("brand").await;

    let response = app
        .post_form(
            "/assistant",
            &[("question", "Forecast next month"), ("mode", "analysis")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("the analysis took too many steps"));

    app.claude.verify().await;
}

#[tokio::test]
async fn test_llm_failure_is_shown_as_text() {
    let mut app = TestApp::spawn().await;
    mount_orders(&app).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .mount(&app.claude)
        .await;

    app.login_with_shop("brand").await;

    let response = app
        .post_form("/assistant", &[("question", "How are sales?")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("The assistant could not answer"));
    assert!(html.contains("Overloaded"));
}

#[tokio::test]
async fn test_empty_question_never_reaches_llm() {
    let mut app = TestApp::spawn().await;
    mount_orders(&app).await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("unused")))
        .expect(0)
        .mount(&app.claude)
        .await;

    app.login_with_shop("brand").await;

    let response = app.post_form("/assistant", &[("question", "   ")]).await;
    let html = body_text(response).await;
    assert!(html.contains("please type a question first"));
}

#[tokio::test]
async fn test_question_without_shop() {
    let mut app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .post_form("/assistant", &[("question", "How are sales?")])
        .await;
    let html = body_text(response).await;
    assert!(html.contains("Connect a Shopify store before asking a question."));
}

#[tokio::test]
async fn test_stream_yields_deltas_then_done() {
    let mut app = TestApp::spawn().await;
    mount_orders(&app).await;

    let sse = [
        r#"{"type":"message_start","message":{"id":"msg_02","model":"claude-test","usage":{"input_tokens":90,"output_tokens":1}}}"#,
        r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
        r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Sales are "}}"#,
        r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"steady.\r\nUp 5%."}}"#,
        r#"{"type":"content_block_stop","index":0}"#,
        r#"{"type":"message_stop"}"#,
    ]
    .iter()
    .map(|data| format!("data: {data}\n\n"))
    .collect::<String>();

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("\"stream\":true"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .expect(1)
        .mount(&app.claude)
        .await;

    app.login_with_shop("brand").await;

    let response = app
        .post_json("/api/assistant/stream", &json!({"question": "How are sales?"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("event: delta"));
    assert!(body.contains(r#"data: "Sales are ""#));
    assert!(body.contains(r#"data: "steady.\r\nUp 5%.""#));
    assert!(!body.contains('\r'));
    assert!(body.contains("event: done"));
    assert!(!body.contains("event: error"));
}

#[tokio::test]
async fn test_stream_without_shop_is_bad_request() {
    let mut app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .post_json("/api/assistant/stream", &json!({"question": "How are sales?"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_rejects_overlong_question_as_event() {
    let mut app = TestApp::spawn().await;
    mount_orders(&app).await;
    app.login_with_shop("brand").await;

    let question = "a".repeat(2001);
    let response = app
        .post_json("/api/assistant/stream", &json!({"question": question}))
        .await;

    let body = body_text(response).await;
    assert!(body.contains("event: error"));
    assert!(body.contains("questions are limited to 2000 characters"));
}
