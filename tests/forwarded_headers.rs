//! Router-level tests of the begin-request hook.

use axum::http::StatusCode;
use forwarded_normalizer::config::AppConfig;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_chain_and_proto_are_normalized() {
    let app = common::router(common::enabled_config());

    let response = app
        .oneshot(common::details_request(&[
            ("X-Forwarded-For", "198.51.100.1, 203.0.113.7"),
            ("X-Forwarded-Proto", "HTTPS"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let details = common::body_json(response).await;
    let vars = &details["variables"];
    assert_eq!(vars["REMOTE_ADDR"], "203.0.113.7");
    assert_eq!(vars["HTTP_X_FORWARDED_FOR"], "198.51.100.1");
    assert!(vars.get("HTTP_X_FORWARDED_PROTO").is_none());
    assert_eq!(vars["HTTPS"], "on");
    assert_eq!(vars["SERVER_PORT"], "443");
    assert_eq!(vars["SERVER_PORT_SECURE"], "1");

    assert_eq!(details["secure"], true);
    assert_eq!(details["remote_addr"], "203.0.113.7");
    assert_eq!(details["url"], "https://shop.example.com/_details.json");

    assert_eq!(common::echoed_header(&details, "x-forwarded-for"), Some("198.51.100.1"));
    assert_eq!(common::echoed_header(&details, "x-forwarded-proto"), None);
}

#[tokio::test]
async fn test_single_hop_consumes_forwarded_for() {
    let app = common::router(common::enabled_config());

    let response = app
        .oneshot(common::details_request(&[
            ("X-Forwarded-For", "203.0.113.7"),
            ("X-Forwarded-Proto", "http"),
        ]))
        .await
        .unwrap();

    let details = common::body_json(response).await;
    let vars = &details["variables"];
    assert_eq!(vars["REMOTE_ADDR"], "203.0.113.7");
    assert!(vars.get("HTTP_X_FORWARDED_FOR").is_none());
    assert_eq!(vars["HTTPS"], "off");
    assert_eq!(vars["SERVER_PORT"], "80");
    assert_eq!(vars["SERVER_PORT_SECURE"], "0");
    assert_eq!(details["url"], "http://shop.example.com/_details.json");
    assert_eq!(common::echoed_header(&details, "x-forwarded-for"), None);
}

#[tokio::test]
async fn test_direct_request_keeps_connection_values() {
    let app = common::router(common::enabled_config());

    let response = app.oneshot(common::details_request(&[])).await.unwrap();

    let details = common::body_json(response).await;
    let vars = &details["variables"];
    assert_eq!(vars["REMOTE_ADDR"], "10.0.0.254");
    assert_eq!(vars["HTTPS"], "off");
    assert_eq!(vars["SERVER_PORT"], "8080");
    assert_eq!(details["url"], "http://shop.example.com:8080/_details.json");
}

#[tokio::test]
async fn test_ajax_marker_is_copied() {
    let app = common::router(common::enabled_config());

    let response = app
        .oneshot(common::details_request(&[
            ("X-Forwarded-For", "203.0.113.7"),
            ("X-Requested-With", "XMLHttpRequest"),
        ]))
        .await
        .unwrap();

    let details = common::body_json(response).await;
    assert_eq!(details["variables"]["X-Requested-With"], "XMLHttpRequest");
    assert_eq!(
        common::echoed_header(&details, "x-requested-with"),
        Some("XMLHttpRequest")
    );
}

#[tokio::test]
async fn test_disabled_switch_leaves_request_alone() {
    let app = common::router(AppConfig::default());

    let response = app
        .oneshot(common::details_request(&[
            ("X-Forwarded-For", "203.0.113.7"),
            ("X-Forwarded-Proto", "https"),
        ]))
        .await
        .unwrap();

    let details = common::body_json(response).await;
    let vars = &details["variables"];
    assert_eq!(vars["REMOTE_ADDR"], "10.0.0.254");
    assert_eq!(vars["HTTP_X_FORWARDED_FOR"], "203.0.113.7");
    assert_eq!(vars["HTTP_X_FORWARDED_PROTO"], "https");
    assert_eq!(vars["HTTPS"], "off");
    assert!(vars.get("X-Requested-With").is_none());
}

#[tokio::test]
async fn test_header_sync_can_be_turned_off() {
    let mut config = common::enabled_config();
    config.forwarded_headers.sync_request_headers = false;
    let app = common::router(config);

    let response = app
        .oneshot(common::details_request(&[
            ("X-Forwarded-For", "198.51.100.1, 203.0.113.7"),
            ("X-Forwarded-Proto", "https"),
        ]))
        .await
        .unwrap();

    let details = common::body_json(response).await;
    assert_eq!(details["variables"]["REMOTE_ADDR"], "203.0.113.7");
    assert_eq!(
        common::echoed_header(&details, "x-forwarded-for"),
        Some("198.51.100.1, 203.0.113.7")
    );
    assert_eq!(common::echoed_header(&details, "x-forwarded-proto"), Some("https"));
}

#[tokio::test]
async fn test_plain_text_dump() {
    let app = common::router(common::enabled_config());

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/_details?lang=en")
                .header("Host", "shop.example.com")
                .header("X-Forwarded-For", "203.0.113.7")
                .header("X-Forwarded-Proto", "https")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("Url: https://shop.example.com/_details?lang=en"));
    assert!(text.contains("Remote address: 203.0.113.7"));
    assert!(text.contains("### Query string\nlang: en\n"));
}

#[tokio::test]
async fn test_posted_form_and_cookies_are_listed() {
    let app = common::router(common::enabled_config());

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/_details.json?step=2")
                .header("Host", "shop.example.com")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .header("Cookie", "session=abc; theme=dark")
                .header("X-Forwarded-For", "203.0.113.7")
                .body(axum::body::Body::from("item=42&note=gift+wrap"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let details = common::body_json(response).await;
    assert_eq!(details["variables"]["REQUEST_METHOD"], "POST");
    assert_eq!(details["variables"]["REMOTE_ADDR"], "203.0.113.7");
    assert_eq!(details["read_only"], true);
    assert_eq!(
        details["form"],
        serde_json::json!([["item", "42"], ["note", "gift wrap"]])
    );
    assert_eq!(details["query"], serde_json::json!([["step", "2"]]));
    assert_eq!(
        details["cookies"],
        serde_json::json!([["session", "abc"], ["theme", "dark"]])
    );
}

#[tokio::test]
async fn test_plain_text_dump_of_posted_form() {
    let app = common::router(common::enabled_config());

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/_details")
                .header("Host", "shop.example.com")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .header("Cookie", "session=abc")
                .body(axum::body::Body::from("item=42"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("Read-only variables: true"));
    assert!(text.contains("### Form variables\nitem: 42\n"));
    assert!(text.contains("### Cookies\nsession: abc\n"));
}

#[tokio::test]
async fn test_failed_request_leaves_next_bag_read_only() {
    let app = common::router(common::enabled_config());

    let failed = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri("/_error")
                .header("Host", "shop.example.com")
                .header("X-Forwarded-For", "198.51.100.1")
                .header("X-Forwarded-Proto", "https")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .oneshot(common::details_request(&[("X-Forwarded-For", "203.0.113.9")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let details = common::body_json(response).await;
    assert_eq!(details["read_only"], true);
    assert_eq!(details["variables"]["REMOTE_ADDR"], "203.0.113.9");
    assert_eq!(details["variables"]["HTTPS"], "off");
}
