//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use axum::{Extension, Router};
use forwarded_normalizer::config::AppConfig;
use forwarded_normalizer::HttpServer;
use serde_json::Value;

/// Address the mock balancer connects from.
pub const BALANCER_ADDR: &str = "10.0.0.254:51000";

/// Address the server pretends to listen on.
pub const LOCAL_ADDR: &str = "10.0.0.5:8080";

/// Configuration with the normalizer switched on.
pub fn enabled_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.forwarded_headers.enabled = true;
    config
}

/// Router as served, with the connection coming from [`BALANCER_ADDR`].
pub fn router(config: AppConfig) -> Router {
    let server = HttpServer::new(config).unwrap();
    let balancer: SocketAddr = BALANCER_ADDR.parse().unwrap();
    server
        .router(LOCAL_ADDR.parse().unwrap())
        .layer(Extension(ConnectInfo(balancer)))
}

/// GET `/_details.json` with the given headers.
pub fn details_request(headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/_details.json")
        .header("Host", "shop.example.com");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Value of the request header `name` as echoed in a details dump.
pub fn echoed_header<'a>(details: &'a Value, name: &str) -> Option<&'a str> {
    details["headers"]
        .as_array()?
        .iter()
        .find(|pair| pair[0] == name)
        .and_then(|pair| pair[1].as_str())
}
