//! Forwarded header normalization for applications behind a single load balancer.

pub mod config;
pub mod http;
pub mod normalize;
pub mod observability;
pub mod variables;

pub use config::AppConfig;
pub use http::HttpServer;
pub use normalize::{ForwardedHeaderNormalizer, RequestHook};
pub use variables::TransportVariables;
