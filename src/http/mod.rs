//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (ConnectInfo<SocketAddr>)
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → variables.rs (build read-only TransportVariables bag)
//!     → forwarded.rs (begin-request hook, header sync)   [only when enabled]
//!     → details.rs / application handlers
//! ```

pub mod details;
pub mod forwarded;
pub mod server;
pub mod variables;

pub use forwarded::{ForwardedHeaders, ForwardedHeadersLayer};
pub use server::HttpServer;
pub use variables::{TransportVariablesLayer, TransportVariablesService};
