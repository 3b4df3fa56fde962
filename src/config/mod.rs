//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → FORWARDED_HEADERS_ENABLED env override
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → passed by value to subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Read once at startup; no hot reload
//! - All fields have defaults to allow minimal configs
//! - The normalization switch fails safe: anything but an explicit "true" disables it

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_switch, ConfigError, ENABLED_ENV};
pub use schema::{AppConfig, ForwardedHeadersConfig, ListenerConfig, LogFormat, ObservabilityConfig};
