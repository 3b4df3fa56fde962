//! Forwarded header normalization.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ForwardedHeadersConfig.enabled?
//!     → no:  hook never installed
//!     → yes: check bag type for ReadOnlyToggle support
//!            → failure is fatal (StartupError)
//!            → ForwardedHeaderNormalizer
//!
//! Per request (RequestHook::begin_request):
//!     WritableScope::acquire(bag)
//!     → HTTP_X_FORWARDED_FOR:   nearest hop → REMOTE_ADDR, strip it from chain
//!     → HTTP_X_FORWARDED_PROTO: HTTPS / SERVER_PORT / SERVER_PORT_SECURE, drop header
//!     → HTTP_X_REQUESTED_WITH:  copy to X-Requested-With
//!     → scope dropped, read-only flag restored
//! ```
//!
//! # Design Decisions
//! - A single trusted hop: the rightmost chain entry is the client as seen by the balancer
//! - Malformed values are assigned as-is rather than rejected
//! - Missing headers leave existing fields alone

pub mod chain;
pub mod hook;
pub mod normalizer;

pub use chain::ForwardedChain;
pub use hook::RequestHook;
pub use normalizer::{ForwardedHeaderNormalizer, Normalized, StartupError};
