//! Per-request transport variables.
//!
//! # Data Flow
//! ```text
//! Inbound request (connection info + headers)
//!     → http::variables (build bag, CGI naming, mark read-only)
//!     → request extensions
//!     → normalize (WritableScope: toggle, rewrite, restore)
//!     → application handlers (read-only view)
//! ```
//!
//! # Design Decisions
//! - Names are matched case-insensitively, stored as first written
//! - Insertion order is preserved for diagnostic dumps
//! - Mutability is an explicit capability (`ReadOnlyToggle`), never implied

pub mod bag;
pub mod names;
pub mod scope;

pub use bag::{ReadOnlyToggle, TransportVariables, VariableBag, VariablesError};
pub use scope::WritableScope;
