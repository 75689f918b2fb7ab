//! Shared building blocks for the typeroute workspace: the error taxonomy,
//! diagnostics, logging macros and the runtime `Value` model that the
//! literal synthesizer consumes.

#[macro_use]
pub mod macros;

pub mod diagnostics;
pub mod error;
pub mod value;

// Re-export commonly used items for convenience
pub use eyre;
pub use tracing;

pub use diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticManager};
pub use error::{ErrorKind, Location};
pub use value::{Value, ValueMap};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
