//! Error types for fastanim
//!
//! Most "failures" in the update engine are expected absences (a missing
//! @keyframes rule, an unresolvable timeline name, a value pair with no
//! smooth interpolation) and are modelled as control flow, not errors: the
//! relevant animation or transition is simply omitted or cancelled.
//!
//! The error type below covers the public API surface only: handing the host
//! an id it never issued, or committing an update against the wrong element.
//! All errors use the `thiserror` crate for minimal boilerplate.

use thiserror::Error;

/// Result type alias for fastanim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for fastanim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// An element id that was never issued by this host, or has been removed.
  #[error("unknown element id {0}")]
  UnknownElement(u32),

  /// An animation id that was never issued by this host.
  #[error("unknown animation id {0}")]
  UnknownAnimation(u32),

  /// A timeline id that was never issued by this host.
  #[error("unknown timeline id {0}")]
  UnknownTimeline(u32),
}
