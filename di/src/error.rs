//! Error types surfaced by the resolution engine.

use thiserror::Error;

/// Errors produced while resolving or constructing services.
///
/// A missing binding is deliberately *not* an error: under
/// [`ResolutionMode::BoundOnly`](crate::ResolutionMode) an unmatched request
/// resolves to an explicit empty result so call sites can branch on absence.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// A type could not be constructed: implicit construction was attempted on
  /// a type with no usable constructor, a factory callback failed, or a
  /// constructor dependency could not be satisfied. The in-flight object
  /// graph is abandoned; no partial graph is returned.
  #[error("construction of `{type_name}` failed: {reason}")]
  Construction {
    type_name: &'static str,
    reason: String,
  },

  /// Constructor recursion revisited a type already being constructed on the
  /// current resolution stack.
  #[error("circular dependency detected while resolving `{key}` (chain: {chain})")]
  CircularDependency { key: String, chain: String },

  /// A type-erased seam received a value of an unexpected type, e.g. a
  /// mis-declared injection point or an extension substituting an instance
  /// of the wrong concrete type.
  #[error("type mismatch at {context}: expected `{expected}`")]
  TypeMismatch {
    expected: &'static str,
    context: String,
  },
}

impl ResolveError {
  /// Shorthand for [`ResolveError::Construction`] with a formatted reason.
  pub fn construction(type_name: &'static str, reason: impl Into<String>) -> Self {
    ResolveError::Construction {
      type_name,
      reason: reason.into(),
    }
  }
}
