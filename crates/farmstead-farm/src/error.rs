//! Error types for the `farmstead-farm` crate.

/// Errors raised while loading or checking game tables and rules.
#[derive(Debug, thiserror::Error)]
pub enum FarmError {
    /// A catalog table violates a structural invariant.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A rule value is out of range.
    #[error("invalid game rules: {0}")]
    InvalidRules(String),
}
