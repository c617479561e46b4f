//! # Collapse Error Types
//!
//! Everything that can go wrong is a setup problem: bad rule files, bad
//! saves. Simulation paths never return these.

use thiserror::Error;

/// Errors raised while loading rules or persisted state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollapseError {
    /// Invalid configuration value or rule file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two collapse recipes share a name.
    #[error("duplicate collapse recipe: {0}")]
    DuplicateRecipe(String),

    /// Persisted propagation data failed validation.
    #[error("corrupt propagation save: {0}")]
    CorruptSave(String),

    /// Reading or writing a file failed.
    #[error("i/o failure: {0}")]
    Io(String),
}

/// Result type for collapse setup operations.
pub type CollapseResult<T> = Result<T, CollapseError>;
