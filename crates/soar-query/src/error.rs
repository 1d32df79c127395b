//! Error types for attribute construction, walking and rendering.

use crate::attrs::AttrKind;
use thiserror::Error;

/// Result type alias for soar-query operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a leaf attribute.
#[derive(Debug, Error)]
pub enum AttrError {
    /// Time string in none of the accepted layouts
    #[error("Invalid time '{input}': expected YYYY-MM-DD[ HH:MM:SS] or RFC 3339")]
    InvalidTime { input: String },

    /// Time range whose end precedes its start
    #[error("End time {end} is before start time {start}")]
    TimeOrder { start: String, end: String },

    /// Wavelength bound that is NaN or infinite
    #[error("Invalid wavelength bound: {0}")]
    InvalidWavelength(f64),

    /// Attribute tree JSON that could not be decoded
    #[error("Invalid attribute tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the walker's dispatch tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    /// No creator registered for a node kind
    #[error("No creator registered for {kind} attributes")]
    NoCreator { kind: AttrKind },

    /// No applier registered for a node kind
    #[error("No applier registered for {kind} attributes")]
    NoApplier { kind: AttrKind },

    /// A handler was registered for a kind it cannot format
    #[error("Handler for {expected} attributes received a {found} attribute")]
    UnexpectedAttr { expected: AttrKind, found: AttrKind },
}

/// Errors raised while rendering parameter groups into requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Group with no parameters; the archive rejects an empty WHERE clause
    #[error("Parameter group {index} is empty")]
    EmptyGroup { index: usize },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
