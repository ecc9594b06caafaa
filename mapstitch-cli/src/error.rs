//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] mapstitch::ConfigError),

    #[error(transparent)]
    Render(#[from] mapstitch::RenderError),

    #[error(transparent)]
    Viewport(#[from] mapstitch::viewport::ViewportError),

    /// An element reference argument that is not `kind/id`.
    #[error("invalid element reference `{0}`, expected node/ID, way/ID or relation/ID")]
    InvalidElement(String),

    /// A color argument that is neither a known name nor a hex string.
    #[error("unrecognized color `{0}`")]
    InvalidColor(String),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
