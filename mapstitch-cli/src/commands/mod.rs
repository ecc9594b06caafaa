//! CLI command implementations.

pub mod element;
pub mod viewport;

use std::path::Path;

use mapstitch::{PixmapCanvas, RenderFailure};

use crate::error::CliError;

/// Writes the finished canvas and reports collected failures.
fn finish(canvas: &PixmapCanvas, failures: &[RenderFailure], output: &Path) -> Result<(), CliError> {
    for failure in failures {
        eprintln!("warning: {}", failure);
    }
    std::fs::write(output, canvas.encode_png().map_err(mapstitch::RenderError::from)?)?;
    println!("Wrote {}", output.display());
    Ok(())
}
