//! Render the bare tile mosaic for an explicit viewport.

use std::path::PathBuf;

use clap::Args;
use mapstitch::{MapRenderer, RenderConfig, Viewport};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ViewportArgs {
    /// Viewport fragment, such as `#map=16/40.7128/-74.0060`. A full OSM
    /// URL containing the fragment works too.
    pub fragment: String,

    /// Output PNG path
    #[arg(short, long, default_value = "map.png")]
    pub output: PathBuf,
}

pub async fn run(args: ViewportArgs, config: RenderConfig) -> Result<(), CliError> {
    let viewport = Viewport::from_fragment(&args.fragment)?;
    let renderer = MapRenderer::from_config(config)?;
    let (canvas, failures) = renderer.render_viewport(&viewport).await?;
    super::finish(&canvas, &failures, &args.output)
}
