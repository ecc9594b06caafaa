//! Render one or more OSM elements.

use std::path::PathBuf;

use clap::Args;
use mapstitch::overlay::color::parse_color;
use mapstitch::{ElementKind, ElementRef, MapRenderer, RenderConfig};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ElementArgs {
    /// Element references, such as `way/123` or `relation/60189`
    #[arg(required = true)]
    pub elements: Vec<String>,

    /// Draw all elements in this color (a CSS name or `#rrggbb` hex)
    /// instead of cycling the palette
    #[arg(short, long)]
    pub color: Option<String>,

    /// Output PNG path
    #[arg(short, long, default_value = "map.png")]
    pub output: PathBuf,
}

pub async fn run(args: ElementArgs, config: RenderConfig) -> Result<(), CliError> {
    let color = resolve_color(args.color.as_deref())?;
    let elements = args
        .elements
        .iter()
        .map(|s| parse_element(s).map(|e| (e, color)))
        .collect::<Result<Vec<_>, _>>()?;

    let renderer = MapRenderer::from_config(config)?;
    let (canvas, failures) = renderer
        .render_colored(&elements, Vec::new(), Vec::new())
        .await?;
    super::finish(&canvas, &failures, &args.output)
}

fn resolve_color(arg: Option<&str>) -> Result<Option<mapstitch::canvas::Color>, CliError> {
    arg.map(|s| parse_color(s).ok_or_else(|| CliError::InvalidColor(s.to_string())))
        .transpose()
}

fn parse_element(input: &str) -> Result<ElementRef, CliError> {
    let invalid = || CliError::InvalidElement(input.to_string());
    let (kind, id) = input.split_once('/').ok_or_else(invalid)?;
    let kind = match kind {
        "node" | "n" => ElementKind::Node,
        "way" | "w" => ElementKind::Way,
        "relation" | "rel" | "r" => ElementKind::Relation,
        _ => return Err(invalid()),
    };
    let id: u64 = id.parse().map_err(|_| invalid())?;
    Ok(ElementRef::new(kind, id))
}
