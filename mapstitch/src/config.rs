//! Rendering configuration
//!
//! All knobs of the pipeline live in [`RenderConfig`], deserialized from a
//! JSON file or built from [`RenderConfig::default`]. Every field has a
//! default, so a config file only needs to name what it overrides.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::coord;
use crate::limiter::RateLimitConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration of the rendering pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Canvas size in whole tiles.
    pub tiles_x: u32,
    pub tiles_y: u32,

    /// Pixel size of one tile as served by the tile server.
    pub tile_width: u32,
    pub tile_height: u32,

    /// Margin kept free of content on each side, in tile units per axis.
    /// With a margin of 0.5 on a 6-tile-wide canvas, content is planned
    /// into the central 5 tiles.
    pub tile_margin_x: f64,
    pub tile_margin_y: f64,

    /// Hard ceiling on planned zoom.
    pub max_zoom: u8,

    /// Zoom ceiling applied when markers are drawn; keeps enough context
    /// around a lone point to recognize the area.
    pub max_marker_zoom: u8,

    /// Tile URL template with `{zoom}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,

    /// User-Agent sent to the tile server and the geometry service.
    pub user_agent: String,

    /// Overpass interpreter endpoint.
    pub overpass_url: String,

    pub rate_limit: RateLimitConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tiles_x: 6,
            tiles_y: 5,
            tile_width: 256,
            tile_height: 256,
            tile_margin_x: 0.5,
            tile_margin_y: 0.5,
            max_zoom: 19,
            max_marker_zoom: 18,
            tile_url: "https://tile.openstreetmap.org/{zoom}/{x}/{y}.png".to_string(),
            user_agent: concat!("mapstitch/", env!("CARGO_PKG_VERSION")).to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Loads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiles_x == 0 || self.tiles_y == 0 {
            return Err(ConfigError::Invalid("canvas must be at least one tile".into()));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(ConfigError::Invalid("tile size must be non-zero".into()));
        }
        if f64::from(self.tiles_x) - 2.0 * self.tile_margin_x <= 0.0
            || f64::from(self.tiles_y) - 2.0 * self.tile_margin_y <= 0.0
        {
            return Err(ConfigError::Invalid(
                "margins leave no drawable area".into(),
            ));
        }
        if self.max_zoom > coord::MAX_ZOOM {
            return Err(ConfigError::Invalid(format!(
                "max_zoom {} exceeds the tile pyramid ({})",
                self.max_zoom,
                coord::MAX_ZOOM
            )));
        }
        if self.max_marker_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(
                "max_marker_zoom must not exceed max_zoom".into(),
            ));
        }
        for placeholder in ["{zoom}", "{x}", "{y}"] {
            if !self.tile_url.contains(placeholder) {
                return Err(ConfigError::Invalid(format!(
                    "tile_url is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(())
    }

    /// Canvas width in pixels. One pixel short of the full tile grid, so
    /// the rightmost pixel column maps to a real coordinate inside it.
    pub fn canvas_width(&self) -> u32 {
        self.tiles_x * self.tile_width - 1
    }

    /// Canvas height in pixels.
    pub fn canvas_height(&self) -> u32 {
        self.tiles_y * self.tile_height - 1
    }

    /// Horizontal tile span left for content after the margins.
    pub fn usable_tiles_x(&self) -> f64 {
        f64::from(self.tiles_x) - 2.0 * self.tile_margin_x
    }

    /// Vertical tile span left for content after the margins.
    pub fn usable_tiles_y(&self) -> f64 {
        f64::from(self.tiles_y) - 2.0 * self.tile_margin_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = RenderConfig::default();
        config.validate().unwrap();
        assert_eq!(config.canvas_width(), 1535);
        assert_eq!(config.canvas_height(), 1279);
        assert_eq!(config.usable_tiles_x(), 5.0);
        assert_eq!(config.usable_tiles_y(), 4.0);
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tiles_x": 4, "max_zoom": 17}}"#).unwrap();
        let config = RenderConfig::load(file.path()).unwrap();
        assert_eq!(config.tiles_x, 4);
        assert_eq!(config.max_zoom, 17);
        // Untouched fields keep their defaults.
        assert_eq!(config.tiles_y, 5);
        assert_eq!(config.tile_width, 256);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tiles": 4}}"#).unwrap();
        assert!(matches!(
            RenderConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            RenderConfig::load("/nonexistent/mapstitch.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_excessive_margins_rejected() {
        let config = RenderConfig {
            tiles_x: 2,
            tile_margin_x: 1.0,
            ..RenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_marker_zoom_above_max_rejected() {
        let config = RenderConfig {
            max_zoom: 15,
            max_marker_zoom: 16,
            ..RenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_tile_url_needs_all_placeholders() {
        let config = RenderConfig {
            tile_url: "https://tiles.example.org/{zoom}/{x}.png".to_string(),
            ..RenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
