//! Slippy-map tile fetching
//!
//! Provides the [`TileSource`] abstraction over a tile server and the
//! production HTTP implementation. The compositor in
//! [`compositor`](crate::tile::compositor) fans fetches out over this
//! trait, so tests can substitute an in-memory source.

mod compositor;

pub use compositor::TileCompositor;

use thiserror::Error;

/// Transport timeout for a single tile fetch.
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Errors from fetching one tile.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TileSourceError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("tile fetch failed: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("tile server returned HTTP {0}")]
    Status(u16),
}

/// A source of map tiles addressed by zoom/column/row.
pub trait TileSource: Send + Sync {
    /// Fetches the encoded image bytes for one tile.
    fn fetch(
        &self,
        zoom: u8,
        x: u32,
        y: u32,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, TileSourceError>> + Send;

    /// A human-readable identifier for the tile, used in failure reports.
    fn label(&self, zoom: u8, x: u32, y: u32) -> String {
        format!("{}/{}/{}", zoom, x, y)
    }
}

/// Tile source backed by an HTTP tile server.
///
/// The URL template uses `{zoom}`, `{x}` and `{y}` placeholders, for
/// example `https://tile.openstreetmap.org/{zoom}/{x}/{y}.png`.
pub struct HttpTileSource {
    http: reqwest::Client,
    template: String,
}

impl HttpTileSource {
    pub fn new(template: impl Into<String>, user_agent: &str) -> Result<Self, TileSourceError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| TileSourceError::Http(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            template: template.into(),
        })
    }

    fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.template
            .replace("{zoom}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

impl TileSource for HttpTileSource {
    async fn fetch(&self, zoom: u8, x: u32, y: u32) -> Result<Vec<u8>, TileSourceError> {
        let url = self.tile_url(zoom, x, y);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TileSourceError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TileSourceError::Status(response.status().as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TileSourceError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn label(&self, zoom: u8, x: u32, y: u32) -> String {
        self.tile_url(zoom, x, y)
    }
}
