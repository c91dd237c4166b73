//! Asynchronous background loading.
//!
//! Fetching is abstracted behind [`ImageFetcher`] so the browser host can use
//! `fetch` while native code and tests read from disk. A load never fails
//! the compositor: the outcome carries the error and the compositor swaps in
//! its placeholder.

use crate::raster::RasterImage;
use memeforge_core::{ImageSource, LoadTicket, LoadToken, SourceError};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Errors that can occur while loading a background.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported source: {0}")]
    Unsupported(String),
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Decode failed: {0}")]
    Decode(String),
}

/// Obtains the raw bytes behind an image source.
pub trait ImageFetcher {
    fn fetch<'a>(&'a self, source: &'a ImageSource) -> BoxFuture<'a, Result<Vec<u8>, LoadError>>;
}

/// Reads paths relative to an asset root. Remote URLs are not supported.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a source path against the root. Leading `/` means "root-relative".
    pub fn resolve(&self, path: &std::path::Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }
}

impl ImageFetcher for FsFetcher {
    fn fetch<'a>(&'a self, source: &'a ImageSource) -> BoxFuture<'a, Result<Vec<u8>, LoadError>> {
        Box::pin(async move {
            match source {
                ImageSource::Data { bytes, .. } => Ok(bytes.clone()),
                ImageSource::Path(path) => Ok(std::fs::read(self.resolve(path))?),
                ImageSource::Url(url) => Err(LoadError::Unsupported(url.clone())),
            }
        })
    }
}

/// The result of one load, tagged with the token it was issued under.
#[derive(Debug)]
pub struct LoadOutcome {
    pub token: LoadToken,
    pub source: String,
    pub result: Result<RasterImage, LoadError>,
}

impl LoadOutcome {
    /// Wrap already-fetched bytes (used by hosts that fetch on their own).
    pub fn from_bytes(ticket: LoadTicket, bytes: &[u8]) -> Self {
        Self {
            token: ticket.token,
            source: ticket.source,
            result: RasterImage::decode(bytes),
        }
    }

    pub fn failed(ticket: LoadTicket, error: LoadError) -> Self {
        Self {
            token: ticket.token,
            source: ticket.source,
            result: Err(error),
        }
    }
}

/// Fetch and decode the image named by `ticket`.
pub async fn load_image(fetcher: &dyn ImageFetcher, ticket: LoadTicket) -> LoadOutcome {
    let source = match ImageSource::parse(&ticket.source) {
        Ok(source) => source,
        Err(e) => return LoadOutcome::failed(ticket, e.into()),
    };
    log::debug!("Loading background {}", source.describe());

    match fetcher.fetch(&source).await {
        Ok(bytes) => LoadOutcome::from_bytes(ticket, &bytes),
        Err(e) => LoadOutcome::failed(ticket, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use memeforge_core::TokenCounter;

    fn tiny_png() -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, 4, 2);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[90u8; 4 * 2 * 4]).unwrap();
        }
        out
    }

    fn ticket(source: &str) -> LoadTicket {
        let mut tokens = TokenCounter::new();
        LoadTicket {
            token: tokens.issue(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_load_from_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/drake.png"), tiny_png()).unwrap();

        let fetcher = FsFetcher::new(dir.path());
        let outcome = pollster::block_on(load_image(&fetcher, ticket("/templates/drake.png")));
        let image = outcome.result.unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
        assert_eq!(outcome.source, "/templates/drake.png");
    }

    #[test]
    fn test_load_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(tiny_png()));
        let fetcher = FsFetcher::new("/nonexistent");
        let outcome = pollster::block_on(load_image(&fetcher, ticket(&uri)));
        assert!(outcome.result.is_ok());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        let outcome = pollster::block_on(load_image(&fetcher, ticket("missing.jpg")));
        assert!(matches!(outcome.result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_remote_url_unsupported_on_disk() {
        let fetcher = FsFetcher::new(".");
        let outcome = pollster::block_on(load_image(&fetcher, ticket("https://example.com/a.png")));
        assert!(matches!(outcome.result, Err(LoadError::Unsupported(_))));
    }

    #[test]
    fn test_bad_source_and_bad_bytes() {
        let fetcher = FsFetcher::new(".");
        let outcome = pollster::block_on(load_image(&fetcher, ticket("   ")));
        assert!(matches!(outcome.result, Err(LoadError::Source(SourceError::Empty))));

        let outcome = LoadOutcome::from_bytes(ticket("x"), b"nope");
        assert!(matches!(outcome.result, Err(LoadError::Decode(_))));
    }
}
