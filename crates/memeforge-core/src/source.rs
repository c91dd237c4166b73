//! Image sources and load tokens.
//!
//! A source is an opaque string supplied by the host: a URL, a path relative
//! to the asset root, or an embedded `data:` URI. Every source change issues a
//! new token; results carrying an older token are stale and get dropped.

use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::PathBuf;
use thiserror::Error;

/// Errors interpreting an image source string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Empty image source")]
    Empty,
    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),
    #[error("Unsupported data URI encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("Base64 decode failed: {0}")]
    Base64(String),
}

/// A parsed image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline bytes from a `data:` URI.
    Data { mime: Option<String>, bytes: Vec<u8> },
    /// Remote `http`/`https` URL.
    Url(String),
    /// Local path; absolute-looking paths are resolved against an asset root.
    Path(PathBuf),
}

impl ImageSource {
    /// Interpret a source string.
    pub fn parse(source: &str) -> Result<Self, SourceError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SourceError::Empty);
        }
        if let Some(rest) = strip_prefix_ignore_case(source, "data:") {
            return parse_data_uri(rest);
        }
        if strip_prefix_ignore_case(source, "http://").is_some()
            || strip_prefix_ignore_case(source, "https://").is_some()
        {
            return Ok(ImageSource::Url(source.to_string()));
        }
        let path = strip_prefix_ignore_case(source, "file://").unwrap_or(source);
        Ok(ImageSource::Path(PathBuf::from(path)))
    }

    /// Short description for logs (never the full data payload).
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Data { mime, bytes } => format!(
                "data URI ({}, {} bytes)",
                mime.as_deref().unwrap_or("unknown type"),
                bytes.len()
            ),
            ImageSource::Url(url) => url.clone(),
            ImageSource::Path(path) => path.display().to_string(),
        }
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn parse_data_uri(rest: &str) -> Result<ImageSource, SourceError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| SourceError::MalformedDataUri("missing ','".to_string()))?;

    let mut params = header.split(';');
    let mime = params
        .next()
        .filter(|mime| !mime.is_empty())
        .map(|mime| mime.to_ascii_lowercase());
    let is_base64 = params.any(|param| param.eq_ignore_ascii_case("base64"));
    if !is_base64 {
        return Err(SourceError::UnsupportedEncoding(
            "only base64 payloads are supported".to_string(),
        ));
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| SourceError::Base64(e.to_string()))?;
    Ok(ImageSource::Data { mime, bytes })
}

/// Identifies one image-source change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    /// Raw token value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Issues strictly increasing load tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenCounter {
    last: u64,
}

impl TokenCounter {
    /// Create a counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token.
    pub fn issue(&mut self) -> LoadToken {
        self.last += 1;
        LoadToken(self.last)
    }

    /// Whether `token` is the most recently issued one.
    pub fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.last
    }
}

/// A pending image load: which source, under which token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub token: LoadToken,
    pub source: String,
}
