use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::assets::decode::DecodedImage;

/// Why an image asset could not be obtained.
///
/// Asset errors never fail a render: the compositor turns them into a placeholder layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The URI scheme or shape is not handled by this resolver.
    #[error("unsupported asset uri '{0}'")]
    UnsupportedUri(String),
    /// Transport-level failure (DNS, connect, TLS, read).
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The asset does not exist.
    #[error("asset not found: {0}")]
    NotFound(String),
    /// The bytes could not be decoded into an image.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Resolution did not settle within the configured bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl AssetError {
    /// Return `true` for failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Timeout(_) => true,
            Self::Status(code) => *code == 408 || *code == 429 || *code >= 500,
            Self::UnsupportedUri(_) | Self::NotFound(_) | Self::Decode(_) => false,
        }
    }
}

/// Asynchronously turns an asset URI into a decoded image with a known natural size.
///
/// Implementations perform a single attempt; wrap them in [`Retry`] for retry/backoff.
/// Resolvers must not panic on bad input: every failure is reported as an [`AssetError`].
pub trait AssetResolver {
    /// Resolve `uri` into decoded pixels.
    fn resolve(&self, uri: &str) -> impl Future<Output = Result<DecodedImage, AssetError>>;
}

impl<R: AssetResolver + ?Sized> AssetResolver for &R {
    fn resolve(&self, uri: &str) -> impl Future<Output = Result<DecodedImage, AssetError>> {
        (**self).resolve(uri)
    }
}

impl<R: AssetResolver + ?Sized> AssetResolver for Arc<R> {
    fn resolve(&self, uri: &str) -> impl Future<Output = Result<DecodedImage, AssetError>> {
        (**self).resolve(uri)
    }
}

/// Retries transient failures of an inner resolver with exponential backoff.
#[derive(Debug, Clone)]
pub struct Retry<R> {
    inner: R,
    attempts: u32,
    base_delay: Duration,
}

impl<R> Retry<R> {
    /// Wrap `inner`, making at most `attempts` calls (at least one) per URI.
    pub fn new(inner: R, attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Access the wrapped resolver.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: AssetResolver> AssetResolver for Retry<R> {
    async fn resolve(&self, uri: &str) -> Result<DecodedImage, AssetError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.inner.resolve(uri).await {
                Ok(img) => return Ok(img),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    tracing::debug!(uri, attempt, ?delay, error = %e, "retrying asset");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Serves preloaded images keyed by URI. Unknown URIs are [`AssetError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    images: HashMap<String, DecodedImage>,
}

impl StaticResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` under `uri`.
    pub fn with_image(mut self, uri: impl Into<String>, image: DecodedImage) -> Self {
        self.images.insert(uri.into(), image);
        self
    }
}

impl AssetResolver for StaticResolver {
    async fn resolve(&self, uri: &str) -> Result<DecodedImage, AssetError> {
        self.images
            .get(uri)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(uri.to_owned()))
    }
}

/// Resolver that fails every request. Useful for hosts that render offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingResolver;

impl AssetResolver for FailingResolver {
    async fn resolve(&self, uri: &str) -> Result<DecodedImage, AssetError> {
        Err(AssetError::Fetch(format!("asset loading disabled for '{uri}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
