use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as _;

use crate::assets::decode::{DecodedImage, decode_image};
use crate::assets::resolver::{AssetError, AssetResolver};
use crate::foundation::error::{CanvasError, CanvasResult};

/// Options for [`UriResolver`].
#[derive(Debug, Clone)]
pub struct UriResolverOpts {
    /// Directory that relative asset paths are resolved against.
    pub assets_root: PathBuf,
    /// `User-Agent` sent with HTTP requests.
    pub user_agent: String,
    /// Upper bound on the encoded size of a single asset.
    pub max_bytes: usize,
    /// Per-request HTTP timeout. The compositor applies its own overall bound as well.
    pub request_timeout: Option<Duration>,
}

impl Default for UriResolverOpts {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("."),
            user_agent: format!("adcanvas/{}", env!("CARGO_PKG_VERSION")),
            max_bytes: 32 * 1024 * 1024,
            request_timeout: None,
        }
    }
}

/// Built-in resolver for `http(s)://`, `file://`, `data:` URIs and relative paths.
///
/// HTTP requests are anonymous: no cookies or credentials are ever attached, so any host that
/// serves the bytes can be used, and the decoded pixels are always readable by the exporter.
#[derive(Debug, Clone)]
pub struct UriResolver {
    client: reqwest::Client,
    opts: UriResolverOpts,
}

impl UriResolver {
    /// Build a resolver with its own HTTP client.
    pub fn new(opts: UriResolverOpts) -> CanvasResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(opts.user_agent.clone());
        if let Some(t) = opts.request_timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| CanvasError::Other(anyhow::anyhow!("build HTTP client: {e}")))?;
        Ok(Self { client, opts })
    }

    /// Options this resolver was built with.
    pub fn opts(&self) -> &UriResolverOpts {
        &self.opts
    }

    async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        let uri = uri.trim();
        let lower = uri.get(..8).unwrap_or(uri).to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            self.fetch_http(uri).await
        } else if lower.starts_with("data:") {
            decode_data_uri(uri)
        } else if lower.starts_with("file://") {
            let path = file_uri_path(uri)?;
            self.read_file(Path::new(&path)).await
        } else if has_scheme(uri) {
            Err(AssetError::UnsupportedUri(uri.to_owned()))
        } else {
            let rel = normalize_rel_path(uri)?;
            let path = self.opts.assets_root.join(Path::new(&rel));
            self.read_file(&path).await
        }
    }

    async fn fetch_http(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        let mut resp = self
            .client
            .get(uri)
            .header(reqwest::header::ACCEPT, "image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| AssetError::Fetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Status(status.as_u16()));
        }
        if let Some(len) = resp.content_length() {
            self.check_len(usize::try_from(len).unwrap_or(usize::MAX))?;
        }
        // The declared length is optional, so the body is bounded while it streams in.
        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| AssetError::Fetch(e.to_string()))?
        {
            self.check_len(body.len().saturating_add(chunk.len()))?;
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, AssetError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(path.display().to_string()),
            _ => AssetError::Fetch(format!("read '{}': {e}", path.display())),
        })?;
        self.check_len(bytes.len())?;
        Ok(bytes)
    }

    fn check_len(&self, len: usize) -> Result<(), AssetError> {
        if len > self.opts.max_bytes {
            return Err(AssetError::Fetch(format!(
                "asset is {len} bytes, limit is {}",
                self.opts.max_bytes
            )));
        }
        Ok(())
    }
}

impl AssetResolver for UriResolver {
    async fn resolve(&self, uri: &str) -> Result<DecodedImage, AssetError> {
        let bytes = self.fetch_bytes(uri).await?;
        decode_image(&bytes)
    }
}

fn has_scheme(uri: &str) -> bool {
    match uri.split_once(':') {
        // Single letters are Windows drive prefixes, not schemes.
        Some((scheme, _)) if scheme.len() > 1 => scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Normalize a relative asset path.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> Result<String, AssetError> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(AssetError::UnsupportedUri(format!(
            "'{source}': use file:// for absolute paths"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(AssetError::UnsupportedUri(format!(
                "'{source}': asset paths must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(AssetError::UnsupportedUri(format!(
            "'{source}': asset path must contain a file name"
        )));
    }

    Ok(out.join("/"))
}

/// Local path named by a `file://` URI, with `%`-escapes decoded.
pub(crate) fn file_uri_path(uri: &str) -> Result<String, AssetError> {
    let rest = &uri["file://".len()..];
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    let bytes = percent_decode(rest)?;
    String::from_utf8(bytes)
        .map_err(|_| AssetError::UnsupportedUri(format!("'{uri}': path is not valid UTF-8")))
}

/// Decode the payload of a `data:` URI (RFC 2397).
pub(crate) fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
    let rest = &uri["data:".len()..];
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::UnsupportedUri("data: URI without ','".to_owned()))?;

    if meta
        .rsplit(';')
        .next()
        .is_some_and(|p| p.eq_ignore_ascii_case("base64"))
    {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| AssetError::Decode(format!("data: URI base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(s: &str) -> Result<Vec<u8>, AssetError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| AssetError::Decode(format!("bad %-escape at byte {i}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
