use std::collections::HashMap;
use std::time::Duration;

use crate::assets::decode::DecodedImage;
use crate::assets::resolver::{AssetError, AssetResolver};
use crate::foundation::error::CanvasResult;
use crate::scene::model::{Diagnostic, Drawable, Layer, Scene};
use crate::scene::normalize::{
    image_node, placeholder_node, resolve_circle, resolve_rect, resolve_text,
};
use crate::spec::model::{Primitive, Specification};

type AssetOutcome = Result<DecodedImage, AssetError>;

/// Options controlling how the compositor resolves image assets.
#[derive(Clone, Debug)]
pub struct CompositorOpts {
    /// Upper bound for one asset resolution. Expiry counts as an asset failure.
    pub asset_timeout: Duration,
    /// Resolve every image concurrently and commit in document order. When `false`, each image
    /// is resolved before the next primitive is looked at.
    pub concurrent_assets: bool,
    /// Fetch each distinct `src` once per render pass.
    pub memoize_assets: bool,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            asset_timeout: Duration::from_secs(5),
            concurrent_assets: true,
            memoize_assets: true,
        }
    }
}

impl CompositorOpts {
    /// Defaults, with `ADCANVAS_ASSET_TIMEOUT_MS` overriding the asset timeout when set.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(ms) = std::env::var("ADCANVAS_ASSET_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            opts.asset_timeout = Duration::from_millis(ms);
        }
        opts
    }
}

/// Turns a [`Specification`] into a ready [`Scene`].
///
/// Text, rect and circle primitives resolve synchronously. Image primitives go through the
/// resolver; failures become placeholder layers. Layers are always committed in document order
/// regardless of the order in which resolutions complete.
#[derive(Clone, Debug)]
pub struct Compositor<R> {
    resolver: R,
    opts: CompositorOpts,
}

impl<R: AssetResolver> Compositor<R> {
    /// Compositor with default options.
    pub fn new(resolver: R) -> Self {
        Self::with_opts(resolver, CompositorOpts::default())
    }

    /// Compositor with explicit options.
    pub fn with_opts(resolver: R, opts: CompositorOpts) -> Self {
        Self { resolver, opts }
    }

    /// The asset resolver in use.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The options in use.
    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Fill `scene` from `spec` and mark it ready.
    ///
    /// Fails only when `scene` cannot take this render (already rendered, or sized for a different
    /// canvas). Unknown primitives and failed assets are recorded as diagnostics.
    ///
    /// # Panics
    ///
    /// Asset timeouts use `tokio::time`, so the future must be polled inside a Tokio runtime with
    /// the time driver enabled (`#[tokio::main]`, `#[tokio::test]` or a runtime built with
    /// `enable_time`/`enable_all`). Polling it on another executor panics once the first image
    /// resolution starts.
    #[tracing::instrument(
        skip_all,
        fields(width = spec.width(), height = spec.height(), objects = spec.objects().len())
    )]
    pub async fn render(&self, scene: &mut Scene, spec: &Specification) -> CanvasResult<()> {
        scene.begin(spec)?;

        let mut assets = self.resolve_assets(spec).await;
        let mut layers = Vec::with_capacity(spec.objects().len());
        let mut diagnostics = Vec::new();

        for (index, primitive) in spec.objects().iter().enumerate() {
            let (drawable, placeholder) = match primitive {
                Primitive::Text(p) => (Drawable::Text(resolve_text(p)), false),
                Primitive::Rect(p) => (Drawable::Rect(resolve_rect(p)), false),
                Primitive::Circle(p) => (Drawable::Circle(resolve_circle(p)), false),
                Primitive::Image(p) => match assets.remove(&index) {
                    Some(Ok(image)) => (Drawable::Image(image_node(p, image)), false),
                    outcome => {
                        let error = match outcome {
                            Some(Err(e)) => e,
                            _ => AssetError::NotFound(p.src.clone()),
                        };
                        tracing::warn!(index, src = %p.src, %error, "image asset failed, drawing placeholder");
                        diagnostics.push(Diagnostic::AssetFallback {
                            index,
                            src: p.src.clone(),
                            error,
                        });
                        (Drawable::Rect(placeholder_node(p)), true)
                    }
                },
                Primitive::Unsupported { kind } => {
                    tracing::warn!(index, kind = %kind, "skipping unsupported primitive");
                    diagnostics.push(Diagnostic::UnsupportedPrimitive {
                        index,
                        kind: kind.clone(),
                    });
                    continue;
                }
            };
            layers.push(Layer {
                source_index: index,
                drawable,
                placeholder,
            });
        }

        tracing::debug!(
            layers = layers.len(),
            diagnostics = diagnostics.len(),
            "scene ready"
        );
        scene.finish(layers, diagnostics);
        Ok(())
    }

    /// Resolve every image primitive, keyed by primitive index.
    async fn resolve_assets(&self, spec: &Specification) -> HashMap<usize, AssetOutcome> {
        let images: Vec<(usize, &str)> = spec
            .objects()
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match p {
                Primitive::Image(img) => Some((i, img.src.as_str())),
                _ => None,
            })
            .collect();

        // Each image points at one fetch slot; identical sources share a slot when memoizing.
        let mut sources: Vec<&str> = Vec::new();
        let mut slot_of = Vec::with_capacity(images.len());
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for &(_, src) in &images {
            let slot = if self.opts.memoize_assets {
                *seen.entry(src).or_insert_with(|| {
                    sources.push(src);
                    sources.len() - 1
                })
            } else {
                sources.push(src);
                sources.len() - 1
            };
            slot_of.push(slot);
        }

        let outcomes: Vec<AssetOutcome> = if self.opts.concurrent_assets {
            futures::future::join_all(sources.iter().map(|src| self.resolve_one(src))).await
        } else {
            let mut out = Vec::with_capacity(sources.len());
            for src in &sources {
                out.push(self.resolve_one(src).await);
            }
            out
        };

        images
            .iter()
            .zip(slot_of)
            .map(|(&(index, _), slot)| (index, outcomes[slot].clone()))
            .collect()
    }

    async fn resolve_one(&self, src: &str) -> AssetOutcome {
        let limit = self.opts.asset_timeout;
        let outcome = match tokio::time::timeout(limit, self.resolver.resolve(src)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AssetError::Timeout(limit)),
        };
        match &outcome {
            Ok(img) => tracing::debug!(src, width = img.width, height = img.height, "asset resolved"),
            Err(e) => tracing::debug!(src, error = %e, "asset failed"),
        }
        outcome
    }
}

/// Render `spec` into `scene` with `resolver`, using [`CompositorOpts::from_env`].
///
/// Resolves once every primitive is processed and every image resolution has settled; the scene
/// is then ready for export. Dropping the returned future abandons in-flight resolutions and
/// leaves the scene in the building state.
///
/// # Panics
///
/// Needs a Tokio runtime with the time driver enabled, like [`Compositor::render`].
pub async fn render_specification<R: AssetResolver>(
    scene: &mut Scene,
    spec: &Specification,
    resolver: R,
) -> CanvasResult<()> {
    Compositor::with_opts(resolver, CompositorOpts::from_env())
        .render(scene, spec)
        .await
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compositor.rs"]
mod tests;
