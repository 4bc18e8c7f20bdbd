//! Scene construction: resolved drawables, per-variant defaults and the compositor that commits
//! them in document order.

pub(crate) mod compositor;
pub(crate) mod model;
pub(crate) mod normalize;
