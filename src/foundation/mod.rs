//! Shared primitives: error taxonomy, pixel/geometry types and small numeric helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
