//! Rasterization and encoding of ready scenes.

pub(crate) mod cpu;
pub(crate) mod export;
