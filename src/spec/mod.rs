//! Specification documents: the typed data model and the validation boundary that builds it
//! from untrusted JSON.

pub(crate) mod model;
pub(crate) mod validate;
