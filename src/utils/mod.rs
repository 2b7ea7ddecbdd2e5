//! Shared helpers for wire-format normalization.

pub mod serde;
