//! Canonical reply model
//!
//! Every backend payload, error classification and simulated reply collapses
//! into a [`CanonicalResponse`] so the presentation layer only ever sees one
//! shape.

mod normalize;
mod segments;
mod types;

#[cfg(test)]
mod proptests;

pub use normalize::{normalize, FALLBACK_TEXT};
pub use segments::{split, SEGMENT_DELIMITER};
pub use types::*;
