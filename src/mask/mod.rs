//! Property-reactive modification masks and their adaptation across type views.

pub mod adapter;
pub mod bitmask;
pub mod cache;

pub use adapter::{adapt_mask, translate};
pub use bitmask::BitMask;
pub use cache::TransformedMaskCache;
