//! In-memory infrastructure built on the crate's primitives.

pub mod cache;

pub use cache::BoundedCache;
