//! riskmap Core - Foundational types for the riskmap rule engine
//!
//! This crate provides the types every other riskmap crate depends on:
//! - `Point`, `BoundingBox`, `ImageSize` - Pixel-space value types
//! - `geometry` - Pure polygon/polyline math
//! - `ContentHash` - SHA-256 hashing for determinism checks
//! - `AnalysisId` - Per-response identifiers
//! - Error types and Result alias

mod error;
pub mod geometry;
mod hash;
mod id;
mod types;

pub use error::{Result, RiskMapError};
pub use hash::{ContentHash, ContentHasher};
pub use id::AnalysisId;
pub use types::{BoundingBox, ImageSize, Point};
