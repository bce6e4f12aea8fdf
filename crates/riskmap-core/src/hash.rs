//! Content hashing for deterministic-result tracking

use crate::Point;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 hash over analysis inputs or outputs.
///
/// Two analyses of the same landmark mesh for the same area must produce the
/// same input hash; the engine uses this to detect non-deterministic output.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.update_bytes(data);
        hasher.finish()
    }

    /// Compute a hash from a string
    pub fn from_str(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Hash a point set together with a context label (e.g. the treatment area)
    pub fn from_points(points: &[Point], label: &str) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.update_str(label);
        hasher.update_points(points);
        hasher.finish()
    }

    /// Get the hash as a hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// First 16 hex characters, the form carried in analysis responses
    pub fn to_short_hex(&self) -> String {
        self.to_hex()[..16].to_string()
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_short_hex())
    }
}

/// Incremental builder for a [`ContentHash`].
///
/// Floats are fed as their IEEE-754 bit patterns so equal coordinates always
/// hash equally, independent of formatting.
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn update_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Length-prefixed so that adjacent strings cannot collide
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.inner.update((s.len() as u64).to_le_bytes());
        self.inner.update(s.as_bytes());
        self
    }

    pub fn update_f64(&mut self, v: f64) -> &mut Self {
        self.inner.update(v.to_bits().to_le_bytes());
        self
    }

    pub fn update_point(&mut self, p: &Point) -> &mut Self {
        self.update_f64(p.x).update_f64(p.y)
    }

    pub fn update_points(&mut self, points: &[Point]) -> &mut Self {
        self.inner.update((points.len() as u64).to_le_bytes());
        for p in points {
            self.update_point(p);
        }
        self
    }

    pub fn finish(self) -> ContentHash {
        ContentHash(self.inner.finalize().into())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_hashing() {
        let h1 = ContentHash::from_str("hello");
        let h2 = ContentHash::from_str("hello");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_content_different_hash() {
        let h1 = ContentHash::from_str("hello");
        let h2 = ContentHash::from_str("world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hex_output() {
        let h = ContentHash::from_str("hello");
        assert_eq!(h.to_hex().len(), 64);
        assert_eq!(h.to_short_hex().len(), 16);
        assert!(h.to_hex().starts_with(&h.to_short_hex()));
    }

    #[test]
    fn test_points_hash_depends_on_label_and_coordinates() {
        let pts = [Point::new(1.0, 2.0), Point::new(3.0, 4.0)];
        let lips = ContentHash::from_points(&pts, "lips");
        assert_eq!(lips, ContentHash::from_points(&pts, "lips"));
        assert_ne!(lips, ContentHash::from_points(&pts, "chin"));

        let moved = [Point::new(1.0, 2.0), Point::new(3.0, 4.5)];
        assert_ne!(lips, ContentHash::from_points(&moved, "lips"));
    }

    #[test]
    fn test_string_boundaries_are_unambiguous() {
        let mut a = ContentHasher::new();
        a.update_str("ab").update_str("c");
        let mut b = ContentHasher::new();
        b.update_str("a").update_str("bc");
        assert_ne!(a.finish(), b.finish());
    }
}
