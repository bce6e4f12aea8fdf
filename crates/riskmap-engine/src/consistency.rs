//! Observational determinism check
//!
//! Records the geometry emitted for each input hash. A repeat analysis of the
//! same input is compared against the first one and the largest vertex drift
//! is reported. The check never blocks and never changes a response.

use log::{debug, warn};
use riskmap_core::{ContentHash, Point};
use std::collections::HashMap;
use std::sync::{Mutex, TryLockError};

/// Drift below this is treated as identical output
pub const DEVIATION_TOLERANCE_PX: f64 = 1e-6;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsistencyOutcome {
    /// First time this input was seen; geometry recorded
    Recorded,
    Consistent,
    /// Same vertex count, but positions moved
    Drift { max_deviation_px: f64 },
    /// Different number of vertices than the recorded run
    ShapeChanged { recorded: usize, current: usize },
    /// Another analysis holds the lock; check skipped
    Busy,
}

#[derive(Debug)]
pub struct ConsistencyChecker {
    records: Mutex<HashMap<ContentHash, Vec<Point>>>,
    capacity: usize,
}

impl ConsistencyChecker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn check(&self, input: ContentHash, geometry: &[Point]) -> ConsistencyOutcome {
        let mut records = match self.records.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!("Consistency check skipped for {}: busy", input);
                return ConsistencyOutcome::Busy;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        if !records.contains_key(&input) {
            if records.len() >= self.capacity {
                records.clear();
            }
            records.insert(input, geometry.to_vec());
            return ConsistencyOutcome::Recorded;
        }
        let recorded = &records[&input];

        if recorded.len() != geometry.len() {
            warn!(
                "Non-deterministic output for {}: {} vertices, previously {}",
                input,
                geometry.len(),
                recorded.len()
            );
            return ConsistencyOutcome::ShapeChanged {
                recorded: recorded.len(),
                current: geometry.len(),
            };
        }

        let max_deviation_px = recorded
            .iter()
            .zip(geometry)
            .map(|(a, b)| a.distance(b))
            .fold(0.0, f64::max);

        if max_deviation_px > DEVIATION_TOLERANCE_PX {
            warn!(
                "Non-deterministic output for {}: max deviation {:.3}px",
                input, max_deviation_px
            );
            ConsistencyOutcome::Drift { max_deviation_px }
        } else {
            ConsistencyOutcome::Consistent
        }
    }

    pub fn len(&self) -> usize {
        match self.records.try_lock() {
            Ok(guard) => guard.len(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().len(),
            Err(TryLockError::WouldBlock) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConsistencyChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(shift: f64) -> Vec<Point> {
        vec![Point::new(10.0 + shift, 10.0), Point::new(20.0, 20.0)]
    }

    #[test]
    fn test_record_then_compare() {
        let checker = ConsistencyChecker::new();
        let input = ContentHash::from_str("lips");
        assert_eq!(checker.check(input, &geometry(0.0)), ConsistencyOutcome::Recorded);
        assert_eq!(checker.check(input, &geometry(0.0)), ConsistencyOutcome::Consistent);
        assert_eq!(
            checker.check(input, &geometry(3.0)),
            ConsistencyOutcome::Drift {
                max_deviation_px: 3.0
            }
        );
        assert_eq!(
            checker.check(input, &geometry(0.0)[..1]),
            ConsistencyOutcome::ShapeChanged {
                recorded: 2,
                current: 1
            }
        );
    }

    #[test]
    fn test_busy_when_locked() {
        let checker = ConsistencyChecker::new();
        let _guard = checker.records.lock().unwrap();
        assert_eq!(
            checker.check(ContentHash::from_str("x"), &[]),
            ConsistencyOutcome::Busy
        );
    }

    #[test]
    fn test_capacity_bounds_memory() {
        let checker = ConsistencyChecker::with_capacity(2);
        for i in 0..5 {
            checker.check(ContentHash::from_str(&i.to_string()), &[]);
        }
        assert!(checker.len() <= 2);
    }
}
