//! Landmark anchor listing

use anyhow::Result;
use riskmap_engine::{landmark_index, DERIVED_LANDMARKS, LANDMARK_INDEX};

pub fn run() -> Result<()> {
    println!("Mesh anchors ({}):", LANDMARK_INDEX.len());
    for (name, index) in LANDMARK_INDEX {
        println!("  {:<24} #{}", name, index);
    }

    println!();
    println!("Derived anchors ({}):", DERIVED_LANDMARKS.len());
    for (name, a, b) in DERIVED_LANDMARKS {
        let indices = landmark_index(a).zip(landmark_index(b));
        match indices {
            Some((ia, ib)) => println!("  {:<24} midpoint of {} (#{}) and {} (#{})", name, a, ia, b, ib),
            None => println!("  {:<24} midpoint of {} and {}", name, a, b),
        }
    }

    Ok(())
}
