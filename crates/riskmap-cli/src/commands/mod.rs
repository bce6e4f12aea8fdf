//! CLI command implementations

pub mod analyze;
pub mod anchors;
pub mod knowledge;

use anyhow::{Context, Result};
use riskmap_engine::RiskMapConfig;
use riskmap_knowledge::KnowledgeStore;
use std::path::PathBuf;

/// Resolve configuration and load the knowledge base, letting an explicit
/// directory override the configured one
pub(crate) fn load_store(dir: Option<&str>) -> Result<(RiskMapConfig, KnowledgeStore)> {
    let mut config = RiskMapConfig::load().context("Failed to load riskmap config")?;
    if let Some(dir) = dir {
        config.knowledge_dir = PathBuf::from(dir);
    }

    let store = KnowledgeStore::load_from_directory(&config.knowledge_dir, &config.load_options())
        .with_context(|| {
            format!(
                "Failed to load knowledge base from {}",
                config.knowledge_dir.display()
            )
        })?;
    Ok((config, store))
}
