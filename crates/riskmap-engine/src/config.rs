//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `RISKMAP_KNOWLEDGE_DIR`, `RISKMAP_ENABLE_FALLBACK`,
//!    `RISKMAP_STRICT_RULE_KINDS`
//! 2. Project-local: `.riskmap/config.toml`
//! 3. Global: `~/.riskmap/config.toml`

use riskmap_core::{Result, RiskMapError};
use riskmap_knowledge::LoadOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_KNOWLEDGE_DIR: &str = "RISKMAP_KNOWLEDGE_DIR";
pub const ENV_ENABLE_FALLBACK: &str = "RISKMAP_ENABLE_FALLBACK";
pub const ENV_STRICT_RULE_KINDS: &str = "RISKMAP_STRICT_RULE_KINDS";

/// `[knowledge]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeFileSection {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub strict_rule_kinds: Option<bool>,
}

/// `[analysis]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisFileSection {
    #[serde(default)]
    pub enable_fallback: Option<bool>,
    #[serde(default)]
    pub enable_consistency_checks: Option<bool>,
    #[serde(default)]
    pub dedup_zones: Option<bool>,
    #[serde(default)]
    pub validate_against_hidden_zones: Option<bool>,
    #[serde(default)]
    pub max_image_size: Option<u32>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskMapConfigFile {
    #[serde(default)]
    pub knowledge: KnowledgeFileSection,
    #[serde(default)]
    pub analysis: AnalysisFileSection,
}

/// Knobs read by the analyzer on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSettings {
    /// Use templates when landmarks fail; otherwise answer minimally
    pub enable_fallback: bool,
    pub enable_consistency_checks: bool,
    pub dedup_zones: bool,
    /// Check points against zones even when zones are not requested
    pub validate_against_hidden_zones: bool,
    /// Larger images are still analysed but flagged
    pub max_image_size: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            enable_fallback: true,
            enable_consistency_checks: true,
            dedup_zones: true,
            validate_against_hidden_zones: true,
            max_image_size: 4096,
        }
    }
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMapConfig {
    pub knowledge_dir: PathBuf,
    pub strict_rule_kinds: bool,
    pub analysis: AnalysisSettings,
}

impl Default for RiskMapConfig {
    fn default() -> Self {
        Self::resolve(RiskMapConfigFile::default())
    }
}

impl RiskMapConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = RiskMapConfigFile::default();

        // Layer 1: Global config (~/.riskmap/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        // Layer 2: Project-local config (.riskmap/config.toml)
        let local_path = PathBuf::from(".riskmap/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        // Layer 3: Environment variable overrides
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;

        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path only (env overrides still apply)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(Self::resolve(config))
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict_rule_kinds: self.strict_rule_kinds,
        }
    }

    fn resolve(file: RiskMapConfigFile) -> Self {
        let defaults = AnalysisSettings::default();
        let a = file.analysis;
        Self {
            knowledge_dir: file
                .knowledge
                .dir
                .unwrap_or_else(|| PathBuf::from("knowledge")),
            strict_rule_kinds: file.knowledge.strict_rule_kinds.unwrap_or(false),
            analysis: AnalysisSettings {
                enable_fallback: a.enable_fallback.unwrap_or(defaults.enable_fallback),
                enable_consistency_checks: a
                    .enable_consistency_checks
                    .unwrap_or(defaults.enable_consistency_checks),
                dedup_zones: a.dedup_zones.unwrap_or(defaults.dedup_zones),
                validate_against_hidden_zones: a
                    .validate_against_hidden_zones
                    .unwrap_or(defaults.validate_against_hidden_zones),
                max_image_size: a.max_image_size.unwrap_or(defaults.max_image_size),
            },
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".riskmap").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<RiskMapConfigFile> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| {
            RiskMapError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn parse(content: &str) -> std::result::Result<RiskMapConfigFile, toml::de::Error> {
        toml::from_str(content)
    }

    fn merge_into(base: &mut RiskMapConfigFile, overlay: RiskMapConfigFile) {
        let (k, a) = (overlay.knowledge, overlay.analysis);
        if k.dir.is_some() {
            base.knowledge.dir = k.dir;
        }
        if k.strict_rule_kinds.is_some() {
            base.knowledge.strict_rule_kinds = k.strict_rule_kinds;
        }
        if a.enable_fallback.is_some() {
            base.analysis.enable_fallback = a.enable_fallback;
        }
        if a.enable_consistency_checks.is_some() {
            base.analysis.enable_consistency_checks = a.enable_consistency_checks;
        }
        if a.dedup_zones.is_some() {
            base.analysis.dedup_zones = a.dedup_zones;
        }
        if a.validate_against_hidden_zones.is_some() {
            base.analysis.validate_against_hidden_zones = a.validate_against_hidden_zones;
        }
        if a.max_image_size.is_some() {
            base.analysis.max_image_size = a.max_image_size;
        }
    }

    fn apply_overrides<F>(config: &mut RiskMapConfigFile, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_KNOWLEDGE_DIR) {
            config.knowledge.dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = lookup(ENV_ENABLE_FALLBACK) {
            config.analysis.enable_fallback = Some(parse_flag(ENV_ENABLE_FALLBACK, &value)?);
        }
        if let Some(value) = lookup(ENV_STRICT_RULE_KINDS) {
            config.knowledge.strict_rule_kinds = Some(parse_flag(ENV_STRICT_RULE_KINDS, &value)?);
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RiskMapError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RiskMapConfig::default();
        assert_eq!(config.knowledge_dir, PathBuf::from("knowledge"));
        assert!(!config.strict_rule_kinds);
        assert!(config.analysis.enable_fallback);
        assert_eq!(config.analysis.max_image_size, 4096);
    }

    #[test]
    fn test_parse_partial_file() {
        let file = RiskMapConfig::parse(
            r#"
[analysis]
enable_fallback = false
max_image_size = 2048
"#,
        )
        .unwrap();
        let config = RiskMapConfig::resolve(file);
        assert!(!config.analysis.enable_fallback);
        assert_eq!(config.analysis.max_image_size, 2048);
        assert!(config.analysis.dedup_zones);
    }

    #[test]
    fn test_merge_overlay_wins_only_when_set() {
        let mut base = RiskMapConfig::parse(
            r#"
[knowledge]
dir = "/srv/knowledge"
strict_rule_kinds = true

[analysis]
dedup_zones = false
"#,
        )
        .unwrap();
        let overlay = RiskMapConfig::parse(
            r#"
[knowledge]
dir = "local-knowledge"
"#,
        )
        .unwrap();
        RiskMapConfig::merge_into(&mut base, overlay);
        let config = RiskMapConfig::resolve(base);
        assert_eq!(config.knowledge_dir, PathBuf::from("local-knowledge"));
        assert!(config.strict_rule_kinds);
        assert!(!config.analysis.dedup_zones);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_KNOWLEDGE_DIR, "/opt/kb"),
            (ENV_ENABLE_FALLBACK, "off"),
            (ENV_STRICT_RULE_KINDS, "1"),
        ]
        .into_iter()
        .collect();

        let mut file = RiskMapConfigFile::default();
        RiskMapConfig::apply_overrides(&mut file, |k| env.get(k).map(|v| v.to_string())).unwrap();
        let config = RiskMapConfig::resolve(file);
        assert_eq!(config.knowledge_dir, PathBuf::from("/opt/kb"));
        assert!(!config.analysis.enable_fallback);
        assert!(config.load_options().strict_rule_kinds);
    }

    #[test]
    fn test_invalid_env_flag() {
        let mut file = RiskMapConfigFile::default();
        let err = RiskMapConfig::apply_overrides(&mut file, |k| {
            (k == ENV_ENABLE_FALLBACK).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("RISKMAP_ENABLE_FALLBACK"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("riskmap_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[analysis]\nvalidate_against_hidden_zones = false\n").unwrap();

        let config = RiskMapConfig::load_from_file(&path).unwrap();
        assert!(!config.analysis.validate_against_hidden_zones);

        std::fs::write(&path, "[analysis\n").unwrap();
        assert!(matches!(
            RiskMapConfig::load_from_file(&path),
            Err(RiskMapError::ConfigError(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
