//! Knowledge store: per-area rule documents and fallback templates

use crate::document::{parse_documents, InjectionPointDoc, RiskZoneDoc, SkippedDocument};
use crate::fallback::FallbackTemplate;
use crate::types::TreatmentArea;
use log::{info, warn};
use riskmap_core::{Result, RiskMapError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const INJECTION_POINTS_FILE: &str = "injection_points.toml";
pub const RISK_ZONES_FILE: &str = "risk_zones.toml";
pub const FALLBACK_TEMPLATE_FILE: &str = "fallback_template.toml";

/// Options controlling how strictly documents are loaded
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Reject unknown rule kinds instead of skipping them
    pub strict_rule_kinds: bool,
}

/// All rule documents authored for one treatment area
#[derive(Debug, Clone)]
pub struct AreaKnowledge {
    pub area: TreatmentArea,
    pub injection_points: Vec<InjectionPointDoc>,
    pub risk_zones: Vec<RiskZoneDoc>,
    /// Documents dropped at load time for an unknown rule kind
    pub skipped: Vec<SkippedDocument>,
}

impl AreaKnowledge {
    pub fn new(area: TreatmentArea) -> Self {
        Self {
            area,
            injection_points: Vec::new(),
            risk_zones: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Parse both document files for an area from strings
    pub fn from_toml_strs(
        area: TreatmentArea,
        injection_points: &str,
        risk_zones: &str,
        options: &LoadOptions,
    ) -> Result<Self> {
        let mut knowledge = Self::new(area);
        knowledge.load_injection_points(injection_points, options)?;
        knowledge.load_risk_zones(risk_zones, options)?;
        Ok(knowledge)
    }

    fn load_injection_points(&mut self, content: &str, options: &LoadOptions) -> Result<()> {
        let parsed = parse_documents::<InjectionPointDoc>(content, options.strict_rule_kinds)?;
        self.injection_points.extend(parsed.documents);
        self.skipped.extend(parsed.skipped);
        Ok(())
    }

    fn load_risk_zones(&mut self, content: &str, options: &LoadOptions) -> Result<()> {
        let parsed = parse_documents::<RiskZoneDoc>(content, options.strict_rule_kinds)?;
        self.risk_zones.extend(parsed.documents);
        self.skipped.extend(parsed.skipped);
        Ok(())
    }

    /// Every anchor name referenced by this area's documents
    pub fn anchor_names(&self) -> BTreeSet<&str> {
        self.injection_points
            .iter()
            .map(|d| &d.rule)
            .chain(self.risk_zones.iter().map(|d| &d.rule))
            .flat_map(|rule| rule.anchors().iter().map(String::as_str))
            .collect()
    }
}

/// Per-area counts reported by [`KnowledgeStore::stats`]
#[derive(Debug, Clone, Serialize)]
pub struct AreaStats {
    pub injection_points: usize,
    pub risk_zones: usize,
    pub skipped: usize,
    pub authored_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeStats {
    pub root: Option<PathBuf>,
    pub areas_loaded: usize,
    pub fallback_templates: usize,
    pub areas: BTreeMap<TreatmentArea, AreaStats>,
}

/// Process-wide rule store.
///
/// Built once during startup and read-only afterwards; share it by reference
/// (or `Arc`) between concurrent analyses.
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    root: Option<PathBuf>,
    areas: BTreeMap<TreatmentArea, AreaKnowledge>,
    fallbacks: BTreeMap<TreatmentArea, FallbackTemplate>,
    issues: Vec<String>,
}

impl KnowledgeStore {
    /// Create an empty store (every area falls back to its built-in template)
    pub fn new() -> Self {
        let mut store = Self::default();
        store.fill_builtin_fallbacks();
        store
    }

    /// Load the knowledge base rooted at `path`.
    ///
    /// Expects `path/<area>/injection_points.toml` and
    /// `path/<area>/risk_zones.toml`, plus an optional
    /// `path/<area>/fallback_template.toml`. A missing root, or a root with no
    /// loadable area, is an error.
    pub fn load_from_directory<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let root = path.as_ref();
        if !root.is_dir() {
            return Err(RiskMapError::KnowledgeLoadError(format!(
                "Knowledge directory not found: {}",
                root.display()
            )));
        }

        let mut store = Self {
            root: Some(root.to_path_buf()),
            ..Self::default()
        };

        for area in TreatmentArea::ALL {
            let area_dir = root.join(area.as_str());
            if !area_dir.is_dir() {
                warn!("No knowledge for area '{}' at {}", area, area_dir.display());
                store
                    .issues
                    .push(format!("Missing directory for area '{}'", area));
                continue;
            }
            let knowledge = store.load_area_dir(area, &area_dir, options)?;
            store.insert_area(knowledge);

            let template_path = area_dir.join(FALLBACK_TEMPLATE_FILE);
            if template_path.is_file() {
                let content = fs::read_to_string(&template_path)?;
                let template = FallbackTemplate::from_toml_str(area, &content)?;
                store.fallbacks.insert(area, template);
            }
        }

        if store.areas.is_empty() {
            return Err(RiskMapError::KnowledgeLoadError(format!(
                "No treatment areas found under {}",
                root.display()
            )));
        }

        store.fill_builtin_fallbacks();
        info!(
            "Loaded knowledge for {} area(s) from {}",
            store.areas.len(),
            root.display()
        );
        Ok(store)
    }

    fn load_area_dir(
        &mut self,
        area: TreatmentArea,
        dir: &Path,
        options: &LoadOptions,
    ) -> Result<AreaKnowledge> {
        let mut knowledge = AreaKnowledge::new(area);

        if let Some(content) = self.read_area_file(area, &dir.join(INJECTION_POINTS_FILE))? {
            knowledge
                .load_injection_points(&content, options)
                .map_err(|e| Self::in_file(area, INJECTION_POINTS_FILE, e))?;
        }
        if let Some(content) = self.read_area_file(area, &dir.join(RISK_ZONES_FILE))? {
            knowledge
                .load_risk_zones(&content, options)
                .map_err(|e| Self::in_file(area, RISK_ZONES_FILE, e))?;
        }

        Ok(knowledge)
    }

    fn read_area_file(&mut self, area: TreatmentArea, path: &Path) -> Result<Option<String>> {
        if !path.is_file() {
            warn!("Missing knowledge file {}", path.display());
            self.issues.push(format!(
                "Missing file for area '{}': {}",
                area,
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ));
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn in_file(area: TreatmentArea, file: &str, err: RiskMapError) -> RiskMapError {
        RiskMapError::KnowledgeLoadError(format!("{}/{}: {}", area, file, err))
    }

    fn fill_builtin_fallbacks(&mut self) {
        for area in TreatmentArea::ALL {
            self.fallbacks
                .entry(area)
                .or_insert_with(|| FallbackTemplate::builtin(area));
        }
    }

    /// Register area knowledge directly, replacing any existing entry
    pub fn insert_area(&mut self, knowledge: AreaKnowledge) {
        self.areas.insert(knowledge.area, knowledge);
    }

    /// Replace the fallback template for an area
    pub fn insert_fallback(&mut self, template: FallbackTemplate) {
        self.fallbacks.insert(template.area, template);
    }

    pub fn area(&self, area: TreatmentArea) -> Option<&AreaKnowledge> {
        self.areas.get(&area)
    }

    pub fn areas(&self) -> impl Iterator<Item = &AreaKnowledge> {
        self.areas.values()
    }

    pub fn fallback(&self, area: TreatmentArea) -> Option<&FallbackTemplate> {
        self.fallbacks.get(&area)
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn stats(&self) -> KnowledgeStats {
        let areas = TreatmentArea::ALL
            .iter()
            .filter_map(|area| {
                let knowledge = self.areas.get(area)?;
                Some((
                    *area,
                    AreaStats {
                        injection_points: knowledge.injection_points.len(),
                        risk_zones: knowledge.risk_zones.len(),
                        skipped: knowledge.skipped.len(),
                        authored_fallback: self
                            .fallbacks
                            .get(area)
                            .map(|t| t.authored)
                            .unwrap_or(false),
                    },
                ))
            })
            .collect();

        KnowledgeStats {
            root: self.root.clone(),
            areas_loaded: self.areas.len(),
            fallback_templates: self.fallbacks.len(),
            areas,
        }
    }

    /// Non-fatal problems found while loading, plus areas lacking points or zones
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues = self.issues.clone();
        for knowledge in self.areas.values() {
            if knowledge.injection_points.is_empty() {
                issues.push(format!("No injection points defined for {}", knowledge.area));
            }
            if knowledge.risk_zones.is_empty() {
                issues.push(format!("No risk zones defined for {}", knowledge.area));
            }
            for skipped in &knowledge.skipped {
                issues.push(format!(
                    "Skipped '{}' in {}: unknown rule kind '{}'",
                    skipped.title, knowledge.area, skipped.kind
                ));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIP_POINTS: &str = r#"
[[point]]
label = "Upper Lip Center"

[point.rule]
type = "landmark_vector_offset"
anchors = ["upper_lip_center"]

[[point]]
label = "Legacy Point"

[point.rule]
type = "legacy_grid"
anchors = ["nose_tip"]
"#;

    const LIP_ZONES: &str = r#"
[[zone]]
name = "Superior Labial Artery"
severity = "critical"

[zone.rule]
type = "polyline_buffer_from_landmarks"
anchors = ["left_mouth_corner", "upper_lip_center", "right_mouth_corner"]
buffer_px = 6
"#;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("riskmap_knowledge_test_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_area_from_strings() {
        let knowledge = AreaKnowledge::from_toml_strs(
            TreatmentArea::Lips,
            LIP_POINTS,
            LIP_ZONES,
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(knowledge.injection_points.len(), 1);
        assert_eq!(knowledge.risk_zones.len(), 1);
        assert_eq!(knowledge.skipped.len(), 1);

        let anchors = knowledge.anchor_names();
        assert!(anchors.contains("upper_lip_center"));
        assert!(anchors.contains("right_mouth_corner"));
        assert_eq!(anchors.len(), 3);
    }

    #[test]
    fn test_new_store_has_builtin_fallbacks() {
        let store = KnowledgeStore::new();
        for area in TreatmentArea::ALL {
            assert!(store.area(area).is_none());
            assert!(!store.fallback(area).unwrap().authored);
        }
    }

    #[test]
    fn test_load_from_directory() {
        let root = temp_root();
        let lips = root.join("lips");
        fs::create_dir_all(&lips).unwrap();
        fs::write(lips.join(INJECTION_POINTS_FILE), LIP_POINTS).unwrap();
        fs::write(lips.join(RISK_ZONES_FILE), LIP_ZONES).unwrap();
        fs::write(
            lips.join(FALLBACK_TEMPLATE_FILE),
            "confidence_penalty = 0.4\n\n[[point]]\nlabel = \"Lip (Template)\"\ny_offset = 0.1\n",
        )
        .unwrap();

        let store = KnowledgeStore::load_from_directory(&root, &LoadOptions::default()).unwrap();
        assert!(store.area(TreatmentArea::Lips).is_some());
        assert!(store.area(TreatmentArea::Chin).is_none());
        assert!(store.fallback(TreatmentArea::Lips).unwrap().authored);
        assert!(!store.fallback(TreatmentArea::Chin).unwrap().authored);

        let stats = store.stats();
        assert_eq!(stats.areas_loaded, 1);
        assert_eq!(stats.fallback_templates, 4);
        assert_eq!(stats.areas[&TreatmentArea::Lips].skipped, 1);

        let issues = store.integrity_issues();
        assert!(issues.iter().any(|i| i.contains("'chin'")));
        assert!(issues.iter().any(|i| i.contains("legacy_grid")));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_strict_load_fails_on_unknown_kind() {
        let root = temp_root();
        let lips = root.join("lips");
        fs::create_dir_all(&lips).unwrap();
        fs::write(lips.join(INJECTION_POINTS_FILE), LIP_POINTS).unwrap();
        fs::write(lips.join(RISK_ZONES_FILE), LIP_ZONES).unwrap();

        let options = LoadOptions {
            strict_rule_kinds: true,
        };
        let err = KnowledgeStore::load_from_directory(&root, &options).unwrap_err();
        assert!(err.to_string().contains("legacy_grid"));
        assert!(err.to_string().contains("injection_points.toml"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let err = KnowledgeStore::load_from_directory(temp_root(), &LoadOptions::default());
        assert!(matches!(err, Err(RiskMapError::KnowledgeLoadError(_))));
    }

    #[test]
    fn test_root_without_areas_is_fatal() {
        let root = temp_root();
        fs::create_dir_all(&root).unwrap();
        let err = KnowledgeStore::load_from_directory(&root, &LoadOptions::default());
        assert!(err.is_err());
        let _ = fs::remove_dir_all(&root);
    }
}
