//! Injection-point and risk-zone rule documents

use crate::types::{RuleKind, RuleOutput, Severity};
use log::warn;
use riskmap_core::{Result, RiskMapError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Common surface of the two document families
pub trait RuleDocument: DeserializeOwned {
    /// Array-of-tables key in the TOML file (`[[point]]` / `[[zone]]`)
    const TABLE_KEY: &'static str;
    /// Key carrying the display title
    const TITLE_KEY: &'static str;
    /// The only output shape this family may use
    const OUTPUT: RuleOutput;

    fn title(&self) -> &str;
    fn rule(&self) -> &RuleKind;

    /// Family-specific metadata checks
    fn validate_metadata(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.rule().output() != Self::OUTPUT {
            return Err(format!(
                "rule kind '{}' does not produce a {}",
                self.rule().name(),
                match Self::OUTPUT {
                    RuleOutput::Point => "point",
                    RuleOutput::Polygon => "polygon",
                }
            ));
        }
        self.rule().validate()?;
        self.validate_metadata()
    }
}

/// A rule that places one candidate injection point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionPointDoc {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_point_label")]
    pub label: String,
    /// Practitioner shorthand code, e.g. `LP2`
    #[serde(default, alias = "md_code")]
    pub code: Option<String>,
    pub rule: RuleKind,
    #[serde(default)]
    pub depth: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default, alias = "volume")]
    pub volume_recommendation: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

fn default_point_label() -> String {
    "Injection Point".to_string()
}

impl RuleDocument for InjectionPointDoc {
    const TABLE_KEY: &'static str = "point";
    const TITLE_KEY: &'static str = "label";
    const OUTPUT: RuleOutput = RuleOutput::Point;

    fn title(&self) -> &str {
        &self.label
    }

    fn rule(&self) -> &RuleKind {
        &self.rule
    }
}

/// A rule that outlines one or more danger regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskZoneDoc {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_zone_name")]
    pub name: String,
    pub rule: RuleKind,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub safety_recommendations: Vec<String>,
    #[serde(default)]
    pub consequences: Vec<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub medical_reference: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    /// Rendering hint such as `dashed`
    #[serde(default)]
    pub style: Option<String>,
}

fn default_zone_name() -> String {
    "Risk Zone".to_string()
}

fn default_color() -> String {
    "#FF4D4D".to_string()
}

fn default_opacity() -> f64 {
    0.25
}

impl RuleDocument for RiskZoneDoc {
    const TABLE_KEY: &'static str = "zone";
    const TITLE_KEY: &'static str = "name";
    const OUTPUT: RuleOutput = RuleOutput::Polygon;

    fn title(&self) -> &str {
        &self.name
    }

    fn rule(&self) -> &RuleKind {
        &self.rule
    }

    fn validate_metadata(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!("opacity must be within [0, 1], got {}", self.opacity));
        }
        Ok(())
    }
}

/// A document dropped at load time because its rule kind is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub title: String,
    pub kind: String,
}

/// Result of parsing one document file
#[derive(Debug)]
pub struct ParsedDocuments<T> {
    pub documents: Vec<T>,
    pub skipped: Vec<SkippedDocument>,
}

/// Parse every `[[T::TABLE_KEY]]` table in `content`.
///
/// Rule kinds are checked before typed deserialization so an unrecognised
/// kind can be skipped (or rejected when `strict`) instead of surfacing as an
/// opaque serde error. Malformed parameters of a known kind are always errors.
pub fn parse_documents<T: RuleDocument>(content: &str, strict: bool) -> Result<ParsedDocuments<T>> {
    let table: toml::Table = toml::from_str(content)?;
    let mut parsed = ParsedDocuments {
        documents: Vec::new(),
        skipped: Vec::new(),
    };

    let entries = match table.get(T::TABLE_KEY) {
        Some(toml::Value::Array(entries)) => entries,
        Some(_) => {
            return Err(RiskMapError::KnowledgeLoadError(format!(
                "'{}' must be an array of tables",
                T::TABLE_KEY
            )))
        }
        None => return Ok(parsed),
    };

    for (index, entry) in entries.iter().enumerate() {
        let title = entry
            .get(T::TITLE_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} #{}", T::TABLE_KEY, index + 1));

        let kind = entry
            .get("rule")
            .and_then(|rule| rule.get("type"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| RiskMapError::InvalidRuleDocument {
                document: title.clone(),
                reason: "missing rule.type".to_string(),
            })?;

        if !RuleKind::is_known(kind) {
            if strict {
                return Err(RiskMapError::UnknownRuleKind {
                    document: title,
                    kind: kind.to_string(),
                });
            }
            warn!("Skipping '{}': unknown rule kind '{}'", title, kind);
            parsed.skipped.push(SkippedDocument {
                title,
                kind: kind.to_string(),
            });
            continue;
        }

        let document = entry.clone().try_into::<T>().map_err(|e| {
            RiskMapError::InvalidRuleDocument {
                document: title.clone(),
                reason: e.message().to_string(),
            }
        })?;

        document
            .validate()
            .map_err(|reason| RiskMapError::InvalidRuleDocument {
                document: title,
                reason,
            })?;

        parsed.documents.push(document);
    }

    Ok(parsed)
}
