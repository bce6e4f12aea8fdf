//! riskmap Knowledge - Declarative rule documents
//!
//! Injection points and risk zones are authored as TOML documents, one file
//! of each per treatment area. Every document carries a `rule` table whose
//! `type` selects one of seven geometric rule kinds; parameters are typed per
//! kind and validated once at load time.

mod document;
mod fallback;
mod store;
mod types;

pub use document::{
    parse_documents, InjectionPointDoc, ParsedDocuments, RiskZoneDoc, RuleDocument,
    SkippedDocument,
};
pub use fallback::{FallbackTemplate, TemplatePoint, BUILTIN_CONFIDENCE_PENALTY};
pub use store::{
    AreaKnowledge, AreaStats, KnowledgeStats, KnowledgeStore, LoadOptions,
    FALLBACK_TEMPLATE_FILE, INJECTION_POINTS_FILE, RISK_ZONES_FILE,
};
pub use types::{
    BoneDirection, BonePointParams, CircleParams, EllipseParams, LineShape, MaskParams,
    OffsetPercent, PolygonParams, PolylineBufferParams, RuleKind, RuleOutput, Severity,
    TreatmentArea, VectorOffsetParams,
};
