//! Knowledge base inspection commands

use super::load_store;
use anyhow::Result;
use clap::Subcommand;
use riskmap_engine::audit_anchors;
use riskmap_knowledge::{KnowledgeStore, RuleDocument, TreatmentArea};

#[derive(Subcommand)]
pub enum KnowledgeCommands {
    /// Load the knowledge base and report integrity problems
    Check {
        /// Knowledge base directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<String>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the documents loaded for one area
    Show {
        /// Treatment area (lips, cheeks, chin, forehead)
        area: String,

        /// Knowledge base directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<String>,
    },
}

pub fn run(cmd: KnowledgeCommands) -> Result<()> {
    match cmd {
        KnowledgeCommands::Check { dir, format } => check(dir.as_deref(), &format),
        KnowledgeCommands::Show { area, dir } => show(&area, dir.as_deref()),
    }
}

fn check(dir: Option<&str>, format: &str) -> Result<()> {
    let (_, store) = load_store(dir)?;
    let mut issues = store.integrity_issues();
    issues.extend(audit_anchors(&store));

    if format == "json" {
        let report = serde_json::json!({
            "stats": store.stats(),
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_check_text(&store, &issues);
    }

    if !issues.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_check_text(store: &KnowledgeStore, issues: &[String]) {
    let stats = store.stats();
    if let Some(root) = &stats.root {
        println!("Knowledge base: {}", root.display());
    }
    for (area, area_stats) in &stats.areas {
        println!(
            "  {:<10} {} point(s), {} zone(s), {} skipped, fallback: {}",
            area,
            area_stats.injection_points,
            area_stats.risk_zones,
            area_stats.skipped,
            if area_stats.authored_fallback { "authored" } else { "built-in" }
        );
    }
    println!();

    if issues.is_empty() {
        println!("No issues found.");
        return;
    }
    println!("{} issue(s):", issues.len());
    for issue in issues {
        println!("  - {}", issue);
    }
}

fn show(area: &str, dir: Option<&str>) -> Result<()> {
    let area: TreatmentArea = area.parse()?;
    let (_, store) = load_store(dir)?;

    let Some(knowledge) = store.area(area) else {
        println!("No rules loaded for '{}'.", area);
        return Ok(());
    };

    println!("Injection points ({}):", knowledge.injection_points.len());
    for doc in &knowledge.injection_points {
        println!(
            "  {:<36} {:<24} anchors: {}",
            doc.title(),
            doc.rule.name(),
            doc.rule.anchors().join(", ")
        );
    }

    println!();
    println!("Risk zones ({}):", knowledge.risk_zones.len());
    for doc in &knowledge.risk_zones {
        println!(
            "  {:<36} {:<32} {}",
            doc.title(),
            doc.rule.name(),
            doc.severity
        );
        if let Some(rationale) = &doc.rationale {
            println!("      {}", rationale);
        }
    }

    if !knowledge.skipped.is_empty() {
        println!();
        println!("Skipped ({}):", knowledge.skipped.len());
        for skipped in &knowledge.skipped {
            println!("  {} (unknown rule kind '{}')", skipped.title, skipped.kind);
        }
    }

    if let Some(template) = store.fallback(area) {
        println!();
        println!(
            "Fallback template: {} point(s), penalty {:.2}{}",
            template.points.len(),
            template.confidence_penalty,
            if template.authored { "" } else { " (built-in)" }
        );
    }

    Ok(())
}
