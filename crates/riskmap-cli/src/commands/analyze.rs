//! Analyze a recorded landmark detection

use super::load_store;
use anyhow::Result;
use riskmap_engine::providers::recorded::RecordedProvider;
use riskmap_engine::{AnalysisModes, AnalysisRequest, AnalysisResponse, Analyzer, ImageFrame};
use riskmap_knowledge::TreatmentArea;
use std::path::Path;
use std::sync::Arc;

pub struct AnalyzeArgs {
    pub detection: String,
    pub area: TreatmentArea,
    pub width: u32,
    pub height: u32,
    pub no_risk_zones: bool,
    pub no_injection_points: bool,
    pub knowledge: Option<String>,
    pub format: String,
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let (config, store) = load_store(args.knowledge.as_deref())?;
    let analyzer = Analyzer::new(Arc::new(store), config.analysis);

    let provider = RecordedProvider::from_file(Path::new(&args.detection))?;
    let image = ImageFrame::new(args.width, args.height).with_source(&args.detection);
    let request = AnalysisRequest {
        area: args.area,
        modes: AnalysisModes {
            risk_zones: !args.no_risk_zones,
            injection_points: !args.no_injection_points,
        },
    };

    let response = analyzer.analyze(&provider, &image, &request);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response_text(&response);
    }

    Ok(())
}

fn print_response_text(response: &AnalysisResponse) {
    println!(
        "Analysis {} ({}, {}x{})",
        response.analysis_id,
        response.area,
        response.image_size.width,
        response.image_size.height
    );
    println!(
        "  Confidence: {:.2}{}",
        response.confidence_score,
        if response.fallback_used { "  [fallback]" } else { "" }
    );
    println!("  Hash: {}", response.deterministic_hash);
    println!();

    if response.modes_applied.injection_points {
        println!("Injection points ({}):", response.injection_points.len());
        for point in &response.injection_points {
            println!(
                "  {:<36} ({:>7.1}, {:>7.1})  conf {:.2}  {}",
                point.label,
                point.position.x,
                point.position.y,
                point.confidence,
                point.code.as_deref().unwrap_or("-")
            );
            for warning in &point.warnings {
                println!("      ! {}", warning);
            }
        }
        println!();
    }

    if response.modes_applied.risk_zones {
        println!("Risk zones ({}):", response.risk_zones.len());
        for zone in &response.risk_zones {
            println!(
                "  [{:<8}] {} ({} vertices)",
                zone.severity.to_string().to_uppercase(),
                zone.name,
                zone.polygon.len()
            );
            if let Some(rationale) = &zone.rationale {
                println!("      {}", rationale);
            }
        }
        println!();
    }

    if let Some(measurements) = &response.measurements {
        for check in &measurements.proportions {
            println!(
                "  {}: {:.2} (expected {:.2}-{:.2}){}",
                check.name,
                check.ratio,
                check.expected_min,
                check.expected_max,
                if check.within_range { "" } else { "  out of range" }
            );
        }
        if !measurements.proportions.is_empty() {
            println!();
        }
    }

    for warning in &response.warnings {
        println!("Warning: {}", warning);
    }
    println!("{}", response.medical_disclaimer);
}
