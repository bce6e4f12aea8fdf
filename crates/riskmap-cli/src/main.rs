//! riskmap CLI - Command-line interface for the riskmap rule engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, anchors, knowledge};
use riskmap_knowledge::TreatmentArea;

#[derive(Parser)]
#[command(name = "riskmap")]
#[command(about = "Facial landmark to injection-point and risk-zone geometry", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recorded landmark detection
    Analyze {
        /// Path to a detection JSON file
        detection: String,

        /// Treatment area (lips, cheeks, chin, forehead)
        #[arg(long, value_parser = parse_area)]
        area: TreatmentArea,

        /// Image width in pixels
        #[arg(long)]
        width: u32,

        /// Image height in pixels
        #[arg(long)]
        height: u32,

        /// Omit risk zones from the response
        #[arg(long)]
        no_risk_zones: bool,

        /// Omit injection points from the response
        #[arg(long)]
        no_injection_points: bool,

        /// Knowledge base directory (defaults to the configured one)
        #[arg(long)]
        knowledge: Option<String>,

        /// Output format (json or text)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Knowledge base operations
    #[command(subcommand)]
    Knowledge(knowledge::KnowledgeCommands),

    /// List the landmark anchor names rules may reference
    Anchors,
}

fn parse_area(s: &str) -> Result<TreatmentArea, String> {
    s.parse::<TreatmentArea>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match cli.command {
        Commands::Analyze {
            detection,
            area,
            width,
            height,
            no_risk_zones,
            no_injection_points,
            knowledge,
            format,
        } => analyze::run(analyze::AnalyzeArgs {
            detection,
            area,
            width,
            height,
            no_risk_zones,
            no_injection_points,
            knowledge,
            format,
        }),
        Commands::Knowledge(cmd) => knowledge::run(cmd),
        Commands::Anchors => anchors::run(),
    }
}
