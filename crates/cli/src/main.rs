//! CLI tool for normalizing the structure of Word documents.

use anyhow::{Context, Result};
use clap::Parser;
use docfmt_core::{HouseStyle, NormalizeReport, ParagraphNormalizer};
use docfmt_docx::DocxPackage;
use std::path::PathBuf;
use std::process::ExitCode;

/// Restyle a messy .docx into consistent headings, lists and body text.
#[derive(Parser, Debug)]
#[command(name = "docfmt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input Word document (.docx)
    input: PathBuf,

    /// Where to write the polished document
    output: PathBuf,

    /// Font family applied to every paragraph
    #[arg(short, long, default_value = "Arial")]
    font: String,

    /// Print a JSON summary of the classified paragraphs
    #[arg(short, long)]
    report: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(&args) {
        Ok(report) => {
            println!("Success: Polished document saved to {}", args.output.display());
            if args.report {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => log::warn!("Could not serialize report: {}", e),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load, normalize and save a single document.
fn run(args: &Args) -> Result<NormalizeReport> {
    let (package, mut document) = DocxPackage::open(&args.input)?;
    log::debug!("Loaded {} paragraphs", document.paragraphs.len());

    let house = HouseStyle::new().with_font_family(args.font.as_str());
    let report = ParagraphNormalizer::new(house, package.styles().style_map())
        .normalize(&mut document)
        .with_context(|| format!("Cannot normalize {}", args.input.display()))?;

    package.save(&document, &args.output)?;
    Ok(report)
}
