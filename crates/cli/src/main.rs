//! CLI tool for converting chat transcripts into fine-tuning datasets.
//!
//! Reads every `.jsonl` transcript in the input directory and writes ShareGPT
//! (one conversation per line) or Alpaca (JSON array) output, optionally
//! anonymizing the user's name with generated first names.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chatlog_converter_core::{
    convert_directory, supported_formats, ConversionOptions, Gender, OutputFormat,
    TemplateConfig,
};

/// Convert chat transcripts to ShareGPT or Alpaca datasets.
#[derive(Parser, Debug)]
#[command(name = "chatlog-convert")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing .jsonl transcripts
    #[arg(long, default_value = "ToConvert")]
    input_dir: PathBuf,

    /// Output directory (created if missing)
    #[arg(long, default_value = "Converted")]
    output_dir: PathBuf,

    /// Output format
    #[arg(long, default_value = "sharegpt")]
    format: String,

    /// Prefix messages with their reasoning in <think> tags
    #[arg(long)]
    reasoning: bool,

    /// Replace the user's name with generated names
    #[arg(long)]
    anonymize: bool,

    /// Draw generated names from one pool (male or female)
    #[arg(long, requires = "anonymize")]
    gender: Option<String>,

    /// Base seed for generated names (defaults to a random seed per file)
    #[arg(long, requires = "anonymize")]
    seed: Option<u64>,

    /// Delete each source file after it was converted
    #[arg(long)]
    delete: bool,

    /// Merge all outputs into a single file
    #[arg(long)]
    combine: bool,

    /// File name (without extension) of the merged output
    #[arg(long, default_value = "combined", requires = "combine")]
    combined_name: String,

    /// Template configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    // Resolve everything that can fail before any file is touched.
    let format: OutputFormat = args.format.parse()?;
    let user_gender = args.gender.as_deref().map(str::parse::<Gender>).transpose()?;
    let templates = TemplateConfig::load_or_default(&args.config);

    let options = ConversionOptions {
        format,
        include_reasoning: args.reasoning,
        anonymize_names: args.anonymize,
        user_gender,
        seed: args.seed,
        delete_original_file: args.delete,
        combine: args.combine.then(|| args.combined_name.clone()),
    };

    tracing::info!(
        "Converting {:?} to {} (supported: {})",
        args.input_dir,
        format,
        supported_formats().join(", ")
    );
    let summary = convert_directory(&args.input_dir, &args.output_dir, &options, &templates)?;

    println!("\n[summary]");
    println!("  Format: {}", format);
    println!("  Files found: {}", summary.total_files);
    println!("  Files converted: {}", summary.converted.len());
    println!("  Files failed: {}", summary.failures.len());
    println!("  Entries read: {}", summary.total_entries());
    println!("  Entries converted: {}", summary.converted_entries());
    match &summary.combined_path {
        Some(path) => println!("  Output: {:?}", path),
        None => println!("  Output: {:?}", args.output_dir),
    }
    for failure in &summary.failures {
        println!("  Failed: {:?}: {}", failure.source_path, failure.error);
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
