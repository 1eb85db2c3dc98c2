//! Reading Timer CLI
//!
//! Segmentation and reading-time estimation for Spanish study articles.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reading_timer::{
    analyzer::{analyze_file, collect_documents},
    config::Config,
    persistence::{load_result, result_exists, result_size, save_result},
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Reading Timer - a reading-time estimator for study articles
#[derive(Parser)]
#[command(name = "reading-timer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one document and print the timed outline
    Analyze {
        /// Path to the document (plain text, or a .json span dump)
        document: PathBuf,

        /// Save the analysis to this path (.json or .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reading pace in words per minute (100-300)
        #[arg(long)]
        wpm: Option<u32>,

        /// Seconds allotted per question (10-120)
        #[arg(long)]
        answer_time: Option<u32>,

        /// Print the analysis as JSON instead of the formatted outline
        #[arg(long)]
        json: bool,
    },

    /// Analyze every document in a directory
    Batch {
        /// Directory holding the documents
        dir: PathBuf,

        /// Directory to write one analysis file per document
        #[arg(short, long, default_value = "analyses")]
        output: PathBuf,

        /// Reading pace in words per minute (100-300)
        #[arg(long)]
        wpm: Option<u32>,

        /// Seconds allotted per question (10-120)
        #[arg(long)]
        answer_time: Option<u32>,
    },

    /// Display a saved analysis
    Show {
        /// Path to the analysis file
        #[arg(default_value = "analysis.json")]
        result: PathBuf,

        /// Output as JSON instead of the formatted outline
        #[arg(long)]
        json: bool,
    },

    /// Show summary information about a saved analysis
    Info {
        /// Path to the analysis file
        #[arg(default_value = "analysis.json")]
        result: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            document,
            output,
            wpm,
            answer_time,
            json,
        } => cmd_analyze(document, output, wpm, answer_time, json),
        Commands::Batch {
            dir,
            output,
            wpm,
            answer_time,
        } => cmd_batch(dir, output, wpm, answer_time),
        Commands::Show { result, json } => cmd_show(result, json),
        Commands::Info { result } => cmd_info(result),
    }
}

/// Layer CLI overrides over the loaded configuration and range-check the
/// final values.
fn effective_config(wpm: Option<u32>, answer_time: Option<u32>) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(wpm) = wpm {
        config.timing.words_per_minute = wpm;
    }
    if let Some(answer) = answer_time {
        config.timing.answer_time_seconds = answer;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn cmd_analyze(
    document: PathBuf,
    output: Option<PathBuf>,
    wpm: Option<u32>,
    answer_time: Option<u32>,
    json: bool,
) -> Result<()> {
    let config = effective_config(wpm, answer_time)?;

    let start = Instant::now();
    let result = analyze_file(&document, config.timing_options())
        .with_context(|| format!("Failed to analyze '{}'", document.display()))?;
    let duration = start.elapsed();

    if json {
        println!("{}", result.to_json().context("Failed to serialize analysis")?);
    } else {
        println!("{}", result.format());
        println!("  analyzed in {:.2?}", duration);
    }

    if let Some(output) = output {
        save_result(&result, &output).context("Failed to save analysis")?;
        let size = result_size(&output)?;
        println!("\nAnalysis saved to: {}", output.display());
        println!("  File size: {:.1} KB", size as f64 / 1024.0);
    }

    Ok(())
}

fn cmd_batch(
    dir: PathBuf,
    output: PathBuf,
    wpm: Option<u32>,
    answer_time: Option<u32>,
) -> Result<()> {
    let config = effective_config(wpm, answer_time)?;
    let documents = collect_documents(&dir)?;

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create '{}'", output.display()))?;

    if documents.is_empty() {
        println!("No .txt or .json documents found in '{}'", dir.display());
        return Ok(());
    }

    println!("Analyzing {} documents...\n", documents.len());

    let mut failures = 0usize;
    for path in &documents {
        match analyze_file(path, config.timing_options()) {
            Ok(result) => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("analysis");
                let target = output.join(format!("{}.json", stem));
                save_result(&result, &target)
                    .with_context(|| format!("Failed to save '{}'", target.display()))?;
                println!(
                    "  {} -> {} paragraphs, {} questions",
                    path.display(),
                    result.total_paragraphs,
                    result.total_questions
                );
            }
            Err(e) => {
                failures += 1;
                println!("  {} -> FAILED: {}", path.display(), e);
            }
        }
    }

    println!(
        "\nDone: {} analyzed, {} failed. Output in '{}'",
        documents.len() - failures,
        failures,
        output.display()
    );

    Ok(())
}

fn cmd_show(result_path: PathBuf, json: bool) -> Result<()> {
    if !result_exists(&result_path) {
        anyhow::bail!(
            "Analysis not found at '{}'. Run 'analyze' first.",
            result_path.display()
        );
    }

    let result = load_result(&result_path).context("Failed to load analysis")?;

    if json {
        println!("{}", result.to_json().context("Failed to serialize analysis")?);
    } else {
        println!("{}", result.format());
    }

    Ok(())
}

fn cmd_info(result_path: PathBuf) -> Result<()> {
    if !result_exists(&result_path) {
        anyhow::bail!(
            "Analysis not found at '{}'. Run 'analyze' first.",
            result_path.display()
        );
    }

    let result = load_result(&result_path).context("Failed to load analysis")?;
    let size = result_size(&result_path)?;

    println!("Analysis Information");
    println!("{}", "─".repeat(40));
    println!("  Document:         {}", result.filename);
    println!("  Paragraphs:       {}", result.total_paragraphs);
    println!("  Questions:        {}", result.total_questions);
    println!("  Words:            {}", result.total_words);
    println!(
        "  Reading time:     {:.0}s",
        result.total_reading_time_seconds
    );
    println!(
        "  Question time:    {:.0}s",
        result.total_question_time_seconds
    );
    println!("  Session length:   {:.0}s", result.total_time_seconds);
    println!("  Final questions:  {}", result.final_questions.len());
    println!("  File size:        {:.1} KB", size as f64 / 1024.0);
    println!("  Analysis path:    {}", result_path.display());

    if let Some(title) = &result.final_questions_title {
        println!("  Final title:      {}", title);
    }

    Ok(())
}
