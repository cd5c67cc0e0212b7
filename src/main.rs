use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, warn};

use record_cleaner::config::{delimiter_byte, CleanerConfig, InvalidEmailPolicy};
use record_cleaner::constants::{DEFAULT_ROWS_PER_SPLIT_FILE, ENV_LOG_DIR};
use record_cleaner::observability::{init_logging, init_metrics, render_metrics};
use record_cleaner::pipeline::{RecordValidationPipeline, RunSummary};
use record_cleaner::split::{split_file, SplitConfig};
use record_cleaner::types::FieldValue;
use record_cleaner::validators;

#[derive(Parser)]
#[command(name = "record-cleaner")]
#[command(about = "Clean and validate user record exports")]
#[command(version)]
struct Cli {
    /// Directory for JSON log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a source export into clean, garbage and duplicate files
    Clean {
        /// Delimited source file
        source: PathBuf,
        /// Output for rows passing every check
        #[arg(long)]
        clean: PathBuf,
        /// Output for rows failing the birthday or gender check
        #[arg(long)]
        garbage: PathBuf,
        /// Output for clean rows that occur more than once
        #[arg(long)]
        duplicates: PathBuf,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Rows per chunk (overrides config and environment)
        #[arg(long)]
        chunk_size: Option<usize>,
        /// What to do with rows whose email is missing or invalid: drop | garbage
        #[arg(long)]
        invalid_email: Option<InvalidEmailPolicy>,
        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
        /// Print recorded metrics in Prometheus text format after the run
        #[arg(long)]
        metrics: bool,
    },
    /// Break a large delimited file into smaller files, each with the header
    Split {
        source: PathBuf,
        output_dir: PathBuf,
        #[arg(long, default_value_t = DEFAULT_ROWS_PER_SPLIT_FILE)]
        rows_per_file: u64,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Run a single validator against a value
    Check {
        #[arg(value_enum)]
        kind: CheckKind,
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CheckKind {
    Email,
    LoginId,
    Password,
    Gender,
    Date,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| std::env::var(ENV_LOG_DIR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let _guard = init_logging(&log_dir);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Clean {
            source,
            clean,
            garbage,
            duplicates,
            config,
            chunk_size,
            invalid_email,
            json,
            metrics,
        } => {
            init_metrics();

            let mut cfg = match config {
                Some(path) => CleanerConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => CleanerConfig::default(),
            }
            .apply_env_overrides()?;
            if let Some(size) = chunk_size {
                cfg = cfg.with_chunk_size(size);
            }
            if let Some(policy) = invalid_email {
                cfg = cfg.with_invalid_email_policy(policy);
            }

            let pipeline = RecordValidationPipeline::new(cfg)?;
            let summary = pipeline.run(&source, &clean, &garbage, &duplicates)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            if metrics {
                match render_metrics() {
                    Some(text) => eprintln!("{}", text),
                    None => warn!("No local metrics recorder installed"),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Split {
            source,
            output_dir,
            rows_per_file,
            delimiter,
        } => {
            let config = SplitConfig::default()
                .rows_per_file(rows_per_file)
                .delimiter(delimiter_byte(delimiter)?);
            let result = split_file(&source, &output_dir, &config)?;
            for (path, rows) in result.paths.iter().zip(&result.rows_per_file) {
                println!("Created {} ({} rows)", path.display(), rows);
            }
            println!("✅ {} rows split into {} files", result.total_rows, result.paths.len());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { kind, value } => {
            let valid = check_value(kind, &value);
            println!("{}", if valid { "✅ valid" } else { "❌ invalid" });
            Ok(if valid { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
    }
}

fn check_value(kind: CheckKind, value: &str) -> bool {
    let config = CleanerConfig::default();
    let field = FieldValue::from_raw(value, &config.na_values);
    match kind {
        CheckKind::Email => validators::is_valid_email(&field),
        CheckKind::LoginId => validators::is_valid_login_id(value),
        CheckKind::Password => validators::is_valid_password(value),
        CheckKind::Gender => validators::is_valid_gender(
            &record_cleaner::pipeline::transform::normalize_gender(field),
        ),
        CheckKind::Date => validators::is_valid_date_now(
            &record_cleaner::pipeline::transform::parse_date(&field, &config.date_formats),
        ),
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 Run summary for {}:", summary.source.display());
    println!("   Rows read: {}", summary.rows_read);
    println!("   Clean: {}", summary.rows_clean);
    println!("   Garbage: {}", summary.rows_garbage);
    println!(
        "   Dropped (missing email / invalid email): {} / {}",
        summary.rows_dropped_missing_email, summary.rows_dropped_invalid_email
    );
    println!("   Empty rows: {}", summary.empty_rows);
    println!(
        "   Duplicated: {} ({} groups)",
        summary.rows_duplicated, summary.duplicate_groups
    );
    println!(
        "   Chunks: {} processed, {} failed",
        summary.chunks_processed,
        summary.chunks_failed()
    );
    for failure in &summary.failed_chunks {
        println!("   - chunk {} ({} rows): {}", failure.chunk, failure.rows, failure.message);
    }
    for (label, path) in [
        ("Clean", &summary.clean_output),
        ("Garbage", &summary.garbage_output),
        ("Duplicates", &summary.duplicates_output),
    ] {
        match path {
            Some(p) => println!("   {} output: {}", label, p.display()),
            None => println!("   {} output: (none written)", label),
        }
    }
}
