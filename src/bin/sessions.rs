//! Sessions CLI - command-line interface for classifier session statistics
//!
//! Commands:
//! - compute: Segment sessions and write one summary row per classifier
//! - validate: Check that every export record can be ingested

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use classifier_sessions::encoder::{
    day_range, default_output_path, render_corpus_summary, write_csv, CorpusReport,
    TrendPlaceholder, DEFAULT_OUTPUT_STEM,
};
use classifier_sessions::schema::{distinct_subjects, ClassificationAdapter, ClassificationRecord};
use classifier_sessions::{
    NegativeLengthPolicy, SessionConfig, SessionError, SessionProcessor, SESSIONS_VERSION,
};

/// Sessions - engagement statistics from classification exports
#[derive(Parser)]
#[command(name = "sessions")]
#[command(version = SESSIONS_VERSION)]
#[command(about = "Compute per-classifier session statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment sessions and write per-classifier statistics as CSV
    Compute {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path (use - for stdout); defaults to a name spanning the input's dates
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// JSON configuration file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Idle gap in minutes that starts a new session
        #[arg(long)]
        session_break: Option<f64>,

        /// Number of classifiers on the leaderboard
        #[arg(long)]
        leaderboard: Option<usize>,

        /// Worker threads for per-classifier processing
        #[arg(long)]
        workers: Option<usize>,

        /// What to do when finished_at precedes started_at
        #[arg(long)]
        negative_lengths: Option<NegativeLengths>,

        /// How to write trend metrics for classifiers with fewer than four sessions
        #[arg(long, default_value = "na")]
        placeholder: Placeholder,

        /// Write the corpus summary as JSON to this path instead of printing it
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check that every record can be ingested
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Comma-separated export with a header row and JSON-encoded metadata
    Csv,
    /// Newline-delimited JSON (one classification per line)
    Ndjson,
    /// JSON array of classifications
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum NegativeLengths {
    /// Abort the run
    Reject,
    /// Count the classification as zero-length
    Clamp,
}

#[derive(Clone, Copy, ValueEnum)]
enum Placeholder {
    /// Write NA
    Na,
    /// Write 0
    Zero,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SessionsCliError> {
    match cli.command {
        Commands::Compute {
            input,
            output,
            input_format,
            config,
            session_break,
            leaderboard,
            workers,
            negative_lengths,
            placeholder,
            report,
        } => {
            let mut config = match config {
                Some(path) => SessionConfig::from_json(&fs::read_to_string(path)?)?,
                None => SessionConfig::default(),
            };
            if let Some(minutes) = session_break {
                config = config.with_session_break(minutes);
            }
            if let Some(size) = leaderboard {
                config = config.with_leaderboard_size(size);
            }
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            if let Some(policy) = negative_lengths {
                config = config.with_negative_length_policy(match policy {
                    NegativeLengths::Reject => NegativeLengthPolicy::Reject,
                    NegativeLengths::Clamp => NegativeLengthPolicy::Clamp,
                });
            }
            let placeholder = match placeholder {
                Placeholder::Na => TrendPlaceholder::NotApplicable,
                Placeholder::Zero => TrendPlaceholder::Zero,
            };

            cmd_compute(
                &input,
                output.as_deref(),
                input_format,
                config,
                placeholder,
                report.as_deref(),
            )
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
    }
}

fn read_records(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<ClassificationRecord>, SessionsCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match input_format {
        InputFormat::Csv => ClassificationAdapter::parse_csv(&input_data)?,
        InputFormat::Ndjson => ClassificationAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => ClassificationAdapter::parse_array(&input_data)?,
    };
    Ok(records)
}

fn cmd_compute(
    input: &Path,
    output: Option<&Path>,
    input_format: InputFormat,
    config: SessionConfig,
    placeholder: TrendPlaceholder,
    report: Option<&Path>,
) -> Result<(), SessionsCliError> {
    let processor = SessionProcessor::new(config)?;

    tracing::info!(
        input = %input.display(),
        session_break_minutes = processor.config().session_break_minutes,
        "reading classifications"
    );
    let records = read_records(input, &input_format)?;
    if records.is_empty() {
        return Err(SessionsCliError::NoRecords);
    }

    let total_subjects = distinct_subjects(&records);
    let events = ClassificationAdapter::default().to_events(&records)?;
    let (first_day, last_day) = day_range(&events).ok_or(SessionsCliError::NoRecords)?;

    let result = processor.process(events, total_subjects)?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(DEFAULT_OUTPUT_STEM, first_day, last_day),
    };
    if output.to_string_lossy() == "-" {
        write_csv(io::stdout().lock(), &result.rows, placeholder)?;
    } else {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_csv(fs::File::create(&output)?, &result.rows, placeholder)?;
        tracing::info!(output = %output.display(), rows = result.rows.len(), "wrote session stats");
    }

    match report {
        Some(path) => {
            let corpus_report =
                CorpusReport::new(result.corpus, processor.config().session_break_minutes);
            fs::write(path, corpus_report.to_json()?)?;
        }
        None => eprint!("{}", render_corpus_summary(&result.corpus)),
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), SessionsCliError> {
    let records = read_records(input, &input_format)?;
    let issues = ClassificationAdapter::default().validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - issues.len(),
        invalid_records: issues.len(),
        errors: issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                index: issue.index,
                user_name: issue.user_name.clone(),
                error: issue.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} (index {}): {}", err.user_name, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(SessionsCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

#[derive(Debug)]
enum SessionsCliError {
    Io(io::Error),
    Session(SessionError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
}

impl From<io::Error> for SessionsCliError {
    fn from(e: io::Error) -> Self {
        SessionsCliError::Io(e)
    }
}

impl From<SessionError> for SessionsCliError {
    fn from(e: SessionError) -> Self {
        SessionsCliError::Session(e)
    }
}

impl From<serde_json::Error> for SessionsCliError {
    fn from(e: serde_json::Error) -> Self {
        SessionsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SessionsCliError> for CliError {
    fn from(e: SessionsCliError) -> Self {
        match e {
            SessionsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SessionsCliError::Session(e) => {
                let (code, hint) = match &e {
                    SessionError::MalformedEvent(_) | SessionError::DateParseError(_) => (
                        "MALFORMED_EVENT",
                        "Run 'sessions validate' for details",
                    ),
                    SessionError::NegativeClassLength { .. } => (
                        "NEGATIVE_CLASS_LENGTH",
                        "Pass --negative-lengths clamp to count these as zero-length",
                    ),
                    SessionError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Check --session-break, --leaderboard and --workers")
                    }
                    SessionError::ParseError(_) | SessionError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Ensure input is a classification export and --input-format matches it",
                    ),
                    SessionError::CsvError(_) => {
                        ("CSV_ERROR", "Check that the output path is writable")
                    }
                    SessionError::NoActors => ("NO_ACTORS", "Ensure input file is not empty"),
                    SessionError::InvariantViolation(_) => {
                        ("INTERNAL_ERROR", "This is a bug; please report it")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            SessionsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SessionsCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No classifications found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SessionsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    user_name: String,
    error: String,
}
