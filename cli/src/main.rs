//! fillpdf CLI - PDF form template filling tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;

use fillpdf::{
    list_fields, AnswerSet, ExportOptions, ExportRequest, PdfExporter, RetryPolicy, WriteStrategy,
};

#[derive(Parser)]
#[command(name = "fillpdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Fill PDF form templates and export drafts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template and write it to the exports tree
    Export {
        /// Template PDF file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Draft identifier (output file stem)
        #[arg(long, value_name = "ID")]
        draft: String,

        /// User identifier (output subdirectory)
        #[arg(long, value_name = "ID")]
        user: String,

        /// Application content root; exports go to <DIR>/../../storage/exports
        #[arg(long, value_name = "DIR")]
        content_root: PathBuf,

        /// JSON object of answers keyed by field name
        #[arg(short, long, value_name = "FILE")]
        answers: Option<PathBuf>,

        /// Image stamped in the top-right corner of page one
        #[arg(short, long, value_name = "IMAGE")]
        drawing: Option<PathBuf>,

        /// Number of write attempts
        #[arg(long, env = "FILLPDF_MAX_RETRIES", default_value_t = fillpdf::export::DEFAULT_MAX_RETRIES)]
        max_retries: u32,

        /// Pause between write attempts in milliseconds
        #[arg(long, env = "FILLPDF_RETRY_DELAY_MS", default_value = "100")]
        retry_delay_ms: u64,

        /// Write a temporary file and rename it over the destination
        #[arg(long)]
        atomic_rename: bool,

        /// Do not draw the "Form Data:" block
        #[arg(long)]
        no_text_overlay: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        report: bool,
    },

    /// List the form fields of a PDF
    Fields {
        /// Input PDF file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Settings of one `export` invocation.
struct ExportArgs {
    template: PathBuf,
    draft: String,
    user: String,
    content_root: PathBuf,
    answers: Option<PathBuf>,
    drawing: Option<PathBuf>,
    options: ExportOptions,
    report: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            template,
            draft,
            user,
            content_root,
            answers,
            drawing,
            max_retries,
            retry_delay_ms,
            atomic_rename,
            no_text_overlay,
            report,
        } => {
            let strategy = if atomic_rename {
                WriteStrategy::AtomicRename
            } else {
                WriteStrategy::ReplaceInPlace
            };
            let options = ExportOptions::new()
                .with_retry(RetryPolicy::new(
                    max_retries,
                    Duration::from_millis(retry_delay_ms),
                ))
                .with_write_strategy(strategy)
                .with_text_overlay(!no_text_overlay);

            cmd_export(ExportArgs {
                template,
                draft,
                user,
                content_root,
                answers,
                drawing,
                options,
                report,
            })
        }
        Commands::Fields { template, json } => cmd_fields(&template, json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_answers(path: Option<&Path>) -> Result<AnswerSet, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("cannot read answers {}: {}", path.display(), e))?;
            Ok(AnswerSet::from_json(&json)?)
        }
        None => Ok(AnswerSet::new()),
    }
}

fn cmd_export(args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let answers = load_answers(args.answers.as_deref())?;
    log::debug!(
        "Exporting with {} answer(s), retry {:?}",
        answers.len(),
        args.options.retry
    );

    let mut request = ExportRequest::new(&args.template, args.draft, args.user, &args.content_root)
        .with_answers(answers);
    if let Some(drawing) = args.drawing {
        request = request.with_drawing(drawing);
    }

    let outcome = PdfExporter::with_options(args.options).export_with_report(&request)?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for diagnostic in outcome.diagnostics.entries() {
        eprintln!(
            "{} {} '{}': {}",
            "Skipped".yellow(),
            diagnostic.stage,
            diagnostic.subject,
            diagnostic.message
        );
    }
    eprintln!(
        "{} {} field(s), {} bytes",
        "Filled".green(),
        outcome.filled.len(),
        outcome.bytes_written
    );
    println!("{}", outcome.path.display());

    Ok(())
}

fn cmd_fields(template: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let fields = list_fields(template)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    println!("{}", "Form Fields".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    if fields.is_empty() {
        println!("{}", "(no form fields)".dimmed());
        return Ok(());
    }

    for field in &fields {
        let value = field.value.as_deref().unwrap_or("");
        println!(
            "{} {} = {}",
            field.name.bold(),
            format!("[{}]", field.kind).dimmed(),
            value
        );
    }
    println!();
    println!("{}: {}", "Total".bold(), fields.len());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "fillpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF form template filling tool");
    println!();
    println!("License: MIT");
}
