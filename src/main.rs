use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use listcomp::batch::{self, FileReport, Outcome};
use listcomp::discovery::{self, Input};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "listcomp",
    about = "Rewrite Python accumulator loops as list comprehensions",
    version,
    long_about = "listcomp finds the first module-level `x = []` assignment and the first \
                  `for` loop whose body calls `x.append(value)`, and prints the equivalent \
                  `x = [value for ... in ...]` comprehension.\n\n\
                  Files are only read, never modified."
)]
struct Cli {
    /// Files or directories to process.  Use `-` to read from stdin.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Exclude directories or files whose path contains any of the given
    /// comma-separated names (e.g. --exclude tests,migrations,vendor).
    /// Hidden directories (.git, .venv, __pycache__, etc.) are always excluded
    /// regardless of this flag.
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Emit results as JSON instead of the default text format.
    #[arg(long)]
    json: bool,

    /// Exit with code 0 when some files parsed but held no loop to rewrite.
    /// Syntax errors and unreadable files still give exit code 1.
    #[arg(long)]
    no_exit_code: bool,

    /// Log progress to stderr (-v for debug, -vv for trace).  RUST_LOG
    /// overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let reports = match run(&cli) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            process::exit(2);
        }
    };

    // ── output ────────────────────────────────────────────────────────────────
    if cli.json {
        print_json(&reports);
    } else {
        print_text(&reports);
    }

    let rewritten = reports.iter().filter(|r| r.succeeded()).count();
    tracing::info!(files = reports.len(), rewritten, "done");

    // ── exit code ─────────────────────────────────────────────────────────────
    if exit_code(&reports, cli.no_exit_code) != 0 {
        process::exit(1);
    }
}

/// 1 when any file failed; with `no_exit_code`, only files that could not
/// be read or parsed count.
fn exit_code(reports: &[FileReport], no_exit_code: bool) -> i32 {
    let failed = |r: &FileReport| match &r.outcome {
        Outcome::Refactored(result) => !no_exit_code && !result.succeeded(),
        Outcome::SyntaxError(_) | Outcome::Unreadable(_) => true,
    };
    i32::from(reports.iter().any(failed))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<Vec<FileReport>> {
    let exclude = cli.exclude.clone().unwrap_or_default();
    let inputs = discovery::collect_inputs(&cli.paths, &exclude)?;

    let mut files = Vec::new();
    let mut reports = Vec::new();
    for input in inputs {
        match input {
            Input::File(path) => files.push(path),
            Input::Stdin => {
                let mut source = String::new();
                std::io::stdin()
                    .read_to_string(&mut source)
                    .context("failed to read stdin")?;
                reports.push(batch::refactor_source("<stdin>", &source));
            }
        }
    }
    reports.extend(batch::refactor_files(&files));
    Ok(reports)
}

fn print_text(reports: &[FileReport]) {
    for report in reports {
        match &report.outcome {
            Outcome::Refactored(result) if result.succeeded() => println!("{report}"),
            Outcome::Refactored(_) => println!("{}", report.to_string().yellow()),
            Outcome::SyntaxError(_) | Outcome::Unreadable(_) => {
                println!("{}", report.to_string().red())
            }
        }
    }
    let rewritten = reports.iter().filter(|r| r.succeeded()).count();
    let summary = format!("Rewrote {rewritten} of {} file(s)", reports.len());
    if rewritten == reports.len() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow().bold());
    }
}

/// Emit valid, well-formatted JSON using serde_json.
fn print_json(reports: &[FileReport]) {
    let items: Vec<serde_json::Value> = reports.iter().map(FileReport::to_json).collect();
    let output = json!({
        "results": items,
        "count":   reports.len(),
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            process::exit(2);
        }
    }
}
