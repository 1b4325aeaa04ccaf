mod debug_report;
mod logging;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use gearmatch::{BatchSummary, Category, Context, Record, Resolver, ResolverConfig, resolve_records};
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_CATALOG_DIR: &str = "data";

#[derive(Parser)]
#[command(name = "gearmatch", version)]
#[command(about = "Resolve free-text shaving gear mentions against curated catalogs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Catalog directory (razors.yaml, blades.yaml, ..., correct_matches.yaml).
    #[arg(long, global = true, default_value = DEFAULT_CATALOG_DIR)]
    catalog: PathBuf,

    /// Resolver tuning file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one mention and show how each tier decided.
    Resolve {
        /// razor, blade, brush or soap.
        category: Category,

        /// Mention text. Reads stdin when omitted.
        text: Vec<String>,

        /// Format of the razor used with a blade (DE, GEM, AC, ...).
        #[arg(long)]
        razor_format: Option<String>,

        /// Print the result and trace as JSON.
        #[arg(long)]
        json: bool,

        /// Force ANSI color output.
        #[arg(long, conflicts_with = "no_color")]
        color: bool,

        /// Disable ANSI color output.
        #[arg(long)]
        no_color: bool,
    },

    /// Enrich a JSON array of records.
    Batch {
        /// Input file, or `-` for stdin.
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file, or `-` for stdout.
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print the output JSON.
        #[arg(long)]
        pretty: bool,
    },

    /// Load the catalogs and verify every curated string still resolves exactly.
    Check,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => {
            ResolverConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => ResolverConfig::default(),
    };
    let resolver = Resolver::from_dir(&cli.catalog, config)
        .with_context(|| format!("failed to load catalogs from {}", cli.catalog.display()))?;

    match cli.command {
        Command::Resolve { category, text, razor_format, json, color, no_color } => {
            let text = if text.is_empty() { read_input(Path::new("-"))? } else { text.join(" ") };
            if text.trim().is_empty() {
                bail!("no mention text provided");
            }

            let context = Context { razor_format };
            let verbose = resolver.resolve_verbose_with(category, text.trim_end_matches('\n'), &context);
            if json {
                println!("{}", serde_json::to_string_pretty(&verbose)?);
            } else {
                let color = color || (!no_color && io::stdout().is_terminal());
                debug_report::print_run(category, &verbose, color);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Batch { input, output, pretty } => {
            let content = read_input(&input)?;
            let records: Vec<Record> =
                serde_json::from_str(&content).with_context(|| format!("invalid records in {}", input.display()))?;

            let enriched = resolve_records(&resolver, &records);
            BatchSummary::from_records(&enriched).log();

            let json =
                if pretty { serde_json::to_string_pretty(&enriched)? } else { serde_json::to_string(&enriched)? };
            write_output(&output, &json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let failures = resolver.self_check();
            debug_report::print_check(&resolver, &failures, io::stdout().is_terminal());
            Ok(if failures.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if path == Path::new("-") {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{content}")?;
        return Ok(());
    }
    fs::write(path, format!("{content}\n")).with_context(|| format!("failed to write {}", path.display()))
}
