use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use extracto_ingest::{Bank, SheetHints, parse_with};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod input;
mod state;
mod worker;

use input::{InputFormat, load_source};
use worker::{BatchOptions, collect_inputs, render_document, run_batch};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("EXTRACTO_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "extracto", version = VERSION, about = "Colombian bank statement parser")]
struct Cli {
    /// Debug logging (overrides RUST_LOG and the config file)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported banks and the input each one reads
    Banks,

    /// Parse one statement and print canonical records as JSON
    Parse {
        /// Bank key, e.g. bancolombia, bogota, itau, textract
        #[arg(long)]
        bank: String,

        /// Statement file: extracted text, .csv/.xlsx/.xls export or OCR .json
        #[arg(long)]
        input: PathBuf,

        /// Treat the input as OCR blocks JSON regardless of extension
        #[arg(long)]
        blocks: bool,

        /// Write JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Parse every statement in a directory with a worker pool
    Batch {
        #[arg(long)]
        bank: String,

        #[arg(long)]
        dir: PathBuf,

        /// Output directory; one <name>.json per input
        #[arg(long)]
        out: PathBuf,

        /// Worker count (default from config)
        #[arg(long)]
        workers: Option<usize>,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Manage ~/.extracto/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

/// Spreadsheet header hints; unset flags fall back to the config file.
#[derive(Args, Debug)]
struct SheetArgs {
    /// Workbook sheet, by name or zero-based index
    #[arg(long)]
    worksheet: Option<String>,

    /// Header row index, counted after --skip-rows
    #[arg(long)]
    header_row: Option<usize>,

    /// Rows to drop before looking for the header
    #[arg(long)]
    skip_rows: Option<usize>,

    /// Keep blank and `Unnamed: N` columns
    #[arg(long)]
    keep_unnamed: bool,
}

impl SheetArgs {
    fn apply(&self, mut hints: SheetHints) -> SheetHints {
        if let Some(sheet) = &self.worksheet {
            hints.worksheet = Some(sheet.clone());
        }
        if let Some(row) = self.header_row {
            hints.header_row = row;
        }
        if let Some(skip) = self.skip_rows {
            hints.skip_rows = skip;
        }
        if self.keep_unnamed {
            hints.remove_unnamed_columns = false;
        }
        hints
    }
}

fn init_tracing(verbose: bool, configured: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_tracing(cli.verbose, &cfg.log_level);

    match cli.command {
        Command::Banks => {
            for bank in Bank::ALL {
                println!(
                    "{:<12} {:<22} {}",
                    bank.key(),
                    bank.display_name(),
                    bank.grammar().kind()
                );
            }
        }

        Command::Parse {
            bank,
            input,
            blocks,
            output,
            pretty,
            sheet,
        } => {
            let bank: Bank = bank.parse()?;
            if !input.exists() {
                bail!("Input not found: {}", input.display());
            }
            let hints = sheet.apply(cfg.sheet.clone());
            let source = load_source(&input, InputFormat::detect(&input, blocks), &hints)?;

            let doc = match parse_with(bank, source) {
                Ok(doc) => doc,
                Err(err) => bail!("{} ({}): {err}", input.display(), err.code()),
            };
            if !doc.diagnostics.is_empty() {
                tracing::warn!(rows = doc.diagnostics.len(), "some rows could not be normalized");
            }

            let mut out_cfg = cfg.output.clone();
            out_cfg.pretty |= pretty;
            let body = render_document(doc, &out_cfg)?;
            match output {
                Some(p) => {
                    std::fs::write(&p, body).with_context(|| format!("write {}", p.display()))?;
                    println!("Wrote {}", p.display());
                }
                None => println!("{body}"),
            }
        }

        Command::Batch {
            bank,
            dir,
            out,
            workers,
            sheet,
        } => {
            let bank: Bank = bank.parse()?;
            let inputs = collect_inputs(&dir)?;
            if inputs.is_empty() {
                bail!("No statements (.txt, .csv, .xlsx, .xls, .json) in {}", dir.display());
            }

            let mut batch = cfg.batch.clone();
            if let Some(n) = workers {
                batch.workers = n;
            }
            let opts = BatchOptions {
                bank,
                sheet: sheet.apply(cfg.sheet.clone()),
                output: cfg.output.clone(),
                batch,
            };
            let summary = run_batch(inputs, &out, opts).await?;
            println!(
                "Parsed {} documents ({} records), rejected {}, failed {} -> {}",
                summary.parsed,
                summary.records,
                summary.rejected,
                summary.failed,
                out.display()
            );
            if summary.failed > 0 {
                bail!("{} documents failed", summary.failed);
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}
