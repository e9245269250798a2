//! Batch parsing: a bounded queue of documents drained by a worker pool.
//!
//! Parsing is CPU-bound and runs on the blocking pool. Transient I/O
//! failures are retried with doubling backoff; structural parse errors are
//! written next to the successful outputs as `{"error", "detail"}` objects.

use anyhow::{Context, Result};
use extracto_core::ParseError;
use extracto_ingest::{Bank, ParsedDocument, SheetHints, parse_with};
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{BatchSection, OutputSection};
use crate::input::{InputFormat, load_source};

#[derive(Debug, Clone)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub bank: Bank,
    pub sheet: SheetHints,
    pub output: OutputSection,
    pub batch: BatchSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub parsed: usize,
    pub rejected: usize,
    pub failed: usize,
    pub records: usize,
}

impl BatchSummary {
    fn absorb(&mut self, other: BatchSummary) {
        self.parsed += other.parsed;
        self.rejected += other.rejected;
        self.failed += other.failed;
        self.records += other.records;
    }
}

#[derive(Debug)]
enum Outcome {
    Parsed(usize),
    Rejected(&'static str),
}

/// Io errors worth another attempt. Missing files and bad data stay failed.
pub fn is_transient(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|e| {
            !matches!(
                e.kind(),
                io::ErrorKind::NotFound
                    | io::ErrorKind::PermissionDenied
                    | io::ErrorKind::InvalidData
                    | io::ErrorKind::InvalidInput
                    | io::ErrorKind::AlreadyExists
            )
        })
}

fn backoff(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(1u64 << attempt.min(16)))
}

const STATEMENT_EXTENSIONS: [&str; 8] =
    ["txt", "csv", "json", "xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Files in `dir` that look like statements, sorted for stable output.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| STATEMENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if path.is_file() && wanted {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

pub fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{stem}.json"))
}

pub fn render_document(mut doc: ParsedDocument, output: &OutputSection) -> Result<String> {
    if !output.include_diagnostics {
        doc.diagnostics.clear();
    }
    let s = if output.pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    };
    s.context("serialize document")
}

pub fn render_error(err: &ParseError) -> String {
    json!({ "error": err.code(), "detail": err.to_string() }).to_string()
}

async fn process(job: &BatchJob, opts: &BatchOptions) -> Result<Outcome> {
    let input = job.input.clone();
    let sheet = opts.sheet.clone();
    let bank = opts.bank;
    let parsed = tokio::task::spawn_blocking(move || {
        let format = InputFormat::detect(&input, false);
        let source = load_source(&input, format, &sheet)?;
        Ok::<_, anyhow::Error>(parse_with(bank, source))
    })
    .await
    .context("parse task panicked")??;

    let (body, outcome) = match parsed {
        Ok(doc) => {
            let records = doc.records.len();
            (render_document(doc, &opts.output)?, Outcome::Parsed(records))
        }
        Err(err) => (render_error(&err), Outcome::Rejected(err.code())),
    };
    tokio::fs::write(&job.output, body)
        .await
        .with_context(|| format!("write {}", job.output.display()))?;
    Ok(outcome)
}

async fn run_worker(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<BatchJob>>>,
    opts: Arc<BatchOptions>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    loop {
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else { break };

        let mut attempt = 0;
        loop {
            match process(&job, &opts).await {
                Ok(Outcome::Parsed(records)) => {
                    debug!(worker = id, input = %job.input.display(), records, "parsed");
                    summary.parsed += 1;
                    summary.records += records;
                }
                Ok(Outcome::Rejected(code)) => {
                    warn!(worker = id, input = %job.input.display(), code, "rejected");
                    summary.rejected += 1;
                }
                Err(e) if is_transient(&e) && attempt < opts.batch.max_retries => {
                    let wait = backoff(opts.batch.backoff_ms, attempt);
                    warn!(
                        worker = id,
                        input = %job.input.display(),
                        attempt,
                        ?wait,
                        "retrying: {e:#}"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => {
                    warn!(worker = id, input = %job.input.display(), "failed: {e:#}");
                    summary.failed += 1;
                }
            }
            break;
        }
    }
    summary
}

/// Parse every input into `out_dir`, one JSON file per document.
pub async fn run_batch(
    inputs: Vec<PathBuf>,
    out_dir: &Path,
    opts: BatchOptions,
) -> Result<BatchSummary> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("create {}", out_dir.display()))?;

    let workers = opts.batch.workers.max(1);
    let (tx, rx) = mpsc::channel::<BatchJob>(opts.batch.queue_capacity.max(1));
    let rx = Arc::new(Mutex::new(rx));
    let opts = Arc::new(opts);

    let mut pool = JoinSet::new();
    for id in 0..workers {
        pool.spawn(run_worker(id, rx.clone(), opts.clone()));
    }

    info!(bank = opts.bank.key(), documents = inputs.len(), workers, "batch started");
    for input in inputs {
        let job = BatchJob {
            output: output_path(out_dir, &input),
            input,
        };
        // Blocks while the queue is full.
        tx.send(job).await.context("worker pool stopped")?;
    }
    drop(tx);

    let mut summary = BatchSummary::default();
    while let Some(done) = pool.join_next().await {
        summary.absorb(done.context("worker panicked")?);
    }
    info!(
        parsed = summary.parsed,
        rejected = summary.rejected,
        failed = summary.failed,
        "batch finished"
    );
    Ok(summary)
}
