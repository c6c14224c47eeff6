//! Concurrent report fetch orchestrator
//!
//! A run has two phases:
//! 1. Open the session. This is a blocking prerequisite; if it fails nothing
//!    else happens and the error is returned.
//! 2. Run the three report pipelines (fetch → render → write) concurrently on
//!    a fixed-size worker pool and collect one outcome per report.
//!
//! A failed pipeline never stops its siblings. Each table reaches the sink as
//! a single `emit` call, so concurrent pipelines cannot interleave output.
//! A pipeline still running at the deadline is reported as timed out and its
//! table is never written, even if the fetch finishes later.

use crate::config::{FetchConfig, OutputOrder};
use crate::reports::{transaction_table, transponder_table, vehicle_table};
use crate::source::{ReportFetcher, SessionProvider};
use crate::table::Table;
use crate::types::{Credentials, ReportError, ReportKind, ReportRequest, Result};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Destination for rendered tables
pub trait ReportSink: Send + Sync {
    /// Write one complete table block
    fn emit(&self, block: &str) -> io::Result<()>;
}

/// Writes each block to standard output under a single stdout lock
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn emit(&self, block: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(block.as_bytes())?;
        handle.flush()
    }
}

/// Collects blocks in memory, in the order they were emitted
#[derive(Debug, Default)]
pub struct MemorySink {
    blocks: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the emitted blocks
    pub fn blocks(&self) -> Vec<String> {
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// All emitted blocks concatenated
    pub fn contents(&self) -> String {
        self.blocks().concat()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, block: &str) -> io::Result<()> {
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(block.to_string());
        Ok(())
    }
}

/// Outcome of one report pipeline
#[derive(Debug)]
pub struct ReportOutcome {
    pub kind: ReportKind,
    /// Number of rendered rows on success
    pub result: Result<usize>,
}

/// Outcomes of all report pipelines, in report order
#[derive(Debug)]
pub struct RunSummary {
    outcomes: Vec<ReportOutcome>,
}

impl RunSummary {
    pub fn outcomes(&self) -> &[ReportOutcome] {
        &self.outcomes
    }

    /// Every failed report with its error
    pub fn failures(&self) -> impl Iterator<Item = (ReportKind, &ReportError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.kind, e)))
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Rendered row count for a report, if it succeeded
    pub fn rows(&self, kind: ReportKind) -> Option<usize> {
        self.outcomes
            .iter()
            .find(|o| o.kind == kind)
            .and_then(|o| o.result.as_ref().ok().copied())
    }
}

impl FromIterator<ReportOutcome> for RunSummary {
    fn from_iter<I: IntoIterator<Item = ReportOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// A rendered table waiting to be written
struct Rendered {
    text: String,
    rows: usize,
}

/// Runs the session and the three report pipelines
pub struct Orchestrator<P, F> {
    provider: P,
    fetcher: Arc<F>,
    config: FetchConfig,
}

impl<P, F> Orchestrator<P, F>
where
    P: SessionProvider,
    F: ReportFetcher<P::Session> + 'static,
{
    pub fn new(provider: P, fetcher: F, config: FetchConfig) -> Self {
        Self {
            provider,
            fetcher: Arc::new(fetcher),
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Open a session, run all report pipelines and write their tables to `sink`
    ///
    /// # Returns
    /// * `Err` if the session could not be opened (no report was attempted)
    /// * `Ok(RunSummary)` otherwise, with one outcome per report
    pub fn run<S>(
        &self,
        credentials: &Credentials,
        request: &ReportRequest,
        sink: Arc<S>,
    ) -> Result<RunSummary>
    where
        S: ReportSink + 'static,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count())
            .thread_name(|i| format!("report-fetch-{}", i))
            .panic_handler(|_| log::warn!("Report worker panicked"))
            .build()
            .map_err(|e| ReportError::WorkerPool(e.to_string()))?;

        log::info!("Opening session for user '{}'", credentials.username);
        let session = pool.install(|| self.provider.open_session(credentials))?;
        let session = Arc::new(session);
        log::debug!("Session opened");

        let order = self.config.output_order;
        let (tx, rx) = mpsc::channel();
        // Closed by `collect` at the deadline; a pipeline finishing later is dropped
        let gate = Arc::new(Mutex::new(false));

        for kind in ReportKind::ALL {
            let session = Arc::clone(&session);
            let fetcher = Arc::clone(&self.fetcher);
            let sink = Arc::clone(&sink);
            let gate = Arc::clone(&gate);
            let tx = tx.clone();
            let request = *request;

            pool.spawn(move || {
                let outcome = run_pipeline(kind, &*fetcher, &*session, &request);

                // Emit and send under the gate lock, so a table is either
                // written and reported, or neither
                let closed = lock(&gate);
                if *closed {
                    log::debug!("{} report finished after the deadline, discarding it", kind);
                    return;
                }
                let outcome = outcome.and_then(|rendered| {
                    if order == OutputOrder::Completion {
                        sink.emit(&rendered.text)?;
                    }
                    Ok(rendered)
                });
                if tx.send((kind, outcome)).is_err() {
                    log::debug!("{} report finished after the run returned", kind);
                }
                drop(closed);
            });
        }
        drop(tx);

        let mut results = self.collect(&rx, &gate);

        if order == OutputOrder::Fixed {
            for kind in ReportKind::ALL {
                let emitted = match results.get(&kind) {
                    Some(Ok(rendered)) => sink.emit(&rendered.text),
                    _ => Ok(()),
                };
                if let Err(e) = emitted {
                    results.insert(kind, Err(ReportError::Output(e)));
                }
            }
        }

        Ok(ReportKind::ALL
            .into_iter()
            .map(|kind| ReportOutcome {
                kind,
                result: results
                    .remove(&kind)
                    .unwrap_or(Err(ReportError::WorkerLost(kind)))
                    .map(|rendered| rendered.rows),
            })
            .collect())
    }

    /// Wait for one outcome per report, bounded by the configured timeout
    ///
    /// Failures are only logged at debug level here; surfacing them is left to
    /// the caller through `RunSummary::failures`.
    fn collect(
        &self,
        rx: &mpsc::Receiver<(ReportKind, Result<Rendered>)>,
        gate: &Mutex<bool>,
    ) -> BTreeMap<ReportKind, Result<Rendered>> {
        let timeout = self.config.timeout();
        let deadline = Instant::now() + timeout;
        let mut results = BTreeMap::new();

        while results.len() < ReportKind::ALL.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((kind, outcome)) => record(&mut results, kind, outcome),
                Err(RecvTimeoutError::Timeout) => {
                    let mut closed = lock(gate);
                    *closed = true;

                    // Outcomes sent before the gate closed still count
                    while let Ok((kind, outcome)) = rx.try_recv() {
                        record(&mut results, kind, outcome);
                    }
                    for kind in ReportKind::ALL {
                        results.entry(kind).or_insert_with(|| {
                            log::debug!("{} report still pending after {:?}", kind, timeout);
                            Err(ReportError::TimedOut { kind, timeout })
                        });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    for kind in ReportKind::ALL {
                        results
                            .entry(kind)
                            .or_insert(Err(ReportError::WorkerLost(kind)));
                    }
                }
            }
        }

        results
    }
}

fn record(
    results: &mut BTreeMap<ReportKind, Result<Rendered>>,
    kind: ReportKind,
    outcome: Result<Rendered>,
) {
    match &outcome {
        Ok(rendered) => log::info!("{} report: {} rows", kind, rendered.rows),
        Err(e) => log::debug!("{} report failed: {}", kind, e),
    }
    results.insert(kind, outcome);
}

fn lock(gate: &Mutex<bool>) -> MutexGuard<'_, bool> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fetch one report and render it with its fixed column set
fn run_pipeline<S, F>(
    kind: ReportKind,
    fetcher: &F,
    session: &S,
    request: &ReportRequest,
) -> Result<Rendered>
where
    F: ReportFetcher<S> + ?Sized,
{
    log::debug!("Fetching {} report", kind);
    match kind {
        ReportKind::Transponders => Ok(render(&transponder_table(), fetcher.fetch_transponders(session)?)),
        ReportKind::Vehicles => Ok(render(&vehicle_table(), fetcher.fetch_vehicles(session)?)),
        ReportKind::Transactions => Ok(render(
            &transaction_table(),
            fetcher.fetch_transactions(session, request)?,
        )),
    }
}

fn render<T>(table: &Table<T>, records: Vec<T>) -> Rendered {
    Rendered {
        text: table.render(&records),
        rows: records.len(),
    }
}
