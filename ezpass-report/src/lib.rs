//! EZPass Report Library
//!
//! Retrieves a toll account's transponder, vehicle and transaction records and
//! renders each record set as an aligned, titled text table.
//!
//! # Architecture
//!
//! - [`Table`] is a generic, pure renderer driven by named column extractors
//! - [`reports`] holds the fixed column sets for the three reports
//! - [`Orchestrator`] opens a session, then runs the three fetch → render →
//!   write pipelines concurrently and collects one outcome per report
//! - [`SessionProvider`] and [`ReportFetcher`] are the seams to the remote
//!   account; [`HttpClient`] implements both over HTTP
//!
//! Argument parsing, configuration files and logging setup live in the
//! application layer (ezpass-report-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use ezpass_report::{
//!     Credentials, FetchConfig, HttpClient, Orchestrator, ReportRequest, StdoutSink,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let client = HttpClient::new("https://tolls.example.com", Duration::from_secs(60)).unwrap();
//! let orchestrator = Orchestrator::new(client.clone(), client, FetchConfig::new());
//!
//! let request = ReportRequest::new(
//!     ReportRequest::parse_date("20240101").unwrap(),
//!     ReportRequest::parse_date("20240131").unwrap(),
//! )
//! .unwrap();
//!
//! let summary = orchestrator
//!     .run(&Credentials::new("user", "secret"), &request, Arc::new(StdoutSink))
//!     .unwrap();
//!
//! for (kind, error) in summary.failures() {
//!     eprintln!("{}: {}", kind, error);
//! }
//! ```

// Public modules
pub mod client;
pub mod config;
pub mod orchestrator;
pub mod reports;
pub mod source;
pub mod table;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpClient, HttpSession};
pub use config::{FetchConfig, OutputOrder};
pub use orchestrator::{MemorySink, Orchestrator, ReportOutcome, ReportSink, RunSummary, StdoutSink};
pub use source::{ReportFetcher, SessionProvider};
pub use table::{Column, Table};
pub use types::{
    Amount, Charge, ChargeType, Credentials, ReportError, ReportKind, ReportRequest, Result,
    Transaction, Transponder, Vehicle,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
