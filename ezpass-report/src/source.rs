//! Contracts for the remote account collaborators
//!
//! The orchestrator only depends on these traits. The HTTP implementation lives
//! in [`crate::client`]; tests supply in-memory fakes.

use crate::types::{Credentials, ReportRequest, Result, Transaction, Transponder, Vehicle};

/// Opens an authenticated session against the remote account
pub trait SessionProvider: Send + Sync {
    /// Opaque session handle, shared read-only by the report fetches
    type Session: Send + Sync + 'static;

    fn open_session(&self, credentials: &Credentials) -> Result<Self::Session>;
}

/// Fetches the three account reports using an open session
pub trait ReportFetcher<S>: Send + Sync {
    fn fetch_transponders(&self, session: &S) -> Result<Vec<Transponder>>;

    fn fetch_vehicles(&self, session: &S) -> Result<Vec<Vehicle>>;

    /// Transactions posted within the request's inclusive date range
    fn fetch_transactions(&self, session: &S, request: &ReportRequest) -> Result<Vec<Transaction>>;
}
