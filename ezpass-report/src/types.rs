//! Core types for the EZPass report library
//!
//! This module defines the values that flow between the remote account session,
//! the orchestrator and the table renderer. Records are immutable value objects;
//! the renderer never inspects them directly, it only applies column extractors.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Date format accepted on the command line (`YYYYMMDD`)
pub const REQUEST_DATE_FORMAT: &str = "%Y%m%d";

/// Errors that can occur while acquiring a session or producing reports
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Failed to fetch {kind}: {message}")]
    Fetch { kind: ReportKind, message: String },

    #[error("{kind} report did not finish within {timeout:?}")]
    TimedOut { kind: ReportKind, timeout: Duration },

    #[error("{0} report worker stopped without reporting a result")]
    WorkerLost(ReportKind),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Account login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Inclusive date range for the transaction report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl ReportRequest {
    /// Create a request, rejecting a range whose start is after its end
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(ReportError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Parse a date in the fixed 8-digit `YYYYMMDD` format
    pub fn parse_date(text: &str) -> Result<NaiveDate> {
        let text = text.trim();
        if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ReportError::InvalidDate(text.to_string()));
        }
        NaiveDate::parse_from_str(text, REQUEST_DATE_FORMAT)
            .map_err(|_| ReportError::InvalidDate(text.to_string()))
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

/// The three report types retrievable per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportKind {
    Transponders,
    Vehicles,
    Transactions,
}

impl ReportKind {
    /// All report kinds in the fixed output order
    pub const ALL: [ReportKind; 3] = [
        ReportKind::Transponders,
        ReportKind::Vehicles,
        ReportKind::Transactions,
    ];

    /// Table title for this report
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Transponders => "Transponders",
            ReportKind::Vehicles => "Vehicles",
            ReportKind::Transactions => "Transactions",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A toll transponder registered to the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transponder {
    pub tag_number: String,
    pub style: String,
    pub color: String,
    pub status: String,
}

/// A vehicle registered to the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub plate_number: String,
    pub state: String,
    pub make: String,
    pub model: String,
    pub year: String,
    pub color: String,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// A posted toll or account transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    pub post_date: NaiveDate,
    pub transaction_type: String,
    #[serde(default)]
    pub transponder_number: Option<String>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub entry_plaza: Option<String>,
    #[serde(default)]
    pub exit_plaza: Option<String>,
    #[serde(default)]
    pub entry_date_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub exit_date_time: Option<NaiveDateTime>,
    pub charge: Charge,
}

/// Direction of a charge against the account balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChargeType {
    Debit,
    Credit,
}

/// Amount and direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    #[serde(rename = "type")]
    pub charge_type: ChargeType,
    pub amount: Amount,
}

/// Unsigned money amount with two fractional digits, stored in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u64);

impl Amount {
    pub fn from_cents(cents: u64) -> Self {
        Amount(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ReportError::InvalidAmount(s.to_string());
        let text = s.trim();

        let (units, fraction) = match text.split_once('.') {
            Some((units, fraction)) => (units, fraction),
            None => (text, ""),
        };

        if units.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2
            || !units.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let units: u64 = if units.is_empty() {
            0
        } else {
            units.parse().map_err(|_| invalid())?
        };
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Amount {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parsing() {
        assert_eq!("4.50".parse::<Amount>().unwrap().cents(), 450);
        assert_eq!("4.5".parse::<Amount>().unwrap().cents(), 450);
        assert_eq!("12".parse::<Amount>().unwrap().cents(), 1200);
        assert_eq!(".75".parse::<Amount>().unwrap().cents(), 75);

        assert!("".parse::<Amount>().is_err());
        assert!(".".parse::<Amount>().is_err());
        assert!("4.505".parse::<Amount>().is_err());
        assert!("-4.50".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from_cents(450).to_string(), "4.50");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(120000).to_string(), "1200.00");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            ReportRequest::parse_date("20240131").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert!(ReportRequest::parse_date("2024-01-31").is_err());
        assert!(ReportRequest::parse_date("20240230").is_err());
        assert!(ReportRequest::parse_date("2024013").is_err());
        assert!(ReportRequest::parse_date("+2024013").is_err());
    }

    #[test]
    fn test_report_request_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let request = ReportRequest::new(start, end).unwrap();
        assert_eq!(request.start_date(), start);
        assert_eq!(request.end_date(), end);

        assert!(ReportRequest::new(start, start).is_ok());
        assert!(matches!(
            ReportRequest::new(end, start),
            Err(ReportError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("driver", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("driver"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_transaction_deserialization() {
        let json = r#"{
            "transactionId": "TX-1",
            "postDate": "2024-01-05",
            "transactionType": "TOLL",
            "transponderNumber": "T1",
            "entryPlaza": "Harriman",
            "entryDateTime": "2024-01-05T08:15:30",
            "charge": { "type": "DEBIT", "amount": "4.50" }
        }"#;

        let transaction: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(transaction.transaction_id, "TX-1");
        assert_eq!(transaction.plate_number, None);
        assert_eq!(transaction.exit_date_time, None);
        assert_eq!(transaction.charge.charge_type, ChargeType::Debit);
        assert_eq!(transaction.charge.amount, Amount::from_cents(450));
    }
}
