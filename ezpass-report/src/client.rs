//! HTTP client for the remote toll account
//!
//! Implements [`SessionProvider`] and [`ReportFetcher`] over a JSON API using
//! a blocking `reqwest` client:
//!
//! - `POST {base}/api/session` with the credentials returns a bearer token
//! - `GET {base}/api/transponders`
//! - `GET {base}/api/vehicles`
//! - `GET {base}/api/transactions?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`

use crate::source::{ReportFetcher, SessionProvider};
use crate::types::{
    Credentials, ReportError, ReportKind, ReportRequest, Result, Transaction, Transponder, Vehicle,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Authenticated session: the bearer token issued at login
#[derive(Clone)]
pub struct HttpSession {
    token: String,
}

impl HttpSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSession").finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Toll account API client
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Create a client for the account API at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Scheme and host of the account API, e.g. `https://example.com`
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ezpass-report/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Send an authenticated GET and decode the JSON body
    fn get_json<T: DeserializeOwned>(
        &self,
        kind: ReportKind,
        request: RequestBuilder,
        session: &HttpSession,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&session.token)
            .send()
            .map_err(|e| fetch_error(kind, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Fetch {
                kind,
                message: format!("server returned status {}", status),
            });
        }

        response.json().map_err(|e| fetch_error(kind, e))
    }
}

fn fetch_error(kind: ReportKind, error: reqwest::Error) -> ReportError {
    ReportError::Fetch {
        kind,
        message: error.to_string(),
    }
}

/// Query parameters for the transaction report
fn transaction_query(request: &ReportRequest) -> [(&'static str, String); 2] {
    [
        ("startDate", request.start_date().format(QUERY_DATE_FORMAT).to_string()),
        ("endDate", request.end_date().format(QUERY_DATE_FORMAT).to_string()),
    ]
}

impl SessionProvider for HttpClient {
    type Session = HttpSession;

    fn open_session(&self, credentials: &Credentials) -> Result<HttpSession> {
        let url = self.url("session");
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .map_err(|e| ReportError::Session(format!("unable to reach {}: {}", self.base_url, e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ReportError::Session("invalid credentials".to_string()));
            }
            status => {
                return Err(ReportError::Session(format!("login returned status {}", status)));
            }
        }

        let login: LoginResponse = response
            .json()
            .map_err(|e| ReportError::Session(format!("unexpected login response: {}", e)))?;

        Ok(HttpSession::new(login.token))
    }
}

impl ReportFetcher<HttpSession> for HttpClient {
    fn fetch_transponders(&self, session: &HttpSession) -> Result<Vec<Transponder>> {
        let url = self.url("transponders");
        log::debug!("GET {}", url);
        self.get_json(ReportKind::Transponders, self.client.get(&url), session)
    }

    fn fetch_vehicles(&self, session: &HttpSession) -> Result<Vec<Vehicle>> {
        let url = self.url("vehicles");
        log::debug!("GET {}", url);
        self.get_json(ReportKind::Vehicles, self.client.get(&url), session)
    }

    fn fetch_transactions(
        &self,
        session: &HttpSession,
        request: &ReportRequest,
    ) -> Result<Vec<Transaction>> {
        let url = self.url("transactions");
        let query = transaction_query(request);
        log::debug!("GET {} {:?}", url, query);
        self.get_json(
            ReportKind::Transactions,
            self.client.get(&url).query(&query),
            session,
        )
    }
}
