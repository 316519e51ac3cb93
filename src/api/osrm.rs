use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::grid::GridPoint;

const USER_AGENT: &str = "timemap/0.1.0";

/// Errors from a single table request.
#[derive(Debug, Error)]
pub enum TableError {
    /// Non-success HTTP status; carries the raw body so OSRM's own error
    /// message ("TooBig", "InvalidQuery", ...) survives into the report.
    #[error("routing service returned status {status}: {body}")]
    Service { status: u16, body: String },

    /// The response decoded but did not match the table contract.
    #[error("malformed table response: {0}")]
    Malformed(String),

    #[error("table request timed out after {0:?}")]
    Timeout(Duration),

    #[error("table request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Anything that can answer a many-to-one duration query.
///
/// The sweep loop only talks to this trait, so tests can drive it with a
/// canned source instead of a live OSRM instance.
pub trait DurationSource {
    /// Durations in seconds from `origin` to each destination, in input
    /// order. `None` means the service found no route to that destination;
    /// never conflate it with zero seconds.
    fn durations(
        &self,
        origin: GridPoint,
        destinations: &[GridPoint],
    ) -> Result<Vec<Option<f64>>, TableError>;
}

/// OSRM table service response.
///
/// `durations[i][j]` is the travel time in seconds from source `i` to
/// destination `j`, or null when no route exists.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    pub durations: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OsrmClientConfig {
    /// Base URL of the OSRM instance (e.g. `http://localhost:5000`).
    pub base_url: String,
    /// Routing profile segment of the table URL (e.g. `driving`).
    pub profile: String,
    pub timeout: Duration,
}

/// Blocking client for OSRM's many-to-one table queries.
pub struct OsrmClient {
    client: reqwest::blocking::Client,
    config: OsrmClientConfig,
}

impl OsrmClient {
    pub fn new(config: OsrmClientConfig) -> Result<Self, TableError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Build the table URL: origin first, then every destination, as
    /// semicolon-separated `lon,lat` pairs.
    fn table_url(&self, origin: GridPoint, destinations: &[GridPoint]) -> String {
        let mut coords = String::with_capacity((destinations.len() + 1) * 20);
        coords.push_str(&format!("{},{}", origin.lon, origin.lat));
        for destination in destinations {
            coords.push_str(&format!(";{},{}", destination.lon, destination.lat));
        }

        format!(
            "{}/table/v1/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }

    /// Issue one table request: one origin (source index 0), N destinations,
    /// duration annotations only. Exactly one network round trip per call.
    pub fn table_durations(
        &self,
        origin: GridPoint,
        destinations: &[GridPoint],
    ) -> Result<Vec<Option<f64>>, TableError> {
        let url = self.table_url(origin, destinations);

        let response = self
            .client
            .get(&url)
            .query(&[("sources", "0"), ("annotations", "duration")])
            .send()
            .map_err(|err| self.convert_reqwest_error(err))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| self.convert_reqwest_error(err))?;

        if !status.is_success() {
            return Err(TableError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let table: TableResponse =
            serde_json::from_str(&body).map_err(|err| TableError::Malformed(err.to_string()))?;

        extract_durations(table, destinations.len())
    }

    fn convert_reqwest_error(&self, err: reqwest::Error) -> TableError {
        if err.is_timeout() {
            TableError::Timeout(self.config.timeout)
        } else {
            TableError::Network(err)
        }
    }
}

impl DurationSource for OsrmClient {
    fn durations(
        &self,
        origin: GridPoint,
        destinations: &[GridPoint],
    ) -> Result<Vec<Option<f64>>, TableError> {
        self.table_durations(origin, destinations)
    }
}

/// Pull the destination durations out of a decoded table response.
///
/// The single source row is `durations[0]`; its first entry is the origin's
/// self-distance and is skipped.
fn extract_durations(
    table: TableResponse,
    expected: usize,
) -> Result<Vec<Option<f64>>, TableError> {
    if let Some(code) = table.code.as_deref()
        && code != "Ok"
    {
        return Err(TableError::Malformed(format!(
            "service code {code}: {}",
            table.message.unwrap_or_default()
        )));
    }

    let mut rows = table
        .durations
        .ok_or_else(|| TableError::Malformed("missing durations array".to_string()))?;

    if rows.len() != 1 {
        return Err(TableError::Malformed(format!(
            "expected 1 source row, got {}",
            rows.len()
        )));
    }

    let row = rows.remove(0);
    if row.len() != expected + 1 {
        return Err(TableError::Malformed(format!(
            "expected {} durations (origin + {} destinations), got {}",
            expected + 1,
            expected,
            row.len()
        )));
    }

    Ok(row.into_iter().skip(1).collect())
}
