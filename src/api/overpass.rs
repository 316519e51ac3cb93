use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::OverpassConfig;
use crate::grid::BoundingBox;

const USER_AGENT: &str = "timemap/0.1.0";

/// Raw Overpass API response
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

/// A single element from Overpass (node or way)
#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default)]
    pub nodes: Option<Vec<u64>>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Fetch water features covering the study area.
///
/// Queries the same tag set the heat-map needs masked out: standing water
/// and bays (`natural`) plus river areas (`waterway`). Linear river
/// centrelines also match the query; the parser drops them later because
/// they never form closed rings.
pub fn fetch_water(bbox: &BoundingBox, config: &OverpassConfig) -> Result<OverpassResponse> {
    // Use 180s timeout to match OSMnx's default - 60s is often too short for
    // city-sized areas
    let query = format!(
        r#"[out:json][timeout:180];
(
  way["natural"~"^(water|bay)$"]({south},{west},{north},{east});
  way["waterway"~"^(riverbank|river)$"]({south},{west},{north},{east});
);
out body;
>;
out skel qt;"#,
        south = bbox.lat_min,
        west = bbox.lon_min,
        north = bbox.lat_max,
        east = bbox.lon_max
    );

    execute_overpass_query(&query, config)
}

/// Execute an Overpass API query with mirror rotation and retry logic for
/// overload errors
fn execute_overpass_query(query: &str, config: &OverpassConfig) -> Result<OverpassResponse> {
    if config.urls.is_empty() {
        bail!("No Overpass mirrors configured");
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let mut last_error = None;

    for attempt in 0..config.max_retries {
        if attempt > 0 {
            // Wait before retry - Overpass recommends waiting when overloaded
            let wait_secs = 30 * attempt as u64;
            eprintln!(
                "Overpass API busy, retrying in {} seconds (attempt {}/{})",
                wait_secs,
                attempt + 1,
                config.max_retries
            );
            std::thread::sleep(Duration::from_secs(wait_secs));
        }

        let url = &config.urls[attempt as usize % config.urls.len()];

        // IMPORTANT: Overpass API expects form-encoded POST data, not raw body
        // The query must be sent as: data=<query>
        let response = client
            .post(url)
            .form(&[("data", query)])
            .send()
            .context("Failed to send request to Overpass API")?;

        match response.status().as_u16() {
            200 => {
                let result: OverpassResponse = response
                    .json()
                    .context("Failed to parse Overpass JSON response")?;
                return Ok(result);
            }
            429 | 504 => {
                // 429 = Too Many Requests, 504 = Gateway Timeout
                // These are retriable errors
                last_error = Some(format!(
                    "Overpass API returned status {} (attempt {})",
                    response.status(),
                    attempt + 1
                ));
                continue;
            }
            status => {
                bail!("Overpass API returned error status: {}", status);
            }
        }
    }

    bail!(
        "Overpass API failed after {} retries: {}",
        config.max_retries,
        last_error.unwrap_or_else(|| "Unknown error".to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overpass_response() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 1, "lat": 31.17, "lon": 121.42},
                {"type": "way", "id": 2, "nodes": [1, 3], "tags": {"natural": "water"}}
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.elements.len(), 2);
        assert_eq!(response.elements[0].type_, "node");
        assert_eq!(response.elements[1].type_, "way");
    }
}
