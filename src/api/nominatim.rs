use anyhow::{Context, Result, anyhow, bail};
use geo::{LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::thread;
use std::time::Duration;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "timemap/0.1.0";

#[derive(Debug, Deserialize)]
struct NominatimResult {
    display_name: String,
    geojson: Option<GeoJsonGeometry>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonGeometry {
    #[serde(rename = "type")]
    type_: String,
    coordinates: serde_json::Value,
}

/// Fetch the boundary polygon for a place name.
///
/// Uses the Nominatim API with `polygon_geojson=1` so the top match comes
/// back with its administrative boundary geometry. Includes a 1 second delay
/// for rate limiting (Nominatim ToS).
///
/// # Arguments
/// * `place` - Free-form place query (e.g., "Shanghai, China")
///
/// # Returns
/// * `Ok((display_name, boundary))` - Resolved name and boundary geometry
/// * `Err` - If the place is not found, has no polygon, or the API fails
pub fn fetch_boundary(place: &str) -> Result<(String, MultiPolygon<f64>)> {
    // Rate limiting - Nominatim requires max 1 request per second
    thread::sleep(Duration::from_secs(1));

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(NOMINATIM_URL)
        .query(&[
            ("q", place),
            ("format", "json"),
            ("limit", "1"),
            ("polygon_geojson", "1"),
        ])
        .send()
        .context("Failed to send request to Nominatim API")?;

    if !response.status().is_success() {
        bail!("Nominatim API returned error status: {}", response.status());
    }

    let results: Vec<NominatimResult> = response
        .json()
        .context("Failed to parse Nominatim JSON response")?;

    let result = results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Place not found: {}", place))?;

    let geometry = result
        .geojson
        .ok_or_else(|| anyhow!("Nominatim returned no boundary geometry for: {}", place))?;

    let boundary = parse_boundary(&geometry)
        .with_context(|| format!("Failed to decode boundary geometry for: {}", place))?;

    Ok((result.display_name, boundary))
}

fn parse_boundary(geometry: &GeoJsonGeometry) -> Result<MultiPolygon<f64>> {
    match geometry.type_.as_str() {
        "Polygon" => {
            let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(geometry.coordinates.clone())
                .context("Polygon coordinates did not match GeoJSON shape")?;
            Ok(MultiPolygon::new(vec![rings_to_polygon(rings)?]))
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<Vec<Vec<f64>>>> =
                serde_json::from_value(geometry.coordinates.clone())
                    .context("MultiPolygon coordinates did not match GeoJSON shape")?;
            let polygons = polygons
                .into_iter()
                .map(rings_to_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        other => bail!("Unsupported boundary geometry type: {}", other),
    }
}

fn rings_to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>> {
    let mut rings = rings.into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| anyhow!("Boundary polygon has no exterior ring"))?;

    let interiors = rings
        .map(ring_to_line_string)
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(ring_to_line_string(exterior)?, interiors))
}

fn ring_to_line_string(ring: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    // GeoJSON positions are [lon, lat] with optional extra members.
    let coords = ring
        .into_iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok((*lon, *lat)),
            _ => bail!("GeoJSON position with fewer than 2 members"),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::from(coords))
}
