use serde::Deserialize;
use std::path::PathBuf;

fn default_osrm_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_profile() -> String {
    "driving".to_string()
}
fn default_step() -> f64 {
    0.001
}
fn default_batch_size() -> usize {
    99
}
fn default_osrm_timeout_secs() -> u64 {
    30
}
fn default_max_time_sec() -> f64 {
    9000.0
}
fn default_color_min() -> f64 {
    0.0
}
fn default_color_max() -> f64 {
    3600.0
}
fn default_verbose() -> bool {
    false
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub origin_lat: Option<f64>,
    #[serde(default)]
    pub origin_lon: Option<f64>,
    #[serde(default)]
    pub lat_min: Option<f64>,
    #[serde(default)]
    pub lat_max: Option<f64>,
    #[serde(default)]
    pub lon_min: Option<f64>,
    #[serde(default)]
    pub lon_max: Option<f64>,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default = "default_osrm_url")]
    pub osrm_url: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_osrm_timeout_secs")]
    pub osrm_timeout_secs: u64,
    #[serde(default = "default_max_time_sec")]
    pub max_time_sec: f64,
    #[serde(default = "default_color_min")]
    pub color_min: f64,
    #[serde(default = "default_color_max")]
    pub color_max: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub output_csv: Option<PathBuf>,
    #[serde(default)]
    pub output_png: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub overpass: Option<OverpassConfig>,
}

fn default_overpass_urls() -> Vec<String> {
    vec![
        "https://overpass.private.coffee/api/interpreter".to_string(),
        "https://overpass-api.de/api/interpreter".to_string(),
        "https://maps.mail.ru/osm/tools/overpass/api/interpreter".to_string(),
    ]
}

fn default_timeout_secs() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            urls: default_overpass_urls(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl FileConfig {
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("timemap.toml"));
    paths.push(PathBuf::from(".timemap.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("timemap").join("config.toml"));
        paths.push(config_dir.join("timemap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".timemap.toml"));
        paths.push(home.join(".config").join("timemap").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: FileConfig = toml::from_str(r#"place = "Shanghai, China""#).unwrap();

        assert_eq!(config.place.as_deref(), Some("Shanghai, China"));
        assert_eq!(config.step, 0.001);
        assert_eq!(config.batch_size, 99);
        assert_eq!(config.osrm_url, "http://localhost:5000");
        assert_eq!(config.max_time_sec, 9000.0);
        assert_eq!(config.color_max, 3600.0);
        assert!(config.overpass.is_none());
    }

    #[test]
    fn test_overpass_section_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
[overpass]
timeout_secs = 60
"#,
        )
        .unwrap();

        let overpass = config.overpass.unwrap();
        assert_eq!(overpass.timeout_secs, 60);
        assert_eq!(overpass.max_retries, 3);
        assert_eq!(overpass.urls.len(), 3);
    }
}
