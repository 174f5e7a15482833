use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub geodata: GeodataConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub url: String,
    /// Local copy of the feed, used instead of the network when set.
    pub cache_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeodataConfig {
    pub path: PathBuf,
    /// Prefix joined with a state code to form a polygon id, e.g. "US-" + "CA".
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

fn default_id_prefix() -> String {
    "US-".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub series_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            [source]
            url = "https://example.com/stores.json"
            cache_file = "data/stores.json"

            [geodata]
            path = "data/usa_states.geojson"

            [output]
            series_dir = "output/series"

            [server]
            port = 8080
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.source.url, "https://example.com/stores.json");
        assert_eq!(config.geodata.id_prefix, "US-");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.static_dir.is_none());
    }
}
