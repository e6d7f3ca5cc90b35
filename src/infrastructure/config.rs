use crate::domain::registry::FieldRegistry;
use anyhow::Context;
use serde::Deserialize;

const DEFAULT_REGISTRY: &str = include_str!("../../config/fields.toml");

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub source: SourceSettings,
    pub poll: PollSettings,
    pub server: ServerSettings,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub registry_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub endpoint: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollSettings {
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

/// Which fields the page shows as text and which it graphs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LayoutConfig {
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub charts: Vec<ChartTargetConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChartTargetConfig {
    pub field: String,
    #[serde(default = "default_chart_width")]
    pub width: f64,
    #[serde(default = "default_chart_height")]
    pub height: f64,
}

fn default_chart_width() -> f64 {
    400.0
}

fn default_chart_height() -> f64 {
    150.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let outputs = [
            "cpu_usage_total",
            "ram_available",
            "temp_cpu",
            "model",
            "disk_space_free",
            "connection_type",
        ];
        let charts = ["cpu_usage_total", "ram_used", "temp_cpu", "update_freq"];

        Self {
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            charts: charts
                .iter()
                .map(|field| ChartTargetConfig {
                    field: field.to_string(),
                    width: default_chart_width(),
                    height: default_chart_height(),
                })
                .collect(),
        }
    }
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    dashboard_config_from(config::File::with_name("config/dashboard").required(false))
}

fn dashboard_config_from<S>(source: S) -> anyhow::Result<DashboardConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .set_default("source.endpoint", "http://127.0.0.1/get/")?
        .set_default("poll.interval_ms", 500)?
        .set_default("server.listen", "0.0.0.0:8080")?
        .add_source(source)
        .add_source(config::Environment::with_prefix("PISTAT").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Load the field registry from `path`, or the built-in one when no path is configured.
pub fn load_field_registry(path: Option<&str>) -> anyhow::Result<FieldRegistry> {
    let registry: FieldRegistry = match path {
        Some(path) => {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(path))
                .build()?;
            settings
                .try_deserialize()
                .with_context(|| format!("Failed to parse field registry {}", path))?
        }
        None => toml::from_str(DEFAULT_REGISTRY).context("Failed to parse built-in field registry")?,
    };

    tracing::debug!("Loaded field registry with {} fields", registry.fields.len());
    Ok(registry)
}
