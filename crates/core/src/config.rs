use crate::types::{CutoffRule, ScenarioParams};
use serde::Deserialize;
use tracing::debug;

/// Root application configuration. Loaded from environment variables
/// with the prefix `WAVE_TARGETING__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Default economics, applied wherever a request does not override them.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_mail_cost")]
    pub mail_cost: f64,
    #[serde(default = "default_margin_per_responder")]
    pub margin_per_responder: f64,
    #[serde(default = "default_response_multiplier")]
    pub response_multiplier: f64,
    #[serde(default)]
    pub cutoff_rule: CutoffRule,
    #[serde(default)]
    pub top_n: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub input_path: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Explicit id column; otherwise resolved from known synonyms.
    #[serde(default)]
    pub id_column: Option<String>,
    /// Explicit probability column; otherwise resolved from known synonyms.
    #[serde(default)]
    pub score_column: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_eligible_population")]
    pub eligible_population: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

// Default functions
fn default_node_id() -> String {
    "wave-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_mail_cost() -> f64 {
    1.41
}
fn default_margin_per_responder() -> f64 {
    60.0
}
fn default_response_multiplier() -> f64 {
    0.50
}
fn default_delimiter() -> String {
    ",".to_string()
}
fn default_eligible_population() -> u64 {
    763_334
}
fn default_cache_ttl_secs() -> u64 {
    600
}
fn default_cache_max_entries() -> usize {
    256
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            mail_cost: default_mail_cost(),
            margin_per_responder: default_margin_per_responder(),
            response_multiplier: default_response_multiplier(),
            cutoff_rule: CutoffRule::default(),
            top_n: None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            delimiter: default_delimiter(),
            id_column: None,
            score_column: None,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            eligible_population: default_eligible_population(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            scenario: ScenarioConfig::default(),
            data: DataConfig::default(),
            projection: ProjectionConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn to_params(&self) -> ScenarioParams {
        ScenarioParams {
            mail_cost: self.mail_cost,
            margin_per_responder: self.margin_per_responder,
            response_multiplier: self.response_multiplier,
            cutoff_rule: self.cutoff_rule,
            top_n: self.top_n,
        }
    }
}

impl DataConfig {
    /// Single-byte field delimiter; `\t` and `tab` select tab-separated input.
    pub fn delimiter_byte(&self) -> Result<u8, String> {
        match self.delimiter.as_str() {
            "\\t" | "tab" | "\t" => Ok(b'\t'),
            d if d.len() == 1 => Ok(d.as_bytes()[0]),
            d => Err(format!("delimiter must be a single byte, got '{d}'")),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path, "Reading config file");
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("WAVE_TARGETING")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
