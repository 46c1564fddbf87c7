use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";
const DEFAULT_CSV_PATH: &str = "./employees.csv";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_FACET_FIELD: &str = "Department";
const DEFAULT_LOG_FILE: &str = "logs/employee-search.log";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the employee search server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Elasticsearch node that owns the indexes.
    pub elasticsearch_url: String,
    /// Optional API key sent as `Authorization: ApiKey <key>`.
    pub elasticsearch_api_key: Option<String>,
    /// Location of the CSV file read by bulk ingestion.
    pub csv_path: PathBuf,
    /// Port the HTTP server listens on.
    pub server_port: u16,
    /// Field aggregated by the department facets route (its `.keyword` sub-field is used).
    pub facet_field: String,
    /// Maximum number of in-flight index writes per ingestion run. `1` keeps writes sequential.
    pub ingest_concurrency: usize,
    /// File that mirrors the stdout log stream. Parent directories are created on demand.
    pub log_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ingest_concurrency = parse_optional::<usize>("INGEST_CONCURRENCY")?.unwrap_or(1);
        if ingest_concurrency == 0 {
            return Err(ConfigError::InvalidValue("INGEST_CONCURRENCY".into()));
        }

        Ok(Self {
            elasticsearch_url: load_env_optional("ELASTICSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_ELASTICSEARCH_URL.to_string()),
            elasticsearch_api_key: load_env_optional("ELASTICSEARCH_API_KEY"),
            csv_path: load_env_optional("EMPLOYEES_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH)),
            server_port: parse_optional("PORT")?.unwrap_or(DEFAULT_PORT),
            facet_field: load_env_optional("FACET_FIELD")
                .unwrap_or_else(|| DEFAULT_FACET_FIELD.to_string()),
            ingest_concurrency,
            log_file: load_env_optional("EMPLOYEE_SEARCH_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elasticsearch_url: DEFAULT_ELASTICSEARCH_URL.to_string(),
            elasticsearch_api_key: None,
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            server_port: DEFAULT_PORT,
            facet_field: DEFAULT_FACET_FIELD.to_string(),
            ingest_concurrency: 1,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment (and `.env`) and install it in the global cache.
///
/// Tracing is configured from the result, so nothing is logged here; call
/// [`Config::log_summary`] once the subscriber is installed.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| config))
}

impl Config {
    /// Emit the effective settings at debug level. The API key is never logged.
    pub fn log_summary(&self) {
        tracing::debug!(
            elasticsearch_url = %self.elasticsearch_url,
            csv_path = %self.csv_path.display(),
            server_port = self.server_port,
            facet_field = %self.facet_field,
            ingest_concurrency = self.ingest_concurrency,
            log_file = %self.log_file.display(),
            "Loaded configuration"
        );
    }
}
