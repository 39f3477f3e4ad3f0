use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub mflow: MflowConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Connection settings for the mflow ERP API
#[derive(Debug, Deserialize, Clone)]
pub struct MflowConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub public_key: Secret,
    #[serde(default)]
    pub secret_key: Secret,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Extra attempts after the first failed request. 0 disables retries.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Max number of remote products inspected per run
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
    /// How many suffixed SKU candidates are tried on a collision.
    /// 1 means the first candidate is used without re-checking it.
    #[serde(default = "default_sku_suffix_attempts")]
    pub sku_suffix_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_limit: default_batch_limit(),
            sku_suffix_attempts: default_sku_suffix_attempts(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Cron expression with seconds field, evaluated in UTC
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: default_cron(),
        }
    }
}

fn default_request_timeout() -> u64 {
    50
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_batch_limit() -> usize {
    12
}

fn default_sku_suffix_attempts() -> u32 {
    5
}

fn default_cron() -> String {
    "0 0 * * * *".to_string()
}

/// String value that must never show up in logs
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "EMPTY")
        } else {
            write!(f, "***")
        }
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl Config {
    /// Environment variables win over values from the file
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("MFLOW_API_BASE_URL") {
            self.mflow.api_base_url = url;
        }
        if let Some(key) = non_empty("MFLOW_PUBLIC_KEY") {
            self.mflow.public_key = Secret::new(key);
        }
        if let Some(key) = non_empty("MFLOW_SECRET_KEY") {
            self.mflow.secret_key = Secret::new(key);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mflow.api_base_url.trim().is_empty() {
            anyhow::bail!("mflow.api_base_url is not set");
        }
        if self.mflow.public_key.is_empty() || self.mflow.secret_key.is_empty() {
            anyhow::bail!(
                "mflow credentials are not configured (public_key={}, secret_key={}); \
                 set them in config.toml or via MFLOW_PUBLIC_KEY / MFLOW_SECRET_KEY",
                self.mflow.public_key,
                self.mflow.secret_key
            );
        }
        if self.mflow.request_timeout_seconds == 0 {
            anyhow::bail!("mflow.request_timeout_seconds must be positive");
        }
        if self.sync.batch_limit == 0 {
            anyhow::bail!("sync.batch_limit must be positive");
        }
        if self.sync.sku_suffix_attempts == 0 {
            anyhow::bail!("sync.sku_suffix_attempts must be positive");
        }
        if self.schedule.enabled {
            crate::system::scheduler::parse_schedule(&self.schedule.cron)?;
        }
        Ok(())
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/store.db"

[mflow]
api_base_url = "https://stage.mflow.co.il"
public_key = ""
secret_key = ""
request_timeout_seconds = 50
retry_attempts = 2
retry_backoff_ms = 500

[sync]
batch_limit = 12
sku_suffix_attempts = 5

[schedule]
enabled = false
cron = "0 0 * * * *"
"#;

/// Load configuration
///
/// Search order:
/// 1. Path from MFLOW_SYNC_CONFIG (must exist)
/// 2. config.toml next to the executable (for production)
/// 3. Falls back to embedded default config
///
/// Environment overrides are applied on top in every case.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = match find_config_file()? {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str::<Config>(&contents)?
        }
        None => {
            tracing::info!("Using default embedded configuration");
            toml::from_str::<Config>(DEFAULT_CONFIG)?
        }
    };
    config.apply_env_overrides();
    Ok(config)
}

fn find_config_file() -> anyhow::Result<Option<PathBuf>> {
    find_config_file_from(std::env::var("MFLOW_SYNC_CONFIG").ok())
}

fn find_config_file_from(explicit: Option<String>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(explicit) = explicit {
        let path = PathBuf::from(explicit);
        if !path.exists() {
            anyhow::bail!("MFLOW_SYNC_CONFIG points to missing file: {}", path.display());
        }
        return Ok(Some(path));
    }

    let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    else {
        return Ok(None);
    };
    let config_path = exe_dir.join("config.toml");
    if config_path.exists() {
        Ok(Some(config_path))
    } else {
        tracing::warn!("config.toml not found at: {}", config_path.display());
        Ok(None)
    }
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    // If absolute path, use as is
    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    // If relative path, resolve it relative to the executable directory
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    // Fallback: use relative to current directory
    Ok(PathBuf::from(db_path_str))
}
