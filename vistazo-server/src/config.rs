//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use vistazo_core::{DominantColorStrategy, ScoringPreset, DEFAULT_LIMIT, MAX_LIMIT};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 20)
    pub body_limit_mb: usize,
    /// Maximum image size per upload in MB (default: 10)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Index snapshot loaded at startup (default: index.json)
    pub index_path: PathBuf,
    /// Optional catalog used to attach product names
    pub catalog_path: Option<PathBuf>,
    /// Preset used when a request does not name one (default: strict)
    pub scoring_preset: ScoringPreset,
    /// Dominant color strategy for query images; must match the index build
    pub color_strategy: DominantColorStrategy,
    /// Results returned when a request does not set a limit (default: 10)
    pub default_limit: usize,
    /// Deadline for one external vector query, in seconds (default: 10)
    pub vector_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 20,
            max_file_size_mb: 10,
            timeout_secs: 30,
            rate_limit_enabled: false, // Opt-in via RATE_LIMIT_ENABLED
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            index_path: PathBuf::from("index.json"),
            catalog_path: None,
            scoring_preset: ScoringPreset::Strict,
            color_strategy: DominantColorStrategy::default(),
            default_limit: DEFAULT_LIMIT,
            vector_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Opt-in: only RATE_LIMIT_ENABLED=true (or 1/yes/on) turns it on
        let rate_limit_enabled = parse_flag(
            std::env::var("RATE_LIMIT_ENABLED").ok().as_deref(),
            defaults.rate_limit_enabled,
        );

        let index_path = std::env::var("INDEX_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.index_path);

        let catalog_path = std::env::var("CATALOG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            port: env_parse("PORT", defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_parse("BODY_LIMIT_MB", defaults.body_limit_mb),
            max_file_size_mb: env_parse("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC", defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            index_path,
            catalog_path,
            scoring_preset: env_parse("SCORING_PRESET", defaults.scoring_preset),
            color_strategy: env_parse("COLOR_STRATEGY", defaults.color_strategy),
            default_limit: env_parse("DEFAULT_RESULT_LIMIT", defaults.default_limit)
                .clamp(1, MAX_LIMIT),
            vector_timeout_secs: env_parse("VECTOR_QUERY_TIMEOUT_SECS", defaults.vector_timeout_secs)
                .max(1),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// Parse an environment variable, keeping `default` when it is unset or invalid.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration value");
            default
        }),
        Err(_) => default,
    }
}

/// Boolean env flag; unset or unrecognized values keep `default`.
fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes" | "on") => true,
        Some("false" | "0" | "no" | "off") => false,
        _ => default,
    }
}
