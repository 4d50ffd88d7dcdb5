use std::path::PathBuf;

/// Which key-value backend persists the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Sqlite,
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Some(StoreBackend::File),
            "sqlite" | "db" => Some(StoreBackend::Sqlite),
            "memory" | "mem" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub store_backend: StoreBackend,
    pub store_namespace: String,
    /// Remote API hosts whose requests are served locally.
    pub blocked_hosts: Vec<String>,
    /// Hosts that are never intercepted, even if they match `blocked_hosts`.
    pub allowed_hosts: Vec<String>,
    pub api_prefix: String,
    pub max_intercept_depth: usize,
    pub sentry_dsn: Option<String>,
    pub environment: String,
}

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_BLOCKED_HOSTS: &str = "api.wfh.team";
pub const DEFAULT_ALLOWED_HOSTS: &str = "chatgpt.com,chat.openai.com";
pub const DEFAULT_API_PREFIX: &str = "/api/";
pub const DEFAULT_MAX_INTERCEPT_DEPTH: usize = 3;

/// Raw, unparsed values as they come from the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawConfig<'a> {
    pub port: Option<&'a str>,
    pub data_dir: Option<&'a str>,
    pub store_backend: Option<&'a str>,
    pub store_namespace: Option<&'a str>,
    pub blocked_hosts: Option<&'a str>,
    pub allowed_hosts: Option<&'a str>,
    pub api_prefix: Option<&'a str>,
    pub max_intercept_depth: Option<&'a str>,
    pub sentry_dsn: Option<&'a str>,
    pub environment: Option<&'a str>,
}

impl Config {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        let port = var("PORT");
        let data_dir = var("DATA_DIR");
        let store_backend = var("STORE_BACKEND");
        let store_namespace = var("STORE_NAMESPACE");
        let blocked_hosts = var("BLOCKED_HOSTS");
        let allowed_hosts = var("ALLOWED_HOSTS");
        let api_prefix = var("API_PREFIX");
        let max_intercept_depth = var("MAX_INTERCEPT_DEPTH");
        let sentry_dsn = var("SENTRY_DSN");
        let environment = var("ENVIRONMENT");

        Self::from_raw_values(RawConfig {
            port: port.as_deref(),
            data_dir: data_dir.as_deref(),
            store_backend: store_backend.as_deref(),
            store_namespace: store_namespace.as_deref(),
            blocked_hosts: blocked_hosts.as_deref(),
            allowed_hosts: allowed_hosts.as_deref(),
            api_prefix: api_prefix.as_deref(),
            max_intercept_depth: max_intercept_depth.as_deref(),
            sentry_dsn: sentry_dsn.as_deref(),
            environment: environment.as_deref(),
        })
    }

    /// Build a Config from raw string values (as they would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_raw_values(raw: RawConfig<'_>) -> Self {
        let port = non_empty(raw.port)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_dir = non_empty(raw.data_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local-backend")
            });

        let store_backend = match non_empty(raw.store_backend) {
            Some(v) => StoreBackend::parse(v).unwrap_or_else(|| {
                tracing::warn!(value = v, "unknown STORE_BACKEND, using file");
                StoreBackend::File
            }),
            None => StoreBackend::File,
        };

        let store_namespace = non_empty(raw.store_namespace)
            .unwrap_or("default")
            .to_string();

        let blocked_hosts = parse_host_list(non_empty(raw.blocked_hosts).unwrap_or(DEFAULT_BLOCKED_HOSTS));
        let allowed_hosts = parse_host_list(non_empty(raw.allowed_hosts).unwrap_or(DEFAULT_ALLOWED_HOSTS));

        let api_prefix = normalize_prefix(non_empty(raw.api_prefix).unwrap_or(DEFAULT_API_PREFIX));

        let max_intercept_depth = non_empty(raw.max_intercept_depth)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_MAX_INTERCEPT_DEPTH);

        let sentry_dsn = non_empty(raw.sentry_dsn).map(String::from);

        let environment = non_empty(raw.environment)
            .map(String::from)
            .unwrap_or_else(|| "local".to_string());

        Config {
            port,
            data_dir,
            store_backend,
            store_namespace,
            blocked_hosts,
            allowed_hosts,
            api_prefix,
            max_intercept_depth,
            sentry_dsn,
            environment,
        }
    }
}

/// A trimmed value, or `None` when it is unset or blank.
fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Always `/something/` or just `/`.
fn normalize_prefix(raw: &str) -> String {
    let inner = raw.trim_matches('/');
    if inner.is_empty() {
        "/".to_string()
    } else {
        format!("/{inner}/")
    }
}
