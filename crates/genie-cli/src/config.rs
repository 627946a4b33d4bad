//! Server-wide configuration, read from `GENIE_*` environment variables
//! (the same `from_env` + lazily-loaded `.env` convention
//! `genie_persistence::config::GenieRedisConfig` uses, generalized to the
//! handful of settings the HTTP binary itself owns).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use genie_persistence::GenieRedisConfig;

#[derive(Debug, Clone)]
pub struct GenieAppConfig {
    pub bind_addr: SocketAddr,
    pub template_root: PathBuf,
    pub default_pool_size: usize,
    pub worker_count: usize,
    /// Surfaces internal error detail in 500 responses (spec §6: "500 for
    /// internal errors (with detail when `debug=true`)"). Read once at
    /// startup rather than per-request, since nothing in spec.md ties it to
    /// a request-scoped query parameter.
    pub debug: bool,
    /// `"memory"` runs the demo registration against `InMemoryStore` (no
    /// Redis required); anything else connects `RedisStore` using `redis`.
    pub store_backend: String,
    pub redis: GenieRedisConfig,
}

impl GenieAppConfig {
    pub fn from_env() -> Self {
        genie_persistence::config::init_dotenv();
        Self {
            bind_addr: env::var("GENIE_BIND_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| "0.0.0.0:8080".parse().unwrap()),
            template_root: env::var("GENIE_TEMPLATE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_template_root()),
            default_pool_size: env_usize("GENIE_POOL_SIZE", 4),
            worker_count: env_usize("GENIE_WORKER_COUNT", 4),
            debug: env::var("GENIE_DEBUG").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false),
            store_backend: env::var("GENIE_STORE_BACKEND").unwrap_or_else(|_| "memory".to_string()),
            redis: GenieRedisConfig::from_env(),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn default_template_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}
