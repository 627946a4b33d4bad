//! Loads Redis connection and TTL configuration from the environment,
//! following the teacher's `chem-persistence::config` convention of a lazily
//! loaded `.env` plus a typed config struct with sane defaults.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

#[derive(Debug, Clone)]
pub struct GenieRedisConfig {
    pub url: String,
    pub app_prefix: String,
    pub object_ttl_seconds: u64,
    pub lock_ttl_seconds: u64,
    pub lock_acquire_timeout_seconds: u64,
    pub progress_ttl_seconds: u64,
    pub compress: bool,
}

impl GenieRedisConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self {
            url: env::var("GENIE_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string()),
            app_prefix: env::var("GENIE_APP_PREFIX").unwrap_or_else(|_| "genieflow".to_string()),
            object_ttl_seconds: env_u64("GENIE_OBJECT_TTL_SECONDS", 86_400),
            lock_ttl_seconds: env_u64("GENIE_LOCK_TTL_SECONDS", 120),
            lock_acquire_timeout_seconds: env_u64("GENIE_LOCK_ACQUIRE_TIMEOUT_SECONDS", 10),
            progress_ttl_seconds: env_u64("GENIE_PROGRESS_TTL_SECONDS", 3_600),
            compress: env::var("GENIE_COMPRESS_SESSION_PAYLOAD").ok().map(|v| v != "0").unwrap_or(true),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Forces early `.env` loading from applications that need it before the
/// first `GenieRedisConfig::from_env` call (e.g. to read other `GENIE_*`
/// variables first).
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
