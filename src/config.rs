use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_file_size: usize,
    pub cache_ttl: Duration,
    /// Upper bound on visits rendered into the assistant context log.
    pub grounding_visit_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let max_file_size_mb: usize = std::env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        let cache_ttl_seconds = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        let grounding_visit_limit = std::env::var("GROUNDING_VISIT_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        Self {
            port,
            max_file_size: max_file_size_mb.saturating_mul(1024 * 1024),
            cache_ttl: Duration::from_secs(cache_ttl_seconds),
            grounding_visit_limit,
        }
    }
}
