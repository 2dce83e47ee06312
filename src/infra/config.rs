//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::str::FromStr;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(v) => match v.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value = %v, "unparseable configuration value; using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

/// Pool size (default 5).
pub fn db_max_connections() -> u32 {
    env_or("DB_MAX_CONNECTIONS", 5u32).max(1)
}

/// Upper bound for any read's LIMIT (default 10000).
pub fn max_query_limit() -> u64 {
    env_or("CRUD_MAX_QUERY_LIMIT", 10_000u64).max(1)
}

/// Read-result cache TTL in seconds (default 300).
pub fn cache_expire_secs() -> u64 {
    match env_or("CRUD_CACHE_EXPIRE_SECS", 300u64) {
        0 => 300,
        v => v,
    }
}

/// Access gating on save/delete/get (default on).
pub fn check_access() -> bool {
    env_or("CRUD_CHECK_ACCESS", true)
}

/// Read-result caching (default off).
pub fn cache_result() -> bool {
    env_or("CRUD_CACHE_RESULT", false)
}

/// Audit-log every CRUD task (default off).
pub fn log_crud() -> bool {
    env_or("CRUD_LOG_CRUD", false)
}

/// Tables served by the ungated lookup read, comma-separated (default none).
pub fn lookup_tables() -> Vec<String> {
    parse_list(&std::env::var("CRUD_LOOKUP_TABLES").unwrap_or_default())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// HTTP listen address (default `0.0.0.0:3000`).
pub fn api_bind_addr() -> String {
    std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}
