use crate::app_config::{AppConfig, BottleLimit, RunConfig};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; the lookup is injected so tests can use a
/// plain `HashMap` instead of mutating the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_flag = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                invalid(var, format!("expected a boolean (true/false/1/0), got \"{raw}\""))
            }),
            Err(_) => Ok(default),
        }
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let num_bottles_raw = or_default("BOTTLEDB_NUM_BOTTLES", "all");
    let num_bottles =
        parse_limit(&num_bottles_raw).map_err(|reason| invalid("BOTTLEDB_NUM_BOTTLES", reason))?;

    let run = RunConfig {
        local_mode: parse_flag("BOTTLEDB_LOCAL_MODE", false)?,
        use_cache: parse_flag("BOTTLEDB_USE_CACHE", true)?,
        store_html: parse_flag("BOTTLEDB_STORE_HTML", false)?,
        num_bottles,
        write_intermediate_json: parse_flag("BOTTLEDB_WRITE_INTERMEDIATE_JSON", false)?,
    };

    let base_url = or_default("BOTTLEDB_BASE_URL", "https://flaviar.com");
    let listing_url = or_default("BOTTLEDB_LISTING_URL", "https://flaviar.com/");
    let session_cookie = lookup("BOTTLEDB_SESSION_COOKIE")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let data_dir = PathBuf::from(or_default("BOTTLEDB_DATA_DIR", "./data"));
    let cache_dir = PathBuf::from(or_default("BOTTLEDB_CACHE_DIR", "./cache"));
    let output_dir = PathBuf::from(or_default("BOTTLEDB_OUTPUT_DIR", "."));
    let log_level = or_default("BOTTLEDB_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("BOTTLEDB_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("BOTTLEDB_USER_AGENT", DEFAULT_USER_AGENT);
    let max_concurrent_fetches = parse_usize("BOTTLEDB_MAX_CONCURRENT_FETCHES", "1")?;
    if max_concurrent_fetches == 0 {
        return Err(invalid(
            "BOTTLEDB_MAX_CONCURRENT_FETCHES",
            "must be at least 1".to_string(),
        ));
    }
    let inter_request_delay_ms = parse_u64("BOTTLEDB_INTER_REQUEST_DELAY_MS", "250")?;
    let max_retries = parse_u32("BOTTLEDB_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("BOTTLEDB_RETRY_BACKOFF_BASE_SECS", "5")?;

    Ok(AppConfig {
        run,
        base_url,
        listing_url,
        session_cookie,
        data_dir,
        cache_dir,
        output_dir,
        log_level,
        request_timeout_secs,
        user_agent,
        max_concurrent_fetches,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_secs,
    })
}

/// Parse a boolean flag. Accepts `1/0`, `true/false`, `yes/no`, `on/off`
/// in any case; anything else is `None`.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a bottle limit. Empty, `all` and `unbounded` mean no limit.
pub(crate) fn parse_limit(raw: &str) -> Result<BottleLimit, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("all")
        || trimmed.eq_ignore_ascii_case("unbounded")
    {
        return Ok(BottleLimit::Unbounded);
    }
    trimmed
        .parse::<usize>()
        .map(BottleLimit::AtMost)
        .map_err(|e| format!("expected a count or \"all\", got \"{trimmed}\": {e}"))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
