use std::env;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::config::ServerConfig;

pub(super) fn load_config(path: &str) -> ServerConfig {
    if !Path::new(path).exists() {
        return ServerConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path, error = %err);
            return ServerConfig::default();
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(event = "config_parse_failed", path, error = %err);
            ServerConfig::default()
        }
    }
}

/// Environment variables win over the YAML file.
pub(super) fn apply_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("COFFER_ADDR") {
        config.server.addr = value;
    }
    if let Ok(value) = env::var("COFFER_TOKEN_TTL_SECONDS") {
        match value.parse::<i64>() {
            Ok(ttl) => config.auth.token_ttl_seconds = ttl,
            Err(_) => {
                warn!(event = "config_invalid", field = "COFFER_TOKEN_TTL_SECONDS", value = %value);
            }
        }
    }
    if let Ok(value) = env::var("COFFER_METRICS_ENABLED") {
        match parse_bool(&value) {
            Some(enabled) => config.metrics.enabled = enabled,
            None => {
                warn!(event = "config_invalid", field = "COFFER_METRICS_ENABLED", value = %value);
            }
        }
    }
    if let Ok(value) = env::var("COFFER_MAX_BODY_BYTES") {
        match value.parse::<usize>() {
            Ok(limit) => config.limits.max_body_bytes = limit,
            Err(_) => {
                warn!(event = "config_invalid", field = "COFFER_MAX_BODY_BYTES", value = %value);
            }
        }
    }
}

pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads `var_name`, or the file named by `file_var_name` when the variable
/// itself is unset.
pub(super) fn load_secret_env_or_file(
    var_name: &str,
    file_var_name: &str,
) -> Result<Option<String>, String> {
    if let Ok(value) = env::var(var_name) {
        return Ok(Some(value));
    }
    let Ok(path) = env::var(file_var_name) else {
        return Ok(None);
    };
    read_secret_file(&path)
        .map(Some)
        .map_err(|err| format!("{file_var_name} invalid: {err}"))
}

fn read_secret_file(path: &str) -> Result<String, String> {
    let value = fs::read_to_string(path)
        .map_err(|err| format!("secret file not accessible ({path}): {err}"))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("secret file is empty ({path})"));
    }
    Ok(trimmed.to_string())
}
