//! Config file discovery, loading, and validation.
//!
//! Reads `config.yaml` and resolves environment variables before parsing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::errors::ConfigError;
use crate::registry::NAME_SEPARATOR;
use super::types::HubConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MCP_HUB_CONFIG";

const CONFIG_FILE_NAME: &str = "config.yaml";

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// Checks `MCP_HUB_CONFIG` first, then walks upward from `start` looking
/// for `config.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, ConfigError> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(explicit);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(ConfigError::NotFound {
        searched_from: start.display().to_string(),
    })
}

/// Read, interpolate, parse, and validate a config file.
pub fn load_hub_config(path: &Path) -> Result<HubConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    parse_hub_config(&raw)
}

/// Parse and validate config text.
pub fn parse_hub_config(raw: &str) -> Result<HubConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);

    let config: HubConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;

    validate(&config)?;
    Ok(config)
}

/// Check the constraints serde cannot express.
pub fn validate(config: &HubConfig) -> Result<(), ConfigError> {
    if config.hub.refresh_interval_secs == 0 {
        return Err(invalid("hub.refresh_interval_secs must be greater than 0"));
    }

    let mut seen = HashSet::new();
    for server in &config.servers {
        if server.name.trim().is_empty() {
            return Err(invalid("server name must not be empty"));
        }
        if server.name.contains(NAME_SEPARATOR) {
            return Err(invalid(format!(
                "server name '{}' must not contain '{NAME_SEPARATOR}'",
                server.name
            )));
        }
        if !seen.insert(server.name.as_str()) {
            return Err(invalid(format!("duplicate server name '{}'", server.name)));
        }
        if !(server.url.starts_with("http://") || server.url.starts_with("https://")) {
            return Err(invalid(format!(
                "server '{}': url must start with http:// or https://",
                server.name
            )));
        }
        if server.timeout == 0 {
            return Err(invalid(format!(
                "server '{}': timeout must be greater than 0",
                server.name
            )));
        }
        if server.payload_map.tool_field() == server.payload_map.args_field() {
            return Err(invalid(format!(
                "server '{}': payload_map tool_field and args_field must differ",
                server.name
            )));
        }
    }

    Ok(())
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in config text.
///
/// An unterminated `${` is kept verbatim so serde reports the real line.
fn interpolate_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find('}') {
            Some(close) => {
                out.push_str(&lookup_var(&after[..close]));
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve `NAME` or `NAME:-default`. Unset without a default is empty.
fn lookup_var(expr: &str) -> String {
    let (name, fallback) = match expr.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (expr, None),
    };
    match (std::env::var(name.trim()), fallback) {
        (Ok(value), _) => value,
        (Err(_), Some(fallback)) => expand_tilde(fallback),
        (Err(_), None) => String::new(),
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
hub:
  refresh_interval_secs: 15
  log_format: json
servers:
  - name: weather
    url: "http://localhost:9001"
  - name: dummy
    url: "http://localhost:9002/"
    enabled: false
    response_map:
      tools_key: ""
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = parse_hub_config(SAMPLE).unwrap();
        assert_eq!(config.hub.refresh_interval_secs, 15);
        assert_eq!(config.servers.len(), 2);
        assert!(!config.servers[1].enabled);
        assert_eq!(config.servers[1].response_map.tools_key(), None);
        assert_eq!(config.servers[1].health_url(), "http://localhost:9002/health");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = r#"
servers:
  - { name: a, url: "http://localhost:1" }
  - { name: a, url: "http://localhost:2" }
"#;
        let err = parse_hub_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let yaml = r#"
servers:
  - { name: "", url: "http://localhost:1" }
"#;
        assert!(matches!(
            parse_hub_config(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_dotted_name_rejected() {
        let yaml = r#"
servers:
  - { name: "a.b", url: "http://localhost:1" }
"#;
        let err = parse_hub_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("a.b"));
    }

    #[test]
    fn test_bad_url_scheme_rejected() {
        let yaml = r#"
servers:
  - { name: a, url: "localhost:1" }
"#;
        let err = parse_hub_config(yaml).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_colliding_payload_fields_rejected() {
        let yaml = r#"
servers:
  - name: a
    url: "http://localhost:1"
    payload_map: { tool_field: x, args_field: x }
"#;
        assert!(parse_hub_config(yaml).is_err());
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let yaml = "hub:\n  refresh_interval_secs: 0\n";
        assert!(parse_hub_config(yaml).is_err());
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = parse_hub_config("servers: [ {").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_interpolate_env_vars_with_default() {
        std::env::remove_var("__MCP_HUB_TEST_MISSING__");
        let result = interpolate_env_vars("${__MCP_HUB_TEST_MISSING__:-http://fallback:1}");
        assert_eq!(result, "http://fallback:1");
    }

    #[test]
    fn test_interpolate_unterminated_kept() {
        assert_eq!(interpolate_env_vars("url: ${BROKEN"), "url: ${BROKEN");
    }

    #[test]
    fn test_interpolate_env_vars_with_value() {
        std::env::set_var("__MCP_HUB_TEST_URL__", "http://example:8080");
        let result = interpolate_env_vars("url: ${__MCP_HUB_TEST_URL__}");
        assert_eq!(result, "url: http://example:8080");
        std::env::remove_var("__MCP_HUB_TEST_URL__");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let input = "plain text with $dollar but no braces";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn test_load_and_find_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let found = find_config_path(&nested).unwrap();
        assert_eq!(found, path);

        let config = load_hub_config(&found).unwrap();
        assert_eq!(config.servers[0].name, "weather");
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_hub_config(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
