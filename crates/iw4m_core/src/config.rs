use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use toml::Value;

pub const DEFAULT_CONFIG_PATH: &str = ".iw4m/config.toml";
pub const DEFAULT_USER_AGENT: &str = "iw4m-rust/0.2";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RETRIES: usize = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

pub const ENV_URL: &str = "IW4M_URL";
pub const ENV_SERVER_ID: &str = "IW4M_ID";
pub const ENV_COOKIE: &str = "IW4M_HEADER";
pub const ENV_USER_AGENT: &str = "IW4M_USER_AGENT";
pub const ENV_TIMEOUT_MS: &str = "IW4M_HTTP_TIMEOUT_MS";
pub const ENV_RETRIES: &str = "IW4M_HTTP_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "IW4M_HTTP_RETRY_DELAY_MS";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub console: ConsoleSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ConsoleSection {
    pub url: Option<String>,
    pub server_id: Option<String>,
    pub cookie: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<usize>,
    pub retry_delay_ms: Option<u64>,
}

/// Fully resolved connection settings handed to the HTTP gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub base_url: String,
    pub server_id: String,
    pub cookie: Option<String>,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl ConsoleConfig {
    /// Resolve settings from the process environment: env > config > default.
    pub fn resolve(&self) -> Result<ConsoleSettings> {
        self.resolve_with(|key| env::var(key).ok())
    }

    pub fn resolve_with<F>(&self, lookup: F) -> Result<ConsoleSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let section = &self.console;

        let Some(base_url) = read(ENV_URL).or_else(|| section.url.clone()) else {
            bail!("console URL is not configured (set {ENV_URL} or [console].url)");
        };
        let base_url = normalize_base_url(&base_url)?;

        let server_id = read(ENV_SERVER_ID)
            .or_else(|| section.server_id.clone())
            .unwrap_or_default();
        let cookie = read(ENV_COOKIE).or_else(|| section.cookie.clone());
        let user_agent = read(ENV_USER_AGENT)
            .or_else(|| section.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let timeout_ms = parse_override(read(ENV_TIMEOUT_MS), ENV_TIMEOUT_MS)?
            .or(section.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let max_retries = parse_override(read(ENV_RETRIES), ENV_RETRIES)?
            .or(section.retries)
            .unwrap_or(DEFAULT_RETRIES);
        let retry_delay_ms = parse_override(read(ENV_RETRY_DELAY_MS), ENV_RETRY_DELAY_MS)?
            .or(section.retry_delay_ms)
            .unwrap_or(DEFAULT_RETRY_DELAY_MS);

        Ok(ConsoleSettings {
            base_url,
            server_id,
            cookie,
            user_agent,
            timeout_ms,
            max_retries,
            retry_delay_ms,
        })
    }
}

fn parse_override<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    match value {
        Some(raw) => match raw.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => bail!("{key} must be a non-negative integer, got {raw:?}"),
        },
        None => Ok(None),
    }
}

/// Validate a console base URL and strip trailing slashes so request paths
/// can be appended directly.
pub fn normalize_base_url(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed =
        url::Url::parse(trimmed).with_context(|| format!("invalid console URL: {value}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("console URL must use http or https: {value}");
    }
    Ok(trimmed.to_string())
}

/// Load and parse a ConsoleConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<ConsoleConfig> {
    if !config_path.exists() {
        return Ok(ConsoleConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: ConsoleConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

#[derive(Debug, Clone, Default)]
pub struct ConsoleConfigPatch {
    pub set_url: Option<String>,
    pub set_server_id: Option<String>,
    pub set_cookie: Option<String>,
}

impl ConsoleConfigPatch {
    fn is_empty(&self) -> bool {
        self.set_url.is_none() && self.set_server_id.is_none() && self.set_cookie.is_none()
    }
}

/// Update selected keys under `[console]` while preserving all other config sections.
/// Returns `true` when a write occurred.
pub fn patch_console_config(config_path: &Path, patch: &ConsoleConfigPatch) -> Result<bool> {
    if patch.is_empty() {
        return Ok(false);
    }

    let mut root = if config_path.exists() {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        toml::from_str::<Value>(&content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?
    } else {
        Value::Table(Default::default())
    };
    let original = root.clone();

    let root_table = root.as_table_mut().ok_or_else(|| {
        anyhow::anyhow!(
            "top-level TOML must be a table in {}",
            config_path.display()
        )
    })?;
    let console_entry = root_table
        .entry("console".to_string())
        .or_insert_with(|| Value::Table(Default::default()));
    let console_table = console_entry.as_table_mut().ok_or_else(|| {
        anyhow::anyhow!("[console] must be a table in {}", config_path.display())
    })?;

    if let Some(url) = &patch.set_url {
        let url = normalize_base_url(url)?;
        console_table.insert("url".to_string(), Value::String(url));
    }
    if let Some(server_id) = &patch.set_server_id {
        let server_id = server_id.trim();
        if server_id.is_empty() {
            console_table.remove("server_id");
        } else {
            console_table.insert("server_id".to_string(), Value::String(server_id.to_string()));
        }
    }
    if let Some(cookie) = &patch.set_cookie {
        if cookie.trim().is_empty() {
            console_table.remove("cookie");
        } else {
            console_table.insert("cookie".to_string(), Value::String(cookie.clone()));
        }
    }

    if root == original {
        return Ok(false);
    }

    let parent = config_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("config path has no parent: {}", config_path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    let rendered = toml::to_string_pretty(&root).context("failed to serialize config TOML")?;
    fs::write(config_path, rendered)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn configured() -> ConsoleConfig {
        ConsoleConfig {
            console: ConsoleSection {
                url: Some("https://admin.example.net/".to_string()),
                server_id: Some("1270014976".to_string()),
                cookie: Some(".AspNetCore.Cookies=abc".to_string()),
                ..ConsoleSection::default()
            },
        }
    }

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/config.toml")).expect("load config");
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn load_config_parses_console_section() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[console]
url = "http://127.0.0.1:1624"
server_id = "12345"
cookie = ".AspNetCore.Cookies=xyz"
user_agent = "test-agent/1.0"
timeout_ms = 5000
retries = 0
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.console.url.as_deref(), Some("http://127.0.0.1:1624"));
        assert_eq!(config.console.server_id.as_deref(), Some("12345"));
        assert_eq!(config.console.timeout_ms, Some(5000));
        assert_eq!(config.console.retries, Some(0));
        assert_eq!(config.console.retry_delay_ms, None);
    }

    #[test]
    fn load_config_tolerates_partial_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[output]\nformat = \"json\"\n").expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert!(config.console.url.is_none());
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[console\nurl = \"oops\"").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn resolve_uses_config_and_defaults() {
        let settings = configured().resolve_with(no_env).expect("resolve");
        assert_eq!(settings.base_url, "https://admin.example.net");
        assert_eq!(settings.server_id, "1270014976");
        assert_eq!(settings.cookie.as_deref(), Some(".AspNetCore.Cookies=abc"));
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(settings.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(settings.max_retries, DEFAULT_RETRIES);
        assert_eq!(settings.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
    }

    #[test]
    fn resolve_prefers_environment() {
        let env = BTreeMap::from([
            (ENV_URL, "http://10.0.0.5:1624"),
            (ENV_SERVER_ID, " 99 "),
            (ENV_COOKIE, "session=1"),
            (ENV_TIMEOUT_MS, "1500"),
            (ENV_RETRIES, ""),
        ]);
        let settings = configured()
            .resolve_with(|key| env.get(key).map(|value| value.to_string()))
            .expect("resolve");
        assert_eq!(settings.base_url, "http://10.0.0.5:1624");
        assert_eq!(settings.server_id, "99");
        assert_eq!(settings.cookie.as_deref(), Some("session=1"));
        assert_eq!(settings.timeout_ms, 1500);
        assert_eq!(settings.max_retries, DEFAULT_RETRIES);
    }

    #[test]
    fn resolve_requires_url() {
        let error = ConsoleConfig::default()
            .resolve_with(no_env)
            .expect_err("must fail");
        assert!(error.to_string().contains(ENV_URL));
    }

    #[test]
    fn resolve_rejects_malformed_numbers() {
        let error = configured()
            .resolve_with(|key| (key == ENV_RETRIES).then(|| "many".to_string()))
            .expect_err("must fail");
        assert!(error.to_string().contains(ENV_RETRIES));
    }

    #[test]
    fn normalize_base_url_validates_scheme() {
        assert_eq!(
            normalize_base_url("http://host:1624//").expect("url"),
            "http://host:1624"
        );
        assert!(normalize_base_url("ftp://host").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn patch_console_config_preserves_other_sections() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("nested").join("config.toml");
        fs::create_dir_all(config_path.parent().expect("parent")).expect("mkdir");
        fs::write(&config_path, "[output]\nformat = \"json\"\n").expect("write config");

        let wrote = patch_console_config(
            &config_path,
            &ConsoleConfigPatch {
                set_url: Some("https://admin.example.net/".to_string()),
                set_server_id: Some("42".to_string()),
                set_cookie: None,
            },
        )
        .expect("patch");
        assert!(wrote);

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.console.url.as_deref(), Some("https://admin.example.net"));
        assert_eq!(config.console.server_id.as_deref(), Some("42"));
        let raw = fs::read_to_string(&config_path).expect("read");
        assert!(raw.contains("[output]"));

        let wrote_again = patch_console_config(
            &config_path,
            &ConsoleConfigPatch {
                set_server_id: Some("42".to_string()),
                ..ConsoleConfigPatch::default()
            },
        )
        .expect("patch");
        assert!(!wrote_again);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        let wrote =
            patch_console_config(&config_path, &ConsoleConfigPatch::default()).expect("patch");
        assert!(!wrote);
        assert!(!config_path.exists());
    }
}
