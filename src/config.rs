//! TOML configuration.
//!
//! Every section except `[remote]` has defaults, so a config file only
//! needs to name what differs from [`Config::minimal`]. The
//! `ACCOBOT_REMOTE_URL` environment variable overrides `remote.base_url`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use accobot_core::conversation::DEFAULT_CONTEXT_WINDOW;

pub const REMOTE_URL_ENV: &str = "ACCOBOT_REMOTE_URL";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub sandbox: SandboxConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SandboxConfig {
    /// Every user-supplied folder must resolve under this directory.
    #[serde(default = "default_sandbox_root")]
    pub root: PathBuf,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: default_sandbox_root(),
        }
    }
}

fn default_sandbox_root() -> PathBuf {
    PathBuf::from("./test-data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    /// Request timeout. Unset means the transport default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_chat_path() -> String {
    "/chat/".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_greeting")]
    pub greeting: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            max_message_chars: default_max_message_chars(),
            greeting: default_greeting(),
        }
    }
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}
fn default_max_message_chars() -> usize {
    10_000
}
fn default_greeting() -> Option<String> {
    Some(
        "Hello! I'm MyACCOBot, your financial assistant. How can I help you analyze your financial data today?"
            .to_string(),
    )
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Defaults used when no config file is present.
    pub fn minimal() -> Self {
        Self {
            sandbox: SandboxConfig::default(),
            remote: RemoteConfig {
                base_url: "http://localhost:4000/api".to_string(),
                chat_path: default_chat_path(),
                timeout_ms: None,
            },
            session: SessionConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Full URL of the chat endpoint, joined without doubling slashes.
    pub fn chat_url(&self) -> String {
        format!(
            "{}/{}",
            self.remote.base_url.trim_end_matches('/'),
            self.remote.chat_path.trim_start_matches('/')
        )
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    let mut config = Config::minimal();
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    apply_remote_url_override(config, std::env::var(REMOTE_URL_ENV).ok());
}

/// A blank value leaves `remote.base_url` untouched.
fn apply_remote_url_override(config: &mut Config, url: Option<String>) {
    if let Some(url) = url {
        if !url.trim().is_empty() {
            config.remote.base_url = url.trim().to_string();
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.session.context_window == 0 {
        bail!("session.context_window must be >= 1");
    }
    if config.session.max_message_chars == 0 {
        bail!("session.max_message_chars must be >= 1");
    }
    if config.remote.timeout_ms == Some(0) {
        bail!("remote.timeout_ms must be > 0 when set");
    }

    let url = reqwest::Url::parse(&config.remote.base_url)
        .with_context(|| format!("remote.base_url is not a valid URL: {}", config.remote.base_url))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!(
            "Unsupported remote.base_url scheme: '{}'. Must be http or https.",
            other
        ),
    }

    if config.sandbox.root.as_os_str().is_empty() {
        bail!("sandbox.root must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let file = write_config("[remote]\nbase_url = \"http://127.0.0.1:4000/api\"\n");
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.session.context_window, 5);
        assert_eq!(cfg.session.max_message_chars, 10_000);
        assert_eq!(cfg.sandbox.root, PathBuf::from("./test-data"));
        assert_eq!(cfg.chat_url(), "http://127.0.0.1:4000/api/chat/");
    }

    #[test]
    fn zero_window_is_rejected() {
        let file = write_config(
            "[remote]\nbase_url = \"http://localhost/api\"\n[session]\ncontext_window = 0\n",
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("context_window"));
    }

    #[test]
    fn non_http_url_is_rejected() {
        let file = write_config("[remote]\nbase_url = \"ftp://localhost/api\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn chat_url_joins_slashes() {
        let mut cfg = Config::minimal();
        cfg.remote.base_url = "http://h:1/api/".into();
        cfg.remote.chat_path = "chat/".into();
        assert_eq!(cfg.chat_url(), "http://h:1/api/chat/");
    }

    #[test]
    fn remote_url_override_replaces_base_url() {
        let mut cfg = Config::minimal();
        apply_remote_url_override(&mut cfg, Some(" https://answers.internal/api ".into()));
        assert_eq!(cfg.remote.base_url, "https://answers.internal/api");
        assert_eq!(cfg.chat_url(), "https://answers.internal/api/chat/");

        apply_remote_url_override(&mut cfg, Some("   ".into()));
        apply_remote_url_override(&mut cfg, None);
        assert_eq!(cfg.remote.base_url, "https://answers.internal/api");
    }
}
