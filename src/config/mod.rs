use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_API_BASE_URL: &str = "https://api.himmel.app";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_AUTH_RETRIES: u32 = 2;

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Override the Himmel API base URL (default: https://api.himmel.app).
    api_base_url: Option<String>,
    /// Per-request timeout in seconds (default: 10).
    timeout_secs: Option<u64>,
    /// How many refresh-and-retry cycles one call may spend (default: 2; 0 disables).
    max_auth_retries: Option<u32>,
    /// Log level filter string, e.g. "debug", "info,himmel=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json".
    log_format: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── ClientConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base URL (HIMMEL_API_URL env var).
    pub api_base_url: String,
    /// Directory for config.toml and the persisted session line.
    pub data_dir: PathBuf,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Refresh-and-retry budget per logical call (0 = refresh disabled).
    pub max_auth_retries: u32,
    pub log: String,
    /// "pretty" | "json".
    pub log_format: String,
}

impl ClientConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        api_base_url: Option<String>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let toml = load_toml(&data_dir).unwrap_or_default();

        let api_base_url = api_base_url
            .or_else(|| std::env::var("HIMMEL_API_URL").ok().filter(|s| !s.is_empty()))
            .or(toml.api_base_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout_secs = toml.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_auth_retries = toml.max_auth_retries.unwrap_or(DEFAULT_MAX_AUTH_RETRIES);

        let log = log
            .or_else(|| std::env::var("HIMMEL_LOG").ok().filter(|s| !s.is_empty()))
            .or(toml.log)
            .unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("HIMMEL_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        Self {
            api_base_url,
            data_dir,
            timeout_secs,
            max_auth_retries,
            log,
            log_format,
        }
    }

    /// The fixed session refresh endpoint.
    pub fn refresh_url(&self) -> String {
        format!("{}/auth/refresh", self.api_base_url)
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("himmel");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/himmel or ~/.local/share/himmel
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("himmel");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("himmel");
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("himmel");
        }
    }
    // Fallback
    PathBuf::from(".himmel")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_without_toml() {
        let dir = TempDir::new().unwrap();
        let cfg = ClientConfig::new(
            Some("https://api.example.test".to_string()),
            Some(dir.path().to_path_buf()),
            Some("warn".to_string()),
        );
        assert_eq!(cfg.api_base_url, "https://api.example.test");
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.max_auth_retries, DEFAULT_MAX_AUTH_RETRIES);
        assert_eq!(cfg.log, "warn");
    }

    #[test]
    fn toml_overrides_defaults_but_not_args() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
api_base_url = "https://toml.example.test"
timeout_secs = 30
max_auth_retries = 1
"#,
        )
        .unwrap();

        let cfg = ClientConfig::new(
            Some("https://arg.example.test".to_string()),
            Some(dir.path().to_path_buf()),
            None,
        );
        // Explicit argument beats the TOML value.
        assert_eq!(cfg.api_base_url, "https://arg.example.test");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_auth_retries, 1);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let cfg = ClientConfig::new(
            Some("https://api.example.test/".to_string()),
            Some(dir.path().to_path_buf()),
            None,
        );
        assert_eq!(cfg.refresh_url(), "https://api.example.test/auth/refresh");
    }
}
