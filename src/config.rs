use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::GstLoginError;

const CONFIG_FILE: &str = "gstlogin.toml";

pub const DEFAULT_STORE_FILE: &str = "gst_accounts.env";
pub const DEFAULT_LOGIN_URL: &str = "https://services.gst.gov.in/services/login";

const ENV_STORE: &str = "GSTLOGIN_STORE";
const ENV_BROWSER: &str = "GSTLOGIN_BROWSER";
const ENV_URL: &str = "GSTLOGIN_URL";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
    /// Browser binary override. `None` lets the session auto-detect an
    /// installed Chrome at launch time.
    pub browser: Option<PathBuf>,
    pub url: String,
}

/// Optional `gstlogin.toml` contents. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    store: Option<PathBuf>,
    browser: Option<PathBuf>,
    url: Option<String>,
}

#[derive(Debug, Default)]
struct EnvOverrides {
    store: Option<PathBuf>,
    browser: Option<PathBuf>,
    url: Option<String>,
}

impl EnvOverrides {
    fn from_process() -> Self {
        Self {
            store: env::var_os(ENV_STORE).map(PathBuf::from),
            browser: env::var_os(ENV_BROWSER).map(PathBuf::from),
            url: env::var(ENV_URL).ok(),
        }
    }
}

/// Resolve configuration from `gstlogin.toml` in the working directory,
/// `GSTLOGIN_*` environment variables, and CLI flags.
pub fn load(cli: &Cli) -> Result<Config, GstLoginError> {
    let file = read_file(Path::new(CONFIG_FILE))?;
    Ok(resolve(file, EnvOverrides::from_process(), cli))
}

fn read_file(path: &Path) -> Result<FileConfig, GstLoginError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| GstLoginError::Config(format!("{}: {e}", path.display())))
}

/// Flags override environment, environment overrides the config file,
/// the file overrides built-in defaults.
fn resolve(file: FileConfig, env: EnvOverrides, cli: &Cli) -> Config {
    Config {
        store_path: cli
            .store
            .clone()
            .or(env.store)
            .or(file.store)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)),
        browser: cli.browser.clone().or(env.browser).or(file.browser),
        url: cli
            .url
            .clone()
            .or(env.url)
            .or(file.url)
            .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_flags() -> Cli {
        Cli {
            store: None,
            browser: None,
            url: None,
        }
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = resolve(FileConfig::default(), EnvOverrides::default(), &no_flags());
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_FILE));
        assert_eq!(config.browser, None);
        assert_eq!(config.url, DEFAULT_LOGIN_URL);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = FileConfig {
            store: Some(PathBuf::from("/data/accounts.env")),
            browser: Some(PathBuf::from("/opt/chrome")),
            url: Some("https://example.test/login".into()),
        };
        let config = resolve(file, EnvOverrides::default(), &no_flags());
        assert_eq!(config.store_path, PathBuf::from("/data/accounts.env"));
        assert_eq!(config.browser, Some(PathBuf::from("/opt/chrome")));
        assert_eq!(config.url, "https://example.test/login");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            store: Some(PathBuf::from("/data/accounts.env")),
            browser: None,
            url: Some("https://file.test/login".into()),
        };
        let env = EnvOverrides {
            store: Some(PathBuf::from("/env/accounts.env")),
            browser: None,
            url: Some("https://env.test/login".into()),
        };
        let config = resolve(file, env, &no_flags());
        assert_eq!(config.store_path, PathBuf::from("/env/accounts.env"));
        assert_eq!(config.url, "https://env.test/login");
    }

    #[test]
    fn test_flags_override_env() {
        let env = EnvOverrides {
            store: Some(PathBuf::from("/env/accounts.env")),
            browser: Some(PathBuf::from("/env/chrome")),
            url: Some("https://env.test/login".into()),
        };
        let cli = Cli {
            store: Some(PathBuf::from("/flag/accounts.env")),
            browser: None,
            url: Some("https://flag.test/login".into()),
        };
        let config = resolve(FileConfig::default(), env, &cli);
        assert_eq!(config.store_path, PathBuf::from("/flag/accounts.env"));
        // No flag given, so the env browser survives.
        assert_eq!(config.browser, Some(PathBuf::from("/env/chrome")));
        assert_eq!(config.url, "https://flag.test/login");
    }

    #[test]
    fn test_read_file_parses_partial_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gstlogin.toml");
        std::fs::write(&path, "browser = \"/usr/bin/chromium\"\n").unwrap();

        let file = read_file(&path).unwrap();
        assert_eq!(file.browser, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(file.store, None);
        assert_eq!(file.url, None);
    }

    #[test]
    fn test_read_file_missing_is_default() {
        let dir = TempDir::new().unwrap();
        let file = read_file(&dir.path().join("gstlogin.toml")).unwrap();
        assert!(file.store.is_none() && file.browser.is_none() && file.url.is_none());
    }

    #[test]
    fn test_read_file_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gstlogin.toml");
        std::fs::write(&path, "browser = [not toml").unwrap();

        let err = read_file(&path).unwrap_err();
        assert!(matches!(err, GstLoginError::Config(_)));
    }
}
