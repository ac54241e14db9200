use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::error::{Result, ValidatorError};

pub const DEFAULT_LOG_FILTER: &str = "hacs_validator=info";

/// Main configuration structure loaded from hacs_validator.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Runtime inputs loaded from the CI environment
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Tunables for external calls and the registry URLs the checks probe
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub github_api_url: String,
    pub http_timeout_ms: u64,
    pub install_timeout_ms: u64,
    pub check_timeout_ms: u64,
    pub pip_path: String,
    pub pipdeptree_path: String,
    pub pip_index_url: String,
    pub pip_extra_index_url: String,
    /// `{domain}` is replaced with the manifest domain
    pub brands_url_template: String,
    /// `{domain}` is replaced with the manifest domain
    pub wheels_url_template: String,
    pub comment_marker: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            github_api_url: "https://api.github.com".to_string(),
            http_timeout_ms: 10_000,
            install_timeout_ms: 300_000,
            check_timeout_ms: 600_000,
            pip_path: "pip".to_string(),
            pipdeptree_path: "pipdeptree".to_string(),
            pip_index_url: "https://wheels.home-assistant.io/alpine-3.12/amd64".to_string(),
            pip_extra_index_url: "https://pypi.python.org/simple".to_string(),
            brands_url_template:
                "https://github.com/home-assistant/brands/tree/master/custom_integrations/{domain}"
                    .to_string(),
            wheels_url_template: "https://raw.githubusercontent.com/home-assistant/wheels-custom-integrations/master/components/{domain}.json".to_string(),
            comment_marker: "<!-- hacs-validator comment -->".to_string(),
        }
    }
}

/// Event that triggered the run, as reported by the CI environment
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub name: Option<String>,
    pub git_ref: Option<String>,
    pub pull_request: Option<u64>,
}

impl EventContext {
    /// Read the pull request number from a GitHub event payload file
    pub fn pull_request_from_payload(path: &Path) -> Result<Option<u64>> {
        let raw = std::fs::read_to_string(path)?;
        let payload: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(payload
            .get("pull_request")
            .and_then(|pr| pr.get("number"))
            .and_then(|n| n.as_u64()))
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub category: Option<String>,
    pub ignore: Vec<String>,
    pub github_token: Option<String>,
    pub comment: bool,
    pub repository: Option<String>,
    pub workspace: PathBuf,
    pub event: EventContext,
    pub python_version: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            category: None,
            ignore: Vec::new(),
            github_token: None,
            comment: false,
            repository: None,
            workspace: PathBuf::from("."),
            event: EventContext::default(),
            python_version: "3.8".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses HACS_VALIDATOR_CONFIG environment variable or defaults to "hacs_validator.toml"
    pub fn load() -> Result<Self> {
        if let Ok(env_path) = std::env::var("HACS_VALIDATOR_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = std::env::var("HACS_VALIDATOR_CONFIG")
            .unwrap_or_else(|_| "hacs_validator.toml".to_string());
        let mut config = Self::from_file(Path::new(&config_path))?;

        if let Ok(api_url) = std::env::var("GITHUB_API_URL")
            && !api_url.trim().is_empty()
        {
            config.validation.github_api_url = api_url;
        }

        config.runtime = RuntimeConfig::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the TOML file at `path`; a file that does not exist yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ValidatorError::Config {
                message: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let v = &self.validation;
        if v.http_timeout_ms == 0 || v.install_timeout_ms == 0 || v.check_timeout_ms == 0 {
            return Err(ValidatorError::Config {
                message: "timeouts must be greater than zero".into(),
            });
        }
        if v.check_timeout_ms <= v.install_timeout_ms {
            return Err(ValidatorError::Config {
                message: "check_timeout_ms must be greater than install_timeout_ms".into(),
            });
        }
        for (key, template) in [
            ("brands_url_template", &v.brands_url_template),
            ("wheels_url_template", &v.wheels_url_template),
        ] {
            if !template.contains("{domain}") {
                return Err(ValidatorError::Config {
                    message: format!("{key} must contain a {{domain}} placeholder"),
                });
            }
        }
        if v.comment_marker.trim().is_empty() {
            return Err(ValidatorError::Config {
                message: "comment_marker cannot be empty".into(),
            });
        }
        Ok(())
    }
}

impl RuntimeConfig {
    /// Load action inputs and GitHub context from environment variables
    pub fn load_from_env() -> Result<Self> {
        let input = |name: &str| {
            std::env::var(format!("INPUT_{name}"))
                .ok()
                .filter(|v| !v.trim().is_empty())
        };

        let comment = match input("COMMENT") {
            Some(raw) => parse_bool_input("comment", &raw)?,
            None => false,
        };

        let mut event = EventContext {
            name: std::env::var("GITHUB_EVENT_NAME").ok(),
            git_ref: std::env::var("GITHUB_REF").ok(),
            pull_request: None,
        };
        if let Ok(path) = std::env::var("GITHUB_EVENT_PATH") {
            match EventContext::pull_request_from_payload(Path::new(&path)) {
                Ok(number) => event.pull_request = number,
                Err(e) => tracing::warn!("Could not read event payload {}: {}", path, e),
            }
        }

        Ok(Self {
            category: input("CATEGORY"),
            ignore: input("IGNORE")
                .map(|raw| parse_ignore_list(&raw))
                .unwrap_or_default(),
            github_token: input("GITHUB-TOKEN")
                .or_else(|| input("GITHUB_TOKEN"))
                .or_else(|| std::env::var("GITHUB_TOKEN").ok()),
            comment,
            repository: std::env::var("GITHUB_REPOSITORY").ok(),
            workspace: std::env::var("GITHUB_WORKSPACE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            event,
            python_version: std::env::var("DEFAULT_PYTHON").unwrap_or_else(|_| "3.8".to_string()),
        })
    }
}

/// Log filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`] when unset or invalid
pub fn log_filter(raw: Option<&str>) -> EnvFilter {
    raw.filter(|r| !r.trim().is_empty())
        .and_then(|r| EnvFilter::try_new(r).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Split the space separated `ignore` input into check names
pub fn parse_ignore_list(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Boolean inputs follow the YAML 1.2 core schema, like `core.getBooleanInput`
pub fn parse_bool_input(name: &str, raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        other => Err(ValidatorError::Config {
            message: format!(
                "Input '{name}' does not meet YAML 1.2 \"Core Schema\" specification: {other}"
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ignore_list_splits_on_any_whitespace() {
        assert_eq!(
            parse_ignore_list("  topics\tbrands  wheels "),
            vec!["topics", "brands", "wheels"]
        );
        assert!(parse_ignore_list("").is_empty());
    }

    #[test]
    fn bool_input_accepts_core_schema_only() {
        assert!(parse_bool_input("comment", "True").unwrap());
        assert!(!parse_bool_input("comment", "FALSE").unwrap());
        let err = parse_bool_input("comment", "yes").unwrap_err().to_string();
        assert!(err.contains("comment"));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [validation]
            http_timeout_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(config.validation.http_timeout_ms, 2500);
        assert_eq!(config.validation.pip_path, "pip");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.validation.check_timeout_ms, 600_000);
    }

    #[test]
    fn unreadable_config_file_is_an_error() {
        // a directory exists but cannot be read as a file
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path()).unwrap_err().to_string();
        assert!(err.contains("failed to read"), "{err}");
    }

    #[test]
    fn check_timeout_must_exceed_install_timeout() {
        let mut config = Config::default();
        config.validation.check_timeout_ms = config.validation.install_timeout_ms;
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_filter_falls_back_to_default_directive() {
        let rendered = |raw: Option<&str>| log_filter(raw).to_string().to_lowercase();
        assert_eq!(rendered(None), DEFAULT_LOG_FILTER);
        assert_eq!(rendered(Some("  ")), DEFAULT_LOG_FILTER);
        assert_eq!(rendered(Some("hacs_validator=debug")), "hacs_validator=debug");
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let mut config = Config::default();
        config.validation.wheels_url_template = "https://example.com/wheels".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn pull_request_number_is_read_from_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"action":"opened","pull_request":{{"number":42}}}}"#).unwrap();
        let number = EventContext::pull_request_from_payload(file.path()).unwrap();
        assert_eq!(number, Some(42));
    }

    #[test]
    fn push_payload_has_no_pull_request() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ref":"refs/heads/main"}}"#).unwrap();
        assert_eq!(
            EventContext::pull_request_from_payload(file.path()).unwrap(),
            None
        );
    }
}
