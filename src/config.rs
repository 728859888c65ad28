use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bookmarks")]
#[command(about = "Runs the bookmarks service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookmarks")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    port: u16,
    api_token: String,
    #[serde(default = "default_environment")]
    environment: String,
}

fn default_environment() -> String {
    "development".to_string()
}

impl App {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_api_token(&self) -> &str {
        &self.api_token
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Libsql,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Storage {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub seed: bool,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_database() -> String {
    "bookmarks.db".to_string()
}

fn default_sync_interval() -> u64 {
    60
}

impl Default for Storage {
    fn default() -> Self {
        Storage {
            backend: Backend::default(),
            database: default_database(),
            seed: false,
            turso_url: None,
            turso_auth_token: None,
            sync_interval_seconds: default_sync_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub storage: Storage,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        if config.app.api_token.trim().is_empty() {
            anyhow::bail!("app.api_token must not be empty");
        }
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find('}') {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = %var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let cfg = Config::from_yaml("app:\n  port: 8000\n  api_token: secret\n").unwrap();
        assert_eq!(cfg.app.get_port(), 8000);
        assert_eq!(cfg.app.get_api_token(), "secret");
        assert!(!cfg.app.is_production());
        assert_eq!(cfg.storage.backend, Backend::Memory);
        assert_eq!(cfg.storage.database, "bookmarks.db");
        assert!(!cfg.storage.seed);
    }

    #[test]
    fn storage_defaults_match_with_or_without_section() {
        let without = Config::from_yaml("app:\n  port: 8000\n  api_token: t\n").unwrap();
        let with = Config::from_yaml("app:\n  port: 8000\n  api_token: t\nstorage:\n  seed: false\n").unwrap();
        assert_eq!(without.storage.database, with.storage.database);
        assert_eq!(without.storage.sync_interval_seconds, 60);
        assert_eq!(with.storage.sync_interval_seconds, 60);
        assert_eq!(without.storage.backend, with.storage.backend);
    }

    #[test]
    fn falls_back_to_default_when_variable_is_unset() {
        let yaml = "app:\n  port: ${BOOKMARKS_TEST_UNSET_PORT:-9090}\n  api_token: t\n  environment: production\nstorage:\n  backend: libsql\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.app.get_port(), 9090);
        assert!(cfg.app.is_production());
        assert_eq!(cfg.storage.backend, Backend::Libsql);
    }

    #[test]
    fn substitutes_set_variables() {
        let yaml = "x: ${PATH}";
        let out = Config::substitute_env_vars(yaml).unwrap();
        assert_eq!(out, format!("x: {}", env::var("PATH").unwrap()));
    }

    #[test]
    fn rejects_empty_api_token() {
        let err = Config::from_yaml("app:\n  port: 8000\n  api_token: \"\"\n").unwrap_err();
        assert!(err.to_string().contains("api_token"));
    }
}
