// Environment configuration

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use gs_orchestrator::{OrchestratorSettings, DEFAULT_CONCURRENCY};
use gs_platform::discord::{DiscordConfig, DEFAULT_API_BASE};
use gs_platform::Snowflake;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Failed to read {path}: {reason}")]
    EnvFile { path: String, reason: String },

    #[error("{key}={value} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub guild_id: Snowflake,
    pub admin_role_id: Option<Snowflake>,
    pub members_role_id: Option<Snowflake>,
    pub active_category_name: String,
    pub archive_category_name: String,
    pub api_base: String,
    pub create_concurrency: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("guild_id", &self.guild_id)
            .field("admin_role_id", &self.admin_role_id)
            .field("members_role_id", &self.members_role_id)
            .field("active_category_name", &self.active_category_name)
            .field("archive_category_name", &self.archive_category_name)
            .field("api_base", &self.api_base)
            .field("create_concurrency", &self.create_concurrency)
            .finish()
    }
}

impl Config {
    /// Process environment first, then `.env` in the working directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = read_env_file(Path::new(".env"))?;
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get("DISCORD_TOKEN")
            .or_else(|| get("TOKEN"))
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let guild_id = parse_id("GUILD_ID", get("GUILD_ID"))?.ok_or(ConfigError::Missing("GUILD_ID"))?;

        let create_concurrency = match get("CREATE_CONCURRENCY") {
            None => DEFAULT_CONCURRENCY,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CREATE_CONCURRENCY",
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    })
                }
            },
        };

        Ok(Self {
            token,
            guild_id,
            admin_role_id: parse_id("ADMIN_ROLE_ID", get("ADMIN_ROLE_ID"))?,
            members_role_id: parse_id("MEMBERS_ROLE_ID", get("MEMBERS_ROLE_ID"))?,
            active_category_name: get("ACTIVE_CATEGORY_NAME").unwrap_or_else(|| "Projets".to_string()),
            archive_category_name: get("ARCHIVE_CATEGORY_NAME")
                .unwrap_or_else(|| "Archives".to_string()),
            api_base: get("DISCORD_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            create_concurrency,
        })
    }

    pub fn discord(&self) -> DiscordConfig {
        DiscordConfig {
            api_base: self.api_base.clone(),
            ..DiscordConfig::new(self.token.clone(), self.guild_id)
        }
    }

    pub fn orchestrator_settings(&self, concurrency: Option<usize>) -> OrchestratorSettings {
        OrchestratorSettings {
            active_container: self.active_category_name.clone(),
            archive_container: self.archive_category_name.clone(),
            admin_principals: self
                .admin_role_id
                .into_iter()
                .chain(self.members_role_id)
                .collect(),
            create_concurrency: concurrency.unwrap_or(self.create_concurrency),
            ..OrchestratorSettings::default()
        }
    }
}

/// Variables from a dotenv file; a missing file yields none.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_file_error = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries
            .map(|entry| entry.map_err(env_file_error))
            .collect(),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(env_file_error(e)),
    }
}

fn parse_id(key: &'static str, raw: Option<String>) -> Result<Option<Snowflake>, ConfigError> {
    raw.map(|value| {
        value.parse::<Snowflake>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}
