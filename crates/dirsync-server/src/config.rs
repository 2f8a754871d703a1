//! Server configuration

use anyhow::Result;
use serde::Deserialize;

use dirsync_db::DatabaseConfig;
use dirsync_identity::{GitLabConfig, ReaderOptions, ReconcilerOptions};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub gitlab: GitLabSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Deserialize)]
pub struct GitLabSettings {
    pub host_url: String,
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_bot_name_suffix")]
    pub bot_name_suffix: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct SyncSettings {
    /// Seconds between passes; a single pass runs when unset
    pub interval_secs: Option<u64>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_copy_display_name")]
    pub copy_display_name: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_secs: None,
            concurrency: default_concurrency(),
            dry_run: false,
            copy_display_name: default_copy_display_name(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_bot_name_suffix() -> String {
    " Bot".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_concurrency() -> usize {
    1
}

fn default_copy_display_name() -> bool {
    true
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            // Start with default values
            .set_default("gitlab.timeout_secs", 30)?
            .set_default("gitlab.max_retries", 3)?
            .set_default("database.max_connections", 10)?
            .set_default("sync.concurrency", 1)?
            // Load from config file if present
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Load from environment variables with DIRSYNC_ prefix
            .add_source(
                config::Environment::with_prefix("DIRSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn gitlab_config(&self) -> GitLabConfig {
        GitLabConfig {
            host_url: self.gitlab.host_url.clone(),
            token: self.gitlab.token.clone(),
            timeout_secs: self.gitlab.timeout_secs,
            max_retries: self.gitlab.max_retries,
            ..Default::default()
        }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database.url.clone(), self.database.max_connections)
    }

    pub fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            concurrency: self.sync.concurrency,
            dry_run: self.sync.dry_run,
            reader: ReaderOptions {
                bot_name_suffix: self.gitlab.bot_name_suffix.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(sync: SyncSettings) -> Settings {
        Settings {
            gitlab: GitLabSettings {
                host_url: "https://gitlab.example.com".to_string(),
                token: "secret".to_string(),
                timeout_secs: 10,
                max_retries: 1,
                bot_name_suffix: " Bot".to_string(),
            },
            database: DatabaseSettings {
                url: "postgres://localhost/dirsync".to_string(),
                max_connections: 4,
            },
            sync,
        }
    }

    #[test]
    fn test_sync_defaults() {
        let sync = SyncSettings::default();
        assert_eq!(sync.interval_secs, None);
        assert_eq!(sync.concurrency, 1);
        assert!(!sync.dry_run);
        assert!(sync.copy_display_name);
    }

    #[test]
    fn test_derived_configs() {
        let settings = settings(SyncSettings {
            concurrency: 8,
            dry_run: true,
            ..Default::default()
        });

        let gitlab = settings.gitlab_config();
        assert_eq!(gitlab.host_url, "https://gitlab.example.com");
        assert_eq!(gitlab.max_retries, 1);

        let options = settings.reconciler_options();
        assert_eq!(options.concurrency, 8);
        assert!(options.dry_run);
        assert_eq!(options.reader.bot_name_suffix, " Bot");

        assert_eq!(settings.database_config().max_connections, 4);
    }
}
