use std::path::Path;

use serde::Deserialize;

use crate::error::{ArchiveError, ArchiveResult};

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub token: String,
    pub user_agent: String,
    pub guilds: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl Config {
    /// Loads the JSON config file at `path`. A missing file is not an
    /// error - it yields empty defaults, matching the upstream
    /// `AppSettings.from_json` behavior (nothing to do, not a failure).
    pub fn from_json(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                ArchiveError::Config(format!("failed to read {}: {e}", path.display()))
            })?;
            serde_json::from_str::<Config>(&contents).map_err(|e| {
                ArchiveError::Config(format!("failed to parse {}: {e}", path.display()))
            })?
        } else {
            Config::default()
        };

        if config.database_url.is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                config.database_url = url;
            }
        }

        Ok(config)
    }

    pub fn guild_ids_for_account(account: &AccountConfig) -> Vec<i64> {
        account
            .guilds
            .iter()
            .filter_map(|g| g.parse::<i64>().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_empty_defaults() {
        let config = Config::from_json("/nonexistent/path/config.json").unwrap();
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn parses_accounts_from_json() {
        let mut file = tempfile_like_path();
        writeln!(
            file.1,
            r#"{{
                "database_url": "postgres://u:p@localhost/db",
                "accounts": [
                    {{"name": "main", "token": "abc", "user_agent": "archivist/1.0", "guilds": ["123", "456"]}}
                ]
            }}"#
        )
        .unwrap();

        let config = Config::from_json(&file.0).unwrap();
        assert_eq!(config.database_url, "postgres://u:p@localhost/db");
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].guilds, vec!["123", "456"]);

        std::fs::remove_file(&file.0).ok();
    }

    #[test]
    fn guild_ids_parses_numeric_strings() {
        let account = AccountConfig {
            name: "main".into(),
            token: "abc".into(),
            user_agent: "ua".into(),
            guilds: vec!["123".into(), "not-a-number".into()],
        };
        assert_eq!(Config::guild_ids_for_account(&account), vec![123]);
    }

    fn tempfile_like_path() -> (std::path::PathBuf, std::fs::File) {
        let path = std::env::temp_dir().join(format!(
            "discord-archivist-test-config-{}.json",
            std::process::id()
        ));
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }
}
