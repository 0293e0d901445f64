use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
}

/// The administrator login. Never stored in the users table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    /// Base URL of the remote document store
    #[serde(default)]
    pub url: Option<String>,
    /// Document node the snapshot is written under
    #[serde(default = "default_root_node")]
    pub root_node: String,
    /// Local JSON file to write instead of (or when no) URL is configured
    #[serde(default)]
    pub path: Option<String>,
}

fn default_root_node() -> String {
    "murmur_backup".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: Database,
    /// Administrator login is disabled when absent
    #[serde(default)]
    pub admin: Option<AdminCredentials>,
    #[serde(default)]
    pub snapshot: Snapshot,
}

/// Environment variables that override file settings, by config key
const ENV_OVERRIDES: [(&str, &str); 6] = [
    ("DATABASE_PATH", "database.path"),
    ("MURMUR_ADMIN_USERNAME", "admin.username"),
    ("MURMUR_ADMIN_PASSWORD", "admin.password"),
    ("MURMUR_SNAPSHOT_URL", "snapshot.url"),
    ("MURMUR_SNAPSHOT_ROOT", "snapshot.root_node"),
    ("MURMUR_SNAPSHOT_PATH", "snapshot.path"),
];

impl Settings {
    /// Load settings from `settings.toml` (current directory or `murmur-core/`)
    /// with environment overrides. `config_file` replaces the default
    /// locations when given.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = Self::file_sources(config_file);
        let builder = Self::apply_env_overrides(builder, |key| std::env::var(key).ok())?;
        builder.build()?.try_deserialize()
    }

    /// Settings pointing at a database path with everything else defaulted
    pub fn for_database(path: impl Into<String>) -> Self {
        Self {
            database: Database { path: path.into() },
            admin: None,
            snapshot: Snapshot {
                root_node: default_root_node(),
                ..Snapshot::default()
            },
        }
    }

    fn file_sources(config_file: Option<&Path>) -> ConfigBuilder<DefaultState> {
        let mut builder = Config::builder();

        match config_file {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                let config_file_name = "settings.toml";

                // Check in current directory
                let current_dir_path = PathBuf::from(config_file_name);
                if current_dir_path.exists() {
                    builder = builder.add_source(File::from(current_dir_path).required(false));
                }

                // Check in murmur-core directory (for development)
                let dev_path = PathBuf::from("murmur-core").join(config_file_name);
                if dev_path.exists() {
                    builder = builder.add_source(File::from(dev_path).required(false));
                }
            }
        }

        builder
    }

    fn apply_env_overrides<F>(
        builder: ConfigBuilder<DefaultState>,
        lookup: F,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = builder
            .set_default("database.path", "murmur.db")?
            .set_default("snapshot.root_node", default_root_node())?;

        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn load_with(file: Option<&Path>, env: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let builder = Settings::file_sources(file);
        let builder = Settings::apply_env_overrides(builder, |key| env.get(key).cloned())?;
        builder.build()?.try_deserialize()
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = load_with(None, &[]).unwrap();
        assert_eq!(settings.database.path, "murmur.db");
        assert!(settings.admin.is_none());
        assert_eq!(settings.snapshot.root_node, "murmur_backup");
        assert!(settings.snapshot.url.is_none());
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[database]\npath = \"from-file.db\"\n\n[admin]\nusername = \"root\"\npassword = \"hunter2\"\n"
        )
        .unwrap();

        let settings = load_with(Some(file.path()), &[]).unwrap();
        assert_eq!(settings.database.path, "from-file.db");
        assert_eq!(
            settings.admin,
            Some(AdminCredentials {
                username: "root".to_string(),
                password: "hunter2".to_string(),
            })
        );

        let settings = load_with(Some(file.path()), &[("DATABASE_PATH", ":memory:")]).unwrap();
        assert_eq!(settings.database.path, ":memory:");
    }

    #[test]
    fn test_admin_from_environment() {
        let settings = load_with(
            None,
            &[("MURMUR_ADMIN_USERNAME", "mod"), ("MURMUR_ADMIN_PASSWORD", "s3cret")],
        )
        .unwrap();
        let admin = settings.admin.unwrap();
        assert_eq!(admin.username, "mod");
        assert_eq!(admin.password, "s3cret");
    }

    #[test]
    fn test_half_configured_admin_is_an_error() {
        assert!(load_with(None, &[("MURMUR_ADMIN_USERNAME", "mod")]).is_err());
    }

    #[test]
    fn test_for_database() {
        let settings = Settings::for_database(":memory:");
        assert_eq!(settings.database.path, ":memory:");
        assert_eq!(settings.snapshot.root_node, "murmur_backup");
    }
}
