// Configuration loading and parsing (client.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::mission::authoring::MAX_POINTS;
use crate::mission::progress::PathLayout;

/// Longest planner deadline offset accepted, ten years.
const MAX_DEADLINE_DAYS: i64 = 3650;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub db_path: String,
    pub map: MapConfig,
    pub authoring: AuthoringConfig,
    pub planner: PlannerConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// client.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire client.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ClientFile {
    server: ServerConfig,
    database: DatabaseSection,
    #[serde(default)]
    map: MapConfig,
    #[serde(default)]
    authoring: AuthoringConfig,
    #[serde(default)]
    planner: PlannerConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Root of the QuestTasks REST API, without a trailing slash.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub layout: PathLayout,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            layout: PathLayout::Winding,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthoringConfig {
    /// Points pre-filled in a fresh step form.
    pub default_points: u32,
}

impl Default for AuthoringConfig {
    fn default() -> Self {
        AuthoringConfig { default_points: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    pub min_prompt_len: usize,
    pub default_deadline_days: i64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            min_prompt_len: 10,
            default_deadline_days: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsConfig {
    /// Both halves of a login, if the user stored them.
    pub fn login_pair(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/client.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- client.toml (required) ---
    let client_path = config_dir.join("client.toml");
    let client_text = read_file(&client_path)?;
    let client: ClientFile =
        toml::from_str(&client_text).map_err(|e| ConfigError::ParseError {
            path: client_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let mut server = client.server;
    while server.base_url.ends_with('/') {
        server.base_url.pop();
    }

    let config = Config {
        server,
        db_path: client.database.path,
        map: client.map,
        authoring: client.authoring,
        planner: client.planner,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = &config.server.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "server.base_url".into(),
            message: format!("must start with http:// or https://, got {url:?}"),
        });
    }

    if config.server.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.authoring.default_points == 0 {
        return Err(ConfigError::ValidationError {
            field: "authoring.default_points".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.planner.min_prompt_len == 0 {
        return Err(ConfigError::ValidationError {
            field: "planner.min_prompt_len".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.planner.default_deadline_days <= 0 {
        return Err(ConfigError::ValidationError {
            field: "planner.default_deadline_days".into(),
            message: format!(
                "must be greater than 0, got {}",
                config.planner.default_deadline_days
            ),
        });
    }

    if config.planner.default_deadline_days > MAX_DEADLINE_DAYS {
        return Err(ConfigError::ValidationError {
            field: "planner.default_deadline_days".into(),
            message: format!(
                "must be at most {MAX_DEADLINE_DAYS}, got {}",
                config.planner.default_deadline_days
            ),
        });
    }

    if config.authoring.default_points > MAX_POINTS {
        return Err(ConfigError::ValidationError {
            field: "authoring.default_points".into(),
            message: format!(
                "must be at most {MAX_POINTS}, got {}",
                config.authoring.default_points
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let root = manifest.join("../..");
        assert!(
            root.join("defaults").exists(),
            "Cannot locate defaults/ directory from {:?}",
            manifest
        );
        root
    }

    /// Fresh scratch directory with an empty `config/` inside.
    fn scratch(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn write_client_with(tmp: &Path, from: &str, to: &str) {
        let text = fs::read_to_string(project_root().join("defaults/client.toml")).unwrap();
        assert!(text.contains(from), "defaults/client.toml should contain {from:?}");
        fs::write(tmp.join("config/client.toml"), text.replace(from, to)).unwrap();
    }

    #[test]
    fn load_valid_config_from_project_files() {
        let tmp = scratch("qt_config_defaults");
        fs::copy(
            project_root().join("defaults/client.toml"),
            tmp.join("config/client.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.server.timeout_secs, 15);
        assert_eq!(config.db_path, "questtasks.db");
        assert_eq!(config.map.layout, PathLayout::Winding);
        assert_eq!(config.authoring.default_points, 10);
        assert_eq!(config.planner.min_prompt_len, 10);
        assert_eq!(config.planner.default_deadline_days, 3);
        assert!(config.credentials.login_pair().is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn trailing_slashes_are_trimmed_from_base_url() {
        let tmp = scratch("qt_config_trailing_slash");
        write_client_with(
            &tmp,
            "base_url = \"http://localhost:8000\"",
            "base_url = \"http://localhost:8000//\"",
        );

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8000");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let tmp = scratch("qt_config_minimal");
        fs::write(
            tmp.join("config/client.toml"),
            r#"
[server]
base_url = "https://quests.example.com"
timeout_secs = 5

[database]
path = ":memory:"
"#,
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.map.layout, PathLayout::Winding);
        assert_eq!(config.authoring.default_points, 10);
        assert_eq!(config.planner.default_deadline_days, 3);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_provides_login_pair() {
        let tmp = scratch("qt_config_with_creds");
        fs::copy(
            project_root().join("defaults/client.toml"),
            tmp.join("config/client.toml"),
        )
        .unwrap();
        fs::write(
            tmp.join("config/credentials.toml"),
            "username = \"patrick\"\npassword = \"rock\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.credentials.login_pair(), Some(("patrick", "rock")));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_password_is_not_a_login_pair() {
        let creds = CredentialsConfig {
            username: Some("patrick".into()),
            password: Some(String::new()),
        };
        assert!(creds.login_pair().is_none());
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let tmp = scratch("qt_config_bad_url");
        write_client_with(
            &tmp,
            "base_url = \"http://localhost:8000\"",
            "base_url = \"localhost:8000\"",
        );

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "server.base_url"),
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp = scratch("qt_config_zero_timeout");
        write_client_with(&tmp, "timeout_secs = 15", "timeout_secs = 0");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "server.timeout_secs")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_default_points() {
        let tmp = scratch("qt_config_zero_points");
        write_client_with(&tmp, "default_points = 10", "default_points = 0");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "authoring.default_points")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_huge_deadline_days() {
        let tmp = scratch("qt_config_huge_days");
        write_client_with(
            &tmp,
            "default_deadline_days = 3",
            "default_deadline_days = 9223372036854775807",
        );

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "planner.default_deadline_days");
                assert!(message.contains("at most 3650"));
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_deadline_days() {
        let tmp = scratch("qt_config_negative_days");
        write_client_with(&tmp, "default_deadline_days = 3", "default_deadline_days = -1");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "planner.default_deadline_days")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_map_layout() {
        let tmp = scratch("qt_config_bad_layout");
        write_client_with(&tmp, "layout = \"winding\"", "layout = \"spiral\"");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("client.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_client_toml() {
        let tmp = scratch("qt_config_missing_client");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("client.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch("qt_config_invalid_toml");
        fs::write(tmp.join("config/client.toml"), "this is not valid [[[ toml").unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("client.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("qt_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(
            project_root().join("defaults/client.toml"),
            defaults_dir.join("client.toml"),
        )
        .unwrap();
        fs::write(
            defaults_dir.join("credentials.toml.example"),
            "username = \"x\"\npassword = \"y\"\n",
        )
        .unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config/client.toml").exists());
        assert!(!tmp.join("config/credentials.toml.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("qt_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();
        fs::copy(
            project_root().join("defaults/client.toml"),
            defaults_dir.join("client.toml"),
        )
        .unwrap();
        fs::write(config_dir.join("client.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());
        assert_eq!(
            fs::read_to_string(config_dir.join("client.toml")).unwrap(),
            "# custom\n"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("qt_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
