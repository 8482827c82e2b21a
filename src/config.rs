use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_DESTINATION: &str = "./models";
pub const DEFAULT_REVISION: &str = "main";

const LOCAL_CONFIG_FILE: &str = "tokfetch.toml";

/// Settings for one fetch, layered from defaults, a TOML file, the environment,
/// and command-line flags (in increasing precedence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub model_id: String,
    pub destination: PathBuf,
    pub revision: String,
    pub cache_dir: Option<PathBuf>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub offline: bool,
    pub verify: bool,
    pub progress: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            destination: PathBuf::from(DEFAULT_DESTINATION),
            revision: DEFAULT_REVISION.to_string(),
            cache_dir: None,
            token: None,
            offline: false,
            verify: true,
            progress: false,
        }
    }
}

/// Command-line values that override the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model_id: Option<String>,
    pub destination: Option<PathBuf>,
    pub revision: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub token: Option<String>,
    pub offline: bool,
    pub no_verify: bool,
    pub progress: bool,
}

impl FetchConfig {
    /// Loads the configuration file (if any) and applies environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `./tokfetch.toml` and then
    /// `<config dir>/tokfetch/config.toml` are tried.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover() {
                Some(found) => Self::from_file(&found)?,
                None => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, without reading any file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("tokfetch").join("config.toml"))
            .filter(|p| p.is_file())
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.trim().is_empty() {
                self.token = Some(token.trim().to_string());
            }
        }
        if let Ok(offline) = std::env::var("HF_HUB_OFFLINE") {
            self.offline = parse_flag(&offline).unwrap_or(self.offline);
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(model_id) = overrides.model_id {
            self.model_id = model_id;
        }
        if let Some(destination) = overrides.destination {
            self.destination = destination;
        }
        if let Some(revision) = overrides.revision {
            self.revision = revision;
        }
        if let Some(cache_dir) = overrides.cache_dir {
            self.cache_dir = Some(cache_dir);
        }
        if let Some(token) = overrides.token {
            self.token = Some(token);
        }
        self.offline |= overrides.offline;
        self.progress |= overrides.progress;
        if overrides.no_verify {
            self.verify = false;
        }
    }

    /// Hub cache directory: configured value, else `$HF_HOME/hub`, else
    /// `~/.cache/huggingface/hub`.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        if let Ok(home) = std::env::var("HF_HOME") {
            if !home.is_empty() {
                return PathBuf::from(home).join("hub");
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cache")
            .join("huggingface")
            .join("hub")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_embedding_server_layout() {
        let config = FetchConfig::default();
        assert_eq!(config.model_id, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(config.destination, PathBuf::from("./models"));
        assert_eq!(config.revision, "main");
        assert!(config.verify);
        assert!(!config.offline);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FetchConfig::from_toml(
            r#"
model_id = "org/example-tokenizer"
destination = "./out"
"#,
        )
        .unwrap();

        assert_eq!(config.model_id, "org/example-tokenizer");
        assert_eq!(config.destination, PathBuf::from("./out"));
        assert_eq!(config.revision, "main");
        assert!(config.verify);
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        assert!(FetchConfig::from_toml("verify = \"sometimes\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = FetchConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn reads_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokfetch.toml");
        std::fs::write(&path, "revision = \"v1.0\"\noffline = true\n").unwrap();

        let config = FetchConfig::from_file(&path).unwrap();
        assert_eq!(config.revision, "v1.0");
        assert!(config.offline);
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = FetchConfig::default();
        config.apply(Overrides {
            model_id: Some("org/other".into()),
            destination: Some(PathBuf::from("/tmp/tok")),
            cache_dir: Some(PathBuf::from("/tmp/cache")),
            no_verify: true,
            ..Overrides::default()
        });

        assert_eq!(config.model_id, "org/other");
        assert_eq!(config.destination, PathBuf::from("/tmp/tok"));
        assert_eq!(config.revision, "main");
        assert!(!config.verify);
        assert_eq!(config.resolved_cache_dir(), PathBuf::from("/tmp/cache"));
    }

    #[test]
    fn token_is_never_serialized() {
        let config = FetchConfig {
            token: Some("hf_secret".into()),
            ..FetchConfig::default()
        };
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("hf_secret"));
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
