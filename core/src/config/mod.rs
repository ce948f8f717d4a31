use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const MARE_DIR: &str = ".mare";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("config file not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Bedrock,
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
}

impl Variant {
    pub fn uses_clock(self) -> bool {
        !matches!(self, Variant::Gemini)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Bedrock => write!(f, "bedrock"),
            Variant::Gemini => write!(f, "gemini"),
            Variant::OpenAI => write!(f, "openai"),
        }
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bedrock" | "aws" => Ok(Variant::Bedrock),
            "gemini" | "google" => Ok(Variant::Gemini),
            "openai" => Ok(Variant::OpenAI),
            _ => Err(ConfigError::Invalid {
                name: "MARE_VARIANT",
                value: s.to_string(),
                reason: "expected one of bedrock, gemini, openai".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BedrockConfig {
    pub model: String,
    pub inference_profile_id: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub base_url: Option<String>,
}

impl BedrockConfig {
    pub fn model_target(&self) -> &str {
        self.inference_profile_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.model)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,
    pub max_results: usize,
    pub base_url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_results: DEFAULT_SEARCH_RESULTS,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: Variant,
    pub temperature: f64,
    pub max_iterations: Option<usize>,
    pub request_timeout_secs: u64,
    pub search: SearchConfig,
    pub bedrock: BedrockConfig,
    pub gemini: ApiKeyConfig,
    pub openai: ApiKeyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            variant: Variant::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_iterations: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            search: SearchConfig::default(),
            bedrock: BedrockConfig::default(),
            gemini: ApiKeyConfig::default(),
            openai: ApiKeyConfig::default(),
        }
    }
}

pub fn get_mare_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(MARE_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_mare_dir().join("config.toml")
}

impl Config {
    /// Defaults, then the TOML file, then `.env` and the process environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "Ignoring unreadable .env"),
        }

        Self::load_with(path, |name| std::env::var(name).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = get_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MARE_VARIANT") {
            self.variant = v.parse()?;
        }
        if let Some(v) = get("MODEL_TEMPERATURE") {
            self.temperature = parse_number("MODEL_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("MARE_MAX_ITERATIONS") {
            self.max_iterations = Some(parse_number("MARE_MAX_ITERATIONS", &v)?);
        }
        if let Some(v) = get("MARE_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("MARE_REQUEST_TIMEOUT_SECS", &v)?;
        }

        if let Some(v) = get("TAVILY_API_KEY") {
            self.search.api_key = v;
        }

        let bedrock = &mut self.bedrock;
        if let Some(v) = get("AWS_MODEL") {
            bedrock.model = v;
        }
        if let Some(v) = get("AWS_INFERENCE_PROFILE_ID") {
            bedrock.inference_profile_id = Some(v);
        }
        if let Some(v) = get("AWS_REGION") {
            bedrock.region = v;
        }
        if let Some(v) = get("AWS_ACCESS_KEY_ID") {
            bedrock.access_key_id = v;
        }
        if let Some(v) = get("AWS_SECRET_ACCESS_KEY") {
            bedrock.secret_access_key = v;
        }
        // AWS_SECURITY_TOKEN is the legacy name for the session token.
        if let Some(v) = get("AWS_SESSION_TOKEN").or_else(|| get("AWS_SECURITY_TOKEN")) {
            bedrock.session_token = Some(v);
        }

        if let Some(v) = get("GOOGLE_MODEL") {
            self.gemini.model = v;
        }
        if let Some(v) = get("GOOGLE_API_KEY") {
            self.gemini.api_key = v;
        }

        if let Some(v) = get("OPENAI_MODEL") {
            self.openai.model = v;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.openai.base_url = Some(v);
        }

        Ok(())
    }

    pub fn apply_overrides(&mut self, variant: Option<Variant>, max_iterations: Option<usize>) {
        if let Some(variant) = variant {
            self.variant = variant;
        }
        if let Some(max) = max_iterations {
            self.max_iterations = Some(max);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                name: "MODEL_TEMPERATURE",
                value: self.temperature.to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.max_iterations == Some(0) {
            return Err(ConfigError::Invalid {
                name: "MARE_MAX_ITERATIONS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        require("TAVILY_API_KEY", &self.search.api_key)?;

        match self.variant {
            Variant::Bedrock => {
                require("AWS_MODEL", &self.bedrock.model)?;
                require("AWS_REGION", &self.bedrock.region)?;
                require("AWS_ACCESS_KEY_ID", &self.bedrock.access_key_id)?;
                require("AWS_SECRET_ACCESS_KEY", &self.bedrock.secret_access_key)?;
            }
            Variant::Gemini => {
                require("GOOGLE_MODEL", &self.gemini.model)?;
                require("GOOGLE_API_KEY", &self.gemini.api_key)?;
            }
            Variant::OpenAI => {
                require("OPENAI_MODEL", &self.openai.model)?;
                require("OPENAI_API_KEY", &self.openai.api_key)?;
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn require(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(())
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn bedrock_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TAVILY_API_KEY", "tvly-123"),
            ("AWS_MODEL", "anthropic.claude-3-5-sonnet-20240620-v1:0"),
            ("AWS_REGION", "us-east-1"),
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.variant, Variant::Bedrock);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn env_overlay_builds_valid_bedrock_config() {
        let mut config = Config::default();
        config.apply_env(env(&bedrock_env())).unwrap();
        config.validate().unwrap();
        assert_eq!(config.bedrock.region, "us-east-1");
        assert_eq!(config.search.api_key, "tvly-123");
        assert_eq!(
            config.bedrock.model_target(),
            "anthropic.claude-3-5-sonnet-20240620-v1:0"
        );
    }

    #[test]
    fn inference_profile_overrides_model_target() {
        let mut vars = bedrock_env();
        vars.push(("AWS_INFERENCE_PROFILE_ID", "us.anthropic.claude-3-5-sonnet-20240620-v1:0"));
        let mut config = Config::default();
        config.apply_env(env(&vars)).unwrap();
        assert_eq!(
            config.bedrock.model_target(),
            "us.anthropic.claude-3-5-sonnet-20240620-v1:0"
        );
    }

    #[test]
    fn security_token_is_session_token_alias() {
        let mut vars = bedrock_env();
        vars.push(("AWS_SECURITY_TOKEN", "legacy"));
        let mut config = Config::default();
        config.apply_env(env(&vars)).unwrap();
        assert_eq!(config.bedrock.session_token.as_deref(), Some("legacy"));

        vars.push(("AWS_SESSION_TOKEN", "current"));
        let mut config = Config::default();
        config.apply_env(env(&vars)).unwrap();
        assert_eq!(config.bedrock.session_token.as_deref(), Some("current"));
    }

    #[test]
    fn temperature_is_parsed_and_range_checked() {
        let mut config = Config::default();
        config.apply_env(env(&[("MODEL_TEMPERATURE", " 0.2 ")])).unwrap();
        assert_eq!(config.temperature, 0.2);

        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("MODEL_TEMPERATURE", "quente")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MODEL_TEMPERATURE", .. }));

        let mut config = Config::default();
        config.apply_env(env(&bedrock_env())).unwrap();
        config.temperature = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "MODEL_TEMPERATURE", .. })
        ));
    }

    #[test]
    fn validate_reports_missing_credentials_per_variant() {
        let mut config = Config::default();
        config.apply_env(env(&[("TAVILY_API_KEY", "k")])).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("AWS_MODEL"))));

        config
            .apply_env(env(&[("MARE_VARIANT", "Gemini"), ("GOOGLE_MODEL", "gemini-pro")]))
            .unwrap();
        assert_eq!(config.variant, Variant::Gemini);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("GOOGLE_API_KEY"))
        ));

        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("TAVILY_API_KEY"))
        ));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("MODEL_TEMPERATURE", ""), ("GOOGLE_MODEL", "  ")]))
            .unwrap();
        assert_eq!(config.temperature, 0.7);
        assert!(config.gemini.model.is_empty());
    }

    #[test]
    fn model_ids_have_no_builtin_default() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("MARE_VARIANT", "gemini"),
                ("TAVILY_API_KEY", "tvly-123"),
                ("GOOGLE_API_KEY", "g-key"),
            ]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("GOOGLE_MODEL"))));

        config.apply_env(env(&[("GOOGLE_MODEL", "gemini-2.0-flash")])).unwrap();
        config.validate().unwrap();

        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("MARE_VARIANT", "openai"),
                ("TAVILY_API_KEY", "tvly-123"),
                ("OPENAI_API_KEY", "sk-test"),
            ]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("OPENAI_MODEL"))));
    }

    #[test]
    fn unknown_variant_is_rejected() {
        assert!("claude".parse::<Variant>().is_err());
        assert_eq!("OPENAI".parse::<Variant>().unwrap(), Variant::OpenAI);
        assert!(Variant::Bedrock.uses_clock());
        assert!(!Variant::Gemini.uses_clock());
    }

    #[test]
    fn max_iterations_from_env() {
        let mut config = Config::default();
        config.apply_env(env(&[("MARE_MAX_ITERATIONS", "15")])).unwrap();
        assert_eq!(config.max_iterations, Some(15));

        config.max_iterations = Some(0);
        config.search.api_key = "k".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
variant = "gemini"
temperature = 0.1
max_iterations = 10

[gemini]
model = "gemini-1.5-pro"

[search]
max_results = 3
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.variant, Variant::Gemini);
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_iterations, Some(10));
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.search.max_results, 3);
        assert!(config.openai.model.is_empty());
    }

    fn write_layered_file(tmp: &TempDir) -> PathBuf {
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
variant = "gemini"
temperature = 0.1
max_iterations = 10

[gemini]
model = "gemini-1.5-pro"
api_key = "from-file"
"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn environment_wins_over_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_layered_file(&tmp);

        let config = Config::load_with(
            Some(path.as_path()),
            env(&[
                ("MARE_VARIANT", "openai"),
                ("MODEL_TEMPERATURE", "0.3"),
                ("GOOGLE_API_KEY", ""),
            ]),
        )
        .unwrap();
        assert_eq!(config.variant, Variant::OpenAI);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.max_iterations, Some(10));
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.api_key, "from-file");
    }

    #[test]
    fn flags_win_over_environment() {
        let tmp = TempDir::new().unwrap();
        let path = write_layered_file(&tmp);

        let mut config = Config::load_with(
            Some(path.as_path()),
            env(&[("MARE_VARIANT", "openai"), ("MARE_MAX_ITERATIONS", "15")]),
        )
        .unwrap();
        assert_eq!(config.max_iterations, Some(15));

        config.apply_overrides(None, None);
        assert_eq!(config.variant, Variant::OpenAI);
        assert_eq!(config.max_iterations, Some(15));

        config.apply_overrides(Some(Variant::Bedrock), Some(3));
        assert_eq!(config.variant, Variant::Bedrock);
        assert_eq!(config.max_iterations, Some(3));
    }

    #[test]
    fn explicit_path_must_exist() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("absent.toml");
        assert!(matches!(
            Config::load_with(Some(missing.as_path()), env(&[])),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn missing_and_broken_files() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            Config::from_file(&missing),
            Err(ConfigError::NotFound(_))
        ));

        let broken = tmp.path().join("broken.toml");
        std::fs::write(&broken, "variant = [").unwrap();
        assert!(matches!(
            Config::from_file(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }
}
