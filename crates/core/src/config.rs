use crate::deadline::DEFAULT_COLLABORATOR_TIMEOUT;
use crate::error::ConfigError;
use crate::models::ScoringOptions;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "brew-search.toml";
pub const ENV_PREFIX: &str = "BREW_SEARCH_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl EndpointConfig {
    pub fn url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|source| ConfigError::Endpoint {
            endpoint: self.endpoint.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringOptions,
    pub collaborator_timeout_ms: u64,
    pub max_suggestions: usize,
    pub history_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_search: Option<EndpointConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<EndpointConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringOptions::default(),
            collaborator_timeout_ms: DEFAULT_COLLABORATOR_TIMEOUT.as_millis() as u64,
            max_suggestions: 5,
            history_dir: PathBuf::from(".brew-search"),
            remote_search: None,
            image_analysis: None,
        }
    }
}

impl EngineConfig {
    /// The TOML file, then `BREW_SEARCH_*` variables
    /// (`BREW_SEARCH_SCORING__MAX_RESULTS=5`), over serde defaults.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: EngineConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for endpoint in [&self.remote_search, &self.image_analysis].into_iter().flatten() {
            endpoint.url()?;
        }
        Ok(())
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.collaborator_timeout(), Duration::from_secs(9));
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.scoring.max_results, 20);
        assert!(config.scoring.boost_popular);
        assert!(config.remote_search.is_none());
    }

    #[test]
    fn toml_overrides_only_what_it_names() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            max_suggestions = 3

            [scoring]
            maxResults = 7

            [remote_search]
            endpoint = "https://search.example.com/v1/query"
            api_key = "secret"
            "#,
        ));

        let config = EngineConfig::from_figment(figment).expect("config should load");
        assert_eq!(config.max_suggestions, 3);
        assert_eq!(config.scoring.max_results, 7);
        assert!(config.scoring.boost_popular);
        assert_eq!(config.collaborator_timeout_ms, 9_000);
        assert_eq!(
            config.remote_search.and_then(|remote| remote.api_key).as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [image_analysis]
            endpoint = "not a url"
            "#,
        ));

        assert!(matches!(
            EngineConfig::from_figment(figment),
            Err(ConfigError::Endpoint { .. })
        ));
    }

    #[test]
    fn loads_from_file_and_tolerates_a_missing_one() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "collaborator_timeout_ms = 250").expect("write config");

        let config = EngineConfig::load(Some(file.path())).expect("config should load");
        assert_eq!(config.collaborator_timeout(), Duration::from_millis(250));

        let missing = file.path().with_extension("absent.toml");
        let config =
            EngineConfig::load(Some(&missing)).expect("missing file falls back to defaults");
        assert_eq!(config.max_suggestions, 5);
    }
}
