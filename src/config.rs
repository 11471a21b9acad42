//! Configuration for models, fallbacks and comedy settings

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::Error;
use crate::failover::FallbackTable;
use crate::team::ModelAssignment;
use crate::ComedyStyle;

/// Environment variable holding the API credential
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

pub const DEFAULT_MODEL: &str = "mistral-saba-24b";
pub const HIGH_QUALITY_MODEL: &str = "llama-3.3-70b-versatile";
pub const FAST_MODEL: &str = "llama3-8b-8192";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Named models used by the single-call panels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCatalog
{   /// Used for jokes, roasts, shows and memes
    pub default: String
  , /// Fallback targets named by the default fallback table
    pub high_quality: String
  , pub fast: String
}

impl Default for ModelCatalog
{   fn default() -> Self
    {   ModelCatalog
        {   default: DEFAULT_MODEL.to_string()
          , high_quality: HIGH_QUALITY_MODEL.to_string()
          , fast: FAST_MODEL.to_string()
        }
    }
}

/// Per-session comedy knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComedySettings
{   pub style: ComedyStyle
  , /// Roast intensity, 1 to 5
    pub intensity: u8
  , /// Creativity level, 0.0 to 1.0
    pub temperature: f32
  , /// Response length, 100 to 1000 tokens
    pub max_tokens: u32
  , /// Memes per request, 1 to 5
    pub meme_count: u8
}

impl Default for ComedySettings
{   fn default() -> Self
    {   ComedySettings
        {   style: ComedyStyle::default()
          , intensity: 3
          , temperature: 0.9
          , max_tokens: 500
          , meme_count: 2
        }
    }
}

impl ComedySettings
{   pub fn validate(&self) -> Result<(), Error>
    {   if !(1..=5).contains(&self.intensity)
        {   return Err(Error::InvalidConfiguration(format!(
              "intensity must be between 1 and 5, got {}",
              self.intensity
            )));
        }
        if !(0.0..=1.0).contains(&self.temperature)
        {   return Err(Error::InvalidConfiguration(format!(
              "temperature must be between 0.0 and 1.0, got {}",
              self.temperature
            )));
        }
        if !(100..=1000).contains(&self.max_tokens)
        {   return Err(Error::InvalidConfiguration(format!(
              "max_tokens must be between 100 and 1000, got {}",
              self.max_tokens
            )));
        }
        validate_meme_count(self.meme_count)
    }
}

pub(crate) fn validate_meme_count(count: u8) -> Result<(), Error>
{   if (1..=5).contains(&count)
    {   Ok(())
    } else
    {   Err(Error::InvalidConfiguration(format!(
          "meme count must be between 1 and 5, got {}",
          count
        )))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BobConfig
{   /// API base URL (if custom)
    pub api_base: Option<Url>
  , /// Per-call timeout in seconds
    pub timeout_secs: u64
  , pub models: ModelCatalog
  , /// Primary model -> fallback model
    pub fallbacks: FallbackTable
  , /// Comedy team model per role
    pub team: ModelAssignment
  , /// Meme image service host
    pub meme_base_url: Url
  , pub settings: ComedySettings
}

impl Default for BobConfig
{   fn default() -> Self
    {   let fallbacks = FallbackTable::new(HashMap::from([
          (DEFAULT_MODEL.to_string(), FAST_MODEL.to_string())
        , (HIGH_QUALITY_MODEL.to_string(), FAST_MODEL.to_string())
        ]));
        BobConfig
        {   api_base: None
          , timeout_secs: DEFAULT_TIMEOUT_SECS
          , models: ModelCatalog::default()
          , fallbacks
          , team: ModelAssignment::default()
          , meme_base_url: crate::meme::memegen_base_url()
          , settings: ComedySettings::default()
        }
    }
}

impl BobConfig
{   /// Load a JSON configuration file; absent fields keep defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error>
    {   let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| {
          Error::InvalidConfiguration(format!(
            "cannot read {}: {}",
            path.display(), e
          ))
        })?;
        BobConfig::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, Error>
    {   let config: BobConfig = serde_json::from_str(text)
          .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error>
    {   if self.timeout_secs == 0
        {   return Err(Error::InvalidConfiguration(
              "timeout_secs must be positive".to_string()
            ));
        }
        let models = [
          ("models.default", &self.models.default)
        , ("models.high_quality", &self.models.high_quality)
        , ("models.fast", &self.models.fast)
        , ("team.writer", &self.team.writer)
        , ("team.roaster", &self.team.roaster)
        , ("team.refiner", &self.team.refiner)
        ];
        for (field, model) in models
        {   if model.trim().is_empty()
            {   return Err(Error::InvalidConfiguration(format!(
                  "{} must name a model",
                  field
                )));
            }
        }
        let urls = [
          ("api_base", self.api_base.as_ref())
        , ("meme_base_url", Some(&self.meme_base_url))
        ];
        for (field, url) in urls
        {   if let Some(url) = url
            {   check_service_url(url).map_err(|problem| {
                  Error::InvalidConfiguration(format!("{}: {}", field, problem))
                })?;
            }
        }
        self.settings.validate()
    }

    pub fn timeout(&self) -> Duration
    {   Duration::from_secs(self.timeout_secs)
    }
}

/// A remote service base must be http(s) with a host
pub(crate) fn check_service_url(url: &Url) -> Result<(), String>
{   if !matches!(url.scheme(), "http" | "https")
    {   return Err(format!("{} is not an http(s) URL", url));
    }
    match url.host_str()
    {   Some(host) if !host.is_empty() => Ok(())
      , _ => Err(format!("{} has no host", url))
    }
}

/// Read the API credential from `GROQ_API_KEY`
pub fn api_key_from_env() -> Result<String, Error>
{   api_key_from_env_var(API_KEY_ENV)
}

pub fn api_key_from_env_var(var: &str) -> Result<String, Error>
{   match std::env::var(var)
    {   Ok(key) if !key.trim().is_empty() => Ok(key)
      , _ => Err(Error::MissingApiKey(var.to_string()))
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn defaults_are_valid()
    {   let config = BobConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
          config.fallbacks.fallback_for(DEFAULT_MODEL)
        , Some(FAST_MODEL)
        );
        assert_eq!(config.team.roaster, config.models.default);
    }

    #[test]
    fn partial_json_keeps_defaults()
    {   let config = BobConfig::from_json_str(
          r#"{"team": {"roaster": "llama-3.3-70b-versatile"},
              "settings": {"intensity": 5}}"#
        ).unwrap();
        assert_eq!(config.team.roaster, HIGH_QUALITY_MODEL);
        assert_eq!(config.team.writer, FAST_MODEL);
        assert_eq!(config.settings.intensity, 5);
        assert_eq!(config.settings.max_tokens, 500);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn out_of_range_settings_are_rejected()
    {   let err = BobConfig::from_json_str(
          r#"{"settings": {"temperature": 1.5}}"#
        ).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));

        let settings = ComedySettings
        {   meme_count: 9
          , ..ComedySettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn blank_model_is_rejected()
    {   let err = BobConfig::from_json_str(
          r#"{"models": {"default": " "}}"#
        ).unwrap_err();
        assert!(err.to_string().contains("models.default"));
    }

    #[test]
    fn malformed_service_urls_are_rejected()
    {   let err = BobConfig::from_json_str(
          r#"{"api_base": "not a url"}"#
        ).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));

        let err = BobConfig::from_json_str(
          r#"{"meme_base_url": "http://"}"#
        ).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));

        assert!(BobConfig::from_json_str(
          r#"{"api_base": "not a url", "meme_base_url": "http://"}"#
        ).is_err());
    }

    #[test]
    fn non_http_service_urls_are_rejected()
    {   let err = BobConfig::from_json_str(
          r#"{"meme_base_url": "file:///srv/memes"}"#
        ).unwrap_err();
        assert!(err.to_string().contains("meme_base_url"));

        let err = BobConfig::from_json_str(
          r#"{"api_base": "data:text/plain,groq"}"#
        ).unwrap_err();
        assert!(err.to_string().contains("api_base"));

        let config = BobConfig::from_json_str(
          r#"{"api_base": "http://localhost:8080/v1",
              "meme_base_url": "https://memes.example.com/"}"#
        ).unwrap();
        assert_eq!(
          config.api_base.as_ref().map(Url::as_str)
        , Some("http://localhost:8080/v1")
        );
        assert_eq!(config.meme_base_url.host_str(), Some("memes.example.com"));
    }

    #[test]
    fn missing_env_key_is_reported()
    {   let err = api_key_from_env_var(
          "BOBBUSTER_TEST_SURELY_UNSET_KEY"
        ).unwrap_err();
        assert_eq!(
          err
        , Error::MissingApiKey(
            "BOBBUSTER_TEST_SURELY_UNSET_KEY".to_string()
          )
        );
    }
}
