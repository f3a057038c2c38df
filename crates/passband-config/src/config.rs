//! Engine configuration file format.

use std::path::{Path, PathBuf};

use passband_core::{
    ChainSettings, DEFAULT_BANDWIDTH_HZ, DEFAULT_BUFFER_SIZE, DEFAULT_CEILING, DEFAULT_CENTER_HZ,
    DEFAULT_KNEE, DEFAULT_POST_GAIN, DEFAULT_PRE_GAIN, DEFAULT_SAMPLE_RATE, FilterParameters,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::default_config_path;

/// Startup filter parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterSection {
    /// Center frequency in Hz.
    pub center_freq: f32,
    /// Passband width in Hz.
    pub bandwidth: f32,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            center_freq: DEFAULT_CENTER_HZ,
            bandwidth: DEFAULT_BANDWIDTH_HZ,
        }
    }
}

/// Stream format used before a device dictates its own rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreamSection {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Buffer size in frames.
    pub buffer_size: u32,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE as u32,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Gain staging and limiter policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChainSection {
    /// Linear gain before the filter.
    pub pre_gain: f32,
    /// Linear gain after the filter.
    pub post_gain: f32,
    /// Limiter knee (linear).
    pub knee: f32,
    /// Limiter ceiling (linear).
    pub ceiling: f32,
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            pre_gain: DEFAULT_PRE_GAIN,
            post_gain: DEFAULT_POST_GAIN,
            knee: DEFAULT_KNEE,
            ceiling: DEFAULT_CEILING,
        }
    }
}

/// Engine configuration.
///
/// Every section and field is optional; missing values take the defaults.
///
/// # TOML Format
///
/// ```toml
/// [filter]
/// center_freq = 700.0
/// bandwidth = 250.0
///
/// [stream]
/// sample_rate = 48000
/// buffer_size = 256
///
/// [chain]
/// pre_gain = 2.0
/// post_gain = 1.0
/// knee = 0.7
/// ceiling = 0.95
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Startup filter parameters.
    pub filter: FilterSection,
    /// Stream format.
    pub stream: StreamSection,
    /// Signal chain policy.
    pub chain: ChainSection,
}

impl EngineConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the default config file if it exists,
    /// otherwise the built-in defaults.
    ///
    /// Returns the configuration and the file it came from, if any.
    pub fn load_or_default(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = path {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let default_path = default_config_path();
        if default_path.is_file() {
            let config = Self::load(&default_path)?;
            return Ok((config, Some(default_path)));
        }
        Ok((Self::default(), None))
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every field is usable.
    ///
    /// Filter values only need to be finite and positive; the engine clamps
    /// them into the control range. Chain values must satisfy
    /// `0 <= knee < ceiling <= 1` with finite, non-negative gains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("filter.center_freq", self.filter.center_freq)?;
        positive("filter.bandwidth", self.filter.bandwidth)?;
        if self.stream.sample_rate == 0 {
            return Err(ConfigError::invalid("stream.sample_rate", "must be greater than 0"));
        }
        if self.stream.buffer_size == 0 {
            return Err(ConfigError::invalid("stream.buffer_size", "must be greater than 0"));
        }

        let chain = &self.chain;
        non_negative("chain.pre_gain", chain.pre_gain)?;
        non_negative("chain.post_gain", chain.post_gain)?;
        if !(chain.ceiling.is_finite() && chain.ceiling > 0.0 && chain.ceiling <= 1.0) {
            return Err(ConfigError::invalid(
                "chain.ceiling",
                format!("must be in (0, 1], got {}", chain.ceiling),
            ));
        }
        if !(chain.knee.is_finite() && chain.knee >= 0.0 && chain.knee < chain.ceiling) {
            return Err(ConfigError::invalid(
                "chain.knee",
                format!("must be in [0, ceiling), got {}", chain.knee),
            ));
        }
        Ok(())
    }

    /// Startup filter parameters, clamped into the control range.
    pub fn filter_parameters(&self) -> FilterParameters {
        FilterParameters::clamped(
            self.filter.center_freq,
            self.filter.bandwidth,
            self.stream.sample_rate as f32,
        )
    }

    /// Signal chain settings.
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            pre_gain: self.chain.pre_gain,
            post_gain: self.chain.post_gain,
            knee: self.chain.knee,
            ceiling: self.chain.ceiling,
        }
    }
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be non-negative, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.filter.center_freq, 700.0);
        assert_eq!(config.stream.buffer_size, 256);
        assert_eq!(config.chain.pre_gain, 2.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [filter]
            center_freq = 1000.0

            [chain]
            ceiling = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.center_freq, 1000.0);
        assert_eq!(config.filter.bandwidth, 250.0);
        assert_eq!(config.chain.ceiling, 0.8);
        assert_eq!(config.chain.knee, 0.7);
    }

    #[test]
    fn rejects_zero_buffer() {
        let err = EngineConfig::from_toml("[stream]\nbuffer_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "stream.buffer_size"));
    }

    #[test]
    fn rejects_knee_above_ceiling() {
        let err = EngineConfig::from_toml("[chain]\nknee = 0.9\nceiling = 0.5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "chain.knee"));
    }

    #[test]
    fn rejects_negative_bandwidth() {
        assert!(EngineConfig::from_toml("[filter]\nbandwidth = -5.0").is_err());
    }

    #[test]
    fn rejects_wrong_types() {
        let err = EngineConfig::from_toml("[filter]\ncenter_freq = \"loud\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn filter_parameters_are_clamped() {
        let mut config = EngineConfig::default();
        config.filter.center_freq = 50.0;
        config.filter.bandwidth = 400.0;
        config.stream.sample_rate = 44100;
        let params = config.filter_parameters();
        assert_eq!(params.center_freq, 50.0);
        assert_eq!(params.bandwidth, 50.0);
        assert_eq!(params.sample_rate, 44100.0);
    }

    #[test]
    fn stream_defaults_follow_core() {
        let stream = StreamSection::default();
        assert_eq!(stream.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(stream.sample_rate as f32, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn chain_settings_mirror_section() {
        let settings = EngineConfig::default().chain_settings();
        assert_eq!(settings, ChainSettings::default());
    }

    #[test]
    fn toml_rendering_parses_back() {
        let mut config = EngineConfig::default();
        config.filter.center_freq = 1234.0;
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[filter]"));
        assert_eq!(EngineConfig::from_toml(&rendered).unwrap(), config);
    }
}
