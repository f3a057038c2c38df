//! Engine configuration for passband.
//!
//! A single TOML file sets the startup filter parameters, the stream format
//! used before a device is selected, and the signal chain's gain staging and
//! limiter policy. Every field is optional.
//!
//! # Example
//!
//! ```rust,no_run
//! use passband_config::EngineConfig;
//!
//! let config = EngineConfig::load("passband.toml").unwrap();
//! let params = config.filter_parameters();
//! let settings = config.chain_settings();
//! println!("{} Hz / {} Hz, pre-gain {}", params.center_freq, params.bandwidth, settings.pre_gain);
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::{ChainSection, EngineConfig, FilterSection, StreamSection};
pub use error::ConfigError;
pub use paths::{CONFIG_FILE_NAME, default_config_path, user_config_dir};
