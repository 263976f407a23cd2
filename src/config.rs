//! Configuration management for Windgate.
//!
//! This module defines the per-limiter settings and the YAML profiles file
//! used to run several independent limiters (one per endpoint class) in a
//! single process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, WindgateError};

/// Settings for a single fixed-window limiter.
///
/// Both fields must be greater than zero; construction of a limiter from
/// invalid settings fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Length of the counting window in milliseconds.
    pub window_ms: u64,
    /// Maximum admitted requests per identifier per window.
    pub max_requests: u64,
}

impl LimiterSettings {
    /// Create settings, validating both bounds.
    pub fn new(window_ms: u64, max_requests: u64) -> Result<Self> {
        let settings = Self {
            window_ms,
            max_requests,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validate that the window and ceiling are both positive.
    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(WindgateError::Config(
                "window_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_requests == 0 {
            return Err(WindgateError::Config(
                "max_requests must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The window length as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// A set of named limiter profiles sharing one sweep schedule.
///
/// Each profile becomes an independent limiter instance; profiles share no
/// state with each other. The sweep interval is a fixed process-wide value,
/// deliberately decoupled from any particular profile's window length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleProfiles {
    /// How often the shared sweeper reclaims expired windows, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Map of profile name to limiter settings.
    #[serde(default)]
    pub profiles: HashMap<String, LimiterSettings>,
}

impl Default for ThrottleProfiles {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            profiles: HashMap::new(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

impl ThrottleProfiles {
    /// Create an empty profile set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load profiles from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading throttle profiles");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load profiles from a YAML string.
    ///
    /// Every profile's settings are validated; a single invalid profile
    /// rejects the whole file.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let profiles: ThrottleProfiles = serde_yaml::from_str(yaml)
            .map_err(|e| WindgateError::Config(format!("Failed to parse throttle profiles: {}", e)))?;

        for (name, settings) in &profiles.profiles {
            settings
                .validate()
                .map_err(|e| WindgateError::Config(format!("Profile '{}': {}", name, e)))?;
        }

        Ok(profiles)
    }

    /// Get the settings for a named profile.
    pub fn get(&self, name: &str) -> Option<&LimiterSettings> {
        self.profiles.get(name)
    }

    /// The shared sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
