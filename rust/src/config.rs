//! Generator configuration.

use serde::{Deserialize, Serialize};

use crate::error::HybridIdError;
use crate::profile::DEFAULT_PROFILE;

/// How the disambiguator starts in each new millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disambiguation {
    /// Random seed in the lower half of the field, then counting up.
    #[default]
    Random,
    /// Start at zero, then counting up.
    Counter,
}

impl Disambiguation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Counter => "counter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "random" => Some(Self::Random),
            "counter" => Some(Self::Counter),
            _ => None,
        }
    }
}

/// Construction-time settings of a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub profile: String,
    pub node: Option<String>,
    pub require_explicit_node: bool,
    pub disambiguation: Disambiguation,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            node: None,
            require_explicit_node: false,
            disambiguation: Disambiguation::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn require_explicit_node(mut self, required: bool) -> Self {
        self.require_explicit_node = required;
        self
    }

    pub fn with_disambiguation(mut self, disambiguation: Disambiguation) -> Self {
        self.disambiguation = disambiguation;
        self
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(data: &str) -> Result<Self, HybridIdError> {
        serde_json::from_str(data).map_err(|e| HybridIdError::InvalidConfig(e.to_string()))
    }

    /// Load from `HYBRID_ID_*` environment variables.
    pub fn from_env() -> Result<Self, HybridIdError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source using the environment variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HybridIdError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(profile) = lookup("HYBRID_ID_PROFILE").filter(|v| !v.is_empty()) {
            config.profile = profile;
        }
        config.node = lookup("HYBRID_ID_NODE").filter(|v| !v.is_empty());

        if let Some(raw) = lookup("HYBRID_ID_REQUIRE_NODE") {
            config.require_explicit_node = parse_bool(&raw).ok_or_else(|| {
                HybridIdError::InvalidConfig(format!("HYBRID_ID_REQUIRE_NODE: {raw:?}"))
            })?;
        }

        if let Some(raw) = lookup("HYBRID_ID_DISAMBIGUATION") {
            config.disambiguation = Disambiguation::parse(&raw.to_ascii_lowercase())
                .ok_or_else(|| {
                    HybridIdError::InvalidConfig(format!("HYBRID_ID_DISAMBIGUATION: {raw:?}"))
                })?;
        }

        Ok(config)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
