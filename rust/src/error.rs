//! Error type shared by every HybridId operation.

use thiserror::Error;

/// Errors that can occur while configuring generators or handling identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HybridIdError {
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),
    #[error("Invalid profile definition: {0}")]
    InvalidProfile(String),
    #[error("Invalid node: {0}")]
    InvalidNode(String),
    #[error("Node is required but none was configured")]
    MissingNode,
    #[error("Invalid prefix {0:?}: expected 1-8 characters of [a-z0-9]")]
    InvalidPrefix(String),
    #[error("Malformed HybridId: {0}")]
    MalformedId(String),
    #[error("Disambiguator exhausted for profile {profile} at timestamp {timestamp}")]
    DisambiguatorExhausted { profile: String, timestamp: u64 },
    #[error("Timestamp {0} does not fit the profile's timestamp field")]
    TimestampOverflow(u64),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HybridIdError {
    /// True when the input string was not a well-formed identifier.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedId(_))
    }

    /// True for errors raised while building a generator rather than while using one.
    pub fn is_fatal_for_construction(&self) -> bool {
        matches!(
            self,
            Self::UnknownProfile(_)
                | Self::InvalidProfile(_)
                | Self::InvalidNode(_)
                | Self::MissingNode
                | Self::InvalidConfig(_)
        )
    }
}
