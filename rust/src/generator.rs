//! HybridId generator.
//!
//! Format: `[<prefix>_]<timestamp><node><disambiguator>`
//!
//! Identifiers from one generator are strictly increasing: within a
//! millisecond the disambiguator counts up from its seed, and the clock is
//! clamped so it never runs backwards. A generator is `Sync`; share it behind
//! an `Arc` rather than creating one per thread.

use chrono::{DateTime, Utc};
use rand::random_range;
use std::sync::{Mutex, PoisonError};

use crate::clock::{Clock, MonotonicClock, SystemClock};
use crate::codec::{self, Payload};
use crate::config::{Disambiguation, GeneratorConfig};
use crate::error::HybridIdError;
use crate::id::{self, ParsedHybridId};
use crate::node::{Node, NodeResolver};
use crate::profile::{Profile, ProfileRegistry};

/// Disambiguation state, guarded by the generator's mutex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenState {
    /// `None` until the first identifier is produced.
    pub last_timestamp: Option<u64>,
    pub cursor: u128,
}

/// Generator of sortable identifiers for one profile and node.
pub struct HybridIdGenerator<C: Clock = SystemClock> {
    profile: Profile,
    node: Node,
    disambiguation: Disambiguation,
    clock: MonotonicClock<C>,
    state: Mutex<GenState>,
}

impl HybridIdGenerator<SystemClock> {
    /// Create a generator on the wall clock with the builtin profiles.
    pub fn new(config: GeneratorConfig) -> Result<Self, HybridIdError> {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for HybridIdGenerator<SystemClock> {
    /// `standard` profile, auto-detected node.
    fn default() -> Self {
        Self::new(GeneratorConfig::default()).expect("default configuration should always be valid")
    }
}

impl<C: Clock> HybridIdGenerator<C> {
    /// Create a generator on a custom clock with the builtin profiles.
    pub fn with_clock(config: GeneratorConfig, clock: C) -> Result<Self, HybridIdError> {
        Self::with_registry(config, ProfileRegistry::global(), clock)
    }

    /// Create a generator resolving its profile in `registry`.
    pub fn with_registry(
        config: GeneratorConfig,
        registry: &ProfileRegistry,
        clock: C,
    ) -> Result<Self, HybridIdError> {
        let profile = registry.resolve(&config.profile)?.clone();
        let node = NodeResolver::new(&profile, config.require_explicit_node)
            .resolve(config.node.as_deref())?;

        tracing::debug!(
            profile = profile.name(),
            node = %node,
            disambiguation = config.disambiguation.as_str(),
            "hybrid id generator ready"
        );

        Ok(Self {
            profile,
            node,
            disambiguation: config.disambiguation,
            clock: MonotonicClock::new(clock),
            state: Mutex::new(GenState::default()),
        })
    }

    /// Generate one identifier, prefixed with `<prefix>_` when a non-empty prefix is given.
    pub fn generate(&self, prefix: Option<&str>) -> Result<String, HybridIdError> {
        let prefix = match prefix {
            Some(p) if !p.is_empty() => Some(id::validate_prefix(p)?),
            _ => None,
        };

        let payload = self.next_payload()?;
        let body = codec::encode(&payload, &self.profile)?;

        Ok(match prefix {
            Some(p) => {
                let mut out = String::with_capacity(p.len() + 1 + body.len());
                out.push_str(p);
                out.push('_');
                out.push_str(&body);
                out
            }
            None => body,
        })
    }

    /// Generate `n` identifiers in order.
    pub fn generate_n(&self, n: usize, prefix: Option<&str>) -> Result<Vec<String>, HybridIdError> {
        (0..n).map(|_| self.generate(prefix)).collect()
    }

    fn next_payload(&self) -> Result<Payload, HybridIdError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now_millis();

        let (timestamp, cursor) = match state.last_timestamp {
            Some(last) if now <= last => {
                let next = state.cursor + 1;
                if next >= self.profile.disambiguator_capacity() {
                    tracing::warn!(
                        profile = self.profile.name(),
                        timestamp = last,
                        "disambiguator exhausted within one millisecond"
                    );
                    return Err(HybridIdError::DisambiguatorExhausted {
                        profile: self.profile.name().to_string(),
                        timestamp: last,
                    });
                }
                (last, next)
            }
            _ => {
                if now as u128 >= self.profile.timestamp_capacity() {
                    return Err(HybridIdError::TimestampOverflow(now));
                }
                (now, self.seed())
            }
        };

        *state = GenState {
            last_timestamp: Some(timestamp),
            cursor,
        };

        Ok(Payload {
            timestamp,
            node: self.node.value(),
            disambiguator: cursor,
        })
    }

    fn seed(&self) -> u128 {
        match self.disambiguation {
            Disambiguation::Counter => 0,
            Disambiguation::Random => random_range(0..self.profile.disambiguator_capacity() / 2),
        }
    }

    /// Structural validity as an identifier of this generator's profile.
    pub fn is_valid(&self, candidate: &str) -> bool {
        id::is_valid_for(&self.profile, candidate)
    }

    /// Parse as an identifier of this generator's profile.
    pub fn parse(&self, candidate: &str) -> Result<ParsedHybridId, HybridIdError> {
        id::parse_for(&self.profile, candidate)
    }

    /// Node encoded in `candidate`.
    pub fn extract_node(&self, candidate: &str) -> Result<Node, HybridIdError> {
        self.parse(candidate).map(|p| p.node)
    }

    /// Generation time encoded in `candidate`.
    pub fn extract_timestamp(&self, candidate: &str) -> Result<DateTime<Utc>, HybridIdError> {
        self.parse(candidate).map(|p| p.timestamp)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn disambiguation(&self) -> Disambiguation {
        self.disambiguation
    }

    /// Snapshot of the disambiguation state.
    pub fn state(&self) -> GenState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
