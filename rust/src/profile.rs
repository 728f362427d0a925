//! HybridId profiles and the registry that resolves them by name.
//!
//! A profile fixes the width, in base62 digits, of each payload field. The
//! widths add up to the body length exactly, so a body never shares a digit
//! between two fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::codec;
use crate::error::HybridIdError;

/// Name of the default profile.
pub const DEFAULT_PROFILE: &str = "standard";

/// Longest prefix an identifier may carry.
pub const MAX_PREFIX_LEN: usize = 8;

const MAX_TIMESTAMP_WIDTH: usize = 10;
pub(crate) const MAX_NODE_WIDTH: usize = 10;
const MAX_DISAMBIGUATOR_WIDTH: usize = 21;

static PROFILE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]{0,31}$").unwrap());

static GLOBAL_REGISTRY: Lazy<ProfileRegistry> = Lazy::new(ProfileRegistry::builtin);

/// Immutable field layout of an identifier body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    name: String,
    timestamp_width: usize,
    node_width: usize,
    disambiguator_width: usize,
    #[serde(skip)]
    timestamp_capacity: u128,
    #[serde(skip)]
    node_capacity: u128,
    #[serde(skip)]
    disambiguator_capacity: u128,
}

impl Profile {
    /// Define a profile. `body_len` must equal the sum of the three widths.
    pub fn new(
        name: impl Into<String>,
        body_len: usize,
        timestamp_width: usize,
        node_width: usize,
        disambiguator_width: usize,
    ) -> Result<Self, HybridIdError> {
        let name = name.into();
        if !PROFILE_NAME.is_match(&name) {
            return Err(HybridIdError::InvalidProfile(format!(
                "bad profile name {name:?}"
            )));
        }

        let check = |field: &str, width: usize, max: usize| {
            if width == 0 || width > max {
                Err(HybridIdError::InvalidProfile(format!(
                    "{name}: {field} width must be 1..={max}, got {width}"
                )))
            } else {
                Ok(())
            }
        };
        check("timestamp", timestamp_width, MAX_TIMESTAMP_WIDTH)?;
        check("node", node_width, MAX_NODE_WIDTH)?;
        check("disambiguator", disambiguator_width, MAX_DISAMBIGUATOR_WIDTH)?;

        let sum = timestamp_width + node_width + disambiguator_width;
        if sum != body_len {
            return Err(HybridIdError::InvalidProfile(format!(
                "{name}: field widths add up to {sum}, declared body length is {body_len}"
            )));
        }

        let cap = |width: usize| {
            codec::capacity(width).ok_or_else(|| {
                HybridIdError::InvalidProfile(format!("{name}: width {width} overflows"))
            })
        };

        let timestamp_capacity = cap(timestamp_width)?;
        let node_capacity = cap(node_width)?;
        let disambiguator_capacity = cap(disambiguator_width)?;

        Ok(Self {
            name,
            timestamp_capacity,
            node_capacity,
            disambiguator_capacity,
            timestamp_width,
            node_width,
            disambiguator_width,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp_width(&self) -> usize {
        self.timestamp_width
    }

    pub fn node_width(&self) -> usize {
        self.node_width
    }

    pub fn disambiguator_width(&self) -> usize {
        self.disambiguator_width
    }

    /// Length of the encoded body.
    pub fn body_len(&self) -> usize {
        self.timestamp_width + self.node_width + self.disambiguator_width
    }

    /// Longest identifier this profile can produce (maximum prefix plus separator).
    pub fn max_id_len(&self) -> usize {
        MAX_PREFIX_LEN + 1 + self.body_len()
    }

    pub fn timestamp_capacity(&self) -> u128 {
        self.timestamp_capacity
    }

    pub fn node_capacity(&self) -> u128 {
        self.node_capacity
    }

    /// Number of identifiers one node can emit within a single millisecond.
    pub fn disambiguator_capacity(&self) -> u128 {
        self.disambiguator_capacity
    }
}

/// Set of known profiles, keyed by name.
///
/// Body lengths are unique across a registry, so an encoded body identifies
/// its own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `compact` (16), `standard` (20) and `extended` (24).
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, body, ts, node, dis) in [
            ("compact", 16, 8, 2, 6),
            ("standard", 20, 8, 2, 10),
            ("extended", 24, 8, 2, 14),
        ] {
            let profile = Profile::new(name, body, ts, node, dis)
                .expect("builtin profiles are well-formed");
            registry
                .register(profile)
                .expect("builtin profiles do not collide");
        }
        registry
    }

    /// Shared, immutable builtin registry.
    pub fn global() -> &'static ProfileRegistry {
        &GLOBAL_REGISTRY
    }

    /// Add a profile. Names and body lengths must both be unused.
    pub fn register(&mut self, profile: Profile) -> Result<(), HybridIdError> {
        if self.profiles.contains_key(profile.name()) {
            return Err(HybridIdError::InvalidProfile(format!(
                "profile {} is already registered",
                profile.name()
            )));
        }
        if let Some(other) = self.by_body_len(profile.body_len()) {
            return Err(HybridIdError::InvalidProfile(format!(
                "profile {} has the same body length ({}) as {}",
                profile.name(),
                profile.body_len(),
                other.name()
            )));
        }
        self.profiles.insert(profile.name().to_string(), profile);
        Ok(())
    }

    /// Look a profile up by name.
    pub fn resolve(&self, name: &str) -> Result<&Profile, HybridIdError> {
        self.profiles
            .get(name)
            .ok_or_else(|| HybridIdError::UnknownProfile(name.to_string()))
    }

    /// The profile whose bodies are `len` characters long, if any.
    pub fn by_body_len(&self, len: usize) -> Option<&Profile> {
        self.profiles.values().find(|p| p.body_len() == len)
    }

    /// Profiles in name order.
    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    /// Longest body across all registered profiles.
    pub fn max_body_len(&self) -> usize {
        self.profiles().map(Profile::body_len).max().unwrap_or(0)
    }
}
