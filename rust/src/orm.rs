//! Persistence-layer glue: primary-key generation for entity types and the
//! string column that stores the keys.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::HybridIdError;
use crate::generator::HybridIdGenerator;
use crate::profile::Profile;

/// Entity types that receive HybridId primary keys.
///
/// An entity may declare its own prefix; the generator's configured prefix,
/// if any, takes precedence over it.
pub trait HybridIdEntity {
    const ID_PREFIX: Option<&'static str> = None;
}

/// Primary-key generator bound to an optional fixed prefix.
pub struct EntityIdGenerator<C: Clock = SystemClock> {
    generator: Arc<HybridIdGenerator<C>>,
    prefix: Option<String>,
}

impl Default for EntityIdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new(Arc::new(HybridIdGenerator::default()), None)
    }
}

impl<C: Clock> EntityIdGenerator<C> {
    pub fn new(generator: Arc<HybridIdGenerator<C>>, prefix: Option<String>) -> Self {
        Self { generator, prefix }
    }

    /// Key for a value with no entity type attached.
    pub fn generate_id(&self) -> Result<String, HybridIdError> {
        self.generator.generate(self.prefix.as_deref())
    }

    /// Key for entity type `E`.
    pub fn generate_id_for<E: HybridIdEntity>(&self) -> Result<String, HybridIdError> {
        let prefix = self.prefix.as_deref().or(E::ID_PREFIX);
        self.generator.generate(prefix)
    }

    pub fn generator(&self) -> &HybridIdGenerator<C> {
        &self.generator
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// Bounded-length string column holding HybridIds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridIdColumn;

impl HybridIdColumn {
    /// Type name used in mappings.
    pub const NAME: &'static str = "hybrid_id";

    /// `standard` body (20) + longest prefix (8) + separator.
    pub const DEFAULT_LENGTH: usize = 29;

    /// Column length needed for prefixed identifiers of `profile`.
    pub fn length_for(profile: &Profile) -> usize {
        profile.max_id_len()
    }

    /// SQL declaration, e.g. `VARCHAR(29)`.
    pub fn sql_declaration(length: Option<usize>) -> String {
        format!("VARCHAR({})", length.unwrap_or(Self::DEFAULT_LENGTH))
    }

    pub fn to_database_value(value: Option<&str>) -> Option<String> {
        value.map(str::to_string)
    }

    pub fn from_database_value(value: Option<&str>) -> Option<String> {
        value.map(str::to_string)
    }
}
