//! hybrid-id: distributed, coordination-free, sortable identifiers.
//!
//! A HybridId is a fixed-length base62 body carrying a millisecond timestamp,
//! a node value and a disambiguator, optionally preceded by a short prefix.
//! Bodies of one profile sort lexicographically in generation order.
//!
//! # Format
//!
//! ```text
//! HybridId ::= [ PREFIX "_" ] BODY
//! PREFIX   ::= [a-z0-9]{1,8}
//! BODY     ::= TIMESTAMP NODE DISAMBIGUATOR      (base62, fixed width per profile)
//! ```
//!
//! | profile    | body | timestamp | node | disambiguator |
//! |------------|------|-----------|------|---------------|
//! | `compact`  | 16   | 8         | 2    | 6             |
//! | `standard` | 20   | 8         | 2    | 10            |
//! | `extended` | 24   | 8         | 2    | 14            |
//!
//! # Example
//!
//! ```
//! use hybrid_id::{GeneratorConfig, HybridIdGenerator};
//!
//! let generator = HybridIdGenerator::new(GeneratorConfig::default().with_node("A1"))
//!     .expect("valid generator config");
//! let id = generator.generate(Some("usr")).expect("valid prefix");
//! assert!(hybrid_id::is_valid(&id));
//! assert_eq!(hybrid_id::extract_node(&id).unwrap().as_str(), "A1");
//! println!("{}", id); // e.g. "usr_0VJ3x2KdA1Qm4w8sT1cZ"
//! ```

mod clock;
mod codec;
mod config;
mod error;
mod generator;
mod id;
mod node;
mod orm;
mod profile;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use codec::{ALPHABET, Payload, decode, encode};
pub use config::{Disambiguation, GeneratorConfig};
pub use error::HybridIdError;
pub use generator::{GenState, HybridIdGenerator};
pub use id::{
    ParsedHybridId, extract_node, extract_timestamp, is_valid, is_valid_for, is_valid_with, parse,
    parse_for, parse_with, validate_prefix,
};
pub use node::{Node, NodeResolver, fingerprint_node};
pub use orm::{EntityIdGenerator, HybridIdColumn, HybridIdEntity};
pub use profile::{DEFAULT_PROFILE, MAX_PREFIX_LEN, Profile, ProfileRegistry};
