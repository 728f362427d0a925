//! Structural parsing and validation of encoded identifiers.
//!
//! Format: `[<prefix>_]<body>`, where the prefix is 1-8 characters of
//! `[a-z0-9]` and the body is the fixed-length base62 encoding of a profile.
//! Neither part may contain `_`, so the body is always the trailing suffix
//! after the only separator.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::codec;
use crate::error::HybridIdError;
use crate::node::Node;
use crate::profile::{MAX_PREFIX_LEN, Profile, ProfileRegistry};

static PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]{1,8}$").unwrap());

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:([a-z0-9]{1,8})_)?([0-9A-Za-z]+)$").unwrap());

/// Parsed HybridId components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedHybridId {
    pub raw: String,
    pub prefix: Option<String>,
    pub profile: String,
    pub timestamp: DateTime<Utc>,
    pub timestamp_ms: u64,
    pub node: Node,
    pub disambiguator: u128,
}

impl ParsedHybridId {
    /// The body without prefix and separator.
    pub fn body(&self) -> &str {
        let len = self.raw.len();
        let prefix_len = self.prefix.as_ref().map_or(0, |p| p.len() + 1);
        &self.raw[prefix_len..len]
    }
}

/// Check a caller-supplied prefix. Invalid prefixes are rejected, never altered.
pub fn validate_prefix(prefix: &str) -> Result<&str, HybridIdError> {
    if prefix.len() <= MAX_PREFIX_LEN && PREFIX_PATTERN.is_match(prefix) {
        Ok(prefix)
    } else {
        Err(HybridIdError::InvalidPrefix(prefix.to_string()))
    }
}

/// Parse `id` against the profiles of `registry`.
///
/// The profile is picked by body length. When two registered body lengths
/// differ by 1-8 characters, a prefix glued onto the shorter body without its
/// `_` reads as a body of the longer profile, so a dropped separator cannot be
/// detected here. Use [`parse_for`] when the expected profile is known.
pub fn parse_with(registry: &ProfileRegistry, id: &str) -> Result<ParsedHybridId, HybridIdError> {
    let malformed = || HybridIdError::MalformedId(id.to_string());

    let caps = ID_PATTERN.captures(id).ok_or_else(malformed)?;
    let prefix = caps.get(1).map(|m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    let profile = registry.by_body_len(body.len()).ok_or_else(malformed)?;
    decode_parts(id, prefix, body, profile)
}

/// Parse `id` as an identifier of `profile` only.
///
/// The body is the trailing `profile.body_len()` characters; anything before it
/// must be empty or exactly `<prefix>_`.
pub fn parse_for(profile: &Profile, id: &str) -> Result<ParsedHybridId, HybridIdError> {
    let malformed = || HybridIdError::MalformedId(id.to_string());

    let split = id
        .len()
        .checked_sub(profile.body_len())
        .filter(|&at| id.is_char_boundary(at))
        .ok_or_else(malformed)?;
    let (head, body) = id.split_at(split);

    let prefix = if head.is_empty() {
        None
    } else {
        let p = head.strip_suffix('_').ok_or_else(malformed)?;
        Some(validate_prefix(p).map_err(|_| malformed())?)
    };

    decode_parts(id, prefix, body, profile)
}

fn decode_parts(
    id: &str,
    prefix: Option<&str>,
    body: &str,
    profile: &Profile,
) -> Result<ParsedHybridId, HybridIdError> {
    let malformed = || HybridIdError::MalformedId(id.to_string());
    let payload = codec::decode(body, profile).map_err(|_| malformed())?;

    let timestamp = i64::try_from(payload.timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(malformed)?;
    let node = Node::from_value(payload.node, profile.node_width()).map_err(|_| malformed())?;

    Ok(ParsedHybridId {
        raw: id.to_string(),
        prefix: prefix.map(str::to_string),
        profile: profile.name().to_string(),
        timestamp,
        timestamp_ms: payload.timestamp,
        node,
        disambiguator: payload.disambiguator,
    })
}

/// Validate `id` as an identifier of `profile` only.
pub fn is_valid_for(profile: &Profile, id: &str) -> bool {
    parse_for(profile, id).is_ok()
}

/// Validate `id` against the profiles of `registry`.
pub fn is_valid_with(registry: &ProfileRegistry, id: &str) -> bool {
    parse_with(registry, id).is_ok()
}

/// Parse an identifier using the builtin profiles.
///
/// Body lengths 16, 20 and 24 differ by a valid prefix length, so a 4- or
/// 8-character prefix missing its `_` is read as a longer body; see
/// [`parse_with`].
pub fn parse(id: &str) -> Result<ParsedHybridId, HybridIdError> {
    parse_with(ProfileRegistry::global(), id)
}

/// Structural validity under the builtin profiles. Never errors.
///
/// Cannot tell a dropped separator from a longer profile's body when the two
/// body lengths differ by 1-8 characters; [`is_valid_for`] can.
pub fn is_valid(id: &str) -> bool {
    is_valid_with(ProfileRegistry::global(), id)
}

/// Node that generated `id`, in the form accepted by node configuration.
pub fn extract_node(id: &str) -> Result<Node, HybridIdError> {
    parse(id).map(|p| p.node)
}

/// Generation time of `id`, at millisecond precision.
pub fn extract_timestamp(id: &str) -> Result<DateTime<Utc>, HybridIdError> {
    parse(id).map(|p| p.timestamp)
}
