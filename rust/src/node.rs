//! Node identity: the field that keeps concurrently running generators apart.
//!
//! Uniqueness across machines is only as good as the node assignment. An
//! explicitly configured node per process is the only way to get distinct
//! identities; auto-detection hashes the host name and process id, which is
//! best-effort and can collide between unrelated deployments.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;

use crate::codec;
use crate::error::HybridIdError;
use crate::profile::{MAX_NODE_WIDTH, Profile};

/// A node value in its printable base62 form, e.g. `"A1"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Node(String);

impl Node {
    /// Parse a node that must be exactly `width` base62 characters.
    pub fn parse(s: &str, width: usize) -> Result<Self, HybridIdError> {
        check_width(width)?;
        if s.len() != width || !codec::is_base62(s) {
            return Err(HybridIdError::InvalidNode(format!(
                "{s:?} is not {width} characters of [0-9A-Za-z]"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Build a node from its numeric value.
    pub fn from_value(value: u64, width: usize) -> Result<Self, HybridIdError> {
        check_width(width)?;
        match codec::capacity(width) {
            Some(cap) if (value as u128) < cap => {
                let mut s = String::with_capacity(width);
                codec::encode_fixed(value as u128, width, &mut s);
                Ok(Self(s))
            }
            _ => Err(HybridIdError::InvalidNode(format!(
                "value {value} does not fit {width} base62 digits"
            ))),
        }
    }

    /// Numeric value of the node as stored in the payload.
    pub fn value(&self) -> u64 {
        // Constructors cap the width at MAX_NODE_WIDTH, so the value fits a u64.
        codec::decode_fixed(&self.0)
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }
}

fn check_width(width: usize) -> Result<(), HybridIdError> {
    if width == 0 || width > MAX_NODE_WIDTH {
        return Err(HybridIdError::InvalidNode(format!(
            "node width must be 1..={MAX_NODE_WIDTH}, got {width}"
        )));
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Node {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Decides which node a generator stamps into its identifiers.
#[derive(Debug, Clone, Copy)]
pub struct NodeResolver<'a> {
    profile: &'a Profile,
    require_explicit: bool,
}

impl<'a> NodeResolver<'a> {
    pub fn new(profile: &'a Profile, require_explicit: bool) -> Self {
        Self {
            profile,
            require_explicit,
        }
    }

    /// Validate `explicit`, or fall back to auto-detection when allowed.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<Node, HybridIdError> {
        match explicit {
            Some(node) => Node::parse(node, self.profile.node_width()),
            None if self.require_explicit => Err(HybridIdError::MissingNode),
            None => Ok(self.detect()),
        }
    }

    /// Derive a node from host name and process id.
    pub fn detect(&self) -> Node {
        let host = hostname();
        let pid = std::process::id();
        let node = fingerprint_node(&format!("{host}:{pid}"), self.profile);
        tracing::debug!(
            host = %host,
            pid,
            node = %node,
            fingerprint = %hex::encode(&Sha256::digest(host.as_bytes())[..4]),
            "auto-detected node identity"
        );
        node
    }
}

/// Reduce an arbitrary string to a node of the profile's width.
pub fn fingerprint_node(seed: &str, profile: &Profile) -> Node {
    let digest = Sha256::digest(seed.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let value = (u64::from_be_bytes(head) as u128 % profile.node_capacity()) as u64;
    let mut s = String::with_capacity(profile.node_width());
    codec::encode_fixed(value as u128, profile.node_width(), &mut s);
    Node(s)
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileRegistry;

    fn standard() -> &'static Profile {
        ProfileRegistry::global().resolve("standard").unwrap()
    }

    #[test]
    fn test_parse_node() {
        let n = Node::parse("A1", 2).unwrap();
        assert_eq!(n.as_str(), "A1");
        assert_eq!(n.value(), 10 * 62 + 1);
        assert_eq!(n.to_string(), "A1");
        assert!(matches!(
            Node::parse("A", 2),
            Err(HybridIdError::InvalidNode(_))
        ));
        assert!(matches!(
            Node::parse("A-", 2),
            Err(HybridIdError::InvalidNode(_))
        ));
        assert!(Node::parse("ABC", 2).is_err());
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Node::from_value(0, 2).unwrap().as_str(), "00");
        assert_eq!(Node::from_value(3843, 2).unwrap().as_str(), "zz");
        assert!(Node::from_value(3844, 2).is_err());
    }

    #[test]
    fn test_width_bounds() {
        assert!(matches!(
            Node::parse("zzzzzzzzzzzz", 12),
            Err(HybridIdError::InvalidNode(_))
        ));
        assert!(matches!(Node::parse("", 0), Err(HybridIdError::InvalidNode(_))));
        assert!(matches!(
            Node::from_value(1, 11),
            Err(HybridIdError::InvalidNode(_))
        ));
        assert!(Node::from_value(1, 0).is_err());

        let widest = Node::parse("zzzzzzzzzz", 10).unwrap();
        assert_eq!(widest.value() as u128, codec::capacity(10).unwrap() - 1);
    }

    #[test]
    fn test_resolver_explicit_and_missing() {
        let strict = NodeResolver::new(standard(), true);
        assert_eq!(strict.resolve(Some("zz")).unwrap().as_str(), "zz");
        assert!(matches!(strict.resolve(None), Err(HybridIdError::MissingNode)));
        assert!(matches!(
            strict.resolve(Some("node01")),
            Err(HybridIdError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_resolver_auto_detects() {
        let lax = NodeResolver::new(standard(), false);
        let a = lax.resolve(None).unwrap();
        let b = lax.resolve(None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.width(), 2);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint_node("db-1:42", standard());
        let b = fingerprint_node("db-1:42", standard());
        assert_eq!(a, b);
        assert!(codec::is_base62(a.as_str()));
    }
}
