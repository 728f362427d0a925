//! Fixed-width, order-preserving base62 codec for HybridId payloads.
//!
//! Every field of the payload is written as a fixed-width numeral over
//! [`ALPHABET`], most significant digit first, and the three numerals are
//! concatenated. The alphabet is in ASCII order, so comparing two bodies of the
//! same profile as strings is the same as comparing their payloads as
//! `(timestamp, node, disambiguator)` tuples.

use crate::error::HybridIdError;
use crate::profile::Profile;

/// Base62 digits in ascending ASCII order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Number base of the encoding.
pub const BASE: u128 = 62;

/// Decoded body of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload {
    pub timestamp: u64,
    pub node: u64,
    pub disambiguator: u128,
}

/// `62^width`, or `None` if it does not fit in a `u128`.
pub fn capacity(width: usize) -> Option<u128> {
    BASE.checked_pow(u32::try_from(width).ok()?)
}

#[inline]
fn digit_value(c: u8) -> Option<u128> {
    let v = match c {
        b'0'..=b'9' => c - b'0',
        b'A'..=b'Z' => c - b'A' + 10,
        b'a'..=b'z' => c - b'a' + 36,
        _ => return None,
    };
    Some(v as u128)
}

/// True if every byte of `s` belongs to [`ALPHABET`].
pub fn is_base62(s: &str) -> bool {
    s.bytes().all(|c| c.is_ascii_alphanumeric())
}

/// Append `value` as exactly `width` base62 digits.
///
/// The caller guarantees `value < 62^width`; higher digits are dropped otherwise.
pub fn encode_fixed(mut value: u128, width: usize, out: &mut String) {
    let mut buf = vec![b'0'; width];
    for slot in buf.iter_mut().rev() {
        *slot = ALPHABET[(value % BASE) as usize];
        value /= BASE;
    }
    out.extend(buf.into_iter().map(char::from));
}

/// Parse a base62 numeral. Returns `None` on an invalid digit or overflow.
pub fn decode_fixed(digits: &str) -> Option<u128> {
    digits.bytes().try_fold(0u128, |acc, c| {
        acc.checked_mul(BASE)?.checked_add(digit_value(c)?)
    })
}

/// Encode a payload as a body of `profile.body_len()` characters.
pub fn encode(payload: &Payload, profile: &Profile) -> Result<String, HybridIdError> {
    if payload.timestamp as u128 >= profile.timestamp_capacity() {
        return Err(HybridIdError::TimestampOverflow(payload.timestamp));
    }
    if payload.node as u128 >= profile.node_capacity() {
        return Err(HybridIdError::InvalidNode(format!(
            "node value {} exceeds {} base62 digits",
            payload.node,
            profile.node_width()
        )));
    }
    if payload.disambiguator >= profile.disambiguator_capacity() {
        return Err(HybridIdError::DisambiguatorExhausted {
            profile: profile.name().to_string(),
            timestamp: payload.timestamp,
        });
    }

    let mut body = String::with_capacity(profile.body_len());
    encode_fixed(payload.timestamp as u128, profile.timestamp_width(), &mut body);
    encode_fixed(payload.node as u128, profile.node_width(), &mut body);
    encode_fixed(payload.disambiguator, profile.disambiguator_width(), &mut body);
    Ok(body)
}

/// Decode a body produced by [`encode`] for the same profile.
pub fn decode(body: &str, profile: &Profile) -> Result<Payload, HybridIdError> {
    if body.len() != profile.body_len() || !is_base62(body) {
        return Err(HybridIdError::MalformedId(body.to_string()));
    }

    let ts_end = profile.timestamp_width();
    let node_end = ts_end + profile.node_width();
    let malformed = || HybridIdError::MalformedId(body.to_string());

    let timestamp = decode_fixed(&body[..ts_end])
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(malformed)?;
    let node = decode_fixed(&body[ts_end..node_end])
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(malformed)?;
    let disambiguator = decode_fixed(&body[node_end..]).ok_or_else(malformed)?;

    Ok(Payload {
        timestamp,
        node,
        disambiguator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileRegistry;

    fn standard() -> Profile {
        ProfileRegistry::global()
            .resolve("standard")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_alphabet_is_ascii_sorted() {
        assert!(ALPHABET.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_encode_fixed_pads_and_orders() {
        let mut a = String::new();
        encode_fixed(61, 3, &mut a);
        assert_eq!(a, "00z");
        let mut b = String::new();
        encode_fixed(62, 3, &mut b);
        assert_eq!(b, "010");
        assert!(a < b);
        assert_eq!(decode_fixed("010"), Some(62));
        assert_eq!(decode_fixed("0-0"), None);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(capacity(0), Some(1));
        assert_eq!(capacity(2), Some(3844));
        assert!(capacity(21).is_some());
        assert!(capacity(22).is_none());
    }

    #[test]
    fn test_encode_decode_standard() {
        let p = standard();
        let payload = Payload {
            timestamp: 1_760_000_000_000,
            node: 10 * 62 + 1,
            disambiguator: 12345,
        };
        let body = encode(&payload, &p).unwrap();
        assert_eq!(body.len(), 20);
        assert_eq!(&body[8..10], "A1");
        assert_eq!(decode(&body, &p).unwrap(), payload);
    }

    #[test]
    fn test_encode_preserves_order_across_fields() {
        let p = standard();
        let lo = Payload {
            timestamp: 5,
            node: 3843,
            disambiguator: p.disambiguator_capacity() - 1,
        };
        let hi = Payload {
            timestamp: 6,
            node: 0,
            disambiguator: 0,
        };
        assert!(encode(&lo, &p).unwrap() < encode(&hi, &p).unwrap());
    }

    #[test]
    fn test_encode_rejects_out_of_range_fields() {
        let p = standard();
        let base = Payload {
            timestamp: 1,
            node: 1,
            disambiguator: 1,
        };
        assert!(matches!(
            encode(
                &Payload {
                    timestamp: u64::MAX,
                    ..base
                },
                &p
            ),
            Err(HybridIdError::TimestampOverflow(_))
        ));
        assert!(matches!(
            encode(&Payload { node: 3844, ..base }, &p),
            Err(HybridIdError::InvalidNode(_))
        ));
        assert!(matches!(
            encode(
                &Payload {
                    disambiguator: p.disambiguator_capacity(),
                    ..base
                },
                &p
            ),
            Err(HybridIdError::DisambiguatorExhausted { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let p = standard();
        assert!(matches!(
            decode("0123456789", &p),
            Err(HybridIdError::MalformedId(_))
        ));
        assert!(matches!(
            decode("0123456789ABCDEFGHI-", &p),
            Err(HybridIdError::MalformedId(_))
        ));
        assert!(matches!(
            decode("0123456789ABCDEFGHIé", &p),
            Err(HybridIdError::MalformedId(_))
        ));
    }
}
