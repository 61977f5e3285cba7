//! Decentralized identifier (`did:<method>:<id>`) newtype.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// A validated DID string.
///
/// Accepts `did:` followed by a lowercase method name, a colon, and an identifier
/// made of ASCII alphanumerics and `._:%-`.
///
/// # Example
/// ```
/// use jetstream::Did;
///
/// let did = Did::parse("did:plc:abc123").unwrap();
/// assert_eq!(did.method(), "plc");
/// assert!(Did::parse("plc:abc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

/// The input did not match the DID pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid DID {0:?}: expected did:<method>:<identifier>")]
pub struct InvalidDid(pub String);

impl Did {
    /// Validates and wraps `value`.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidDid> {
        let value = value.into();
        if is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidDid(value))
        }
    }

    /// The method segment (`plc`, `web`, ...).
    pub fn method(&self) -> &str {
        self.0[4..].split(':').next().unwrap_or_default()
    }

    /// Borrows the full DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("did:") else {
        return false;
    };
    let Some((method, id)) = rest.split_once(':') else {
        return false;
    };
    !method.is_empty()
        && method.bytes().all(|b| b.is_ascii_lowercase())
        && !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'%' | b'-'))
}

impl TryFrom<String> for Did {
    type Error = InvalidDid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl Deref for Did {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_methods() {
        for ok in [
            "did:plc:eygmaihciaxprqvxpfvl6flk",
            "did:web:example.com",
            "did:web:localhost%3A8080",
            "did:key:z6Mk-abc_def:ghi",
        ] {
            assert!(Did::parse(ok).is_ok(), "{ok} should parse");
        }
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "",
            "did:",
            "did:plc",
            "did:plc:",
            "did:PLC:abc",
            "did:plc:abc def",
            "did:plc:abc/def",
            "notadid:plc:abc",
        ] {
            assert!(Did::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<Did, _> = serde_json::from_str("\"did:plc:abc\"");
        assert_eq!(ok.map(|d| d.method().to_string()).ok().as_deref(), Some("plc"));

        let bad: Result<Did, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
