use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique key of a control (e.g. `rpm`, `abertura`, `q(l/m)`).
///
/// Keys are the identity of a control everywhere: registry lookups, state
/// record fields, snapshots and report columns are all addressed by key,
/// never by position.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ControlKey(String);

impl ControlKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControlKey({})", self.0)
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ControlKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ControlKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for ControlKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ControlKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ControlKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_compares_with_str() {
        let key = ControlKey::from("rpm");
        assert_eq!(key, "rpm");
        assert_eq!(key.as_str(), "rpm");
        assert_eq!(format!("{key}"), "rpm");
    }
}
