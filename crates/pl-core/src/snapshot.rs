//! Ordered capture of every control's displayed value.

use crate::ids::ControlKey;
use crate::numeric::{Real, leading_number};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Key -> value mapping that keeps the registry's control order.
///
/// A snapshot owns its strings; once taken it shares nothing with the
/// registry it was captured from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    entries: Vec<(ControlKey, String)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, keeping the original position of an existing key.
    pub fn insert(&mut self, key: ControlKey, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Leading numeric value of `key`, if present and numeric.
    pub fn numeric(&self, key: &str) -> Option<Real> {
        self.get(key).and_then(leading_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ControlKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ControlKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ControlKey, String)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (ControlKey, String)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (key, value) in iter {
            snapshot.insert(key, value);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces() {
        let mut s = Snapshot::new();
        s.insert("abertura".into(), "0");
        s.insert("rpm".into(), "0 (0)");
        s.insert("abertura".into(), "50");

        let keys: Vec<&str> = s.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["abertura", "rpm"]);
        assert_eq!(s.get("abertura"), Some("50"));
        assert_eq!(s.numeric("rpm"), Some(0.0));
        assert_eq!(s.get("missing"), None);
    }
}
