//! Localization equivalence lookup.
//!
//! Configured as `target -> [equivalents...]` and flattened into an
//! `equivalent -> target` map, used during `Accept-Language` detection to
//! treat near-identical locales as one (e.g. mapping `ru` onto a supported
//! `uk`). Read-only during request handling.

use std::collections::HashMap;

/// Flattened equivalence lookup from an observed locale token to the
/// canonical allowed localization it should count as.
#[derive(Debug, Clone, Default)]
pub struct EquivalenceMap {
    equivalent_to_target: HashMap<String, String>,
}

impl EquivalenceMap {
    /// Empty map: every lookup is a miss.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn replace<I, S, E>(&mut self, equivalents: I)
    where
        I: IntoIterator<Item = (S, Vec<E>)>,
        S: Into<String>,
        E: Into<String>,
    {
        self.equivalent_to_target.clear();
        self.add(equivalents);
    }

    /// Merge additional `target -> [equivalents...]` entries. A token
    /// configured twice keeps the last target.
    pub fn add<I, S, E>(&mut self, equivalents: I)
    where
        I: IntoIterator<Item = (S, Vec<E>)>,
        S: Into<String>,
        E: Into<String>,
    {
        for (target, tokens) in equivalents {
            let target = target.into();
            for token in tokens {
                self.equivalent_to_target.insert(token.into(), target.clone());
            }
        }
    }

    /// The canonical target for an observed token, if one is configured.
    /// Already-canonical tokens are not keys, so the lookup is a no-op for
    /// them.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.equivalent_to_target.get(token).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.equivalent_to_target.is_empty()
    }

    pub fn len(&self) -> usize {
        self.equivalent_to_target.len()
    }
}
