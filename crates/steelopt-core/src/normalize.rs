use serde::Serialize;
use std::fmt;

/// Canonical identity of a material profile across free-text spelling
/// variants. `50 x 50 x 3 SHS`, `50X50X3-SHS` and `50x50x3shs` all map to the
/// same key. Only [`MaterialKey::normalize`] produces values, so a key is
/// canonical by construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MaterialKey(String);

impl MaterialKey {
    /// Canonicalizes a free-text description: uppercase, spaces, hyphens and
    /// slashes removed, every diameter-mark variant (`Ø`, `ø`, `⌀`) folded to
    /// `⌀`. No other characters are altered.
    pub fn normalize(raw: &str) -> Self {
        let mut key = String::with_capacity(raw.len());
        for ch in raw.chars() {
            match ch {
                ' ' | '-' | '/' => {}
                'Ø' | 'ø' | '⌀' => key.push('⌀'),
                _ => key.extend(ch.to_uppercase()),
            }
        }
        MaterialKey(key)
    }

    /// An empty key never matches a real material; rows producing one are
    /// skipped by the planner.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
