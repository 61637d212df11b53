//! Standard stock lengths and the held-stock list.
//!
//! The built-in table covers the profiles the workshop actually orders
//! (SHS/RHS/PFC, equal angle, flat and round bar). A profile can be listed
//! with no standard length, meaning it is known but must be resolved through
//! an override or the global default.

use crate::normalize::MaterialKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Known standard length per profile, in mm. `None` marks a profile that is
/// known but has no standard bar length.
const BUILTIN_LENGTHS: &[(&str, Option<u32>)] = &[
    ("50X50X3SHS", Some(8000)),
    ("100X50X3RHS", Some(7000)),
    ("125PFC", Some(12000)),
    ("75X50X3RHS", Some(8000)),
    ("150PFC", Some(12000)),
    ("150X50X5RHS", Some(8000)),
    ("40X40X2.5SHS", Some(8000)),
    ("40X40X3SHS", Some(8000)),
    ("150X50X3RHS", Some(8000)),
    ("65X35X2.5RHS", Some(8000)),
    ("75X75X6EA", Some(9000)),
    ("50X50X5EA", Some(9000)),
    ("50X50X3EA", Some(9000)),
    ("25X25X3EA", Some(9000)),
    ("40X40X5EA", Some(7500)),
    ("25X25X2SHS", Some(6500)),
    ("25X25X2.5SHS", Some(6500)),
    ("⌀6BAR", Some(6000)),
    ("⌀12BAR", Some(6000)),
    ("40X5FL(MS)", Some(6000)),
    ("40X3FL(MS)", Some(6000)),
    ("200PFC", None),
];

/// Profiles the workshop already holds; these are checked, not bought.
const BUILTIN_STOCK: &[&str] = &[
    "100X50X3RHS",
    "75X50X3RHS",
    "40X40X2.5RHS",
    "65X35X2.5RHS",
    "40X40X5EA",
    "⌀6BAR",
    "⌀12BAR",
];

/// A raw catalog document as supplied by the user (YAML or JSON). Keys are
/// free text and are normalized when the [`Catalog`] is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSpec {
    #[serde(default)]
    pub standard_lengths: BTreeMap<String, Option<u32>>,
    #[serde(default)]
    pub stock: Vec<String>,
}

/// Standard-length lookup plus the held-stock set, keyed by normalized
/// material keys.
#[derive(Debug, Clone)]
pub struct Catalog {
    lengths: BTreeMap<MaterialKey, Option<u32>>,
    stock: BTreeSet<MaterialKey>,
}

impl Catalog {
    /// The table and stock list the workshop runs on.
    pub fn builtin() -> Self {
        let spec = CatalogSpec {
            standard_lengths: BUILTIN_LENGTHS
                .iter()
                .map(|&(k, v)| (k.to_string(), v))
                .collect(),
            stock: BUILTIN_STOCK.iter().map(|&k| k.to_string()).collect(),
        };
        Self::from_spec(spec)
    }

    /// Builds a catalog from a raw document, normalizing every key.
    pub fn from_spec(spec: CatalogSpec) -> Self {
        let lengths = spec
            .standard_lengths
            .into_iter()
            .map(|(raw, len)| (MaterialKey::normalize(&raw), len))
            .collect();
        let stock = spec
            .stock
            .iter()
            .map(|raw| MaterialKey::normalize(raw))
            .collect();
        Catalog { lengths, stock }
    }

    /// Standard length for a profile, if the catalog knows one. A profile
    /// listed without a length resolves the same as an unknown profile.
    pub fn standard_length(&self, key: &MaterialKey) -> Option<u32> {
        self.lengths.get(key).copied().flatten()
    }

    pub fn is_stock(&self, key: &MaterialKey) -> bool {
        self.stock.contains(key)
    }

    /// All catalog entries, for listing.
    pub fn entries(&self) -> impl Iterator<Item = (&MaterialKey, Option<u32>)> {
        self.lengths.iter().map(|(k, v)| (k, *v))
    }

    pub fn stock_keys(&self) -> impl Iterator<Item = &MaterialKey> {
        self.stock.iter()
    }
}
