use crate::catalog::Catalog;
use crate::normalize::MaterialKey;
use crate::types::{LengthPolicy, OverrideValue};
use std::collections::HashMap;

/// Procurement route for one material group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Sold pre-cut; every cut is its own "bar", no packing
    CutToLength,
    /// Already held; report total required length instead of a purchase plan
    StockCheck,
    /// Must be bought and packed against a bar length
    Buy,
}

/// Resolves the length policy for a material: session override first, then
/// the catalog standard, then the global default, then `Unknown`.
pub(crate) fn resolve_policy(
    key: &MaterialKey,
    overrides: &HashMap<MaterialKey, OverrideValue>,
    catalog: &Catalog,
    default_stock_length: Option<u32>,
) -> LengthPolicy {
    if let Some(value) = overrides.get(key) {
        return match value {
            OverrideValue::CutToLength => LengthPolicy::CutToLength,
            OverrideValue::Length(mm) => LengthPolicy::Standard(*mm),
        };
    }
    if let Some(mm) = catalog.standard_length(key) {
        return LengthPolicy::Standard(mm);
    }
    match default_stock_length {
        Some(mm) => LengthPolicy::Standard(mm),
        None => LengthPolicy::Unknown,
    }
}

/// Routes a material. An explicit cut-to-length policy always wins, even for
/// stock-set members.
pub fn classify(key: &MaterialKey, policy: LengthPolicy, catalog: &Catalog) -> Classification {
    if policy == LengthPolicy::CutToLength {
        Classification::CutToLength
    } else if catalog.is_stock(key) {
        Classification::StockCheck
    } else {
        Classification::Buy
    }
}
