use crate::catalog::Catalog;
use crate::normalize::MaterialKey;
use crate::types::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

mod classify;
mod pack;
mod summary;
#[cfg(test)]
mod tests;
mod waste;

pub use classify::{classify, Classification};
pub use pack::{pack, pack_cut_to_length, Packing};
pub use waste::adjust;

/// Parent label used in by-parent bundling when a row has no parent.
pub const NO_PARENT_LABEL: &str = "(No Parent)";

/// Turns a BOM into BUY and CHECK lists: normalizes descriptions, resolves a
/// length policy per material, waste-adjusts cuts, classifies each group and
/// packs the buy groups with decreasing-order first-fit.
pub struct Planner {
    request: ProcessRequest,
    catalog: Catalog,
}

/// One bundling group: all rows sharing a normalized key (and, in by-parent
/// mode, a parent label). `label` keeps the first raw spelling seen.
struct Group {
    parent: Option<String>,
    key: MaterialKey,
    label: String,
    rows: Vec<usize>,
}

impl Planner {
    /// Validates the request and builds a planner for one run. The override
    /// map and catalog are snapshotted here; `plan` never re-reads shared
    /// state.
    pub fn new(request: ProcessRequest, catalog: Catalog) -> Result<Self> {
        if request.rows.is_empty() {
            return Err(PlanError::EmptyBom);
        }
        if request.multiplier == 0 {
            return Err(PlanError::InvalidInput(
                "quantity multiplier must be at least 1".to_string(),
            ));
        }
        if !request.waste_factor.is_finite() || request.waste_factor < 1.0 {
            return Err(PlanError::InvalidInput(format!(
                "waste factor must be a finite number >= 1.0, got {}",
                request.waste_factor
            )));
        }
        if request.default_stock_length == Some(0) {
            return Err(PlanError::InvalidInput(
                "default stock length must be positive".to_string(),
            ));
        }
        Ok(Self { request, catalog })
    }

    /// Runs the full pipeline. Per-row and per-material problems degrade to
    /// warnings; the run itself always completes.
    pub fn plan(&self) -> ProcessResult {
        let mut warnings = Vec::new();
        let overrides = self.resolve_overrides(&mut warnings);
        let groups = self.group_rows(&mut warnings);

        let mut buy = Vec::new();
        let mut check = Vec::new();
        for group in &groups {
            self.process_group(group, &overrides, &mut buy, &mut check, &mut warnings);
        }

        let summary = self.calculate_summary(&buy, &check);
        ProcessResult {
            buy,
            check,
            warnings,
            summary,
        }
    }

    /// Parses raw override strings into tagged values, once per run. Invalid
    /// entries are ignored with a warning and fall back to normal resolution.
    fn resolve_overrides(
        &self,
        warnings: &mut Vec<Warning>,
    ) -> HashMap<MaterialKey, OverrideValue> {
        let mut resolved = HashMap::new();
        for (raw_key, raw_value) in &self.request.overrides {
            let key = MaterialKey::normalize(raw_key);
            match OverrideValue::parse(raw_value) {
                Some(value) if !key.is_empty() => {
                    resolved.insert(key, value);
                }
                _ => warnings.push(Warning::InvalidOverride {
                    key: raw_key.clone(),
                    value: raw_value.clone(),
                }),
            }
        }
        resolved
    }

    /// Buckets rows by the bundling key, preserving first-seen group order.
    fn group_rows(&self, warnings: &mut Vec<Warning>) -> Vec<Group> {
        let by_parent = self.request.bundling == BundlingMode::ByParentThenDescription;
        let mut groups: Vec<Group> = Vec::new();
        let mut index: HashMap<(Option<String>, MaterialKey), usize> = HashMap::new();

        for (i, row) in self.request.rows.iter().enumerate() {
            let key = MaterialKey::normalize(&row.description);
            if key.is_empty() {
                warnings.push(Warning::MalformedRow {
                    description: row.description.clone(),
                    reason: "blank description".to_string(),
                });
                continue;
            }

            let parent = by_parent.then(|| {
                match row.parent.as_deref().map(str::trim) {
                    Some(p) if !p.is_empty() => p.to_string(),
                    _ => NO_PARENT_LABEL.to_string(),
                }
            });

            match index.entry((parent.clone(), key.clone())) {
                Entry::Occupied(entry) => groups[*entry.get()].rows.push(i),
                Entry::Vacant(entry) => {
                    entry.insert(groups.len());
                    groups.push(Group {
                        parent,
                        key,
                        label: row.description.trim().to_string(),
                        rows: vec![i],
                    });
                }
            }
        }

        groups
    }

    /// Coerces a group's rows into validated cut requirements. Rows whose
    /// length or quantity is missing or non-positive are dropped with a
    /// warning.
    fn cut_requirements(&self, group: &Group, warnings: &mut Vec<Warning>) -> Vec<CutRequirement> {
        let mut requirements = Vec::new();
        for &i in &group.rows {
            let row = &self.request.rows[i];

            let qty = row.qty.map(f64::trunc).filter(|q| q.is_finite() && *q >= 1.0);
            let Some(qty) = qty else {
                warnings.push(Warning::MalformedRow {
                    description: row.description.clone(),
                    reason: "missing or non-positive quantity".to_string(),
                });
                continue;
            };

            let Some(nominal) = row.length.filter(|l| l.is_finite() && *l > 0.0) else {
                warnings.push(Warning::MalformedRow {
                    description: row.description.clone(),
                    reason: "missing or non-positive length".to_string(),
                });
                continue;
            };

            requirements.push(CutRequirement {
                nominal_mm: nominal,
                effective_mm: adjust(nominal, self.request.waste_factor),
                count: qty as u32 * self.request.multiplier,
            });
        }
        requirements
    }

    /// Expands requirements into one entry per physical cut.
    fn expand(requirements: &[CutRequirement]) -> Vec<u32> {
        let mut cuts = Vec::new();
        for req in requirements {
            cuts.extend(std::iter::repeat(req.effective_mm).take(req.count as usize));
        }
        cuts
    }

    /// Resolves, classifies and processes one group into at most one BUY or
    /// CHECK line. A group with no valid cuts yields nothing.
    fn process_group(
        &self,
        group: &Group,
        overrides: &HashMap<MaterialKey, OverrideValue>,
        buy: &mut Vec<BuyLine>,
        check: &mut Vec<CheckLine>,
        warnings: &mut Vec<Warning>,
    ) {
        let cuts = Self::expand(&self.cut_requirements(group, warnings));
        if cuts.is_empty() {
            return;
        }

        let policy = classify::resolve_policy(
            &group.key,
            overrides,
            &self.catalog,
            self.request.default_stock_length,
        );

        match classify(&group.key, policy, &self.catalog) {
            Classification::CutToLength => {
                let packing = pack_cut_to_length(&cuts);
                buy.push(BuyLine {
                    parent: group.parent.clone(),
                    description: group.label.clone(),
                    bar_length: StockLength::CutToLength,
                    total_cuts: cuts.len() as u32,
                    bars_required: packing.bars_used(),
                    avg_offcut_mm: 0.0,
                    patterns: packing.patterns,
                });
            }
            Classification::StockCheck => match policy {
                LengthPolicy::Standard(bar_mm) => {
                    let total: u64 = cuts.iter().map(|&c| c as u64).sum();
                    let approx = total as f64 / bar_mm as f64;
                    check.push(CheckLine {
                        parent: group.parent.clone(),
                        description: group.label.clone(),
                        total_length_mm: total,
                        approx_bars: (approx * 100.0).round() / 100.0,
                        stock_length_mm: bar_mm,
                    });
                }
                _ => warnings.push(Warning::UnresolvedLength {
                    description: group.label.clone(),
                }),
            },
            Classification::Buy => match policy {
                LengthPolicy::Standard(bar_mm) => {
                    match pack(&cuts, Some(bar_mm), self.request.kerf_mm) {
                        Ok(packing) => buy.push(BuyLine {
                            parent: group.parent.clone(),
                            description: group.label.clone(),
                            bar_length: StockLength::Mm(bar_mm),
                            total_cuts: cuts.len() as u32,
                            bars_required: packing.bars_used(),
                            avg_offcut_mm: packing.avg_offcut(),
                            patterns: packing.patterns,
                        }),
                        Err(PackError::OversizeCut { cut_mm, bar_mm }) => {
                            warnings.push(Warning::OversizeCut {
                                description: group.label.clone(),
                                cut_mm,
                                bar_mm,
                            });
                        }
                    }
                }
                _ => warnings.push(Warning::UnresolvedLength {
                    description: group.label.clone(),
                }),
            },
        }
    }
}
