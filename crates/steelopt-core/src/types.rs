use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Multiplicative trim/saw-loss allowance applied to every nominal cut length.
pub const DEFAULT_WASTE_FACTOR: f64 = 1.03;

/// One row of an ingested bill of materials.
///
/// `length` and `qty` are optional because ingestion coerces leniently: a
/// value that did not parse arrives as `None` and is reported by the planner
/// as a `MalformedRow` warning instead of vanishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomRow {
    pub description: String,
    /// Nominal cut length in millimetres
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub qty: Option<f64>,
    /// Assembly/bundle identifier
    #[serde(default)]
    pub parent: Option<String>,
    /// Informational only, never used for grouping
    #[serde(default)]
    pub material: Option<String>,
}

/// How BOM rows are bundled into procurement groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundlingMode {
    /// One group per normalized description (bulk procurement)
    #[default]
    ByDescription,
    /// One group per parent assembly and normalized description
    ByParentThenDescription,
}

/// Input: what the caller provides for one processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub rows: Vec<BomRow>,
    #[serde(default)]
    pub bundling: BundlingMode,
    /// Every BOM quantity is multiplied by this (e.g. number of assemblies built)
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    /// Fallback stock length (mm) for materials with no standard and no override
    #[serde(default)]
    pub default_stock_length: Option<u32>,
    #[serde(default = "default_waste_factor")]
    pub waste_factor: f64,
    /// Saw blade loss charged between adjacent cuts on a bar
    #[serde(default)]
    pub kerf_mm: u32,
    /// Session overrides keyed by raw description: a length in mm or "CUT"
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

fn default_multiplier() -> u32 {
    1
}

fn default_waste_factor() -> f64 {
    DEFAULT_WASTE_FACTOR
}

impl Default for ProcessRequest {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            bundling: BundlingMode::default(),
            multiplier: 1,
            default_stock_length: None,
            waste_factor: DEFAULT_WASTE_FACTOR,
            kerf_mm: 0,
            overrides: BTreeMap::new(),
        }
    }
}

/// A validated cut demand for one material group, prior to expansion into
/// individual cut instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutRequirement {
    /// As specified in the BOM
    pub nominal_mm: f64,
    /// Waste-adjusted length fed to the packer
    pub effective_mm: u32,
    /// After the global multiplier is applied
    pub count: u32,
}

/// A session override after edge parsing. Raw strings never travel past this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideValue {
    CutToLength,
    Length(u32),
}

impl OverrideValue {
    /// Parses the user-supplied override string: the literal `CUT` marker
    /// (any casing) or a positive length in mm. Fractional input truncates.
    pub fn parse(raw: &str) -> Option<Self> {
        let v = raw.trim();
        if v.eq_ignore_ascii_case("CUT") {
            return Some(OverrideValue::CutToLength);
        }
        let n: f64 = v.parse().ok()?;
        if n.is_finite() && n >= 1.0 {
            Some(OverrideValue::Length(n as u32))
        } else {
            None
        }
    }
}

/// Resolved per-material length policy.
///
/// Resolution order: session override, then catalog standard length, then the
/// global default, then `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPolicy {
    Standard(u32),
    CutToLength,
    Unknown,
}

pub const CUT_TO_LENGTH_LABEL: &str = "CUT-TO-LENGTH";

/// Bar length column of a BUY line: a standard length in mm, or the
/// cut-to-length marker. Serializes as the number or `"CUT-TO-LENGTH"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLength {
    Mm(u32),
    CutToLength,
}

impl fmt::Display for StockLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockLength::Mm(mm) => write!(f, "{mm}"),
            StockLength::CutToLength => f.write_str(CUT_TO_LENGTH_LABEL),
        }
    }
}

impl Serialize for StockLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            StockLength::Mm(mm) => serializer.serialize_u32(*mm),
            StockLength::CutToLength => serializer.serialize_str(CUT_TO_LENGTH_LABEL),
        }
    }
}

impl<'de> Deserialize<'de> for StockLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Mm(u32),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Mm(mm) => Ok(StockLength::Mm(mm)),
            Raw::Marker(s) if s == CUT_TO_LENGTH_LABEL => Ok(StockLength::CutToLength),
            Raw::Marker(s) => Err(D::Error::custom(format!(
                "expected a length in mm or \"{CUT_TO_LENGTH_LABEL}\", got \"{s}\""
            ))),
        }
    }
}

/// One material to purchase, with its cutting plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyLine {
    /// Bundle label; `None` means bulk procurement
    pub parent: Option<String>,
    pub description: String,
    pub bar_length: StockLength,
    pub total_cuts: u32,
    pub bars_required: u32,
    pub avg_offcut_mm: f64,
    /// Cuts assigned to each bar, in placement order
    pub patterns: Vec<Vec<u32>>,
}

/// One already-held material to verify against inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckLine {
    pub parent: Option<String>,
    pub description: String,
    /// Sum of waste-adjusted cut lengths
    pub total_length_mm: u64,
    /// `total_length_mm / stock_length_mm`, rounded to 2 dp
    pub approx_bars: f64,
    pub stock_length_mm: u32,
}

/// Non-fatal findings collected while processing; the run always completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No standard length, no override, and no global default
    UnresolvedLength { description: String },
    /// Override input was neither a number nor the CUT marker; ignored
    InvalidOverride { key: String, value: String },
    /// A required cut exceeds the bar it would be packed against
    OversizeCut {
        description: String,
        cut_mm: u32,
        bar_mm: u32,
    },
    /// Row dropped: length/quantity missing or non-positive, or blank description
    MalformedRow { description: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedLength { description } => {
                write!(
                    f,
                    "{description}: no standard length known - supply an override or a default"
                )
            }
            Warning::InvalidOverride { key, value } => {
                write!(f, "{key}: invalid override \"{value}\" ignored (use mm or CUT)")
            }
            Warning::OversizeCut {
                description,
                cut_mm,
                bar_mm,
            } => {
                write!(
                    f,
                    "{description}: cut of {cut_mm} mm cannot be made from a {bar_mm} mm bar"
                )
            }
            Warning::MalformedRow {
                description,
                reason,
            } => write!(f, "{description}: row dropped ({reason})"),
        }
    }
}

/// Totals across the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub buy_materials: u32,
    pub check_materials: u32,
    pub bars_to_buy: u32,
    pub total_cut_mm: u64,
    pub total_offcut_mm: u64,
    /// Used share of purchased standard bars, in percent
    pub utilisation_pct: f64,
}

/// Output: what one processing run returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResult {
    pub buy: Vec<BuyLine>,
    pub check: Vec<CheckLine>,
    pub warnings: Vec<Warning>,
    pub summary: PlanSummary,
}

/// Fatal error raised before any processing begins.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("BOM contains no rows")]
    EmptyBom,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Packing failure for a single material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("cut of {cut_mm} mm exceeds the {bar_mm} mm bar length")]
    OversizeCut { cut_mm: u32, bar_mm: u32 },
}

pub type Result<T> = std::result::Result<T, PlanError>;
