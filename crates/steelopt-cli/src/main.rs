use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use steelopt_core::{
    BomRow, BundlingMode, Catalog, CatalogSpec, Planner, ProcessRequest, ProcessResult,
};

/// Parent column value for bulk-procured lines.
const BULK_LABEL: &str = "(Bulk)";

#[derive(Parser)]
#[command(name = "steelopt")]
#[command(about = "Steel Optimiser - Plan stock bar purchases and cutting from a BOM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a BOM into BUY and CHECK lists
    Process {
        /// Full processing request (YAML or JSON)
        #[arg(short, long, conflicts_with = "bom")]
        input: Option<PathBuf>,

        /// BOM table (CSV with Description, Length, Qty headers)
        #[arg(short, long)]
        bom: Option<PathBuf>,

        /// Bundle output per Parent instead of bulk per Description
        #[arg(long)]
        by_parent: bool,

        /// Multiply every BOM quantity (e.g. number of assemblies built)
        #[arg(long, default_value_t = 1)]
        multiplier: u32,

        /// Fallback stock length in mm for materials with no known standard
        #[arg(long)]
        default_length: Option<u32>,

        /// Trim/saw-loss allowance applied to every cut
        #[arg(long)]
        waste_factor: Option<f64>,

        /// Saw kerf in mm charged between adjacent cuts
        #[arg(long, default_value_t = 0)]
        kerf: u32,

        /// Session override: KEY=LENGTH or KEY=CUT (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Custom standard-length catalog (YAML or JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output file for the full result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory to write buy.csv and check.csv into
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },

    /// Show the built-in standard length catalog and stock list
    Catalog,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            bom,
            by_parent,
            multiplier,
            default_length,
            waste_factor,
            kerf,
            overrides,
            catalog,
            output,
            export_csv,
        } => {
            let request = build_request(
                input,
                bom,
                by_parent,
                multiplier,
                default_length,
                waste_factor,
                kerf,
                &overrides,
            )?;
            let catalog = load_catalog(catalog)?;
            process_command(request, catalog, output, export_csv)?;
        }
        Commands::Catalog => catalog_command(),
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_request(
    input: Option<PathBuf>,
    bom: Option<PathBuf>,
    by_parent: bool,
    multiplier: u32,
    default_length: Option<u32>,
    waste_factor: Option<f64>,
    kerf: u32,
    overrides: &[String],
) -> Result<ProcessRequest> {
    let mut request = match (input, bom) {
        (Some(path), _) => read_request(&path)?,
        (None, Some(path)) => ProcessRequest {
            rows: read_bom_csv(&path)?,
            ..ProcessRequest::default()
        },
        (None, None) => bail!("provide a request with --input or a BOM with --bom"),
    };

    if by_parent {
        request.bundling = BundlingMode::ByParentThenDescription;
    }
    if multiplier != 1 {
        request.multiplier = multiplier;
    }
    if let Some(mm) = default_length {
        request.default_stock_length = Some(mm);
    }
    if let Some(factor) = waste_factor {
        request.waste_factor = factor;
    }
    if kerf != 0 {
        request.kerf_mm = kerf;
    }
    request.overrides.extend(parse_overrides(overrides)?);

    Ok(request)
}

fn read_request(path: &Path) -> Result<ProcessRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let request = if matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    ) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(request)
}

/// Reads a BOM CSV with case-insensitive headers. `Description`, `Length`
/// and `Qty` must be present; `Parent` and `Material` are optional. Cell
/// values that fail to parse are left absent for the planner to report.
fn read_bom_csv(path: &Path) -> Result<Vec<BomRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let (Some(desc_col), Some(len_col), Some(qty_col)) =
        (col("description"), col("length"), col("qty"))
    else {
        bail!("BOM must include Description, Length and Qty columns (case-insensitive)");
    };
    let parent_col = col("parent");
    let material_col = col("material");

    let cell = |record: &csv::StringRecord, idx: usize| -> Option<String> {
        record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(BomRow {
            description: cell(&record, desc_col).unwrap_or_default(),
            length: cell(&record, len_col).and_then(|s| s.parse().ok()),
            qty: cell(&record, qty_col).and_then(|s| s.parse().ok()),
            parent: parent_col.and_then(|idx| cell(&record, idx)),
            material: material_col.and_then(|idx| cell(&record, idx)),
        });
    }

    if rows.is_empty() {
        bail!("BOM contains no data rows");
    }
    Ok(rows)
}

fn parse_overrides(overrides: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for entry in overrides {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("override \"{entry}\" must be KEY=LENGTH or KEY=CUT");
        };
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(map)
}

fn load_catalog(path: Option<PathBuf>) -> Result<Catalog> {
    let Some(path) = path else {
        return Ok(Catalog::builtin());
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let spec: CatalogSpec = if matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    ) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(Catalog::from_spec(spec))
}

fn process_command(
    request: ProcessRequest,
    catalog: Catalog,
    output: Option<PathBuf>,
    export_csv: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🔩 Processing BOM...".bright_blue());
    println!(
        "  {} rows, multiplier {}",
        request.rows.len().to_string().bright_white().bold(),
        request.multiplier.to_string().bright_white()
    );
    println!();

    let planner = Planner::new(request, catalog)?;
    let result = planner.plan();

    println!("{}", "📦 BUY LIST".bright_yellow().bold());
    if result.buy.is_empty() {
        println!("  (nothing to buy)");
    }
    for line in &result.buy {
        let parent = line.parent.as_deref().unwrap_or(BULK_LABEL);
        println!(
            "  {} — {}",
            parent.bright_black(),
            line.description.bright_white().bold()
        );
        println!(
            "    bar {} | cuts {} | bars {} | avg offcut {} mm",
            line.bar_length.to_string().bright_white(),
            line.total_cuts,
            line.bars_required.to_string().bright_green().bold(),
            line.avg_offcut_mm
        );
        println!("    patterns: {}", format_patterns(&line.patterns));
    }
    println!();

    println!("{}", "📘 CHECK (stock materials)".bright_yellow().bold());
    if result.check.is_empty() {
        println!("  (nothing held in stock)");
    }
    for line in &result.check {
        let parent = line.parent.as_deref().unwrap_or(BULK_LABEL);
        println!(
            "  {} — {}",
            parent.bright_black(),
            line.description.bright_white().bold()
        );
        println!(
            "    total {} mm | ≈ {} bars of {} mm",
            line.total_length_mm.to_string().bright_white(),
            line.approx_bars.to_string().bright_green().bold(),
            line.stock_length_mm
        );
    }
    println!();

    if !result.warnings.is_empty() {
        println!("{}", "⚠ Warnings".bright_red().bold());
        for warning in &result.warnings {
            println!("  • {warning}");
        }
        println!();
    }

    let summary = &result.summary;
    println!(
        "  Bars to buy: {} | cut {} mm | offcut {} mm | utilisation {:.1}%",
        summary.bars_to_buy.to_string().bright_white().bold(),
        summary.total_cut_mm,
        summary.total_offcut_mm,
        summary.utilisation_pct
    );
    println!();

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&path, json)?;
        println!(
            "💾 Saved result to {}",
            path.display().to_string().bright_white()
        );
    }

    if let Some(dir) = export_csv {
        export_tables(&result, &dir)?;
        println!(
            "💾 Exported buy.csv and check.csv to {}",
            dir.display().to_string().bright_white()
        );
    }

    Ok(())
}

fn format_patterns(patterns: &[Vec<u32>]) -> String {
    patterns
        .iter()
        .map(|pattern| {
            let cuts: Vec<String> = pattern.iter().map(u32::to_string).collect();
            format!("[{}]", cuts.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes the two result tables with the spreadsheet column layout the
/// procurement team expects.
fn export_tables(result: &ProcessResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut buy = csv::Writer::from_path(dir.join("buy.csv"))?;
    buy.write_record([
        "Parent",
        "Description",
        "Standard Bar Length (mm)",
        "Total Cuts",
        "Bars Required",
        "Avg Offcut (mm)",
        "Cutting Patterns",
    ])?;
    for line in &result.buy {
        buy.write_record([
            line.parent.clone().unwrap_or_else(|| BULK_LABEL.to_string()),
            line.description.clone(),
            line.bar_length.to_string(),
            line.total_cuts.to_string(),
            line.bars_required.to_string(),
            line.avg_offcut_mm.to_string(),
            format_patterns(&line.patterns),
        ])?;
    }
    buy.flush()?;

    let mut check = csv::Writer::from_path(dir.join("check.csv"))?;
    check.write_record([
        "Parent",
        "Description",
        "Total Length (mm)",
        "Approx. Bars Equivalent",
        "Used Stock Length (mm)",
    ])?;
    for line in &result.check {
        check.write_record([
            line.parent.clone().unwrap_or_else(|| BULK_LABEL.to_string()),
            line.description.clone(),
            line.total_length_mm.to_string(),
            line.approx_bars.to_string(),
            line.stock_length_mm.to_string(),
        ])?;
    }
    check.flush()?;

    Ok(())
}

fn catalog_command() {
    let catalog = Catalog::builtin();

    println!("{}", "📐 Standard lengths".bright_yellow().bold());
    for (key, length) in catalog.entries() {
        match length {
            Some(mm) => println!("  {:<14} {} mm", key.to_string().bright_white(), mm),
            None => println!("  {:<14} {}", key.to_string().bright_white(), "no standard"),
        }
    }

    println!();
    println!("{}", "🏭 Held in stock".bright_yellow().bold());
    for key in catalog.stock_keys() {
        println!("  {}", key.to_string().bright_white());
    }
}
