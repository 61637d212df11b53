use super::*;

fn row(description: &str, length: f64, qty: f64) -> BomRow {
    BomRow {
        description: description.to_string(),
        length: Some(length),
        qty: Some(qty),
        parent: None,
        material: None,
    }
}

fn request(rows: Vec<BomRow>) -> ProcessRequest {
    ProcessRequest {
        rows,
        default_stock_length: Some(6000),
        ..ProcessRequest::default()
    }
}

fn plan(request: ProcessRequest) -> ProcessResult {
    Planner::new(request, Catalog::builtin()).unwrap().plan()
}

#[test]
fn test_decreasing_first_fit_pairs_cuts() {
    // 4 x 2000 nominal at factor 1.03 -> 4 x 2060 effective; two fit per 6000 bar
    let packing = pack(&[2060, 2060, 2060, 2060], Some(6000), 0).unwrap();
    assert_eq!(packing.bars_used(), 2);
    assert_eq!(packing.patterns, vec![vec![2060, 2060], vec![2060, 2060]]);
    assert_eq!(packing.offcuts, vec![1880, 1880]);
}

#[test]
fn test_single_cut_offcut() {
    let packing = pack(&[5900], Some(6000), 0).unwrap();
    assert_eq!(packing.bars_used(), 1);
    assert_eq!(packing.offcuts, vec![100]);
}

#[test]
fn test_null_bar_length_passthrough() {
    let cuts = vec![700, 1200, 350];
    let packing = pack(&cuts, None, 5).unwrap();
    assert_eq!(packing.bars_used(), 3);
    assert_eq!(packing.offcuts, vec![0, 0, 0]);
    assert_eq!(packing.patterns, vec![vec![700], vec![1200], vec![350]]);
}

#[test]
fn test_oversize_cut_is_an_error() {
    let err = pack(&[6001], Some(6000), 0).unwrap_err();
    assert_eq!(
        err,
        PackError::OversizeCut {
            cut_mm: 6001,
            bar_mm: 6000
        }
    );
    // An exact fit is fine
    assert!(pack(&[6000], Some(6000), 0).is_ok());
}

#[test]
fn test_empty_cuts_pack_to_nothing() {
    let packing = pack(&[], Some(6000), 0).unwrap();
    assert_eq!(packing.bars_used(), 0);
    assert!(packing.patterns.is_empty());
    assert!(packing.offcuts.is_empty());
}

#[test]
fn test_kerf_charged_between_cuts_only() {
    // 2900 opens the bar (no kerf), the next needs 2900 + 10
    let packing = pack(&[2900, 2900, 2900], Some(6000), 10).unwrap();
    assert_eq!(packing.patterns, vec![vec![2900, 2900], vec![2900]]);
    assert_eq!(packing.offcuts, vec![190, 3100]);
}

#[test]
fn test_capacity_and_conservation_invariants() {
    let cuts = vec![
        3200, 450, 2780, 2780, 1500, 990, 5999, 120, 4000, 3300, 610, 610, 610, 2250,
    ];
    let kerf = 5;
    let bar = 6000;
    let packing = pack(&cuts, Some(bar), kerf).unwrap();

    for (pattern, &offcut) in packing.patterns.iter().zip(&packing.offcuts) {
        let used: u32 = pattern.iter().sum();
        let overhead = kerf * (pattern.len() as u32 - 1);
        assert!(used + overhead <= bar);
        assert_eq!(offcut, bar - used - overhead);
    }

    let mut packed: Vec<u32> = packing.patterns.iter().flatten().copied().collect();
    let mut fed = cuts.clone();
    packed.sort_unstable();
    fed.sort_unstable();
    assert_eq!(packed, fed, "no cut may be lost or duplicated");
}

#[test]
fn test_waste_adjustment() {
    assert_eq!(adjust(2000.0, 1.03), 2060);
    assert_eq!(adjust(1.0, 1.03), 2);
    assert_eq!(adjust(1000.0, 1.0), 1000);
    for nominal in [1.0, 37.5, 500.0, 7123.0] {
        assert!(adjust(nominal, 1.03) as f64 >= nominal);
        assert_eq!(adjust(nominal, 1.03) as f64, (nominal * 1.03).ceil());
    }
}

#[test]
fn test_avg_offcut_rounding() {
    let packing = Packing {
        patterns: vec![vec![1], vec![2], vec![3]],
        offcuts: vec![100, 33, 67],
    };
    assert_eq!(packing.avg_offcut(), 66.7);
    assert_eq!(pack_cut_to_length(&[500]).avg_offcut(), 0.0);
}

#[test]
fn test_cut_override_beats_stock_membership() {
    let catalog = Catalog::builtin();
    let key = MaterialKey::normalize("⌀12 BAR");
    assert!(catalog.is_stock(&key));
    assert_eq!(
        classify(&key, LengthPolicy::CutToLength, &catalog),
        Classification::CutToLength
    );
    assert_eq!(
        classify(&key, LengthPolicy::Standard(6000), &catalog),
        Classification::StockCheck
    );
    let other = MaterialKey::normalize("125PFC");
    assert_eq!(
        classify(&other, LengthPolicy::Standard(12000), &catalog),
        Classification::Buy
    );
}

#[test]
fn test_policy_resolution_order() {
    let catalog = Catalog::builtin();
    let key = MaterialKey::normalize("125PFC");
    let mut overrides = HashMap::new();

    // Catalog standard wins over the global default
    assert_eq!(
        classify::resolve_policy(&key, &overrides, &catalog, Some(6000)),
        LengthPolicy::Standard(12000)
    );

    // Session override wins over the catalog
    overrides.insert(key.clone(), OverrideValue::Length(9000));
    assert_eq!(
        classify::resolve_policy(&key, &overrides, &catalog, Some(6000)),
        LengthPolicy::Standard(9000)
    );

    // Unknown profile falls back to the default, then to Unknown
    let unknown = MaterialKey::normalize("90X90X8SHS");
    assert_eq!(
        classify::resolve_policy(&unknown, &HashMap::new(), &catalog, Some(6000)),
        LengthPolicy::Standard(6000)
    );
    assert_eq!(
        classify::resolve_policy(&unknown, &HashMap::new(), &catalog, None),
        LengthPolicy::Unknown
    );
}

#[test]
fn test_stock_material_produces_check_line_only() {
    // 100X50X3RHS is held stock with a 7000 mm standard; factor 1.0 keeps
    // the effective total at exactly 15000
    let mut req = request(vec![row("100 x 50 x 3 RHS", 7500.0, 2.0)]);
    req.waste_factor = 1.0;
    let result = plan(req);

    assert!(result.buy.is_empty());
    assert_eq!(result.check.len(), 1);
    let line = &result.check[0];
    assert_eq!(line.total_length_mm, 15000);
    assert_eq!(line.stock_length_mm, 7000);
    assert_eq!(line.approx_bars, 2.14);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_cut_override_yields_one_bar_per_cut() {
    let mut req = request(vec![row("Ø12 BAR", 900.0, 5.0)]);
    req.overrides
        .insert("⌀12BAR".to_string(), "CUT".to_string());
    let result = plan(req);

    assert!(result.check.is_empty(), "CUT override beats stock routing");
    assert_eq!(result.buy.len(), 1);
    let line = &result.buy[0];
    assert_eq!(line.bar_length, StockLength::CutToLength);
    assert_eq!(line.total_cuts, 5);
    assert_eq!(line.bars_required, 5);
    assert_eq!(line.avg_offcut_mm, 0.0);
    assert!(line.patterns.iter().all(|p| p.len() == 1));
}

#[test]
fn test_unresolved_material_is_warning_only() {
    let mut req = request(vec![row("UNOBTAINIUM BEAM", 1000.0, 2.0)]);
    req.default_stock_length = None;
    let result = plan(req);

    assert!(result.buy.is_empty());
    assert!(result.check.is_empty());
    assert_eq!(
        result.warnings,
        vec![Warning::UnresolvedLength {
            description: "UNOBTAINIUM BEAM".to_string()
        }]
    );
}

#[test]
fn test_invalid_override_warns_and_falls_back() {
    let mut req = request(vec![row("MYSTERY FLAT", 1000.0, 1.0)]);
    req.overrides
        .insert("MYSTERY FLAT".to_string(), "soon".to_string());
    let result = plan(req);

    assert_eq!(result.buy.len(), 1, "falls back to the global default");
    assert_eq!(result.buy[0].bar_length, StockLength::Mm(6000));
    assert_eq!(
        result.warnings,
        vec![Warning::InvalidOverride {
            key: "MYSTERY FLAT".to_string(),
            value: "soon".to_string()
        }]
    );
}

#[test]
fn test_override_parsing() {
    assert_eq!(OverrideValue::parse("CUT"), Some(OverrideValue::CutToLength));
    assert_eq!(OverrideValue::parse(" cut "), Some(OverrideValue::CutToLength));
    assert_eq!(OverrideValue::parse("8000"), Some(OverrideValue::Length(8000)));
    assert_eq!(
        OverrideValue::parse("7500.9"),
        Some(OverrideValue::Length(7500))
    );
    assert_eq!(OverrideValue::parse("0"), None);
    assert_eq!(OverrideValue::parse("-5"), None);
    assert_eq!(OverrideValue::parse("12 bars"), None);
    assert_eq!(OverrideValue::parse(""), None);
}

#[test]
fn test_malformed_rows_warn_but_do_not_abort_group() {
    let mut bad_length = row("125 PFC", 0.0, 2.0);
    bad_length.length = None;
    let zero_qty = row("125 PFC", 2000.0, 0.0);
    let good = row("125 PFC", 2000.0, 2.0);
    let blank = row("   ", 1000.0, 1.0);

    let result = plan(request(vec![bad_length, zero_qty, good, blank]));

    assert_eq!(result.buy.len(), 1);
    assert_eq!(result.buy[0].total_cuts, 2);
    let reasons: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| matches!(w, Warning::MalformedRow { .. }))
        .collect();
    assert_eq!(reasons.len(), 3);
}

#[test]
fn test_multiplier_applies_to_every_row() {
    let mut req = request(vec![row("125PFC", 2000.0, 2.0)]);
    req.multiplier = 3;
    let result = plan(req);
    assert_eq!(result.buy[0].total_cuts, 6);
}

#[test]
fn test_bulk_grouping_merges_spellings_and_keeps_first_label() {
    let result = plan(request(vec![
        row("50 x 50 x 3 SHS", 1000.0, 1.0),
        row("125PFC", 400.0, 1.0),
        row("50X50X3-SHS", 1200.0, 1.0),
    ]));

    assert_eq!(result.buy.len(), 2);
    assert_eq!(result.buy[0].description, "50 x 50 x 3 SHS");
    assert_eq!(result.buy[0].total_cuts, 2);
    assert_eq!(result.buy[1].description, "125PFC");
    assert!(result.buy.iter().all(|l| l.parent.is_none()));
}

#[test]
fn test_by_parent_bundling_splits_groups() {
    let mut frame_a = row("125PFC", 1000.0, 1.0);
    frame_a.parent = Some("Frame A".to_string());
    let mut frame_b = row("125PFC", 1000.0, 1.0);
    frame_b.parent = Some("Frame B".to_string());
    let loose = row("125PFC", 1000.0, 1.0);

    let mut req = request(vec![frame_a, frame_b, loose]);
    req.bundling = BundlingMode::ByParentThenDescription;
    let result = plan(req);

    let parents: Vec<_> = result.buy.iter().map(|l| l.parent.as_deref()).collect();
    assert_eq!(
        parents,
        vec![Some("Frame A"), Some("Frame B"), Some(NO_PARENT_LABEL)]
    );
}

#[test]
fn test_oversize_material_does_not_abort_run() {
    let result = plan(request(vec![
        row("125PFC", 13000.0, 1.0),
        row("50X50X3SHS", 1000.0, 1.0),
    ]));

    assert_eq!(result.buy.len(), 1);
    assert_eq!(result.buy[0].description, "50X50X3SHS");
    assert!(matches!(
        result.warnings.as_slice(),
        [Warning::OversizeCut {
            bar_mm: 12000,
            ..
        }]
    ));
}

#[test]
fn test_planner_rejects_unusable_requests() {
    assert!(matches!(
        Planner::new(ProcessRequest::default(), Catalog::builtin()),
        Err(PlanError::EmptyBom)
    ));

    let mut zero_mult = request(vec![row("125PFC", 100.0, 1.0)]);
    zero_mult.multiplier = 0;
    assert!(Planner::new(zero_mult, Catalog::builtin()).is_err());

    let mut shrink = request(vec![row("125PFC", 100.0, 1.0)]);
    shrink.waste_factor = 0.9;
    assert!(Planner::new(shrink, Catalog::builtin()).is_err());
}

#[test]
fn test_summary_totals() {
    // Two materials: 4 x 2060 into 6000 bars (2 bars), plus a cut-to-length line
    let mut req = request(vec![
        row("90X90X5SHS", 2000.0, 4.0),
        row("GLASS TRIM", 500.0, 2.0),
    ]);
    req.overrides
        .insert("GLASS TRIM".to_string(), "CUT".to_string());
    let result = plan(req);

    let summary = &result.summary;
    assert_eq!(summary.buy_materials, 2);
    assert_eq!(summary.check_materials, 0);
    assert_eq!(summary.bars_to_buy, 4);
    assert_eq!(summary.total_cut_mm, 4 * 2060 + 2 * 515);
    assert_eq!(summary.total_offcut_mm, 2 * 6000 - 4 * 2060);
    let expected = (4.0 * 2060.0) / 12000.0 * 100.0;
    assert!((summary.utilisation_pct - expected).abs() < 1e-9);
}

#[test]
fn test_plan_is_deterministic() {
    let req = request(vec![
        row("90X90X5SHS", 2750.0, 3.0),
        row("90X90X5SHS", 1100.0, 5.0),
        row("125PFC", 4000.0, 2.0),
    ]);
    let a = Planner::new(req.clone(), Catalog::builtin()).unwrap().plan();
    let b = Planner::new(req, Catalog::builtin()).unwrap().plan();
    for (x, y) in a.buy.iter().zip(&b.buy) {
        assert_eq!(x.patterns, y.patterns);
        assert_eq!(x.bars_required, y.bars_required);
    }
}
