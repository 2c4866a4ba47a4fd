use licplan_core::{
    CalcInput, CalculationResult, Catalog, Discipline, LicenseEngine, Requirements, Rules,
    Strategy, TierId, Zone,
};

fn input(pairs: &[(Discipline, u32)]) -> CalcInput {
    let mut requirements = Requirements::new();
    for &(discipline, quantity) in pairs {
        requirements.set(discipline, quantity);
    }
    CalcInput {
        requirements,
        ..Default::default()
    }
}

fn calculate(pairs: &[(Discipline, u32)]) -> CalculationResult {
    LicenseEngine::builtin().calculate(&input(pairs))
}

fn bom_codes(result: &CalculationResult) -> Vec<(String, u32)> {
    result
        .bom
        .iter()
        .map(|line| (line.code.clone(), line.quantity))
        .collect()
}

#[test]
fn small_overshoot_beats_many_small_packages() {
    // 700 BA points on the compact tier leave a 450 point deficit. One
    // 500 pack wastes 50 points, same as five 100 packs, but buys one
    // package instead of five.
    let result = calculate(&[(Discipline::BuildingAutomation, 700)]);
    assert_eq!(result.tier.id, TierId::CompactBa);
    assert_eq!(bom_codes(&result), [("GP-BA-500".to_string(), 1)]);
    assert!(result.compliant);
}

#[test]
fn zero_waste_wins_over_fewer_packages() {
    // A 1200 point deficit: 1000 + 500 would be two packages but waste
    // 300 points; 1000 + 2 x 100 covers exactly with three.
    let result = calculate(&[(Discipline::BuildingAutomation, 1450)]);
    assert_eq!(result.tier.id, TierId::CompactBa);
    assert_eq!(
        bom_codes(&result),
        [
            ("GP-BA-100".to_string(), 2),
            ("GP-BA-1000".to_string(), 1),
        ]
    );
    assert_eq!(
        result.purchased_capacity(Discipline::BuildingAutomation),
        1200
    );
}

#[test]
fn total_over_the_ceiling_forces_standard() {
    let result = calculate(&[
        (Discipline::BuildingAutomation, 1800),
        (Discipline::Scada, 400),
    ]);
    assert_eq!(result.tier.id, TierId::Standard);
    assert!(result.tier_reason.contains("2200"));
    assert!(result.tier_reason.contains("2000"));
    assert!(result.errors.is_empty());
    assert!(result.compliant);
}

#[test]
fn forcing_feature_overrides_a_tiny_site() {
    let mut calc_input = input(&[(Discipline::ValidatedMonitoring, 50)]);
    calc_input
        .enabled_features
        .insert("ADVANCED_ANALYTICS".to_string());
    let result = LicenseEngine::builtin().calculate(&calc_input);
    assert_eq!(result.tier.id, TierId::Standard);
    assert!(result.tier_reason.contains("ADVANCED_ANALYTICS"));

    // The same site without the feature stays on the monitoring variant.
    let plain = calculate(&[(Discipline::ValidatedMonitoring, 50)]);
    assert_eq!(plain.tier.id, TierId::CompactMonitoring);
}

#[test]
fn empty_requirements_yield_an_empty_green_result() {
    let result = calculate(&[]);
    assert_eq!(result.tier.id, TierId::CompactBa);
    assert!(result.bom.is_empty());
    assert_eq!(result.worst_zone(), Zone::Green);
    assert!(result.compliant);
    assert!(result.explanations.last().unwrap().starts_with("Final:"));
}

#[test]
fn uncoverable_deficit_blocks_without_erroring() {
    // A regional policy that bans every SCADA pack from compact BOMs
    // leaves a compact site's SCADA demand uncoverable; that surfaces as
    // a blocking zone, never as a fabricated package.
    let mut rules = Rules::builtin();
    rules.compact_banned_packages.insert(
        Discipline::Scada,
        ["GP-SC-100", "GP-SC-500", "GP-SC-2000"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    let engine = LicenseEngine::new(Catalog::builtin(), rules).unwrap();

    let result = engine.calculate(&input(&[(Discipline::Scada, 400)]));
    assert_eq!(result.tier.id, TierId::CompactBa);
    assert_eq!(result.worst_zone(), Zone::Blocking);
    assert!(!result.compliant);
    assert_eq!(result.remaining_capacity[&Discipline::Scada], -400);
    assert!(
        result
            .explanations
            .iter()
            .any(|e| e.contains("no purchasable package"))
    );
    // Business outcome, not an error: the errors list stays empty.
    assert!(result.errors.is_empty());
}

#[test]
fn licensed_capacity_always_covers_coverable_requests() {
    for points in [1u32, 300, 800, 1400, 1900, 2600, 7700] {
        let result = calculate(&[(Discipline::BuildingAutomation, points)]);
        let utilization = &result.utilization[&Discipline::BuildingAutomation];
        assert!(
            utilization.licensed >= points as u64,
            "{} points licensed {}",
            points,
            utilization.licensed
        );
        assert_ne!(utilization.zone, Zone::Blocking);
    }
}

#[test]
fn licensed_capacity_never_shrinks_as_demand_grows() {
    // Covers the compact range, the guard fallback boundary and the
    // ceiling crossover in one sweep.
    let engine = LicenseEngine::builtin();
    let mut previous = 0;
    for points in (0u32..=2600).step_by(37) {
        let result = engine.calculate(&input(&[(Discipline::BuildingAutomation, points)]));
        let licensed = result.utilization[&Discipline::BuildingAutomation].licensed;
        assert!(
            licensed >= previous,
            "licensed capacity dropped from {previous} to {licensed} at {points} points"
        );
        previous = licensed;
    }
}

#[test]
fn guard_fallback_happens_at_most_once() {
    let result = calculate(&[(Discipline::BuildingAutomation, 1900)]);
    assert_eq!(result.tier.id, TierId::Standard);
    let selections = result
        .explanations
        .iter()
        .filter(|e| e.starts_with("Selected feature set"))
        .count();
    assert_eq!(selections, 2);
    let rejections = result
        .explanations
        .iter()
        .filter(|e| e.starts_with("Compact BOM rejected"))
        .count();
    assert_eq!(rejections, 1);
}

#[test]
fn near_limit_requirements_carry_a_warning() {
    let result = calculate(&[(Discipline::BuildingAutomation, 1900)]);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.code == "NEAR_COMPACT_LIMIT_BA")
    );
}

#[test]
fn hard_limit_violations_land_on_the_result() {
    let result = calculate(&[(Discipline::Metering, 31)]);
    assert_eq!(result.tier.id, TierId::Standard);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "COMPACT_LIMIT_METER");
    assert_eq!(result.errors[0].actual, 31);
    assert!(
        result
            .explanations
            .iter()
            .any(|e| e.starts_with("Compact check failed"))
    );
}

#[test]
fn mixed_site_buys_across_disciplines_under_compact_rules() {
    let result = calculate(&[
        (Discipline::BuildingAutomation, 1200),
        (Discipline::Fire, 300),
        (Discipline::Metering, 25),
        (Discipline::Clients, 3),
    ]);
    assert_eq!(result.tier.id, TierId::CompactBa);
    assert_eq!(
        bom_codes(&result),
        [
            ("GP-BA-1000".to_string(), 1),
            ("GP-FD-100".to_string(), 3),
            ("GP-MT-10".to_string(), 3),
            ("GP-CL-1".to_string(), 2),
        ]
    );
    // The 50-meter and 5-seat packs exceed the compact hard limits and may
    // not be purchased, so coverage falls back to the small packs.
    assert_eq!(result.utilization[&Discipline::Metering].licensed, 30);
    assert_eq!(result.utilization[&Discipline::Clients].licensed, 3);
    assert_eq!(result.utilization[&Discipline::Metering].zone, Zone::Yellow);
    assert_eq!(result.utilization[&Discipline::Clients].zone, Zone::Red);
    assert!(result.compliant);
}

#[test]
fn bounded_strategy_matches_exact_on_a_small_site() {
    let exact = LicenseEngine::builtin().calculate(&input(&[(
        Discipline::BuildingAutomation,
        700,
    )]));
    let bounded = LicenseEngine::builtin()
        .with_strategy(Strategy::Bounded)
        .calculate(&input(&[(Discipline::BuildingAutomation, 700)]));
    assert_eq!(bom_codes(&exact), bom_codes(&bounded));
    assert!(
        bounded
            .explanations
            .iter()
            .any(|e| e.contains("bounded search"))
    );
    assert!(
        exact
            .explanations
            .iter()
            .any(|e| e.contains("minimum waste"))
    );
}

#[test]
fn results_round_trip_through_json() {
    let result = calculate(&[
        (Discipline::BuildingAutomation, 1450),
        (Discipline::Clients, 3),
    ]);
    let json = serde_json::to_string_pretty(&result).unwrap();
    let back: CalculationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
