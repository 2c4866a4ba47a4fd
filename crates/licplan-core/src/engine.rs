//! The calculation pipeline: validate, select a tier, purchase packages,
//! re-check the guard caps, account for utilization.
//!
//! A calculation never fails; every business outcome, including an
//! uncoverable requirement, is expressed on the [`CalculationResult`].  The
//! guard stage revises the tier selection at most once: a compact BOM that
//! trips its aggregate cap is recomputed on the standard tier, and that
//! second pass is final.

use std::collections::BTreeMap;

use crate::catalog::{Catalog, ConfigError, PackageDef, TierDef, TierId, TierKind};
use crate::optimizer::{BomOptimizer, Strategy};
use crate::recorder::ExplanationRecorder;
use crate::rules::{GuardCap, Rules};
use crate::selector::FeatureSetSelector;
use crate::validator::PolicyValidator;
use crate::{
    BomLine, CalcInput, CalculationResult, Discipline, Requirements, TierSelection, Utilization,
    Zone,
};

pub struct LicenseEngine {
    catalog: Catalog,
    rules: Rules,
    optimizer: BomOptimizer,
}

/// Working state of one purchasing pass over all disciplines.
struct BomPass {
    bom: Vec<BomLine>,
    purchased: BTreeMap<Discipline, u64>,
}

struct GuardViolation<'a> {
    cap: &'a GuardCap,
    total: u64,
    purchased: u64,
}

impl GuardViolation<'_> {
    fn describe(&self) -> String {
        let key = self.cap.discipline.key();
        if self.purchased > self.cap.max_purchased {
            format!(
                "{} purchased capacity {} exceeds cap {}",
                key, self.purchased, self.cap.max_purchased
            )
        } else {
            format!(
                "{} total capacity {} exceeds cap {}",
                key, self.total, self.cap.max_total
            )
        }
    }
}

impl LicenseEngine {
    /// Build an engine over a validated catalog and rule set.
    pub fn new(catalog: Catalog, rules: Rules) -> Result<Self, ConfigError> {
        catalog.validate()?;
        rules.validate(&catalog)?;
        Ok(Self {
            catalog,
            rules,
            optimizer: BomOptimizer::new(Strategy::Exact),
        })
    }

    /// Engine over the built-in catalog and rules.
    pub fn builtin() -> Self {
        Self::new(Catalog::builtin(), Rules::builtin())
            .expect("built-in catalog and rules are consistent")
    }

    /// Replace the covering strategy. The exact strategy is the default;
    /// the bounded one is opt-in for callers that prefer capped work over
    /// guaranteed minimal waste.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.optimizer = BomOptimizer::new(strategy);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Run one calculation. Same input, same output, byte for byte.
    pub fn calculate(&self, input: &CalcInput) -> CalculationResult {
        let mut recorder = ExplanationRecorder::new();
        let validator = PolicyValidator::new(&self.rules);

        let report = validator.validate(&input.requirements);
        for error in &report.errors {
            recorder.limit_failure(error);
        }

        let choice = FeatureSetSelector::new(&self.rules).select(
            &input.requirements,
            &input.enabled_features,
            &report,
        );
        let mut tier_id = choice.tier;
        let mut reason = choice.reason;
        recorder.tier_decision(self.catalog.tier(tier_id), &reason);

        let mut pass = self.purchase(tier_id, &input.requirements, &validator, &mut recorder);

        if let Some(violation) = self.check_guard(tier_id, &pass) {
            let detail = violation.describe();
            recorder.guard_failure(&detail);
            log::info!("guard rejected {tier_id}: {detail}");
            tier_id = TierId::Standard;
            reason = format!("{} ({detail})", self.rules.messages.upgrade_required);
            recorder.tier_decision(self.catalog.tier(tier_id), &reason);
            pass = self.purchase(tier_id, &input.requirements, &validator, &mut recorder);
        }

        let tier = self.catalog.tier(tier_id);
        let mut utilization = BTreeMap::new();
        let mut total_capacity = BTreeMap::new();
        let mut remaining_capacity = BTreeMap::new();

        for discipline in Discipline::ALL {
            let requested = input.requirements.get(discipline);
            let embedded = tier.embedded_for(discipline) as u64;
            let purchased = pass.purchased.get(&discipline).copied().unwrap_or(0);
            let licensed = embedded + purchased;
            if requested == 0 && licensed == 0 {
                continue;
            }

            let ratio = if licensed > 0 {
                requested as f64 / licensed as f64
            } else {
                0.0
            };
            let over_hard_limit = tier.kind == TierKind::Compact
                && self
                    .rules
                    .compact_limit(discipline)
                    .is_some_and(|limit| requested > limit);
            let (zone, message) = if requested as u64 > licensed {
                (
                    Zone::Blocking,
                    Some(format!(
                        "requested {requested} exceeds licensed capacity {licensed}"
                    )),
                )
            } else if over_hard_limit {
                (
                    Zone::Blocking,
                    Some(format!(
                        "requested {requested} exceeds the compact hard limit"
                    )),
                )
            } else {
                (Zone::for_ratio(ratio), None)
            };

            utilization.insert(
                discipline,
                Utilization {
                    requested,
                    licensed,
                    ratio,
                    zone,
                    message,
                },
            );
            total_capacity.insert(discipline, licensed);
            remaining_capacity.insert(discipline, licensed as i64 - requested as i64);
        }

        let compliant = utilization.values().all(|u| u.zone != Zone::Blocking);
        recorder.final_summary(tier, &reason, compliant);
        log::debug!(
            "{} selected for total requirement {} ({} BOM lines)",
            tier.code,
            input.requirements.total(),
            pass.bom.len()
        );

        CalculationResult {
            tier: TierSelection {
                id: tier_id,
                name: tier.name.clone(),
                code: tier.code.clone(),
                part_number: tier.part_number.clone(),
                kind: tier.kind,
            },
            tier_reason: reason,
            bom: pass.bom,
            utilization,
            total_capacity,
            remaining_capacity,
            errors: report.errors,
            warnings: report.warnings,
            explanations: recorder.into_entries(),
            compliant,
        }
    }

    /// Cover every discipline's deficit under one tier.  Disciplines are
    /// processed in canonical order and each BOM comes back sorted by
    /// package code, so the pass is fully deterministic.
    fn purchase(
        &self,
        tier_id: TierId,
        requirements: &Requirements,
        validator: &PolicyValidator<'_>,
        recorder: &mut ExplanationRecorder,
    ) -> BomPass {
        let tier = self.catalog.tier(tier_id);
        let mut pass = BomPass {
            bom: Vec::new(),
            purchased: BTreeMap::new(),
        };

        for discipline in Discipline::ALL {
            let requested = requirements.get(discipline);
            if requested == 0 {
                continue;
            }
            let embedded = tier.embedded_for(discipline);
            let deficit = requested.saturating_sub(embedded) as u64;
            if embedded > 0 {
                recorder.embedded_deduction(
                    discipline,
                    self.catalog.unit(discipline),
                    embedded,
                    requested,
                    deficit,
                );
            }
            if deficit == 0 {
                continue;
            }

            let legal = self.legal_packages(tier, discipline, validator);
            match self.optimizer.cover(deficit, &legal) {
                Some(picks) => {
                    for pick in picks {
                        let line = BomLine {
                            discipline,
                            code: pick.package.code.clone(),
                            part_number: pick.package.part_number.clone(),
                            unit_capacity: pick.package.size,
                            quantity: pick.quantity,
                            total_capacity: pick.capacity(),
                        };
                        recorder.bom_line(&line, self.optimizer.strategy());
                        *pass.purchased.entry(discipline).or_insert(0) += line.total_capacity;
                        pass.bom.push(line);
                    }
                }
                None => {
                    recorder.no_coverage(discipline, self.catalog.unit(discipline), deficit);
                }
            }
        }
        pass
    }

    /// Packages purchasable for a discipline under a tier.  Compact tiers
    /// drop banned codes and anything larger than the discipline's hard
    /// limit; the standard tier takes the full price list.
    fn legal_packages(
        &self,
        tier: &TierDef,
        discipline: Discipline,
        validator: &PolicyValidator<'_>,
    ) -> Vec<PackageDef> {
        let all = self.catalog.packages(discipline);
        if tier.kind != TierKind::Compact {
            return all.to_vec();
        }
        let limit = self.rules.compact_limit(discipline);
        all.iter()
            .filter(|p| validator.is_package_allowed(discipline, &p.code))
            .filter(|p| limit.is_none_or(|l| p.size <= l))
            .cloned()
            .collect()
    }

    /// Aggregate cap check over a finished compact BOM.
    fn check_guard<'a>(&'a self, tier_id: TierId, pass: &BomPass) -> Option<GuardViolation<'a>> {
        let cap = self.rules.guard_caps.get(&tier_id)?;
        let embedded = self.catalog.tier(tier_id).embedded_for(cap.discipline) as u64;
        let purchased = pass.purchased.get(&cap.discipline).copied().unwrap_or(0);
        let total = embedded + purchased;
        (purchased > cap.max_purchased || total > cap.max_total).then_some(GuardViolation {
            cap,
            total,
            purchased,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ba_input(points: u32) -> CalcInput {
        CalcInput {
            requirements: Requirements::new().with(Discipline::BuildingAutomation, points),
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_keeps_the_compact_tier() {
        let engine = LicenseEngine::builtin();
        let result = engine.calculate(&CalcInput::default());
        assert_eq!(result.tier.id, TierId::CompactBa);
        assert!(result.bom.is_empty());
        assert!(result.compliant);
        assert_eq!(result.worst_zone(), Zone::Green);
        // Embedded-only capacity still shows up in the accounting.
        assert_eq!(
            result.total_capacity[&Discipline::BuildingAutomation],
            250
        );
    }

    #[test]
    fn compact_purchase_within_guard_caps_stands() {
        let engine = LicenseEngine::builtin();
        let result = engine.calculate(&ba_input(1600));
        assert_eq!(result.tier.id, TierId::CompactBa);
        assert_eq!(
            result.purchased_capacity(Discipline::BuildingAutomation),
            1400
        );
        // Compact BOMs never contain banned or oversized packages.
        for line in &result.bom {
            assert!(line.unit_capacity <= 2000, "{} too large", line.code);
            assert_ne!(line.code, "GP-BA-5000");
            assert_ne!(line.code, "GP-BA-10000");
        }
        assert!(result.compliant);
    }

    #[test]
    fn purchased_cap_overflow_falls_back_to_standard() {
        let engine = LicenseEngine::builtin();
        let result = engine.calculate(&ba_input(1900));
        // The compact attempt needs 1700 purchased points, over the 1500
        // cap, so the guard reroutes the site to standard exactly once.
        assert_eq!(result.tier.id, TierId::Standard);
        assert!(result.tier_reason.contains("1500"));
        assert_eq!(
            result.purchased_capacity(Discipline::BuildingAutomation),
            1400
        );
        let rejections = result
            .explanations
            .iter()
            .filter(|e| e.starts_with("Compact BOM rejected"))
            .count();
        assert_eq!(rejections, 1);
        assert!(result.compliant);
    }

    #[test]
    fn total_cap_overflow_falls_back_to_standard() {
        let engine = LicenseEngine::builtin();
        let input = CalcInput {
            requirements: Requirements::new().with(Discipline::Fire, 500),
            ..Default::default()
        };
        let result = engine.calculate(&input);
        // 250 embedded + 300 purchased = 550 total on the danger variant,
        // over its 500 total cap even though purchased stays under 375.
        assert_eq!(result.tier.id, TierId::Standard);
        assert!(result.tier_reason.contains("550"));
        assert!(result.compliant);
    }

    #[test]
    fn guard_never_fires_on_standard_selections() {
        let engine = LicenseEngine::builtin();
        let result = engine.calculate(&ba_input(2200));
        assert_eq!(result.tier.id, TierId::Standard);
        assert!(
            !result
                .explanations
                .iter()
                .any(|e| e.starts_with("Compact BOM rejected"))
        );
    }

    #[test]
    fn narration_ends_with_the_final_summary() {
        let engine = LicenseEngine::builtin();
        let result = engine.calculate(&ba_input(1900));
        let last = result.explanations.last().unwrap();
        assert!(last.starts_with("Final:"));
        assert!(last.contains("GP-STD-FSET"));
        assert!(last.contains("compliant=true"));
    }

    #[test]
    fn calculation_is_deterministic() {
        let engine = LicenseEngine::builtin();
        let input = CalcInput {
            requirements: Requirements::new()
                .with(Discipline::BuildingAutomation, 1200)
                .with(Discipline::Metering, 25)
                .with(Discipline::Clients, 3),
            ..Default::default()
        };
        let a = serde_json::to_string(&engine.calculate(&input)).unwrap();
        let b = serde_json::to_string(&engine.calculate(&input)).unwrap();
        assert_eq!(a, b);
    }
}
