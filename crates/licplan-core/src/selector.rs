//! Feature-set tier selection.
//!
//! The selector is a strict precedence ladder, evaluated top to bottom:
//!
//! 1. A standard-forcing feature flag wins over everything.
//! 2. A total requirement above the compact ceiling forces standard.
//! 3. A hard-limit violation found by the validator forces standard.
//! 4. Otherwise the dominant discipline picks the compact variant.
//!
//! The ladder never inspects the BOM; the post-BOM guard in the engine is
//! the only place a selection gets revised, and it revises at most once.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::catalog::TierId;
use crate::rules::Rules;
use crate::validator::ValidationReport;
use crate::{Discipline, Requirements};

/// A tier decision plus the sentence that justifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierChoice {
    pub tier: TierId,
    pub reason: String,
}

pub struct FeatureSetSelector<'a> {
    rules: &'a Rules,
}

impl<'a> FeatureSetSelector<'a> {
    pub fn new(rules: &'a Rules) -> Self {
        Self { rules }
    }

    pub fn select(
        &self,
        requirements: &Requirements,
        enabled_features: &BTreeSet<String>,
        report: &ValidationReport,
    ) -> TierChoice {
        let forcing = self.rules.forcing_features(enabled_features);
        if !forcing.is_empty() {
            return TierChoice {
                tier: TierId::Standard,
                reason: format!(
                    "Advanced features require the standard tier: {}",
                    forcing.iter().join(", ")
                ),
            };
        }

        let total = requirements.total();
        if total > self.rules.compact_total_ceiling {
            return TierChoice {
                tier: TierId::Standard,
                reason: format!(
                    "Total requested capacity {} exceeds the compact ceiling {}",
                    total, self.rules.compact_total_ceiling
                ),
            };
        }

        if let Some(first) = report.errors.first() {
            return TierChoice {
                tier: TierId::Standard,
                reason: format!("{}: {}", self.rules.messages.capacity_exceeded, first.message),
            };
        }

        let (tier, reason) = self.dominant_variant(requirements);
        TierChoice {
            tier,
            reason: reason.to_string(),
        }
    }

    /// Compact variant for the discipline mix. BA dominates everything,
    /// fire dominates electrical, and the monitoring variant only applies
    /// to pure validated-monitoring sites.
    fn dominant_variant(&self, requirements: &Requirements) -> (TierId, &'static str) {
        let ba = requirements.get(Discipline::BuildingAutomation) > 0;
        let fire = requirements.get(Discipline::Fire) > 0;
        let elec = requirements.get(Discipline::Electrical) > 0;
        let vm = requirements.get(Discipline::ValidatedMonitoring) > 0;

        if vm && !ba && !fire && !elec {
            (TierId::CompactMonitoring, "Validated monitoring only")
        } else if fire && !ba {
            (TierId::CompactDanger, "Fire detection dominant")
        } else if elec && !ba && !fire {
            (TierId::CompactElectrical, "Electrical distribution dominant")
        } else {
            (TierId::CompactBa, "Building automation or mixed-discipline site")
        }
    }
}
