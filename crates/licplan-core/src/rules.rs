//! Commercial policy: what compact tiers may carry and when the standard
//! tier becomes mandatory.
//!
//! Rules are data, not code.  The engine ships a built-in rule set matching
//! the current GridPoint sales policy; regional overrides can be loaded from
//! JSON the same way custom catalogs are.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ConfigError, TierId, TierKind};
use crate::Discipline;

/// Aggregate cap re-checked against the finished BOM of a compact tier.
///
/// `max_total` bounds embedded plus purchased capacity, `max_purchased`
/// bounds purchased capacity alone.  Tripping either one sends the
/// calculation to the standard tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardCap {
    pub discipline: Discipline,
    pub max_total: u64,
    pub max_purchased: u64,
}

/// Fixed message fragments used in reasons and narration, kept as data so
/// regional rule sets can reword them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    pub upgrade_required: String,
    pub embedded_applied: String,
    pub capacity_exceeded: String,
}

/// One complete rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Total requested capacity (all disciplines summed) above which no
    /// compact variant is offered.
    pub compact_total_ceiling: u64,
    /// Feature flags that force the standard tier outright.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub standard_forcing_features: BTreeSet<String>,
    /// Per-discipline hard limits that apply to every compact tier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub compact_limits: BTreeMap<Discipline, u32>,
    /// Package codes that may never be purchased under a compact tier,
    /// independent of their size.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub compact_banned_packages: BTreeMap<Discipline, BTreeSet<String>>,
    /// Post-BOM aggregate caps, keyed by the compact tier they guard.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub guard_caps: BTreeMap<TierId, GuardCap>,
    pub messages: Messages,
}

impl Rules {
    /// The built-in GridPoint sales policy.
    pub fn builtin() -> Self {
        let json = include_str!("data/rules.json");
        // Shipped with the crate and covered by tests; a parse failure here
        // is a packaging defect, not a runtime condition.
        let rules: Rules = serde_json::from_str(json).expect("built-in rules parse");
        rules
    }

    /// Parse a rule set from a JSON string and validate it against a catalog.
    pub fn parse(json: &str, origin: &str, catalog: &Catalog) -> Result<Self, ConfigError> {
        let rules: Rules = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        rules.validate(catalog)?;
        Ok(rules)
    }

    /// Load and validate a rule set from a JSON file.
    pub fn from_file(path: &Path, catalog: &Catalog) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string(), catalog)
    }

    /// Consistency checks: the ceiling is usable, guard caps hang off
    /// compact tiers only and never allow more purchased than total
    /// capacity, and the tier the forcing features fall back to actually
    /// hosts advanced features.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        if self.compact_total_ceiling == 0 {
            return Err(ConfigError::ZeroCeiling);
        }
        if !self.standard_forcing_features.is_empty()
            && !catalog.tier(TierId::Standard).allows_advanced
        {
            return Err(ConfigError::ForcingWithoutAdvancedTier);
        }
        for (&tier, cap) in &self.guard_caps {
            if catalog.tier(tier).kind != TierKind::Compact {
                return Err(ConfigError::GuardOnStandardTier { tier });
            }
            if cap.max_purchased > cap.max_total {
                return Err(ConfigError::GuardCapInverted { tier });
            }
        }
        Ok(())
    }

    /// Hard limit for a discipline under compact tiers, if any.
    pub fn compact_limit(&self, discipline: Discipline) -> Option<u32> {
        self.compact_limits.get(&discipline).copied()
    }

    /// Whether a package code is banned from compact BOMs.
    pub fn is_package_banned(&self, discipline: Discipline, code: &str) -> bool {
        self.compact_banned_packages
            .get(&discipline)
            .is_some_and(|codes| codes.contains(code))
    }

    /// Forcing features present in `enabled`, in sorted order.
    pub fn forcing_features<'a>(&'a self, enabled: &'a BTreeSet<String>) -> Vec<&'a str> {
        enabled
            .intersection(&self.standard_forcing_features)
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_are_valid() {
        let catalog = Catalog::builtin();
        let rules = Rules::builtin();
        rules.validate(&catalog).unwrap();
        assert_eq!(rules.compact_total_ceiling, 2000);
        assert_eq!(rules.compact_limit(Discipline::BuildingAutomation), Some(2000));
        assert_eq!(rules.compact_limit(Discipline::Metering), Some(30));
    }

    #[test]
    fn builtin_rules_ban_large_ba_packages() {
        let rules = Rules::builtin();
        let ba = Discipline::BuildingAutomation;
        assert!(rules.is_package_banned(ba, "GP-BA-5000"));
        assert!(rules.is_package_banned(ba, "GP-BA-10000"));
        assert!(!rules.is_package_banned(ba, "GP-BA-500"));
        assert!(!rules.is_package_banned(Discipline::Fire, "GP-FD-2000"));
    }

    #[test]
    fn forcing_features_intersect_sorted() {
        let rules = Rules::builtin();
        let enabled: BTreeSet<String> = ["WEB_API", "TRENDING", "ADVANCED_ANALYTICS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            rules.forcing_features(&enabled),
            vec!["ADVANCED_ANALYTICS", "WEB_API"]
        );
        assert!(rules.forcing_features(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn validate_rejects_guard_on_standard_tier() {
        let catalog = Catalog::builtin();
        let mut rules = Rules::builtin();
        let cap = rules.guard_caps[&TierId::CompactBa].clone();
        rules.guard_caps.insert(TierId::Standard, cap);
        assert!(matches!(
            rules.validate(&catalog),
            Err(ConfigError::GuardOnStandardTier {
                tier: TierId::Standard
            })
        ));
    }

    #[test]
    fn validate_rejects_inverted_guard_cap() {
        let catalog = Catalog::builtin();
        let mut rules = Rules::builtin();
        rules.guard_caps.insert(
            TierId::CompactBa,
            GuardCap {
                discipline: Discipline::BuildingAutomation,
                max_total: 1000,
                max_purchased: 1500,
            },
        );
        assert!(matches!(
            rules.validate(&catalog),
            Err(ConfigError::GuardCapInverted { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_ceiling() {
        let catalog = Catalog::builtin();
        let mut rules = Rules::builtin();
        rules.compact_total_ceiling = 0;
        assert!(matches!(
            rules.validate(&catalog),
            Err(ConfigError::ZeroCeiling)
        ));
    }

    #[test]
    fn validate_rejects_forcing_without_an_advanced_tier() {
        let mut catalog = Catalog::builtin();
        catalog
            .tiers
            .get_mut(&TierId::Standard)
            .unwrap()
            .allows_advanced = false;
        let rules = Rules::builtin();
        assert!(matches!(
            rules.validate(&catalog),
            Err(ConfigError::ForcingWithoutAdvancedTier)
        ));
    }

    #[test]
    fn from_file_round_trips() {
        let catalog = Catalog::builtin();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, serde_json::to_string_pretty(&Rules::builtin()).unwrap()).unwrap();
        let rules = Rules::from_file(&path, &catalog).unwrap();
        assert_eq!(rules, Rules::builtin());
    }
}
