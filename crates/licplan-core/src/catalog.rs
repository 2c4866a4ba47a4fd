//! Product catalog: feature-set tiers and capacity expansion packages.
//!
//! The catalog is pure reference data.  It carries no policy; which tier a
//! site gets and how many packages it buys is decided by the engine against
//! [`crate::rules::Rules`].  A built-in catalog for the current GridPoint
//! price list ships with the crate; deployments with custom price lists can
//! load their own from JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Discipline;

/// Defects in catalog or rules data, detected at engine construction.
///
/// Unlike [`crate::ValidationError`] these are not business outcomes; they
/// mean the reference data itself is unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog does not define tier {tier}")]
    MissingTier { tier: TierId },
    #[error("tier {tier} is declared with the wrong kind")]
    TierKindMismatch { tier: TierId },
    #[error("catalog does not define discipline {discipline}")]
    MissingDiscipline { discipline: Discipline },
    #[error("discipline {discipline} has no purchasable packages")]
    NoPackages { discipline: Discipline },
    #[error("duplicate package code {code} under discipline {discipline}")]
    DuplicatePackage { discipline: Discipline, code: String },
    #[error("package {code} under discipline {discipline} has zero capacity")]
    ZeroCapacity { discipline: Discipline, code: String },
    #[error("compact ceiling must be greater than zero")]
    ZeroCeiling,
    #[error("guard cap for tier {tier} allows more purchased than total capacity")]
    GuardCapInverted { tier: TierId },
    #[error("guard cap attached to non-compact tier {tier}")]
    GuardOnStandardTier { tier: TierId },
    #[error("forcing features are configured but the standard tier does not allow advanced features")]
    ForcingWithoutAdvancedTier,
}

/// Identifier of a feature-set tier.  The set of tiers is closed: the
/// selector's precedence rules are written in terms of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TierId {
    /// Full feature set, no hard capacity limits.
    #[serde(rename = "STD")]
    Standard,
    /// Compact variant for building-automation dominated sites.
    #[serde(rename = "CMPT-BA")]
    CompactBa,
    /// Compact variant for danger-management (fire) dominated sites.
    #[serde(rename = "CMPT-DMS")]
    CompactDanger,
    /// Compact variant for electrical-only sites.
    #[serde(rename = "CMPT-EL")]
    CompactElectrical,
    /// Compact variant for validated-monitoring-only sites.
    #[serde(rename = "CMPT-VM")]
    CompactMonitoring,
}

impl TierId {
    pub const ALL: [TierId; 5] = [
        TierId::Standard,
        TierId::CompactBa,
        TierId::CompactDanger,
        TierId::CompactElectrical,
        TierId::CompactMonitoring,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TierId::Standard => "STD",
            TierId::CompactBa => "CMPT-BA",
            TierId::CompactDanger => "CMPT-DMS",
            TierId::CompactElectrical => "CMPT-EL",
            TierId::CompactMonitoring => "CMPT-VM",
        }
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Broad class of a tier. Compact tiers are cheaper but rule-constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TierKind {
    Standard,
    Compact,
}

/// One orderable capacity expansion package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDef {
    /// Orderable code, unique within its discipline, e.g. `GP-BA-500`.
    pub code: String,
    pub part_number: String,
    /// Capacity units added per purchased package. Always non-zero.
    pub size: u32,
}

/// Catalog entry for one discipline: its unit label and price-list packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplineInfo {
    /// Unit label for reports, e.g. `data points`.
    pub unit: String,
    /// Never empty after validation; a discipline nobody can expand is a
    /// price-list defect, not a site condition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageDef>,
}

/// Definition of one feature-set tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDef {
    pub id: TierId,
    pub name: String,
    /// Orderable feature-set code, e.g. `GP-STD-FSET`.
    pub code: String,
    pub part_number: String,
    pub kind: TierKind,
    /// Whether the tier may host the advanced feature options (analytics,
    /// distributed sites, external interfaces).
    #[serde(default)]
    pub allows_advanced: bool,
    /// Capacity included with the tier itself, deducted from requirements
    /// before any package is purchased.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub embedded: BTreeMap<Discipline, u32>,
}

impl TierDef {
    pub fn embedded_for(&self, discipline: Discipline) -> u32 {
        self.embedded.get(&discipline).copied().unwrap_or(0)
    }
}

/// A complete price list: every tier plus every expansion package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub vendor: String,
    pub product: String,
    pub disciplines: BTreeMap<Discipline, DisciplineInfo>,
    pub tiers: BTreeMap<TierId, TierDef>,
}

impl Catalog {
    /// The built-in GridPoint price list.
    pub fn builtin() -> Self {
        let json = include_str!("data/catalog.json");
        // Shipped with the crate and covered by tests; a parse failure here
        // is a packaging defect, not a runtime condition.
        let catalog: Catalog = serde_json::from_str(json).expect("built-in catalog parses");
        catalog
    }

    /// Parse a catalog from a JSON string and validate it.
    pub fn parse(json: &str, origin: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Structural checks that make every later lookup total: all five tiers
    /// exist with consistent kinds, every discipline has at least one
    /// purchasable package, package codes are unique per discipline and no
    /// package has zero capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for id in TierId::ALL {
            let tier = self
                .tiers
                .get(&id)
                .ok_or(ConfigError::MissingTier { tier: id })?;
            let expected = match id {
                TierId::Standard => TierKind::Standard,
                _ => TierKind::Compact,
            };
            if tier.kind != expected || tier.id != id {
                return Err(ConfigError::TierKindMismatch { tier: id });
            }
        }
        for discipline in Discipline::ALL {
            let info = self
                .disciplines
                .get(&discipline)
                .ok_or(ConfigError::MissingDiscipline { discipline })?;
            if info.packages.is_empty() {
                return Err(ConfigError::NoPackages { discipline });
            }
        }
        for (&discipline, info) in &self.disciplines {
            let mut seen = std::collections::BTreeSet::new();
            for pkg in &info.packages {
                if pkg.size == 0 {
                    return Err(ConfigError::ZeroCapacity {
                        discipline,
                        code: pkg.code.clone(),
                    });
                }
                if !seen.insert(pkg.code.as_str()) {
                    return Err(ConfigError::DuplicatePackage {
                        discipline,
                        code: pkg.code.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Tier definition lookup. Total after [`Catalog::validate`].
    pub fn tier(&self, id: TierId) -> &TierDef {
        self.tiers.get(&id).expect("tier validated at construction")
    }

    /// Expansion packages purchasable for a discipline; empty when the
    /// price list has none.
    pub fn packages(&self, discipline: Discipline) -> &[PackageDef] {
        self.disciplines
            .get(&discipline)
            .map(|info| info.packages.as_slice())
            .unwrap_or(&[])
    }

    /// Unit label for a discipline, falling back to a generic one.
    pub fn unit(&self, discipline: Discipline) -> &str {
        self.disciplines
            .get(&discipline)
            .map(|info| info.unit.as_str())
            .filter(|u| !u.is_empty())
            .unwrap_or("units")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.tier(TierId::Standard).kind, TierKind::Standard);
        assert_eq!(catalog.tier(TierId::CompactBa).kind, TierKind::Compact);
    }

    #[test]
    fn builtin_catalog_has_packages_for_every_discipline() {
        let catalog = Catalog::builtin();
        for d in Discipline::ALL {
            assert!(
                !catalog.packages(d).is_empty(),
                "no packages for {}",
                d.key()
            );
            assert!(!catalog.unit(d).is_empty());
        }
    }

    #[test]
    fn builtin_standard_tier_embeds_more_than_compact() {
        let catalog = Catalog::builtin();
        let std = catalog.tier(TierId::Standard);
        let cmpt = catalog.tier(TierId::CompactBa);
        let ba = Discipline::BuildingAutomation;
        assert!(std.embedded_for(ba) > cmpt.embedded_for(ba));
        assert_eq!(cmpt.embedded_for(Discipline::Scada), 0);
    }

    #[test]
    fn only_the_standard_tier_allows_advanced_features() {
        let catalog = Catalog::builtin();
        for id in TierId::ALL {
            let tier = catalog.tier(id);
            assert_eq!(tier.allows_advanced, id == TierId::Standard, "{id}");
        }
    }

    #[test]
    fn validate_rejects_discipline_without_packages() {
        let mut catalog = Catalog::builtin();
        catalog
            .disciplines
            .get_mut(&Discipline::Scada)
            .unwrap()
            .packages
            .clear();
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::NoPackages {
                discipline: Discipline::Scada
            })
        ));
    }

    #[test]
    fn validate_rejects_missing_tier() {
        let mut catalog = Catalog::builtin();
        catalog.tiers.remove(&TierId::CompactMonitoring);
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::MissingTier {
                tier: TierId::CompactMonitoring
            })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_package_code() {
        let mut catalog = Catalog::builtin();
        let info = catalog
            .disciplines
            .get_mut(&Discipline::Fire)
            .unwrap();
        let dup = info.packages[0].clone();
        info.packages.push(dup);
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::DuplicatePackage { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_capacity_package() {
        let mut catalog = Catalog::builtin();
        catalog
            .disciplines
            .get_mut(&Discipline::Metering)
            .unwrap()
            .packages
            .push(PackageDef {
                code: "GP-MT-0".to_string(),
                part_number: "GLS-0000-000".to_string(),
                size: 0,
            });
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::ZeroCapacity { .. })
        ));
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let json = serde_json::to_string_pretty(&Catalog::builtin()).unwrap();
        std::fs::write(&path, json).unwrap();
        let catalog = Catalog::from_file(&path).unwrap();
        assert_eq!(catalog, Catalog::builtin());
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = Catalog::from_file(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
