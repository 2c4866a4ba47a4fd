//! License sizing engine for Gridline site-management installations.
//!
//! This crate turns a per-discipline capacity requirement into a concrete
//! purchase recommendation: a feature-set tier plus a minimal-waste bill of
//! materials of capacity expansion packages.  The result is a plain data
//! structure; everything is serialisable using `serde` so that it can be
//! stored or transferred as JSON.
//!
//! The central entry point is [`engine::LicenseEngine`], which wires four
//! stages together:
//!
//! * [`validator::PolicyValidator`]: hard-limit checks for compact tiers.
//! * [`selector::FeatureSetSelector`]: picks the tier variant.
//! * [`optimizer::BomOptimizer`]: covers each capacity deficit with the
//!   cheapest package combination.
//! * [`recorder::ExplanationRecorder`]: an ordered narration of every
//!   decision taken along the way.
//!
//! All business-rule violations are reported as data on the result; only
//! malformed catalog or rules input is surfaced as an error, at engine
//! construction time.

pub mod catalog;
pub mod engine;
pub mod export;
pub mod optimizer;
pub mod recorder;
#[cfg(feature = "table")]
mod report;
pub mod rules;
pub mod selector;
pub mod validator;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub use catalog::{Catalog, PackageDef, TierDef, TierId, TierKind};
pub use engine::LicenseEngine;
pub use optimizer::{BomOptimizer, Strategy};
pub use recorder::ExplanationRecorder;
pub use rules::Rules;

/// Utilization ratio at or above which a discipline is flagged
/// [`Zone::Yellow`].
pub const YELLOW_RATIO: f64 = 0.80;

/// Utilization ratio at or above which a discipline is flagged
/// [`Zone::Red`].
pub const RED_RATIO: f64 = 0.95;

/// A capacity domain tracked independently by the licensing model.
///
/// Every requirement, embedded allowance, expansion package and hard limit
/// is attached to exactly one discipline; the engine never trades capacity
/// between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Discipline {
    /// HVAC and building automation data points.
    #[serde(rename = "BA")]
    BuildingAutomation,
    /// Fire detection and danger-management points.
    #[serde(rename = "FIRE")]
    Fire,
    /// Power distribution and switchgear points.
    #[serde(rename = "ELEC")]
    Electrical,
    /// Plant telemetry tags.
    #[serde(rename = "SCADA")]
    Scada,
    /// Consumption meters.
    #[serde(rename = "METER")]
    Metering,
    /// Concurrent operator clients.
    #[serde(rename = "CLIENTS")]
    Clients,
    /// Validated (audit-trail) monitoring points.
    #[serde(rename = "VM")]
    ValidatedMonitoring,
}

impl Discipline {
    /// Every discipline in canonical processing order.
    pub const ALL: [Discipline; 7] = [
        Discipline::BuildingAutomation,
        Discipline::Fire,
        Discipline::Electrical,
        Discipline::Scada,
        Discipline::Metering,
        Discipline::Clients,
        Discipline::ValidatedMonitoring,
    ];

    /// Stable short key used in catalogs, rules files and error codes.
    pub fn key(&self) -> &'static str {
        match self {
            Discipline::BuildingAutomation => "BA",
            Discipline::Fire => "FIRE",
            Discipline::Electrical => "ELEC",
            Discipline::Scada => "SCADA",
            Discipline::Metering => "METER",
            Discipline::Clients => "CLIENTS",
            Discipline::ValidatedMonitoring => "VM",
        }
    }

    /// Human-readable name for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Discipline::BuildingAutomation => "Building Automation",
            Discipline::Fire => "Fire Detection",
            Discipline::Electrical => "Electrical Distribution",
            Discipline::Scada => "Plant SCADA",
            Discipline::Metering => "Metering",
            Discipline::Clients => "Operator Clients",
            Discipline::ValidatedMonitoring => "Validated Monitoring",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Requested quantity per discipline for one calculation.
///
/// Disciplines that are absent count as zero.  Quantities are unit-less
/// here; the catalog knows what a unit means per discipline (data points,
/// meters, client seats, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirements(BTreeMap<Discipline, u32>);

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested quantity for one discipline. A zero removes the
    /// entry so that `Requirements` compare equal regardless of how the
    /// zeros were spelled.
    pub fn set(&mut self, discipline: Discipline, quantity: u32) {
        if quantity == 0 {
            self.0.remove(&discipline);
        } else {
            self.0.insert(discipline, quantity);
        }
    }

    /// Builder-style variant of [`Requirements::set`].
    pub fn with(mut self, discipline: Discipline, quantity: u32) -> Self {
        self.set(discipline, quantity);
        self
    }

    pub fn get(&self, discipline: Discipline) -> u32 {
        self.0.get(&discipline).copied().unwrap_or(0)
    }

    /// Sum of all requested quantities across disciplines.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&q| q as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Discipline, u32)> + '_ {
        self.0.iter().map(|(&d, &q)| (d, q))
    }
}

/// Qualitative utilization state of one discipline after the calculation.
///
/// Ordered from healthy to blocking so that the worst zone of a result can
/// be taken with `max()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    Green,
    Yellow,
    Red,
    Blocking,
}

impl Zone {
    /// Classify a requested/licensed ratio against the fixed thresholds.
    /// Hard-limit violations are overlaid as [`Zone::Blocking`] by the
    /// engine and never come from the ratio alone.
    pub fn for_ratio(ratio: f64) -> Zone {
        if ratio >= RED_RATIO {
            Zone::Red
        } else if ratio >= YELLOW_RATIO {
            Zone::Yellow
        } else {
            Zone::Green
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Zone::Green => "GREEN",
            Zone::Yellow => "YELLOW",
            Zone::Red => "RED",
            Zone::Blocking => "BLOCKING",
        };
        f.write_str(s)
    }
}

/// A business-rule violation, reported as result data rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable machine-readable code, e.g. `COMPACT_LIMIT_BA`.
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discipline: Option<Discipline>,
    pub limit: u64,
    pub actual: u64,
    pub message: String,
}

/// One purchased line of the bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    pub discipline: Discipline,
    /// Orderable package code, e.g. `GP-BA-500`.
    pub code: String,
    pub part_number: String,
    /// Capacity added by a single unit of this package.
    pub unit_capacity: u32,
    pub quantity: u32,
    /// `unit_capacity * quantity`, precomputed for reports.
    pub total_capacity: u64,
}

/// Per-discipline capacity accounting of a finished calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub requested: u32,
    /// Embedded allowance of the selected tier plus all purchased capacity.
    pub licensed: u64,
    /// `requested / licensed`; zero when nothing is licensed.
    pub ratio: f64,
    pub zone: Zone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The tier the engine settled on, with enough catalog data for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSelection {
    pub id: TierId,
    pub name: String,
    pub code: String,
    pub part_number: String,
    pub kind: TierKind,
}

/// Everything a caller needs to know about one calculation.
///
/// The struct is pure data: re-running [`LicenseEngine::calculate`] on the
/// same input yields a byte-identical serialisation of this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub tier: TierSelection,
    /// Why this tier was selected (or fallen back to).
    pub tier_reason: String,
    pub bom: Vec<BomLine>,
    pub utilization: BTreeMap<Discipline, Utilization>,
    /// Licensed capacity per discipline (embedded plus purchased).
    pub total_capacity: BTreeMap<Discipline, u64>,
    /// Licensed minus requested; negative when a deficit remains.
    pub remaining_capacity: BTreeMap<Discipline, i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationError>,
    /// Ordered decision narration, one entry per recorded event.
    pub explanations: Vec<String>,
    /// `true` when no discipline ended up in [`Zone::Blocking`].
    pub compliant: bool,
}

impl CalculationResult {
    /// Worst utilization zone across all disciplines.
    pub fn worst_zone(&self) -> Zone {
        self.utilization
            .values()
            .map(|u| u.zone)
            .max()
            .unwrap_or(Zone::Green)
    }

    /// Total purchased capacity per discipline (excludes embedded).
    pub fn purchased_capacity(&self, discipline: Discipline) -> u64 {
        self.bom
            .iter()
            .filter(|l| l.discipline == discipline)
            .map(|l| l.total_capacity)
            .sum()
    }

    /// Total number of purchased packages across the whole BOM.
    pub fn package_count(&self) -> u64 {
        self.bom.iter().map(|l| l.quantity as u64).sum()
    }
}

/// Input of one calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalcInput {
    pub requirements: Requirements,
    /// Feature flags enabled on the project; some of them force the
    /// standard tier regardless of size.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub enabled_features: BTreeSet<String>,
    /// Whether the site holds an active software-update subscription.
    /// Carried through for storage; the tier decision ignores it today.
    #[serde(default)]
    pub subscription_active: bool,
    /// Optional growth reserve in percent. Reserved for future sizing
    /// heuristics and not consumed by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_percent: Option<f64>,
}
