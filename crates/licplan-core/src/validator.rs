//! Hard-limit checks that decide whether a compact tier is admissible.

use crate::rules::Rules;
use crate::{Discipline, Requirements, ValidationError};

/// Outcome of checking one requirement set against the compact limits.
///
/// Violations are data, not errors: the engine keeps calculating and the
/// selector uses `is_compact_valid` to route the site to the standard tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// `true` when every discipline is at or under its compact hard limit.
    pub is_compact_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

/// Stateless checker over one rule set.
pub struct PolicyValidator<'a> {
    rules: &'a Rules,
}

impl<'a> PolicyValidator<'a> {
    pub fn new(rules: &'a Rules) -> Self {
        Self { rules }
    }

    /// Check every discipline against its compact hard limit.
    ///
    /// Requirements above a limit produce an error; requirements at ninety
    /// percent of a limit or more produce a warning so that near-limit
    /// sites show up in reports before they outgrow the compact tier.
    pub fn validate(&self, requirements: &Requirements) -> ValidationReport {
        let mut report = ValidationReport::default();
        for discipline in Discipline::ALL {
            let Some(limit) = self.rules.compact_limit(discipline) else {
                continue;
            };
            let actual = requirements.get(discipline);
            if actual as u64 > limit as u64 {
                report.errors.push(ValidationError {
                    code: format!("COMPACT_LIMIT_{}", discipline.key()),
                    discipline: Some(discipline),
                    limit: limit as u64,
                    actual: actual as u64,
                    message: format!(
                        "{} requirement {} exceeds compact limit {}",
                        discipline.key(),
                        actual,
                        limit
                    ),
                });
            } else if actual > 0 && actual as u64 * 10 >= limit as u64 * 9 {
                report.warnings.push(ValidationError {
                    code: format!("NEAR_COMPACT_LIMIT_{}", discipline.key()),
                    discipline: Some(discipline),
                    limit: limit as u64,
                    actual: actual as u64,
                    message: format!(
                        "{} requirement {} is close to compact limit {}",
                        discipline.key(),
                        actual,
                        limit
                    ),
                });
            }
        }
        report.is_compact_valid = report.errors.is_empty();
        report
    }

    /// Whether a package may appear in a compact BOM at all.
    pub fn is_package_allowed(&self, discipline: Discipline, code: &str) -> bool {
        !self.rules.is_package_banned(discipline, code)
    }
}
