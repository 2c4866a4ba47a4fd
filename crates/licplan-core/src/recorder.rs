//! Ordered narration of one calculation.
//!
//! Every calculation owns a fresh recorder; entries are only ever appended,
//! so the final list reads as the decision sequence. The recorder owns the
//! message wording; callers hand it structured facts.

use crate::catalog::TierDef;
use crate::optimizer::Strategy;
use crate::{BomLine, Discipline, ValidationError};

#[derive(Debug, Default)]
pub struct ExplanationRecorder {
    entries: Vec<String>,
}

impl ExplanationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a free-form entry.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// A compact hard limit was exceeded during validation.
    pub fn limit_failure(&mut self, error: &ValidationError) {
        self.push(format!("Compact check failed: {}", error.message));
    }

    /// The selector (or the guard fallback) settled on a tier.
    pub fn tier_decision(&mut self, tier: &TierDef, reason: &str) {
        self.push(format!("Selected feature set [{}]: {}", tier.code, reason));
    }

    /// Embedded tier capacity was applied before purchasing.
    pub fn embedded_deduction(
        &mut self,
        discipline: Discipline,
        unit: &str,
        embedded: u32,
        requested: u32,
        deficit: u64,
    ) {
        self.push(format!(
            "{}: deducted {} embedded {} (requested {}, deficit {})",
            discipline.key(),
            embedded,
            unit,
            requested,
            deficit
        ));
    }

    /// One purchased BOM line.
    pub fn bom_line(&mut self, line: &BomLine, strategy: Strategy) {
        let label = match strategy {
            Strategy::Exact => "minimum waste",
            Strategy::Bounded => "bounded search",
        };
        self.push(format!("  + {} x {} ({})", line.quantity, line.code, label));
    }

    /// A deficit remained that no purchasable package covers.
    pub fn no_coverage(&mut self, discipline: Discipline, unit: &str, deficit: u64) {
        self.push(format!(
            "{}: no purchasable package covers the remaining {} {}",
            discipline.key(),
            deficit,
            unit
        ));
    }

    /// The post-BOM guard rejected a compact result.
    pub fn guard_failure(&mut self, detail: &str) {
        self.push(format!(
            "Compact BOM rejected: {detail}. Switching to the standard feature set"
        ));
    }

    /// Closing entry of every calculation.
    pub fn final_summary(&mut self, tier: &TierDef, reason: &str, compliant: bool) {
        self.push(format!(
            "Final: {} ({}), compliant={}, reason: {}",
            tier.name, tier.code, compliant, reason
        ));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
