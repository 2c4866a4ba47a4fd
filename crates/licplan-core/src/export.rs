//! CSV sheets of a calculation result.
//!
//! One writer per sheet so callers can lay the files out however they
//! want; the record layouts match the report tables.

use std::io::Write;

use csv::Writer;

use crate::CalculationResult;

impl CalculationResult {
    /// Requirements sheet: requested versus licensed per discipline.
    pub fn write_requirements_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut w = Writer::from_writer(writer);
        w.write_record(["Discipline", "Requested", "Licensed", "Remaining", "Zone"])?;
        for (discipline, utilization) in &self.utilization {
            let remaining = self
                .remaining_capacity
                .get(discipline)
                .copied()
                .unwrap_or(0);
            w.write_record([
                discipline.key().to_string(),
                utilization.requested.to_string(),
                utilization.licensed.to_string(),
                remaining.to_string(),
                utilization.zone.to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    /// Bill-of-materials sheet, feature set first.
    pub fn write_bom_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut w = Writer::from_writer(writer);
        w.write_record([
            "Qty",
            "Code",
            "Part Number",
            "Discipline",
            "Unit Capacity",
            "Total Capacity",
        ])?;
        w.write_record([
            "1".to_string(),
            self.tier.code.clone(),
            self.tier.part_number.clone(),
            "FEATURE_SET".to_string(),
            String::new(),
            String::new(),
        ])?;
        for line in &self.bom {
            w.write_record([
                line.quantity.to_string(),
                line.code.clone(),
                line.part_number.clone(),
                line.discipline.key().to_string(),
                line.unit_capacity.to_string(),
                line.total_capacity.to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    /// Decision log sheet, one numbered entry per record.
    pub fn write_log_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut w = Writer::from_writer(writer);
        w.write_record(["Step", "Decision"])?;
        for (index, entry) in self.explanations.iter().enumerate() {
            w.write_record([(index + 1).to_string(), entry.clone()])?;
        }
        w.flush()?;
        Ok(())
    }
}
