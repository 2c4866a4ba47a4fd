use std::io::{self, Write};

use colored::Colorize;
use comfy_table::{Cell, Color, Table};

use crate::catalog::Catalog;
use crate::{CalculationResult, Discipline, Zone};

fn zone_color(zone: Zone) -> Color {
    match zone {
        Zone::Green => Color::Green,
        Zone::Yellow => Color::Yellow,
        Zone::Red => Color::Red,
        Zone::Blocking => Color::DarkRed,
    }
}

impl CalculationResult {
    /// Write the full human-readable report to the given writer: tier
    /// verdict, utilization per discipline, purchase list and the decision
    /// log.
    pub fn write_report<W: Write>(&self, catalog: &Catalog, mut writer: W) -> io::Result<()> {
        let verdict = if self.compliant {
            "COMPLIANT".green().bold()
        } else {
            "NOT COMPLIANT".red().bold()
        };
        writeln!(
            writer,
            "{} {} [{}] {}",
            "Feature set:".bold(),
            self.tier.name,
            self.tier.code,
            verdict
        )?;
        writeln!(writer, "Reason: {}", self.tier_reason)?;
        writeln!(writer)?;

        self.write_utilization_table(catalog, &mut writer)?;
        writeln!(writer)?;
        self.write_purchase_table(&mut writer)?;
        writeln!(writer)?;

        writeln!(writer, "{}", "Decision log:".bold())?;
        for (index, entry) in self.explanations.iter().enumerate() {
            writeln!(writer, "{:>3}. {}", index + 1, entry)?;
        }
        Ok(())
    }

    /// Write the per-discipline utilization table, colored by zone.
    pub fn write_utilization_table<W: Write>(
        &self,
        catalog: &Catalog,
        mut writer: W,
    ) -> io::Result<()> {
        writeln!(writer, "Legend:")?;
        let mut legend = Table::new();
        legend.load_preset(comfy_table::presets::NOTHING);
        legend.set_content_arrangement(comfy_table::ContentArrangement::Disabled);
        legend.add_row(vec![
            Cell::new("■").fg(Color::Green),
            Cell::new("comfortable headroom"),
            Cell::new("  "),
            Cell::new("■").fg(Color::Red),
            Cell::new("at licensed capacity"),
        ]);
        legend.add_row(vec![
            Cell::new("■").fg(Color::Yellow),
            Cell::new("approaching capacity"),
            Cell::new("  "),
            Cell::new("■").fg(Color::DarkRed),
            Cell::new("cannot be licensed"),
        ]);
        writeln!(writer, "{legend}")?;

        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);
        table.set_header(vec![
            "Discipline",
            "Unit",
            "Requested",
            "Licensed",
            "Utilization",
            "Zone",
            "Note",
        ]);

        for (&discipline, utilization) in &self.utilization {
            let color = zone_color(utilization.zone);
            table.add_row(vec![
                Cell::new(discipline.label()),
                Cell::new(catalog.unit(discipline)),
                Cell::new(utilization.requested.to_string()),
                Cell::new(utilization.licensed.to_string()),
                Cell::new(format!("{:.0}%", utilization.ratio * 100.0)),
                Cell::new(utilization.zone.to_string()).fg(color),
                Cell::new(utilization.message.as_deref().unwrap_or_default()),
            ]);
        }
        writeln!(writer, "{table}")?;
        Ok(())
    }

    /// Write the purchase list: the feature set itself plus every BOM line.
    pub fn write_purchase_table<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);
        table.set_header(vec![
            "Qty",
            "Code",
            "Part Number",
            "Discipline",
            "Capacity",
        ]);

        table.add_row(vec![
            Cell::new("1"),
            Cell::new(&self.tier.code),
            Cell::new(&self.tier.part_number),
            Cell::new("feature set"),
            Cell::new(""),
        ]);
        for line in &self.bom {
            table.add_row(vec![
                Cell::new(line.quantity.to_string()),
                Cell::new(&line.code),
                Cell::new(&line.part_number),
                Cell::new(line.discipline.key()),
                Cell::new(format!("{} x {} = {}", line.quantity, line.unit_capacity, line.total_capacity)),
            ]);
        }
        writeln!(writer, "{table}")?;
        Ok(())
    }
}

impl Catalog {
    /// Write the tier overview table.
    pub fn write_tier_table<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        table.set_header(vec![
            "Tier",
            "Name",
            "Code",
            "Part Number",
            "Advanced",
            "Embedded",
        ]);
        for tier in self.tiers.values() {
            let embedded = tier
                .embedded
                .iter()
                .map(|(d, q)| format!("{} {}", d.key(), q))
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                Cell::new(tier.id.to_string()),
                Cell::new(&tier.name),
                Cell::new(&tier.code),
                Cell::new(&tier.part_number),
                Cell::new(if tier.allows_advanced { "yes" } else { "no" }),
                Cell::new(embedded),
            ]);
        }
        writeln!(writer, "{table}")?;
        Ok(())
    }

    /// Write the expansion package price list.
    pub fn write_package_table<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        table.set_header(vec!["Discipline", "Code", "Part Number", "Size", "Unit"]);
        for discipline in Discipline::ALL {
            for package in self.packages(discipline) {
                table.add_row(vec![
                    Cell::new(discipline.label()),
                    Cell::new(&package.code),
                    Cell::new(&package.part_number),
                    Cell::new(package.size.to_string()),
                    Cell::new(self.unit(discipline)),
                ]);
            }
        }
        writeln!(writer, "{table}")?;
        Ok(())
    }
}
