use std::collections::BTreeMap;
use std::fmt::Display;

use comfy_table::{presets::NOTHING, Attribute, Cell, CellAlignment, Color, Table};

use crate::constants;
use crate::types;

pub struct Pretty {
    display_group: bool,
    report: types::Report,
}

impl Pretty {
    pub fn new(display_group: bool, report: types::Report) -> Self {
        Self {
            display_group,
            report,
        }
    }

    /// Verbs present in the report, known ones first in their usual order.
    fn verbs(&self) -> Vec<String> {
        let mut verbs = self
            .report
            .results
            .iter()
            .map(|r| r.verb.clone())
            .collect::<Vec<String>>();
        verbs.sort_by_key(|v| {
            (
                constants::CERT_MANAGER_VERBS
                    .iter()
                    .position(|known| known == v)
                    .unwrap_or(constants::CERT_MANAGER_VERBS.len()),
                v.clone(),
            )
        });
        verbs.dedup();
        verbs
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(NOTHING);

        let verbs = self.verbs();
        let column_count = verbs.len() + if self.display_group { 2 } else { 1 };

        let mut titles = Vec::with_capacity(column_count);
        if self.display_group {
            titles.push(Cell::new("Group").add_attribute(Attribute::Bold));
        }
        titles.push(Cell::new("Resource").add_attribute(Attribute::Bold));
        titles.extend(
            verbs
                .iter()
                .map(|v| Cell::new(v).add_attribute(Attribute::Bold))
                .collect::<Vec<Cell>>(),
        );
        table.set_header(titles);

        let mut rows: BTreeMap<&types::ReviewTarget, BTreeMap<&str, bool>> = BTreeMap::new();
        for result in &self.report.results {
            rows.entry(&result.target)
                .or_default()
                .insert(result.verb.as_str(), result.allowed);
        }

        rows.iter().for_each(|(target, items)| {
            let mut row: Vec<Cell> = Vec::with_capacity(column_count);
            if self.display_group {
                row.push(Cell::new(target.group()));
            }
            if self.display_group {
                row.push(Cell::new(target.name()));
            } else {
                row.push(Cell::new(target.key()));
            }
            row.extend(
                verbs
                    .iter()
                    .map(|v| match items.get(v.as_str()) {
                        Some(true) => Cell::new("✔")
                            .fg(Color::AnsiValue(34))
                            .set_alignment(CellAlignment::Center),
                        Some(false) => Cell::new("✖")
                            .fg(Color::Red)
                            .set_alignment(CellAlignment::Center),
                        None => Cell::new(""),
                    })
                    .collect::<Vec<Cell>>(),
            );
            table.add_row(row);
        });

        table
    }
}

impl Display for Pretty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.table().fmt(f)?;
        for warning in &self.report.warnings {
            write!(f, "\nwarning: {}", warning)?;
        }
        Ok(())
    }
}
