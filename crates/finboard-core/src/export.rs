//! CSV export of pivot grids

use crate::error::{CoreError, CoreResult};
use crate::pivot::{DayAmounts, PivotTable};
use finboard_utils::format_decimal;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub decimal_places: u32,
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            delimiter: b',',
        }
    }
}

fn export_error(e: csv::Error) -> CoreError {
    CoreError::Export {
        message: e.to_string(),
    }
}

fn amount_cells(days: &DayAmounts, total: rust_decimal::Decimal, places: u32) -> Vec<String> {
    days.values()
        .map(|amount| format_decimal(*amount, places))
        .chain(std::iter::once(format_decimal(total, places)))
        .collect()
}

/// Write `table` as CSV.
///
/// Columns are `Group, Item, 1..N, Total`. Each group row is followed by
/// its children, and a final `Total` row carries the column totals.
pub fn write_pivot_csv<W: Write>(
    table: &PivotTable,
    writer: W,
    options: &ExportOptions,
) -> CoreResult<()> {
    let places = options.decimal_places;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    let mut header = vec!["Group".to_string(), "Item".to_string()];
    header.extend(table.month.days().map(|day| day.to_string()));
    header.push("Total".to_string());
    wtr.write_record(&header).map_err(export_error)?;

    for group in &table.groups {
        let mut row = vec![group.label.clone(), String::new()];
        row.extend(amount_cells(&group.totals_by_day, group.total, places));
        wtr.write_record(&row).map_err(export_error)?;

        for child in &group.children {
            let mut row = vec![String::new(), child.description.clone()];
            row.extend(amount_cells(&child.amounts_by_day, child.total, places));
            wtr.write_record(&row).map_err(export_error)?;
        }
    }

    let mut footer = vec!["Total".to_string(), String::new()];
    footer.extend(amount_cells(&table.totals_by_day, table.grand_total, places));
    wtr.write_record(&footer).map_err(export_error)?;

    wtr.flush()?;
    log::debug!(
        "exported pivot for {} ({} groups)",
        table.month,
        table.groups.len()
    );
    Ok(())
}

/// Write `table` to a CSV file at `path`
pub fn export_pivot_csv(table: &PivotTable, path: &Path, options: &ExportOptions) -> CoreResult<()> {
    let file = File::create(path)?;
    write_pivot_csv(table, file, options)?;
    log::info!("wrote {}", path.display());
    Ok(())
}
