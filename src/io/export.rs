//! CSV export for tick reports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::TickReport;

/// Column header for CSV telemetry export.
const HEADER: &str = "tick,day,date,production,demand,price,supplied_dwellings,\
                       total_dwellings,revenue,taxes,maintenance,maintenance_paid,\
                       happiness,money,active_events,population";

/// Exports tick reports to a CSV file at the given path.
///
/// Writes a header row followed by one data row per tick. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `reports` - Tick reports in execution order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(reports: &[TickReport], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(reports, buf)
}

/// Writes tick reports as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(reports: &[TickReport], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in reports {
        wtr.write_record(&[
            r.tick.to_string(),
            r.day.to_string(),
            r.date.clone(),
            r.production.to_string(),
            r.demand.to_string(),
            format!("{:.4}", r.price),
            r.supplied_dwellings.to_string(),
            r.total_dwellings.to_string(),
            r.revenue.to_string(),
            r.taxes.to_string(),
            r.maintenance.to_string(),
            r.maintenance_paid.to_string(),
            r.happiness.to_string(),
            r.money.to_string(),
            r.active_events.to_string(),
            r.population.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
