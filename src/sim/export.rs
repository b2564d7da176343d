//! CSV export of the hourly dispatch trace.
//!
//! The downstream metrics/reporting collaborator derives RE penetration,
//! excess power, LCOE, and fuel consumption from this trace; none of those are
//! computed here.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::dispatch::DispatchResult;

/// Column header for the hourly trace export.
const HEADER: &str = "hour,load_mw,pv_mw,wind_mw,diesel_mw,\
                      battery_charge_mw,battery_discharge_mw,deficit_mw,soc";

/// Exports a dispatch trace to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(result: &DispatchResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(result, buf)
}

/// Writes a dispatch trace as CSV to any writer.
///
/// One row per hour. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(result: &DispatchResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for t in 0..result.load_mw.len() {
        wtr.write_record(&[
            t.to_string(),
            format!("{:.6}", result.load_mw[t]),
            format!("{:.6}", result.pv_mw[t]),
            format!("{:.6}", result.wind_mw[t]),
            format!("{:.6}", result.diesel_mw[t]),
            format!("{:.6}", result.battery_charge_mw[t]),
            format!("{:.6}", result.battery_discharge_mw[t]),
            format!("{:.6}", result.deficit_mw[t]),
            format!("{:.6}", result.soc[t]),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
