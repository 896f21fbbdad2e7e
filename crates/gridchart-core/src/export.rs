// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridchart.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! CSV export of a windowed column selection.

use std::io::Write;

use crate::window::TableWindow;

pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write `timestamp` plus `columns` for every row of `window`.
///
/// Missing cells become empty fields. Columns unknown to the table are
/// skipped. Returns the number of data rows written.
pub fn write_window_csv<W: Write, S: AsRef<str>>(
    window: &TableWindow<'_>,
    columns: &[S],
    writer: W,
) -> csv::Result<usize> {
    let selected: Vec<(&str, &[Option<f64>])> = columns
        .iter()
        .filter_map(|c| window.column(c.as_ref()).map(|cells| (c.as_ref(), cells)))
        .collect();

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(selected.len() + 1);
    header.push("timestamp");
    header.extend(selected.iter().map(|(name, _)| *name));
    csv_writer.write_record(&header)?;

    for (row, ts) in window.timestamps().iter().enumerate() {
        let mut record = Vec::with_capacity(selected.len() + 1);
        record.push(ts.format(EXPORT_TIMESTAMP_FORMAT).to_string());
        record.extend(
            selected
                .iter()
                .map(|(_, cells)| cells[row].map(|v| v.to_string()).unwrap_or_default()),
        );
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(window.len())
}
