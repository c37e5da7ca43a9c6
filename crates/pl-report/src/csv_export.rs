//! CSV rendering of the change report.

use crate::ReportResult;
use crate::export::{
    AFTER_LABEL, BEFORE_LABEL, CHANGE_LABEL, OBTAINED_AT_LABEL, ReportColumns,
};
use crate::log::ChangeEntry;

/// Rows printed for one entry, header excluded.
pub(crate) fn entry_rows(entry: &ChangeEntry, columns: &ReportColumns) -> [Vec<String>; 3] {
    let snapshot_row = |label: &str, snapshot: &pl_core::Snapshot| -> Vec<String> {
        std::iter::once(label.to_string())
            .chain(
                columns
                    .keys()
                    .map(|k| snapshot.get(k.as_str()).unwrap_or_default().to_string()),
            )
            .collect()
    };

    let change_row = std::iter::once(CHANGE_LABEL.to_string())
        .chain(columns.keys().map(|k| {
            if *k == entry.changed().key {
                entry.changed().value.clone()
            } else {
                String::new()
            }
        }))
        .collect();

    [
        snapshot_row(BEFORE_LABEL, entry.before()),
        change_row,
        snapshot_row(AFTER_LABEL, entry.after()),
    ]
}

pub fn render_csv(
    entries: &[ChangeEntry],
    columns: &ReportColumns,
    obtained_at: &str,
) -> ReportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(columns.header_row())?;
    let spacer = vec![String::new(); columns.len() + 1];
    for entry in entries {
        for row in entry_rows(entry, columns) {
            writer.write_record(&row)?;
        }
        writer.write_record(&spacer)?;
    }
    writer.write_record([OBTAINED_AT_LABEL, obtained_at])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::ReportError::Io(e.into_error()))?;
    Ok(bytes)
}
