//! Append-only log of accepted control changes.

use pl_core::{ControlKey, Snapshot};
use tracing::{debug, info};

use crate::export::{ExportFormat, ReportColumns};
use crate::{ReportError, ReportResult, csv_export, pdf_export::PdfRenderer};

/// The single control the user changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub key: ControlKey,
    pub value: String,
}

/// One before/changed/after record. Entries own copies of their snapshots
/// and expose them read-only, so nothing can alter an entry once logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    before: Snapshot,
    changed: Change,
    after: Snapshot,
}

impl ChangeEntry {
    pub fn before(&self) -> &Snapshot {
        &self.before
    }

    pub fn changed(&self) -> &Change {
        &self.changed
    }

    pub fn after(&self) -> &Snapshot {
        &self.after
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    entries: Vec<ChangeEntry>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry; `before` and `after` are copied. Returns the
    /// entry's position in the log.
    pub fn take_note(
        &mut self,
        before: &Snapshot,
        key: &ControlKey,
        value: &str,
        after: &Snapshot,
    ) -> usize {
        let index = self.entries.len();
        debug!(%key, value, index, "change noted");
        self.entries.push(ChangeEntry {
            before: before.clone(),
            changed: Change {
                key: key.clone(),
                value: value.to_string(),
            },
            after: after.clone(),
        });
        index
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            info!(entries = self.entries.len(), "report cleared");
        }
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the log in `format`, stamped with the current local time.
    pub fn export(&self, format: ExportFormat, columns: &ReportColumns) -> ReportResult<Vec<u8>> {
        self.export_with(format, columns, &PdfRenderer::default())
    }

    pub fn export_with(
        &self,
        format: ExportFormat,
        columns: &ReportColumns,
        pdf: &PdfRenderer,
    ) -> ReportResult<Vec<u8>> {
        if self.entries.is_empty() {
            return Err(ReportError::Empty);
        }
        let obtained_at = chrono::Local::now().format("%d/%m/%Y %H:%M:%S").to_string();
        let bytes = match format {
            ExportFormat::Csv => csv_export::render_csv(&self.entries, columns, &obtained_at)?,
            ExportFormat::Pdf => pdf.render(&self.entries, columns, &obtained_at)?,
        };
        info!(?format, entries = self.entries.len(), bytes = bytes.len(), "report exported");
        Ok(bytes)
    }
}
