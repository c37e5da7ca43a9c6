//! PDF rendering of the change report.
//!
//! Rendering strategy: `genpdf` (pure Rust). genpdf embeds TrueType fonts,
//! so a font family has to be found on disk before anything is drawn.

use std::path::PathBuf;

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Document, Element, SimplePageDecorator, fonts};
use tracing::debug;

use crate::csv_export::entry_rows;
use crate::export::{OBTAINED_AT_LABEL, ReportColumns};
use crate::log::ChangeEntry;
use crate::{ReportError, ReportResult};

const FONT_DIRS: &[&str] = &[
    "./fonts",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/dejavu",
    "/System/Library/Fonts",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
];

const TITLE: &str = "Virtual Laboratory - Usage Report";

#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font_dirs: Vec<PathBuf>,
    font_family: String,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            font_dirs: FONT_DIRS.iter().map(PathBuf::from).collect(),
            font_family: "LiberationSans".to_string(),
        }
    }
}

impl PdfRenderer {
    pub fn new(font_dirs: Vec<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            font_dirs,
            font_family: font_family.into(),
        }
    }

    /// Search `dir` before the default locations.
    pub fn with_font_dir(mut self, dir: PathBuf) -> Self {
        self.font_dirs.insert(0, dir);
        self
    }

    pub fn render(
        &self,
        entries: &[ChangeEntry],
        columns: &ReportColumns,
        obtained_at: &str,
    ) -> ReportResult<Vec<u8>> {
        let font_family = self
            .font_dirs
            .iter()
            .filter(|dir| dir.exists())
            .find_map(|dir| fonts::from_files(dir, &self.font_family, None).ok())
            .ok_or_else(|| ReportError::FontsNotFound {
                family: self.font_family.clone(),
                searched: self.font_dirs.clone(),
            })?;

        let mut doc = Document::new(font_family);
        doc.set_title(TITLE);
        doc.set_minimal_conformance();
        doc.set_line_spacing(1.25);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(15);
        doc.set_page_decorator(decorator);

        doc.push(Paragraph::new(TITLE).styled(Style::new().bold().with_font_size(12)));
        doc.push(Break::new(1.0));

        let weights = vec![1; columns.len() + 1];
        for entry in entries {
            let mut table = TableLayout::new(weights.clone());
            table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

            let mut header = table.row();
            for cell in columns.header_row() {
                header.push_element(Paragraph::new(cell).styled(Style::new().bold().with_font_size(6)));
            }
            header.push().map_err(|e| ReportError::Pdf(e.to_string()))?;

            for cells in entry_rows(entry, columns) {
                let mut row = table.row();
                for cell in cells {
                    row.push_element(Paragraph::new(cell).styled(Style::new().with_font_size(6)));
                }
                row.push().map_err(|e| ReportError::Pdf(e.to_string()))?;
            }

            doc.push(table);
            doc.push(Break::new(1.0));
        }

        doc.push(
            Paragraph::new(format!("{OBTAINED_AT_LABEL} {obtained_at}"))
                .styled(Style::new().with_font_size(9)),
        );

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        debug!(bytes = buffer.len(), "pdf rendered");
        Ok(buffer)
    }
}
