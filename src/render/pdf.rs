//! PDF export of a rendered report via `printpdf`.
//!
//! Fixed layout: A4, 20 mm margins, builtin Helvetica fonts. Sections run
//! top to bottom with a descending cursor; a new page is added when the
//! cursor reaches the bottom margin.

use std::io::BufWriter;

use printpdf::*;
use thiserror::Error;

use super::layout::{RenderedReport, NO_ABNORMAL_FINDINGS};

/// Download filename offered to clients.
pub const EXPORT_FILENAME: &str = "blood-test-report.pdf";

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: Mm = Mm(20.0);
const BODY_WRAP: usize = 90;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF generation failed: {0}")]
    Generation(String),
}

/// Render the report to PDF bytes.
pub fn export_pdf(report: &RenderedReport) -> Result<Vec<u8>, PdfError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Blood Test Analysis Report",
        PAGE_WIDTH,
        PAGE_HEIGHT,
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Generation(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Generation(format!("font error: {e}")))?;

    let mut cursor = Cursor {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        y: PAGE_HEIGHT - MARGIN,
    };

    // Title
    cursor.heading("Blood Test Analysis Report", 16.0, &bold);
    cursor.space(Mm(4.0));

    // Patient information
    cursor.heading("Patient Information", 12.0, &bold);
    for (label, value) in [
        ("Name", &report.patient.name),
        ("Age", &report.patient.age),
        ("Sex", &report.patient.sex),
        ("Date", &report.patient.date),
    ] {
        cursor.line(&format!("{label}: {value}"), 10.0, &font);
    }
    cursor.space(Mm(6.0));

    // Category summaries
    if !report.categories.is_empty() {
        cursor.heading("Lab Category Summaries", 12.0, &bold);
        for section in &report.categories {
            cursor.line(section.category, 10.5, &bold);
            cursor.paragraph(&section.summary, 9.5, &font);
            cursor.space(Mm(3.0));
        }
        cursor.space(Mm(3.0));
    }

    // Abnormal findings
    cursor.heading("Abnormal Findings", 12.0, &bold);
    if report.findings.is_empty() {
        cursor.line(NO_ABNORMAL_FINDINGS, 10.0, &font);
    } else {
        for row in &report.findings {
            cursor.line(
                &format!("{} — {}", row.test, row.result),
                10.0,
                &bold,
            );
            cursor.line(
                &format!("Reference range: {}", row.reference_range),
                9.5,
                &font,
            );
            if !row.note.is_empty() {
                cursor.paragraph(&row.note, 9.5, &font);
            }
            cursor.space(Mm(3.0));
        }
    }
    cursor.space(Mm(6.0));

    // Narrative sections
    for (title, body) in [
        ("Overall Summary", &report.summary),
        ("Recommendations", &report.recommendations),
        ("Follow-up", &report.follow_up),
    ] {
        cursor.heading(title, 12.0, &bold);
        cursor.paragraph(body, 10.0, &font);
        cursor.space(Mm(5.0));
    }

    // Disclaimer footer
    cursor.space(Mm(4.0));
    cursor.paragraph(report.disclaimer, 7.5, &font);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| PdfError::Generation(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| PdfError::Generation(format!("buffer error: {e}")))
}

/// Descending layout cursor with automatic page breaks.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
}

impl Cursor<'_> {
    fn ensure_space(&mut self, needed: Mm) {
        if self.y - needed < MARGIN {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn heading(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.ensure_space(Mm(8.0));
        self.layer.use_text(text, size, MARGIN, self.y, font);
        self.y -= Mm(7.0);
    }

    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.ensure_space(Mm(5.0));
        self.layer.use_text(text, size, MARGIN, self.y, font);
        self.y -= Mm(5.0);
    }

    fn paragraph(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        for line in wrap_text(text, BODY_WRAP) {
            self.ensure_space(Mm(4.5));
            self.layer.use_text(&line, size, MARGIN, self.y, font);
            self.y -= Mm(4.5);
        }
    }

    fn space(&mut self, gap: Mm) {
        self.y -= gap;
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AbnormalFinding, CanonicalReport};
    use crate::render::layout::render;

    #[test]
    fn export_produces_pdf_bytes() {
        let rendered = render(&CanonicalReport::default());
        let bytes = export_pdf(&rendered).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_reports_paginate_without_error() {
        let report = CanonicalReport {
            abnormal_findings: (0..60)
                .map(|i| AbnormalFinding {
                    test: Some(format!("Test {i}")),
                    result: Some("out of range".into()),
                    note: Some("explanation ".repeat(30)),
                    ..Default::default()
                })
                .collect(),
            summary: Some("sentence ".repeat(200)),
            ..Default::default()
        };
        let rendered = render(&report);
        let bytes = export_pdf(&rendered).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_respects_max_width() {
        let lines = wrap_text(&"word ".repeat(50), 40);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= 40));
    }

    #[test]
    fn wrap_of_empty_text_yields_one_blank_line() {
        assert_eq!(wrap_text("", 80), vec![String::new()]);
    }
}
