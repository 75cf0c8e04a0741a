pub mod layout;
pub mod pdf;

pub use layout::{render, RenderedReport};
pub use pdf::{export_pdf, PdfError, EXPORT_FILENAME};
