//! Appraisal report generation (`/generate-pdf`)

pub mod editor;
pub mod generator;
pub mod metadata;
pub mod probe;

pub use editor::DocumentEditor;
pub use generator::{pdf_filename, ReportGenerator, ReportLinks};
pub use probe::{HttpImageProbe, ImageProbe};
