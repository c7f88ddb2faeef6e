//! # fillpdf
//!
//! Template-based PDF export for form drafts.
//!
//! A fixed PDF template is filled with a user's answers, stamped with a
//! "Form Data:" dump of every answer and an optional drawing, and written
//! to a per-user exports tree next to the application's content root.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fillpdf::{export_draft, AnswerSet};
//!
//! fn main() -> fillpdf::Result<()> {
//!     let answers = AnswerSet::from_json(r#"{"name": "Ada", "agree": true}"#)?;
//!
//!     let path = export_draft(
//!         "templates/intake.pdf",
//!         "draft-42",
//!         "user-7",
//!         &answers,
//!         None,
//!         "/srv/app/api/content",
//!     )?;
//!     println!("{}", path.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Form filling**: text, choice, check box and radio fields by qualified name
//! - **Overlays**: answer dump and drawing stamp on page one
//! - **Best-effort**: skipped fields and overlays are reported, not fatal
//! - **Durable writes**: bounded retry of the destination write
//! - **Parallel batches**: uses Rayon for independent drafts

pub mod detect;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod export;
pub mod fill;
pub mod model;
pub mod overlay;

// Re-export commonly used types
pub use detect::{detect_header, PdfHeader};
pub use diagnostics::{Diagnostic, Diagnostics, Stage};
pub use document::TemplateDocument;
pub use error::{Error, Result};
pub use export::{
    ExportOptions, ExportOutcome, PdfExporter, RetryPolicy, TextOverlayMode, WriteStrategy,
};
pub use fill::{FieldInfo, FieldKind, FormFields};
pub use model::{render_value, AnswerSet, ExportLocation, ExportRequest, Rendering};
pub use overlay::{ImageOverlay, Overlay, TextOverlay};

use std::path::{Path, PathBuf};

/// Export a draft with default options and return the artifact's absolute path.
///
/// # Arguments
///
/// * `template_path` - Source PDF template (read-only)
/// * `draft_id` - Output file stem
/// * `user_id` - Output subdirectory under `storage/exports`
/// * `answers` - Field name to value mapping
/// * `drawing_path` - Optional image stamped in the top-right corner of page one
/// * `content_root` - Application content root; the exports tree is two levels up
///
/// # Example
///
/// ```no_run
/// use fillpdf::{export_draft, AnswerSet};
///
/// let answers = AnswerSet::new().with("name", "Ada");
/// let path = export_draft("form.pdf", "d1", "u1", &answers, Some("sig.png".as_ref()), "app/content").unwrap();
/// assert!(path.ends_with("storage/exports/u1/d1.pdf"));
/// ```
pub fn export_draft<P, Q>(
    template_path: P,
    draft_id: &str,
    user_id: &str,
    answers: &AnswerSet,
    drawing_path: Option<&Path>,
    content_root: Q,
) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut request = ExportRequest::new(
        template_path.as_ref(),
        draft_id,
        user_id,
        content_root.as_ref(),
    )
    .with_answers(answers.clone());
    if let Some(drawing) = drawing_path {
        request = request.with_drawing(drawing);
    }

    PdfExporter::new().export(&request)
}

/// List the form fields of a PDF file with their kinds and current values.
///
/// # Example
///
/// ```no_run
/// use fillpdf::list_fields;
///
/// for field in list_fields("form.pdf").unwrap() {
///     println!("{} ({})", field.name, field.kind);
/// }
/// ```
pub fn list_fields<P: AsRef<Path>>(path: P) -> Result<Vec<FieldInfo>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => Error::TemplateNotFound(path.to_path_buf()),
        _ => Error::TemplateRead {
            path: path.to_path_buf(),
            source,
        },
    })?;
    list_fields_from_bytes(&data)
}

/// List the form fields of a PDF held in memory.
pub fn list_fields_from_bytes(data: &[u8]) -> Result<Vec<FieldInfo>> {
    let doc = TemplateDocument::load_bytes(data)?;
    let fields = FormFields::collect(&doc)?;
    Ok(fields.describe(&doc))
}
