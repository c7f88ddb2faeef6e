//! Export orchestration.
//!
//! An export opens the template, fills its form fields, stamps the page-one
//! overlays and installs the re-serialized bytes at the draft's location
//! under the per-user exports tree. Only infrastructure failures abort the
//! export; field and overlay problems end up in the outcome's diagnostics.

mod options;
mod writer;

pub use options::{
    ExportOptions, RetryPolicy, TextOverlayMode, WriteStrategy, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY,
};
pub use writer::{install_artifact, write_with_retry};

use std::fs;
use std::io;
use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::document::TemplateDocument;
use crate::error::{Error, Result};
use crate::fill::{fill_fields, FormFields};
use crate::model::ExportRequest;
use crate::overlay::{apply_overlays, ImageOverlay, Overlay, TextOverlay};

/// Result of a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    /// Absolute path of the written artifact
    pub path: PathBuf,
    /// Size of the artifact in bytes
    pub bytes_written: usize,
    /// Fields that took their answer
    pub filled: Vec<String>,
    /// Fields and overlays that were skipped
    pub diagnostics: Diagnostics,
}

/// Fills templates and writes the results to the exports tree.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    options: ExportOptions,
}

impl PdfExporter {
    /// Create an exporter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an exporter with custom options.
    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// The exporter's options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export one draft and return the absolute path of the artifact.
    pub fn export(&self, request: &ExportRequest) -> Result<PathBuf> {
        self.export_with_report(request).map(|outcome| outcome.path)
    }

    /// Export one draft and return the path along with what was skipped.
    pub fn export_with_report(&self, request: &ExportRequest) -> Result<ExportOutcome> {
        let location = request.location()?;
        fs::create_dir_all(&location.directory).map_err(|source| Error::CreateDir {
            path: location.directory.clone(),
            source,
        })?;

        let data = read_template(request)?;
        let (bytes, filled, diagnostics) = self.render(&data, request)?;

        install_artifact(
            &location.file,
            &bytes,
            self.options.write_strategy,
            &self.options.retry,
        )?;

        log::debug!(
            "Exported draft '{}' for user '{}' to {} ({} bytes, {} skipped)",
            request.draft_id,
            request.user_id,
            location.file.display(),
            bytes.len(),
            diagnostics.len()
        );

        Ok(ExportOutcome {
            path: location.file,
            bytes_written: bytes.len(),
            filled,
            diagnostics,
        })
    }

    /// Export independent drafts in parallel.
    ///
    /// Results come back in request order. Requests for the same draft/user
    /// pair race each other; callers that need last-writer-wins must not
    /// batch them together.
    pub fn export_batch(&self, requests: &[ExportRequest]) -> Vec<Result<ExportOutcome>> {
        requests
            .par_iter()
            .map(|request| self.export_with_report(request))
            .collect()
    }

    /// Export one draft on Tokio's blocking thread pool.
    #[cfg(feature = "async")]
    pub async fn export_async(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let exporter = self.clone();
        tokio::task::spawn_blocking(move || exporter.export_with_report(&request))
            .await
            .map_err(|e| Error::Other(format!("export task failed: {}", e)))?
    }

    /// Produce the filled document bytes without touching the exports tree.
    pub fn render(
        &self,
        template: &[u8],
        request: &ExportRequest,
    ) -> Result<(Vec<u8>, Vec<String>, Diagnostics)> {
        let mut doc = TemplateDocument::load_bytes(template)?;

        let fields = FormFields::collect(&doc)?;
        log::debug!(
            "Template has {} page(s) and {} form field(s)",
            doc.page_count(),
            fields.len()
        );
        let report = fill_fields(&mut doc, &fields, &request.answers);

        let mut diagnostics = report.diagnostics;
        diagnostics.extend(apply_overlays(&mut doc, &self.overlays(request)));

        let bytes = doc.save_to_bytes()?;
        Ok((bytes, report.filled, diagnostics))
    }

    fn overlays(&self, request: &ExportRequest) -> Vec<Box<dyn Overlay + Send + Sync>> {
        let mut overlays: Vec<Box<dyn Overlay + Send + Sync>> = Vec::new();
        if self.options.draws_text_overlay() {
            overlays.push(Box::new(TextOverlay::from_answers(&request.answers)));
        }
        if let Some(path) = &request.drawing_path {
            overlays.push(Box::new(ImageOverlay::new(path)));
        }
        overlays
    }
}

fn read_template(request: &ExportRequest) -> Result<Vec<u8>> {
    let path = &request.template_path;
    if !path.is_file() {
        return Err(Error::TemplateNotFound(path.clone()));
    }

    fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::TemplateNotFound(path.clone()),
        _ => Error::TemplateRead {
            path: path.clone(),
            source,
        },
    })
}
