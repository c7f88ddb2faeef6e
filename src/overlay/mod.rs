//! Page-one overlays.
//!
//! Two independent overlays are stamped onto the first page after field
//! filling: a "Form Data:" dump of every answer in the top-left corner and
//! an optional drawing in the top-right corner. Each one is best-effort; a
//! failure leaves a diagnostic and the export carries on without it.

mod image;
mod text;

pub use self::image::{DecodedImage, ImageOverlay, DRAWING_MARGIN, DRAWING_SIZE};
pub use self::text::{TextOverlay, FONT_SIZE, HEADER};

use crate::diagnostics::{Diagnostics, Stage};
use crate::document::TemplateDocument;
use crate::error::Result;

/// Something drawn on top of a page.
pub trait Overlay {
    /// Stage reported in diagnostics.
    fn stage(&self) -> Stage;

    /// What the overlay draws, for diagnostics and logs.
    fn subject(&self) -> String;

    /// Draw onto `doc`.
    ///
    /// An `Err` means nothing visible was added. Partial results (such as
    /// lines that did not fit) are reported through `diagnostics`.
    fn apply(&self, doc: &mut TemplateDocument, diagnostics: &mut Diagnostics) -> Result<()>;
}

/// Apply overlays in order, recording failures instead of returning them.
pub fn apply_overlays(doc: &mut TemplateDocument, overlays: &[Box<dyn Overlay + Send + Sync>]) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for overlay in overlays {
        match overlay.apply(doc, &mut diagnostics) {
            Ok(()) => log::debug!("Applied {} '{}'", overlay.stage(), overlay.subject()),
            Err(e) => diagnostics.record(overlay.stage(), overlay.subject(), &e),
        }
    }

    diagnostics
}
