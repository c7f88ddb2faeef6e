//! The "Form Data:" text block.

use lopdf::content::Operation;
use lopdf::{dictionary, Object, StringFormat};

use crate::diagnostics::{Diagnostics, Stage};
use crate::document::{encode_win_ansi, TemplateDocument};
use crate::error::{Error, Result};
use crate::model::AnswerSet;

use super::Overlay;

/// First line of the block.
pub const HEADER: &str = "Form Data:";

/// Font size in points.
pub const FONT_SIZE: f32 = 8.0;

/// Page margin plus block margin, from the left and top edges.
const INSET: f32 = 36.0 + 10.0;

/// Lines stop above the page's bottom margin.
const BOTTOM_MARGIN: f32 = 36.0;

const LEADING: f32 = FONT_SIZE * 1.2;

/// Audit dump of every submitted answer, whether or not a field matched it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    lines: Vec<String>,
}

impl TextOverlay {
    /// One `name: value` line per answer, in submission order, after the header.
    pub fn from_answers(answers: &AnswerSet) -> Self {
        let mut lines = vec![HEADER.to_string()];
        for line in answers.overlay_lines() {
            lines.extend(line.lines().map(str::to_string));
        }
        Self { lines }
    }

    /// Lines as they will be drawn.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Overlay for TextOverlay {
    fn stage(&self) -> Stage {
        Stage::TextOverlay
    }

    fn subject(&self) -> String {
        HEADER.trim_end_matches(':').to_string()
    }

    fn apply(&self, doc: &mut TemplateDocument, diagnostics: &mut Diagnostics) -> Result<()> {
        let page = doc.first_page()?;
        let media_box = doc.media_box(page)?;

        let x = media_box.llx + INSET;
        let first_baseline = media_box.ury - INSET - FONT_SIZE;
        let lowest_baseline = media_box.lly + BOTTOM_MARGIN;
        if first_baseline < lowest_baseline {
            return Err(Error::Overlay(format!(
                "page is too small for text ({} x {})",
                media_box.width(),
                media_box.height()
            )));
        }
        let fitting = (((first_baseline - lowest_baseline) / LEADING).floor() as usize + 1)
            .min(self.lines.len());

        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        };
        doc.edit_page(page, |doc| {
            let font_name =
                doc.add_page_resource(page, "Font", "FxHelv", Object::Dictionary(font))?;
            doc.append_page_content(page, self.operations(font_name, x, first_baseline, fitting))
        })?;

        let dropped = self.lines.len() - fitting;
        if dropped > 0 {
            diagnostics.push(
                Stage::TextOverlay,
                self.subject(),
                format!("{} line(s) did not fit on page one", dropped),
            );
        }
        Ok(())
    }
}

impl TextOverlay {
    fn operations(
        &self,
        font_name: String,
        x: f32,
        first_baseline: f32,
        fitting: usize,
    ) -> Vec<Operation> {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)]),
            Operation::new(
                "Tf",
                vec![Object::Name(font_name.into_bytes()), Object::Real(FONT_SIZE)],
            ),
            Operation::new("TL", vec![Object::Real(LEADING)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(first_baseline)]),
        ];
        for (i, line) in self.lines[..fitting].iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));
        operations
    }
}
