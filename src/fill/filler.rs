//! Applying answers to form fields.

use lopdf::{Dictionary, Object, ObjectId};

use crate::diagnostics::{Diagnostics, Stage};
use crate::document::{encode_text_string, TemplateDocument};
use crate::error::{Error, Result};
use crate::model::AnswerSet;

use super::fields::{on_states, widget_states, FieldKind, FormField, FormFields};

/// Check box and radio "off" state.
const OFF: &str = "Off";

/// Outcome of filling one document.
#[derive(Debug, Clone, Default)]
pub struct FillReport {
    /// Fields that accepted their value, in name order
    pub filled: Vec<String>,
    /// Fields that rejected their value
    pub diagnostics: Diagnostics,
}

/// Fill every field that has an answer.
///
/// Unanswered fields keep their template value and answers without a
/// matching field are ignored. A field that rejects its value is skipped;
/// the rest are still filled.
pub fn fill_fields(
    doc: &mut TemplateDocument,
    fields: &FormFields,
    answers: &AnswerSet,
) -> FillReport {
    let mut report = FillReport::default();
    let mut needs_appearances = false;

    for field in fields.iter() {
        let Some(text) = answers.field_text(&field.name) else {
            continue;
        };

        match apply_value(doc, field, &text) {
            Ok(()) => {
                log::debug!("Filled {} field '{}'", field.kind, field.name);
                needs_appearances |= matches!(field.kind, FieldKind::Text | FieldKind::Choice);
                report.filled.push(field.name.clone());
            }
            Err(e) => report.diagnostics.record(Stage::Field, &field.name, &e),
        }
    }

    if needs_appearances {
        if let Err(e) = set_need_appearances(doc) {
            report.diagnostics.record(Stage::Field, "AcroForm", &e);
        }
    }

    report
}

/// Write `text` into one field according to its kind.
pub fn apply_value(doc: &mut TemplateDocument, field: &FormField, text: &str) -> Result<()> {
    match &field.kind {
        FieldKind::Text | FieldKind::Choice => {
            field_dict_mut(doc, field, field.id)?.set("V", encode_text_string(text));
            // Cached appearances still show the template value
            for &widget in &field.widgets {
                field_dict_mut(doc, field, widget)?.remove(b"AP");
            }
            Ok(())
        }
        FieldKind::CheckBox => {
            let state = checkbox_state(doc, field, text)?;
            set_button_state(doc, field, &state)
        }
        FieldKind::Radio => {
            if text != OFF && !on_states(doc, &field.widgets).contains(text) {
                return Err(rejected(
                    field,
                    format!("'{}' is not one of the radio options", text),
                ));
            }
            set_button_state(doc, field, text)
        }
        FieldKind::PushButton => Err(rejected(field, "push buttons hold no value")),
        FieldKind::Signature => Err(rejected(field, "signature fields cannot be filled")),
        FieldKind::Unknown(ft) => Err(rejected(field, format!("unsupported field type /{}", ft))),
    }
}

/// Pick the appearance state a check box should show for `text`.
fn checkbox_state(doc: &TemplateDocument, field: &FormField, text: &str) -> Result<String> {
    if text == OFF {
        return Ok(OFF.to_string());
    }

    let states = on_states(doc, &field.widgets);
    if states.contains(text) {
        return Ok(text.to_string());
    }
    if text == "Yes" {
        // Check boxes name their on state freely ("1", "On", "Checked", ...)
        match states.len() {
            0 => return Ok(text.to_string()),
            1 => return Ok(states.into_iter().next().unwrap_or_default()),
            _ => {}
        }
    }

    Err(rejected(
        field,
        format!("'{}' is not an appearance state of this check box", text),
    ))
}

/// Set `/V` on the field and `/AS` on each widget.
///
/// A widget shows `state` if it declares that appearance (or declares none)
/// and `Off` otherwise, which is how radio kids stay mutually exclusive.
fn set_button_state(doc: &mut TemplateDocument, field: &FormField, state: &str) -> Result<()> {
    let widget_states: Vec<(ObjectId, bool)> = field
        .widgets
        .iter()
        .map(|&widget| {
            let declared = widget_states(doc, widget);
            let shows = declared.is_empty() || declared.iter().any(|s| s == state);
            (widget, shows)
        })
        .collect();

    field_dict_mut(doc, field, field.id)?.set("V", Object::Name(state.as_bytes().to_vec()));
    for (widget, shows) in widget_states {
        let appearance = if shows { state } else { OFF };
        field_dict_mut(doc, field, widget)?
            .set("AS", Object::Name(appearance.as_bytes().to_vec()));
    }
    Ok(())
}

/// Ask viewers to regenerate field appearances from `/V`.
fn set_need_appearances(doc: &mut TemplateDocument) -> Result<()> {
    let raw = doc.raw_doc_mut();
    let catalog_id = raw.trailer.get(b"Root")?.as_reference()?;

    let acroform_ref = match raw.get_dictionary(catalog_id)?.get(b"AcroForm")? {
        Object::Reference(id) => Some(*id),
        _ => None,
    };
    let acroform: &mut Dictionary = match acroform_ref {
        Some(id) => raw.get_object_mut(id)?.as_dict_mut()?,
        None => raw
            .get_object_mut(catalog_id)?
            .as_dict_mut()?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?,
    };
    acroform.set("NeedAppearances", Object::Boolean(true));
    Ok(())
}

fn field_dict_mut<'a>(
    doc: &'a mut TemplateDocument,
    field: &FormField,
    id: ObjectId,
) -> Result<&'a mut Dictionary> {
    doc.raw_doc_mut()
        .get_object_mut(id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|e| rejected(field, format!("field object is unusable: {}", e)))
}

fn rejected(field: &FormField, reason: impl Into<String>) -> Error {
    Error::Field {
        name: field.name.clone(),
        reason: reason.into(),
    }
}
