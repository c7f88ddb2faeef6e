//! AcroForm field collection.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use lopdf::{Dictionary, Object, ObjectId};
use serde::Serialize;

use crate::document::{decode_text_string, TemplateDocument};
use crate::error::Result;

/// `/Ff` bit 16: radio button group
pub const FLAG_RADIO: i64 = 1 << 15;
/// `/Ff` bit 17: push button
pub const FLAG_PUSHBUTTON: i64 = 1 << 16;

/// Kind of interactive form field, from `/FT` and `/Ff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    CheckBox,
    Radio,
    PushButton,
    Choice,
    Signature,
    Unknown(String),
}

impl FieldKind {
    fn from_type(field_type: &[u8], flags: i64) -> Self {
        match field_type {
            b"Tx" => FieldKind::Text,
            b"Ch" => FieldKind::Choice,
            b"Sig" => FieldKind::Signature,
            b"Btn" if flags & FLAG_PUSHBUTTON != 0 => FieldKind::PushButton,
            b"Btn" if flags & FLAG_RADIO != 0 => FieldKind::Radio,
            b"Btn" => FieldKind::CheckBox,
            other => FieldKind::Unknown(String::from_utf8_lossy(other).to_string()),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::CheckBox => write!(f, "checkbox"),
            FieldKind::Radio => write!(f, "radio"),
            FieldKind::PushButton => write!(f, "pushbutton"),
            FieldKind::Choice => write!(f, "choice"),
            FieldKind::Signature => write!(f, "signature"),
            FieldKind::Unknown(ft) => write!(f, "unknown ({})", ft),
        }
    }
}

/// Handle to one terminal form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Fully qualified name (`parent.child`)
    pub name: String,
    /// The field dictionary
    pub id: ObjectId,
    /// Field kind, with `/FT` and `/Ff` inherited from ancestors
    pub kind: FieldKind,
    /// Field flags (`/Ff`)
    pub flags: i64,
    /// Widget annotations; the field itself when field and widget are merged
    pub widgets: Vec<ObjectId>,
}

/// Summary of a field for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<String>,
}

/// All terminal fields of a document, by fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    fields: BTreeMap<String, FormField>,
}

impl FormFields {
    /// Collect fields from the catalog's `/AcroForm /Fields` tree.
    ///
    /// A document without an AcroForm has no fields; that is not an error.
    pub fn collect(doc: &TemplateDocument) -> Result<Self> {
        let mut collected = Self::default();

        let Some(roots) = field_roots(doc) else {
            log::debug!("Template has no AcroForm fields");
            return Ok(collected);
        };

        let mut visited = HashSet::new();
        for root in roots {
            match root {
                Object::Reference(id) => {
                    collected.walk(doc, id, "", None, 0, &mut visited);
                }
                other => log::debug!("Skipping direct field object {:?}", other),
            }
        }

        log::debug!("Collected {} form field(s)", collected.fields.len());
        Ok(collected)
    }

    fn walk(
        &mut self,
        doc: &TemplateDocument,
        id: ObjectId,
        parent_name: &str,
        inherited_type: Option<Vec<u8>>,
        inherited_flags: i64,
        visited: &mut HashSet<ObjectId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let Ok(dict) = doc.raw_doc().get_dictionary(id) else {
            return;
        };

        let partial = dict
            .get(b"T")
            .ok()
            .and_then(|obj| doc.resolve(obj))
            .and_then(string_bytes)
            .map(decode_text_string)
            .unwrap_or_default();
        let name = match (parent_name.is_empty(), partial.is_empty()) {
            (true, _) => partial,
            (false, true) => parent_name.to_string(),
            (false, false) => format!("{}.{}", parent_name, partial),
        };

        let field_type = dict
            .get(b"FT")
            .ok()
            .and_then(|obj| doc.resolve(obj))
            .and_then(|obj| match obj {
                Object::Name(n) => Some(n.clone()),
                _ => None,
            })
            .or(inherited_type);
        let flags = dict
            .get(b"Ff")
            .ok()
            .and_then(|obj| doc.resolve(obj))
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(inherited_flags);

        let mut child_fields = Vec::new();
        let mut widgets = Vec::new();
        for kid in kids(doc, dict) {
            match doc.raw_doc().get_dictionary(kid) {
                Ok(kid_dict) if kid_dict.has(b"T") => {
                    if !visited.contains(&kid) {
                        child_fields.push(kid);
                    }
                }
                Ok(_) => widgets.push(kid),
                Err(_) => {}
            }
        }

        if !child_fields.is_empty() {
            for kid in child_fields {
                self.walk(doc, kid, &name, field_type.clone(), flags, visited);
            }
            return;
        }

        let Some(field_type) = field_type else {
            return;
        };
        if name.is_empty() {
            return;
        }
        if widgets.is_empty() {
            widgets.push(id);
        }

        let field = FormField {
            name: name.clone(),
            id,
            kind: FieldKind::from_type(&field_type, flags),
            flags,
            widgets,
        };
        self.fields.entry(name).or_insert(field);
    }

    /// Look up a field by fully qualified name.
    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.get(name)
    }

    /// Fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = &FormField> {
        self.fields.values()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names, kinds and current values, in name order.
    pub fn describe(&self, doc: &TemplateDocument) -> Vec<FieldInfo> {
        self.iter()
            .map(|field| FieldInfo {
                name: field.name.clone(),
                kind: field.kind.clone(),
                value: current_value(doc, field.id),
            })
            .collect()
    }
}

/// The `/Fields` array of the document's AcroForm.
fn field_roots(doc: &TemplateDocument) -> Option<Vec<Object>> {
    let catalog = doc.raw_doc().catalog().ok()?;
    let acroform = doc.resolve(catalog.get(b"AcroForm").ok()?)?.as_dict().ok()?;
    let fields = doc.resolve(acroform.get(b"Fields").ok()?)?.as_array().ok()?;
    Some(fields.clone())
}

fn kids(doc: &TemplateDocument, dict: &Dictionary) -> Vec<ObjectId> {
    dict.get(b"Kids")
        .ok()
        .and_then(|obj| doc.resolve(obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_reference().ok())
                .collect()
        })
        .unwrap_or_default()
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

/// Current `/V` of a field, rendered as text.
pub fn current_value(doc: &TemplateDocument, id: ObjectId) -> Option<String> {
    let dict = doc.raw_doc().get_dictionary(id).ok()?;
    match doc.resolve(dict.get(b"V").ok()?)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
        Object::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| doc.resolve(item))
                .filter_map(string_bytes)
                .map(decode_text_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

/// Appearance states a widget can show, other than `Off`.
pub fn on_states(doc: &TemplateDocument, widgets: &[ObjectId]) -> BTreeSet<String> {
    widgets
        .iter()
        .flat_map(|&widget| widget_states(doc, widget))
        .filter(|state| state != "Off")
        .collect()
}

/// All `/AP /N` state names declared by one widget.
pub fn widget_states(doc: &TemplateDocument, widget: ObjectId) -> Vec<String> {
    doc.raw_doc()
        .get_dictionary(widget)
        .ok()
        .and_then(|dict| dict.get(b"AP").ok())
        .and_then(|obj| doc.resolve(obj))
        .and_then(|obj| obj.as_dict().ok())
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|obj| doc.resolve(obj))
        .and_then(|obj| obj.as_dict().ok())
        .map(|normal| {
            normal
                .iter()
                .map(|(key, _)| String::from_utf8_lossy(key).to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Stream};

    /// A form with a flat text field, a check box, a radio group and a
    /// hierarchical `address.city` field.
    pub(crate) fn form_doc() -> TemplateDocument {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );

        let on = doc.add_object(Stream::new(dictionary! {}, b"0 g".to_vec()));
        let off = doc.add_object(Stream::new(dictionary! {}, Vec::new()));

        let name = doc.add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("name"),
            "V" => Object::string_literal("default"),
            "Subtype" => "Widget",
            "P" => page_id,
        });
        let agree = doc.add_object(dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal("agree"),
            "V" => "Off",
            "AS" => "Off",
            "Subtype" => "Widget",
            "AP" => dictionary! { "N" => dictionary! { "Checked" => on, "Off" => off } },
        });
        let color = doc.add_object(dictionary! {
            "FT" => "Btn",
            "Ff" => FLAG_RADIO,
            "T" => Object::string_literal("color"),
        });
        let red = doc.add_object(dictionary! {
            "Parent" => color,
            "Subtype" => "Widget",
            "AP" => dictionary! { "N" => dictionary! { "red" => on, "Off" => off } },
        });
        let blue = doc.add_object(dictionary! {
            "Parent" => color,
            "Subtype" => "Widget",
            "AP" => dictionary! { "N" => dictionary! { "blue" => on, "Off" => off } },
        });
        doc.get_object_mut(color)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Kids", vec![Object::Reference(red), Object::Reference(blue)]);

        let address = doc.add_object(dictionary! {
            "T" => Object::string_literal("address"),
            "FT" => "Tx",
        });
        let city = doc.add_object(dictionary! {
            "T" => Object::string_literal("city"),
            "Parent" => address,
            "Subtype" => "Widget",
        });
        doc.get_object_mut(address)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Kids", vec![Object::Reference(city)]);

        let acroform = doc.add_object(dictionary! {
            "Fields" => vec![
                Object::Reference(name),
                Object::Reference(agree),
                Object::Reference(color),
                Object::Reference(address),
            ],
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => acroform,
        });
        doc.trailer.set("Root", catalog_id);
        TemplateDocument::from_document(doc)
    }

    #[test]
    fn test_collect_names_and_kinds() {
        let doc = form_doc();
        let fields = FormFields::collect(&doc).unwrap();

        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["address.city", "agree", "color", "name"]);

        assert_eq!(fields.get("name").unwrap().kind, FieldKind::Text);
        assert_eq!(fields.get("agree").unwrap().kind, FieldKind::CheckBox);
        assert_eq!(fields.get("color").unwrap().kind, FieldKind::Radio);
        // /FT inherited from the non-terminal parent
        assert_eq!(fields.get("address.city").unwrap().kind, FieldKind::Text);
    }

    #[test]
    fn test_radio_widgets_are_kids() {
        let doc = form_doc();
        let fields = FormFields::collect(&doc).unwrap();
        let color = fields.get("color").unwrap();
        assert_eq!(color.widgets.len(), 2);
        assert_eq!(
            on_states(&doc, &color.widgets).into_iter().collect::<Vec<_>>(),
            vec!["blue", "red"]
        );

        let agree = fields.get("agree").unwrap();
        assert_eq!(agree.widgets, vec![agree.id]);
    }

    #[test]
    fn test_describe_reports_current_values() {
        let doc = form_doc();
        let fields = FormFields::collect(&doc).unwrap();
        let info = fields.describe(&doc);

        let name = info.iter().find(|i| i.name == "name").unwrap();
        assert_eq!(name.value.as_deref(), Some("default"));
        let agree = info.iter().find(|i| i.name == "agree").unwrap();
        assert_eq!(agree.value.as_deref(), Some("Off"));
        let city = info.iter().find(|i| i.name == "address.city").unwrap();
        assert_eq!(city.value, None);
    }

    #[test]
    fn test_document_without_acroform() {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let fields = FormFields::collect(&TemplateDocument::from_document(doc)).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_cyclic_kids_terminate() {
        let mut doc = Document::with_version("1.7");
        let parent = doc.new_object_id();
        let child = doc.add_object(dictionary! {
            "T" => Object::string_literal("loop"),
            "Kids" => vec![Object::Reference(parent)],
        });
        doc.objects.insert(
            parent,
            Object::Dictionary(dictionary! {
                "T" => Object::string_literal("root"),
                "FT" => "Tx",
                "Kids" => vec![Object::Reference(child)],
            }),
        );
        let acroform = doc.add_object(dictionary! { "Fields" => vec![Object::Reference(parent)] });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "AcroForm" => acroform,
        });
        doc.trailer.set("Root", catalog_id);

        let fields = FormFields::collect(&TemplateDocument::from_document(doc)).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.get("root.loop").is_some());
    }
}
