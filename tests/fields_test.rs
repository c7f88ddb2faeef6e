//! Integration tests for form field discovery and filling.

mod common;

use fillpdf::fill::{fill_fields, FormFields};
use lopdf::dictionary;
use fillpdf::{list_fields_from_bytes, AnswerSet, FieldKind, TemplateDocument};

#[test]
fn test_list_template_fields() {
    let fields = list_fields_from_bytes(&common::form_template()).unwrap();

    let summary: Vec<_> = fields
        .iter()
        .map(|f| (f.name.as_str(), f.kind.clone(), f.value.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("agree", FieldKind::CheckBox, Some("Off".to_string())),
            ("flag", FieldKind::Text, None),
            ("name", FieldKind::Text, None),
        ]
    );
}

#[test]
fn test_fields_serialize_for_listing() {
    let fields = list_fields_from_bytes(&common::form_template()).unwrap();
    let json = serde_json::to_value(&fields).unwrap();
    assert_eq!(json[0]["name"], "agree");
    assert!(json[1]["value"].is_null());
}

#[test]
fn test_fill_survives_save_and_reload() {
    let mut doc = TemplateDocument::load_bytes(&common::form_template()).unwrap();
    let fields = FormFields::collect(&doc).unwrap();
    let answers = AnswerSet::new()
        .with("name", "Zoë")
        .with("agree", true);

    let report = fill_fields(&mut doc, &fields, &answers);
    assert_eq!(report.filled, vec!["agree", "name"]);

    let bytes = doc.save_to_bytes().unwrap();
    let reloaded = list_fields_from_bytes(&bytes).unwrap();
    let name = reloaded.iter().find(|f| f.name == "name").unwrap();
    assert_eq!(name.value.as_deref(), Some("Zoë"));
    let agree = reloaded.iter().find(|f| f.name == "agree").unwrap();
    assert_eq!(agree.value.as_deref(), Some("Yes"));
}

#[test]
fn test_document_without_form() {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    doc.objects.insert(
        pages_id,
        lopdf::Object::Dictionary(lopdf::dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<lopdf::Object>::new(),
            "Count" => 0,
        }),
    );
    let catalog_id = doc.add_object(lopdf::dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();

    assert!(list_fields_from_bytes(&bytes).unwrap().is_empty());
}
