//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, Stream};

/// A one-page letter-size form with a text field `name`, a text field
/// `flag` and a check box `agree` whose on state is `Yes`.
pub fn form_template() -> Vec<u8> {
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
        "Subtype" => "Widget",
        "Rect" => vec![50.into(), 600.into(), 250.into(), 620.into()],
        "P" => page_id,
    });
    let flag = doc.add_object(dictionary! {
        "FT" => "Tx",
        "T" => Object::string_literal("flag"),
        "Subtype" => "Widget",
        "Rect" => vec![50.into(), 570.into(), 250.into(), 590.into()],
        "P" => page_id,
    });
    let agree = doc.add_object(dictionary! {
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "V" => "Off",
        "AS" => "Off",
        "Subtype" => "Widget",
        "Rect" => vec![50.into(), 540.into(), 62.into(), 552.into()],
        "P" => page_id,
        "AP" => dictionary! { "N" => dictionary! { "Yes" => on, "Off" => off } },
    });

    let acroform = doc.add_object(dictionary! {
        "Fields" => vec![
            Object::Reference(name),
            Object::Reference(flag),
            Object::Reference(agree),
        ],
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Scratch layout: a template file and a content root two levels below the
/// directory that receives `storage/exports`.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub template: PathBuf,
    pub content_root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.pdf");
        fs::write(&template, form_template()).unwrap();
        let content_root = dir.path().join("app").join("content");
        fs::create_dir_all(&content_root).unwrap();
        Self {
            dir,
            template,
            content_root,
        }
    }

    /// Where an export for this pair must land.
    pub fn expected_output(&self, user_id: &str, draft_id: &str) -> PathBuf {
        self.dir
            .path()
            .join("storage")
            .join("exports")
            .join(user_id)
            .join(format!("{}.pdf", draft_id))
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Decoded content streams of page one.
pub fn page_one_content(pdf: &Path) -> String {
    let doc = Document::load(pdf).unwrap();
    let page = *doc.get_pages().values().next().unwrap();
    String::from_utf8_lossy(&doc.get_page_content(page).unwrap()).to_string()
}

/// Current value of a field in a written PDF.
pub fn field_value(pdf: &Path, name: &str) -> Option<String> {
    fillpdf::list_fields(pdf)
        .unwrap()
        .into_iter()
        .find(|field| field.name == name)
        .and_then(|field| field.value)
}
