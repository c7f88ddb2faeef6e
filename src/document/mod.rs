//! Working document model.
//!
//! Wraps `lopdf::Document` with the handful of page-level operations the
//! export pipeline needs: page-one lookup, inherited page attributes,
//! resource registration and content appending. Everything else goes through
//! [`TemplateDocument::raw_doc`].

mod text;

pub use text::{decode_text_string, encode_text_string, encode_win_ansi};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect::detect_header;
use crate::error::{Error, Result};

/// Bound on `/Parent` and reference chains; malformed files can loop.
const MAX_CHAIN: usize = 32;

/// Page rectangle in default user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl Rect {
    /// Build a rectangle from two corners in any order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }
}

/// An open template, mutated in memory and serialized once at the end.
pub struct TemplateDocument {
    doc: LopdfDocument,
}

impl TemplateDocument {
    /// Parse template bytes.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let header = detect_header(data)?;
        log::debug!("Loading template ({}, {} bytes)", header, data.len());

        let doc = LopdfDocument::load_mem(data).map_err(Error::from)?;
        Ok(Self { doc })
    }

    /// Wrap an already-built document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        Self { doc }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Mutable access to the underlying `lopdf::Document`.
    pub fn raw_doc_mut(&mut self) -> &mut LopdfDocument {
        &mut self.doc
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Object id of page one.
    pub fn first_page(&self) -> Result<ObjectId> {
        self.doc
            .get_pages()
            .into_values()
            .next()
            .ok_or(Error::NoPages)
    }

    /// Follow indirect references to the object they name.
    pub fn resolve<'a>(&'a self, mut obj: &'a Object) -> Option<&'a Object> {
        for _ in 0..MAX_CHAIN {
            match obj {
                Object::Reference(id) => obj = self.doc.get_object(*id).ok()?,
                other => return Some(other),
            }
        }
        None
    }

    /// Look up a page attribute, walking up the page tree for inheritable keys.
    pub fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_CHAIN {
            if let Ok(value) = node.get(key) {
                return self.resolve(value);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// The page's media box, inherited if necessary.
    pub fn media_box(&self, page_id: ObjectId) -> Result<Rect> {
        let array = self
            .inherited_attribute(page_id, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .ok_or_else(|| Error::Overlay("page has no /MediaBox".to_string()))?;

        let coords: Vec<f32> = array
            .iter()
            .filter_map(|item| self.resolve(item).and_then(as_number))
            .collect();

        match coords.as_slice() {
            [x0, y0, x1, y1] => Ok(Rect::new(*x0, *y0, *x1, *y1)),
            _ => Err(Error::Overlay(format!(
                "malformed /MediaBox with {} numeric entries",
                coords.len()
            ))),
        }
    }

    /// Register `value` under a fresh name in the page's `/Resources /<category>`
    /// dictionary and return that name.
    ///
    /// The page gets its own copy of its (possibly shared or inherited)
    /// resources, so other pages never see the new entry.
    pub fn add_page_resource(
        &mut self,
        page_id: ObjectId,
        category: &str,
        prefix: &str,
        value: Object,
    ) -> Result<String> {
        let mut resources = self
            .inherited_attribute(page_id, b"Resources")
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);

        let mut entries = resources
            .get(category.as_bytes())
            .ok()
            .and_then(|obj| self.resolve(obj))
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);

        let mut index = 1usize;
        let name = loop {
            let candidate = format!("{}{}", prefix, index);
            if !entries.has(candidate.as_bytes()) {
                break candidate;
            }
            index += 1;
        };

        entries.set(name.clone(), value);
        resources.set(category, Object::Dictionary(entries));
        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));

        Ok(name)
    }

    /// Append drawing operations to a page.
    ///
    /// Existing content is bracketed by `q`/`Q` so whatever graphics state
    /// the template leaves behind does not apply to the appended operations.
    pub fn append_page_content(
        &mut self,
        page_id: ObjectId,
        operations: Vec<Operation>,
    ) -> Result<()> {
        let encoded = Content { operations }
            .encode()
            .map_err(|e| Error::Overlay(format!("failed to encode content: {}", e)))?;

        let existing: Vec<Object> = match self.doc.get_dictionary(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let mut body = Vec::with_capacity(encoded.len() + 8);
        if !existing.is_empty() {
            body.extend_from_slice(b"Q\n");
        }
        body.extend_from_slice(b"q\n");
        body.extend_from_slice(&encoded);
        body.extend_from_slice(b"\nQ\n");

        let mut contents = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            let save_id = self
                .doc
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(save_id));
            contents.extend(existing);
        }
        let overlay_id = self.doc.add_object(Stream::new(Dictionary::new(), body));
        contents.push(Object::Reference(overlay_id));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Serialize the document.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| Error::Serialize(e.to_string()))?;
        Ok(buffer)
    }

    /// Run `edit` against a page and undo it if it fails.
    ///
    /// Objects added by `edit` are removed and the page dictionary restored,
    /// so a failed edit leaves the serialized bytes unchanged.
    pub fn edit_page<T, F>(&mut self, page_id: ObjectId, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved_page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::Overlay(format!("page object is not a dictionary: {}", e)))?
            .clone();
        let saved_max_id = self.doc.max_id;

        let result = edit(self);
        if result.is_err() {
            self.doc.objects.retain(|&(number, _), _| number <= saved_max_id);
            self.doc.max_id = saved_max_id;
            self.doc
                .objects
                .insert(page_id, Object::Dictionary(saved_page));
        }
        result
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.doc
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|e| Error::Overlay(format!("page object is not a dictionary: {}", e)))
    }
}

/// Numeric value of an integer or real object.
pub fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Two pages sharing a referenced resource dictionary, MediaBox on the tree root.
    fn two_page_doc() -> TemplateDocument {
        let mut doc = LopdfDocument::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET".to_vec(),
        ));
        let page1 = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        let page2 = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page1), Object::Reference(page2)],
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        TemplateDocument::from_document(doc)
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = Rect::new(612.0, 792.0, 0.0, 0.0);
        assert_eq!(rect.llx, 0.0);
        assert_eq!(rect.width(), 612.0);
        assert_eq!(rect.height(), 792.0);
    }

    #[test]
    fn test_inherited_media_box() {
        let doc = two_page_doc();
        let page = doc.first_page().unwrap();
        let media_box = doc.media_box(page).unwrap();
        assert_eq!(media_box, Rect::new(0.0, 0.0, 595.0, 842.0));
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_add_resource_keeps_other_pages_untouched() {
        let mut doc = two_page_doc();
        let pages: Vec<ObjectId> = doc.raw_doc().get_pages().into_values().collect();

        let font = Object::Dictionary(dictionary! { "Type" => "Font" });
        let first = doc
            .add_page_resource(pages[0], "Font", "F", font.clone())
            .unwrap();
        let second = doc.add_page_resource(pages[0], "Font", "F", font).unwrap();

        // F1 already exists in the shared dictionary
        assert_eq!(first, "F2");
        assert_eq!(second, "F3");

        let page2_fonts = doc
            .inherited_attribute(pages[1], b"Resources")
            .and_then(|r| r.as_dict().ok())
            .and_then(|r| r.get(b"Font").ok())
            .and_then(|f| doc.resolve(f))
            .and_then(|f| f.as_dict().ok())
            .unwrap();
        assert!(page2_fonts.has(b"F1"));
        assert!(!page2_fonts.has(b"F2"));
    }

    #[test]
    fn test_append_content_brackets_existing_stream() {
        let mut doc = two_page_doc();
        let page = doc.first_page().unwrap();
        doc.append_page_content(page, vec![Operation::new("n", vec![])])
            .unwrap();

        let contents = doc
            .raw_doc()
            .get_dictionary(page)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(contents.len(), 3);

        let content = doc.raw_doc().get_page_content(page).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.starts_with("q\n"));
        assert!(text.contains("(Hello) Tj"));
        assert!(text.trim_end().ends_with('Q'));
    }

    #[test]
    fn test_append_content_to_blank_page() {
        let mut doc = two_page_doc();
        let pages: Vec<ObjectId> = doc.raw_doc().get_pages().into_values().collect();
        doc.append_page_content(pages[1], vec![Operation::new("n", vec![])])
            .unwrap();

        let contents = doc
            .raw_doc()
            .get_dictionary(pages[1])
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn test_failed_page_edit_leaves_bytes_unchanged() {
        let mut doc = two_page_doc();
        let page = doc.first_page().unwrap();
        let before = doc.save_to_bytes().unwrap();

        let result: Result<()> = doc.edit_page(page, |doc| {
            let image = doc
                .raw_doc_mut()
                .add_object(Stream::new(Dictionary::new(), b"pixels".to_vec()));
            doc.add_page_resource(page, "XObject", "Im", Object::Reference(image))?;
            doc.append_page_content(page, vec![Operation::new("Do", vec![Object::Name(b"Im1".to_vec())])])?;
            Err(Error::Overlay("late failure".to_string()))
        });

        assert!(matches!(result, Err(Error::Overlay(_))));
        assert_eq!(doc.save_to_bytes().unwrap(), before);
    }

    #[test]
    fn test_successful_page_edit_is_kept() {
        let mut doc = two_page_doc();
        let page = doc.first_page().unwrap();
        let objects = doc.raw_doc().objects.len();

        let name = doc
            .edit_page(page, |doc| {
                doc.add_page_resource(page, "Font", "F", Object::Null)
            })
            .unwrap();

        assert_eq!(name, "F2");
        assert_eq!(doc.raw_doc().objects.len(), objects);
        assert!(doc.raw_doc().get_dictionary(page).unwrap().has(b"Resources"));
    }

    #[test]
    fn test_no_pages() {
        let mut doc = LopdfDocument::with_version("1.7");
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

        let doc = TemplateDocument::from_document(doc);
        assert!(matches!(doc.first_page(), Err(Error::NoPages)));
    }

    #[test]
    fn test_load_bytes_rejects_non_pdf() {
        assert!(matches!(
            TemplateDocument::load_bytes(b"<html></html>"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_save_round_trip() {
        let mut doc = two_page_doc();
        let bytes = doc.save_to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let reloaded = TemplateDocument::load_bytes(&bytes).unwrap();
        assert_eq!(reloaded.page_count(), 2);
    }
}
