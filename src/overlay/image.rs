//! Drawing overlay in the top-right corner of page one.

use std::io::Write;
use std::path::PathBuf;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::Operation;
use lopdf::{dictionary, Object, Stream};

use crate::diagnostics::{Diagnostics, Stage};
use crate::document::TemplateDocument;
use crate::error::{Error, Result};

use super::Overlay;

/// Drawn width and height in user-space units.
pub const DRAWING_SIZE: f32 = 150.0;

/// Gap to the top and right edges of the media box.
pub const DRAWING_MARGIN: f32 = 10.0;

/// A raster image decoded and compressed for embedding as an image XObject.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Flate-compressed 8-bit RGB samples
    pub rgb: Vec<u8>,
    /// Flate-compressed 8-bit alpha samples, if any pixel is not opaque
    pub alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    /// Decode PNG or JPEG bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let rgba = ::image::load_from_memory(data)?.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        if width == 0 || height == 0 {
            return Err(Error::Image("image has no pixels".to_string()));
        }

        let pixel_count = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }
        let translucent = alpha.iter().any(|&a| a != u8::MAX);

        Ok(Self {
            width,
            height,
            rgb: compress(&rgb)?,
            alpha: if translucent {
                Some(compress(&alpha)?)
            } else {
                None
            },
        })
    }

    fn xobject(&self, smask: Option<Object>) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if let Some(smask) = smask {
            dict.set("SMask", smask);
        }
        Stream::new(dict, self.rgb.clone())
    }

    fn soft_mask(&self) -> Option<Stream> {
        self.alpha.as_ref().map(|alpha| {
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width as i64,
                    "Height" => self.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                alpha.clone(),
            )
        })
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Image(format!("failed to compress samples: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Image(format!("failed to compress samples: {}", e)))
}

/// Stamp of a drawing asset at a fixed size in the top-right corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOverlay {
    path: PathBuf,
}

impl ImageOverlay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Overlay for ImageOverlay {
    fn stage(&self) -> Stage {
        Stage::ImageOverlay
    }

    fn subject(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self, doc: &mut TemplateDocument, _diagnostics: &mut Diagnostics) -> Result<()> {
        let data = std::fs::read(&self.path)
            .map_err(|e| Error::Image(format!("cannot read drawing: {}", e)))?;
        let image = DecodedImage::decode(&data)?;

        let page = doc.first_page()?;
        let media_box = doc.media_box(page)?;
        let inset = DRAWING_SIZE + DRAWING_MARGIN;
        let x = media_box.llx + media_box.width() - inset;
        let y = media_box.lly + media_box.height() - inset;

        let operations = |name: String| {
            vec![
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(DRAWING_SIZE),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(DRAWING_SIZE),
                        Object::Real(x),
                        Object::Real(y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            ]
        };

        doc.edit_page(page, |doc| {
            let raw = doc.raw_doc_mut();
            let smask = image
                .soft_mask()
                .map(|mask| Object::Reference(raw.add_object(mask)));
            let image_id = raw.add_object(image.xobject(smask));
            let name =
                doc.add_page_resource(page, "XObject", "FxDraw", Object::Reference(image_id))?;
            doc.append_page_content(page, operations(name))
        })?;

        log::debug!(
            "Placed {}x{} drawing at ({}, {})",
            image.width,
            image.height,
            x,
            y
        );
        Ok(())
    }
}
