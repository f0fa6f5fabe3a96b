// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open existing PDF documents with `lopdf`, extract per-page
// text, and pull the raster image a scanned page is made of.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use scanbook_core::error::ScanbookError;
use tracing::{debug, info, instrument, warn};

use crate::image::normalizer::PageNormalizer;

/// US Letter, used when a page carries no usable /MediaBox.
const FALLBACK_MEDIA_BOX: (f32, f32) = (612.0, 792.0);

/// How far up the page tree inherited attributes are looked for.
const MAX_TREE_DEPTH: usize = 32;

/// Quality used when a non-JPEG page image has to be re-encoded.
const REENCODE_QUALITY: u8 = 85;

/// Reads existing PDF files.
///
/// Pages are addressed 1-based throughout, matching how the viewer numbers
/// them.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanbookError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            ScanbookError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanbookError> {
        let document = Document::load_mem(data).map_err(|err| {
            ScanbookError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Title from the /Info dictionary, if the document has one.
    pub fn title(&self) -> Option<String> {
        let info = self.document.trailer.get(b"Info").ok()?;
        let info = self.resolve(info)?.as_dict().ok()?;
        match info.get(b"Title").ok()? {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    }

    /// Page width and height in points, from the (possibly inherited) /MediaBox.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32), ScanbookError> {
        let page_id = self.page_id(page_number)?;
        let size = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| self.resolve(obj))
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| {
                let nums: Vec<f32> = arr.iter().filter_map(number).collect();
                match nums.as_slice() {
                    [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
                    _ => None,
                }
            })
            .filter(|(w, h)| *w > 0.0 && *h > 0.0);

        Ok(size.unwrap_or_else(|| {
            warn!(page_number, "no usable MediaBox, assuming US Letter");
            FALLBACK_MEDIA_BOX
        }))
    }

    // -- Extraction -----------------------------------------------------------

    /// Plain text of one page (1-indexed).
    ///
    /// Scanned pages have no text layer, so an empty string is a normal
    /// result rather than an error.
    #[instrument(skip(self))]
    pub fn extract_page_text(&self, page_number: u32) -> Result<String, ScanbookError> {
        self.page_id(page_number)?;
        let text = self.document.extract_text(&[page_number]).map_err(|err| {
            ScanbookError::PdfError(format!(
                "failed to extract text from page {}: {}",
                page_number, err
            ))
        })?;
        debug!(page_number, chars = text.len(), "Page text extracted");
        Ok(text)
    }

    /// Decode the largest raster image drawn on a page, if there is one.
    #[instrument(skip(self))]
    pub fn page_image(&self, page_number: u32) -> Result<Option<DynamicImage>, ScanbookError> {
        let page_id = self.page_id(page_number)?;
        match self.largest_image(page_id) {
            Some(stream) => decode_image_stream(&self.document, stream).map(Some),
            None => Ok(None),
        }
    }

    /// JPEG bytes of the largest image on a page.
    ///
    /// A `/DCTDecode` image is already a JPEG and is returned untouched;
    /// anything else is decoded and re-encoded.
    #[instrument(skip(self))]
    pub fn page_image_jpeg(&self, page_number: u32) -> Result<Option<Vec<u8>>, ScanbookError> {
        let page_id = self.page_id(page_number)?;
        let Some(stream) = self.largest_image(page_id) else {
            return Ok(None);
        };

        if filter_name(&stream.dict).as_deref() == Some(b"DCTDecode".as_slice()) {
            return Ok(Some(stream.content.clone()));
        }

        let image = decode_image_stream(&self.document, stream)?;
        let jpeg = PageNormalizer::from_dynamic(image).to_jpeg(REENCODE_QUALITY)?;
        Ok(Some(jpeg.jpeg))
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, page_number: u32) -> Result<ObjectId, ScanbookError> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            ScanbookError::NotFound(format!(
                "page {} (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    /// Follow a reference; direct objects come back as they are.
    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.document.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Look a key up on the page, then on its ancestors in the page tree.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.document.get_dictionary(page_id).ok();
        for _ in 0..MAX_TREE_DEPTH {
            let dict = current?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .ok()
                .and_then(|parent| self.document.get_dictionary(parent).ok());
        }
        None
    }

    /// Every image XObject listed in the page's resources.
    fn page_images(&self, page_id: ObjectId) -> Vec<&Stream> {
        let xobjects = self
            .inherited(page_id, b"Resources")
            .and_then(|res| self.resolve(res))
            .and_then(|res| res.as_dict().ok())
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|xobj| self.resolve(xobj))
            .and_then(|xobj| xobj.as_dict().ok());

        let Some(xobjects) = xobjects else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter_map(|(_, obj)| self.resolve(obj))
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| {
                matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
            })
            .collect()
    }

    fn largest_image(&self, page_id: ObjectId) -> Option<&Stream> {
        self.page_images(page_id)
            .into_iter()
            .max_by_key(|stream| {
                let (w, h) = stream_dimensions(stream);
                u64::from(w) * u64::from(h)
            })
    }
}

/// PDF text strings are UTF-16BE when they start with a byte order mark.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Integer or real PDF number.
fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|obj| obj.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

fn stream_dimensions(stream: &Stream) -> (u32, u32) {
    (
        dict_u32(&stream.dict, b"Width").unwrap_or(0),
        dict_u32(&stream.dict, b"Height").unwrap_or(0),
    )
}

/// The stream's filter. For a filter chain only a single entry is supported.
fn filter_name(dict: &Dictionary) -> Option<Vec<u8>> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.clone()),
        Object::Array(chain) if chain.len() == 1 => match &chain[0] {
            Object::Name(name) => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Samples per pixel of the image's colour space.
///
/// `/ICCBased` spaces take `/N` from their profile stream; only grey and RGB
/// profiles are accepted.
fn color_components(doc: &Document, dict: &Dictionary) -> Option<u32> {
    let space = match dict.get(b"ColorSpace").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Some(3),
            b"DeviceGray" | b"CalGray" => Some(1),
            _ => None,
        },
        Object::Array(family) => match family.as_slice() {
            [Object::Name(name), profile] if name.as_slice() == b"ICCBased" => {
                let profile = match profile {
                    Object::Reference(id) => doc.get_object(*id).ok()?,
                    other => other,
                };
                let n = dict_u32(&profile.as_stream().ok()?.dict, b"N")?;
                matches!(n, 1 | 3).then_some(n)
            }
            [Object::Name(name), ..] if name.as_slice() == b"CalRGB" => Some(3),
            [Object::Name(name), ..] if name.as_slice() == b"CalGray" => Some(1),
            _ => None,
        },
        _ => None,
    }
}

/// 1-bit grey samples, rows padded to whole bytes, 1 = white.
fn expand_bilevel(samples: &[u8], width: u32, height: u32) -> Option<GrayImage> {
    let row_bytes = (width as usize).div_ceil(8);
    if samples.len() < row_bytes * height as usize {
        return None;
    }
    Some(GrayImage::from_fn(width, height, |x, y| {
        let byte = samples[y as usize * row_bytes + x as usize / 8];
        let bit = (byte >> (7 - x % 8)) & 1;
        Luma([if bit == 1 { 255 } else { 0 }])
    }))
}

/// Turn an image XObject into pixels.
///
/// Handles JPEG (`/DCTDecode`) and 8-bit RGB, 8-bit grey or 1-bit grey
/// samples that are either unfiltered or `/FlateDecode`d. Other filters
/// (`/CCITTFaxDecode`, `/JBIG2Decode`, `/JPXDecode`) are reported as errors.
fn decode_image_stream(doc: &Document, stream: &Stream) -> Result<DynamicImage, ScanbookError> {
    let filter = filter_name(&stream.dict);

    if filter.as_deref() == Some(b"DCTDecode".as_slice()) {
        return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).map_err(
            |err| ScanbookError::ImageError(format!("failed to decode embedded JPEG: {}", err)),
        );
    }

    let samples = match filter.as_deref() {
        None => stream.content.clone(),
        Some(b"FlateDecode") => stream.decompressed_content().map_err(|err| {
            ScanbookError::PdfError(format!("failed to inflate page image: {}", err))
        })?,
        Some(other) => {
            return Err(ScanbookError::PdfError(format!(
                "unsupported image filter /{}",
                String::from_utf8_lossy(other)
            )));
        }
    };

    let (width, height) = stream_dimensions(stream);
    let bits = dict_u32(&stream.dict, b"BitsPerComponent").unwrap_or(8);
    let components = color_components(doc, &stream.dict);

    let image = match (components, bits) {
        (Some(3), 8) => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        (Some(1), 8) => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        (Some(1), 1) => expand_bilevel(&samples, width, height).map(DynamicImage::ImageLuma8),
        _ => {
            return Err(ScanbookError::PdfError(format!(
                "unsupported page image layout ({:?} components, {} bits)",
                components, bits
            )));
        }
    };

    image.ok_or_else(|| {
        ScanbookError::PdfError(format!(
            "page image data too short for {}x{}",
            width, height
        ))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::dictionary;

    use crate::pdf::assembler::PdfAssembler;
    use crate::scan::sequence::PendingPage;
    use scanbook_core::{NormalizeOptions, PaperSize};

    /// One-page PDF with a line of Helvetica text.
    fn text_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save");
        buf
    }

    fn scanned_pdf() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 60, image::Rgb([200, 10, 10])));
        let page = PendingPage::from_dynamic(img, NormalizeOptions::ASSEMBLY, NormalizeOptions::THUMBNAIL)
            .expect("page");
        PdfAssembler::new(PaperSize::A4)
            .assemble(&[page])
            .expect("assemble")
            .bytes
    }

    /// One 200x200 pt page that draws the image stream `build` returns.
    /// `build` gets the document so it can add objects the image refers to.
    pub(crate) fn image_page_pdf(build: impl FnOnce(&mut Document) -> Stream) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let image = build(&mut doc);
        let image_id = doc.add_object(image);
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"q 200 0 0 200 0 0 cm /Im1 Do Q".to_vec(),
        ));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save");
        buf
    }

    /// A fax-compressed page, which this reader cannot decode.
    pub(crate) fn ccitt_pdf() -> Vec<u8> {
        image_page_pdf(|_| {
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 16,
                    "Height" => 16,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 1,
                    "Filter" => "CCITTFaxDecode",
                    "DecodeParms" => dictionary! { "K" => -1, "Columns" => 16 },
                },
                vec![0x26, 0xA0, 0x00, 0x10, 0x01],
            )
        })
    }

    #[test]
    fn extracts_text_from_text_page() {
        let reader = PdfReader::from_bytes(&text_pdf("Hello shelf")).expect("load");
        assert_eq!(reader.page_count(), 1);
        let text = reader.extract_page_text(1).expect("text");
        assert!(text.contains("Hello shelf"), "got {text:?}");
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        let reader = PdfReader::from_bytes(&text_pdf("x")).expect("load");
        assert_eq!(reader.page_size(1).expect("size"), (300.0, 400.0));
    }

    #[test]
    fn page_numbers_are_one_based() {
        let reader = PdfReader::from_bytes(&text_pdf("x")).expect("load");
        assert!(matches!(reader.extract_page_text(0), Err(ScanbookError::NotFound(_))));
        assert!(matches!(reader.extract_page_text(2), Err(ScanbookError::NotFound(_))));
    }

    #[test]
    fn text_page_has_no_image() {
        let reader = PdfReader::from_bytes(&text_pdf("x")).expect("load");
        assert!(reader.page_image(1).expect("lookup").is_none());
        assert!(reader.page_image_jpeg(1).expect("lookup").is_none());
    }

    #[test]
    fn scanned_page_image_comes_back_as_jpeg() {
        let reader = PdfReader::from_bytes(&scanned_pdf()).expect("load");
        let jpeg = reader.page_image_jpeg(1).expect("lookup").expect("image");
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
        let img = reader.page_image(1).expect("lookup").expect("image");
        assert_eq!((img.width(), img.height()), (40, 60));
    }

    #[test]
    fn raw_rgb_image_is_decoded() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 0, 255],
        ));
        let stream = doc
            .get_object(image_id)
            .and_then(Object::as_stream)
            .expect("stream");
        let img = decode_image_stream(&doc, stream).expect("decode").to_rgb8();
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn icc_based_rgb_image_is_decoded() {
        let pdf = image_page_pdf(|doc| {
            let profile_id = doc.add_object(Stream::new(
                dictionary! { "N" => 3, "Alternate" => "DeviceRGB" },
                vec![0; 16],
            ));
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2,
                    "Height" => 1,
                    "ColorSpace" => vec![Object::Name(b"ICCBased".to_vec()), profile_id.into()],
                    "BitsPerComponent" => 8,
                },
                vec![255, 0, 0, 0, 255, 0],
            )
        });
        let reader = PdfReader::from_bytes(&pdf).expect("load");
        let img = reader.page_image(1).expect("decode").expect("image").to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0]);
        assert!(reader.page_image_jpeg(1).expect("encode").is_some());
    }

    #[test]
    fn bilevel_grey_image_is_expanded() {
        let pdf = image_page_pdf(|_| {
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 10,
                    "Height" => 2,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 1,
                },
                // Row 0: first pixel white; row 1: all black. Rows are 2 bytes.
                vec![0b1000_0000, 0, 0, 0],
            )
        });
        let reader = PdfReader::from_bytes(&pdf).expect("load");
        let img = reader.page_image(1).expect("decode").expect("image").to_luma8();
        assert_eq!((img.width(), img.height()), (10, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [0]);
        assert_eq!(img.get_pixel(0, 1).0, [0]);
    }

    #[test]
    fn fax_image_is_an_error_not_a_panic() {
        let reader = PdfReader::from_bytes(&ccitt_pdf()).expect("load");
        assert!(matches!(reader.page_image(1), Err(ScanbookError::PdfError(_))));
        assert!(matches!(reader.page_image_jpeg(1), Err(ScanbookError::PdfError(_))));
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(ScanbookError::PdfError(_))
        ));
    }
}
