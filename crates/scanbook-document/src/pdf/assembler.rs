// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler: turn an ordered list of JPEG pages into one multi-page PDF
// with `lopdf`.
//
// Every page becomes an image XObject whose stream is the page's JPEG bytes
// with `/Filter /DCTDecode`, so pixels are never decoded or re-encoded on the
// way into the document. Only the JPEG header is read, to learn the size and
// colour space.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use scanbook_core::error::ScanbookError;
use scanbook_core::{DocumentOrigin, PaperSize};
use tracing::{debug, info, instrument};

use crate::pdf::cover::Cover;
use crate::pdf::reader::PdfReader;
use crate::scan::sequence::PendingPage;

/// Resource name of the page image inside each page's /XObject dictionary.
const IMAGE_RESOURCE: &[u8] = b"Im0";

/// A finished PDF, ready to hand to storage.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    /// The complete PDF file.
    pub bytes: Vec<u8>,
    pub cover: Cover,
    pub page_count: usize,
    pub origin: DocumentOrigin,
}

/// Builds multi-page PDFs from page images.
pub struct PdfAssembler {
    /// Paper size of every output page.
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfAssembler {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Create a new assembler defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    pub fn paper_size(&self) -> PaperSize {
        self.paper_size
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    // -- Assembly -------------------------------------------------------------

    /// Assemble `pages` into a PDF, one page per entry, in order.
    ///
    /// Fails with [`ScanbookError::EmptyDocument`] when there are no pages,
    /// and with [`ScanbookError::PageDecode`] (carrying the zero-based index)
    /// when any page's JPEG header cannot be read. Nothing is produced on
    /// failure.
    #[instrument(skip_all, fields(pages = pages.len(), paper = ?self.paper_size))]
    pub fn assemble(&self, pages: &[PendingPage]) -> Result<AssembledDocument, ScanbookError> {
        if pages.is_empty() {
            return Err(ScanbookError::EmptyDocument);
        }

        // Read every page header before building anything.
        let headers = pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                read_jpeg_header(page.image_data())
                    .map_err(|reason| ScanbookError::PageDecode { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (page_w, page_h) = self.paper_size.dimensions_pt();
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for (page, header) in pages.iter().zip(&headers) {
            let image_id = doc.add_object(image_xobject(page.image_data(), header));

            let placement = Placement::fit(header.width, header.height, page_w, page_h);
            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new("cm", placement.matrix()),
                    Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let encoded = content.encode().map_err(|err| {
                ScanbookError::PdfError(format!("failed to encode page content: {}", err))
            })?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box(page_w, page_h),
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => text_string(title),
                "Producer" => text_string("Scanbook"),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|err| ScanbookError::PdfError(format!("failed to serialise PDF: {}", err)))?;

        let first = &headers[0];
        let cover = Cover::from_first_page(pages[0].image_data().to_vec(), first.width, first.height);

        info!(page_count, bytes = bytes.len(), "PDF assembled");

        Ok(AssembledDocument {
            bytes,
            cover,
            page_count,
            origin: DocumentOrigin::Assembled,
        })
    }

    /// Accept an uploaded PDF as the finished document.
    ///
    /// The bytes are kept verbatim after checking that they parse and hold at
    /// least one page. The cover is page 1 rendered at `cover_scale`.
    #[instrument(skip_all, fields(bytes = pdf_bytes.len(), cover_scale))]
    pub fn pass_through(
        &self,
        pdf_bytes: Vec<u8>,
        cover_scale: f32,
    ) -> Result<AssembledDocument, ScanbookError> {
        let reader = PdfReader::from_bytes(&pdf_bytes)?;
        let page_count = reader.page_count();
        if page_count == 0 {
            return Err(ScanbookError::PdfError("document has no pages".into()));
        }

        let cover = Cover::render_first_page(&reader, cover_scale)?;
        debug!(page_count, cover = ?cover.source, "PDF accepted as-is");

        Ok(AssembledDocument {
            bytes: pdf_bytes,
            cover,
            page_count,
            origin: DocumentOrigin::PassThrough,
        })
    }
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::a4()
    }
}

// -- Layout -------------------------------------------------------------------

/// Where an image lands on the page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Placement {
    /// Scale the image (one pixel = one point) by the largest factor that
    /// keeps it on the page, and pin it to the top-left corner.
    fn fit(img_w: u32, img_h: u32, page_w: f32, page_h: f32) -> Self {
        let (img_w, img_h) = (img_w as f32, img_h as f32);
        let scale = (page_w / img_w).min(page_h / img_h);
        let width = img_w * scale;
        let height = img_h * scale;
        Self {
            x: 0.0,
            // PDF user space grows upwards from the bottom edge.
            y: page_h - height,
            width,
            height,
        }
    }

    fn matrix(&self) -> Vec<Object> {
        vec![
            Object::Real(self.width),
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.height),
            Object::Real(self.x),
            Object::Real(self.y),
        ]
    }
}

fn media_box(width: f32, height: f32) -> Vec<Object> {
    vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width),
        Object::Real(height),
    ]
}

// -- JPEG handling ------------------------------------------------------------

/// What the assembler needs to know about a page's JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegHeader {
    width: u32,
    height: u32,
    color_space: &'static str,
}

/// Read the JPEG header without decoding any pixels.
fn read_jpeg_header(data: &[u8]) -> Result<JpegHeader, String> {
    let decoder = JpegDecoder::new(Cursor::new(data)).map_err(|err| err.to_string())?;
    let (width, height) = decoder.dimensions();
    if width == 0 || height == 0 {
        return Err("JPEG has zero size".into());
    }

    // The decoder converts CMYK to RGB for us, but the embedded stream would
    // still be CMYK, so look at the frame header directly.
    if frame_components(data) == Some(4) {
        return Err("CMYK JPEG pages are not supported".into());
    }

    let color_space = match decoder.color_type() {
        ColorType::L8 => "DeviceGray",
        ColorType::Rgb8 => "DeviceRGB",
        other => return Err(format!("unsupported JPEG colour type {:?}", other)),
    };

    Ok(JpegHeader {
        width,
        height,
        color_space,
    })
}

/// Component count from the first SOF segment.
fn frame_components(data: &[u8]) -> Option<u8> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        match marker {
            // Fill byte.
            0xFF => {
                pos += 1;
                continue;
            }
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            // Start of scan: no frame header seen.
            0xDA | 0xD9 => return None,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return data.get(pos + 9).copied();
            }
            _ => {}
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        pos += 2 + len;
    }
    None
}

fn image_xobject(jpeg: &[u8], header: &JpegHeader) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => header.width as i64,
            "Height" => header.height as i64,
            "ColorSpace" => header.color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg.to_vec(),
    )
    // Already compressed; lopdf must not deflate it again.
    .with_compression(false)
}

/// PDF text string: literal for ASCII, UTF-16BE with a BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
    use scanbook_core::NormalizeOptions;

    use crate::image::normalizer::PageNormalizer;

    fn rgb_page(width: u32, height: u32, options: NormalizeOptions) -> PendingPage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 120, 150])));
        let page = PageNormalizer::from_dynamic(img).normalize(options).expect("normalize");
        let thumb = PageNormalizer::from_bytes(&page.jpeg)
            .expect("decode")
            .normalize(NormalizeOptions::THUMBNAIL)
            .expect("thumb");
        PendingPage::from_normalized(page, thumb)
    }

    fn num(obj: &Object) -> f32 {
        match obj {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            other => panic!("not a number: {other:?}"),
        }
    }

    /// (image width, image height, cm operands) for every page, in order.
    fn layout(bytes: &[u8]) -> Vec<(i64, i64, Vec<f32>)> {
        let doc = Document::load_mem(bytes).expect("reload");
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let content = Content::decode(&doc.get_page_content(page_id).expect("content"))
                    .expect("decode content");
                let cm = content
                    .operations
                    .iter()
                    .find(|op| op.operator == "cm")
                    .expect("cm")
                    .operands
                    .iter()
                    .map(num)
                    .collect();

                let page = doc.get_dictionary(page_id).expect("page");
                let resources = page.get(b"Resources").and_then(Object::as_dict).expect("res");
                let xobjects = resources.get(b"XObject").and_then(Object::as_dict).expect("xobj");
                let image_id = xobjects.get(b"Im0").and_then(Object::as_reference).expect("im0");
                let image = doc.get_object(image_id).and_then(Object::as_stream).expect("stream");
                let w = image.dict.get(b"Width").and_then(Object::as_i64).expect("w");
                let h = image.dict.get(b"Height").and_then(Object::as_i64).expect("h");
                (w, h, cm)
            })
            .collect()
    }

    #[test]
    fn three_captures_become_three_letterboxed_pages() {
        let pages = vec![
            rgb_page(2000, 3000, NormalizeOptions::CAPTURE),
            rgb_page(800, 600, NormalizeOptions::CAPTURE),
            rgb_page(4000, 1000, NormalizeOptions::CAPTURE),
        ];
        let doc = PdfAssembler::a4().assemble(&pages).expect("assemble");
        assert_eq!(doc.page_count, 3);
        assert_eq!(doc.origin, DocumentOrigin::Assembled);

        let (page_w, page_h) = PaperSize::A4.dimensions_pt();
        let laid_out = layout(&doc.bytes);
        let dims: Vec<_> = laid_out.iter().map(|(w, h, _)| (*w, *h)).collect();
        assert_eq!(dims, vec![(1067, 1600), (800, 600), (1600, 400)]);

        for (w, h, cm) in &laid_out {
            let (draw_w, draw_h, x, y) = (cm[0], cm[3], cm[4], cm[5]);
            assert!(draw_w <= page_w + 0.01 && draw_h <= page_h + 0.01);
            // Touches at least one page edge.
            assert!((draw_w - page_w).abs() < 0.01 || (draw_h - page_h).abs() < 0.01);
            // Undistorted.
            let ratio = *w as f32 / *h as f32;
            assert!((draw_w / draw_h - ratio).abs() < 0.001);
            // Top-left anchored.
            assert_eq!(x, 0.0);
            assert!((y + draw_h - page_h).abs() < 0.01);
        }
    }

    #[test]
    fn jpeg_bytes_are_embedded_verbatim() {
        let page = rgb_page(300, 200, NormalizeOptions::ASSEMBLY);
        let assembled = PdfAssembler::a4().assemble(std::slice::from_ref(&page)).expect("assemble");
        let doc = Document::load_mem(&assembled.bytes).expect("reload");
        let embedded = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .find(|s| matches!(s.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image"))
            .expect("image stream");
        assert_eq!(embedded.content, page.image_data());
        assert_eq!(assembled.cover.jpeg, page.image_data());
    }

    #[test]
    fn page_order_is_preserved() {
        let pages: Vec<_> = [100, 200, 300]
            .iter()
            .map(|&w| rgb_page(w, 100, NormalizeOptions::ASSEMBLY))
            .collect();
        let bytes = PdfAssembler::a4().assemble(&pages).expect("assemble").bytes;
        let widths: Vec<_> = layout(&bytes).into_iter().map(|(w, _, _)| w).collect();
        assert_eq!(widths, vec![100, 200, 300]);
    }

    #[test]
    fn empty_sequence_is_an_error() {
        let err = PdfAssembler::a4().assemble(&[]).expect_err("empty");
        assert!(matches!(err, ScanbookError::EmptyDocument));
    }

    #[test]
    fn bad_page_reports_its_index() {
        let pages = vec![
            rgb_page(50, 50, NormalizeOptions::ASSEMBLY),
            PendingPage::from_jpeg(b"definitely not a jpeg".to_vec()),
            rgb_page(50, 50, NormalizeOptions::ASSEMBLY),
        ];
        let err = PdfAssembler::a4().assemble(&pages).expect_err("bad page");
        assert!(matches!(err, ScanbookError::PageDecode { index: 1, .. }));
    }

    #[test]
    fn grey_jpeg_uses_device_gray() {
        let grey = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([128])));
        let mut jpeg = Vec::new();
        grey.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .expect("encode");
        let header = read_jpeg_header(&jpeg).expect("header");
        assert_eq!(header.color_space, "DeviceGray");
        assert_eq!(frame_components(&jpeg), Some(1));
    }

    #[test]
    fn title_goes_into_info_dictionary() {
        let mut assembler = PdfAssembler::new(PaperSize::Letter);
        assembler.set_title("Field Notes");
        let bytes = assembler
            .assemble(&[rgb_page(10, 10, NormalizeOptions::ASSEMBLY)])
            .expect("assemble")
            .bytes;
        let reader = PdfReader::from_bytes(&bytes).expect("load");
        assert_eq!(reader.title().as_deref(), Some("Field Notes"));
        let (w, h) = reader.page_size(1).expect("size");
        assert_eq!((w, h), (612.0, 792.0));
    }

    #[test]
    fn unicode_title_is_utf16() {
        match text_string("Café") {
            Object::String(bytes, _) => assert_eq!(&bytes[..2], &[0xFE, 0xFF]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pass_through_keeps_bytes() {
        let original = PdfAssembler::a4()
            .assemble(&[rgb_page(60, 90, NormalizeOptions::ASSEMBLY)])
            .expect("assemble")
            .bytes;
        let doc = PdfAssembler::a4().pass_through(original.clone(), 0.5).expect("pass");
        assert_eq!(doc.bytes, original);
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.origin, DocumentOrigin::PassThrough);
    }

    #[test]
    fn pass_through_survives_an_undecodable_cover() {
        let original = crate::pdf::reader::tests::ccitt_pdf();
        let doc = PdfAssembler::a4().pass_through(original.clone(), 0.5).expect("pass");
        assert_eq!(doc.bytes, original);
        assert_eq!(doc.cover.source, crate::pdf::cover::CoverSource::Blank);
    }

    #[test]
    fn pass_through_rejects_garbage() {
        let err = PdfAssembler::a4()
            .pass_through(b"%PDF-1.4 nope".to_vec(), 0.5)
            .expect_err("garbage");
        assert!(matches!(err, ScanbookError::PdfError(_)));
    }
}
