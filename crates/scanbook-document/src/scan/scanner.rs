// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner: collects pages from files and the camera, then hands them to the
// assembler.

use scanbook_bridge::{CameraSession, NativeCamera};
use scanbook_core::NormalizeOptions;
use scanbook_core::error::ScanbookError;
use tracing::{info, instrument};

use crate::pdf::assembler::{AssembledDocument, PdfAssembler};
use crate::scan::sequence::{PageSequence, PendingPage};
use crate::scan::source::{self, SelectedFile, Selection};

/// Result of adding a file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// This many image pages were appended.
    PagesAdded(usize),
    /// A PDF was picked; it will be stored as-is. Carries the suggested title.
    Pdf(String),
    /// The selection was empty.
    Nothing,
}

/// Normalization presets used while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPresets {
    pub capture: NormalizeOptions,
    pub upload: NormalizeOptions,
    pub preview: NormalizeOptions,
}

impl Default for ScanPresets {
    fn default() -> Self {
        Self {
            capture: NormalizeOptions::CAPTURE,
            upload: NormalizeOptions::ASSEMBLY,
            preview: NormalizeOptions::THUMBNAIL,
        }
    }
}

/// One scanning session: the pending pages, or a PDF picked instead of them.
#[derive(Debug, Default)]
pub struct Scanner {
    presets: ScanPresets,
    pages: PageSequence,
    imported_pdf: Option<SelectedFile>,
}

impl Scanner {
    pub fn new(presets: ScanPresets) -> Self {
        Self {
            presets,
            ..Self::default()
        }
    }

    /// Add a file selection.
    ///
    /// Images are normalized all at once before any is appended, so a file
    /// that fails to decode leaves the sequence exactly as it was. The error
    /// carries the position the bad file would have taken. Picking a PDF
    /// replaces any earlier PDF; picking images drops it.
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn add_files(&mut self, files: Vec<SelectedFile>) -> Result<Intake, ScanbookError> {
        match Selection::classify(files)? {
            Selection::Empty => Ok(Intake::Nothing),
            Selection::Pdf(pdf) => {
                let title = pdf.title_stem().to_string();
                info!(name = %pdf.name, "PDF selected for import");
                self.imported_pdf = Some(pdf);
                Ok(Intake::Pdf(title))
            }
            Selection::Images(images) => {
                let offset = self.pages.len();
                let mut normalized = Vec::with_capacity(images.len());
                for (i, file) in images.iter().enumerate() {
                    let page = PendingPage::from_bytes(&file.bytes, self.presets.upload, self.presets.preview)
                        .map_err(|err| ScanbookError::PageDecode {
                            index: offset + i,
                            reason: format!("{}: {}", file.name, err),
                        })?;
                    normalized.push(page);
                }

                let added = normalized.len();
                self.imported_pdf = None;
                self.pages.extend(normalized);
                info!(added, total = self.pages.len(), "images added");
                Ok(Intake::PagesAdded(added))
            }
        }
    }

    /// Take a still from the camera and append it.
    ///
    /// A failed capture leaves the pages already collected untouched.
    pub fn capture<C: NativeCamera + ?Sized>(
        &mut self,
        session: &mut CameraSession<'_, C>,
    ) -> Result<(), ScanbookError> {
        let page = source::capture_page(session, self.presets.capture, self.presets.preview)?;
        self.imported_pdf = None;
        self.pages.append(page);
        Ok(())
    }

    pub fn remove_page(&mut self, index: usize) -> Option<PendingPage> {
        self.pages.remove_at(index)
    }

    pub fn pages(&self) -> &PageSequence {
        &self.pages
    }

    pub fn imported_pdf(&self) -> Option<&SelectedFile> {
        self.imported_pdf.as_ref()
    }

    /// Build the document: the imported PDF if there is one, otherwise the
    /// assembled pages. The session is consumed either way.
    pub fn finish(
        self,
        assembler: &PdfAssembler,
        cover_scale: f32,
    ) -> Result<AssembledDocument, ScanbookError> {
        match self.imported_pdf {
            Some(pdf) => assembler.pass_through(pdf.bytes, cover_scale),
            None => assembler.assemble(self.pages.to_ordered_list()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use scanbook_bridge::{CameraStream, Frame, StreamRequest};
    use scanbook_core::DocumentOrigin;

    /// Always delivers the same grey 2000x1500 frame.
    struct StillCamera;

    struct StillStream;

    impl NativeCamera for StillCamera {
        fn open_stream(&self, _: &StreamRequest) -> scanbook_core::error::Result<Box<dyn CameraStream>> {
            Ok(Box::new(StillStream))
        }
    }

    impl CameraStream for StillStream {
        fn frame_size(&self) -> (u32, u32) {
            (2000, 1500)
        }

        fn grab_frame(&mut self) -> scanbook_core::error::Result<Frame> {
            Ok(Frame {
                width: 2000,
                height: 1500,
                rgb: vec![128; 2000 * 1500 * 3],
            })
        }

        fn release(&mut self) {}
    }

    fn png_file(name: &str, width: u32, height: u32) -> SelectedFile {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode");
        SelectedFile::new(name, bytes)
    }

    /// Valid PNG signature, broken body.
    fn broken_png(name: &str) -> SelectedFile {
        SelectedFile::new(name, b"\x89PNG\r\n\x1a\ntruncated".to_vec())
    }

    #[test]
    fn images_are_appended_in_order() {
        let mut scanner = Scanner::default();
        let intake = scanner
            .add_files(vec![png_file("a.png", 30, 10), png_file("b.png", 10, 30)])
            .expect("add");
        assert_eq!(intake, Intake::PagesAdded(2));
        assert_eq!(scanner.pages().len(), 2);

        let doc = scanner.finish(&PdfAssembler::a4(), 0.5).expect("finish");
        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.origin, DocumentOrigin::Assembled);
    }

    #[test]
    fn bad_file_leaves_sequence_untouched() {
        let mut scanner = Scanner::default();
        scanner.add_files(vec![png_file("first.png", 8, 8)]).expect("add");

        let err = scanner
            .add_files(vec![png_file("ok.png", 8, 8), broken_png("bad.png")])
            .expect_err("bad batch");
        assert!(matches!(err, ScanbookError::PageDecode { index: 2, .. }));
        assert_eq!(scanner.pages().len(), 1);
    }

    #[test]
    fn pdf_selection_is_passed_through() {
        let mut seed = Scanner::default();
        seed.add_files(vec![png_file("p.png", 20, 20)]).expect("add");
        let pdf_bytes = seed.finish(&PdfAssembler::a4(), 0.5).expect("pdf").bytes;

        let mut scanner = Scanner::default();
        let intake = scanner
            .add_files(vec![SelectedFile::new("Reading List.pdf", pdf_bytes.clone())])
            .expect("add");
        assert_eq!(intake, Intake::Pdf("Reading List".into()));

        let doc = scanner.finish(&PdfAssembler::a4(), 0.5).expect("finish");
        assert_eq!(doc.origin, DocumentOrigin::PassThrough);
        assert_eq!(doc.bytes, pdf_bytes);
    }

    #[test]
    fn nothing_to_finish_is_empty_document() {
        let err = Scanner::default()
            .finish(&PdfAssembler::a4(), 0.5)
            .expect_err("empty");
        assert!(matches!(err, ScanbookError::EmptyDocument));
    }

    #[test]
    fn camera_capture_uses_capture_preset() {
        let camera = StillCamera;
        let mut session = CameraSession::new(&camera, StreamRequest::default());
        let mut scanner = Scanner::default();

        assert!(matches!(
            scanner.capture(&mut session),
            Err(ScanbookError::CameraStopped)
        ));
        assert!(scanner.pages().is_empty());

        session.start().expect("start");
        scanner.capture(&mut session).expect("capture");
        let page = scanner.pages().get(0).expect("page");
        let img = image::load_from_memory(page.image_data()).expect("decode");
        assert_eq!((img.width(), img.height()), (1600, 1200));
    }
}
