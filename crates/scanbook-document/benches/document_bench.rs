// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scan-to-PDF path: normalizing a camera-sized
// still and assembling a short document from already-normalized pages.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use scanbook_core::{NormalizeOptions, PaperSize};
use scanbook_document::{PageNormalizer, PdfAssembler, PendingPage};

/// Gradient so the JPEG encoder has real work to do.
fn synthetic_still(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Downscale a 1920x1080 frame to the capture bound and encode it.
fn bench_normalize_capture(c: &mut Criterion) {
    let still = synthetic_still(1920, 1080);

    c.bench_function("normalize capture (1920x1080 -> 1600)", |b| {
        b.iter(|| {
            let page = PageNormalizer::from_dynamic(black_box(still.clone()))
                .normalize(NormalizeOptions::CAPTURE)
                .expect("normalize");
            black_box(page.jpeg.len());
        });
    });
}

/// Assemble three pages. Only JPEG headers are read, so this measures the
/// PDF object graph and serialisation.
fn bench_assemble_three_pages(c: &mut Criterion) {
    let pages: Vec<PendingPage> = [(1200, 900), (900, 1200), (1200, 300)]
        .iter()
        .map(|&(w, h)| {
            PendingPage::from_dynamic(
                synthetic_still(w, h),
                NormalizeOptions::ASSEMBLY,
                NormalizeOptions::THUMBNAIL,
            )
            .expect("page")
        })
        .collect();
    let assembler = PdfAssembler::new(PaperSize::A4);

    c.bench_function("assemble 3 pages (A4)", |b| {
        b.iter(|| {
            let doc = assembler.assemble(black_box(&pages)).expect("assemble");
            black_box(doc.bytes.len());
        });
    });
}

criterion_group!(benches, bench_normalize_capture, bench_assemble_three_pages);
criterion_main!(benches);
