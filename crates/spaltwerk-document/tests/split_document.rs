// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end splitting tests. Sources are synthetic raster pages, so the
// native PDFium library is not needed.

use std::sync::Arc;

use image::{Rgb, RgbImage};
use lopdf::{Document, Object, ObjectId};
use spaltwerk_core::{SpaltwerkError, SplitConfig, SplitCount};
use spaltwerk_document::{
    DocumentSplitter, ImageSequenceRenderer, PagePipeline, PdfWriter, split_document_blocking,
};

/// 2x3 inch canvas at 100 ppi: 200x300 pixels, 144x216 points.
fn small_config() -> SplitConfig {
    SplitConfig {
        output_ppi: 100,
        page_width_in: 2.0,
        page_height_in: 3.0,
        ..SplitConfig::default()
    }
}

/// Three columns of content. `variant` changes each column's height so pages
/// are distinguishable.
fn three_column_page(variant: u32) -> RgbImage {
    let bottom = 300 + variant * 40;
    let columns = [(50, 250), (350, 550), (650, 850)];
    RgbImage::from_fn(900, 600, |x, y| {
        let inked = columns.iter().enumerate().any(|(index, &(left, right))| {
            (left..right).contains(&x) && (100..bottom - index as u32 * 30).contains(&y)
        });
        if inked { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
    })
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap(),
        other => other,
    }
}

fn number(object: &Object) -> f64 {
    match object {
        Object::Integer(value) => *value as f64,
        Object::Real(value) => *value as f64,
        other => panic!("not a number: {other:?}"),
    }
}

fn page_ids(document: &Document) -> Vec<ObjectId> {
    document.get_pages().into_values().collect()
}

/// Raw content of the first image XObject drawn on a page.
fn image_stream(document: &Document, page_id: ObjectId) -> Vec<u8> {
    let page = document.get_dictionary(page_id).unwrap();
    let resources = resolve(document, page.get(b"Resources").unwrap())
        .as_dict()
        .unwrap();
    let xobjects = resolve(document, resources.get(b"XObject").unwrap())
        .as_dict()
        .unwrap();
    let (_, first) = xobjects.iter().next().unwrap();
    resolve(document, first).as_stream().unwrap().content.clone()
}

/// Image streams of every output page, in page order.
fn output_streams(bytes: &[u8]) -> Vec<Vec<u8>> {
    let document = Document::load_mem(bytes).unwrap();
    page_ids(&document)
        .into_iter()
        .map(|id| image_stream(&document, id))
        .collect()
}

/// What each page's sections should look like, encoded independently.
fn expected_streams(pages: &[RgbImage], splits: SplitCount) -> Vec<Vec<u8>> {
    let pipeline = PagePipeline::from_config(small_config()).unwrap();
    let writer = PdfWriter::new(100);
    pages
        .iter()
        .flat_map(|page| pipeline.compose_sections(page, splits).unwrap())
        .map(|section| {
            let bytes = writer.encode_page(&section).unwrap();
            let document = Document::load_mem(&bytes).unwrap();
            image_stream(&document, page_ids(&document)[0])
        })
        .collect()
}

#[tokio::test]
async fn single_page_splits_into_three_canvas_sized_pages() {
    let splitter = DocumentSplitter::new(small_config()).unwrap();
    let renderer = Arc::new(ImageSequenceRenderer::new(vec![three_column_page(0)]));

    let (report, bytes) = splitter
        .split_with_renderer(renderer, SplitCount::THREE, 5)
        .await
        .unwrap();
    assert_eq!(report.output_pages, 3);

    let document = Document::load_mem(&bytes).unwrap();
    let ids = page_ids(&document);
    assert_eq!(ids.len(), 3);
    for id in ids {
        let media_box = document.get_dictionary(id).unwrap().get(b"MediaBox").unwrap();
        let media_box = resolve(&document, media_box).as_array().unwrap();
        let width = number(&media_box[2]) - number(&media_box[0]);
        let height = number(&media_box[3]) - number(&media_box[1]);
        assert!((width - 144.0).abs() < 1.0, "width {width} pt");
        assert!((height - 216.0).abs() < 1.0, "height {height} pt");
    }
}

#[tokio::test]
async fn sections_keep_page_order_for_any_batch_size() {
    let pages: Vec<RgbImage> = (0..5).map(three_column_page).collect();
    let expected = expected_streams(&pages, SplitCount::THREE);
    assert_eq!(expected.len(), 15);
    // Distinct pages, so an out-of-order append would be caught.
    assert_ne!(expected[0], expected[3]);

    let splitter = DocumentSplitter::new(small_config()).unwrap();
    for batch_size in [1, 2, 5] {
        let renderer = Arc::new(ImageSequenceRenderer::new(pages.clone()));
        let (report, bytes) = splitter
            .split_with_renderer(renderer, SplitCount::THREE, batch_size)
            .await
            .unwrap();

        assert_eq!(report.input_pages, 5);
        assert_eq!(report.output_pages, 15);
        assert_eq!(output_streams(&bytes), expected, "batch size {batch_size}");
    }
}

#[tokio::test]
async fn two_splits_double_the_page_count() {
    let pages: Vec<RgbImage> = (0..3).map(three_column_page).collect();
    let splitter = DocumentSplitter::new(small_config()).unwrap();
    let renderer = Arc::new(ImageSequenceRenderer::new(pages));

    let (report, bytes) = splitter
        .split_with_renderer(renderer, SplitCount::TWO, 2)
        .await
        .unwrap();

    assert_eq!(report.output_pages, 6);
    assert_eq!(page_ids(&Document::load_mem(&bytes).unwrap()).len(), 6);
}

#[tokio::test]
async fn raster_input_file_is_split_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scan.png");
    let output = dir.path().join("split.pdf");
    three_column_page(1).save(&input).unwrap();

    let splitter = DocumentSplitter::new(small_config()).unwrap();
    let report = splitter
        .split(&input, &output, SplitCount::THREE, 4)
        .await
        .unwrap();

    assert_eq!(report.input_pages, 1);
    assert_eq!(report.output_pages, 3);
    let document = Document::load(&output).unwrap();
    assert_eq!(document.get_pages().len(), 3);
}

#[tokio::test]
async fn missing_input_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let splitter = DocumentSplitter::new(small_config()).unwrap();

    let result = splitter
        .split(
            dir.path().join("absent.pdf"),
            dir.path().join("out.pdf"),
            SplitCount::TWO,
            2,
        )
        .await;

    assert!(matches!(result, Err(SpaltwerkError::NotFound(_))));
}

#[test]
fn blocking_wrapper_runs_without_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scan.png");
    let output = dir.path().join("split.pdf");
    three_column_page(2).save(&input).unwrap();

    let report =
        split_document_blocking(small_config(), &input, &output, SplitCount::TWO, 1).unwrap();

    assert_eq!(report.output_pages, 2);
    assert!(output.exists());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = SplitConfig {
        margin_fraction: 0.9,
        ..small_config()
    };
    assert!(matches!(
        DocumentSplitter::new(config),
        Err(SpaltwerkError::ConfigError(_))
    ));
}
