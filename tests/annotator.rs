//! Integration tests for highlight annotation, using lopdf-synthesized PDFs.
//!
//! These run offline: the test PDF is built in memory, annotated, and
//! reloaded to check the written objects.

use lopdf::{dictionary, Document, Object};
use pdf_insight::pipeline::annotate::annotate_pdf;
use pdf_insight::{BBox, InsightRecord, ResolvedHighlight};
use std::path::PathBuf;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;

/// Build a minimal PDF with `n` empty pages.
fn build_test_pdf(path: &PathBuf, n: usize) {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..n {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => n as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}

fn highlight(text: &str, bbox: BBox) -> ResolvedHighlight {
    ResolvedHighlight {
        text: text.to_string(),
        bbox,
    }
}

fn record(page: usize, highlights: Vec<ResolvedHighlight>) -> InsightRecord {
    InsightRecord {
        page_number: page,
        insight_text: "test insight".to_string(),
        highlights,
    }
}

/// Collect the annotation dictionaries of one page by number (1-based).
fn page_annotations(doc: &Document, page_number: u32) -> Vec<lopdf::Dictionary> {
    let pages = doc.get_pages();
    let page_id = pages[&page_number];
    let page_dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let Ok(annots) = page_dict.get(b"Annots") else {
        return Vec::new();
    };
    // /Annots may be inline or an indirect reference to the array
    let annots = match annots {
        Object::Reference(id) => doc.get_object(*id).unwrap(),
        other => other,
    };
    let Object::Array(refs) = annots else {
        return Vec::new();
    };
    refs.iter()
        .filter_map(|r| match r {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .filter_map(|o| o.as_dict().ok().cloned())
        .collect()
}

#[tokio::test]
async fn writes_highlight_annotations_with_expected_fields() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    build_test_pdf(&input, 2);

    let insights = vec![
        record(1, vec![highlight("first phrase", BBox::new(72.0, 100.0, 300.0, 112.0))]),
        record(
            2,
            vec![
                highlight("second phrase", BBox::new(72.0, 200.0, 280.0, 212.0)),
                highlight("third phrase", BBox::new(72.0, 230.0, 310.0, 242.0)),
            ],
        ),
    ];
    let heights = vec![PAGE_HEIGHT, PAGE_HEIGHT];

    annotate_pdf(&input, &output, &insights, &heights)
        .await
        .unwrap();

    // output must still be a valid PDF
    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    let page1 = page_annotations(&doc, 1);
    assert_eq!(page1.len(), 1);
    let page2 = page_annotations(&doc, 2);
    assert_eq!(page2.len(), 2);

    for annot in page1.iter().chain(&page2) {
        assert_eq!(
            annot.get(b"Subtype").unwrap().as_name().unwrap(),
            b"Highlight"
        );
        let Object::Real(ca) = annot.get(b"CA").unwrap() else {
            panic!("CA must be a real number");
        };
        assert!((ca - 0.4).abs() < 1e-6);
        let Object::Array(quads) = annot.get(b"QuadPoints").unwrap() else {
            panic!("QuadPoints must be an array");
        };
        assert_eq!(quads.len(), 8);
        let Object::Array(color) = annot.get(b"C").unwrap() else {
            panic!("C must be an array");
        };
        assert_eq!(color.len(), 3);
    }
}

#[tokio::test]
async fn converts_to_pdf_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    build_test_pdf(&input, 1);

    // top-left rect 100..112 from the top maps to 680..692 from the bottom
    let insights = vec![record(1, vec![highlight("p", BBox::new(72.0, 100.0, 300.0, 112.0))])];
    annotate_pdf(&input, &output, &insights, &[PAGE_HEIGHT])
        .await
        .unwrap();

    let doc = Document::load(&output).unwrap();
    let annots = page_annotations(&doc, 1);
    let Object::Array(rect) = annots[0].get(b"Rect").unwrap() else {
        panic!("Rect must be an array");
    };
    let vals: Vec<f32> = rect
        .iter()
        .map(|o| match o {
            Object::Real(v) => *v,
            Object::Integer(v) => *v as f32,
            _ => panic!("Rect entries must be numeric"),
        })
        .collect();
    assert_eq!(vals[0], 72.0);
    assert!((vals[1] - (PAGE_HEIGHT - 112.0)).abs() < 1e-3);
    assert_eq!(vals[2], 300.0);
    assert!((vals[3] - (PAGE_HEIGHT - 100.0)).abs() < 1e-3);
}

#[tokio::test]
async fn skips_out_of_range_pages_and_degenerate_rects() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    build_test_pdf(&input, 1);

    let insights = vec![
        // page 5 does not exist; the whole record is skipped
        record(5, vec![highlight("ghost", BBox::new(10.0, 10.0, 50.0, 20.0))]),
        // zero-area rect on a valid page is skipped, the other is kept
        record(
            1,
            vec![
                highlight("flat", BBox::new(10.0, 10.0, 10.0, 20.0)),
                highlight("kept", BBox::new(10.0, 40.0, 90.0, 52.0)),
            ],
        ),
    ];
    annotate_pdf(&input, &output, &insights, &[PAGE_HEIGHT])
        .await
        .unwrap();

    let doc = Document::load(&output).unwrap();
    assert_eq!(page_annotations(&doc, 1).len(), 1);
}

#[tokio::test]
async fn preserves_existing_annotations_behind_indirect_annots() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");

    // one page whose /Annots is an indirect reference to an array holding a
    // Link annotation, the way reference lists with DOI links are stored
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let link_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![72.into(), 72.into(), 200.into(), 84.into()],
    });
    let annots_id = doc.add_object(Object::Array(vec![Object::Reference(link_id)]));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(PAGE_WIDTH),
            Object::Real(PAGE_HEIGHT),
        ],
        "Annots" => Object::Reference(annots_id),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.save(&input).unwrap();

    let insights = vec![record(
        1,
        vec![highlight("added later", BBox::new(72.0, 100.0, 300.0, 112.0))],
    )];
    annotate_pdf(&input, &output, &insights, &[PAGE_HEIGHT])
        .await
        .unwrap();

    let doc = Document::load(&output).unwrap();
    let annots = page_annotations(&doc, 1);
    assert_eq!(annots.len(), 2, "the pre-existing Link must survive");
    let subtypes: Vec<&[u8]> = annots
        .iter()
        .map(|a| a.get(b"Subtype").unwrap().as_name().unwrap())
        .collect();
    assert!(subtypes.contains(&b"Link".as_slice()));
    assert!(subtypes.contains(&b"Highlight".as_slice()));
}

#[tokio::test]
async fn no_insights_still_produces_valid_copy() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    build_test_pdf(&input, 3);

    annotate_pdf(&input, &output, &[], &[PAGE_HEIGHT; 3])
        .await
        .unwrap();

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
    for n in 1..=3 {
        assert!(page_annotations(&doc, n).is_empty());
    }
}
