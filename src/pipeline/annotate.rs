//! Annotation: burn highlight overlays into a copy of the PDF.
//!
//! Highlights are written as independent `/Highlight` annotation objects in
//! each page's `/Annots` array, never flattened into content streams, so the
//! text layer stays searchable and a viewer can toggle or remove them.
//! lopdf is synchronous; the whole pass runs on the blocking pool.

use crate::error::PipelineError;
use crate::output::InsightRecord;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Fixed highlight color, RGB in [0, 1].
const HIGHLIGHT_COLOR: (f32, f32, f32) = (1.0, 0.8, 0.0);
/// Highlight opacity.
const HIGHLIGHT_OPACITY: f32 = 0.4;

/// Write `input` to `output` with one highlight annotation per resolved
/// rectangle.
///
/// `page_heights` maps 1-based page numbers (by index) to page heights in
/// points, used to convert top-left rectangles back to PDF coordinates.
/// Insight records with out-of-range page numbers and degenerate rectangles
/// are skipped with a warning.
pub async fn annotate_pdf(
    input: &Path,
    output: &Path,
    insights: &[InsightRecord],
    page_heights: &[f32],
) -> Result<(), PipelineError> {
    let input = input.to_path_buf();
    let output = output.to_path_buf();
    let insights = insights.to_vec();
    let page_heights = page_heights.to_vec();
    tokio::task::spawn_blocking(move || {
        annotate_pdf_blocking(&input, &output, &insights, &page_heights)
    })
    .await
    .map_err(|e| PipelineError::Internal(format!("annotation task panicked: {e}")))?
}

fn annotate_pdf_blocking(
    input: &PathBuf,
    output: &Path,
    insights: &[InsightRecord],
    page_heights: &[f32],
) -> Result<(), PipelineError> {
    let mut doc = Document::load(input).map_err(|e| PipelineError::AnnotationFailed {
        detail: format!("load {}: {e}", input.display()),
    })?;

    let pages = doc.get_pages();
    let mut written = 0usize;

    for record in insights {
        let page_id = match pages.get(&(record.page_number as u32)) {
            Some(id) => *id,
            None => {
                warn!(
                    "insight for page {} is out of range (1..={}), skipping",
                    record.page_number,
                    pages.len()
                );
                continue;
            }
        };
        let Some(&height) = page_heights.get(record.page_number - 1) else {
            warn!("no page height for page {}, skipping", record.page_number);
            continue;
        };

        for highlight in &record.highlights {
            if highlight.bbox.is_degenerate() {
                warn!(
                    "page {}: degenerate highlight rect for '{}', skipping",
                    record.page_number,
                    crate::pipeline::locate::normalize_whitespace(&highlight.text)
                );
                continue;
            }
            let annot = highlight_annotation(&highlight.bbox, height);
            let annot_id = doc.add_object(Object::Dictionary(annot));
            add_annotation_to_page(&mut doc, page_id, annot_id)?;
            written += 1;
        }
    }

    doc.compress();
    doc.save(output).map_err(|e| PipelineError::AnnotationFailed {
        detail: format!("save {}: {e}", output.display()),
    })?;

    info!("wrote {written} highlights to {}", output.display());
    Ok(())
}

/// Build one `/Highlight` annotation dictionary.
///
/// `bbox` is in top-left page coordinates; `page_height` converts to the
/// PDF's bottom-left origin. QuadPoints order is top-left, top-right,
/// bottom-left, bottom-right.
fn highlight_annotation(bbox: &crate::document::BBox, page_height: f32) -> Dictionary {
    let y_top = page_height - bbox.y0;
    let y_bottom = page_height - bbox.y1;
    let (r, g, b) = HIGHLIGHT_COLOR;

    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set(
        "Rect",
        Object::Array(vec![
            Object::Real(bbox.x0),
            Object::Real(y_bottom),
            Object::Real(bbox.x1),
            Object::Real(y_top),
        ]),
    );
    annot.set(
        "QuadPoints",
        Object::Array(vec![
            Object::Real(bbox.x0),
            Object::Real(y_top),
            Object::Real(bbox.x1),
            Object::Real(y_top),
            Object::Real(bbox.x0),
            Object::Real(y_bottom),
            Object::Real(bbox.x1),
            Object::Real(y_bottom),
        ]),
    );
    annot.set(
        "C",
        Object::Array(vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
    );
    annot.set("CA", Object::Real(HIGHLIGHT_OPACITY));
    annot
}

/// Append `annot_id` to the page's `/Annots` array.
///
/// `/Annots` may be stored inline or as an indirect reference to the array
/// object; both forms keep their pre-existing entries (Link annotations on
/// reference lists, for instance). A missing or malformed entry is replaced
/// with a fresh one-element array.
fn add_annotation_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), PipelineError> {
    let annots_id = {
        let page = doc
            .get_object_mut(page_id)
            .map_err(|e| PipelineError::AnnotationFailed {
                detail: e.to_string(),
            })?;
        let Object::Dictionary(ref mut page_dict) = page else {
            return Err(PipelineError::AnnotationFailed {
                detail: format!("page object {page_id:?} is not a dictionary"),
            });
        };
        match page_dict.get_mut(b"Annots") {
            Ok(Object::Array(ref mut arr)) => {
                arr.push(Object::Reference(annot_id));
                return Ok(());
            }
            Ok(Object::Reference(id)) => *id,
            _ => {
                page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
                return Ok(());
            }
        }
    };

    if let Ok(Object::Array(ref mut arr)) = doc.get_object_mut(annots_id) {
        arr.push(Object::Reference(annot_id));
        return Ok(());
    }

    // dangling or non-array reference: replace it on the page itself
    if let Ok(Object::Dictionary(ref mut page_dict)) = doc.get_object_mut(page_id) {
        page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }
    Ok(())
}
