//! Text extraction: pdfium characters to positioned text blocks.
//!
//! pdfium reports per-character tight bounds in PDF coordinates (origin
//! bottom-left). Everything downstream works in top-left page coordinates,
//! so the flip happens here, once. Characters are grouped into lines by
//! vertical midpoint, lines into blocks by vertical gap.
//!
//! pdfium is not async; the whole extraction runs on the blocking pool.

use crate::document::{BBox, Page, TextBlock};
use crate::error::PipelineError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One character with its bounds in top-left page coordinates.
///
/// `bbox` is `None` for characters pdfium reports without usable geometry
/// (typically synthesized whitespace).
#[derive(Debug, Clone)]
pub struct CharBox {
    pub ch: char,
    pub bbox: Option<BBox>,
}

/// One extracted page together with its raw character stream.
///
/// The character stream feeds the page-search view; the `Page` feeds
/// selection and chunking.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub page: Page,
    pub chars: Vec<CharBox>,
}

/// Extract all pages of the PDF at `path`.
///
/// Runs pdfium on the blocking pool; the returned pages are 1-based, dense,
/// and in document order.
pub async fn extract_pages(path: &Path) -> Result<Vec<ExtractedPage>, PipelineError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_pages_blocking(&path))
        .await
        .map_err(|e| PipelineError::Internal(format!("extraction task panicked: {e}")))?
}

fn extract_pages_blocking(path: &PathBuf) -> Result<Vec<ExtractedPage>, PipelineError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| PipelineError::CorruptPdf {
            path: path.clone(),
            detail: e.to_string(),
        })?;

    let mut pages = Vec::new();

    for (index, page) in document.pages().iter().enumerate() {
        let number = index + 1;
        let width = page.width().value;
        let height = page.height().value;

        let text_page = page.text().map_err(|e| PipelineError::ExtractionFailed {
            detail: format!("page {number}: {e}"),
        })?;

        let mut chars = Vec::new();
        for char_obj in text_page.chars().iter() {
            let Some(unicode) = char_obj.unicode_char() else {
                continue;
            };
            let bbox = char_obj.tight_bounds().ok().map(|b| {
                // flip from bottom-left to top-left origin
                BBox::new(
                    b.left().value,
                    height - b.top().value,
                    b.right().value,
                    height - b.bottom().value,
                )
            });
            chars.push(CharBox { ch: unicode, bbox });
        }

        let lines = lines_from_chars(&chars);
        let blocks = blocks_from_lines(&lines);
        debug!(
            "page {number}: {} chars, {} lines, {} blocks",
            chars.len(),
            lines.len(),
            blocks.len()
        );

        pages.push(ExtractedPage {
            page: Page {
                number,
                width,
                height,
                blocks,
            },
            chars,
        });
    }

    info!("extracted {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// One visual line of text with its bounding box.
#[derive(Debug, Clone)]
pub(crate) struct Line {
    pub text: String,
    pub bbox: BBox,
}

/// Group a page's character stream into visual lines.
///
/// Characters arrive in content order, which pdfium keeps close to reading
/// order. A new line starts when a character's vertical midpoint deviates
/// from the current line's midpoint by more than half the line height.
/// Whitespace and geometry-less characters join words without extending the
/// line's bounds; runs collapse to a single space.
pub(crate) fn lines_from_chars(chars: &[CharBox]) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut text = String::new();
    let mut bbox: Option<BBox> = None;
    let mut pending_space = false;

    let flush = |text: &mut String, bbox: &mut Option<BBox>, lines: &mut Vec<Line>| {
        let trimmed = text.trim();
        if let (false, Some(b)) = (trimmed.is_empty(), *bbox) {
            lines.push(Line {
                text: trimmed.to_string(),
                bbox: b,
            });
        }
        text.clear();
        *bbox = None;
    };

    for c in chars {
        if c.ch.is_whitespace() || c.bbox.is_none() {
            pending_space = true;
            continue;
        }
        let cb = c.bbox.unwrap_or(BBox::new(0.0, 0.0, 0.0, 0.0));
        if let Some(current) = bbox {
            let mid = (cb.y0 + cb.y1) / 2.0;
            let line_mid = (current.y0 + current.y1) / 2.0;
            let line_height = current.height().max(cb.height()).max(1.0);
            if (mid - line_mid).abs() > line_height * 0.5 {
                flush(&mut text, &mut bbox, &mut lines);
                pending_space = false;
            }
        }
        if pending_space && !text.is_empty() {
            text.push(' ');
        }
        pending_space = false;
        text.push(c.ch);
        bbox = Some(match bbox {
            Some(current) => current.union(&cb),
            None => cb,
        });
    }
    flush(&mut text, &mut bbox, &mut lines);

    lines
}

/// Group lines into paragraph-level blocks by vertical gap.
///
/// A new block starts when the vertical step from one line's top to the
/// next exceeds 1.8 times the median line height. Column layouts produce
/// negative steps (back to the top of the page), which also break the block.
pub(crate) fn blocks_from_lines(lines: &[Line]) -> Vec<TextBlock> {
    if lines.is_empty() {
        return Vec::new();
    }

    let mut heights: Vec<f32> = lines.iter().map(|l| l.bbox.height()).collect();
    heights.sort_by(|a, b| a.total_cmp(b));
    let median_height = heights[heights.len() / 2].max(1.0);
    let gap_limit = median_height * 1.8;

    let mut blocks = Vec::new();
    let mut text = String::new();
    let mut bbox = lines[0].bbox;

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let step = line.bbox.y0 - lines[i - 1].bbox.y0;
            if !(0.0..=gap_limit).contains(&step) {
                blocks.push(TextBlock {
                    text: std::mem::take(&mut text),
                    bbox,
                });
                bbox = line.bbox;
            }
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&line.text);
        bbox = bbox.union(&line.bbox);
    }
    if !text.is_empty() {
        blocks.push(TextBlock { text, bbox });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(c: char, x: f32, y: f32) -> CharBox {
        CharBox {
            ch: c,
            bbox: Some(BBox::new(x, y, x + 5.0, y + 10.0)),
        }
    }

    fn space() -> CharBox {
        CharBox { ch: ' ', bbox: None }
    }

    #[test]
    fn chars_group_into_lines() {
        let chars = vec![
            ch('H', 10.0, 100.0),
            ch('i', 16.0, 100.0),
            space(),
            ch('a', 28.0, 100.0),
            // next line, 14pt below
            ch('b', 10.0, 114.0),
            ch('c', 16.0, 114.0),
        ];
        let lines = lines_from_chars(&chars);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hi a");
        assert_eq!(lines[1].text, "bc");
        assert_eq!(lines[0].bbox.y0, 100.0);
    }

    #[test]
    fn whitespace_runs_collapse() {
        let chars = vec![ch('a', 10.0, 50.0), space(), space(), ch('b', 30.0, 50.0)];
        let lines = lines_from_chars(&chars);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "a b");
    }

    #[test]
    fn paragraph_gap_starts_new_block() {
        let lines = vec![
            Line {
                text: "first paragraph line one".into(),
                bbox: BBox::new(10.0, 100.0, 200.0, 110.0),
            },
            Line {
                text: "line two".into(),
                bbox: BBox::new(10.0, 113.0, 150.0, 123.0),
            },
            // 40pt step, well beyond 1.8x line height
            Line {
                text: "second paragraph".into(),
                bbox: BBox::new(10.0, 153.0, 180.0, 163.0),
            },
        ];
        let blocks = blocks_from_lines(&lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "first paragraph line one line two");
        assert_eq!(blocks[1].text, "second paragraph");
        assert_eq!(blocks[0].bbox.y1, 123.0);
    }

    #[test]
    fn upward_step_breaks_block() {
        // two-column layout: second column restarts near the page top
        let lines = vec![
            Line {
                text: "left column".into(),
                bbox: BBox::new(10.0, 700.0, 200.0, 710.0),
            },
            Line {
                text: "right column".into(),
                bbox: BBox::new(310.0, 100.0, 500.0, 110.0),
            },
        ];
        let blocks = blocks_from_lines(&lines);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(lines_from_chars(&[]).is_empty());
        assert!(blocks_from_lines(&[]).is_empty());
    }
}
