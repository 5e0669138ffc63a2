//! Per-page exact-text search view.
//!
//! Built once per page from the extractor's character stream and shared
//! read-only across all phrase resolutions. Matching is case-insensitive
//! and whitespace-collapsed on both sides; reported rectangles come from
//! the original character geometry, so they land exactly on the rendered
//! glyphs regardless of normalization.

use crate::document::BBox;
use crate::pipeline::extract::CharBox;

/// Exact-substring search over one page, yielding highlight rectangles.
pub trait PageSearch: Send + Sync {
    /// All rectangles covering non-overlapping occurrences of `needle`.
    ///
    /// A match spanning multiple visual lines yields one rectangle per line.
    /// An empty or whitespace-only needle matches nothing.
    fn find(&self, needle: &str) -> Vec<BBox>;
}

/// Searchable view of one page's text.
pub struct TextIndex {
    /// Normalized character stream: lowercased, whitespace runs collapsed
    /// to a single space.
    text: Vec<char>,
    /// Geometry parallel to `text`. `None` for the synthesized spaces.
    boxes: Vec<Option<BBox>>,
}

impl TextIndex {
    /// Build the index from the extractor's character stream.
    pub fn build(chars: &[CharBox]) -> Self {
        let mut text = Vec::new();
        let mut boxes = Vec::new();
        let mut pending_space = false;

        for c in chars {
            if c.ch.is_whitespace() {
                pending_space = true;
                continue;
            }
            if pending_space && !text.is_empty() {
                text.push(' ');
                boxes.push(None);
            }
            pending_space = false;
            // lowercase can expand to multiple chars; they share the glyph box
            for lower in c.ch.to_lowercase() {
                text.push(lower);
                boxes.push(c.bbox);
            }
        }

        Self { text, boxes }
    }

    /// Group the geometry of one match into per-line rectangles.
    ///
    /// A line break is detected when a character's vertical midpoint deviates
    /// from the current rectangle's midpoint by more than half its height.
    fn rects_for_span(&self, start: usize, end: usize) -> Vec<BBox> {
        let mut rects = Vec::new();
        let mut current: Option<BBox> = None;

        for b in self.boxes[start..end].iter().flatten() {
            current = Some(match current {
                None => *b,
                Some(rect) => {
                    let mid = (b.y0 + b.y1) / 2.0;
                    let rect_mid = (rect.y0 + rect.y1) / 2.0;
                    let height = rect.height().max(b.height()).max(1.0);
                    if (mid - rect_mid).abs() > height * 0.5 {
                        rects.push(rect);
                        *b
                    } else {
                        rect.union(b)
                    }
                }
            });
        }
        if let Some(rect) = current {
            rects.push(rect);
        }

        rects
    }
}

/// Lowercase and collapse whitespace runs to single spaces.
fn normalize_needle(needle: &str) -> Vec<char> {
    let mut out = Vec::new();
    let mut pending_space = false;
    for c in needle.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.extend(c.to_lowercase());
    }
    out
}

impl PageSearch for TextIndex {
    fn find(&self, needle: &str) -> Vec<BBox> {
        let needle = normalize_needle(needle);
        if needle.is_empty() || needle.len() > self.text.len() {
            return Vec::new();
        }

        let mut rects = Vec::new();
        let mut i = 0;
        while i + needle.len() <= self.text.len() {
            if self.text[i..i + needle.len()] == needle[..] {
                rects.extend(self.rects_for_span(i, i + needle.len()));
                i += needle.len();
            } else {
                i += 1;
            }
        }
        rects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_row(text: &str, x0: f32, y: f32) -> Vec<CharBox> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| CharBox {
                ch,
                bbox: if ch.is_whitespace() {
                    None
                } else {
                    Some(BBox::new(
                        x0 + i as f32 * 6.0,
                        y,
                        x0 + (i + 1) as f32 * 6.0,
                        y + 10.0,
                    ))
                },
            })
            .collect()
    }

    #[test]
    fn case_insensitive_match() {
        let index = TextIndex::build(&char_row("The Quick Fox", 10.0, 100.0));
        let rects = index.find("quick fox");
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].y0, 100.0);
    }

    #[test]
    fn whitespace_runs_match_single_space() {
        let index = TextIndex::build(&char_row("alpha   beta", 10.0, 100.0));
        assert_eq!(index.find("alpha beta").len(), 1);
        assert_eq!(index.find("alpha\n beta").len(), 1);
    }

    #[test]
    fn multiple_occurrences_are_non_overlapping() {
        let index = TextIndex::build(&char_row("aa aa aa", 10.0, 100.0));
        assert_eq!(index.find("aa").len(), 3);
        // "aaaa" never appears: occurrences do not straddle matches
        assert_eq!(index.find("aa aa").len(), 1);
    }

    #[test]
    fn cross_line_match_yields_one_rect_per_line() {
        let mut chars = char_row("end of line", 10.0, 100.0);
        chars.push(CharBox { ch: ' ', bbox: None });
        chars.extend(char_row("next line", 10.0, 130.0));
        let index = TextIndex::build(&chars);
        let rects = index.find("line next");
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].y0, 100.0);
        assert_eq!(rects[1].y0, 130.0);
    }

    #[test]
    fn blank_needle_matches_nothing() {
        let index = TextIndex::build(&char_row("some text", 10.0, 100.0));
        assert!(index.find("").is_empty());
        assert!(index.find("   ").is_empty());
    }

    #[test]
    fn absent_needle_matches_nothing() {
        let index = TextIndex::build(&char_row("some text", 10.0, 100.0));
        assert!(index.find("missing phrase").is_empty());
    }
}
