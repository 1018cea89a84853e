//! Grapheme-cluster display width.
//!
//! `unicode-width` gets per-codepoint width right but does not know about a
//! handful of combining/joining codepoints that a full grapheme cluster
//! should render as zero-width when they trail a base character. We special
//! case exactly the three the original C implementation's `wcswidth`-backed
//! behavior depends on, rather than porting a full emoji-taxonomy classifier.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ZERO_WIDTH_JOINER: char = '\u{200D}';
const VARIATION_SELECTOR_16: char = '\u{FE0F}';
const COMBINING_ENCLOSING_KEYCAP: char = '\u{20E3}';

fn is_forced_zero_width(c: char) -> bool {
    matches!(
        c,
        ZERO_WIDTH_JOINER | VARIATION_SELECTOR_16 | COMBINING_ENCLOSING_KEYCAP
    )
}

/// Width, in terminal columns, of a single grapheme cluster.
pub fn grapheme_width(grapheme: &str) -> usize {
    let stripped: String = grapheme.chars().filter(|&c| !is_forced_zero_width(c)).collect();
    if stripped.is_empty() {
        return 0;
    }
    UnicodeWidthStr::width(stripped.as_str())
}

/// Total display width of a string, summed grapheme by grapheme.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

/// Number of grapheme clusters ("glyphs").
pub fn glyph_count(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Truncate `s` to at most `max_width` display columns, cutting on grapheme
/// boundaries so a wide glyph is never split.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for g in s.graphemes(true) {
        let w = grapheme_width(g);
        if used + w > max_width {
            break;
        }
        out.push_str(g);
        used += w;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_width_is_length() {
        assert_eq!(display_width("hello"), 5);
    }

    #[test]
    fn zwj_sequence_counts_as_one_glyph_with_base_width() {
        // family emoji: person + ZWJ + person, base glyph is normally width 2.
        let s = "\u{1F468}\u{200D}\u{1F469}";
        assert_eq!(glyph_count(s), 1);
    }

    #[test]
    fn keycap_digit_is_one_glyph() {
        let s = "1\u{FE0F}\u{20E3}";
        assert_eq!(glyph_count(s), 1);
    }

    #[test]
    fn truncate_respects_grapheme_boundaries() {
        let s = "abcdef";
        assert_eq!(truncate_to_width(s, 3), "abc");
    }
}
