//! Repaints exactly the lines the window owns: no full-screen clear, ever.
//! Grounded on `choose_impl/components/select_component.rs`'s render loop
//! and `choose_impl/style.rs`'s `StyleSheet`/`apply_style!` macro pattern,
//! generalized from three named palettes to configurable
//! cursor/tag/match/search/exclude/include/special-level attribute tuples.

use std::io::{self, Write};

use crossterm::cursor::{MoveToColumn, MoveToPreviousLine, RestorePosition, SavePosition};
use crossterm::style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{queue, QueueableCommand};

use crate::search::SearchState;
use crate::viewport::Viewport;
use crate::word::{Selectable, Word, WordTable};

#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeSet {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
    pub reverse: bool,
    /// terminfo `smso`; crossterm has no distinct "standout" attribute, so
    /// it maps onto the same `Reverse` SGR code as `reverse`.
    pub standout: bool,
    pub underline: bool,
    pub italic: bool,
}

impl AttributeSet {
    /// Issues the attribute's SGR codes in a fixed order, then the color
    /// channels.
    pub fn apply(&self, out: &mut impl Write) -> io::Result<()> {
        macro_rules! toggle {
            ($flag:expr, $attr:expr) => {
                if $flag {
                    out.queue(SetAttribute($attr))?;
                }
            };
        }
        toggle!(self.bold, Attribute::Bold);
        toggle!(self.dim, Attribute::Dim);
        toggle!(self.reverse || self.standout, Attribute::Reverse);
        toggle!(self.underline, Attribute::Underlined);
        toggle!(self.italic, Attribute::Italic);
        if let Some(fg) = self.fg {
            out.queue(SetForegroundColor(fg))?;
        }
        if let Some(bg) = self.bg {
            out.queue(SetBackgroundColor(bg))?;
        }
        Ok(())
    }

    pub fn reset(out: &mut impl Write) -> io::Result<()> {
        out.queue(SetAttribute(Attribute::Reset))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    pub cursor: AttributeSet,
    pub tag: AttributeSet,
    pub tag_cursor: AttributeSet,
    pub match_field: AttributeSet,
    pub match_text: AttributeSet,
    pub search_field: AttributeSet,
    pub search_text: AttributeSet,
    pub exclude: AttributeSet,
    pub include: AttributeSet,
    pub daccess: AttributeSet,
    pub special: [AttributeSet; 5],
}

impl StyleSheet {
    pub fn default_palette() -> Self {
        StyleSheet {
            cursor: AttributeSet { reverse: true, ..Default::default() },
            tag: AttributeSet { fg: Some(Color::Yellow), bold: true, ..Default::default() },
            tag_cursor: AttributeSet { fg: Some(Color::Yellow), reverse: true, bold: true, ..Default::default() },
            match_field: AttributeSet { bg: Some(Color::DarkBlue), ..Default::default() },
            match_text: AttributeSet { fg: Some(Color::Cyan), underline: true, ..Default::default() },
            search_field: AttributeSet { bg: Some(Color::DarkGrey), ..Default::default() },
            search_text: AttributeSet { fg: Some(Color::White), bold: true, ..Default::default() },
            exclude: AttributeSet { dim: true, ..Default::default() },
            include: AttributeSet::default(),
            daccess: AttributeSet { fg: Some(Color::Magenta), ..Default::default() },
            special: [
                AttributeSet { fg: Some(Color::Red), ..Default::default() },
                AttributeSet { fg: Some(Color::Green), ..Default::default() },
                AttributeSet { fg: Some(Color::Blue), ..Default::default() },
                AttributeSet { fg: Some(Color::Magenta), ..Default::default() },
                AttributeSet { fg: Some(Color::Cyan), ..Default::default() },
            ],
        }
    }

    /// Attribute precedence, highest first: cursor(+tag) > match > search
    /// buffer itself > exclude > special level > include(plain).
    fn attrs_for(&self, word: &Word, is_current: bool) -> AttributeSet {
        if is_current && word.tagged {
            return self.tag_cursor;
        }
        if is_current {
            return self.cursor;
        }
        if word.tagged {
            return self.tag;
        }
        if word.matching {
            return self.match_field;
        }
        if word.selectable == Selectable::Excluded {
            return self.exclude;
        }
        if word.special_level > 0 {
            return self.special[(word.special_level - 1) as usize];
        }
        self.include
    }
}

pub struct Renderer<'a> {
    pub style: &'a StyleSheet,
}

impl<'a> Renderer<'a> {
    pub fn new(style: &'a StyleSheet) -> Self {
        Renderer { style }
    }

    /// Repaints the window. `out` must be the interactive `/dev/tty`
    /// handle, never stdout (which carries the final selection).
    ///
    /// `help_line`, when set, is painted as a single banner line above the
    /// word grid (the help mode's timed overlay); it counts toward
    /// `viewport.message_lines` but the caller is responsible for keeping
    /// that field in sync.
    pub fn render(
        &self,
        out: &mut impl Write,
        table: &WordTable,
        viewport: &Viewport,
        search: &SearchState,
        gutter: &str,
        column_like: bool,
        help_line: Option<&str>,
    ) -> io::Result<()> {
        queue!(out, SavePosition)?;

        if let Some(text) = help_line {
            queue!(out, Clear(ClearType::CurrentLine), MoveToColumn(0))?;
            write!(out, "{text}")?;
            writeln!(out)?;
        }

        if table.is_empty() {
            queue!(out, RestorePosition)?;
            out.flush()?;
            return Ok(());
        }

        let first_line = table.line_of[viewport.start];
        let last_line = table.line_of[viewport.end];

        for line in first_line..=last_line {
            queue!(out, Clear(ClearType::CurrentLine), MoveToColumn(viewport.offset as u16))?;
            if viewport.first_column > 0 {
                write!(out, "\u{25C0}")?;
            }

            let lo = table.first_word_in_line[line];
            let hi = if line + 1 < table.first_word_in_line.len() {
                table.first_word_in_line[line + 1] - 1
            } else {
                table.len() - 1
            };

            for i in lo..=hi {
                let word = table.get(i);
                if word.end < viewport.first_column {
                    continue;
                }
                let is_current = i == viewport.current;
                let attrs = self.style.attrs_for(word, is_current);
                attrs.apply(out)?;
                self.write_glyphs(out, word, search)?;
                AttributeSet::reset(out)?;
                if column_like && i != hi {
                    write!(out, "{gutter}")?;
                }
            }
            writeln!(out)?;
        }

        self.render_scrollbar(out, table, viewport)?;
        queue!(out, RestorePosition)?;
        out.flush()?;
        Ok(())
    }

    fn write_glyphs(&self, out: &mut impl Write, word: &Word, search: &SearchState) -> io::Result<()> {
        if !word.matching || !search.is_active() {
            write!(out, "{}", word.display_bytes)?;
            return Ok(());
        }
        for (idx, g) in word.display_bytes.chars().enumerate() {
            if word.is_bit_set(idx) {
                self.style.search_text.apply(out)?;
                write!(out, "{g}")?;
                AttributeSet::reset(out)?;
                self.style.attrs_for(word, false).apply(out)?;
            } else {
                write!(out, "{g}")?;
            }
        }
        Ok(())
    }

    fn render_scrollbar(&self, out: &mut impl Write, table: &WordTable, viewport: &Viewport) -> io::Result<()> {
        let total_lines = *table.line_of.last().unwrap_or(&0) + 1;
        if total_lines <= viewport.max_lines {
            return Ok(());
        }
        let visible_lines = viewport.max_lines.min(total_lines);
        let cur_line = table.line_of[viewport.current];
        let rows_up = visible_lines.saturating_sub(1);
        if rows_up > 0 {
            queue!(out, MoveToPreviousLine(rows_up as u16))?;
        }
        for row in 0..visible_lines {
            let glyph = scrollbar_glyph(row, visible_lines, total_lines, cur_line);
            write!(out, "\x1b[{}C{}", 1, glyph)?;
            if row + 1 < visible_lines {
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

fn scrollbar_glyph(row: usize, visible: usize, total: usize, cur_line: usize) -> char {
    if row == 0 {
        return '\u{25B2}'; // up triangle
    }
    if row + 1 == visible {
        return '\u{25BC}'; // down triangle
    }
    let represented_line = (cur_line * visible) / total.max(1);
    if represented_line == row {
        '\u{2588}' // cursor indicator
    } else {
        '\u{2502}' // bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_precedence_prefers_cursor_over_match() {
        let style = StyleSheet::default_palette();
        let mut w = Word::new("x".into());
        w.matching = true;
        let a_current = style.attrs_for(&w, true);
        let a_not = style.attrs_for(&w, false);
        assert!(a_current.reverse);
        assert!(!a_not.reverse);
    }

    #[test]
    fn excluded_word_gets_exclude_attrs_when_not_current() {
        let style = StyleSheet::default_palette();
        let mut w = Word::new("x".into());
        w.selectable = Selectable::Excluded;
        let a = style.attrs_for(&w, false);
        assert!(a.dim);
    }
}
