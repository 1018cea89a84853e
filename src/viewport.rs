//! The cursor/viewport state machine: current word, visible window,
//! horizontal pan, and all movement commands. Shaped after
//! `choose_impl/scroll.rs`'s viewport math (`locate_cursor_in_viewport`,
//! `get_scroll_adjusted_row_index`) and `choose_impl/state.rs`'s
//! resize-hint recomputation pattern, generalized from a single-column list
//! to a 2D word grid plus horizontal pan.

use crate::word::{Selectable, WordTable};

#[derive(Debug, Clone)]
pub struct Viewport {
    pub start: usize,
    pub end: usize,
    pub max_lines: usize,
    pub first_column: usize,
    pub current: usize,
    pub cur_line: usize,
    pub offset: usize,
    pub message_lines: usize,
    pub term_cols: usize,
}

impl Viewport {
    pub fn new(max_lines: usize, term_cols: usize) -> Self {
        Viewport {
            start: 0,
            end: 0,
            max_lines,
            first_column: 0,
            current: 0,
            cur_line: 0,
            offset: 0,
            message_lines: 0,
            term_cols,
        }
    }

    fn margin(&self) -> usize {
        3
    }

    /// Recomputes `start`/`end`/`cur_line` so that `current` is visible:
    /// `start <= current <= end`, and `end - start + 1` fits the window.
    pub fn recompute_window(&mut self, table: &WordTable) {
        if table.is_empty() {
            self.start = 0;
            self.end = 0;
            return;
        }
        let cur_line = table.line_of[self.current];
        self.cur_line = cur_line;

        let last_line = *table.line_of.last().unwrap();
        let mut top_line = cur_line.min(self.start_line(table));
        if cur_line < top_line {
            top_line = cur_line;
        }
        if cur_line >= top_line + self.max_lines {
            top_line = cur_line + 1 - self.max_lines;
        }
        let bottom_line = (top_line + self.max_lines - 1).min(last_line);

        self.start = table.first_word_in_line[top_line];
        self.end = if bottom_line + 1 < table.first_word_in_line.len() {
            table.first_word_in_line[bottom_line + 1] - 1
        } else {
            table.len() - 1
        };

        self.adjust_horizontal(table);
    }

    fn start_line(&self, table: &WordTable) -> usize {
        if self.start < table.line_of.len() {
            table.line_of[self.start]
        } else {
            0
        }
    }

    fn adjust_horizontal(&mut self, table: &WordTable) {
        let w = table.get(self.current);
        let usable = self.term_cols.saturating_sub(self.margin());
        if w.start < self.first_column {
            self.first_column = w.start;
        } else if w.end >= self.first_column + usable {
            self.first_column = w.end + 1 - usable;
        }
    }

    pub fn move_left(&mut self, table: &WordTable) -> bool {
        self.step_horizontal(table, -1)
    }

    pub fn move_right(&mut self, table: &WordTable) -> bool {
        self.step_horizontal(table, 1)
    }

    fn step_horizontal(&mut self, table: &WordTable, dir: isize) -> bool {
        let mut i = self.current as isize;
        loop {
            i += dir;
            if i < 0 || i as usize >= table.len() {
                return false;
            }
            if table.get(i as usize).selectable == Selectable::Included {
                self.current = i as usize;
                self.recompute_window(table);
                return true;
            }
        }
    }

    /// The target word on a destination line, per the "best-word choice"
    /// rule: rightmost word whose `start <= source.start`, nudged to the
    /// nearest selectable word if that one isn't selectable.
    fn best_word_on_line(&self, table: &WordTable, line: usize, source_start: usize) -> Option<usize> {
        if line >= table.first_word_in_line.len() {
            return None;
        }
        let first = table.first_word_in_line[line];
        let last = if line + 1 < table.first_word_in_line.len() {
            table.first_word_in_line[line + 1] - 1
        } else {
            table.len() - 1
        };
        let mut best = first;
        for i in first..=last {
            if table.get(i).start <= source_start {
                best = i;
            } else {
                break;
            }
        }
        if table.get(best).selectable == Selectable::Included {
            return Some(best);
        }
        for i in (first..=best).rev() {
            if table.get(i).selectable == Selectable::Included {
                return Some(i);
            }
        }
        for i in best..=last {
            if table.get(i).selectable == Selectable::Included {
                return Some(i);
            }
        }
        None
    }

    fn move_by_lines(&mut self, table: &WordTable, delta: isize) -> bool {
        let source_start = table.get(self.current).start;
        let mut line = self.cur_line as isize;
        let last_line = *table.line_of.last().unwrap_or(&0) as isize;
        loop {
            line += delta;
            if line < 0 || line > last_line {
                return false;
            }
            if let Some(target) = self.best_word_on_line(table, line as usize, source_start) {
                self.current = target;
                self.recompute_window(table);
                return true;
            }
        }
    }

    pub fn move_up(&mut self, table: &WordTable) -> bool {
        self.move_by_lines(table, -1)
    }

    pub fn move_down(&mut self, table: &WordTable) -> bool {
        self.move_by_lines(table, 1)
    }

    pub fn page_up(&mut self, table: &WordTable) -> bool {
        self.move_by_lines(table, -(self.max_lines as isize))
    }

    pub fn page_down(&mut self, table: &WordTable) -> bool {
        self.move_by_lines(table, self.max_lines as isize)
    }

    pub fn line_home(&mut self, table: &WordTable) {
        let line = self.cur_line;
        if let Some(target) = self.first_selectable_in_line(table, line) {
            self.current = target;
            self.recompute_window(table);
        }
    }

    pub fn line_end(&mut self, table: &WordTable) {
        let line = self.cur_line;
        if let Some(target) = self.last_selectable_in_line(table, line) {
            self.current = target;
            self.recompute_window(table);
        }
    }

    fn first_selectable_in_line(&self, table: &WordTable, line: usize) -> Option<usize> {
        let first = table.first_word_in_line[line];
        let last = if line + 1 < table.first_word_in_line.len() {
            table.first_word_in_line[line + 1] - 1
        } else {
            table.len() - 1
        };
        (first..=last).find(|&i| table.get(i).selectable == Selectable::Included)
    }

    fn last_selectable_in_line(&self, table: &WordTable, line: usize) -> Option<usize> {
        let first = table.first_word_in_line[line];
        let last = if line + 1 < table.first_word_in_line.len() {
            table.first_word_in_line[line + 1] - 1
        } else {
            table.len() - 1
        };
        (first..=last).rev().find(|&i| table.get(i).selectable == Selectable::Included)
    }

    pub fn table_home(&mut self, table: &WordTable) {
        if let Some(i) = table.selectable_indices().into_iter().next() {
            self.current = i;
            self.recompute_window(table);
        }
    }

    pub fn table_end(&mut self, table: &WordTable) {
        if let Some(&i) = table.selectable_indices().last() {
            self.current = i;
            self.recompute_window(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{build_layout, LayoutOptions};
    use crate::word::Word;

    fn table_of(words: &[&str]) -> WordTable {
        let mut t = WordTable::new();
        for w in words {
            let mut word = Word::new((*w).to_string());
            word.selectable = Selectable::Included;
            t.push(word);
        }
        build_layout(&mut t, &LayoutOptions::default());
        t
    }

    #[test]
    fn move_right_then_left_returns_to_origin() {
        let table = table_of(&["a", "b", "c"]);
        let mut vp = Viewport::new(5, 80);
        vp.recompute_window(&table);
        vp.move_right(&table);
        vp.move_right(&table);
        vp.move_left(&table);
        vp.move_left(&table);
        assert_eq!(vp.current, 0);
    }

    #[test]
    fn horizontal_move_skips_non_selectable() {
        let mut t = WordTable::new();
        let mut a = Word::new("a".into());
        a.selectable = Selectable::Included;
        t.push(a);
        let mut b = Word::new("b".into());
        b.selectable = Selectable::Excluded;
        t.push(b);
        let mut c = Word::new("c".into());
        c.selectable = Selectable::Included;
        t.push(c);
        build_layout(&mut t, &LayoutOptions::default());
        let mut vp = Viewport::new(5, 80);
        vp.recompute_window(&t);
        vp.move_right(&t);
        assert_eq!(vp.current, 2);
    }

    #[test]
    fn current_always_within_viewport_window() {
        let table = table_of(&["a", "b", "c", "d", "e"]);
        let mut vp = Viewport::new(2, 80);
        vp.recompute_window(&table);
        assert!(vp.start <= vp.current && vp.current <= vp.end);
    }
}
