//! Places every word on a virtual grid, producing `line`/`start`/`end` per
//! word plus the `line_of`/`first_word_in_line` arrays the viewport scrolls
//! over. Column-padding bookkeeping grounded on
//! `original_source/smenu.h`'s per-column max-width parallel arrays.

use crate::word::WordTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    FreeFlow,
    Column,
    Line,
    Tab,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub mode: LayoutMode,
    pub term_cols: usize,
    pub wide: bool,
    pub center: bool,
    pub max_cols: Option<usize>,
    pub gutter_width: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            mode: LayoutMode::FreeFlow,
            term_cols: 80,
            wide: false,
            center: false,
            max_cols: None,
            gutter_width: 1,
        }
    }
}

/// Result of a layout pass: the offset to apply for centering, in addition
/// to the per-word `start`/`end`/`line` fields mutated directly on `table`.
pub struct LayoutResult {
    pub offset: usize,
    pub line_count: usize,
}

pub fn build_layout(table: &mut WordTable, opts: &LayoutOptions) -> LayoutResult {
    match opts.mode {
        LayoutMode::FreeFlow => build_free_flow(table, opts),
        LayoutMode::Tab => build_tab(table, opts),
        LayoutMode::Column | LayoutMode::Line => build_column(table, opts),
    }
}

fn usable_width(opts: &LayoutOptions) -> usize {
    opts.term_cols.saturating_sub(2)
}

fn build_free_flow(table: &mut WordTable, opts: &LayoutOptions) -> LayoutResult {
    let width = usable_width(opts);
    let mut line = 0usize;
    let mut col = 0usize;
    let mut line_of = Vec::with_capacity(table.len());
    let mut first_word_in_line = vec![0usize];
    let mut max_width = 0usize;

    for i in table.indices() {
        let w = table.get(i).display_width().max(1);
        let truncated = w.min(width);
        if col > 0 && col + 1 + truncated > width {
            line += 1;
            col = 0;
            first_word_in_line.push(i);
        }
        if col > 0 {
            col += 1; // gutter space
        }
        let start = col;
        let end = start + truncated.saturating_sub(1);
        {
            let word = table.get_mut(i);
            word.start = start;
            word.end = end;
            word.line = line;
        }
        col = end + 1;
        max_width = max_width.max(col);
        line_of.push(line);
    }

    table.line_of = line_of;
    table.first_word_in_line = first_word_in_line;
    let offset = compute_offset(opts, max_width);
    apply_offset(table, offset);
    LayoutResult { offset, line_count: line + 1 }
}

fn build_tab(table: &mut WordTable, opts: &LayoutOptions) -> LayoutResult {
    let width = usable_width(opts);
    let mut line = 0usize;
    let mut col = 0usize;
    let mut cols_on_line = 0usize;
    let mut line_of = Vec::with_capacity(table.len());
    let mut first_word_in_line = vec![0usize];
    let mut max_width = 0usize;

    for i in table.indices() {
        let w = table.get(i).display_width().max(1);
        let truncated = w.min(width);
        let hit_max_cols = opts.max_cols.is_some_and(|m| cols_on_line >= m);
        if (col > 0 && col + 1 + truncated > width) || hit_max_cols {
            line += 1;
            col = 0;
            cols_on_line = 0;
            first_word_in_line.push(i);
        }
        if col > 0 {
            col += 1;
        }
        let start = col;
        let end = start + truncated.saturating_sub(1);
        let is_last_word = table.get(i).is_last;
        {
            let word = table.get_mut(i);
            word.start = start;
            word.end = end;
            word.line = line;
        }
        col = end + 1;
        cols_on_line += 1;
        max_width = max_width.max(col);
        line_of.push(line);
        if is_last_word {
            line += 1;
            col = 0;
            cols_on_line = 0;
            if i + 1 < table.len() {
                first_word_in_line.push(i + 1);
            }
        }
    }
    if first_word_in_line.len() > line {
        first_word_in_line.truncate(line.max(1));
    }

    table.line_of = line_of;
    table.first_word_in_line = first_word_in_line;
    let offset = compute_offset(opts, max_width);
    apply_offset(table, offset);
    LayoutResult { offset, line_count: line.max(1) }
}

fn build_column(table: &mut WordTable, opts: &LayoutOptions) -> LayoutResult {
    // First pass: determine column membership per record and per-column max width.
    let mut col_widths: Vec<usize> = Vec::new();
    let mut records: Vec<Vec<usize>> = Vec::new();
    let mut current_record = Vec::new();
    for i in table.indices() {
        current_record.push(i);
        let col_idx = current_record.len() - 1;
        let w = table.get(i).display_width();
        if col_idx >= col_widths.len() {
            col_widths.push(w);
        } else {
            col_widths[col_idx] = col_widths[col_idx].max(w);
        }
        if table.get(i).is_last {
            records.push(std::mem::take(&mut current_record));
        }
    }
    if !current_record.is_empty() {
        records.push(current_record);
    }

    let line_mode = opts.mode == LayoutMode::Line;
    let width = usable_width(opts);

    // Wide mode: when the natural column layout leaves room on the line,
    // stretch every column's pad width so the grid fills the terminal
    // instead of hugging the left edge. Line mode pads each word to its own
    // width rather than a shared column width, so there is nothing to
    // stretch there.
    if opts.wide && !line_mode && !col_widths.is_empty() {
        let ncols = col_widths.len();
        let content_width = col_widths.iter().sum::<usize>() + opts.gutter_width.saturating_mul(ncols - 1);
        if width > content_width {
            let leftover = width - content_width;
            let base = leftover / ncols;
            let mut remainder = leftover % ncols;
            for cw in col_widths.iter_mut() {
                *cw += base;
                if remainder > 0 {
                    *cw += 1;
                    remainder -= 1;
                }
            }
        }
    }

    let mut line_of = vec![0usize; table.len()];
    let mut first_word_in_line = Vec::with_capacity(records.len());
    let mut max_width = 0usize;

    for (line, record) in records.iter().enumerate() {
        first_word_in_line.push(record[0]);
        let mut col = 0usize;
        for (col_idx, &i) in record.iter().enumerate() {
            let pad_width = if line_mode { table.get(i).display_width() } else { col_widths[col_idx] };
            let w = table.get(i).display_width().min(width);
            if col_idx > 0 {
                col += opts.gutter_width;
            }
            let start = col;
            let end = start + w.saturating_sub(1).max(0);
            {
                let word = table.get_mut(i);
                word.start = start;
                word.end = end;
            }
            col = start + pad_width.max(1);
            line_of[i] = line;
        }
        max_width = max_width.max(col);
    }
    for (line, record) in records.iter().enumerate() {
        for &i in record {
            table.get_mut(i).line = line;
        }
    }

    table.line_of = line_of;
    table.first_word_in_line = first_word_in_line;
    let offset = compute_offset(opts, max_width);
    apply_offset(table, offset);
    LayoutResult { offset, line_count: records.len().max(1) }
}

fn compute_offset(opts: &LayoutOptions, max_width: usize) -> usize {
    if opts.center {
        let width = usable_width(opts);
        if width > max_width {
            return (width - max_width) / 2;
        }
    }
    0
}

fn apply_offset(table: &mut WordTable, offset: usize) {
    if offset == 0 {
        return;
    }
    for w in table.iter_mut() {
        w.start += offset;
        w.end += offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    fn table_of(words: &[&str]) -> WordTable {
        let mut t = WordTable::new();
        for w in words {
            t.push(Word::new((*w).to_string()));
        }
        t
    }

    #[test]
    fn free_flow_wraps_at_term_width() {
        let mut t = table_of(&["aaaa", "bbbb", "cccc"]);
        let opts = LayoutOptions { term_cols: 12, ..Default::default() };
        build_layout(&mut t, &opts);
        assert_eq!(t.get(0).line, 0);
        assert!(t.get(1).line >= t.get(0).line);
        assert_eq!(t.first_word_in_line[0], 0);
    }

    #[test]
    fn build_layout_is_idempotent() {
        let mut t = table_of(&["a", "b", "c"]);
        let opts = LayoutOptions::default();
        build_layout(&mut t, &opts);
        let line_of_1 = t.line_of.clone();
        let first_1 = t.first_word_in_line.clone();
        build_layout(&mut t, &opts);
        assert_eq!(t.line_of, line_of_1);
        assert_eq!(t.first_word_in_line, first_1);
    }

    #[test]
    fn wide_word_is_truncated_to_term_width() {
        let mut t = table_of(&["abcdefghij"]);
        let opts = LayoutOptions { term_cols: 6, ..Default::default() };
        build_layout(&mut t, &opts);
        assert_eq!(t.get(0).end - t.get(0).start + 1, 4);
    }

    fn record_table(rows: &[[&str; 2]]) -> WordTable {
        let mut t = WordTable::new();
        for row in rows {
            for (i, w) in row.iter().enumerate() {
                let mut word = Word::new((*w).to_string());
                word.is_last = i == row.len() - 1;
                t.push(word);
            }
        }
        t
    }

    #[test]
    fn wide_mode_stretches_column_widths_to_fill_the_terminal() {
        let rows = [["a", "b"], ["cc", "dd"]];

        let mut narrow = record_table(&rows);
        let narrow_opts = LayoutOptions { mode: LayoutMode::Column, term_cols: 40, wide: false, ..Default::default() };
        build_layout(&mut narrow, &narrow_opts);
        let narrow_second_col_end = narrow.get(1).end;

        let mut wide = record_table(&rows);
        let wide_opts = LayoutOptions { mode: LayoutMode::Column, term_cols: 40, wide: true, ..Default::default() };
        build_layout(&mut wide, &wide_opts);
        let wide_second_col_end = wide.get(1).end;

        assert!(wide_second_col_end > narrow_second_col_end);
    }
}
