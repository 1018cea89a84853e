//! Decides what to write to the real stdout on Enter.

use std::io::Write;

use crate::word::WordTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutMode {
    Current,
    Quit,
    Word,
}

pub struct OutputOptions<'a> {
    pub tagging_enabled: bool,
    pub autotag: bool,
    pub pinning: bool,
    pub keep_spaces: bool,
    pub separator: &'a str,
    pub timeout_mode: TimeoutMode,
    pub timeout_word: &'a str,
}

fn trim_word(s: &str, keep_spaces: bool) -> String {
    if keep_spaces {
        s.to_string()
    } else {
        s.trim_matches(|c: char| c == ' ' || c == '\t').to_string()
    }
}

/// Builds the exact text to emit; does not itself decide exit code.
pub fn build_output(table: &mut WordTable, current: usize, opts: &OutputOptions) -> String {
    if opts.timeout_mode == TimeoutMode::Word {
        return opts.timeout_word.to_string();
    }

    if opts.tagging_enabled {
        if table.tagged_indices_in_tag_order().is_empty() && opts.autotag {
            table.tag(current);
        }
        let indices = if opts.pinning {
            table.tagged_indices_in_tag_order()
        } else {
            table.indices().filter(|&i| table.get(i).tagged).collect()
        };
        if !indices.is_empty() {
            return indices
                .iter()
                .map(|&i| trim_word(table.get(i).emit_text(), opts.keep_spaces))
                .collect::<Vec<_>>()
                .join(opts.separator);
        }
    }

    trim_word(table.get(current).emit_text(), opts.keep_spaces)
}

/// Writes `text` followed by a newline to the caller's real stdout stream
/// (never `/dev/tty`).
pub fn emit(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    writeln!(out, "{text}")
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
    fn plain_emits_current_word() {
        let mut t = table_of(&["a", "b", "c"]);
        let opts = OutputOptions {
            tagging_enabled: false,
            autotag: false,
            pinning: false,
            keep_spaces: true,
            separator: " ",
            timeout_mode: TimeoutMode::Current,
            timeout_word: "",
        };
        assert_eq!(build_output(&mut t, 2, &opts), "c");
    }

    #[test]
    fn tagged_words_join_with_separator() {
        let mut t = table_of(&["one", "two", "three"]);
        t.tag(0);
        t.tag(1);
        let opts = OutputOptions {
            tagging_enabled: true,
            autotag: false,
            pinning: false,
            keep_spaces: true,
            separator: ",",
            timeout_mode: TimeoutMode::Current,
            timeout_word: "",
        };
        assert_eq!(build_output(&mut t, 2, &opts), "one,two");
    }

    #[test]
    fn pinning_respects_tag_order_not_table_order() {
        let mut t = table_of(&["one", "two", "three"]);
        t.tag(2);
        t.tag(0);
        let opts = OutputOptions {
            tagging_enabled: true,
            autotag: false,
            pinning: true,
            keep_spaces: true,
            separator: ",",
            timeout_mode: TimeoutMode::Current,
            timeout_word: "",
        };
        assert_eq!(build_output(&mut t, 1, &opts), "three,one");
    }

    #[test]
    fn timeout_word_mode_overrides_everything() {
        let mut t = table_of(&["a"]);
        let opts = OutputOptions {
            tagging_enabled: false,
            autotag: false,
            pinning: false,
            keep_spaces: true,
            separator: " ",
            timeout_mode: TimeoutMode::Word,
            timeout_word: "KO",
        };
        assert_eq!(build_output(&mut t, 0, &opts), "KO");
    }

    #[test]
    fn keep_spaces_off_trims_leading_and_trailing_blanks() {
        let mut t = table_of(&["  hi  "]);
        let opts = OutputOptions {
            tagging_enabled: false,
            autotag: false,
            pinning: false,
            keep_spaces: false,
            separator: " ",
            timeout_mode: TimeoutMode::Current,
            timeout_word: "",
        };
        assert_eq!(build_output(&mut t, 0, &opts), "hi");
    }
}
