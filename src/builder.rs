//! Turns the token stream into a fully-populated [`WordTable`]: filter
//! resolution, special-level tagging, direct-access numbering, sed-like
//! substitutions and non-printable mapping. Shaped after
//! `original_source/smenu.h`'s `word_s`/filter-enum layout, with row/column
//! filters combined under an any-exclude-is-permanent precedence rule.

use std::io::Read;

use regex::Regex;

use crate::error::BuildError;
use crate::layout::LayoutMode;
use crate::selector::{FilterKind, Selector, Substitution};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use crate::tst::Tst;
use crate::word::{Selectable, Word, WordTable};

#[derive(Debug, Clone, Copy)]
pub enum DaccessMode {
    None,
    Auto,
    Positional { byte_offset: usize },
}

pub struct BuilderConfig {
    pub row_filters: Vec<Selector>,
    pub column_filters: Vec<Selector>,
    pub special_regexes: [Option<Regex>; 5],
    pub daccess_mode: DaccessMode,
    pub daccess_width: usize,
    pub daccess_left_align: bool,
    pub daccess_pad_included_only: bool,
    pub daccess_brackets: (char, char),
    pub subs_all: Vec<Substitution>,
    pub subs_included: Vec<Substitution>,
    pub subs_excluded: Vec<Substitution>,
    pub blank_nonprintable: bool,
    pub layout_mode: LayoutMode,
    pub forced_first_column: Option<Regex>,
    pub forced_last_column: Option<Regex>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            row_filters: Vec::new(),
            column_filters: Vec::new(),
            special_regexes: Default::default(),
            daccess_mode: DaccessMode::None,
            daccess_width: 3,
            daccess_left_align: false,
            daccess_pad_included_only: true,
            daccess_brackets: ('(', ')'),
            subs_all: Vec::new(),
            subs_included: Vec::new(),
            subs_excluded: Vec::new(),
            blank_nonprintable: true,
            layout_mode: LayoutMode::FreeFlow,
            forced_first_column: None,
            forced_last_column: None,
        }
    }
}

pub struct BuildOutput {
    pub table: WordTable,
    pub search_tst: Tst,
    pub daccess_tst: Tst,
}

pub fn build<R: Read>(
    mut tokenizer: Tokenizer<R>,
    cfg: &BuilderConfig,
) -> Result<BuildOutput, BuildError> {
    let mut table = WordTable::new();
    let mut search_tst = Tst::new();
    let mut daccess_tst = Tst::new();

    let mut row_index = 0usize; // 1-based overall word position
    let mut col_index = 0usize; // 1-based column within the current record
    let mut auto_counter = 1u64;
    let mut pending_last_index: Option<usize> = None;

    loop {
        let token = match tokenizer.next_token()? {
            Some(t) => t,
            None => break,
        };
        row_index += 1;
        col_index += 1;

        if let Some(re) = &cfg.forced_first_column {
            if re.is_match(&token.text) {
                col_index = 1;
                if let Some(prev) = pending_last_index {
                    table.get_mut(prev).is_last = true;
                }
            }
        }

        let mut selectable = Selectable::SoftIncluded;
        for f in &cfg.row_filters {
            if f.matches(row_index, &token.text) {
                let vote = match f.kind {
                    FilterKind::Include => Selectable::Included,
                    FilterKind::Exclude => Selectable::Excluded,
                };
                selectable = selectable.combine(vote);
            }
        }
        for f in &cfg.column_filters {
            if f.matches(col_index, &token.text) {
                let vote = match f.kind {
                    FilterKind::Include => Selectable::Included,
                    FilterKind::Exclude => Selectable::Excluded,
                };
                selectable = selectable.combine(vote);
            }
        }
        let selectable = selectable.finalize();

        let mut special_level = 0u8;
        for (i, re) in cfg.special_regexes.iter().enumerate() {
            if let Some(re) = re {
                if re.is_match(&token.text) {
                    special_level = (i + 1) as u8;
                    break;
                }
            }
        }

        let mut is_last = token.is_last_of_record;
        if let Some(re) = &cfg.forced_last_column {
            if re.is_match(&token.text) {
                is_last = true;
            }
        }

        let mut text = token.text.clone();
        let original_before_subs = text.clone();
        let mut visual_only_changed = false;

        apply_subs(&cfg.subs_all, &mut text, &mut visual_only_changed);
        if selectable == Selectable::Included {
            apply_subs(&cfg.subs_included, &mut text, &mut visual_only_changed);
        } else {
            apply_subs(&cfg.subs_excluded, &mut text, &mut visual_only_changed);
        }

        if text.is_empty() && selectable == Selectable::Included {
            match cfg.layout_mode {
                LayoutMode::FreeFlow => {
                    // Empty selectable words are compressed out in free-flow mode.
                    row_index -= 1;
                    continue;
                }
                _ => {
                    return Err(BuildError::EmptyWordNotAllowed {
                        mode: match cfg.layout_mode {
                            LayoutMode::Column => "column",
                            LayoutMode::Line => "line",
                            LayoutMode::Tab => "tab",
                            LayoutMode::FreeFlow => unreachable!(),
                        },
                    });
                }
            }
        }

        let mut searchable_prefix_len = 0usize;
        if !matches!(cfg.daccess_mode, DaccessMode::None) {
            let selector_digits = match cfg.daccess_mode {
                DaccessMode::Auto => {
                    let n = auto_counter;
                    auto_counter += 1;
                    n.to_string()
                }
                DaccessMode::Positional { byte_offset } => extract_digit_run(&original_before_subs, byte_offset)
                    .unwrap_or_default(),
                DaccessMode::None => unreachable!(),
            };
            if !selector_digits.is_empty() {
                let should_pad = !cfg.daccess_pad_included_only || selectable == Selectable::Included;
                let field = if should_pad {
                    pad_selector(&selector_digits, cfg.daccess_width, cfg.daccess_left_align)
                } else {
                    selector_digits.clone()
                };
                let (lb, rb) = cfg.daccess_brackets;
                let prefix = format!("{lb}{field}{rb} ");
                searchable_prefix_len = prefix.chars().count();
                daccess_tst.insert(&selector_digits, table.len());
                text = format!("{prefix}{text}");
            }
        }

        if cfg.blank_nonprintable {
            text = blank_nonprintable(&text);
        }

        let mut word = Word::new(text);
        word.start = 0;
        word.end = 0;
        word.is_last = is_last;
        word.selectable = selectable;
        word.special_level = special_level;
        word.numbered = searchable_prefix_len > 0;
        word.searchable_prefix_len = searchable_prefix_len;
        if visual_only_changed {
            word.original_bytes = Some(original_before_subs);
        }

        let idx = table.len();
        if word.selectable == Selectable::Included {
            let key: String = word.display_bytes.chars().skip(word.searchable_prefix_len).collect();
            search_tst.insert(&key, idx);
        }
        table.push(word);
        pending_last_index = Some(idx);

        if is_last {
            col_index = 0;
        }
    }

    Ok(BuildOutput { table, search_tst, daccess_tst })
}

fn apply_subs(rules: &[Substitution], text: &mut String, visual_only_changed: &mut bool) {
    for rule in rules {
        let (out, matched) = rule.apply(text);
        if matched {
            if rule.visual_only {
                *visual_only_changed = true;
            }
            *text = out;
            if rule.stop_on_match {
                break;
            }
        }
    }
}

fn extract_digit_run(token: &str, byte_offset: usize) -> Option<String> {
    let bytes = token.as_bytes();
    if byte_offset >= bytes.len() {
        return None;
    }
    let mut start = byte_offset;
    while start < bytes.len() && !bytes[start].is_ascii_digit() {
        start += 1;
    }
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if start == end {
        None
    } else {
        Some(token[start..end].to_string())
    }
}

fn pad_selector(digits: &str, width: usize, left_align: bool) -> String {
    if digits.len() >= width {
        return digits.to_string();
    }
    let pad = " ".repeat(width - digits.len());
    if left_align {
        format!("{digits}{pad}")
    } else {
        format!("{pad}{digits}")
    }
}

fn blank_nonprintable(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0B}' => out.push_str("\\v"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_control() => out.push('?'),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteReader;

    fn build_from(input: &str, cfg: BuilderConfig) -> BuildOutput {
        let reader = ByteReader::new(input.as_bytes(), '?', vec![]);
        let tok = Tokenizer::new(reader, TokenizerConfig::default());
        build(tok, &cfg).unwrap()
    }

    #[test]
    fn simple_three_words_all_included() {
        let out = build_from("a b c\n", BuilderConfig::default());
        assert_eq!(out.table.len(), 3);
        assert!(out.table.iter().all(|w| w.selectable == Selectable::Included));
    }

    #[test]
    fn row_exclude_filter_excludes_matching_index() {
        let mut cfg = BuilderConfig::default();
        cfg.row_filters.push(Selector::parse("e2").unwrap());
        let out = build_from("a b c\n", cfg);
        assert_eq!(out.table.get(0).selectable, Selectable::Included);
        assert_eq!(out.table.get(1).selectable, Selectable::Excluded);
        assert_eq!(out.table.get(2).selectable, Selectable::Included);
    }

    #[test]
    fn auto_daccess_numbers_words_in_order() {
        let mut cfg = BuilderConfig::default();
        cfg.daccess_mode = DaccessMode::Auto;
        cfg.daccess_width = 1;
        let out = build_from("alpha beta\n", cfg);
        assert!(out.table.get(0).display_bytes.starts_with("(1)"));
        assert!(out.table.get(1).display_bytes.starts_with("(2)"));
        assert_eq!(out.daccess_tst.search("1"), Some(&[0usize][..]));
    }

    #[test]
    fn pad_included_only_skips_padding_on_excluded_words() {
        let mut cfg = BuilderConfig::default();
        cfg.daccess_mode = DaccessMode::Auto;
        cfg.daccess_width = 3;
        cfg.daccess_pad_included_only = true;
        cfg.row_filters.push(Selector::parse("e2").unwrap());
        let out = build_from("alpha beta\n", cfg);
        assert!(out.table.get(0).display_bytes.starts_with("(  1)"));
        assert_eq!(out.table.get(1).selectable, Selectable::Excluded);
        assert!(out.table.get(1).display_bytes.starts_with("(2)"));
    }

    #[test]
    fn substitution_applies_before_storing() {
        let mut cfg = BuilderConfig::default();
        cfg.subs_all.push(Substitution::parse("/a/X/").unwrap());
        let out = build_from("a b\n", cfg);
        assert_eq!(out.table.get(0).display_bytes, "X");
    }
}
