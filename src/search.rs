//! Prefix/substring/fuzzy search over the TST index, with per-word match
//! bitmaps and the fuzzy "badness" score. Grounded on
//! `original_source/index.c`'s level-list traversal idea
//! (`tst_substring_traverse`/`tst_fuzzy_traverse`); badness/highlight
//! scoring additionally grounded on the fuzzy-picker shape seen in the
//! pack's `other_examples/` (`nucleo-picker`-style contiguous-vs-gapped
//! scoring, `fzf-wrapper.rs`-style per-glyph highlighting).

use crate::tst::Tst;
use crate::word::WordTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    None,
    Prefix,
    Substring,
    Fuzzy,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub mode_stack: Vec<SearchMode>,
    pub mode: SearchMode,
    pub buffer: String,
    pub matching_words: Vec<usize>,
    pub best_matches: Vec<usize>,
    pub start_affinity: bool,
    pub end_affinity: bool,
    pub fuzzy_error: bool,
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::None
    }
}

impl SearchState {
    pub fn new() -> Self {
        SearchState::default()
    }

    pub fn is_active(&self) -> bool {
        self.mode != SearchMode::None
    }

    pub fn enter_mode(&mut self, mode: SearchMode) {
        self.mode = mode;
        self.buffer.clear();
        self.matching_words.clear();
        self.best_matches.clear();
        self.fuzzy_error = false;
    }

    pub fn push_char(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn backspace(&mut self) -> bool {
        self.buffer.pop().is_some()
    }

    /// Clears search mode entirely; caller is responsible for clearing
    /// bitmaps/`matching` on the previously matched words via
    /// [`clear_matches`] before calling this.
    pub fn leave(&mut self) {
        self.mode = SearchMode::None;
        self.buffer.clear();
        self.matching_words.clear();
        self.best_matches.clear();
        self.fuzzy_error = false;
    }
}

/// Clears `matching`/bitmap on every word currently in `state.matching_words`.
pub fn clear_matches(table: &mut WordTable, state: &mut SearchState) {
    for &idx in &state.matching_words {
        let w = table.get_mut(idx);
        w.matching = false;
        w.clear_bitmap();
    }
    state.matching_words.clear();
    state.best_matches.clear();
}

/// Recomputes `matching_words`/`best_matches`/per-word bitmaps from
/// scratch for the current buffer and mode. Called after every buffer
/// mutation and after any relayout event (per the resolved Open Question:
/// the search buffer survives a resize and matches are rebuilt afterward).
pub fn rebuild_matches(table: &mut WordTable, tst: &Tst, state: &mut SearchState) {
    clear_matches(table, state);
    if state.mode == SearchMode::None || state.buffer.is_empty() {
        return;
    }

    let needle: Vec<char> = state.buffer.chars().collect();
    let mut matched: Vec<(usize, usize, Vec<usize>)> = Vec::new(); // (word, badness, positions)

    match state.mode {
        SearchMode::None => {}
        SearchMode::Prefix => {
            for idx in tst.prefix_search(&state.buffer) {
                matched.push((idx, 0, (0..needle.len()).collect()));
            }
        }
        SearchMode::Substring => {
            let candidates = candidate_words(tst, &needle, false);
            for idx in candidates {
                let hay: Vec<char> = table.get(idx).display_bytes.chars().collect();
                if let Some(pos) = find_substring(&hay, &needle, false) {
                    let positions = (pos..pos + needle.len()).collect();
                    matched.push((idx, 0, positions));
                }
            }
        }
        SearchMode::Fuzzy => {
            let candidates = candidate_words(tst, &needle, true);
            for idx in candidates {
                let hay: Vec<char> = table.get(idx).display_bytes.chars().collect();
                if let Some((positions, badness)) = fuzzy_subsequence(&hay, &needle) {
                    matched.push((idx, badness, positions));
                }
            }
        }
    }

    matched = apply_affinity(table, matched, state);
    matched.sort_by_key(|(idx, _, _)| *idx);

    for (idx, badness, positions) in &matched {
        let w = table.get_mut(*idx);
        w.matching = true;
        w.ensure_bitmap();
        for &p in positions {
            w.set_bit(p);
        }
        if *badness == 0 {
            state.best_matches.push(*idx);
        }
    }
    state.matching_words = matched.into_iter().map(|(idx, _, _)| idx).collect();
}

fn apply_affinity(
    table: &WordTable,
    matched: Vec<(usize, usize, Vec<usize>)>,
    state: &SearchState,
) -> Vec<(usize, usize, Vec<usize>)> {
    if !state.start_affinity && !state.end_affinity {
        return matched;
    }
    matched
        .into_iter()
        .filter(|(idx, _, positions)| {
            let glyph_count = table.get(*idx).glyph_count;
            let first_ok = !state.start_affinity || positions.first() == Some(&0);
            let last_ok = !state.end_affinity || positions.last() == Some(&glyph_count.saturating_sub(1));
            first_ok && last_ok
        })
        .collect()
}

/// Uses the TST's level-list traversal (level 0 = root siblings matching
/// the first needle glyph, level n = reachable via equal-link chaining)
/// to narrow the candidate set before per-word positional matching.
fn candidate_words(tst: &Tst, needle: &[char], fuzzy: bool) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    if !fuzzy {
        let mut level = tst.level0(needle[0]);
        for &c in &needle[1..] {
            level = tst.advance_level(&level, c);
            if level.is_empty() {
                return Vec::new();
            }
        }
        let mut out = Vec::new();
        for node in level {
            out.extend_from_slice(tst.data_at(node));
        }
        out
    } else {
        let mut level: Vec<usize> = tst
            .level0(needle[0])
            .into_iter()
            .chain(fold_case_level0(tst, needle[0]))
            .collect();
        for &c in &needle[1..] {
            let advanced = tst.advance_level_fuzzy(&level, c, true);
            level = advanced.into_iter().map(|(n, _)| n).collect();
            if level.is_empty() {
                return Vec::new();
            }
        }
        let mut out = Vec::new();
        for node in level {
            out.extend_from_slice(tst.data_at(node));
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

fn fold_case_level0(tst: &Tst, c: char) -> Vec<usize> {
    let mut out = Vec::new();
    for folded in c.to_uppercase().chain(c.to_lowercase()) {
        if folded != c {
            out.extend(tst.level0(folded));
        }
    }
    out
}

fn find_substring(hay: &[char], needle: &[char], case_insensitive: bool) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    'outer: for start in 0..=hay.len() - needle.len() {
        for i in 0..needle.len() {
            let a = hay[start + i];
            let b = needle[i];
            let eq = if case_insensitive {
                a.to_lowercase().eq(b.to_lowercase())
            } else {
                a == b
            };
            if !eq {
                continue 'outer;
            }
        }
        return Some(start);
    }
    None
}

/// Greedy earliest-match subsequence search, case-insensitive. Returns the
/// matched glyph positions and the "badness" (number of unmatched glyphs
/// strictly between the first and last matched glyph). Badness zero means
/// the match is contiguous and belongs in `best_matches`.
fn fuzzy_subsequence(hay: &[char], needle: &[char]) -> Option<(Vec<usize>, usize)> {
    if needle.is_empty() {
        return None;
    }
    let mut positions = Vec::with_capacity(needle.len());
    let mut hi = 0usize;
    for &n in needle {
        let mut found = None;
        while hi < hay.len() {
            let eq = hay[hi].to_lowercase().eq(n.to_lowercase());
            hi += 1;
            if eq {
                found = Some(hi - 1);
                break;
            }
        }
        match found {
            Some(pos) => positions.push(pos),
            None => return None,
        }
    }
    let span = positions.last().unwrap() - positions.first().unwrap() + 1;
    let badness = span - needle.len();
    Some((positions, badness))
}

/// Move `current` to the next (`forward == true`) or previous matching
/// word via binary search over the sorted `matching_words` array.
pub fn next_match(matching_words: &[usize], current: usize, forward: bool) -> Option<usize> {
    if matching_words.is_empty() {
        return None;
    }
    if forward {
        match matching_words.binary_search(&current) {
            Ok(i) if i + 1 < matching_words.len() => Some(matching_words[i + 1]),
            Err(i) if i < matching_words.len() => Some(matching_words[i]),
            Ok(_) | Err(_) => Some(matching_words[0]),
        }
    } else {
        match matching_words.binary_search(&current) {
            Ok(i) if i > 0 => Some(matching_words[i - 1]),
            Err(i) if i > 0 => Some(matching_words[i - 1]),
            _ => Some(*matching_words.last().unwrap()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    fn build_table_and_tst(words: &[&str]) -> (WordTable, Tst) {
        let mut table = WordTable::new();
        let mut tst = Tst::new();
        for (i, w) in words.iter().enumerate() {
            table.push(Word::new((*w).to_string()));
            tst.insert(w, i);
        }
        (table, tst)
    }

    #[test]
    fn prefix_mode_marks_matching_words() {
        let (mut table, tst) = build_table_and_tst(&["apple", "ant", "bee"]);
        let mut state = SearchState::new();
        state.enter_mode(SearchMode::Prefix);
        state.push_char('a');
        state.push_char('n');
        rebuild_matches(&mut table, &tst, &mut state);
        assert_eq!(state.matching_words, vec![1]);
        assert!(table.get(1).matching);
        assert!(!table.get(0).matching);
    }

    #[test]
    fn fuzzy_mode_finds_ant_as_best_match() {
        let (mut table, tst) = build_table_and_tst(&["apple", "ant", "bee"]);
        let mut state = SearchState::new();
        state.enter_mode(SearchMode::Fuzzy);
        state.push_char('a');
        state.push_char('n');
        rebuild_matches(&mut table, &tst, &mut state);
        assert!(state.matching_words.contains(&0));
        assert!(state.matching_words.contains(&1));
        assert!(state.best_matches.contains(&1));
        assert!(!state.best_matches.contains(&0));
    }

    #[test]
    fn clearing_search_zeroes_all_bitmaps() {
        let (mut table, tst) = build_table_and_tst(&["apple", "ant"]);
        let mut state = SearchState::new();
        state.enter_mode(SearchMode::Prefix);
        state.push_char('a');
        rebuild_matches(&mut table, &tst, &mut state);
        clear_matches(&mut table, &mut state);
        for w in table.iter() {
            assert!(w.is_bitmap_all_zero());
            assert!(!w.matching);
        }
    }

    #[test]
    fn matching_words_stays_sorted() {
        let (mut table, tst) = build_table_and_tst(&["ba", "ab", "aa"]);
        let mut state = SearchState::new();
        state.enter_mode(SearchMode::Substring);
        state.push_char('a');
        rebuild_matches(&mut table, &tst, &mut state);
        let mut sorted = state.matching_words.clone();
        sorted.sort_unstable();
        assert_eq!(state.matching_words, sorted);
    }

    #[test]
    fn substring_mode_finds_needle_not_anchored_at_first_glyph() {
        let (mut table, tst) = build_table_and_tst(&["ant"]);
        let mut state = SearchState::new();
        state.enter_mode(SearchMode::Substring);
        state.push_char('n');
        state.push_char('t');
        rebuild_matches(&mut table, &tst, &mut state);
        assert_eq!(state.matching_words, vec![0]);
        assert!(table.get(0).matching);
    }

    #[test]
    fn fuzzy_mode_finds_needle_not_anchored_at_first_glyph() {
        let (mut table, tst) = build_table_and_tst(&["ant"]);
        let mut state = SearchState::new();
        state.enter_mode(SearchMode::Fuzzy);
        state.push_char('n');
        state.push_char('t');
        rebuild_matches(&mut table, &tst, &mut state);
        assert_eq!(state.matching_words, vec![0]);
        assert!(state.best_matches.contains(&0));
    }

    #[test]
    fn start_affinity_drops_matches_not_anchored_at_the_first_glyph() {
        let (mut table, tst) = build_table_and_tst(&["ant", "pant"]);
        let mut state = SearchState::new();
        state.enter_mode(SearchMode::Substring);
        state.start_affinity = true;
        state.push_char('a');
        state.push_char('n');
        state.push_char('t');
        rebuild_matches(&mut table, &tst, &mut state);
        assert_eq!(state.matching_words, vec![0]);
    }

    #[test]
    fn next_match_wraps_around() {
        let matches = vec![1, 4, 7];
        assert_eq!(next_match(&matches, 7, true), Some(1));
        assert_eq!(next_match(&matches, 1, false), Some(7));
    }
}
