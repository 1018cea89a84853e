//! Two small grammars: the selector grammar used for column/row filters,
//! and the sed-like substitution syntax used for post-processing rules.

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Include,
    Exclude,
}

#[derive(Debug, Clone)]
pub enum Range {
    Index(usize),
    Span(usize, usize),
    Pattern(Regex),
}

impl Range {
    pub fn matches(&self, one_based_index: usize, text: &str) -> bool {
        match self {
            Range::Index(n) => *n == one_based_index,
            Range::Span(lo, hi) => one_based_index >= *lo && one_based_index <= *hi,
            Range::Pattern(re) => re.is_match(text),
        }
    }
}

/// `[i|e]<range>(,<range>)*`
#[derive(Debug, Clone)]
pub struct Selector {
    pub kind: FilterKind,
    pub ranges: Vec<Range>,
}

impl Selector {
    pub fn parse(spec: &str) -> Result<Selector, ConfigError> {
        let mut chars = spec.chars().peekable();
        let kind = match chars.peek() {
            Some('i') => {
                chars.next();
                FilterKind::Include
            }
            Some('e') => {
                chars.next();
                FilterKind::Exclude
            }
            _ => FilterKind::Include,
        };
        let rest: String = chars.collect();
        let mut ranges = Vec::new();
        for part in rest.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            ranges.push(parse_range(part)?);
        }
        Ok(Selector { kind, ranges })
    }

    pub fn matches(&self, one_based_index: usize, text: &str) -> bool {
        self.ranges.iter().any(|r| r.matches(one_based_index, text))
    }
}

fn parse_range(part: &str) -> Result<Range, ConfigError> {
    if let Some(body) = part.strip_prefix('/').and_then(|s| s.strip_suffix('/')) {
        let re = Regex::new(body)?;
        return Ok(Range::Pattern(re));
    }
    if let Some((lo, hi)) = part.split_once('-') {
        let lo: usize = lo.trim().parse().map_err(|_| ConfigError::Parse {
            path: "selector".into(),
            reason: format!("invalid range start: {lo}"),
        })?;
        let hi: usize = hi.trim().parse().map_err(|_| ConfigError::Parse {
            path: "selector".into(),
            reason: format!("invalid range end: {hi}"),
        })?;
        return Ok(Range::Span(lo, hi));
    }
    let n: usize = part.parse().map_err(|_| ConfigError::Parse {
        path: "selector".into(),
        reason: format!("invalid selector token: {part}"),
    })?;
    Ok(Range::Index(n))
}

/// `/regex/replacement/flags`
#[derive(Debug, Clone)]
pub struct Substitution {
    pub regex: Regex,
    pub replacement: String,
    pub global: bool,
    pub visual_only: bool,
    pub stop_on_match: bool,
}

impl Substitution {
    pub fn parse(spec: &str) -> Result<Substitution, ConfigError> {
        let mut chars = spec.chars();
        let sep = chars.next().ok_or_else(|| ConfigError::Parse {
            path: "substitution".into(),
            reason: "empty substitution rule".into(),
        })?;
        if sep.is_ascii_digit() || !sep.is_ascii_graphic() {
            return Err(ConfigError::Parse {
                path: "substitution".into(),
                reason: format!("separator {sep:?} must be graphic and non-digit"),
            });
        }
        let rest: String = chars.collect();
        let parts: Vec<&str> = split_unescaped(&rest, sep);
        if parts.len() != 3 {
            return Err(ConfigError::Parse {
                path: "substitution".into(),
                reason: format!("expected 3 fields separated by {sep:?}, got {}", parts.len()),
            });
        }
        let pattern = parts[0];
        let replacement = parts[1].to_string();
        let flags = parts[2];
        let global = flags.contains('g');
        let visual_only = flags.contains('v');
        let stop_on_match = flags.contains('s');
        let case_insensitive = flags.contains('i');

        let regex = RegexBuilder::new(pattern).case_insensitive(case_insensitive).build()?;

        Ok(Substitution { regex, replacement, global, visual_only, stop_on_match })
    }

    /// Apply to `text`, returning the replaced text and whether anything
    /// matched. Backreferences `\1..\9` and whole-match `&` are supported
    /// via the `regex` crate's `$1`-style syntax translated from sed-style.
    pub fn apply(&self, text: &str) -> (String, bool) {
        let translated = translate_replacement(&self.replacement);
        if self.global {
            let mut matched = false;
            let out = self.regex.replace_all(text, |caps: &regex::Captures| {
                matched = true;
                expand(&translated, caps)
            });
            (out.into_owned(), matched)
        } else if let Some(caps) = self.regex.captures(text) {
            let expanded = expand(&translated, &caps);
            let m = caps.get(0).unwrap();
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..m.start()]);
            out.push_str(&expanded);
            out.push_str(&text[m.end()..]);
            (out, true)
        } else {
            (text.to_string(), false)
        }
    }
}

fn expand(translated: &str, caps: &regex::Captures) -> String {
    let mut dst = String::new();
    caps.expand(translated, &mut dst);
    dst
}

/// sed-style `&` (whole match) and `\N` backreferences become `regex`'s
/// `$0`/`$N`; a literal `$` is escaped so it is never misread as a group.
fn translate_replacement(repl: &str) -> String {
    let mut out = String::new();
    let mut chars = repl.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '&' => out.push_str("$0"),
            '\\' => match chars.peek() {
                Some(d) if d.is_ascii_digit() => {
                    out.push('$');
                    out.push(*d);
                    chars.next();
                }
                Some('&') => {
                    out.push('&');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// Split `s` on unescaped occurrences of `sep`, keeping exactly 3 pieces
/// worth of separators relevant (pattern/replacement/flags).
fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let bytes: Vec<(usize, char)> = s.char_indices().collect();
    for &(i, c) in &bytes {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parses_mixed_ranges() {
        let sel = Selector::parse("i1,3-5").unwrap();
        assert_eq!(sel.kind, FilterKind::Include);
        assert!(sel.matches(1, ""));
        assert!(sel.matches(4, ""));
        assert!(!sel.matches(2, ""));
    }

    #[test]
    fn selector_leading_digit_implies_include() {
        let sel = Selector::parse("2").unwrap();
        assert_eq!(sel.kind, FilterKind::Include);
    }

    #[test]
    fn selector_regex_range() {
        let sel = Selector::parse("e/^foo/").unwrap();
        assert_eq!(sel.kind, FilterKind::Exclude);
        assert!(sel.matches(99, "foobar"));
        assert!(!sel.matches(99, "barfoo"));
    }

    #[test]
    fn substitution_basic_replace() {
        let s = Substitution::parse("/foo/bar/").unwrap();
        let (out, matched) = s.apply("foofoo");
        assert!(matched);
        assert_eq!(out, "barfoo");
    }

    #[test]
    fn substitution_global_flag() {
        let s = Substitution::parse("/foo/bar/g").unwrap();
        let (out, _) = s.apply("foofoo");
        assert_eq!(out, "barbar");
    }

    #[test]
    fn substitution_backreference() {
        let s = Substitution::parse(r"/(a)(b)/\2\1/").unwrap();
        let (out, _) = s.apply("ab");
        assert_eq!(out, "ba");
    }

    #[test]
    fn substitution_whole_match_ampersand() {
        let s = Substitution::parse("/foo/[&]/").unwrap();
        let (out, _) = s.apply("foo");
        assert_eq!(out, "[foo]");
    }
}
