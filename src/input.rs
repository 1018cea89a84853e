//! Maps raw terminal input to a closed set of logical actions, plus the
//! direct-access digit stack. `crossterm::event` already performs the
//! non-blocking multi-byte escape-sequence decode (arrow keys, Home/End,
//! mouse reports); the decoder here is the seam between that and the
//! cursor controller, shaped after `choose_impl/keypress_reader_sync.rs`'s
//! `KeyPressReader` trait (a `VecDeque`-backed test double over
//! `crossterm::event::read`).

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::search::SearchMode;
use crate::tst::Tst;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    LineHome,
    LineEnd,
    TableHome,
    TableEnd,
    ToggleTag,
    TagMatching,
    UntagMatching,
    Digit(char),
    EnterSearchMode(SearchMode),
    SearchChar(char),
    SearchBackspace,
    SearchEscape,
    NextMatch,
    PrevMatch,
    ToggleHelp,
    Accept,
    Abort,
    Unknown,
}

/// A seam over the real terminal event source so tests can feed a
/// deterministic sequence of events without a tty.
pub trait KeyPressReader {
    /// Block for at most `timeout`; `None` means the timeout elapsed with
    /// no event (the main loop uses this to still service its 100ms tick).
    fn next_event(&mut self, timeout: Duration) -> Option<Event>;
}

pub struct CrosstermReader;

impl KeyPressReader for CrosstermReader {
    fn next_event(&mut self, timeout: Duration) -> Option<Event> {
        if event::poll(timeout).unwrap_or(false) {
            event::read().ok()
        } else {
            None
        }
    }
}

/// Decodes a single [`Event`] into an [`Action`], in the context of
/// whether search mode is currently active (so plain characters either
/// extend the search buffer or act as movement/command keys) and whether
/// tagging is enabled.
pub fn decode(event: &Event, searching: bool, tagging_enabled: bool) -> Action {
    let key = match event {
        Event::Key(k) if k.kind != KeyEventKind::Release => k,
        _ => return Action::Unknown,
    };

    if searching {
        return match key.code {
            KeyCode::Esc => Action::SearchEscape,
            KeyCode::Enter => Action::Accept,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Tab => Action::NextMatch,
            KeyCode::BackTab => Action::PrevMatch,
            KeyCode::Char(c) => Action::SearchChar(c),
            _ => Action::Unknown,
        };
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Abort,
            KeyCode::Char('k') => Action::TableHome,
            KeyCode::Char('j') => Action::TableEnd,
            _ => Action::Unknown,
        };
    }

    match key.code {
        KeyCode::Left => Action::MoveLeft,
        KeyCode::Right => Action::MoveRight,
        KeyCode::Up => Action::MoveUp,
        KeyCode::Down => Action::MoveDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home if key.modifiers.contains(KeyModifiers::SHIFT) => Action::TableHome,
        KeyCode::End if key.modifiers.contains(KeyModifiers::SHIFT) => Action::TableEnd,
        KeyCode::Home => Action::LineHome,
        KeyCode::End => Action::LineEnd,
        KeyCode::Enter => Action::Accept,
        KeyCode::Esc => Action::Abort,
        KeyCode::Insert | KeyCode::Delete => {
            if tagging_enabled {
                Action::ToggleTag
            } else {
                Action::Unknown
            }
        }
        KeyCode::Char(c) if c.is_ascii_digit() => Action::Digit(c),
        KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Char('J') => Action::PageDown,
        KeyCode::Char('K') => Action::PageUp,
        KeyCode::Char('H') => Action::LineHome,
        KeyCode::Char('L') => Action::LineEnd,
        KeyCode::Char('t') if tagging_enabled => Action::ToggleTag,
        KeyCode::Char('T') if tagging_enabled => Action::TagMatching,
        KeyCode::Char('U') if tagging_enabled => Action::UntagMatching,
        KeyCode::Char('q') => Action::Abort,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('=') => Action::EnterSearchMode(SearchMode::Prefix),
        KeyCode::Char('^') => Action::EnterSearchMode(SearchMode::Prefix),
        KeyCode::Char('~') => Action::EnterSearchMode(SearchMode::Fuzzy),
        KeyCode::Char('*') => Action::EnterSearchMode(SearchMode::Fuzzy),
        KeyCode::Char('\'') | KeyCode::Char('"') => Action::EnterSearchMode(SearchMode::Substring),
        KeyCode::Char('/') => Action::EnterSearchMode(SearchMode::Substring),
        _ => Action::Unknown,
    }
}

/// Up to `width` digits entered as a direct-access selector. A lookup
/// against the direct-access TST happens after every push; the stack
/// resets on timeout or a failed lookup beyond the configured width.
pub struct DirectAccessStack {
    digits: String,
    pub width: usize,
}

impl DirectAccessStack {
    pub fn new(width: usize) -> Self {
        DirectAccessStack { digits: String::new(), width }
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Pushes `digit`, ignoring it if the stack is already at its
    /// configured width. Returns the matching word index, if the
    /// direct-access TST has one for the accumulated digits.
    pub fn push(&mut self, digit: char, daccess_tst: &Tst) -> Option<usize> {
        if self.digits.len() >= self.width {
            return None;
        }
        self.digits.push(digit);
        daccess_tst.search(&self.digits).and_then(|v| v.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_access_ignores_pushes_past_configured_width() {
        let mut stack = DirectAccessStack::new(2);
        let tst = Tst::new();
        stack.push('1', &tst);
        stack.push('2', &tst);
        assert!(stack.push('3', &tst).is_none());
        assert_eq!(stack.digits.len(), 2);
    }

    #[test]
    fn direct_access_hit_returns_word_index() {
        let mut tst = Tst::new();
        tst.insert("12", 7);
        let mut stack = DirectAccessStack::new(4);
        stack.push('1', &tst);
        let hit = stack.push('2', &tst);
        assert_eq!(hit, Some(7));
    }

    #[test]
    fn vi_keys_map_to_movement_actions() {
        use crossterm::event::KeyEvent;
        let ev = Event::Key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::NONE));
        assert_eq!(decode(&ev, false, false), Action::MoveRight);
    }
}
