//! The main event loop: reads one [`Action`] at a time and applies it to
//! the viewport, search, and tag state, repainting after every change.
//! Shaped after `choose_impl/event_loop.rs`
//! (`enter_event_loop_sync`/`EventLoopResult`/`run_before_event_loop`/
//! `run_after_event_loop`), generalized from its async `tokio::select!` over
//! a handful of input/resize/signal streams to a single synchronous
//! 100 ms-ticked poll loop servicing four debounce timers plus signal flags,
//! since this crate has no async runtime in its stack.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::Event;

use crate::input::{decode, Action, DirectAccessStack, KeyPressReader};
use crate::layout::{build_layout, LayoutOptions};
use crate::output::{build_output, OutputOptions, TimeoutMode};
use crate::render::{Renderer, StyleSheet};
use crate::search::{clear_matches, next_match, rebuild_matches, SearchState};
use crate::term::signals::SignalFlags;
use crate::tst::Tst;
use crate::viewport::Viewport;
use crate::word::WordTable;

const HELP_TEXT: &str =
    "?:help  h/l j/k:move  H/L:line ends  K/J:page  t:tag T/U:tag/untag matches  /~=:search  Enter:accept  q/Esc:quit";

/// What the main loop produced once it stops polling for events.
#[derive(Debug)]
pub enum Outcome {
    Accept(String),
    Abort,
    Signal(i32),
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub tagging_enabled: bool,
    pub autotag: bool,
    pub pinning: bool,
    pub keep_spaces: bool,
    pub tag_separator: String,
    pub timeout_mode: TimeoutMode,
    pub timeout_word: String,
    pub timeout_seconds: Option<u64>,
    pub gutter: String,
    pub column_like: bool,
    pub help_ms: u64,
    pub daccess_width: usize,
    pub daccess_timer_ms: u64,
    pub search_idle_ms: u64,
    pub resize_debounce_ms: u64,
    pub search_start_affinity: bool,
    pub search_end_affinity: bool,
}

/// Owns every piece of runtime state the loop touches. Construction takes
/// the already-built word table and TSTs (from [`crate::builder::build`])
/// plus the layout options used to lay the table out initially and again on
/// every resize.
pub struct App {
    table: WordTable,
    search_tst: Tst,
    daccess_tst: Tst,
    layout: LayoutOptions,
    viewport: Viewport,
    search: SearchState,
    daccess: DirectAccessStack,
    style: StyleSheet,
    signals: SignalFlags,
    opts: AppOptions,

    help_active: bool,
    help_deadline: Option<Instant>,
    daccess_deadline: Option<Instant>,
    search_idle_deadline: Option<Instant>,
    resize_pending: bool,
    resize_deadline: Option<Instant>,
    user_deadline: Option<Instant>,
}

impl App {
    pub fn new(
        mut table: WordTable,
        search_tst: Tst,
        daccess_tst: Tst,
        layout: LayoutOptions,
        window_height: usize,
        style: StyleSheet,
        signals: SignalFlags,
        opts: AppOptions,
    ) -> Self {
        build_layout(&mut table, &layout);
        let mut viewport = Viewport::new(window_height, layout.term_cols);
        viewport.table_home(&table);
        viewport.recompute_window(&table);

        let daccess = DirectAccessStack::new(opts.daccess_width);
        let user_deadline = opts.timeout_seconds.map(|s| Instant::now() + Duration::from_secs(s));

        let mut search = SearchState::new();
        search.start_affinity = opts.search_start_affinity;
        search.end_affinity = opts.search_end_affinity;

        App {
            table,
            search_tst,
            daccess_tst,
            layout,
            viewport,
            search,
            daccess,
            style,
            signals,
            opts,
            help_active: false,
            help_deadline: None,
            daccess_deadline: None,
            search_idle_deadline: None,
            resize_pending: false,
            resize_deadline: None,
            user_deadline,
        }
    }

    /// Runs until the user accepts, aborts, or a fatal signal lands.
    /// `out` must be the interactive `/dev/tty` handle (never stdout).
    pub fn run(&mut self, reader: &mut impl KeyPressReader, out: &mut impl Write) -> io::Result<Outcome> {
        self.repaint(out)?;

        let tick = Duration::from_millis(100);
        loop {
            if let Some(signo) = self.signals.any_fatal() {
                return Ok(Outcome::Signal(signo));
            }
            if self.signals.take_winch() {
                self.resize_pending = true;
                self.resize_deadline = Some(Instant::now() + Duration::from_millis(self.opts.resize_debounce_ms));
            }

            self.service_timers();

            if let Some(outcome) = self.service_user_timeout() {
                return Ok(outcome);
            }

            self.repaint(out)?;

            let event = match reader.next_event(tick) {
                Some(e) => e,
                None => continue,
            };

            if let Event::Resize(cols, _rows) = &event {
                self.layout.term_cols = *cols as usize;
                self.viewport.term_cols = *cols as usize;
                self.resize_pending = true;
                self.resize_deadline = Some(Instant::now() + Duration::from_millis(self.opts.resize_debounce_ms));
                continue;
            }

            let action = decode(&event, self.search.is_active(), self.opts.tagging_enabled);
            if action != Action::Unknown {
                self.note_activity();
            }

            if let Some(outcome) = self.apply(action, out)? {
                return Ok(outcome);
            }
        }
    }

    fn note_activity(&mut self) {
        if let Some(secs) = self.opts.timeout_seconds {
            self.user_deadline = Some(Instant::now() + Duration::from_secs(secs));
        }
    }

    /// Applies one decoded action; `Some(outcome)` ends the loop.
    fn apply(&mut self, action: Action, out: &mut impl Write) -> io::Result<Option<Outcome>> {
        match action {
            Action::MoveLeft => {
                self.viewport.move_left(&self.table);
            }
            Action::MoveRight => {
                self.viewport.move_right(&self.table);
            }
            Action::MoveUp => {
                self.viewport.move_up(&self.table);
            }
            Action::MoveDown => {
                self.viewport.move_down(&self.table);
            }
            Action::PageUp => {
                self.viewport.page_up(&self.table);
            }
            Action::PageDown => {
                self.viewport.page_down(&self.table);
            }
            Action::LineHome => self.viewport.line_home(&self.table),
            Action::LineEnd => self.viewport.line_end(&self.table),
            Action::TableHome => self.viewport.table_home(&self.table),
            Action::TableEnd => self.viewport.table_end(&self.table),
            Action::ToggleTag => {
                if self.opts.tagging_enabled {
                    self.table.toggle_tag(self.viewport.current);
                }
            }
            Action::TagMatching => {
                if self.opts.tagging_enabled {
                    for idx in self.search.matching_words.clone() {
                        self.table.tag(idx);
                    }
                }
            }
            Action::UntagMatching => {
                if self.opts.tagging_enabled {
                    for idx in self.search.matching_words.clone() {
                        self.table.untag(idx);
                    }
                }
            }
            Action::Digit(c) => {
                self.daccess_deadline = Some(Instant::now() + Duration::from_millis(self.opts.daccess_timer_ms));
                if let Some(idx) = self.daccess.push(c, &self.daccess_tst) {
                    self.viewport.current = idx;
                    self.viewport.recompute_window(&self.table);
                    self.daccess.clear();
                    self.daccess_deadline = None;
                }
            }
            Action::EnterSearchMode(mode) => {
                clear_matches(&mut self.table, &mut self.search);
                self.search.enter_mode(mode);
                self.search_idle_deadline =
                    Some(Instant::now() + Duration::from_millis(self.opts.search_idle_ms));
            }
            Action::SearchChar(c) => {
                self.search.push_char(c);
                self.rebuild_and_jump(out)?;
                self.search_idle_deadline =
                    Some(Instant::now() + Duration::from_millis(self.opts.search_idle_ms));
            }
            Action::SearchBackspace => {
                self.search.backspace();
                rebuild_matches(&mut self.table, &self.search_tst, &mut self.search);
                self.search_idle_deadline =
                    Some(Instant::now() + Duration::from_millis(self.opts.search_idle_ms));
            }
            Action::SearchEscape => {
                clear_matches(&mut self.table, &mut self.search);
                self.search.leave();
                self.search_idle_deadline = None;
            }
            Action::ToggleHelp => {
                self.help_active = !self.help_active;
                self.help_deadline =
                    self.help_active.then(|| Instant::now() + Duration::from_millis(self.opts.help_ms));
            }
            Action::Accept => {
                if self.search.is_active() {
                    clear_matches(&mut self.table, &mut self.search);
                    self.search.leave();
                }
                return Ok(Some(Outcome::Accept(self.build_output_text())));
            }
            Action::Abort => return Ok(Some(Outcome::Abort)),
            Action::NextMatch => self.jump_to_match(true),
            Action::PrevMatch => self.jump_to_match(false),
            Action::Unknown => {}
        }
        Ok(None)
    }

    /// After a search buffer mutation: rebuild matches, ring the bell if
    /// nothing matched, and jump the cursor to the first best match so the
    /// user sees progress as they type.
    fn rebuild_and_jump(&mut self, out: &mut impl Write) -> io::Result<()> {
        rebuild_matches(&mut self.table, &self.search_tst, &mut self.search);
        if self.search.matching_words.is_empty() {
            ring_bell(out)?;
            return Ok(());
        }
        let pool = if !self.search.best_matches.is_empty() { &self.search.best_matches } else { &self.search.matching_words };
        if let Some(&first) = pool.first() {
            self.viewport.current = first;
            self.viewport.recompute_window(&self.table);
        }
        Ok(())
    }

    /// Advances the cursor to the next (or, `forward == false`, previous)
    /// search match in table order, wrapping around. Bound to Tab/Shift-Tab
    /// while a search is active.
    fn jump_to_match(&mut self, forward: bool) {
        if let Some(idx) = next_match(&self.search.matching_words, self.viewport.current, forward) {
            self.viewport.current = idx;
            self.viewport.recompute_window(&self.table);
        }
    }

    fn service_timers(&mut self) {
        let now = Instant::now();
        if self.help_deadline.is_some_and(|d| now >= d) {
            self.help_active = false;
            self.help_deadline = None;
        }
        if self.daccess_deadline.is_some_and(|d| now >= d) {
            self.daccess.clear();
            self.daccess_deadline = None;
        }
        if self.search_idle_deadline.is_some_and(|d| now >= d) && self.search.is_active() {
            clear_matches(&mut self.table, &mut self.search);
            self.search.leave();
            self.search_idle_deadline = None;
        }
        if self.resize_pending && self.resize_deadline.is_some_and(|d| now >= d) {
            self.relayout();
            self.resize_pending = false;
            self.resize_deadline = None;
        }
    }

    /// Rebuilds `line_of`/`first_word_in_line` for the new terminal width
    /// and re-derives search matches, per the resolved Open Question: the
    /// search buffer survives a resize.
    fn relayout(&mut self) {
        build_layout(&mut self.table, &self.layout);
        if self.search.is_active() {
            rebuild_matches(&mut self.table, &self.search_tst, &mut self.search);
        }
        self.viewport.recompute_window(&self.table);
    }

    fn service_user_timeout(&mut self) -> Option<Outcome> {
        let deadline = self.user_deadline?;
        if Instant::now() < deadline {
            return None;
        }
        match self.opts.timeout_mode {
            TimeoutMode::Quit => Some(Outcome::Abort),
            TimeoutMode::Current | TimeoutMode::Word => Some(Outcome::Accept(self.build_output_text())),
        }
    }

    fn build_output_text(&mut self) -> String {
        let opts = OutputOptions {
            tagging_enabled: self.opts.tagging_enabled,
            autotag: self.opts.autotag,
            pinning: self.opts.pinning,
            keep_spaces: self.opts.keep_spaces,
            separator: &self.opts.tag_separator,
            timeout_mode: self.opts.timeout_mode,
            timeout_word: &self.opts.timeout_word,
        };
        build_output(&mut self.table, self.viewport.current, &opts)
    }

    fn message_line(&self) -> Option<String> {
        if self.help_active {
            return Some(HELP_TEXT.to_string());
        }
        if let Some(deadline) = self.user_deadline {
            let remaining = deadline.saturating_duration_since(Instant::now()).as_secs();
            if remaining <= 9 {
                return Some(format!("timeout in {remaining}s"));
            }
        }
        if self.search.is_active() {
            let prefix = match self.search.mode {
                crate::search::SearchMode::Prefix => "prefix",
                crate::search::SearchMode::Substring => "substring",
                crate::search::SearchMode::Fuzzy => "fuzzy",
                crate::search::SearchMode::None => "",
            };
            return Some(format!("{prefix} search: {}", self.search.buffer));
        }
        None
    }

    fn repaint(&mut self, out: &mut impl Write) -> io::Result<()> {
        let message = self.message_line();
        self.viewport.message_lines = if message.is_some() { 1 } else { 0 };
        let renderer = Renderer::new(&self.style);
        renderer.render(
            out,
            &self.table,
            &self.viewport,
            &self.search,
            &self.opts.gutter,
            self.opts.column_like,
            message.as_deref(),
        )
    }
}

fn ring_bell(out: &mut impl Write) -> io::Result<()> {
    write!(out, "\x07")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::word::{Selectable, Word};

    struct ScriptedReader {
        events: VecDeque<Event>,
    }

    impl ScriptedReader {
        fn new(events: Vec<Event>) -> Self {
            ScriptedReader { events: events.into() }
        }
    }

    impl KeyPressReader for ScriptedReader {
        fn next_event(&mut self, _timeout: Duration) -> Option<Event> {
            self.events.pop_front()
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn table_of(words: &[&str]) -> WordTable {
        let mut t = WordTable::new();
        for w in words {
            let mut word = Word::new((*w).to_string());
            word.selectable = Selectable::Included;
            t.push(word);
        }
        t
    }

    fn default_opts() -> AppOptions {
        AppOptions {
            tagging_enabled: true,
            autotag: false,
            pinning: false,
            keep_spaces: true,
            tag_separator: " ".to_string(),
            timeout_mode: TimeoutMode::Current,
            timeout_word: String::new(),
            timeout_seconds: None,
            gutter: "|".to_string(),
            column_like: false,
            help_ms: 1500,
            daccess_width: 3,
            daccess_timer_ms: 600,
            search_idle_ms: 10_000,
            resize_debounce_ms: 2000,
            search_start_affinity: false,
            search_end_affinity: false,
        }
    }

    fn new_app(words: &[&str]) -> App {
        App::new(
            table_of(words),
            Tst::new(),
            Tst::new(),
            LayoutOptions::default(),
            5,
            StyleSheet::default_palette(),
            SignalFlags::new(),
            default_opts(),
        )
    }

    #[test]
    fn move_right_then_accept_emits_second_word() {
        let mut app = new_app(&["alpha", "beta", "gamma"]);
        let mut reader = ScriptedReader::new(vec![key(KeyCode::Char('l')), key(KeyCode::Enter)]);
        let mut sink = Vec::new();
        let outcome = app.run(&mut reader, &mut sink).unwrap();
        match outcome {
            Outcome::Accept(text) => assert_eq!(text, "beta"),
            other => panic!("expected Accept, got {other:?}"),
        }
    }

    #[test]
    fn q_aborts_the_loop() {
        let mut app = new_app(&["alpha", "beta"]);
        let mut reader = ScriptedReader::new(vec![key(KeyCode::Char('q'))]);
        let mut sink = Vec::new();
        let outcome = app.run(&mut reader, &mut sink).unwrap();
        assert!(matches!(outcome, Outcome::Abort));
    }

    #[test]
    fn tag_then_accept_emits_both_tagged_words() {
        let mut app = new_app(&["alpha", "beta", "gamma"]);
        let mut reader = ScriptedReader::new(vec![
            key(KeyCode::Char('t')),
            key(KeyCode::Char('l')),
            key(KeyCode::Char('l')),
            key(KeyCode::Char('t')),
            key(KeyCode::Enter),
        ]);
        let mut sink = Vec::new();
        let outcome = app.run(&mut reader, &mut sink).unwrap();
        match outcome {
            Outcome::Accept(text) => assert_eq!(text, "alpha gamma"),
            other => panic!("expected Accept, got {other:?}"),
        }
    }

    #[test]
    fn ctrl_c_aborts_immediately() {
        let mut app = new_app(&["alpha", "beta"]);
        let mut reader = ScriptedReader::new(vec![Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))]);
        let mut sink = Vec::new();
        let outcome = app.run(&mut reader, &mut sink).unwrap();
        assert!(matches!(outcome, Outcome::Abort));
    }

    #[test]
    fn tab_cycles_to_next_match_while_searching() {
        let mut app = new_app(&["ant", "bee", "ant"]);
        app.search.enter_mode(crate::search::SearchMode::Prefix);
        app.search.matching_words = vec![0, 2];
        app.viewport.current = 0;
        app.jump_to_match(true);
        assert_eq!(app.viewport.current, 2);
        app.jump_to_match(false);
        assert_eq!(app.viewport.current, 0);
    }

    #[test]
    fn fatal_signal_is_reported_before_any_keys_are_read() {
        let mut app = new_app(&["alpha"]);
        app.signals.term.store(true, std::sync::atomic::Ordering::Relaxed);
        let mut reader = ScriptedReader::new(vec![]);
        let mut sink = Vec::new();
        let outcome = app.run(&mut reader, &mut sink).unwrap();
        assert!(matches!(outcome, Outcome::Signal(15)));
    }
}
