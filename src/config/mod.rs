//! The `Configuration` record: pure data, built by three layered
//! collaborators (defaults < `$HOME` INI < `$PWD` INI < CLI flags) before
//! the core starts. Grounded on `oxidized`'s layered `ConfigFile`/`Config`
//! precedence idea (`freddiehaddad-oxidized/crates/core-config/src/lib.rs`),
//! adapted from TOML/`serde` to the two-file INI format required here.

pub mod cli;
pub mod ini_loader;

use regex::{Regex, RegexBuilder};

use crate::builder::{BuilderConfig, DaccessMode};
use crate::error::ConfigError;
use crate::layout::{LayoutMode, LayoutOptions};
use crate::output::TimeoutMode;
use crate::selector::{Selector, Substitution};
use crate::tokenizer::TokenizerConfig;

#[derive(Debug, Clone)]
pub struct Configuration {
    pub word_separators: String,
    pub record_separators: String,
    pub quote_handling: bool,
    pub substitute_char: char,
    pub max_token_len: usize,
    pub zapped_glyphs: String,

    pub row_include: Vec<String>,
    pub row_exclude: Vec<String>,
    pub column_include: Vec<String>,
    pub column_exclude: Vec<String>,
    pub special_regexes: [Option<String>; 5],
    pub forced_first_column: Option<String>,
    pub forced_last_column: Option<String>,

    pub daccess_mode: String,
    pub daccess_offset: usize,
    pub daccess_width: usize,
    pub daccess_left_align: bool,
    pub daccess_pad_included_only: bool,

    pub substitutions_all: Vec<String>,
    pub substitutions_included: Vec<String>,
    pub substitutions_excluded: Vec<String>,
    pub blank_nonprintable: bool,

    pub layout_mode: String,
    pub wide: bool,
    pub center: bool,
    pub max_cols: Option<usize>,
    pub gutter: String,
    pub window_height: usize,

    pub tagging_enabled: bool,
    pub autotag: bool,
    pub pinning: bool,
    pub tag_separator: String,
    pub keep_spaces: bool,

    pub timeout_mode: String,
    pub timeout_word: String,
    pub timeout_seconds: Option<u64>,

    pub search_start_affinity: bool,
    pub search_end_affinity: bool,

    pub help_timer_ms: u64,
    pub direct_access_timer_ms: u64,
    pub search_idle_timer_ms: u64,
    pub resize_debounce_ms: u64,

    pub basename: String,
    pub log_file: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            word_separators: " \t\n".to_string(),
            record_separators: "\n".to_string(),
            quote_handling: false,
            substitute_char: '?',
            max_token_len: 8192,
            zapped_glyphs: String::new(),

            row_include: Vec::new(),
            row_exclude: Vec::new(),
            column_include: Vec::new(),
            column_exclude: Vec::new(),
            special_regexes: Default::default(),
            forced_first_column: None,
            forced_last_column: None,

            daccess_mode: "none".to_string(),
            daccess_offset: 0,
            daccess_width: 3,
            daccess_left_align: false,
            daccess_pad_included_only: true,

            substitutions_all: Vec::new(),
            substitutions_included: Vec::new(),
            substitutions_excluded: Vec::new(),
            blank_nonprintable: true,

            layout_mode: "free".to_string(),
            wide: false,
            center: false,
            max_cols: None,
            gutter: "|".to_string(),
            window_height: 10,

            tagging_enabled: false,
            autotag: false,
            pinning: false,
            tag_separator: " ".to_string(),
            keep_spaces: false,

            timeout_mode: "current".to_string(),
            timeout_word: String::new(),
            timeout_seconds: None,

            search_start_affinity: false,
            search_end_affinity: false,

            help_timer_ms: 1500,
            direct_access_timer_ms: 600,
            search_idle_timer_ms: 10_000,
            resize_debounce_ms: 2000,

            basename: "smenu".to_string(),
            log_file: None,
        }
    }
}

pub struct Compiled {
    pub tokenizer: TokenizerConfig,
    pub builder: BuilderConfig,
    pub layout: LayoutOptions,
    pub timeout_mode: TimeoutMode,
}

fn compile_regex(spec: &str) -> Result<Regex, ConfigError> {
    Ok(RegexBuilder::new(spec).build()?)
}

impl Configuration {
    /// Validates and lowers every regex/selector/substitution string into
    /// compiled form. A bad regex anywhere is a fatal startup error, caught
    /// here before any terminal mutation happens.
    pub fn compile(&self, term_cols: usize) -> Result<Compiled, ConfigError> {
        let word_separators = self.word_separators.chars().collect();
        let record_separators = self.record_separators.chars().collect();
        let zapped_glyphs = self.zapped_glyphs.chars().collect();

        let tokenizer = TokenizerConfig {
            word_separators,
            record_separators,
            quote_handling: self.quote_handling,
            substitute: self.substitute_char,
            max_token_len: self.max_token_len,
        };
        let _ = zapped_glyphs; // consumed by the ByteReader the caller constructs, not the tokenizer.

        let mut row_filters = Vec::new();
        for s in &self.row_include {
            row_filters.push(Selector::parse(&format!("i{s}"))?);
        }
        for s in &self.row_exclude {
            row_filters.push(Selector::parse(&format!("e{s}"))?);
        }
        let mut column_filters = Vec::new();
        for s in &self.column_include {
            column_filters.push(Selector::parse(&format!("i{s}"))?);
        }
        for s in &self.column_exclude {
            column_filters.push(Selector::parse(&format!("e{s}"))?);
        }

        let mut special_regexes: [Option<Regex>; 5] = Default::default();
        for (i, spec) in self.special_regexes.iter().enumerate() {
            if let Some(spec) = spec {
                special_regexes[i] = Some(compile_regex(spec)?);
            }
        }

        let forced_first_column = self.forced_first_column.as_deref().map(compile_regex).transpose()?;
        let forced_last_column = self.forced_last_column.as_deref().map(compile_regex).transpose()?;

        let daccess_mode = match self.daccess_mode.as_str() {
            "auto" => DaccessMode::Auto,
            "positional" => DaccessMode::Positional { byte_offset: self.daccess_offset },
            _ => DaccessMode::None,
        };

        let mut subs_all = Vec::new();
        for s in &self.substitutions_all {
            subs_all.push(Substitution::parse(s)?);
        }
        let mut subs_included = Vec::new();
        for s in &self.substitutions_included {
            subs_included.push(Substitution::parse(s)?);
        }
        let mut subs_excluded = Vec::new();
        for s in &self.substitutions_excluded {
            subs_excluded.push(Substitution::parse(s)?);
        }

        let layout_mode = match self.layout_mode.as_str() {
            "column" => LayoutMode::Column,
            "line" => LayoutMode::Line,
            "tab" => LayoutMode::Tab,
            _ => LayoutMode::FreeFlow,
        };

        let builder = BuilderConfig {
            row_filters,
            column_filters,
            special_regexes,
            daccess_mode,
            daccess_width: self.daccess_width,
            daccess_left_align: self.daccess_left_align,
            daccess_pad_included_only: self.daccess_pad_included_only,
            daccess_brackets: ('(', ')'),
            subs_all,
            subs_included,
            subs_excluded,
            blank_nonprintable: self.blank_nonprintable,
            layout_mode,
            forced_first_column,
            forced_last_column,
        };

        let layout = LayoutOptions {
            mode: layout_mode,
            term_cols,
            wide: self.wide,
            center: self.center,
            max_cols: self.max_cols,
            gutter_width: self.gutter.chars().count().max(1),
        };

        let timeout_mode = match self.timeout_mode.as_str() {
            "quit" => TimeoutMode::Quit,
            "word" => TimeoutMode::Word,
            _ => TimeoutMode::Current,
        };

        Ok(Compiled { tokenizer, builder, layout, timeout_mode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_compiles_cleanly() {
        let cfg = Configuration::default();
        assert!(cfg.compile(80).is_ok());
    }

    #[test]
    fn bad_regex_is_a_config_error() {
        let mut cfg = Configuration::default();
        cfg.special_regexes[0] = Some("[unterminated".to_string());
        assert!(cfg.compile(80).is_err());
    }

    #[test]
    fn forced_column_boundaries_compile_into_the_builder_config() {
        let mut cfg = Configuration::default();
        cfg.forced_first_column = Some("^ID".to_string());
        cfg.forced_last_column = Some("END$".to_string());
        let compiled = cfg.compile(80).unwrap();
        assert!(compiled.builder.forced_first_column.unwrap().is_match("ID123"));
        assert!(compiled.builder.forced_last_column.unwrap().is_match("rowEND"));
    }

    #[test]
    fn bad_forced_column_regex_is_a_config_error() {
        let mut cfg = Configuration::default();
        cfg.forced_first_column = Some("[unterminated".to_string());
        assert!(cfg.compile(80).is_err());
    }
}
