//! `clap` derive surface mirroring the real program's flags: separators,
//! filters, substitution rules, window geometry, direct-access mode,
//! tag/pin mode, timeout mode, attribute specs, `--log-file`. Shaped after
//! the `cmdr` binaries' `#[derive(Parser)]`/`#[derive(Args)]` style (e.g.
//! `edi/clap_config.rs`). CLI flags are the highest-precedence configuration
//! layer: [`CliArgs::apply_overrides`] only touches a [`Configuration`]
//! field when the corresponding flag was actually passed.

use clap::Parser;

use super::Configuration;

#[derive(Debug, Parser)]
#[command(name = "smenu")]
#[command(about = "Interactive filter: pick one or more tokens from stdin and print them to stdout.")]
#[command(version)]
#[command(next_line_help = true)]
pub struct CliArgs {
    /// Characters that separate words (besides record separators).
    #[arg(long)]
    pub word_separators: Option<String>,

    /// Characters that end a record (and therefore also separate words).
    #[arg(long)]
    pub record_separators: Option<String>,

    /// Honor `"..."`/`'...'` quoting while tokenizing.
    #[arg(long)]
    pub quote: bool,

    /// Single-byte substitute character for invalid UTF-8 / unknown escapes.
    #[arg(long)]
    pub substitute_char: Option<char>,

    /// Fatal error if a single token exceeds this many bytes.
    #[arg(long)]
    pub max_token_len: Option<usize>,

    /// Glyphs to silently discard from the input stream.
    #[arg(long)]
    pub zap: Option<String>,

    /// Row selector: include these 1-based row numbers/ranges/regexes.
    #[arg(long = "row-include", action = clap::ArgAction::Append)]
    pub row_include: Vec<String>,

    /// Row selector: exclude these 1-based row numbers/ranges/regexes.
    #[arg(long = "row-exclude", action = clap::ArgAction::Append)]
    pub row_exclude: Vec<String>,

    /// Column selector: include these 1-based column numbers/ranges/regexes.
    #[arg(long = "column-include", action = clap::ArgAction::Append)]
    pub column_include: Vec<String>,

    /// Column selector: exclude these 1-based column numbers/ranges/regexes.
    #[arg(long = "column-exclude", action = clap::ArgAction::Append)]
    pub column_exclude: Vec<String>,

    /// Up to 5 special-attribute regexes, in priority order.
    #[arg(long = "special", action = clap::ArgAction::Append)]
    pub special: Vec<String>,

    /// Regex that forces a new record boundary when it matches a word.
    #[arg(long)]
    pub forced_first_column: Option<String>,

    /// Regex that forces a word to end its record.
    #[arg(long)]
    pub forced_last_column: Option<String>,

    /// Direct-access numbering mode: `none`, `auto`, or `positional`.
    #[arg(long)]
    pub daccess_mode: Option<String>,

    /// Byte offset used by `positional` direct-access mode.
    #[arg(long)]
    pub daccess_offset: Option<usize>,

    /// Width of the direct-access selector field.
    #[arg(long)]
    pub daccess_width: Option<usize>,

    /// Left-align (instead of right-align) the direct-access selector.
    #[arg(long)]
    pub daccess_left_align: bool,

    /// Pad the direct-access selector on excluded words too (default: included-only).
    #[arg(long)]
    pub daccess_pad_all: bool,

    /// `/regex/replacement/flags` substitution applied to every word.
    #[arg(long = "sub-all", action = clap::ArgAction::Append)]
    pub substitutions_all: Vec<String>,

    /// Substitution applied only to included words.
    #[arg(long = "sub-include", action = clap::ArgAction::Append)]
    pub substitutions_included: Vec<String>,

    /// Substitution applied only to excluded words.
    #[arg(long = "sub-exclude", action = clap::ArgAction::Append)]
    pub substitutions_excluded: Vec<String>,

    /// Keep non-printable bytes verbatim instead of mapping them to `\n`/`\t`/`?`.
    #[arg(long)]
    pub no_blank_nonprintable: bool,

    /// Layout mode: `free`, `column`, `line`, or `tab`.
    #[arg(long, short = 'm')]
    pub mode: Option<String>,

    /// Stretch columns to the full terminal width when feasible.
    #[arg(long)]
    pub wide: bool,

    /// Center the window horizontally.
    #[arg(long)]
    pub center: bool,

    /// Maximum columns per line in tab mode.
    #[arg(long)]
    pub max_cols: Option<usize>,

    /// Gutter string inserted between columns.
    #[arg(long)]
    pub gutter: Option<String>,

    /// Window height in terminal lines.
    #[arg(long, short = 'n')]
    pub height: Option<usize>,

    /// Enable multi-word tagging.
    #[arg(long, short = 't')]
    pub tag: bool,

    /// Tag the current word automatically if Enter is pressed with nothing tagged.
    #[arg(long)]
    pub autotag: bool,

    /// Preserve tag insertion order on output (pinning mode).
    #[arg(long)]
    pub pin: bool,

    /// Separator inserted between tagged words on output.
    #[arg(long)]
    pub tag_separator: Option<String>,

    /// Keep leading/trailing spaces and tabs in emitted words.
    #[arg(long)]
    pub keep_spaces: bool,

    /// Timeout behavior: `current`, `quit`, or `word`.
    #[arg(long)]
    pub timeout_mode: Option<String>,

    /// Word to emit when `--timeout-mode word` fires.
    #[arg(long)]
    pub timeout_word: Option<String>,

    /// Seconds of inactivity before the timeout fires.
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Restrict matches to ones starting at the word's first glyph.
    #[arg(long)]
    pub search_start_affinity: bool,

    /// Restrict matches to ones ending at the word's last glyph.
    #[arg(long)]
    pub search_end_affinity: bool,

    /// Write diagnostic logs to this file (never stdout/stderr).
    #[arg(long)]
    pub log_file: Option<String>,

    /// Basename used to locate `$HOME/.<basename>` and `$PWD/.<basename>` INI files.
    #[arg(long)]
    pub basename: Option<String>,
}

impl CliArgs {
    /// Overwrites `cfg` fields with any flag the user actually passed;
    /// flags left at their clap default (`false`/`None`/empty `Vec`) leave
    /// the INI/defaults-derived value untouched (CLI is the highest
    /// precedence layer, but only where it has an opinion).
    pub fn apply_overrides(&self, cfg: &mut Configuration) {
        if let Some(v) = &self.word_separators {
            cfg.word_separators = v.clone();
        }
        if let Some(v) = &self.record_separators {
            cfg.record_separators = v.clone();
        }
        if self.quote {
            cfg.quote_handling = true;
        }
        if let Some(v) = self.substitute_char {
            cfg.substitute_char = v;
        }
        if let Some(v) = self.max_token_len {
            cfg.max_token_len = v;
        }
        if let Some(v) = &self.zap {
            cfg.zapped_glyphs = v.clone();
        }
        cfg.row_include.extend(self.row_include.iter().cloned());
        cfg.row_exclude.extend(self.row_exclude.iter().cloned());
        cfg.column_include.extend(self.column_include.iter().cloned());
        cfg.column_exclude.extend(self.column_exclude.iter().cloned());
        for (i, spec) in self.special.iter().take(5).enumerate() {
            cfg.special_regexes[i] = Some(spec.clone());
        }
        if let Some(v) = &self.forced_first_column {
            cfg.forced_first_column = Some(v.clone());
        }
        if let Some(v) = &self.forced_last_column {
            cfg.forced_last_column = Some(v.clone());
        }
        if let Some(v) = &self.daccess_mode {
            cfg.daccess_mode = v.clone();
        }
        if let Some(v) = self.daccess_offset {
            cfg.daccess_offset = v;
        }
        if let Some(v) = self.daccess_width {
            cfg.daccess_width = v;
        }
        if self.daccess_left_align {
            cfg.daccess_left_align = true;
        }
        if self.daccess_pad_all {
            cfg.daccess_pad_included_only = false;
        }
        cfg.substitutions_all.extend(self.substitutions_all.iter().cloned());
        cfg.substitutions_included.extend(self.substitutions_included.iter().cloned());
        cfg.substitutions_excluded.extend(self.substitutions_excluded.iter().cloned());
        if self.no_blank_nonprintable {
            cfg.blank_nonprintable = false;
        }
        if let Some(v) = &self.mode {
            cfg.layout_mode = v.clone();
        }
        if self.wide {
            cfg.wide = true;
        }
        if self.center {
            cfg.center = true;
        }
        if let Some(v) = self.max_cols {
            cfg.max_cols = Some(v);
        }
        if let Some(v) = &self.gutter {
            cfg.gutter = v.clone();
        }
        if let Some(v) = self.height {
            cfg.window_height = v;
        }
        if self.tag {
            cfg.tagging_enabled = true;
        }
        if self.autotag {
            cfg.autotag = true;
        }
        if self.pin {
            cfg.pinning = true;
        }
        if let Some(v) = &self.tag_separator {
            cfg.tag_separator = v.clone();
        }
        if self.keep_spaces {
            cfg.keep_spaces = true;
        }
        if let Some(v) = &self.timeout_mode {
            cfg.timeout_mode = v.clone();
        }
        if let Some(v) = &self.timeout_word {
            cfg.timeout_word = v.clone();
        }
        if let Some(v) = self.timeout_seconds {
            cfg.timeout_seconds = Some(v);
        }
        if self.search_start_affinity {
            cfg.search_start_affinity = true;
        }
        if self.search_end_affinity {
            cfg.search_end_affinity = true;
        }
        if let Some(v) = &self.log_file {
            cfg.log_file = Some(v.clone());
        }
        if let Some(v) = &self.basename {
            cfg.basename = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn unset_flags_leave_defaults_untouched() {
        let args = CliArgs::parse_from(["smenu"]);
        let mut cfg = Configuration::default();
        let before = cfg.window_height;
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.window_height, before);
    }

    #[test]
    fn height_flag_overrides_default() {
        let args = CliArgs::parse_from(["smenu", "--height", "20"]);
        let mut cfg = Configuration::default();
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.window_height, 20);
    }

    #[test]
    fn tag_flag_enables_tagging() {
        let args = CliArgs::parse_from(["smenu", "-t"]);
        let mut cfg = Configuration::default();
        args.apply_overrides(&mut cfg);
        assert!(cfg.tagging_enabled);
    }

    #[test]
    fn forced_column_flags_override_defaults() {
        let args = CliArgs::parse_from(["smenu", "--forced-first-column", "^ID", "--forced-last-column", "END$"]);
        let mut cfg = Configuration::default();
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.forced_first_column.as_deref(), Some("^ID"));
        assert_eq!(cfg.forced_last_column.as_deref(), Some("END$"));
    }

    #[test]
    fn search_affinity_flags_override_defaults() {
        let args = CliArgs::parse_from(["smenu", "--search-start-affinity", "--search-end-affinity"]);
        let mut cfg = Configuration::default();
        args.apply_overrides(&mut cfg);
        assert!(cfg.search_start_affinity);
        assert!(cfg.search_end_affinity);
    }
}
