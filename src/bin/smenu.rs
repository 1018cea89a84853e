//! Binary entry point: load configuration, build the word table from
//! stdin, run the interactive loop on `/dev/tty`, emit the selection to the
//! real stdout. Shaped after the `cmdr` binaries' thin-`main` pattern
//! (parse args, build config, hand off to a library entry point) and
//! `choose_impl/event_loop.rs`'s `run_before_event_loop`/
//! `run_after_event_loop` bracketing of raw-mode state around the loop.

use std::io;

use clap::Parser;

use smenu::app::{App, AppOptions, Outcome};
use smenu::builder::build;
use smenu::config::cli::CliArgs;
use smenu::config::ini_loader::load_layered;
use smenu::error::{ExitCode, RuntimeError, SmenuError, TermError};
use smenu::layout::LayoutMode;
use smenu::logging;
use smenu::output::emit;
use smenu::reader::ByteReader;
use smenu::render::StyleSheet;
use smenu::term::signals::SignalFlags;
use smenu::term::{probe_capabilities, TerminalGuard};
use smenu::tokenizer::Tokenizer;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("smenu: {err}");
            ExitCode::OptionError
        }
    };
    std::process::exit(code.code());
}

fn run() -> Result<ExitCode, SmenuError> {
    let cli = CliArgs::parse();

    let basename = cli.basename.clone().unwrap_or_else(|| "smenu".to_string());
    let mut cfg = load_layered(&basename)?;
    cli.apply_overrides(&mut cfg);

    let _log_guard = logging::init(logging::resolve_log_path(cfg.log_file.clone()).as_deref());
    tracing::info!(basename = %cfg.basename, "smenu starting");

    let (term_cols, term_rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let compiled = cfg.compile(term_cols as usize)?;

    let stdin = io::stdin();
    let byte_reader = ByteReader::new(stdin.lock(), cfg.substitute_char, cfg.zapped_glyphs.chars().collect());
    let tokenizer = Tokenizer::new(byte_reader, compiled.tokenizer);
    let built = build(tokenizer, &compiled.builder)?;

    if built.table.is_empty() {
        return Err(RuntimeError::EmptyInput.into());
    }
    if built.table.selectable_indices().is_empty() {
        return Err(RuntimeError::NoSelectableWord.into());
    }

    probe_capabilities()?;

    let mut guard = TerminalGuard::open()?;
    let signals = SignalFlags::new();
    signals.install().map_err(TermError::Io)?;

    let window_height = cfg.window_height.min(term_rows.saturating_sub(2).max(1) as usize);
    let column_like = !matches!(compiled.layout.mode, LayoutMode::FreeFlow);

    let opts = AppOptions {
        tagging_enabled: cfg.tagging_enabled,
        autotag: cfg.autotag,
        pinning: cfg.pinning,
        keep_spaces: cfg.keep_spaces,
        tag_separator: cfg.tag_separator.clone(),
        timeout_mode: compiled.timeout_mode,
        timeout_word: cfg.timeout_word.clone(),
        timeout_seconds: cfg.timeout_seconds,
        gutter: cfg.gutter.clone(),
        column_like,
        help_ms: cfg.help_timer_ms,
        daccess_width: cfg.daccess_width,
        daccess_timer_ms: cfg.direct_access_timer_ms,
        search_idle_ms: cfg.search_idle_timer_ms,
        resize_debounce_ms: cfg.resize_debounce_ms,
        search_start_affinity: cfg.search_start_affinity,
        search_end_affinity: cfg.search_end_affinity,
    };

    let mut app = App::new(
        built.table,
        built.search_tst,
        built.daccess_tst,
        compiled.layout,
        window_height,
        StyleSheet::default_palette(),
        signals,
        opts,
    );

    let mut reader = smenu::input::CrosstermReader;
    let outcome = app.run(&mut reader, &mut guard.tty).map_err(TermError::Io)?;
    guard.teardown();

    match outcome {
        Outcome::Accept(text) => {
            emit(&mut io::stdout(), &text).map_err(TermError::Io)?;
            Ok(ExitCode::Success)
        }
        Outcome::Abort => Ok(ExitCode::Aborted),
        Outcome::Signal(signo) => Ok(ExitCode::Signal(signo)),
    }
}
