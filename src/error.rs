//! Typed errors for every module boundary, composed into [`SmenuError`] at the
//! binary boundary. No `unwrap`/`expect` on a path reachable from untrusted
//! input; fatal startup conditions map to a diagnostic plus a process exit
//! code per the exit-code contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed ini syntax in {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("invalid regex in configuration: {0}")]
    Regex(#[from] regex::Error),
    #[error("unknown attribute specification: {0}")]
    BadAttribute(String),
    #[error("unknown charset: {0}")]
    UnknownCharset(String),
}

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("token exceeds the configured maximum length of {max} bytes")]
    TooLong { max: usize },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("empty word produced in {mode} mode is not permitted unless excluded")]
    EmptyWordNotAllowed { mode: &'static str },
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum TermError {
    #[error("stdin/stdout is not an interactive terminal")]
    NotInteractive,
    #[error("cannot open /dev/tty: {0}")]
    CannotOpenTty(#[source] std::io::Error),
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no input words were read")]
    EmptyInput,
    #[error("no selectable word remains after filtering")]
    NoSelectableWord,
}

#[derive(Debug, Error)]
pub enum SmenuError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Term(#[from] TermError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("{0}")]
    Clap(String),
}

/// The strict exit-code contract from the external interfaces section:
/// 0 success, 1 empty/no-selectable/abort/option-error, 128+signo on fatal signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Aborted,
    OptionError,
    Signal(i32),
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Aborted | ExitCode::OptionError => 1,
            ExitCode::Signal(signo) => 128 + signo,
        }
    }
}
