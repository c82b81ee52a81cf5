//! Log output for the command-line tool.
//!
//! Four levels controlled by CLI flags:
//! - **Quiet** (`-q`): errors only
//! - **Default** (no flag): warnings and errors
//! - **Verbose** (`-v`): pipeline milestones from the reader
//! - **Trace** (`-vv`): every parsed table entry

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Default,
    Verbose,
    Trace,
}

impl Verbosity {
    /// Maps the `-q` flag and the `-v` count to a level.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Default,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    fn filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Error,
            Self::Default => LevelFilter::Warn,
            Self::Verbose => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level().as_str().to_ascii_lowercase();
        let _ = writeln!(std::io::stderr().lock(), "{level}: {}", record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

/// Install the stderr logger for the current process.
pub fn init(verbosity: Verbosity) {
    // A logger may already be installed; the level still applies.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(verbosity.filter());
}
