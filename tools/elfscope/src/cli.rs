//! Command-line interface definitions for elfscope.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Inspect the headers, sections and segments of an ELF64 file.
#[derive(Parser)]
#[command(name = "elfscope", version, about)]
pub struct Cli {
    /// ELF file to inspect.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// List section names, one per line (default).
    #[arg(long, conflicts_with_all = ["long", "segments", "strings"])]
    pub sections: bool,

    /// List sections with type, flags, addresses and sizes.
    #[arg(long, short = 'l', conflicts_with_all = ["segments", "strings"])]
    pub long: bool,

    /// List program headers.
    #[arg(long, short = 's', conflicts_with = "strings")]
    pub segments: bool,

    /// Print the strings stored in the named section.
    #[arg(long, value_name = "NAME")]
    pub strings: Option<String>,

    /// Only report errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase log output (`-v` debug, `-vv` trace).
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// What to print once the file has loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Names,
    Sections,
    Segments,
    Strings(String),
}

impl Cli {
    /// Resolves the mutually exclusive output flags.
    pub fn listing(&self) -> Listing {
        if let Some(name) = &self.strings {
            Listing::Strings(name.clone())
        } else if self.segments {
            Listing::Segments
        } else if self.long {
            Listing::Sections
        } else {
            Listing::Names
        }
    }
}
