//! elfscope: list the sections and segments of an ELF64 file.
//!
//! Loads the file with `elfscope-elf` and prints one of the listings chosen
//! on the command line. A file that fails to load is reported on stderr and
//! the process exits with status 1.

mod cli;
#[cfg(test)]
mod fixture;
mod listing;
mod verbose;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use elfscope_elf::ElfFile;

use cli::{Cli, Listing};

fn main() -> ExitCode {
    let cli = Cli::parse();
    verbose::init(verbose::Verbosity::from_flags(cli.quiet, cli.verbose));

    let mut elf = ElfFile::new();
    if elf.load(&cli.file).is_err() {
        eprintln!("elfscope: {}", elf.error_message());
        return ExitCode::FAILURE;
    }

    match print(&elf, &cli.listing()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("elfscope: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn print(elf: &ElfFile, mode: &Listing) -> Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        Listing::Names => listing::names(elf, &mut out)?,
        Listing::Sections => listing::sections(elf, &mut out)?,
        Listing::Segments => listing::segments(elf, &mut out)?,
        Listing::Strings(name) => listing::strings(elf, name, &mut out)?,
    }
    out.flush()?;
    Ok(())
}
