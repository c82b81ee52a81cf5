//! Structured load errors.
//!
//! Every failure carries the path of the file being loaded plus an
//! [`ErrorKind`] describing what went wrong. The human-readable one-line
//! message is produced by [`ElfError::render`] at the presentation boundary.

use std::error::Error as _;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The two classes of load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The stream could not supply the requested bytes.
    Read,
    /// The bytes were read but violate ELF structural expectations.
    Format,
}

/// A structure read from the stream, named in read errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    /// The 64-byte file header.
    FileHeader,
    /// The zeroth section header, read to resolve an extended section count.
    SectionCountEntry,
    /// The section header at the given index.
    SectionHeader(usize),
    /// The payload of the section at the given index.
    SectionData(usize),
    /// The program header at the given index.
    ProgramHeader(usize),
    /// The payload of the segment at the given index.
    SegmentData(usize),
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileHeader => write!(f, "ELF header"),
            Self::SectionCountEntry => write!(f, "extended section count entry"),
            Self::SectionHeader(i) => write!(f, "section header {i}"),
            Self::SectionData(i) => write!(f, "data of section {i}"),
            Self::ProgramHeader(i) => write!(f, "program header {i}"),
            Self::SegmentData(i) => write!(f, "data of segment {i}"),
        }
    }
}

/// What went wrong while loading an ELF file.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The file could not be opened.
    #[error("failed to open file")]
    Open(#[source] io::Error),
    /// A fixed-size record could not be read.
    #[error("failed to read {what}")]
    Read {
        /// The record being read.
        what: Structure,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A payload ended before its declared size.
    #[error("failed to read {what} at offset {offset:#x}: expected {expected} bytes, found {found}")]
    Truncated {
        /// The payload being read.
        what: Structure,
        /// Declared file offset of the payload.
        offset: u64,
        /// Declared payload size.
        expected: u64,
        /// Bytes actually available.
        found: u64,
    },
    /// The identification magic is not `\x7fELF`.
    #[error("not an ELF file, signature mismatch")]
    BadMagic,
    /// `EI_CLASS` is not `ELFCLASS64`.
    #[error("not 64-bit (class {0})")]
    UnsupportedClass(u8),
    /// `EI_DATA` is not `ELFDATA2LSB`.
    #[error("not little-endian (encoding {0})")]
    UnsupportedEncoding(u8),
    /// `EI_VERSION` is not `EV_CURRENT`.
    #[error("unknown ELF version ({0})")]
    UnsupportedVersion(u8),
    /// `EI_OSABI` is neither Linux nor System V.
    #[error("not a Linux ELF file (OS/ABI {0})")]
    UnsupportedOsAbi(u8),
    /// `e_type` is neither `ET_EXEC` nor `ET_DYN`.
    #[error("unknown file type ({0})")]
    UnknownFileType(u16),
    /// `e_machine` is not a supported 64-bit architecture.
    #[error("unknown file architecture ({0})")]
    UnknownMachine(u16),
    /// `e_phentsize` differs from the native program header size.
    #[error("program header entry size mismatch ({found} != {expected})")]
    ProgramHeaderSizeMismatch {
        /// Declared entry size.
        found: u16,
        /// Native entry size.
        expected: u16,
    },
    /// `e_shentsize` is neither zero nor the native section header size.
    #[error("section header entry size mismatch ({found} != {expected})")]
    SectionHeaderSizeMismatch {
        /// Declared entry size.
        found: u16,
        /// Native entry size.
        expected: u16,
    },
    /// `e_shstrndx` is out of range or does not name a string table.
    #[error("invalid section header index ({0})")]
    InvalidStringTableIndex(u32),
    /// `e_shstrndx` is `SHN_XINDEX` and section 0's `sh_link` is out of
    /// range or does not name a string table.
    #[error("invalid section header index (65535, sh_link {link})")]
    InvalidExtendedStringTableIndex {
        /// The `sh_link` of section 0, or 65535 when there is no section 0.
        link: u32,
    },
    /// `e_shoff` is zero while `e_shnum` declares entries.
    #[error("section header table offset is zero with {0} entries declared")]
    MissingSectionTable(u16),
    /// A section's name offset lies outside the section name string table.
    #[error("invalid name index of section {section} ({offset})")]
    InvalidNameIndex {
        /// Index of the offending section.
        section: usize,
        /// Its out-of-bounds name offset.
        offset: u32,
    },
}

impl ErrorKind {
    /// Returns whether this is a read failure or a format violation.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Open(_) | Self::Read { .. } | Self::Truncated { .. } => ErrorClass::Read,
            _ => ErrorClass::Format,
        }
    }
}

/// A failed load of the ELF file at [`ElfError::path`].
#[derive(Debug, Error)]
#[error("{}: {kind}", path.display())]
pub struct ElfError {
    path: PathBuf,
    #[source]
    kind: ErrorKind,
}

impl ElfError {
    /// Attaches the file path to an error kind.
    pub fn new(path: impl Into<PathBuf>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// The path of the file that failed to load.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The failure itself.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Shorthand for `self.kind().class()`.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Renders the error and its I/O causes as a single line.
    ///
    /// ```text
    /// /bin/true: failed to read section header 3: failed to fill whole buffer
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        let mut msg = self.to_string();
        let mut cause = self.kind.source();
        while let Some(err) = cause {
            msg.push_str(": ");
            msg.push_str(&err.to_string());
            cause = err.source();
        }
        msg
    }
}
