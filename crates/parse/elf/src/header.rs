//! ELF64 file header parsing and validation.
//!
//! Decodes the fixed 64-byte header with `from_le_bytes()` and classifies
//! the file type and machine. Validation stops at the first violation, in
//! the order the checks appear in [`FileHeader::parse`].

use core::fmt;

use crate::error::ErrorKind;

/// ELF magic bytes: `\x7fELF`.
pub(crate) const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// ELF class: 64-bit.
pub(crate) const ELFCLASS64: u8 = 2;

/// ELF data encoding: little-endian.
pub(crate) const ELFDATA2LSB: u8 = 1;

/// Current ELF version.
pub(crate) const EV_CURRENT: u8 = 1;

/// OS/ABI: UNIX System V (generic).
pub(crate) const ELFOSABI_SYSV: u8 = 0;

/// OS/ABI: Linux (GNU extensions).
pub(crate) const ELFOSABI_LINUX: u8 = 3;

/// ELF type: executable.
pub(crate) const ET_EXEC: u16 = 2;

/// ELF type: shared object (PIE).
pub(crate) const ET_DYN: u16 = 3;

/// ELF machine: x86-64.
pub(crate) const EM_X86_64: u16 = 62;

/// ELF machine: `AArch64`.
pub(crate) const EM_AARCH64: u16 = 183;

/// ELF machine: RISC-V.
pub(crate) const EM_RISCV: u16 = 243;

/// Section index escape: the real `e_shstrndx` lives in section 0's `sh_link`.
pub(crate) const SHN_XINDEX: u16 = 0xffff;

/// Size of an ELF64 file header (64 bytes).
pub(crate) const ELF64_EHDR_SIZE: usize = 64;

/// Size of an ELF64 program header entry (56 bytes).
pub(crate) const ELF64_PHDR_SIZE: usize = 56;

/// Size of an ELF64 section header entry (64 bytes).
pub(crate) const ELF64_SHDR_SIZE: usize = 64;

/// Read a little-endian `u16` from `data` at byte offset `off`.
///
/// # Panics
///
/// Panics if `off + 2 > data.len()`. Callers pass fixed-size records.
pub(crate) fn le_u16(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes(*data[off..].first_chunk().unwrap())
}

/// Read a little-endian `u32` from `data` at byte offset `off`.
pub(crate) fn le_u32(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(*data[off..].first_chunk().unwrap())
}

/// Read a little-endian `u64` from `data` at byte offset `off`.
pub(crate) fn le_u64(data: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(*data[off..].first_chunk().unwrap())
}

/// Kind of object file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// `ET_EXEC`: a fixed-address executable.
    Executable,
    /// `ET_DYN`: a shared object or position-independent executable.
    Dynamic,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Executable => "executable",
            Self::Dynamic => "dynamic",
        })
    }
}

/// Target instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// x86-64.
    Amd64,
    /// 64-bit ARM.
    AArch64,
    /// 64-bit RISC-V.
    RiscV64,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Amd64 => "amd64",
            Self::AArch64 => "aarch64",
            Self::RiscV64 => "riscv64",
        })
    }
}

/// A validated ELF64 file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Classified `e_type`.
    pub file_type: FileType,
    /// Classified `e_machine`.
    pub architecture: Architecture,
    /// Raw `EI_OSABI` byte (Linux or System V).
    pub os_abi: u8,
    /// Virtual address of the entry point.
    pub entry: u64,
    /// Offset of the program header table in the file.
    pub phoff: u64,
    /// Number of program header entries.
    pub phnum: u16,
    /// Offset of the section header table in the file.
    pub shoff: u64,
    /// Size of each section header entry; zero when there is no table.
    pub shentsize: u16,
    /// Number of section header entries; zero selects the extended count.
    pub shnum: u16,
    /// Section header string table index.
    pub shstrndx: u16,
}

impl FileHeader {
    /// Decode and validate a raw 64-byte file header.
    ///
    /// # Errors
    ///
    /// Returns the first [`ErrorKind`] format violation found.
    #[expect(clippy::similar_names, reason = "field names follow the ELF ABI")]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "native header sizes are compile-time constants below u16::MAX"
    )]
    pub fn parse(data: &[u8; ELF64_EHDR_SIZE]) -> Result<Self, ErrorKind> {
        if data[..4] != ELF_MAGIC {
            return Err(ErrorKind::BadMagic);
        }
        if data[4] != ELFCLASS64 {
            return Err(ErrorKind::UnsupportedClass(data[4]));
        }
        if data[5] != ELFDATA2LSB {
            return Err(ErrorKind::UnsupportedEncoding(data[5]));
        }
        if data[6] != EV_CURRENT {
            return Err(ErrorKind::UnsupportedVersion(data[6]));
        }
        let os_abi = data[7];
        if os_abi != ELFOSABI_LINUX && os_abi != ELFOSABI_SYSV {
            return Err(ErrorKind::UnsupportedOsAbi(os_abi));
        }

        let file_type = match le_u16(data, 16) {
            ET_EXEC => FileType::Executable,
            ET_DYN => FileType::Dynamic,
            other => return Err(ErrorKind::UnknownFileType(other)),
        };

        let architecture = match le_u16(data, 18) {
            EM_X86_64 => Architecture::Amd64,
            EM_AARCH64 => Architecture::AArch64,
            EM_RISCV => Architecture::RiscV64,
            other => return Err(ErrorKind::UnknownMachine(other)),
        };

        let phentsize = le_u16(data, 54);
        if usize::from(phentsize) != ELF64_PHDR_SIZE {
            return Err(ErrorKind::ProgramHeaderSizeMismatch {
                found: phentsize,
                expected: ELF64_PHDR_SIZE as u16,
            });
        }

        let shentsize = le_u16(data, 58);
        if shentsize != 0 && usize::from(shentsize) != ELF64_SHDR_SIZE {
            return Err(ErrorKind::SectionHeaderSizeMismatch {
                found: shentsize,
                expected: ELF64_SHDR_SIZE as u16,
            });
        }

        let shoff = le_u64(data, 40);
        let shnum = le_u16(data, 60);
        if shentsize != 0 && shoff == 0 && shnum != 0 {
            return Err(ErrorKind::MissingSectionTable(shnum));
        }

        Ok(Self {
            file_type,
            architecture,
            os_abi,
            entry: le_u64(data, 24),
            phoff: le_u64(data, 32),
            phnum: le_u16(data, 56),
            shoff,
            shentsize,
            shnum,
            shstrndx: le_u16(data, 62),
        })
    }

    /// Whether the file declares a section header table at all.
    ///
    /// A zero entry size means "no table", as does a zero offset with a zero
    /// count (stripped section headers).
    #[must_use]
    pub fn has_section_table(&self) -> bool {
        self.shentsize != 0 && !(self.shoff == 0 && self.shnum == 0)
    }
}
