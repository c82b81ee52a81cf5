//! ELF64 segment (program header) table parsing.

use std::fmt;
use std::io::{Read, Seek};

use bitflags::bitflags;

use crate::error::{ErrorKind, Structure};
use crate::header::{ELF64_PHDR_SIZE, FileHeader, le_u32, le_u64};
use crate::reader::ElfReader;

/// Program header type: unused entry.
pub const PT_NULL: u32 = 0;

/// Program header type: loadable segment.
pub const PT_LOAD: u32 = 1;

/// Program header type: dynamic linking information.
pub const PT_DYNAMIC: u32 = 2;

/// Program header type: interpreter path.
pub const PT_INTERP: u32 = 3;

/// Program header type: auxiliary information.
pub const PT_NOTE: u32 = 4;

/// Program header type: reserved.
pub const PT_SHLIB: u32 = 5;

/// Program header type: the program header table itself.
pub const PT_PHDR: u32 = 6;

/// Program header type: start of the OS-specific range.
pub const PT_LOOS: u32 = 0x6000_0000;

/// Program header type: end of the OS-specific range.
pub const PT_HIOS: u32 = 0x6fff_ffff;

/// Program header type: start of the processor-specific range.
pub const PT_LOPROC: u32 = 0x7000_0000;

/// Program header type: end of the processor-specific range.
pub const PT_HIPROC: u32 = 0x7fff_ffff;

/// Classified `p_type`.
///
/// Values without a dedicated variant (such as `PT_GNU_STACK`) map to
/// [`SegmentType::OsSpecific`]; the entry keeps the raw number as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    /// `PT_NULL`.
    Null,
    /// `PT_LOAD`.
    Loadable,
    /// `PT_DYNAMIC`.
    DynamicLinking,
    /// `PT_INTERP`.
    Interpreter,
    /// `PT_NOTE`.
    Note,
    /// `PT_SHLIB`.
    SharedLibrary,
    /// `PT_PHDR`.
    ProgramHeaderInfo,
    /// Exactly `PT_LOOS`.
    LowOsSpecific,
    /// Exactly `PT_HIOS`.
    HighOsSpecific,
    /// Exactly `PT_LOPROC`.
    LowProcessorSpecific,
    /// Exactly `PT_HIPROC`.
    HighProcessorSpecific,
    /// Any other value.
    OsSpecific,
}

impl SegmentType {
    /// Classify a raw `p_type` value.
    #[must_use]
    pub fn from_raw(p_type: u32) -> Self {
        match p_type {
            PT_NULL => Self::Null,
            PT_LOAD => Self::Loadable,
            PT_DYNAMIC => Self::DynamicLinking,
            PT_INTERP => Self::Interpreter,
            PT_NOTE => Self::Note,
            PT_SHLIB => Self::SharedLibrary,
            PT_PHDR => Self::ProgramHeaderInfo,
            PT_LOOS => Self::LowOsSpecific,
            PT_HIOS => Self::HighOsSpecific,
            PT_LOPROC => Self::LowProcessorSpecific,
            PT_HIPROC => Self::HighProcessorSpecific,
            _ => Self::OsSpecific,
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Null => "NULL",
            Self::Loadable => "LOAD",
            Self::DynamicLinking => "DYNAMIC",
            Self::Interpreter => "INTERP",
            Self::Note => "NOTE",
            Self::SharedLibrary => "SHLIB",
            Self::ProgramHeaderInfo => "PHDR",
            Self::LowOsSpecific => "LOOS",
            Self::HighOsSpecific => "HIOS",
            Self::LowProcessorSpecific => "LOPROC",
            Self::HighProcessorSpecific => "HIPROC",
            Self::OsSpecific => "OS",
        })
    }
}

bitflags! {
    /// Segment permissions derived from `p_flags` (`PF_X`, `PF_W`, `PF_R`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SegmentFlags: u32 {
        /// `PF_X`.
        const EXECUTABLE = 0x1;
        /// `PF_W`.
        const WRITABLE = 0x2;
        /// `PF_R`.
        const READABLE = 0x4;
    }
}

impl fmt::Display for SegmentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.contains(Self::READABLE) { 'R' } else { '-' };
        let w = if self.contains(Self::WRITABLE) { 'W' } else { '-' };
        let x = if self.contains(Self::EXECUTABLE) { 'X' } else { '-' };
        f.pad(&format!("{r}{w}{x}"))
    }
}

/// Raw ELF64 program header record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Elf64ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl Elf64ProgramHeader {
    pub(crate) fn parse(b: &[u8; ELF64_PHDR_SIZE]) -> Self {
        Self {
            p_type: le_u32(b, 0),
            p_flags: le_u32(b, 4),
            p_offset: le_u64(b, 8),
            p_vaddr: le_u64(b, 16),
            p_paddr: le_u64(b, 24),
            p_filesz: le_u64(b, 32),
            p_memsz: le_u64(b, 40),
            p_align: le_u64(b, 48),
        }
    }
}

/// One parsed segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    /// Classified type.
    pub segment_type: SegmentType,
    /// Raw `p_type`.
    pub raw_type: u32,
    /// Read/write/execute permissions.
    pub flags: SegmentFlags,
    /// Physical load address.
    pub physical_address: u64,
    /// Virtual load address.
    pub virtual_address: u64,
    /// Size in memory; may exceed the payload (zero-filled tail).
    pub memory_size: u64,
    /// Required alignment.
    pub align: u64,
    /// File-resident contents, `p_filesz` bytes long.
    pub payload: Vec<u8>,
}

/// Read every program header and its file-resident payload.
///
/// # Errors
///
/// Returns [`ErrorKind::Read`] or [`ErrorKind::Truncated`] if a header or
/// payload cannot be read in full.
pub(crate) fn read_program_table<R: Read + Seek>(
    reader: &mut ElfReader<R>,
    header: &FileHeader,
) -> Result<Vec<SegmentEntry>, ErrorKind> {
    let count = usize::from(header.phnum);
    let mut segments = Vec::with_capacity(count);
    reader.seek_to(header.phoff, Structure::ProgramHeader(0))?;

    for index in 0..count {
        let raw = reader.read_record::<ELF64_PHDR_SIZE>(Structure::ProgramHeader(index))?;
        let phdr = Elf64ProgramHeader::parse(&raw);
        let segment_type = SegmentType::from_raw(phdr.p_type);

        let payload = if phdr.p_filesz == 0 {
            Vec::new()
        } else {
            reader.read_payload(phdr.p_offset, phdr.p_filesz, Structure::SegmentData(index))?
        };

        log::trace!(
            "segment {index}: type={segment_type} raw={:#x} vaddr={:#x} filesz={:#x} memsz={:#x}",
            phdr.p_type,
            phdr.p_vaddr,
            phdr.p_filesz,
            phdr.p_memsz
        );

        segments.push(SegmentEntry {
            segment_type,
            raw_type: phdr.p_type,
            flags: SegmentFlags::from_bits_truncate(phdr.p_flags),
            physical_address: phdr.p_paddr,
            virtual_address: phdr.p_vaddr,
            memory_size: phdr.p_memsz,
            align: phdr.p_align,
            payload,
        });
    }
    Ok(segments)
}
