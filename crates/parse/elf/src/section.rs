//! ELF64 section header table and string table parsing.
//!
//! The section table is read in two passes: [`read_section_table`] decodes
//! every entry and loads its payload, then [`resolve_names`] uses the
//! section name string table (itself one of those entries) to name them.

use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Seek};

use bitflags::bitflags;

use crate::error::{ErrorKind, Structure};
use crate::header::{ELF64_SHDR_SIZE, FileHeader, SHN_XINDEX, le_u32, le_u64};
use crate::reader::ElfReader;

/// Section type: inactive entry.
pub const SHT_NULL: u32 = 0;

/// Section type: program-defined contents.
pub const SHT_PROGBITS: u32 = 1;

/// Section type: symbol table.
pub const SHT_SYMTAB: u32 = 2;

/// Section type: string table.
pub const SHT_STRTAB: u32 = 3;

/// Section type: relocation entries with addends.
pub const SHT_RELA: u32 = 4;

/// Section type: symbol hash table.
pub const SHT_HASH: u32 = 5;

/// Section type: dynamic linking information.
pub const SHT_DYNAMIC: u32 = 6;

/// Section type: notes.
pub const SHT_NOTE: u32 = 7;

/// Section type: occupies no file space.
pub const SHT_NOBITS: u32 = 8;

/// Section type: relocation entries without addends.
pub const SHT_REL: u32 = 9;

/// Section type: reserved.
pub const SHT_SHLIB: u32 = 10;

/// Section type: dynamic symbol table.
pub const SHT_DYNSYM: u32 = 11;

/// Section type: start of the processor-specific range.
pub const SHT_LOPROC: u32 = 0x7000_0000;

/// Section type: end of the processor-specific range.
pub const SHT_HIPROC: u32 = 0x7fff_ffff;

/// Section type: start of the application-specific range.
pub const SHT_LOUSER: u32 = 0x8000_0000;

/// Section type: end of the application-specific range.
pub const SHT_HIUSER: u32 = 0xffff_ffff;

/// Classified `sh_type`.
///
/// Values without a dedicated variant map to [`SectionType::OsSpecific`];
/// the original number is kept alongside as the entry's raw type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionType {
    /// `SHT_NULL`.
    Null,
    /// `SHT_PROGBITS`.
    ProgramBits,
    /// `SHT_SYMTAB`.
    SymbolTable,
    /// `SHT_DYNSYM`.
    DynamicSymbol,
    /// `SHT_STRTAB`.
    StringTable,
    /// `SHT_RELA`.
    RelocationWithAddends,
    /// `SHT_HASH`.
    Hash,
    /// `SHT_DYNAMIC`.
    DynamicLinking,
    /// `SHT_NOTE`.
    Note,
    /// `SHT_NOBITS`.
    NoBits,
    /// `SHT_REL`.
    Relocation,
    /// `SHT_SHLIB`.
    SharedLibrary,
    /// Exactly `SHT_LOPROC`.
    LowProcessorSpecific,
    /// Exactly `SHT_HIPROC`.
    HighProcessorSpecific,
    /// Exactly `SHT_LOUSER`.
    LowUserSpecific,
    /// Exactly `SHT_HIUSER`.
    HighUserSpecific,
    /// Any other value (GNU extensions and friends).
    OsSpecific,
}

impl SectionType {
    /// Classify a raw `sh_type` value.
    #[must_use]
    pub fn from_raw(sh_type: u32) -> Self {
        match sh_type {
            SHT_NULL => Self::Null,
            SHT_PROGBITS => Self::ProgramBits,
            SHT_SYMTAB => Self::SymbolTable,
            SHT_DYNSYM => Self::DynamicSymbol,
            SHT_STRTAB => Self::StringTable,
            SHT_RELA => Self::RelocationWithAddends,
            SHT_HASH => Self::Hash,
            SHT_DYNAMIC => Self::DynamicLinking,
            SHT_NOTE => Self::Note,
            SHT_NOBITS => Self::NoBits,
            SHT_REL => Self::Relocation,
            SHT_SHLIB => Self::SharedLibrary,
            SHT_LOPROC => Self::LowProcessorSpecific,
            SHT_HIPROC => Self::HighProcessorSpecific,
            SHT_LOUSER => Self::LowUserSpecific,
            SHT_HIUSER => Self::HighUserSpecific,
            _ => Self::OsSpecific,
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Null => "NULL",
            Self::ProgramBits => "PROGBITS",
            Self::SymbolTable => "SYMTAB",
            Self::DynamicSymbol => "DYNSYM",
            Self::StringTable => "STRTAB",
            Self::RelocationWithAddends => "RELA",
            Self::Hash => "HASH",
            Self::DynamicLinking => "DYNAMIC",
            Self::Note => "NOTE",
            Self::NoBits => "NOBITS",
            Self::Relocation => "REL",
            Self::SharedLibrary => "SHLIB",
            Self::LowProcessorSpecific => "LOPROC",
            Self::HighProcessorSpecific => "HIPROC",
            Self::LowUserSpecific => "LOUSER",
            Self::HighUserSpecific => "HIUSER",
            Self::OsSpecific => "OS",
        })
    }
}

bitflags! {
    /// Section attributes derived from `sh_flags`.
    ///
    /// Bit values match `SHF_WRITE`, `SHF_ALLOC` and `SHF_EXECINSTR`; all
    /// other flag bits are dropped.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u64 {
        /// `SHF_WRITE`: writable at run time.
        const WRITABLE = 0x1;
        /// `SHF_ALLOC`: occupies memory during execution.
        const ALLOCATION_REQUIRED = 0x2;
        /// `SHF_EXECINSTR`: contains executable instructions.
        const EXECUTABLE = 0x4;
    }
}

impl fmt::Display for SectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = if self.contains(Self::WRITABLE) { 'W' } else { '-' };
        let a = if self.contains(Self::ALLOCATION_REQUIRED) { 'A' } else { '-' };
        let x = if self.contains(Self::EXECUTABLE) { 'X' } else { '-' };
        f.pad(&format!("{w}{a}{x}"))
    }
}

/// Raw ELF64 section header record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Elf64SectionHeader {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Elf64SectionHeader {
    pub(crate) fn parse(b: &[u8; ELF64_SHDR_SIZE]) -> Self {
        Self {
            sh_name: le_u32(b, 0),
            sh_type: le_u32(b, 4),
            sh_flags: le_u64(b, 8),
            sh_addr: le_u64(b, 16),
            sh_offset: le_u64(b, 24),
            sh_size: le_u64(b, 32),
            sh_link: le_u32(b, 40),
            sh_info: le_u32(b, 44),
            sh_addralign: le_u64(b, 48),
            sh_entsize: le_u64(b, 56),
        }
    }
}

/// One parsed section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    /// Resolved name; empty until name resolution succeeds.
    pub name: String,
    /// Offset of the name in the section name string table.
    pub name_offset: u32,
    /// Classified type.
    pub section_type: SectionType,
    /// Raw `sh_type`.
    pub raw_type: u32,
    /// Write/alloc/exec attributes.
    pub flags: SectionFlags,
    /// Virtual address at execution, or zero.
    pub address: u64,
    /// Section index link; meaning depends on the type.
    pub link: u32,
    /// Extra information; meaning depends on the type.
    pub info: u32,
    /// Required alignment.
    pub address_align: u64,
    /// Size of each fixed-size entry, or zero.
    pub entry_size: u64,
    /// Declared `sh_size`. Virtual for `NoBits` sections.
    pub size: u64,
    /// File-resident contents; empty for `NoBits` and zero-size sections.
    pub payload: Vec<u8>,
}

/// A view of a string table section's bytes.
///
/// Strings are NUL-terminated and referenced by byte offset.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    /// Creates a new string table from the raw section data.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Looks up the string starting at byte offset `offset`.
    ///
    /// The string runs to the next NUL or to the end of the table. Returns
    /// `None` if `offset` is at or past the end. Invalid UTF-8 is replaced.
    #[must_use]
    pub fn get(&self, offset: u32) -> Option<Cow<'a, str>> {
        let start = usize::try_from(offset).ok()?;
        let remaining = self.data.get(start..).filter(|r| !r.is_empty())?;
        let end = remaining
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(remaining.len());
        Some(String::from_utf8_lossy(&remaining[..end]))
    }

    /// Iterates over every NUL-terminated string in table order.
    ///
    /// Bytes after the last NUL are not part of any string and are skipped.
    pub fn strings(self) -> impl Iterator<Item = Cow<'a, str>> {
        let data = self.data;
        let terminated = data
            .iter()
            .rposition(|&b| b == 0)
            .map(|last| &data[..last]);
        terminated
            .into_iter()
            .flat_map(|t| t.split(|&b| b == 0))
            .map(String::from_utf8_lossy)
    }
}

/// Resolve the number of section headers.
///
/// A zero `e_shnum` means the real count is stored in the `sh_size` of the
/// entry at the start of the table.
fn section_count<R: Read + Seek>(
    reader: &mut ElfReader<R>,
    header: &FileHeader,
) -> Result<u64, ErrorKind> {
    if header.shnum != 0 {
        return Ok(u64::from(header.shnum));
    }
    reader.seek_to(header.shoff, Structure::SectionCountEntry)?;
    let raw = reader.read_record::<ELF64_SHDR_SIZE>(Structure::SectionCountEntry)?;
    let count = Elf64SectionHeader::parse(&raw).sh_size;
    log::debug!("extended section count: {count}");
    Ok(count)
}

/// Read every section header and its payload.
///
/// Names are left empty; see [`resolve_names`].
///
/// # Errors
///
/// Returns [`ErrorKind::Read`] or [`ErrorKind::Truncated`] if a header or
/// payload cannot be read in full.
pub(crate) fn read_section_table<R: Read + Seek>(
    reader: &mut ElfReader<R>,
    header: &FileHeader,
) -> Result<Vec<SectionEntry>, ErrorKind> {
    // Saturate; a count past usize fails on the first short read.
    let count = usize::try_from(section_count(reader, header)?).unwrap_or(usize::MAX);
    reader.seek_to(header.shoff, Structure::SectionHeader(0))?;

    let mut sections = Vec::new();
    for index in 0..count {
        let raw = reader.read_record::<ELF64_SHDR_SIZE>(Structure::SectionHeader(index))?;
        let shdr = Elf64SectionHeader::parse(&raw);
        let section_type = SectionType::from_raw(shdr.sh_type);

        let payload = if section_type == SectionType::NoBits || shdr.sh_size == 0 {
            Vec::new()
        } else {
            reader.read_payload(shdr.sh_offset, shdr.sh_size, Structure::SectionData(index))?
        };

        log::trace!(
            "section {index}: type={section_type} raw={:#x} offset={:#x} size={:#x}",
            shdr.sh_type,
            shdr.sh_offset,
            shdr.sh_size
        );

        sections.push(SectionEntry {
            name: String::new(),
            name_offset: shdr.sh_name,
            section_type,
            raw_type: shdr.sh_type,
            flags: SectionFlags::from_bits_truncate(shdr.sh_flags),
            address: shdr.sh_addr,
            link: shdr.sh_link,
            info: shdr.sh_info,
            address_align: shdr.sh_addralign,
            entry_size: shdr.sh_entsize,
            size: shdr.sh_size,
            payload,
        });
    }
    Ok(sections)
}

/// Find the index of the section name string table.
///
/// `SHN_XINDEX` defers to the `sh_link` of section 0.
pub(crate) fn string_table_index(
    sections: &[SectionEntry],
    header: &FileHeader,
) -> Result<usize, ErrorKind> {
    let (raw, err) = if header.shstrndx == SHN_XINDEX {
        let link = sections
            .first()
            .map_or(u32::from(SHN_XINDEX), |zeroth| zeroth.link);
        (link, ErrorKind::InvalidExtendedStringTableIndex { link })
    } else {
        let index = u32::from(header.shstrndx);
        (index, ErrorKind::InvalidStringTableIndex(index))
    };

    usize::try_from(raw)
        .ok()
        .filter(|&i| {
            sections
                .get(i)
                .is_some_and(|s| s.section_type == SectionType::StringTable)
        })
        .ok_or(err)
}

/// Name every section from the section name string table at `strtab_index`.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidNameIndex`] for the first section whose name
/// offset is outside the string table.
pub(crate) fn resolve_names(
    sections: &mut [SectionEntry],
    strtab_index: usize,
) -> Result<(), ErrorKind> {
    let names = {
        let strtab = StringTable::new(&sections[strtab_index].payload);
        sections
            .iter()
            .enumerate()
            .map(|(section, entry)| {
                let name = strtab.get(entry.name_offset).ok_or(ErrorKind::InvalidNameIndex {
                    section,
                    offset: entry.name_offset,
                })?;
                if let Cow::Owned(_) = name {
                    log::warn!("section {section} name is not valid UTF-8");
                }
                Ok(name.into_owned())
            })
            .collect::<Result<Vec<_>, ErrorKind>>()?
    };

    for (entry, name) in sections.iter_mut().zip(names) {
        entry.name = name;
    }
    Ok(())
}
