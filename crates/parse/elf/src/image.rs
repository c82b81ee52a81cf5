//! The immutable result of a successful load.
//!
//! An [`ElfImage`] owns every parsed header and payload. It is built in one
//! go by [`ElfImage::read_from`] and never modified afterwards; handles share
//! it through an [`Arc`].

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ElfError, ErrorKind, Structure};
use crate::handle::{ProgramHeader, SectionHeader};
use crate::header::{Architecture, ELF64_EHDR_SIZE, FileHeader, FileType};
use crate::reader::ElfReader;
use crate::section::{self, SectionEntry};
use crate::segment::{self, SegmentEntry};

/// A fully parsed ELF64 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfImage {
    path: PathBuf,
    file_type: FileType,
    architecture: Architecture,
    os_abi: u8,
    entry: u64,
    string_table_index: Option<usize>,
    sections: Vec<SectionEntry>,
    segments: Vec<SegmentEntry>,
}

impl ElfImage {
    /// Open and parse the ELF file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`ElfError`] carrying `path` if the file cannot be opened,
    /// read in full, or fails validation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ElfError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ElfError::new(path, ErrorKind::Open(e)))?;
        Self::read_from(BufReader::new(file), path)
    }

    /// Parse an ELF file from any seekable stream.
    ///
    /// `path` is recorded on the image and used to label errors.
    ///
    /// # Errors
    ///
    /// Returns an [`ElfError`] on the first read failure or format violation.
    pub fn read_from<R: Read + Seek>(
        reader: R,
        path: impl Into<PathBuf>,
    ) -> Result<Self, ElfError> {
        let path = path.into();
        match Self::parse(ElfReader::new(reader), &path) {
            Ok(image) => Ok(image),
            Err(kind) => Err(ElfError::new(path, kind)),
        }
    }

    fn parse<R: Read + Seek>(mut reader: ElfReader<R>, path: &Path) -> Result<Self, ErrorKind> {
        let raw = reader.read_record::<ELF64_EHDR_SIZE>(Structure::FileHeader)?;
        let header = FileHeader::parse(&raw)?;
        log::debug!(
            "{}: {} {} ELF, {} program headers",
            path.display(),
            header.architecture,
            header.file_type,
            header.phnum
        );

        let (sections, string_table_index) = if header.has_section_table() {
            let mut sections = section::read_section_table(&mut reader, &header)?;
            let index = section::string_table_index(&sections, &header)?;
            section::resolve_names(&mut sections, index)?;
            log::debug!("{}: {} sections", path.display(), sections.len());
            (sections, Some(index))
        } else {
            log::debug!("{}: no section header table", path.display());
            (Vec::new(), None)
        };

        let segments = segment::read_program_table(&mut reader, &header)?;

        Ok(Self {
            path: path.to_path_buf(),
            file_type: header.file_type,
            architecture: header.architecture,
            os_abi: header.os_abi,
            entry: header.entry,
            string_table_index,
            sections,
            segments,
        })
    }

    /// Path the image was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Executable or shared object.
    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Target architecture.
    #[must_use]
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Raw `EI_OSABI` byte.
    #[must_use]
    pub fn os_abi(&self) -> u8 {
        self.os_abi
    }

    /// Virtual address of the entry point.
    #[must_use]
    pub fn entry_point(&self) -> u64 {
        self.entry
    }

    /// Index of the section name string table, if there is a section table.
    #[must_use]
    pub fn string_table_index(&self) -> Option<usize> {
        self.string_table_index
    }

    /// All sections in table order.
    #[must_use]
    pub fn sections(&self) -> &[SectionEntry] {
        &self.sections
    }

    /// All segments in table order.
    #[must_use]
    pub fn segments(&self) -> &[SegmentEntry] {
        &self.segments
    }

    /// Returns a handle to the section at `index`, or `None` if out of range.
    #[must_use]
    pub fn section_header(self: &Arc<Self>, index: usize) -> Option<SectionHeader> {
        (index < self.sections.len()).then(|| SectionHeader::new(Arc::clone(self), index))
    }

    /// Returns a handle to the segment at `index`, or `None` if out of range.
    #[must_use]
    pub fn program_header(self: &Arc<Self>, index: usize) -> Option<ProgramHeader> {
        (index < self.segments.len()).then(|| ProgramHeader::new(Arc::clone(self), index))
    }

    /// Handles to every section, in table order.
    pub fn section_headers(self: &Arc<Self>) -> impl Iterator<Item = SectionHeader> + use<> {
        let image = Arc::clone(self);
        (0..self.sections.len()).map(move |i| SectionHeader::new(Arc::clone(&image), i))
    }

    /// Handles to every segment, in table order.
    pub fn program_headers(self: &Arc<Self>) -> impl Iterator<Item = ProgramHeader> + use<> {
        let image = Arc::clone(self);
        (0..self.segments.len()).map(move |i| ProgramHeader::new(Arc::clone(&image), i))
    }

    /// Finds the first section called `name`.
    #[must_use]
    pub fn find_section(self: &Arc<Self>, name: &str) -> Option<SectionHeader> {
        let index = self.sections.iter().position(|s| s.name == name)?;
        Some(SectionHeader::new(Arc::clone(self), index))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ErrorClass;
    use crate::header::tests::{append_phdr, append_section, make_elf_header};
    use crate::header::{ELF64_PHDR_SIZE, ELF64_SHDR_SIZE};
    use crate::section::{SHT_NOBITS, SHT_NULL, SHT_PROGBITS, SHT_STRTAB, SectionType};
    use crate::segment::{PT_INTERP, PT_LOAD, SegmentType};

    /// A small dynamic executable: one `PT_INTERP`, one `PT_LOAD`, and the
    /// sections NULL, .interp, .text, .bss, .shstrtab.
    ///
    /// Layout: header, 2 program headers, 5 section headers, then data.
    pub(crate) fn make_sample_elf() -> Vec<u8> {
        let mut buf = make_elf_header();
        buf[16..18].copy_from_slice(&3u16.to_le_bytes()); // ET_DYN

        let interp = b"/lib64/ld-linux-x86-64.so.2\0";
        let text = b"\x31\xc0\xc3";
        let shstrtab = b"\0.interp\0.text\0.bss\0.shstrtab\0";

        let phdr_start = ELF64_EHDR_SIZE as u64;
        let shdr_start = phdr_start + 2 * ELF64_PHDR_SIZE as u64;
        let interp_off = shdr_start + 5 * ELF64_SHDR_SIZE as u64;
        let text_off = interp_off + interp.len() as u64;
        let shstrtab_off = text_off + text.len() as u64;

        buf[40..48].copy_from_slice(&shdr_start.to_le_bytes());
        buf[62..64].copy_from_slice(&4u16.to_le_bytes());

        append_phdr(
            &mut buf,
            PT_INTERP,
            4,
            interp_off,
            0x318,
            0x318,
            interp.len() as u64,
            interp.len() as u64,
            1,
        );
        append_phdr(
            &mut buf,
            PT_LOAD,
            4 | 1,
            text_off,
            0x1000,
            0x1000,
            text.len() as u64,
            0x2000,
            0x1000,
        );

        append_section(&mut buf, 0, SHT_NULL, 0, 0, 0, 0, 0, 0, 0, 0);
        append_section(
            &mut buf,
            1,
            SHT_PROGBITS,
            0x2,
            0x318,
            interp_off,
            interp.len() as u64,
            0,
            0,
            1,
            0,
        );
        append_section(
            &mut buf,
            9,
            SHT_PROGBITS,
            0x6,
            0x1000,
            text_off,
            text.len() as u64,
            0,
            0,
            16,
            0,
        );
        append_section(&mut buf, 15, SHT_NOBITS, 0x3, 0x2000, 0xffff_ff00, 0x1000, 0, 0, 32, 0);
        append_section(
            &mut buf,
            20,
            SHT_STRTAB,
            0,
            0,
            shstrtab_off,
            shstrtab.len() as u64,
            0,
            0,
            1,
            0,
        );

        buf.extend_from_slice(interp);
        buf.extend_from_slice(text);
        buf.extend_from_slice(shstrtab);
        buf
    }

    fn load(buf: Vec<u8>) -> Result<ElfImage, ElfError> {
        ElfImage::read_from(Cursor::new(buf), "sample.elf")
    }

    #[test]
    fn loads_sample() {
        let image = load(make_sample_elf()).expect("valid ELF");
        assert_eq!(image.path(), Path::new("sample.elf"));
        assert_eq!(image.file_type(), FileType::Dynamic);
        assert_eq!(image.architecture(), Architecture::Amd64);
        assert_eq!(image.entry_point(), 0x0040_1000);
        assert_eq!(image.string_table_index(), Some(4));

        let names: Vec<_> = image.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["", ".interp", ".text", ".bss", ".shstrtab"]);
        assert_eq!(image.sections()[3].section_type, SectionType::NoBits);

        let types: Vec<_> = image.segments().iter().map(|s| s.segment_type).collect();
        assert_eq!(types, [SegmentType::Interpreter, SegmentType::Loadable]);
        assert_eq!(image.segments()[0].payload, b"/lib64/ld-linux-x86-64.so.2\0");
    }

    #[test]
    fn no_section_table() {
        let mut buf = make_sample_elf();
        buf[58..60].copy_from_slice(&0u16.to_le_bytes());
        let image = load(buf).expect("valid without sections");
        assert!(image.sections().is_empty());
        assert_eq!(image.string_table_index(), None);
        assert_eq!(image.segments().len(), 2);
    }

    #[test]
    fn short_input_is_read_error() {
        let err = load(vec![0x7f, b'E', b'L', b'F']).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Read);
        assert!(err.render().starts_with("sample.elf: failed to read ELF header"));
    }

    #[test]
    fn bad_magic_is_format_error() {
        let mut buf = make_sample_elf();
        buf[0..4].copy_from_slice(b"MZ\0\0");
        let err = load(buf).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Format);
        assert!(err.to_string().contains("not an ELF file"));
        assert_eq!(err.path(), Path::new("sample.elf"));
    }

    #[test]
    fn string_table_index_must_name_string_table() {
        let mut buf = make_sample_elf();
        buf[62..64].copy_from_slice(&2u16.to_le_bytes()); // .text is not a STRTAB
        let err = load(buf).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidStringTableIndex(2)));
    }

    #[test]
    fn zero_section_offset_with_declared_sections_fails() {
        let mut buf = make_sample_elf();
        buf[40..48].copy_from_slice(&0u64.to_le_bytes());
        let err = load(buf).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Format);
        assert!(matches!(err.kind(), ErrorKind::MissingSectionTable(5)));
    }

    #[test]
    fn stripped_section_headers_load_without_sections() {
        let mut buf = make_sample_elf();
        buf[40..48].copy_from_slice(&0u64.to_le_bytes());
        buf[60..62].copy_from_slice(&0u16.to_le_bytes());
        let image = load(buf).expect("valid without sections");
        assert!(image.sections().is_empty());
        assert_eq!(image.segments().len(), 2);
    }

    #[test]
    fn handles_are_bounded() {
        let image = Arc::new(load(make_sample_elf()).unwrap());
        assert!(image.section_header(4).is_some());
        assert!(image.section_header(5).is_none());
        assert!(image.program_header(1).is_some());
        assert!(image.program_header(2).is_none());
        assert_eq!(image.section_headers().count(), 5);
        assert_eq!(image.program_headers().count(), 2);
    }

    #[test]
    fn find_section_by_name() {
        let image = Arc::new(load(make_sample_elf()).unwrap());
        let text = image.find_section(".text").expect(".text present");
        assert_eq!(text.payload(), b"\x31\xc0\xc3");
        assert!(image.find_section(".debug_info").is_none());
    }

    #[test]
    fn parsing_is_deterministic() {
        let first = load(make_sample_elf()).unwrap();
        let second = load(make_sample_elf()).unwrap();
        assert_eq!(first, second);
    }
}
