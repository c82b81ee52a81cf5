//! Lightweight views into a shared [`ElfImage`].
//!
//! A handle is an image reference plus an index. Handles are only created
//! for in-range indices, so accessors index the image directly. Cloning a
//! handle or holding it past the loader keeps the image alive.

use std::borrow::Cow;
use std::sync::Arc;

use crate::image::ElfImage;
use crate::section::{SectionEntry, SectionFlags, SectionType, StringTable};
use crate::segment::{SegmentEntry, SegmentFlags, SegmentType};

/// A view of one section.
#[derive(Debug, Clone)]
pub struct SectionHeader {
    image: Arc<ElfImage>,
    index: usize,
}

impl SectionHeader {
    pub(crate) fn new(image: Arc<ElfImage>, index: usize) -> Self {
        debug_assert!(index < image.sections().len());
        Self { image, index }
    }

    fn entry(&self) -> &SectionEntry {
        &self.image.sections()[self.index]
    }

    /// Position of this section in the section table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Resolved section name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.entry().name
    }

    /// Classified section type.
    #[must_use]
    pub fn section_type(&self) -> SectionType {
        self.entry().section_type
    }

    /// Raw `sh_type`, kept even when classified as OS-specific.
    #[must_use]
    pub fn raw_type(&self) -> u32 {
        self.entry().raw_type
    }

    /// Write/alloc/exec attributes.
    #[must_use]
    pub fn attributes(&self) -> SectionFlags {
        self.entry().flags
    }

    /// Virtual address during execution.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.entry().address
    }

    /// Declared size, including the virtual size of `NoBits` sections.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.entry().size
    }

    /// File-resident bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.entry().payload
    }

    /// Length of [`payload`](Self::payload).
    #[must_use]
    pub fn payload_size(&self) -> usize {
        self.entry().payload.len()
    }

    /// `sh_link`.
    #[must_use]
    pub fn link(&self) -> u32 {
        self.entry().link
    }

    /// `sh_info`.
    #[must_use]
    pub fn info(&self) -> u32 {
        self.entry().info
    }

    /// `sh_addralign`.
    #[must_use]
    pub fn address_align(&self) -> u64 {
        self.entry().address_align
    }

    /// `sh_entsize`.
    #[must_use]
    pub fn entry_size(&self) -> u64 {
        self.entry().entry_size
    }

    /// Splits the payload into its NUL-terminated strings, in order.
    ///
    /// Useful for `.dynstr` and friends. Empty strings between consecutive
    /// NULs are kept; bytes after the final NUL are dropped.
    #[must_use]
    pub fn as_string_table(&self) -> Vec<String> {
        StringTable::new(self.payload())
            .strings()
            .map(Cow::into_owned)
            .collect()
    }

    /// The image this handle points into.
    #[must_use]
    pub fn image(&self) -> &Arc<ElfImage> {
        &self.image
    }
}

/// A view of one segment.
#[derive(Debug, Clone)]
pub struct ProgramHeader {
    image: Arc<ElfImage>,
    index: usize,
}

impl ProgramHeader {
    pub(crate) fn new(image: Arc<ElfImage>, index: usize) -> Self {
        debug_assert!(index < image.segments().len());
        Self { image, index }
    }

    fn entry(&self) -> &SegmentEntry {
        &self.image.segments()[self.index]
    }

    /// Position of this segment in the program header table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Classified segment type.
    #[must_use]
    pub fn segment_type(&self) -> SegmentType {
        self.entry().segment_type
    }

    /// Raw `p_type`.
    #[must_use]
    pub fn raw_type(&self) -> u32 {
        self.entry().raw_type
    }

    /// Read/write/execute permissions.
    #[must_use]
    pub fn attributes(&self) -> SegmentFlags {
        self.entry().flags
    }

    /// `p_paddr`.
    #[must_use]
    pub fn physical_address(&self) -> u64 {
        self.entry().physical_address
    }

    /// `p_vaddr`.
    #[must_use]
    pub fn virtual_address(&self) -> u64 {
        self.entry().virtual_address
    }

    /// `p_memsz`.
    #[must_use]
    pub fn memory_size(&self) -> u64 {
        self.entry().memory_size
    }

    /// `p_align`.
    #[must_use]
    pub fn align(&self) -> u64 {
        self.entry().align
    }

    /// File-resident bytes (`p_filesz` long).
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.entry().payload
    }

    /// Length of [`payload`](Self::payload).
    #[must_use]
    pub fn payload_size(&self) -> usize {
        self.entry().payload.len()
    }

    /// The image this handle points into.
    #[must_use]
    pub fn image(&self) -> &Arc<ElfImage> {
        &self.image
    }
}
