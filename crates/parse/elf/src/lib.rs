//! Read-only ELF64 metadata reader.
//!
//! Loads a 64-bit little-endian Linux executable or shared object into an
//! immutable [`ElfImage`]: the classified file header, the program header
//! table and the section header table, with every file-resident payload and
//! every section name resolved. Nothing is relocated or executed.
//!
//! Pipeline: validate header → read section table → resolve section names →
//! read program table → publish image. Any failure stops the pipeline and
//! nothing is published.
//!
//! # Usage
//!
//! ```no_run
//! use elfscope_elf::ElfFile;
//!
//! let mut elf = ElfFile::new();
//! if elf.load("/bin/true").is_err() {
//!     eprintln!("{}", elf.error_message());
//!     return;
//! }
//! for section in elf.sections() {
//!     println!("{}", section.name());
//! }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod file;
pub mod handle;
pub mod header;
pub mod image;
mod reader;
pub mod section;
pub mod segment;

pub use error::{ElfError, ErrorClass, ErrorKind, Structure};
pub use file::ElfFile;
pub use handle::{ProgramHeader, SectionHeader};
pub use header::{Architecture, FileHeader, FileType};
pub use image::ElfImage;
pub use section::{SectionEntry, SectionFlags, SectionType, StringTable};
pub use segment::{SegmentEntry, SegmentFlags, SegmentType};
