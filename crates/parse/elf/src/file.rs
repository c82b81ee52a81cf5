//! The stateful loader front end.

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ElfError;
use crate::handle::{ProgramHeader, SectionHeader};
use crate::header::{Architecture, FileType};
use crate::image::ElfImage;

/// Holds the most recently loaded [`ElfImage`] and the last error message.
///
/// A successful [`load`](Self::load) replaces the image wholesale. A failed
/// one leaves the previous image in place and only updates the message.
/// Concurrent loads need external synchronization; the handles it returns
/// do not.
#[derive(Debug, Default)]
pub struct ElfFile {
    image: Option<Arc<ElfImage>>,
    error: String,
}

impl ElfFile {
    /// Creates a loader with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ELF file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the [`ElfError`] that stopped the load. Its rendered form is
    /// also available from [`error_message`](Self::error_message).
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ElfError> {
        self.publish(ElfImage::open(path))
    }

    /// Loads an ELF file from an already-open stream, labelled `path`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_from<R: Read + Seek>(
        &mut self,
        reader: R,
        path: impl Into<PathBuf>,
    ) -> Result<(), ElfError> {
        self.publish(ElfImage::read_from(reader, path))
    }

    fn publish(&mut self, result: Result<ElfImage, ElfError>) -> Result<(), ElfError> {
        match result {
            Ok(image) => {
                log::debug!("{}: loaded", image.path().display());
                self.image = Some(Arc::new(image));
                self.error.clear();
                Ok(())
            }
            Err(err) => {
                self.error = err.render();
                log::debug!("{}", self.error);
                Err(err)
            }
        }
    }

    /// The current image, if any load has succeeded.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<ElfImage>> {
        self.image.as_ref()
    }

    /// Path of the current image.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.image.as_deref().map(ElfImage::path)
    }

    /// Message of the most recent failed load; empty after a success.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error
    }

    /// File type of the current image.
    #[must_use]
    pub fn file_type(&self) -> Option<FileType> {
        self.image.as_deref().map(ElfImage::file_type)
    }

    /// Architecture of the current image.
    #[must_use]
    pub fn architecture(&self) -> Option<Architecture> {
        self.image.as_deref().map(ElfImage::architecture)
    }

    /// Number of program headers; zero when nothing is loaded.
    #[must_use]
    pub fn program_header_count(&self) -> usize {
        self.image.as_deref().map_or(0, |image| image.segments().len())
    }

    /// Handle to the program header at `index`.
    ///
    /// Returns `None` when nothing is loaded or `index` is out of range.
    #[must_use]
    pub fn program_header(&self, index: usize) -> Option<ProgramHeader> {
        self.image.as_ref()?.program_header(index)
    }

    /// Number of section headers; zero when nothing is loaded.
    #[must_use]
    pub fn section_header_count(&self) -> usize {
        self.image.as_deref().map_or(0, |image| image.sections().len())
    }

    /// Handle to the section header at `index`.
    ///
    /// Returns `None` when nothing is loaded or `index` is out of range.
    #[must_use]
    pub fn section_header(&self, index: usize) -> Option<SectionHeader> {
        self.image.as_ref()?.section_header(index)
    }

    /// Handles to every section of the current image.
    pub fn sections(&self) -> impl Iterator<Item = SectionHeader> + use<> {
        self.image
            .clone()
            .into_iter()
            .flat_map(|image| image.section_headers())
    }

    /// Handles to every segment of the current image.
    pub fn segments(&self) -> impl Iterator<Item = ProgramHeader> + use<> {
        self.image
            .clone()
            .into_iter()
            .flat_map(|image| image.program_headers())
    }
}
