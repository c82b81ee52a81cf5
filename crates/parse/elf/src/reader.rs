//! Offset-based reads over a seekable byte stream.
//!
//! Tables are scanned sequentially with [`ElfReader::read_record`]; payloads
//! are fetched out of line with [`ElfReader::read_payload`], which returns the
//! stream to the table cursor afterwards.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{ErrorKind, Structure};

/// A seekable stream plus the read discipline the table readers rely on.
pub(crate) struct ElfReader<R> {
    inner: R,
}

impl<R: Read + Seek> ElfReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Moves the table cursor to `offset`.
    pub(crate) fn seek_to(&mut self, offset: u64, what: Structure) -> Result<(), ErrorKind> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map(|_| ())
            .map_err(|source| ErrorKind::Read { what, source })
    }

    /// Reads one fixed-size record at the current position.
    ///
    /// A short read is reported as [`ErrorKind::Read`].
    pub(crate) fn read_record<const N: usize>(
        &mut self,
        what: Structure,
    ) -> Result<[u8; N], ErrorKind> {
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|source| ErrorKind::Read { what, source })?;
        Ok(buf)
    }

    /// Reads exactly `size` bytes at `offset`, then restores the position.
    ///
    /// The buffer grows with the bytes actually read, so a declared size far
    /// past end-of-file fails with [`ErrorKind::Truncated`] instead of
    /// allocating the declared amount up front.
    pub(crate) fn read_payload(
        &mut self,
        offset: u64,
        size: u64,
        what: Structure,
    ) -> Result<Vec<u8>, ErrorKind> {
        let io_err = |source: io::Error| ErrorKind::Read { what, source };

        let resume = self.inner.stream_position().map_err(io_err)?;
        self.inner.seek(SeekFrom::Start(offset)).map_err(io_err)?;

        let mut data = Vec::new();
        let found = (&mut self.inner)
            .take(size)
            .read_to_end(&mut data)
            .map_err(io_err)?;

        self.inner.seek(SeekFrom::Start(resume)).map_err(io_err)?;

        if found as u64 != size {
            return Err(ErrorKind::Truncated {
                what,
                offset,
                expected: size,
                found: found as u64,
            });
        }
        Ok(data)
    }
}
