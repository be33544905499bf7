//! Two-phase system-image writer.
//!
//! The original seek-back-and-patch scheme is modeled as an in-memory
//! buffer: content accumulates linearly, placeholder fields are written
//! where the format demands them, and patching rewrites the placeholder
//! bytes in the buffer once the backing content is final. The finished
//! image is emitted in a single linear pass, so the target storage never
//! needs to support backward seeks.
//!
//! Write order is enforced by an explicit state machine:
//!
//! ```text
//! Start → HeaderWritten → DataOpen → DataClosed → SrctextWritten → finish()
//! ```
//!
//! `close_data_section` writes the checksum and source-text-offset
//! placeholders and immediately patches the checksum - the data-section
//! bytes are final at that point. The source-text offset stays a
//! placeholder until the table position is known, because the clone-target
//! table (split-output mode) may still be embedded in between. Checksum
//! and offset fields are never computed over placeholder bytes.

use super::srctext::{self, SourceDependency};
use super::{ImageError, CHECKSUM_TAG, MAGIC, VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Start,
    HeaderWritten,
    DataOpen,
    DataClosed,
    SrctextWritten,
}

impl WriterState {
    fn name(self) -> &'static str {
        match self {
            WriterState::Start => "Start",
            WriterState::HeaderWritten => "HeaderWritten",
            WriterState::DataOpen => "DataOpen",
            WriterState::DataClosed => "DataClosed",
            WriterState::SrctextWritten => "SrctextWritten",
        }
    }
}

/// Builder for one metadata image stream.
#[derive(Debug)]
pub struct ImageWriter {
    buf: Vec<u8>,
    state: WriterState,
    datastart: usize,
    dataend: usize,
    srctext_offset_pos: usize,
    warnings: Vec<String>,
}

impl ImageWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            state: WriterState::Start,
            datastart: 0,
            dataend: 0,
            srctext_offset_pos: 0,
            warnings: Vec::new(),
        }
    }

    fn expect_state(&self, expected: WriterState, op: &'static str) -> Result<(), ImageError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ImageError::InvalidTransition {
                op,
                state: self.state.name(),
            })
        }
    }

    /// Write the magic and version header.
    pub fn write_header(&mut self) -> Result<(), ImageError> {
        self.expect_state(WriterState::Start, "write_header")?;
        self.buf.extend_from_slice(MAGIC);
        self.buf.extend_from_slice(&VERSION.to_le_bytes());
        self.state = WriterState::HeaderWritten;
        Ok(())
    }

    /// Open the checksummed data section.
    pub fn open_data_section(&mut self) -> Result<(), ImageError> {
        self.expect_state(WriterState::HeaderWritten, "open_data_section")?;
        self.datastart = self.buf.len();
        self.state = WriterState::DataOpen;
        Ok(())
    }

    /// Append artifact bytes to the open data section.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        self.expect_state(WriterState::DataOpen, "append")?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Close the data section: write the checksum and source-text-offset
    /// fields and patch the checksum over the now-final section bytes.
    pub fn close_data_section(&mut self) -> Result<(), ImageError> {
        self.expect_state(WriterState::DataOpen, "close_data_section")?;
        self.dataend = self.buf.len();

        // Checksum placeholder, patched immediately below.
        let checksum_pos = self.buf.len();
        self.buf.extend_from_slice(&0u64.to_le_bytes());
        // Source-text offset placeholder, patched once the table position
        // is known.
        self.srctext_offset_pos = self.buf.len();
        self.buf.extend_from_slice(&0u64.to_le_bytes());

        let crc = crc32fast::hash(&self.buf[self.datastart..self.dataend]);
        let checksum = u64::from(crc) | (CHECKSUM_TAG << 32);
        self.buf[checksum_pos..checksum_pos + 8].copy_from_slice(&checksum.to_le_bytes());

        self.state = WriterState::DataClosed;
        Ok(())
    }

    /// The finalized data-section bytes. Split-output mode feeds these to
    /// the code generator as the embedding input for its relocation and
    /// clone-target tables.
    pub fn data_section(&self) -> Result<&[u8], ImageError> {
        match self.state {
            WriterState::DataClosed | WriterState::SrctextWritten => {
                Ok(&self.buf[self.datastart..self.dataend])
            }
            _ => Err(ImageError::InvalidTransition {
                op: "data_section",
                state: self.state.name(),
            }),
        }
    }

    /// Embed the code generator's clone-target table between the data
    /// section and the source-text table. These bytes are outside the
    /// checksummed range.
    pub fn embed_clone_targets(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        self.expect_state(WriterState::DataClosed, "embed_clone_targets")?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Patch the source-text offset and write the table.
    ///
    /// Dependencies owned by `root_module` or with empty paths are
    /// skipped; unreadable files are skipped with a warning.
    pub fn write_srctext_table(
        &mut self,
        deps: &[SourceDependency],
        root_module: &str,
    ) -> Result<(), ImageError> {
        self.expect_state(WriterState::DataClosed, "write_srctext_table")?;

        let table_offset = self.buf.len() as u64;
        let pos = self.srctext_offset_pos;
        self.buf[pos..pos + 8].copy_from_slice(&table_offset.to_le_bytes());

        srctext::write_table(&mut self.buf, deps, root_module, &mut self.warnings);
        self.state = WriterState::SrctextWritten;
        Ok(())
    }

    /// Warnings accumulated while writing (unreadable source files).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Consume the writer and return the finished image bytes.
    pub fn finish(self) -> Result<Vec<u8>, ImageError> {
        self.expect_state(WriterState::SrctextWritten, "finish")?;
        Ok(self.buf)
    }
}

impl Default for ImageWriter {
    fn default() -> Self {
        Self::new()
    }
}
