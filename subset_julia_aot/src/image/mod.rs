//! System-image file format.
//!
//! The image carries everything needed to reload the selected compiled
//! artifacts without re-running the program: a bincode-serialized metadata
//! payload, a CRC-checksummed data section, an optional embedded
//! clone-target table (split-output mode), and a source-text table with
//! the provenance of every file the program's construction depended on.
//!
//! # File Format
//!
//! ```text
//! +----------------------+
//! | Magic (4 bytes)      |  "SJSI"
//! +----------------------+
//! | Version (4 bytes)    |  u32 format version
//! +----------------------+
//! | Metadata (N bytes)   |  bincode-serialized ImageMetadata
//! +----------------------+
//! | Checksum (8 bytes)   |  0xfafbfcfd << 32 | crc32(data section)
//! +----------------------+
//! | SrcText off (8 bytes)|  absolute offset of the source-text table
//! +----------------------+
//! | Clone targets (M b)  |  opaque, split-output mode only
//! +----------------------+
//! | SourceTextTable      |  repeated { i32 len; path; u64 len; content }
//! |                      |  terminated by i32(0)
//! +----------------------+
//! ```
//!
//! The data section is `[datastart, dataend)` where `datastart` is the
//! first metadata byte and `dataend` the first checksum byte; the checksum
//! is computed only after those bytes are final.
//!
//! # Sub-modules
//!
//! - `writer`: Two-phase, state-checked image writer
//! - `srctext`: Source-text table encoding/decoding

pub mod srctext;
pub mod writer;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::worklist::{WorkItem, WorkList};

pub use srctext::SourceDependency;
pub use writer::ImageWriter;

/// Magic bytes identifying a system-image file.
pub const MAGIC: &[u8; 4] = b"SJSI";

/// Current image format version. Increment on breaking changes.
pub const VERSION: u32 = 1;

/// Fixed tag stored in the upper 32 bits of the checksum field.
pub const CHECKSUM_TAG: u64 = 0xfafbfcfd;

/// Image format error.
#[derive(Debug, Error)]
pub enum ImageError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid magic bytes - not a system image.
    #[error("invalid magic bytes - not a system image")]
    InvalidMagic,
    /// Unsupported format version.
    #[error("unsupported image version: {0} (current: {VERSION})")]
    UnsupportedVersion(u32),
    /// The stored checksum does not match the data-section bytes.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    /// The checksum tag bits are wrong for this format.
    #[error("invalid checksum tag: {0:#010x}")]
    InvalidChecksumTag(u32),
    /// The byte stream ended before a complete record.
    #[error("truncated image data")]
    Truncated,
    /// Serialization error.
    #[error("failed to serialize metadata: {0}")]
    Serialize(String),
    /// Deserialization error.
    #[error("failed to deserialize metadata: {0}")]
    Deserialize(String),
    /// A writer operation was attempted in the wrong state.
    #[error("invalid writer operation {op} in state {state}")]
    InvalidTransition {
        op: &'static str,
        state: &'static str,
    },
}

/// One compile/emit target as recorded in the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub module: String,
    pub method: String,
    /// Rendered dispatch-tuple signature; empty for re-export aliases.
    pub signature: String,
    pub unspecialized: bool,
    pub reexport: bool,
}

/// Metadata payload embedded in the image data section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub format_version: u32,
    /// SHA-256 over the rendered target list - detects images built from a
    /// different work-list when comparing artifacts.
    pub worklist_hash: String,
    pub targets: Vec<TargetRecord>,
}

impl ImageMetadata {
    /// Build the metadata payload for one work-list.
    pub fn from_worklist(worklist: &WorkList) -> Self {
        let targets: Vec<TargetRecord> = worklist
            .items
            .iter()
            .map(|item| match item {
                WorkItem::Compile(target) => TargetRecord {
                    module: target.module.clone(),
                    method: target.method.clone(),
                    signature: target.sig.to_string(),
                    unspecialized: target.unspecialized,
                    reexport: false,
                },
                WorkItem::Reexport { module, method } => TargetRecord {
                    module: module.clone(),
                    method: method.clone(),
                    signature: String::new(),
                    unspecialized: false,
                    reexport: true,
                },
            })
            .collect();
        let worklist_hash = hash_targets(&targets);
        Self {
            format_version: VERSION,
            worklist_hash,
            targets,
        }
    }

    /// Serialize to the bincode payload stored in the data section.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ImageError> {
        bincode::serialize(self).map_err(|e| ImageError::Serialize(e.to_string()))
    }
}

/// SHA-256 fingerprint of a rendered target list.
pub fn hash_targets(targets: &[TargetRecord]) -> String {
    let mut hasher = Sha256::new();
    for t in targets {
        hasher.update(t.module.as_bytes());
        hasher.update([0u8]);
        hasher.update(t.method.as_bytes());
        hasher.update([0u8]);
        hasher.update(t.signature.as_bytes());
        hasher.update([t.unspecialized as u8, t.reexport as u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// A fully parsed and validated image.
#[derive(Debug)]
pub struct ParsedImage {
    pub version: u32,
    pub metadata: ImageMetadata,
    /// Decoded source-text table entries, in file order.
    pub srctext: Vec<(String, Vec<u8>)>,
}

/// Parse and validate an image from raw bytes.
///
/// Verifies magic and version, recomputes the data-section CRC against the
/// stored checksum, checks the tag bits, then decodes the metadata payload
/// and the source-text table.
pub fn parse_image(data: &[u8]) -> Result<ParsedImage, ImageError> {
    if data.len() < 8 {
        return Err(ImageError::InvalidMagic);
    }
    if &data[0..4] != MAGIC {
        return Err(ImageError::InvalidMagic);
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    // Version numbering starts at 1; zero never shipped.
    if version == 0 || version > VERSION {
        return Err(ImageError::UnsupportedVersion(version));
    }

    // The srctext offset field sits 8 bytes after the checksum field; both
    // directly follow the data section. Locate them from the table offset
    // stored at the end of the data section by scanning from the header.
    let datastart = 8usize;
    // Find dataend via the srctext offset: it is the last 8 bytes of the
    // data-section trailer, but its position depends on the metadata
    // length, which bincode does not delimit. The metadata payload is
    // decoded greedily; bincode reports how many bytes it consumed.
    let mut cursor = std::io::Cursor::new(&data[datastart..]);
    let metadata: ImageMetadata = bincode::deserialize_from(&mut cursor)
        .map_err(|e| ImageError::Deserialize(e.to_string()))?;
    let dataend = datastart + cursor.position() as usize;

    if data.len() < dataend + 16 {
        return Err(ImageError::Truncated);
    }
    let stored = u64::from_le_bytes(
        data[dataend..dataend + 8]
            .try_into()
            .map_err(|_| ImageError::Truncated)?,
    );
    let stored_tag = (stored >> 32) as u32;
    if u64::from(stored_tag) != CHECKSUM_TAG {
        return Err(ImageError::InvalidChecksumTag(stored_tag));
    }
    let stored_crc = stored as u32;
    let computed = crc32fast::hash(&data[datastart..dataend]);
    if computed != stored_crc {
        return Err(ImageError::ChecksumMismatch {
            stored: stored_crc,
            computed,
        });
    }

    let srctext_offset = u64::from_le_bytes(
        data[dataend + 8..dataend + 16]
            .try_into()
            .map_err(|_| ImageError::Truncated)?,
    ) as usize;
    if srctext_offset > data.len() {
        return Err(ImageError::Truncated);
    }
    let srctext = srctext::read_table(&data[srctext_offset..])?;

    Ok(ParsedImage {
        version,
        metadata,
        srctext,
    })
}
