//! Source-text table: provenance of the files a program depended on.
//!
//! Each dependency is written as
//! ```text
//!   int32:  length of abspath
//!   bytes:  abspath
//!   uint64: length of source text
//!   bytes:  source text
//! ```
//! with `int32(0)` as the terminal sentinel. Dependencies owned by the
//! program's own root module are excluded (their text is already embedded
//! in the compiled output), as are synthetic dependencies with empty
//! paths. Files that cannot be read are skipped with a warning rather
//! than failing the pass - they may have been deleted since the run.

use serde::{Deserialize, Serialize};

use super::ImageError;

/// A file the program's construction depended on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDependency {
    /// Name of the module whose loading pulled the file in.
    pub module: String,
    /// Absolute path; empty for synthetic/dynamic dependencies.
    pub path: String,
}

impl SourceDependency {
    pub fn new(module: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            path: path.into(),
        }
    }
}

/// Append the source-text table for `deps` to `buf`, reading file contents
/// from disk. Unreadable files produce a warning in `warnings` and are
/// omitted. Always terminates the table with the zero-length sentinel.
pub(crate) fn write_table(
    buf: &mut Vec<u8>,
    deps: &[SourceDependency],
    root_module: &str,
    warnings: &mut Vec<String>,
) {
    for dep in deps {
        if dep.module == root_module {
            continue;
        }
        if dep.path.is_empty() {
            continue;
        }
        let content = match std::fs::read(&dep.path) {
            Ok(content) => content,
            Err(_) => {
                warnings.push(format!(
                    "could not cache source text for \"{}\"",
                    dep.path
                ));
                continue;
            }
        };
        buf.extend_from_slice(&(dep.path.len() as i32).to_le_bytes());
        buf.extend_from_slice(dep.path.as_bytes());
        buf.extend_from_slice(&(content.len() as u64).to_le_bytes());
        buf.extend_from_slice(&content);
    }
    // Mark the end of the source text.
    buf.extend_from_slice(&0i32.to_le_bytes());
}

/// Decode a source-text table from `data`, which must start at the first
/// record. Returns `(path, content)` pairs in table order.
pub fn read_table(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>, ImageError> {
    let mut entries = Vec::new();
    let mut pos = 0usize;
    loop {
        if data.len() < pos + 4 {
            return Err(ImageError::Truncated);
        }
        let path_len = i32::from_le_bytes(
            data[pos..pos + 4]
                .try_into()
                .map_err(|_| ImageError::Truncated)?,
        );
        pos += 4;
        if path_len == 0 {
            return Ok(entries);
        }
        if path_len < 0 {
            return Err(ImageError::Truncated);
        }
        let path_len = path_len as usize;
        if data.len().saturating_sub(pos) < path_len + 8 {
            return Err(ImageError::Truncated);
        }
        let path = String::from_utf8(data[pos..pos + path_len].to_vec())
            .map_err(|e| ImageError::Deserialize(e.to_string()))?;
        pos += path_len;
        let content_len = u64::from_le_bytes(
            data[pos..pos + 8]
                .try_into()
                .map_err(|_| ImageError::Truncated)?,
        );
        pos += 8;
        // Length fields are attacker-controlled bytes; the declared length
        // must fit in the remaining input before any arithmetic on it.
        if content_len > data.len().saturating_sub(pos) as u64 {
            return Err(ImageError::Truncated);
        }
        let content_len = content_len as usize;
        entries.push((path, data[pos..pos + content_len].to_vec()));
        pos += content_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_table_is_just_the_sentinel() {
        let mut buf = Vec::new();
        let mut warnings = Vec::new();
        write_table(&mut buf, &[], "Main", &mut warnings);
        assert_eq!(buf, 0i32.to_le_bytes());
        assert!(warnings.is_empty());
        assert!(read_table(&buf).expect("sentinel-only table").is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_order_and_bytes() {
        let mut files = Vec::new();
        for contents in [b"module A end\n".as_slice(), b"f(x) = x + 1\n"] {
            let mut file = tempfile::NamedTempFile::new().expect("tempfile");
            file.write_all(contents).expect("write");
            files.push(file);
        }
        let deps: Vec<SourceDependency> = files
            .iter()
            .map(|f| SourceDependency::new("A", f.path().to_string_lossy()))
            .collect();

        let mut buf = Vec::new();
        let mut warnings = Vec::new();
        write_table(&mut buf, &deps, "Main", &mut warnings);
        assert!(warnings.is_empty());

        let entries = read_table(&buf).expect("valid table");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, deps[0].path);
        assert_eq!(entries[0].1, b"module A end\n");
        assert_eq!(entries[1].1, b"f(x) = x + 1\n");
    }

    #[test]
    fn test_root_module_and_empty_path_are_skipped() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"content").expect("write");

        let deps = [
            SourceDependency::new("A", file.path().to_string_lossy()),
            SourceDependency::new("B", ""),
            SourceDependency::new("Main", file.path().to_string_lossy()),
        ];
        let mut buf = Vec::new();
        let mut warnings = Vec::new();
        write_table(&mut buf, &deps, "Main", &mut warnings);

        let entries = read_table(&buf).expect("valid table");
        assert_eq!(entries.len(), 1, "empty-path and root-owned entries skipped");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unreadable_file_warns_and_is_omitted() {
        let deps = [SourceDependency::new(
            "A",
            "/nonexistent/definitely/missing.jl",
        )];
        let mut buf = Vec::new();
        let mut warnings = Vec::new();
        write_table(&mut buf, &deps, "Main", &mut warnings);

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("missing.jl"), "warning: {}", warnings[0]);
        assert!(read_table(&buf).expect("valid table").is_empty());
    }

    #[test]
    fn test_truncated_table_is_an_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&5i32.to_le_bytes());
        buf.extend_from_slice(b"ab"); // shorter than the declared path
        assert!(matches!(read_table(&buf), Err(ImageError::Truncated)));
    }

    #[test]
    fn test_oversized_content_length_is_an_error() {
        // A content-length field far larger than the remaining input must
        // be rejected, not used for slicing arithmetic.
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(b"a");
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(read_table(&buf), Err(ImageError::Truncated)));

        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(b"a");
        buf.extend_from_slice(&1024u64.to_le_bytes());
        buf.extend_from_slice(b"short");
        assert!(matches!(read_table(&buf), Err(ImageError::Truncated)));
    }
}
