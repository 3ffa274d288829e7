//! Archive discovery and streaming line reader.
//!
//! Dumps are zstd-compressed JSON-lines files, frequently tens of gigabytes
//! and compressed with long-distance windows. [`ArchiveLines`] decompresses
//! on the fly and yields one line at a time; the whole archive is never held
//! in memory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use orpha_types::SubredditRecord;
use walkdir::WalkDir;

use crate::types::{ScanConfig, ScanError, ScanResult};

/// Finds archives under `dir`, recursing into subdirectories.
///
/// Files with the configured extension are collected. If any of them carry
/// the metadata-only marker in their name, only those are returned. The
/// result is sorted by path.
pub fn discover_archives<P: AsRef<Path>>(dir: P, config: &ScanConfig) -> ScanResult<Vec<PathBuf>> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut all = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable path under {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let has_extension = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy() == config.archive_extension.as_str())
            .unwrap_or(false);
        if has_extension {
            all.push(entry.into_path());
        }
    }

    let marked: Vec<PathBuf> = if config.meta_marker.is_empty() {
        Vec::new()
    } else {
        all.iter()
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().contains(config.meta_marker.as_str()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    };

    let mut archives = if marked.is_empty() { all } else { marked };
    archives.sort();

    if archives.is_empty() {
        return Err(ScanError::NoArchives {
            directory: dir.display().to_string(),
            extension: config.archive_extension.clone(),
        });
    }

    Ok(archives)
}

type ZstdReader = zstd::stream::read::Decoder<'static, BufReader<File>>;

/// Lazy sequence of decoded lines from one archive.
///
/// Blank lines are skipped and invalid UTF-8 is replaced. A decode failure is
/// yielded once as [`ScanError::Decode`], after which the sequence ends. To
/// read an archive again, open it again.
pub struct ArchiveLines {
    path: PathBuf,
    reader: BufReader<ZstdReader>,
    buf: Vec<u8>,
    lines_read: u64,
    done: bool,
}

impl ArchiveLines {
    /// Opens an archive, capping the decoder window at `2^window_log_max` bytes.
    pub fn open<P: AsRef<Path>>(path: P, window_log_max: u32) -> ScanResult<Self> {
        let path = path.as_ref();
        let open_err = |source| ScanError::ArchiveOpen {
            path: path.display().to_string(),
            source,
        };

        let file = File::open(path).map_err(open_err)?;
        let mut decoder = zstd::stream::read::Decoder::new(file).map_err(open_err)?;
        decoder.window_log_max(window_log_max).map_err(open_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(decoder),
            buf: Vec::with_capacity(4096),
            lines_read: 0,
            done: false,
        })
    }

    /// Non-blank lines yielded so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

impl Iterator for ArchiveLines {
    type Item = ScanResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&self.buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.lines_read += 1;
                    return Some(Ok(line.to_string()));
                }
                Err(source) => {
                    self.done = true;
                    return Some(Err(ScanError::Decode {
                        path: self.path.display().to_string(),
                        source,
                    }));
                }
            }
        }
    }
}

/// Decodes one archive line into a record.
pub fn parse_record(line: &str) -> ScanResult<SubredditRecord> {
    Ok(serde_json::from_str(line)?)
}

/// Formats a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_archive(path: &Path, content: &[u8]) {
        let compressed = zstd::encode_all(content, 3).unwrap();
        fs::write(path, compressed).unwrap();
    }

    #[test]
    fn test_discover_recurses_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2023/b")).unwrap();
        write_archive(&dir.path().join("2023/b/subreddits_2.zst"), b"");
        write_archive(&dir.path().join("subreddits_1.zst"), b"");
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let found = discover_archives(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0] < found[1]);
        assert!(found.iter().all(|p| p.extension().unwrap() == "zst"));
    }

    #[test]
    fn test_discover_prefers_meta_only() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(&dir.path().join("subreddits_full.zst"), b"");
        write_archive(&dir.path().join("subreddits_meta_only.zst"), b"");

        let found = discover_archives(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("subreddits_meta_only.zst"));
    }

    #[test]
    fn test_discover_empty_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_archives(dir.path(), &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::NoArchives { .. }));
    }

    #[test]
    fn test_discover_missing_dir() {
        let err = discover_archives("/nonexistent/dumps", &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_lines_skip_blank_and_strip_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zst");
        write_archive(&path, b"{\"name\":\"a\"}\r\n\n   \n{\"name\":\"b\"}");

        let mut reader = ArchiveLines::open(&path, 27).unwrap();
        let lines: Vec<String> = reader.by_ref().collect::<ScanResult<_>>().unwrap();
        assert_eq!(lines, vec![r#"{"name":"a"}"#, r#"{"name":"b"}"#]);
        assert_eq!(reader.lines_read(), 2);
    }

    #[test]
    fn test_lines_replace_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zst");
        write_archive(&path, b"ok\xff\n");

        let mut lines = ArchiveLines::open(&path, 27).unwrap();
        assert_eq!(lines.next().unwrap().unwrap(), "ok\u{fffd}");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_corrupt_archive_yields_decode_error_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.zst");
        fs::write(&path, b"this is not zstd at all").unwrap();

        let mut lines = ArchiveLines::open(&path, 27).unwrap();
        assert!(matches!(lines.next(), Some(Err(ScanError::Decode { .. }))));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_open_missing_archive() {
        let err = ArchiveLines::open("/nonexistent/a.zst", 27).err().unwrap();
        assert!(matches!(err, ScanError::ArchiveOpen { .. }));
    }

    #[test]
    fn test_parse_record() {
        let record = parse_record(r#"{"name":"r/x","title":"T"}"#).unwrap();
        assert_eq!(record.name.as_deref(), Some("r/x"));
        assert!(parse_record("{broken").is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }
}
