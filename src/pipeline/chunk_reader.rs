//! Bounded-size chunk reading over a delimited source.
//!
//! Records are kept as `ByteRecord`s so that decoding happens per chunk: a
//! row with broken encoding fails its own chunk instead of the whole read.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ByteRecord, ErrorKind, Reader, ReaderBuilder};
use tracing::debug;

use crate::error::{ChunkError, CleanerError, Result};

const UTF8_BOM: char = '\u{feff}';

/// A batch of source rows processed as a unit.
#[derive(Debug)]
pub struct RawChunk {
    /// Zero-based chunk position in the source
    pub index: usize,
    pub records: Vec<ByteRecord>,
    /// Rows consumed from the source, including unreadable ones
    pub rows_read: usize,
    /// First record-level read failure, if any. Fails the whole chunk.
    pub read_error: Option<ChunkError>,
}

impl RawChunk {
    /// 1-based number used in log lines
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

pub struct ChunkReader {
    reader: Reader<BufReader<File>>,
    headers: Vec<String>,
    chunk_size: usize,
    next_index: usize,
    exhausted: bool,
}

impl ChunkReader {
    /// Opens the source and reads its header row.
    ///
    /// Fails with `SourceNotFound` before anything is read when the path does
    /// not exist.
    pub fn open(path: &Path, delimiter: u8, chunk_size: usize) -> Result<Self> {
        if !path.exists() {
            return Err(CleanerError::SourceNotFound(path.to_path_buf()));
        }
        if chunk_size == 0 {
            return Err(CleanerError::Config("chunk_size must be greater than zero".to_string()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers = decode_headers(reader.byte_headers()?)?;
        debug!(source = %path.display(), columns = headers.len(), "Opened source");

        Ok(Self {
            reader,
            headers,
            chunk_size,
            next_index: 0,
            exhausted: false,
        })
    }

    /// Header names as they appear in the source
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Reads up to `chunk_size` rows. `Ok(None)` once the source is exhausted.
    ///
    /// I/O failures are fatal; any other record error is attached to the
    /// chunk so the caller can skip it.
    pub fn next_chunk(&mut self) -> Result<Option<RawChunk>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut records = Vec::with_capacity(self.chunk_size.min(8_192));
        let mut rows_read = 0;
        let mut read_error = None;

        while rows_read < self.chunk_size {
            let mut record = ByteRecord::new();
            match self.reader.read_byte_record(&mut record) {
                Ok(true) => {
                    records.push(record);
                    rows_read += 1;
                }
                Ok(false) => {
                    self.exhausted = true;
                    break;
                }
                Err(e) => {
                    if matches!(e.kind(), ErrorKind::Io(_)) {
                        return Err(e.into());
                    }
                    if read_error.is_none() {
                        read_error = Some(ChunkError::Malformed {
                            row: rows_read,
                            message: e.to_string(),
                        });
                    }
                    rows_read += 1;
                }
            }
        }

        if rows_read == 0 {
            return Ok(None);
        }

        let chunk = RawChunk {
            index: self.next_index,
            records,
            rows_read,
            read_error,
        };
        self.next_index += 1;
        Ok(Some(chunk))
    }
}

impl Iterator for ChunkReader {
    type Item = Result<RawChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

fn decode_headers(raw: &ByteRecord) -> Result<Vec<String>> {
    raw.iter()
        .enumerate()
        .map(|(i, field)| {
            let name = std::str::from_utf8(field).map_err(|e| {
                CleanerError::InvalidHeader(format!("column {} is not valid UTF-8: {}", i + 1, e))
            })?;
            let name = if i == 0 { name.trim_start_matches(UTF8_BOM) } else { name };
            Ok(name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let err = ChunkReader::open(Path::new("/definitely/not/here.csv"), b';', 10)
            .err()
            .unwrap();
        assert!(matches!(err, CleanerError::SourceNotFound(_)));
    }

    #[test]
    fn test_reads_in_bounded_chunks() {
        let file = source(b"id;Email\n1;a@b.com\n2;c@d.com\n3;e@f.com\n");
        let mut reader = ChunkReader::open(file.path(), b';', 2).unwrap();
        assert_eq!(reader.headers(), ["id", "Email"]);

        let first = reader.next_chunk().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.number(), 1);
        assert_eq!(first.records.len(), 2);

        let second = reader.next_chunk().unwrap().unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.records.len(), 1);
        assert!(second.read_error.is_none());

        assert!(reader.next_chunk().unwrap().is_none());
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_empty_chunk() {
        let file = source(b"id\n1\n2\n");
        let chunks: Vec<_> = ChunkReader::open(file.path(), b';', 2)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].rows_read, 2);
    }

    #[test]
    fn test_header_bom_is_stripped() {
        let file = source("\u{feff}ID;Email\n1;a@b.com\n".as_bytes());
        let reader = ChunkReader::open(file.path(), b';', 10).unwrap();
        assert_eq!(reader.headers()[0], "ID");
    }

    #[test]
    fn test_invalid_header_encoding_is_fatal() {
        let file = source(b"id;\xff\xfe\n1;2\n");
        let err = ChunkReader::open(file.path(), b';', 10).err().unwrap();
        assert!(matches!(err, CleanerError::InvalidHeader(_)));
    }
}
