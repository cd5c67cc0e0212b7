use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::Result;
use crate::types::{CanonicalField, NormalizedRecord};

/// Writes records under the canonical header and returns the row count.
///
/// The file is created, fully written and flushed before returning. Parent
/// directories are created as needed.
pub fn write_records<'a, I>(path: &Path, records: I, delimiter: u8) -> Result<usize>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(BufWriter::new(file));

    writer.write_record(CanonicalField::header())?;
    let mut written = 0;
    for record in records {
        writer.write_record(record.to_output_row())?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
