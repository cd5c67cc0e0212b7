use std::collections::BTreeMap;

use csv::ByteRecord;

use crate::error::ChunkError;
use crate::types::{CanonicalField, FieldValue, NormalizedRecord, FIELD_COUNT};

/// Where each canonical field lives in the source rows.
///
/// Built from the header row after applying the rename table. Columns that
/// are not renamed keep their source name, so an export that already uses
/// canonical names needs no mapping. When two source columns end up with the
/// same canonical name, the leftmost one wins.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    renamed: Vec<String>,
    positions: [Option<usize>; FIELD_COUNT],
}

impl ColumnMapping {
    pub fn resolve(headers: &[String], rename_mapping: &BTreeMap<String, String>) -> Self {
        let renamed: Vec<String> = headers
            .iter()
            .map(|name| rename_mapping.get(name).cloned().unwrap_or_else(|| name.clone()))
            .collect();

        let mut positions = [None; FIELD_COUNT];
        for field in CanonicalField::ALL {
            positions[field.index()] = renamed.iter().position(|name| name == field.as_str());
        }

        Self { renamed, positions }
    }

    /// Column names after renaming, in source order
    pub fn renamed_columns(&self) -> &[String] {
        &self.renamed
    }

    pub fn position(&self, field: CanonicalField) -> Option<usize> {
        self.positions[field.index()]
    }

    /// Canonical fields the source does not provide; backfilled as missing
    pub fn missing_fields(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| self.position(*f).is_none())
            .collect()
    }

    pub fn source_width(&self) -> usize {
        self.renamed.len()
    }
}

/// Projects raw rows onto the canonical schema.
///
/// Every field of every row must be valid UTF-8 and no row may be wider than
/// the header; either failure rejects the whole chunk. Short rows are padded
/// with missing values.
pub fn normalize_chunk(
    records: &[ByteRecord],
    mapping: &ColumnMapping,
    na_values: &[String],
) -> Result<Vec<NormalizedRecord>, ChunkError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| normalize_record(row, record, mapping, na_values))
        .collect()
}

fn normalize_record(
    row: usize,
    record: &ByteRecord,
    mapping: &ColumnMapping,
    na_values: &[String],
) -> Result<NormalizedRecord, ChunkError> {
    if record.len() > mapping.source_width() {
        return Err(ChunkError::Malformed {
            row,
            message: format!(
                "expected at most {} fields, found {}",
                mapping.source_width(),
                record.len()
            ),
        });
    }

    let mut cells = Vec::with_capacity(record.len());
    for (col, raw) in record.iter().enumerate() {
        let text = std::str::from_utf8(raw).map_err(|_| ChunkError::InvalidEncoding {
            row,
            column: mapping.renamed[col].clone(),
        })?;
        cells.push(text);
    }

    let values = std::array::from_fn(|i| {
        mapping.positions[i]
            .and_then(|pos| cells.get(pos))
            .map(|raw| FieldValue::from_raw(raw, na_values))
            .unwrap_or(FieldValue::Missing)
    });
    Ok(NormalizedRecord::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn default_mapping() -> BTreeMap<String, String> {
        crate::config::CleanerConfig::default().rename_mapping
    }

    fn na() -> Vec<String> {
        crate::config::CleanerConfig::default().na_values
    }

    #[test]
    fn test_resolve_renames_and_backfills() {
        let mapping = ColumnMapping::resolve(
            &headers(&["ID", "Name", "Email", "Department", "Date_of_Birth", "Salary"]),
            &default_mapping(),
        );

        assert_eq!(mapping.position(CanonicalField::Id), Some(0));
        assert_eq!(mapping.position(CanonicalField::LoginId), Some(1));
        assert_eq!(mapping.position(CanonicalField::MailAddress), Some(2));
        assert_eq!(mapping.position(CanonicalField::BirthdayOn), Some(4));
        assert_eq!(mapping.position(CanonicalField::Password), Some(5));
        assert_eq!(
            mapping.missing_fields(),
            vec![CanonicalField::CreatedAt, CanonicalField::Salt, CanonicalField::Gender]
        );
        assert_eq!(mapping.renamed_columns()[3], "Department");
    }

    #[test]
    fn test_canonical_headers_need_no_mapping() {
        let mapping = ColumnMapping::resolve(
            &headers(&[
                "gender",
                "birthday_on",
                "salt",
                "created_at",
                "password",
                "mail_address",
                "login_id",
                "id",
            ]),
            &default_mapping(),
        );
        assert!(mapping.missing_fields().is_empty());
        assert_eq!(mapping.position(CanonicalField::Id), Some(7));
    }

    #[test]
    fn test_normalize_reorders_and_drops_extra_columns() {
        let mapping = ColumnMapping::resolve(
            &headers(&["Email", "extra", "ID", "gender"]),
            &default_mapping(),
        );
        let rows = vec![ByteRecord::from(vec!["a@b.com", "ignored", "7", "1"])];

        let records = normalize_chunk(&rows, &mapping, &na()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.get(CanonicalField::Id), &FieldValue::number(7.0));
        assert_eq!(
            record.get(CanonicalField::MailAddress),
            &FieldValue::Text("a@b.com".to_string())
        );
        assert_eq!(record.get(CanonicalField::Gender), &FieldValue::number(1.0));
        assert!(record.get(CanonicalField::Salt).is_missing());
        assert_eq!(record.values().len(), FIELD_COUNT);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mapping = ColumnMapping::resolve(&headers(&["id", "mail_address", "gender"]), &default_mapping());
        let rows = vec![ByteRecord::from(vec!["1"])];
        let records = normalize_chunk(&rows, &mapping, &na()).unwrap();
        assert!(records[0].get(CanonicalField::MailAddress).is_missing());
        assert!(records[0].get(CanonicalField::Gender).is_missing());
    }

    #[test]
    fn test_wide_rows_fail_the_chunk() {
        let mapping = ColumnMapping::resolve(&headers(&["id"]), &default_mapping());
        let rows = vec![ByteRecord::from(vec!["1"]), ByteRecord::from(vec!["2", "3"])];
        let err = normalize_chunk(&rows, &mapping, &na()).unwrap_err();
        assert!(matches!(err, ChunkError::Malformed { row: 1, .. }));
    }

    #[test]
    fn test_invalid_encoding_fails_the_chunk() {
        let mapping = ColumnMapping::resolve(&headers(&["id", "Name"]), &default_mapping());
        let mut bad = ByteRecord::new();
        bad.push_field(b"1");
        bad.push_field(b"\xffbob");
        let err = normalize_chunk(&[bad], &mapping, &na()).unwrap_err();
        match err {
            ChunkError::InvalidEncoding { row, column } => {
                assert_eq!(row, 0);
                assert_eq!(column, "login_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
