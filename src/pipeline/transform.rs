//! Row cleaning and classification.
//!
//! Takes normalized rows through the email filter, the character filter,
//! date parsing and gender normalization, then tags each survivor as clean
//! or garbage.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use tracing::trace;

use crate::config::{CleanerConfig, InvalidEmailPolicy};
use crate::constants::{GENDER_FALSE_LITERAL, GENDER_TRUE_LITERAL};
use crate::error::{FieldError, Result};
use crate::types::{CanonicalField, FieldValue, NormalizedRecord, RecordClass, ValidationFlags};
use crate::validators::{is_valid_date, is_valid_email, is_valid_gender};

/// Fields parsed as dates
const DATE_FIELDS: [CanonicalField; 2] = [CanonicalField::BirthdayOn, CanonicalField::CreatedAt];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmailCheck {
    Valid,
    Missing,
    Invalid,
}

/// What happened to one normalized row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Every field was missing
    Empty,
    DroppedMissingEmail,
    DroppedInvalidEmail,
    Classified(RecordClass, NormalizedRecord),
}

/// Per-chunk partition plus the counts of rows that went nowhere.
#[derive(Debug, Default)]
pub struct ChunkOutcome {
    pub clean: Vec<NormalizedRecord>,
    pub garbage: Vec<NormalizedRecord>,
    pub empty_rows: usize,
    pub dropped_missing_email: usize,
    pub dropped_invalid_email: usize,
}

pub struct RecordCleaner {
    disallowed_chars: Regex,
    columns_to_clean: Vec<CanonicalField>,
    date_formats: Vec<String>,
    invalid_email_policy: InvalidEmailPolicy,
}

impl RecordCleaner {
    pub fn from_config(config: &CleanerConfig) -> Result<Self> {
        Ok(Self {
            disallowed_chars: Regex::new(&config.disallowed_chars_pattern)?,
            columns_to_clean: config.columns_to_clean.clone(),
            date_formats: config.date_formats.clone(),
            invalid_email_policy: config.invalid_email_policy,
        })
    }

    /// Cleans every row of a chunk, preserving row order within each partition.
    pub fn process_chunk(&self, records: Vec<NormalizedRecord>, now: NaiveDateTime) -> ChunkOutcome {
        let mut outcome = ChunkOutcome::default();
        for record in records {
            match self.clean_record(record, now) {
                RowOutcome::Empty => outcome.empty_rows += 1,
                RowOutcome::DroppedMissingEmail => outcome.dropped_missing_email += 1,
                RowOutcome::DroppedInvalidEmail => outcome.dropped_invalid_email += 1,
                RowOutcome::Classified(RecordClass::Clean, record) => outcome.clean.push(record),
                RowOutcome::Classified(RecordClass::Garbage, record) => outcome.garbage.push(record),
            }
        }
        outcome
    }

    pub fn clean_record(&self, mut record: NormalizedRecord, now: NaiveDateTime) -> RowOutcome {
        if record.is_empty() {
            return RowOutcome::Empty;
        }

        let email = record.get(CanonicalField::MailAddress);
        let email_check = if email.is_missing() {
            EmailCheck::Missing
        } else if is_valid_email(email) {
            EmailCheck::Valid
        } else {
            EmailCheck::Invalid
        };

        if self.invalid_email_policy == InvalidEmailPolicy::Drop {
            match email_check {
                EmailCheck::Missing => return RowOutcome::DroppedMissingEmail,
                EmailCheck::Invalid => return RowOutcome::DroppedInvalidEmail,
                EmailCheck::Valid => {}
            }
        }

        for &field in &self.columns_to_clean {
            let value = record.take(field);
            let cleaned = strip_disallowed(&value, &self.disallowed_chars).unwrap_or_else(|e| {
                trace!(field = %field, "Character filter failed, clearing field: {}", e);
                FieldValue::Missing
            });
            record.set(field, cleaned);
        }

        for field in DATE_FIELDS {
            let parsed = parse_date(record.get(field), &self.date_formats);
            record.set(field, parsed);
        }

        let gender = normalize_gender(record.take(CanonicalField::Gender));
        record.set(CanonicalField::Gender, gender);

        let flags = ValidationFlags {
            valid_email: email_check == EmailCheck::Valid,
            valid_gender: is_valid_gender(record.get(CanonicalField::Gender)),
            valid_birthday: is_valid_date(record.get(CanonicalField::BirthdayOn), now),
        };
        RowOutcome::Classified(flags.class(), record)
    }
}

/// Removes every match of `pattern`. Numbers are filtered through their
/// source text. Dates cannot be filtered, so a cleaned column that already
/// holds a typed date fails here and is cleared by the caller.
pub fn strip_disallowed(value: &FieldValue, pattern: &Regex) -> std::result::Result<FieldValue, FieldError> {
    match value {
        FieldValue::Missing => Ok(FieldValue::Missing),
        FieldValue::Date(_) => Err(FieldError::NotText),
        FieldValue::Text(_) | FieldValue::Number { .. } => {
            let text = value.as_text().ok_or(FieldError::NotText)?;
            Ok(FieldValue::Text(pattern.replace_all(&text, "").into_owned()))
        }
    }
}

/// Parses a date, returning `Missing` for anything unparseable.
pub fn parse_date(value: &FieldValue, formats: &[String]) -> FieldValue {
    match value {
        FieldValue::Date(d) => FieldValue::Date(*d),
        FieldValue::Missing => FieldValue::Missing,
        FieldValue::Text(_) | FieldValue::Number { .. } => value
            .as_text()
            .and_then(|text| parse_datetime(text.trim(), formats))
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Missing),
    }
}

fn parse_datetime(text: &str, formats: &[String]) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    formats.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(text, fmt)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, fmt)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    })
}

/// `"false"` -> 0 and `"true"` -> 1; everything else passes through.
pub fn normalize_gender(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Text(ref s) if s == GENDER_FALSE_LITERAL => FieldValue::number(0.0),
        FieldValue::Text(ref s) if s == GENDER_TRUE_LITERAL => FieldValue::number(1.0),
        other => other,
    }
}
