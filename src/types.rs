use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Number of canonical fields every normalized record carries
pub const FIELD_COUNT: usize = 8;

/// The fixed, ordered output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    LoginId,
    MailAddress,
    Password,
    CreatedAt,
    Salt,
    BirthdayOn,
    Gender,
}

impl CanonicalField {
    /// All fields in output order
    pub const ALL: [CanonicalField; FIELD_COUNT] = [
        CanonicalField::Id,
        CanonicalField::LoginId,
        CanonicalField::MailAddress,
        CanonicalField::Password,
        CanonicalField::CreatedAt,
        CanonicalField::Salt,
        CanonicalField::BirthdayOn,
        CanonicalField::Gender,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Id => "id",
            CanonicalField::LoginId => "login_id",
            CanonicalField::MailAddress => "mail_address",
            CanonicalField::Password => "password",
            CanonicalField::CreatedAt => "created_at",
            CanonicalField::Salt => "salt",
            CanonicalField::BirthdayOn => "birthday_on",
            CanonicalField::Gender => "gender",
        }
    }

    /// Position of the field in the output schema
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    /// Header row shared by the clean, garbage and duplicate outputs
    pub fn header() -> [&'static str; FIELD_COUNT] {
        Self::ALL.map(|f| f.as_str())
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell after reading.
///
/// `Missing` is the only "absent" state: NA markers and empty cells both map
/// to it when the cell is read, so validators never see a textual "N/A".
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum FieldValue {
    #[default]
    Missing,
    Text(String),
    /// A finite decimal. `text` is the cell as it appeared in the source and
    /// is what gets written back out.
    Number { value: f64, text: String },
    Date(NaiveDateTime),
}

impl FieldValue {
    /// Types a raw cell. Anything that parses as a finite decimal is a
    /// `Number`, so `1`, `1.0` and `+1` all read as one.
    pub fn from_raw(raw: &str, na_values: &[String]) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || na_values.iter().any(|na| na == trimmed) {
            return FieldValue::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => FieldValue::Number {
                value,
                text: trimmed.to_string(),
            },
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    /// A number written in its shortest form
    pub fn number(value: f64) -> Self {
        FieldValue::Number {
            value,
            text: format_number(value),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Textual view used by the string validators. `None` for `Missing`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Missing => None,
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Number { text, .. } => Some(Cow::Borrowed(text.as_str())),
            FieldValue::Date(d) => Some(Cow::Owned(format_date(d))),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Cell text as written to the output files
    pub fn to_output(&self) -> String {
        self.as_text().map(Cow::into_owned).unwrap_or_default()
    }

    /// Stable discriminant used when fingerprinting records
    pub(crate) fn kind_tag(&self) -> u8 {
        match self {
            FieldValue::Missing => 0,
            FieldValue::Text(_) => 1,
            FieldValue::Number { .. } => 2,
            FieldValue::Date(_) => 3,
        }
    }

    /// Text that identifies the value when comparing records. Numbers use
    /// their shortest form so `1` and `1.0` match.
    pub(crate) fn identity_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Number { value, .. } => Cow::Owned(format_number(*value)),
            other => other.as_text().unwrap_or(Cow::Borrowed("")),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_output())
    }
}

/// Integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Dates at midnight print as `YYYY-MM-DD`, anything else with the time.
pub fn format_date(d: &NaiveDateTime) -> String {
    if d.time() == NaiveTime::MIN {
        d.format("%Y-%m-%d").to_string()
    } else if d.nanosecond() == 0 {
        d.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        d.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

/// A record restricted to the canonical schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    values: [FieldValue; FIELD_COUNT],
}

impl NormalizedRecord {
    pub fn new(values: [FieldValue; FIELD_COUNT]) -> Self {
        Self { values }
    }

    /// Builds a record from `(field, value)` pairs; unlisted fields are `Missing`.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (CanonicalField, FieldValue)>,
    {
        let mut record = Self::default();
        for (field, value) in pairs {
            record.set(field, value);
        }
        record
    }

    pub fn get(&self, field: CanonicalField) -> &FieldValue {
        &self.values[field.index()]
    }

    pub(crate) fn set(&mut self, field: CanonicalField, value: FieldValue) {
        self.values[field.index()] = value;
    }

    pub(crate) fn take(&mut self, field: CanonicalField) -> FieldValue {
        std::mem::take(&mut self.values[field.index()])
    }

    pub fn values(&self) -> &[FieldValue; FIELD_COUNT] {
        &self.values
    }

    /// True when every field is `Missing`
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(FieldValue::is_missing)
    }

    pub fn to_output_row(&self) -> [String; FIELD_COUNT] {
        std::array::from_fn(|i| self.values[i].to_output())
    }
}

/// Per-record checks used only to pick a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationFlags {
    pub valid_email: bool,
    pub valid_gender: bool,
    pub valid_birthday: bool,
}

impl ValidationFlags {
    pub fn class(&self) -> RecordClass {
        if self.valid_email && self.valid_gender && self.valid_birthday {
            RecordClass::Clean
        } else {
            RecordClass::Garbage
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordClass {
    Clean,
    Garbage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn na() -> Vec<String> {
        crate::constants::DEFAULT_NA_VALUES
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_header_is_canonical_order() {
        assert_eq!(
            CanonicalField::header(),
            [
                "id",
                "login_id",
                "mail_address",
                "password",
                "created_at",
                "salt",
                "birthday_on",
                "gender"
            ]
        );
        for (i, field) in CanonicalField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(CanonicalField::from_name(field.as_str()), Some(*field));
        }
    }

    #[test]
    fn test_from_raw_types_cells() {
        let na = na();
        assert_eq!(FieldValue::from_raw("", &na), FieldValue::Missing);
        assert_eq!(FieldValue::from_raw("  ", &na), FieldValue::Missing);
        assert_eq!(FieldValue::from_raw("N/A", &na), FieldValue::Missing);
        assert_eq!(FieldValue::from_raw("0", &na), FieldValue::number(0.0));
        assert_eq!(FieldValue::from_raw("1.5", &na), FieldValue::number(1.5));
        assert_eq!(
            FieldValue::from_raw("false", &na),
            FieldValue::Text("false".to_string())
        );
    }

    #[test]
    fn test_any_finite_decimal_is_a_number() {
        let na = na();
        for raw in ["1.0", "+1", " 1 ", "1e0"] {
            assert_eq!(FieldValue::from_raw(raw, &na).as_number(), Some(1.0), "{raw:?}");
        }
        assert_eq!(
            FieldValue::from_raw("inf", &na),
            FieldValue::Text("inf".to_string())
        );
    }

    #[test]
    fn test_numbers_keep_their_source_text() {
        let na = na();
        let id = FieldValue::from_raw("007", &na);
        assert_eq!(id.as_number(), Some(7.0));
        assert_eq!(id.to_output(), "007");
        assert_eq!(FieldValue::from_raw("1.50", &na).to_output(), "1.50");

        // identity ignores spelling
        assert_eq!(FieldValue::from_raw("1.0", &na).identity_text(), "1");
        assert_eq!(FieldValue::from_raw("1", &na).identity_text(), "1");
    }

    #[test]
    fn test_output_formatting() {
        assert_eq!(FieldValue::number(50000.0).to_output(), "50000");
        assert_eq!(FieldValue::Missing.to_output(), "");

        let midnight = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(FieldValue::Date(midnight).to_output(), "2000-01-01");

        let afternoon = NaiveDate::from_ymd_opt(2019, 3, 4)
            .unwrap()
            .and_hms_opt(13, 5, 9)
            .unwrap();
        assert_eq!(FieldValue::Date(afternoon).to_output(), "2019-03-04 13:05:09");
    }

    #[test]
    fn test_record_emptiness_and_class() {
        let empty = NormalizedRecord::default();
        assert!(empty.is_empty());

        let record = NormalizedRecord::from_pairs([(
            CanonicalField::Salt,
            FieldValue::Text("x".to_string()),
        )]);
        assert!(!record.is_empty());
        assert_eq!(record.get(CanonicalField::Salt).to_output(), "x");
        assert_eq!(record.to_output_row()[CanonicalField::Salt.index()], "x");

        let flags = ValidationFlags {
            valid_email: true,
            valid_gender: true,
            valid_birthday: false,
        };
        assert_eq!(flags.class(), RecordClass::Garbage);
        let flags = ValidationFlags {
            valid_birthday: true,
            ..flags
        };
        assert_eq!(flags.class(), RecordClass::Clean);
    }
}
