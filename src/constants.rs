//! Defaults shared by the pipeline, the splitter and the CLI.
//! Anything here can be overridden through `CleanerConfig`.

// Chunking
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;
pub const DEFAULT_ROWS_PER_SPLIT_FILE: u64 = 1_000_000;

// Delimiters
pub const SOURCE_DELIMITER: u8 = b';';
pub const OUTPUT_DELIMITER: u8 = b',';

// Character filter applied to login_id and mail_address
pub const DISALLOWED_CHARS_PATTERN: &str = r"[^\w\s@.\-]";

// Validator patterns
pub const EMAIL_PATTERN: &str = r"^[\w.-]+@[\w.-]+\.\w+$";
pub const LOGIN_ID_PATTERN: &str = r"^[\w-]+$";

pub const MIN_PASSWORD_LEN: usize = 8;

// Gender literals normalized to 0/1
pub const GENDER_FALSE_LITERAL: &str = "false";
pub const GENDER_TRUE_LITERAL: &str = "true";

// Environment overrides
pub const ENV_CHUNK_SIZE: &str = "RECORD_CLEANER_CHUNK_SIZE";
pub const ENV_INVALID_EMAIL: &str = "RECORD_CLEANER_INVALID_EMAIL";
pub const ENV_METRICS_ADDR: &str = "RECORD_CLEANER_METRICS_ADDR";
pub const ENV_LOG_DIR: &str = "RECORD_CLEANER_LOG_DIR";

/// Source column name -> canonical field name
pub const DEFAULT_RENAME_MAPPING: &[(&str, &str)] = &[
    ("ID", "id"),
    ("Name", "login_id"),
    ("Email", "mail_address"),
    ("Date_of_Birth", "birthday_on"),
    ("Salary", "password"),
];

/// Cell values read as `FieldValue::Missing`
pub const DEFAULT_NA_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None"];

/// chrono formats tried, in order, when parsing dates
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y",
    "%d.%m.%Y",
];
