//! Field validators.
//!
//! Pure functions over single values. Only the email, gender and date checks
//! are wired into the cleaning pipeline; the login id and password checks are
//! exposed for callers and the `check` command.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{EMAIL_PATTERN, LOGIN_ID_PATTERN, MIN_PASSWORD_LEN};
use crate::types::FieldValue;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("valid email regex"));
static LOGIN_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(LOGIN_ID_PATTERN).expect("valid login id regex"));

/// False for a missing value, otherwise a format match.
pub fn is_valid_email(value: &FieldValue) -> bool {
    match value.as_text() {
        Some(text) => EMAIL_RE.is_match(&text),
        None => false,
    }
}

/// Word characters and dashes only.
pub fn is_valid_login_id(login_id: &str) -> bool {
    LOGIN_ID_RE.is_match(login_id)
}

/// At least 8 characters with one letter and one digit.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// A present date strictly before `now`.
pub fn is_valid_date(value: &FieldValue, now: NaiveDateTime) -> bool {
    value.as_date().is_some_and(|date| date < now)
}

/// Same as [`is_valid_date`] against the local wall clock.
pub fn is_valid_date_now(value: &FieldValue) -> bool {
    is_valid_date(value, chrono::Local::now().naive_local())
}

/// 0 (female) or 1 (male).
pub fn is_valid_gender(value: &FieldValue) -> bool {
    value.as_number().is_some_and(|n| n == 0.0 || n == 1.0)
}
