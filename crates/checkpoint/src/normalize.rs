//! Name normalization and date-of-birth comparison.
//!
//! Personal names arrive with transliteration noise: repeated letters,
//! case variance, stray spacing. Comparison always happens on the
//! normalized form; stored data is never rewritten.

use chrono::NaiveDate;

/// Date formats accepted for dates of birth. Historic free-text entry means
/// both the local `DD.MM.YYYY` convention and ISO dates occur in the data.
const DOB_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"];

/// Canonicalize a personal-name string for fuzzy comparison.
///
/// Uppercases with a culture-invariant case fold, then collapses any run of
/// two or more identical consecutive letters into a single occurrence
/// ("ИВАНОВВА" becomes "ИВАНОВА"). Punctuation and spacing are untouched.
/// Empty or whitespace-only input normalizes to the empty string.
///
/// The function is pure and idempotent.
#[must_use]
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(raw.len());
    let mut prev: Option<char> = None;
    for c in raw.to_uppercase().chars() {
        if c.is_alphabetic() && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Parse a date-of-birth string in any accepted format.
#[must_use]
pub fn parse_dob(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DOB_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Compare two date-of-birth strings.
///
/// When both sides parse as calendar dates the parsed dates are compared,
/// so `"01.02.2000"` equals `"2000-02-01"`. If either side fails to parse,
/// the comparison falls back to exact string equality (format drift from
/// historic entry is expected; unparseable values still compare by text).
#[must_use]
pub fn dates_match(a: &str, b: &str) -> bool {
    match (parse_dob(a), parse_dob(b)) {
        (Some(da), Some(db)) => da == db,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_repeated_letters() {
        assert_eq!(normalize("ИВАНОВВА"), "ИВАНОВА");
        assert_eq!(normalize("Пеетроов"), "ПЕТРОВ");
        assert_eq!(normalize("AABBCC"), "ABC");
    }

    #[test]
    fn test_normalize_uppercases() {
        assert_eq!(normalize("иванов"), "ИВАНОВ");
        assert_eq!(normalize("Smith"), "SMITH");
    }

    #[test]
    fn test_normalize_empty_and_whitespace() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  "), "");
        assert_eq!(normalize("\t\n"), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for name in ["ИВАНОВВА", "петров", "  ", "O'Brien", "Анна-Мария"] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn test_normalize_keeps_punctuation_and_spacing() {
        assert_eq!(normalize("АННА-МАРИЯ"), "АНА-МАРИЯ");
        assert_eq!(normalize("ДЕ ЛА КРУС"), "ДЕ ЛА КРУС");
        // Non-letter runs are not collapsed
        assert_eq!(normalize("А--Б"), "А--Б");
    }

    #[test]
    fn test_normalize_single_letters_untouched() {
        assert_eq!(normalize("ИВАНОВ"), "ИВАНОВ");
    }

    #[test]
    fn test_parse_dob_formats() {
        let expected = NaiveDate::from_ymd_opt(2000, 2, 1).unwrap();
        assert_eq!(parse_dob("01.02.2000"), Some(expected));
        assert_eq!(parse_dob("2000-02-01"), Some(expected));
        assert_eq!(parse_dob("01/02/2000"), Some(expected));
        assert_eq!(parse_dob("не указано"), None);
    }

    #[test]
    fn test_dates_match_cross_format() {
        assert!(dates_match("01.02.2000", "2000-02-01"));
        assert!(!dates_match("01.02.2000", "02.02.2000"));
    }

    #[test]
    fn test_dates_match_fallback_to_string() {
        // One side unparseable: exact string comparison
        assert!(!dates_match("не указано", "01.02.2000"));
        assert!(dates_match("не указано", "не указано"));
    }
}
