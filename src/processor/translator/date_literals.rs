//! Translation-time classification of `#...#` date literals.
//!
//! A literal that means the same date under every culture is checked here.
//! One whose meaning depends on the culture (`#1/2/2020#`) cannot be
//! checked until run time, so it is reported as `CultureDependent` and the
//! translator emits a runtime validation call for it instead.

use crate::config::{CultureContext, DateOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLiteralClassification {
    Valid,
    Invalid,
    CultureDependent,
}

const MONTH_NAMES: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

pub struct DateLiteralValidator<'a> {
    culture: &'a CultureContext,
}

impl<'a> DateLiteralValidator<'a> {
    pub fn new(culture: &'a CultureContext) -> Self {
        Self { culture }
    }

    pub fn classify(&self, literal: &str) -> DateLiteralClassification {
        let text = literal.trim();
        if text.is_empty() {
            return DateLiteralClassification::Invalid;
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let time_at = words.iter().position(|w| w.contains(':'));
        let (date_words, time_words) = match time_at {
            Some(idx) => (&words[..idx], &words[idx..]),
            None => (&words[..], &words[..0]),
        };

        if !time_words.is_empty() && !is_valid_time(&time_words.join(" ")) {
            return DateLiteralClassification::Invalid;
        }
        if date_words.is_empty() {
            return DateLiteralClassification::Valid;
        }
        self.classify_date(&date_words.join(" "))
    }

    fn classify_date(&self, text: &str) -> DateLiteralClassification {
        let parts: Vec<&str> = text
            .split(|c: char| matches!(c, '/' | '-' | '.' | ',' | ' '))
            .filter(|p| !p.is_empty())
            .collect();

        if parts.iter().any(|p| p.chars().any(|c| c.is_ascii_alphabetic())) {
            return self.classify_named_month(&parts);
        }
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.parse::<u32>().is_err()) {
            return DateLiteralClassification::Invalid;
        }

        let numbers: Vec<u32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
        let four_digit_first = parts[0].len() == 4;
        let mut readings: Vec<(u32, u32, u32)> = Vec::new();
        let mut consider = |year: Option<u32>, month: u32, day: u32| {
            let year = year.map_or(2000, expand_year);
            if is_valid_date(year, month, day) && !readings.contains(&(year, month, day)) {
                readings.push((year, month, day));
            }
        };

        match numbers[..] {
            [y, m, d] if four_digit_first => consider(Some(y), m, d),
            [a, b, y] => {
                consider(Some(y), a, b);
                consider(Some(y), b, a);
                if self.culture.date_order == DateOrder::YearMonthDay {
                    consider(Some(a), b, y);
                }
            }
            [a, b] => {
                consider(None, a, b);
                consider(None, b, a);
            }
            _ => {}
        }

        match readings.len() {
            0 => DateLiteralClassification::Invalid,
            1 => DateLiteralClassification::Valid,
            _ => DateLiteralClassification::CultureDependent,
        }
    }

    /// `1 Jan 2020`, `January 1, 2020`. Month names are English; under any
    /// other culture they can only be checked at run time.
    fn classify_named_month(&self, parts: &[&str]) -> DateLiteralClassification {
        let mut month = None;
        let mut numbers = Vec::new();
        for part in parts {
            if let Ok(n) = part.parse::<u32>() {
                numbers.push(n);
                continue;
            }
            let lower = part.to_ascii_lowercase();
            let found = MONTH_NAMES
                .iter()
                .position(|name| lower.len() >= 3 && name.starts_with(&lower));
            match (found, month) {
                (Some(idx), None) => month = Some(idx as u32 + 1),
                _ => return DateLiteralClassification::Invalid,
            }
        }
        let Some(month) = month else {
            return DateLiteralClassification::Invalid;
        };

        let (day, year) = match numbers[..] {
            [day] => (day, 2000),
            [a, b] if a > 31 => (b, expand_year(a)),
            [day, year] => (day, expand_year(year)),
            _ => return DateLiteralClassification::Invalid,
        };
        if !is_valid_date(year, month, day) {
            return DateLiteralClassification::Invalid;
        }
        if self.culture.name.to_ascii_lowercase().starts_with("en") {
            DateLiteralClassification::Valid
        } else {
            DateLiteralClassification::CultureDependent
        }
    }
}

fn expand_year(year: u32) -> u32 {
    match year {
        0..=29 => 2000 + year,
        30..=99 => 1900 + year,
        _ => year,
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn is_valid_date(year: u32, month: u32, day: u32) -> bool {
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return false,
    };
    (100..=9999).contains(&year) && (1..=days_in_month).contains(&day)
}

/// `h:mm`, `h:mm:ss`, optionally followed by AM/PM.
fn is_valid_time(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    let (clock, twelve_hour) = match lower
        .strip_suffix("am")
        .or_else(|| lower.strip_suffix("pm"))
    {
        Some(clock) => (clock.trim(), true),
        None => (lower.trim(), false),
    };

    let fields: Vec<Option<u32>> = clock.split(':').map(|f| f.parse().ok()).collect();
    let max_hour = if twelve_hour { 12 } else { 23 };
    match fields[..] {
        [Some(h), Some(m)] => h <= max_hour && m <= 59,
        [Some(h), Some(m), Some(s)] => h <= max_hour && m <= 59 && s <= 59,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let culture = CultureContext::default();
        let validator = DateLiteralValidator::new(&culture);
        let test_cases = vec![
            ("2020-01-31", DateLiteralClassification::Valid),
            ("1/2/2020", DateLiteralClassification::CultureDependent),
            ("13/1/2020", DateLiteralClassification::Valid),
            ("1/1/2020", DateLiteralClassification::Valid),
            ("2/30/2020", DateLiteralClassification::Invalid),
            ("10:30", DateLiteralClassification::Valid),
            ("10:30:15 PM", DateLiteralClassification::Valid),
            ("25:00", DateLiteralClassification::Invalid),
            ("1 Jan 2020", DateLiteralClassification::Valid),
            ("January 31, 2020", DateLiteralClassification::Valid),
            ("31 Feb 2020", DateLiteralClassification::Invalid),
            ("1/2/2020 10:30 PM", DateLiteralClassification::CultureDependent),
            ("2020-01-31 25:00", DateLiteralClassification::Invalid),
            ("hello", DateLiteralClassification::Invalid),
            ("", DateLiteralClassification::Invalid),
        ];
        for (literal, expected) in test_cases {
            assert_eq!(validator.classify(literal), expected, "{literal:?}");
        }
    }

    #[test]
    fn test_month_names_depend_on_culture() {
        let culture = CultureContext {
            name: "fr-FR".to_string(),
            date_order: DateOrder::DayMonthYear,
        };
        let validator = DateLiteralValidator::new(&culture);
        assert_eq!(
            validator.classify("1 Jan 2020"),
            DateLiteralClassification::CultureDependent
        );
        assert_eq!(validator.classify("2020-01-31"), DateLiteralClassification::Valid);
    }
}
