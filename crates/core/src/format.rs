//! Formatting and calendar collaborator used by the caption composers.
//!
//! The engine only talks to the [`Formatter`] trait; [`KoreanFormatter`] is the
//! default implementation matching the dashboard's ko-KR locale.

use chrono::{Datelike, NaiveDate, Weekday};

pub trait Formatter {
    fn format_number(&self, value: f64) -> String;
    fn format_percent(&self, value: f64, digits: usize) -> String;
    fn parse_date(&self, value: &str) -> Option<NaiveDate>;
    fn weekday_of(&self, date: NaiveDate) -> Weekday;

    /// Percentage with the formatter's default precision.
    fn percent(&self, value: f64) -> String {
        self.format_percent(value, self.percent_digits())
    }

    fn percent_digits(&self) -> usize {
        1
    }
}

/// ko-KR number formatting keeps at most three fraction digits.
const NUMBER_FRACTION_DIGITS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KoreanFormatter {
    percent_digits: usize,
}

impl Default for KoreanFormatter {
    fn default() -> Self {
        Self { percent_digits: 1 }
    }
}

impl KoreanFormatter {
    pub fn new(percent_digits: usize) -> Self {
        Self { percent_digits }
    }
}

impl Formatter for KoreanFormatter {
    fn format_number(&self, value: f64) -> String {
        if !value.is_finite() {
            return "0".to_string();
        }
        group_digits(value, NUMBER_FRACTION_DIGITS, true)
    }

    fn format_percent(&self, value: f64, digits: usize) -> String {
        if !value.is_finite() {
            return "0%".to_string();
        }
        format!("{}%", group_digits(value, digits, false))
    }

    fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let day = value.trim().split('T').next()?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    fn weekday_of(&self, date: NaiveDate) -> Weekday {
        date.weekday()
    }

    fn percent_digits(&self) -> usize {
        self.percent_digits
    }
}

/// Maps a Sunday-based index (0=Sunday..6=Saturday) to a weekday.
pub fn weekday_from_sunday_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

fn group_digits(value: f64, fraction_digits: usize, trim_zeros: bool) -> String {
    let fixed = format!("{:.*}", fraction_digits, value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = if trim_zeros { fraction.trim_end_matches('0') } else { fraction };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (position, digit) in integer.chars().enumerate() {
        if position > 0 && (integer.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = integer.chars().chain(fraction.chars()).all(|digit| digit == '0');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}
