//! Tolerant scalar parsing.
//!
//! Each function turns source text into a typed value or `None`. Nothing here
//! returns an error: a field that does not parse is simply absent.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Primary accept-date layout, `yyyy-MM-dd HH:mm:ss` with nine fraction digits
pub const ACCEPT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// ISO-8601 local date-time layouts tried after the primary format
const ISO_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a decimal in plain (`12.50`) or scientific (`1.25E+1`) notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Parse an ISO calendar date (`2023-12-31`)
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Parse a timestamp with `primary_format`, falling back to ISO-8601
pub fn parse_timestamp(text: &str, primary_format: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, primary_format)
        .ok()
        .or_else(|| {
            ISO_DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        })
}

/// Apply a parser to an optional source field
pub fn parse_optional<T>(text: Option<&str>, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    text.and_then(parse)
}
