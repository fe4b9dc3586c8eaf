//! ISO-8601 date text with millisecond precision and an explicit offset.

use chrono::DateTime;
use courier_types::Date;

/// `yyyy-MM-ddTHH:mm:ss.SSSZ`, e.g. `2011-03-04T05:06:07.089+0100`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[must_use]
pub fn format_date(date: &Date) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses [`DATE_FORMAT`], also accepting RFC 3339 text such as
/// `2011-03-04T05:06:07Z`.
pub fn parse_date(text: &str) -> Result<Date, chrono::ParseError> {
    DateTime::parse_from_str(text, DATE_FORMAT)
        .or_else(|err| DateTime::parse_from_rfc3339(text).map_err(|_| err))
}
