//! Date helper functions

use chrono::{DateTime, NaiveDate, ParseError, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// A timestamp formatted for display and for machines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDate {
    /// Short human form, e.g. "Jan 15, 2024"
    pub display: String,
    /// ISO 8601 in UTC, e.g. "2024-01-15T10:30:00.000Z"
    pub iso: String,
}

/// Parse a CMS timestamp (RFC 3339, or a bare `YYYY-MM-DD` date)
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, ParseError> {
    match DateTime::parse_from_rfc3339(input) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc_err) => match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            Ok(date) => Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()),
            Err(_) => Err(rfc_err),
        },
    }
}

/// Format a CMS timestamp in the site's time zone.
///
/// Invalid input is returned as the parser's error.
pub fn format_post_date(input: &str, tz: &Tz) -> Result<PostDate, ParseError> {
    let utc = parse_timestamp(input)?;
    Ok(PostDate {
        display: short_date(&utc.with_timezone(tz)),
        iso: utc.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Format date in short English form (like "Jan 5, 2024")
pub fn short_date<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%b %-d, %Y").to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Generate a <time> HTML element
pub fn time_tag(date: &PostDate) -> String {
    format!(r#"<time datetime="{}">{}</time>"#, date.iso, date.display)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_post_date() {
        let date = format_post_date("2024-01-15T10:30:00.000Z", &Tz::UTC).unwrap();
        assert_eq!(date.display, "Jan 15, 2024");
        assert_eq!(date.iso, "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_display_uses_site_timezone() {
        let date = format_post_date("2024-01-01T03:00:00Z", &chrono_tz::America::New_York).unwrap();
        assert_eq!(date.display, "Dec 31, 2023");
        assert_eq!(date.iso, "2024-01-01T03:00:00.000Z");
    }

    #[test]
    fn test_bare_date() {
        let date = format_post_date("2023-07-04", &Tz::UTC).unwrap();
        assert_eq!(date.display, "Jul 4, 2023");
        assert_eq!(date.iso, "2023-07-04T00:00:00.000Z");
    }

    #[test]
    fn test_invalid_input_propagates() {
        assert!(format_post_date("", &Tz::UTC).is_err());
        assert!(format_post_date("not a date", &Tz::UTC).is_err());
    }

    #[test]
    fn test_date_xml_and_time_tag() {
        let utc = parse_timestamp("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(date_xml(&utc), "2024-01-15T08:30:00.000+00:00");

        let date = format_post_date("2024-01-15T10:30:00.000Z", &Tz::UTC).unwrap();
        assert_eq!(
            time_tag(&date),
            r#"<time datetime="2024-01-15T10:30:00.000Z">Jan 15, 2024</time>"#
        );
    }
}
