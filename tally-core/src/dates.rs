//! Tolerant date parsing for free-text ledger dates.
//!
//! Ledger exports are inconsistent: ISO dates, `dd/mm/yyyy hh:mm:ss`,
//! `Jan 5, 2024`, RFC 3339 timestamps. `DateParser` accepts all of these and
//! returns `None` for anything it cannot read; callers treat `None` as a row
//! to drop, never as an error.

use std::sync::LazyLock;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// "5th", "21st" -> "5", "21"
static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

// a/b/yyyy with optional time; separators may be / - or .
static NUMERIC_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<a>\d{1,2})[/.\-](?P<b>\d{1,2})[/.\-](?P<y>\d{4}|\d{2})",
        r"(?:[ T](?P<h>\d{1,2}):(?P<mi>\d{2})(?::(?P<s>\d{2}))?(?:\s*(?P<ampm>[AaPp][Mm]))?)?$"
    ))
    .unwrap()
});

static TRAILING_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d{1,2}:\d{2}(?::\d{2})?(?:\s*[AaPp][Mm])?$").unwrap());

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M%z",
];

const ISO_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
];

const ISO_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const MONTH_NAME_FORMATS: [&str; 10] = [
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d %b, %Y",
    "%d %B, %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
];

/// Parses free-text dates into calendar dates
#[derive(Debug, Clone, Copy, Default)]
pub struct DateParser {
    day_first: bool,
    timezone: Option<Tz>,
}

impl DateParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read ambiguous `a/b/yyyy` as day/month instead of month/day.
    pub fn day_first(mut self, day_first: bool) -> Self {
        self.day_first = day_first;
        self
    }

    /// Convert offset-carrying timestamps into `tz` before taking the date.
    /// Without a zone the timestamp's own wall-clock date is used.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz);
        self
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
        if collapsed.is_empty() {
            return None;
        }
        let text = ORDINAL.replace_all(&collapsed, "$1");
        let text = text.as_ref();

        if let Some(dt) = parse_with_offset(text) {
            return Some(match self.timezone {
                Some(tz) => dt.with_timezone(&tz).date_naive(),
                None => dt.date_naive(),
            });
        }

        // Before the ISO formats: %Y would happily read "1-5-24" as year 1
        if let Some(caps) = NUMERIC_DMY.captures(text) {
            return self.parse_numeric(&caps);
        }

        for fmt in ISO_DATETIME_FORMATS {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Some(ndt.date());
            }
        }
        for fmt in ISO_DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
                return Some(d);
            }
        }

        let date_part = TRAILING_TIME.replace(text, "");
        MONTH_NAME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&date_part, fmt).ok())
    }

    fn parse_numeric(&self, caps: &regex::Captures<'_>) -> Option<NaiveDate> {
        let a: u32 = caps["a"].parse().ok()?;
        let b: u32 = caps["b"].parse().ok()?;
        let year = expand_year(&caps["y"])?;

        if let Some(h) = caps.name("h") {
            let hour: u32 = h.as_str().parse().ok()?;
            let minute: u32 = caps["mi"].parse().ok()?;
            let second: u32 = match caps.name("s") {
                Some(s) => s.as_str().parse().ok()?,
                None => 0,
            };
            let hour_ok = match caps.name("ampm") {
                Some(_) => (1..=12).contains(&hour),
                None => hour <= 23,
            };
            if !hour_ok || minute > 59 || second > 59 {
                return None;
            }
        }

        // Fall back to the other reading when the preferred one cannot be a month
        let (month, day) = if self.day_first {
            if b > 12 && a <= 12 { (a, b) } else { (b, a) }
        } else if a > 12 && b <= 12 {
            (b, a)
        } else {
            (a, b)
        };

        NaiveDate::from_ymd_opt(year, month, day)
    }
}

fn parse_with_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
}

// Two-digit years follow the strftime %y pivot: 00-68 -> 20xx, 69-99 -> 19xx
fn expand_year(y: &str) -> Option<i32> {
    let value: i32 = y.parse().ok()?;
    Some(match y.len() {
        2 if value < 69 => 2000 + value,
        2 => 1900 + value,
        _ => value,
    })
}

/// Parse an IANA zone name like "Asia/Kolkata".
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_iso_forms() {
        let p = DateParser::new();
        assert_eq!(p.parse("2024-01-05"), ymd(2024, 1, 5));
        assert_eq!(p.parse("2024-01-05 10:30"), ymd(2024, 1, 5));
        assert_eq!(p.parse("2024-01-05T10:30:00"), ymd(2024, 1, 5));
        assert_eq!(p.parse("2024-01-05 10:30:00.250"), ymd(2024, 1, 5));
        assert_eq!(p.parse("2024/01/05"), ymd(2024, 1, 5));
        assert_eq!(p.parse("2024-01-05 10:30 PM"), ymd(2024, 1, 5));
        assert_eq!(p.parse("2024-01-05 07:15:09 am"), ymd(2024, 1, 5));
    }

    #[test]
    fn test_numeric_month_first_with_day_first_fallback() {
        let p = DateParser::new();
        assert_eq!(p.parse("01/05/2024"), ymd(2024, 1, 5));
        // 20 cannot be a month, so the row reads day-first
        assert_eq!(p.parse("20/09/2018 12:04:08"), ymd(2018, 9, 20));
        assert_eq!(p.parse("1-5-24"), ymd(2024, 1, 5));
        assert_eq!(p.parse("1/5/2024 10:30 AM"), ymd(2024, 1, 5));
        assert_eq!(p.parse("20/09/2018 11:04:08PM"), ymd(2018, 9, 20));
        // 12-hour clocks have no hour 0 or 13
        assert_eq!(p.parse("1/5/2024 13:30 PM"), None);
        assert_eq!(p.parse("1/5/2024 0:30 AM"), None);
    }

    #[test]
    fn test_numeric_day_first() {
        let p = DateParser::new().day_first(true);
        assert_eq!(p.parse("01/05/2024"), ymd(2024, 5, 1));
        assert_eq!(p.parse("09/20/2018"), ymd(2018, 9, 20));
        assert_eq!(p.parse("5.1.2024"), ymd(2024, 1, 5));
    }

    #[test]
    fn test_month_names_and_ordinals() {
        let p = DateParser::new();
        assert_eq!(p.parse("Jan 5, 2024"), ymd(2024, 1, 5));
        assert_eq!(p.parse("5 January 2024"), ymd(2024, 1, 5));
        assert_eq!(p.parse("05-Jan-2024"), ymd(2024, 1, 5));
        assert_eq!(p.parse("5th Jan 2024"), ymd(2024, 1, 5));
        assert_eq!(p.parse("Jan 5, 2024 18:45"), ymd(2024, 1, 5));
        assert_eq!(p.parse("  Jan   5,  2024 "), ymd(2024, 1, 5));
    }

    #[test]
    fn test_offset_timestamps() {
        let p = DateParser::new();
        // Own wall clock: still Jan 5 at +05:30
        assert_eq!(p.parse("2024-01-05T01:00:00+05:30"), ymd(2024, 1, 5));

        let utc: Tz = parse_timezone("UTC").unwrap();
        let p = DateParser::new().with_timezone(utc);
        assert_eq!(p.parse("2024-01-05T01:00:00+05:30"), ymd(2024, 1, 4));
    }

    #[test]
    fn test_unparseable() {
        let p = DateParser::new();
        assert_eq!(p.parse("not-a-date"), None);
        assert_eq!(p.parse(""), None);
        assert_eq!(p.parse("   "), None);
        assert_eq!(p.parse("13/13/2024"), None);
        assert_eq!(p.parse("2024-02-30"), None);
        assert_eq!(p.parse("01/05/2024 25:00"), None);
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("Asia/Kolkata").is_ok());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
