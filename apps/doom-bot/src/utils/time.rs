use crate::error::Error;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Render a record time in seconds as `HH:MM:SS.ss`, dropping leading
/// zero components: `5.50`, `1:01.50`, `12:00.00`, `01:01:01.50`.
pub fn pretty_record(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let micros = (seconds.abs() * 1_000_000.0).round() as u64;

    let hundredths = (micros % 1_000_000) / 10_000;
    let total_secs = micros / 1_000_000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    let body = if hours == 0 && mins == 0 {
        format!("{secs}.{hundredths:02}")
    } else if hours == 0 {
        format!("{mins}:{secs:02}.{hundredths:02}")
    } else {
        format!("{hours:02}:{mins:02}:{secs:02}.{hundredths:02}")
    };
    format!("{sign}{body}")
}

/// Parse `SS.ss`, `MM:SS.ss` or `HH:MM:SS.ss` into seconds.
///
/// A leading `-` negates every component.
pub fn time_convert(input: &str) -> Result<f64, Error> {
    let input = input.trim();
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, input),
    };

    let parts: Vec<&str> = body.split(':').map(str::trim).collect();
    let float = |s: &str| s.parse::<f64>().map_err(|_| Error::IncorrectRecordFormat);
    let int = |s: &str| {
        s.parse::<u32>()
            .map(f64::from)
            .map_err(|_| Error::IncorrectRecordFormat)
    };

    let seconds = match parts.as_slice() {
        [s] => float(s)?,
        [m, s] => int(m)? * 60.0 + float(s)?,
        [h, m, s] => int(h)? * 3600.0 + int(m)? * 60.0 + float(s)?,
        _ => return Err(Error::IncorrectRecordFormat),
    };

    if !seconds.is_finite() {
        return Err(Error::IncorrectRecordFormat);
    }
    Ok(negative * seconds)
}

/// Parse a relative duration such as `3 days`, `in 2 hours` or `90 minutes`.
pub fn parse_duration(input: &str) -> Result<Duration, Error> {
    let input = input.trim().to_lowercase();
    let input = input.strip_prefix("in ").unwrap_or(&input).trim();

    let (amount, unit) = input
        .split_once(char::is_whitespace)
        .ok_or(Error::InvalidDate)?;
    let amount: i64 = amount.trim().parse().map_err(|_| Error::InvalidDate)?;
    if amount < 0 {
        return Err(Error::InvalidDate);
    }

    match unit.trim().trim_end_matches('s') {
        "minute" | "min" | "m" => Ok(Duration::minutes(amount)),
        "hour" | "hr" | "h" => Ok(Duration::hours(amount)),
        "day" | "d" => Ok(Duration::days(amount)),
        "week" | "w" => Ok(Duration::weeks(amount)),
        _ => Err(Error::InvalidDate),
    }
}

/// Parse an absolute UTC date (`YYYY-MM-DD HH:MM` or `YYYY-MM-DD`) or a
/// duration relative to `now`.
pub fn parse_when(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
    let trimmed = input.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return Ok(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0).ok_or(Error::InvalidDate)?;
        return Ok(Utc.from_utc_datetime(&dt));
    }

    Ok(now + parse_duration(trimmed)?)
}

/// Discord timestamp markup, rendered in each viewer's timezone.
pub fn discord_timestamp(dt: DateTime<Utc>, style: char) -> String {
    format!("<t:{}:{style}>", dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_record_trims_leading_zero_components() {
        assert_eq!(pretty_record(0.0), "0.00");
        assert_eq!(pretty_record(5.5), "5.50");
        assert_eq!(pretty_record(59.99), "59.99");
        assert_eq!(pretty_record(61.5), "1:01.50");
        assert_eq!(pretty_record(720.0), "12:00.00");
        assert_eq!(pretty_record(3661.5), "01:01:01.50");
    }

    #[test]
    fn pretty_record_negative() {
        assert_eq!(pretty_record(-90.0), "-1:30.00");
        assert_eq!(pretty_record(-2.25), "-2.25");
    }

    #[test]
    fn pretty_record_keeps_counting_hours() {
        assert_eq!(pretty_record(90_000.0), "25:00:00.00");
    }

    #[test]
    fn time_convert_formats() {
        assert_eq!(time_convert("5.5").unwrap(), 5.5);
        assert_eq!(time_convert("1:01.50").unwrap(), 61.5);
        assert_eq!(time_convert("01:01:01.50").unwrap(), 3661.5);
        assert_eq!(time_convert("-1:30").unwrap(), -90.0);
    }

    #[test]
    fn time_convert_rejects_bad_input() {
        assert!(matches!(time_convert("1:2:3:4"), Err(Error::IncorrectRecordFormat)));
        assert!(matches!(time_convert("abc"), Err(Error::IncorrectRecordFormat)));
        assert!(matches!(time_convert("1.5:20"), Err(Error::IncorrectRecordFormat)));
        assert!(matches!(time_convert(""), Err(Error::IncorrectRecordFormat)));
    }

    #[test]
    fn time_convert_inverts_pretty_record() {
        for value in [0.0, 4.2, 59.99, 61.5, 754.31, 3661.5, 7322.07] {
            let back = time_convert(&pretty_record(value)).unwrap();
            assert!((back - value).abs() < 1e-9, "{value} -> {back}");
        }
    }

    #[test]
    fn parses_relative_durations() {
        assert_eq!(parse_duration("3 days").unwrap(), Duration::days(3));
        assert_eq!(parse_duration("in 2 hours").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("1 week").unwrap(), Duration::weeks(1));
        assert_eq!(parse_duration("45 minutes").unwrap(), Duration::minutes(45));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("3 fortnights").is_err());
    }

    #[test]
    fn parses_absolute_and_relative_dates() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            parse_when("2026-02-03 18:30", now).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 3, 18, 30, 0).unwrap()
        );
        assert_eq!(
            parse_when("2026-02-03", now).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(parse_when("in 1 day", now).unwrap(), now + Duration::days(1));
        assert!(matches!(parse_when("tomorrow-ish", now), Err(Error::InvalidDate)));
    }
}
