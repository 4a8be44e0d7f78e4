use chrono::{DateTime, Local, NaiveDate};

pub const ISO_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%m/%d/%Y";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, ISO_FORMAT)
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

pub fn parse_stored_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, ISO_FORMAT) {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.date_naive());
    }
    trimmed
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, ISO_FORMAT).ok())
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn format_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2026-02-03").unwrap();
        assert_eq!(date.year(), 2026);
        assert_eq!(date.month(), 2);
        assert_eq!(date.day(), 3);
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("02-03-2026").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn parse_stored_date_accepts_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();
        assert_eq!(parse_stored_date("2025-11-04"), Some(expected));
        assert_eq!(parse_stored_date("2025-11-04T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_stored_date("2025-11-04T09:15:00+00:00"), Some(expected));
        assert_eq!(parse_stored_date("tomorrow"), None);
        assert_eq!(parse_stored_date(""), None);
    }

    #[test]
    fn formats() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        assert_eq!(format_iso(date), "2026-01-09");
        assert_eq!(format_display(date), "01/09/2026");
    }
}
