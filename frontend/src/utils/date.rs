use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};

const DISPLAY_FORMAT: &str = "%d/%m/%Y";
const INPUT_FORMAT: &str = "%Y-%m-%d";

/// Parses a `dd/mm/yyyy` date, falling back to `yyyy-mm-dd` and ISO-8601
/// date-times (normalized to UTC). Calendar-invalid dates yield `None`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if is_display_shaped(value) {
        let mut parts = value.split('/');
        let day = parts.next()?.parse::<u32>().ok()?;
        let month = parts.next()?.parse::<u32>().ok()?;
        let year = parts.next()?.parse::<i32>().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, INPUT_FORMAT) {
        return Some(date);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|date_time| date_time.date())
}

fn is_display_shaped(value: &str) -> bool {
    let parts: Vec<&str> = value.split('/').collect();
    parts.len() == 3
        && parts[0].len() == 2
        && parts[1].len() == 2
        && parts[2].len() == 4
        && parts
            .iter()
            .all(|part| part.chars().all(|c| c.is_ascii_digit()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Renders any parseable date string as `dd/mm/yyyy`; unparseable input is
/// returned unchanged.
pub fn format_display(value: &str) -> String {
    match parse_date(value) {
        Some(date) => format_date(date),
        None => value.to_string(),
    }
}

/// `dd/mm/yyyy` -> `yyyy-mm-dd`.
pub fn to_input_format(api_date: &str) -> String {
    reorder_fields(api_date, '/', '-')
}

/// `yyyy-mm-dd` -> `dd/mm/yyyy`.
pub fn to_api_format(input_date: &str) -> String {
    reorder_fields(input_date, '-', '/')
}

fn reorder_fields(value: &str, from: char, to: char) -> String {
    if value.is_empty() {
        return String::new();
    }
    let parts: Vec<&str> = value.split(from).collect();
    if parts.len() != 3 {
        return String::new();
    }
    format!("{}{to}{}{to}{}", parts[2], parts[1], parts[0])
}

/// Monday to Friday days in the inclusive range.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> i32 {
    let mut count = 0;
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    count
}

pub fn business_days_between_inputs(start_input: &str, end_input: &str) -> i32 {
    let parse = |value: &str| NaiveDate::parse_from_str(value.trim(), INPUT_FORMAT).ok();
    match (parse(start_input), parse(end_input)) {
        (Some(start), Some(end)) => business_days(start, end),
        _ => 0,
    }
}
