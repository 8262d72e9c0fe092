use chrono::{DateTime, Local, NaiveDate, Utc};

/// This is the standard way of converting a date to a string in daybrief. Used as the daily reset
/// marker.
pub fn date_to_day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar day of a stored timestamp, as seen from the local timezone.
pub fn local_day(moment: DateTime<Utc>) -> NaiveDate {
    moment.with_timezone(&Local).date_naive()
}
