use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Utc};

/// `Today`, `Tomorrow`, a weekday name within the current Sunday-to-Saturday
/// week, `Mar 4` within the year, otherwise `Mar 4, 2026`.
pub fn day_label(when: NaiveDate, today: NaiveDate) -> String {
    if when == today {
        return "Today".to_owned();
    }
    if today.succ_opt() == Some(when) {
        return "Tomorrow".to_owned();
    }

    let week_start = today - chrono::Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    let week_end = week_start + chrono::Duration::days(6);
    if when >= week_start && when <= week_end {
        return when.format("%A").to_string();
    }
    if when.year() == today.year() {
        return when.format("%b %-d").to_string();
    }
    when.format("%b %-d, %Y").to_string()
}

/// `7:30 PM`
pub fn time_label(when: NaiveDateTime) -> String {
    when.format("%-I:%M %p").to_string()
}

pub fn when_label(when: NaiveDateTime, today: NaiveDate) -> String {
    format!("{}, {}", day_label(when.date(), today), time_label(when))
}

/// Game time in the viewer's local zone, relative to the local today.
pub fn local_when(when: DateTime<Utc>) -> String {
    let local = when.with_timezone(&Local);
    when_label(local.naive_local(), Local::now().date_naive())
}

pub fn local_day(when: DateTime<Utc>) -> String {
    let local = when.with_timezone(&Local);
    day_label(local.date_naive(), Local::now().date_naive())
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
