use chrono::{DateTime, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_MIN * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_MIN * 15;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;

    pub fn now_timestamp_ms() -> i64 {
        Utc::now().timestamp_millis()
    }
}

// Time helper functions

pub fn epoch_ms_to_utc(epoch_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(dt) => format!("{}", dt.format("%Y-%m-%d %H:%M:%S")),
        None => "invalid timestamp".to_string(),
    }
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    format!("{}d", days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formatting_picks_largest_unit() {
        assert_eq!(format_duration(45_000), "45s");
        assert_eq!(format_duration(90_000), "1m");
        assert_eq!(format_duration(TimeUtils::MS_IN_H * 3), "3h");
        assert_eq!(format_duration(TimeUtils::MS_IN_H * 24 * 2), "2d");
    }

    #[test]
    fn epoch_render_is_utc() {
        assert_eq!(epoch_ms_to_utc(0), "1970-01-01 00:00:00");
    }
}
