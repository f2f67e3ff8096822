use chrono::{DateTime, Timelike, Utc};

/// Wall-clock hour of the session open used by the circuit-breaker
/// halt-duration table.
pub const SESSION_OPEN_HOUR: u32 = 9;

/// Minutes elapsed since the 09:00 session open. Negative before the open.
pub fn minutes_since_open(now: &DateTime<Utc>) -> i64 {
    (now.hour() as i64 - SESSION_OPEN_HOUR as i64) * 60 + now.minute() as i64
}

/// Timestamp format used by the driver's book and trade printouts.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, h, m, 0).unwrap()
    }

    #[test]
    fn test_minutes_since_open() {
        assert_eq!(minutes_since_open(&at(9, 0)), 0);
        assert_eq!(minutes_since_open(&at(11, 30)), 150);
        assert_eq!(minutes_since_open(&at(13, 0)), 240);
        assert_eq!(minutes_since_open(&at(14, 30)), 330);
        assert_eq!(minutes_since_open(&at(8, 45)), -15);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(&at(11, 30)), "2024-03-14 11:30:00");
    }
}
