use crate::error::FieldKind;

use chrono::{Datelike, Timelike};

/// The calendar fields of one instant, as seen by crontab rules.
///
/// A single sample is taken per scheduler tick and shared by every
/// crontab evaluated in that tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSample {
    /// `0..=59`
    pub minute: u8,
    /// `0..=23`
    pub hour: u8,
    /// `1..=31`
    pub day_of_month: u8,
    /// `1..=12`
    pub month: u8,
    /// `0..=6`, Sunday is `0`.
    pub day_of_week: u8,
}

impl TimeSample {
    /// Samples any chrono date-time.
    pub fn from_datetime<T>(time: &T) -> Self
    where
        T: Datelike + Timelike,
    {
        Self {
            minute: time.minute() as u8,
            hour: time.hour() as u8,
            day_of_month: time.day() as u8,
            month: time.month() as u8,
            day_of_week: time.weekday().num_days_from_sunday() as u8,
        }
    }

    /// Value of the given field.
    pub fn value(&self, kind: FieldKind) -> u8 {
        match kind {
            FieldKind::Minute => self.minute,
            FieldKind::Hour => self.hour,
            FieldKind::DayOfMonth => self.day_of_month,
            FieldKind::Month => self.month,
            FieldKind::DayOfWeek => self.day_of_week,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_sample_fields() {
        // 2024-03-10 was a Sunday.
        let time = NaiveDate::from_ymd_opt(2024, 3, 10)
            .and_then(|d| d.and_hms_opt(7, 45, 12))
            .expect("valid date");

        let sample = TimeSample::from_datetime(&time);

        assert_eq!(
            sample,
            TimeSample {
                minute: 45,
                hour: 7,
                day_of_month: 10,
                month: 3,
                day_of_week: 0,
            }
        );
        assert_eq!(sample.value(FieldKind::Month), 3);
    }
}
