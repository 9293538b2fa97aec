//! Expected-class and skip-budget projection over a recurring weekly
//! timetable bounded by the course start/end dates (inclusive).
//!
//! Hours are authoritative whenever timetable slots and both course dates
//! exist; otherwise the projection falls back to one synthetic one-hour
//! class per weekday (Monday-Friday) in range. Every division in here has a
//! defined zero result, so callers never pre-check denominators.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{CourseRecord, TimetableSlot};
use crate::util::percentage;

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceProjection {
    pub total_expected_hours: f64,
    pub total_expected_occurrences: i64,
    pub average_class_duration_hours: f64,
    pub skipped_hours: f64,
    pub attended_hours: f64,
    pub attendance_percent: f64,
}

impl AttendanceProjection {
    /// How many occurrences may be skipped in total while staying at or
    /// above the threshold, assuming uniform duration.
    pub fn max_safe_skips(&self, threshold_percent: f64) -> i64 {
        let allowed = self.total_expected_occurrences as f64 * (1.0 - threshold_percent / 100.0);
        (allowed.floor() as i64).max(0)
    }

    /// Occurrences still to attend before the percentage reaches the
    /// threshold; 0 when already there.
    pub fn classes_needed_to_reach_threshold(&self, threshold_percent: f64) -> i64 {
        if self.attendance_percent >= threshold_percent || self.total_expected_occurrences == 0 {
            return 0;
        }
        let shortfall = (threshold_percent - self.attendance_percent) / 100.0;
        (shortfall * self.total_expected_occurrences as f64).ceil() as i64
    }

    /// Occurrences that can still be skipped without dropping below the
    /// threshold; 0 when already below it.
    pub fn safe_additional_skips(&self, threshold_percent: f64) -> i64 {
        if self.attendance_percent < threshold_percent {
            return 0;
        }
        let margin = (self.attendance_percent - threshold_percent) / 100.0;
        (margin * self.total_expected_occurrences as f64).floor() as i64
    }
}

pub fn project_attendance(course: &CourseRecord, slots: &[TimetableSlot]) -> AttendanceProjection {
    let mut total_hours = 0.0;
    let mut total_occurrences: i64 = 0;

    match (course.start_date, course.end_date) {
        (Some(start), Some(end)) if !slots.is_empty() => {
            for slot in slots {
                let duration = slot_duration_hours(slot);
                if duration <= 0.0 {
                    // Malformed slot, tolerated.
                    continue;
                }
                let occurrences = count_weekday_occurrences(start, end, slot.day_of_week);
                total_hours += occurrences as f64 * duration;
                total_occurrences += occurrences;
            }
        }
        (Some(start), Some(end)) => {
            // No timetable: one synthetic one-hour class per weekday.
            total_occurrences = count_weekday_dates(start, end);
            total_hours = total_occurrences as f64;
        }
        // Without both dates there is nothing to project.
        _ => {}
    }

    let average = if total_occurrences > 0 {
        total_hours / total_occurrences as f64
    } else {
        0.0
    };
    let skipped_hours = course.skipped_classes.max(0) as f64 * average;
    let attended_hours = (total_hours - skipped_hours).max(0.0);

    AttendanceProjection {
        total_expected_hours: total_hours,
        total_expected_occurrences: total_occurrences,
        average_class_duration_hours: average,
        skipped_hours,
        attended_hours,
        attendance_percent: percentage(attended_hours, total_hours),
    }
}

fn slot_duration_hours(slot: &TimetableSlot) -> f64 {
    (slot.end_time - slot.start_time).num_seconds() as f64 / 3600.0
}

/// Calendar dates in [start, end] falling on the given weekday (0 = Monday).
fn count_weekday_occurrences(start: NaiveDate, end: NaiveDate, weekday: u8) -> i64 {
    let mut count = 0;
    let mut current = start;
    while current <= end {
        if current.weekday().num_days_from_monday() as u8 == weekday {
            count += 1;
        }
        current += Duration::days(1);
    }
    count
}

/// Calendar dates in [start, end] falling Monday through Friday.
fn count_weekday_dates(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut count = 0;
    let mut current = start;
    while current <= end {
        if current.weekday().num_days_from_monday() < 5 {
            count += 1;
        }
        current += Duration::days(1);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(day_of_week: u8, start: NaiveTime, end: NaiveTime) -> TimetableSlot {
        TimetableSlot {
            day_of_week,
            start_time: start,
            end_time: end,
        }
    }

    fn course(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        skipped_classes: i32,
    ) -> CourseRecord {
        CourseRecord {
            id: Uuid::new_v4(),
            name: "Distributed Systems".to_string(),
            code: None,
            start_date,
            end_date,
            skipped_classes,
            attendance_threshold: 75.0,
        }
    }

    #[test]
    fn one_week_of_daily_hour_classes() {
        // Mon 2024-01-01 through Fri 2024-01-05, one 09:00-10:00 slot per
        // weekday, one skip, 75% target.
        let course = course(Some(day(2024, 1, 1)), Some(day(2024, 1, 5)), 1);
        let slots: Vec<TimetableSlot> = (0..5)
            .map(|d| slot(d, time(9, 0), time(10, 0)))
            .collect();

        let projection = project_attendance(&course, &slots);
        assert_eq!(projection.total_expected_occurrences, 5);
        assert_eq!(projection.total_expected_hours, 5.0);
        assert_eq!(projection.average_class_duration_hours, 1.0);
        assert_eq!(projection.skipped_hours, 1.0);
        assert_eq!(projection.attended_hours, 4.0);
        assert_eq!(projection.attendance_percent, 80.0);
        assert_eq!(projection.max_safe_skips(75.0), 1);
        assert_eq!(projection.safe_additional_skips(75.0), 0);
        assert_eq!(projection.classes_needed_to_reach_threshold(75.0), 0);
    }

    #[test]
    fn fallback_counts_one_hour_weekday_classes() {
        // Two full Mon-Fri weeks, no timetable: 10 synthetic occurrences.
        let course = course(Some(day(2024, 1, 1)), Some(day(2024, 1, 12)), 3);
        let projection = project_attendance(&course, &[]);

        assert_eq!(projection.total_expected_occurrences, 10);
        assert_eq!(projection.total_expected_hours, 10.0);
        assert_eq!(projection.attendance_percent, 70.0);
        assert_eq!(projection.classes_needed_to_reach_threshold(75.0), 1);
        assert_eq!(projection.safe_additional_skips(75.0), 0);
        assert_eq!(projection.max_safe_skips(75.0), 2);
    }

    #[test]
    fn malformed_slots_are_discarded() {
        let course = course(Some(day(2024, 1, 1)), Some(day(2024, 1, 5)), 0);
        let slots = vec![
            slot(0, time(10, 0), time(9, 0)),
            slot(0, time(11, 0), time(11, 0)),
            slot(2, time(9, 0), time(11, 0)),
        ];

        let projection = project_attendance(&course, &slots);
        assert_eq!(projection.total_expected_occurrences, 1);
        assert_eq!(projection.total_expected_hours, 2.0);
    }

    #[test]
    fn partial_weeks_count_exact_occurrences() {
        // Wed 2024-01-03 through Tue 2024-01-09: one Monday, one Wednesday.
        let course = course(Some(day(2024, 1, 3)), Some(day(2024, 1, 9)), 0);
        let slots = vec![
            slot(0, time(9, 0), time(10, 30)),
            slot(2, time(9, 0), time(11, 0)),
        ];

        let projection = project_attendance(&course, &slots);
        assert_eq!(projection.total_expected_occurrences, 2);
        assert_eq!(projection.total_expected_hours, 3.5);
        assert_eq!(projection.average_class_duration_hours, 1.75);
    }

    #[test]
    fn missing_dates_project_to_zero() {
        let course = course(None, Some(day(2024, 1, 5)), 2);
        let projection = project_attendance(&course, &[]);

        assert_eq!(projection.total_expected_occurrences, 0);
        assert_eq!(projection.total_expected_hours, 0.0);
        assert_eq!(projection.average_class_duration_hours, 0.0);
        assert_eq!(projection.attendance_percent, 0.0);
        assert_eq!(projection.max_safe_skips(75.0), 0);
        assert_eq!(projection.classes_needed_to_reach_threshold(75.0), 0);
        assert_eq!(projection.safe_additional_skips(75.0), 0);
    }

    #[test]
    fn skips_beyond_expected_floor_at_zero_attended() {
        let course = course(Some(day(2024, 1, 1)), Some(day(2024, 1, 5)), 10);
        let slots = vec![slot(0, time(9, 0), time(10, 0))];

        let projection = project_attendance(&course, &slots);
        assert_eq!(projection.total_expected_hours, 1.0);
        assert_eq!(projection.skipped_hours, 10.0);
        assert_eq!(projection.attended_hours, 0.0);
        assert_eq!(projection.attendance_percent, 0.0);
    }

    #[test]
    fn high_threshold_clamps_safe_skips_to_zero() {
        let course = course(Some(day(2024, 1, 1)), Some(day(2024, 1, 5)), 0);
        let slots: Vec<TimetableSlot> = (0..5)
            .map(|d| slot(d, time(9, 0), time(10, 0)))
            .collect();

        let projection = project_attendance(&course, &slots);
        assert_eq!(projection.max_safe_skips(100.0), 0);
        assert_eq!(projection.safe_additional_skips(100.0), 0);
    }
}
