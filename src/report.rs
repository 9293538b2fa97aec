use std::fmt::Write;

use chrono::NaiveDate;

use crate::attendance;
use crate::grades;
use crate::models::{CardRecord, CourseRecord, GradeRecord, TimetableSlot};
use crate::scheduler;

pub fn build_report(
    course: &CourseRecord,
    slots: &[TimetableSlot],
    grade_entries: &[GradeRecord],
    cards: &[CardRecord],
    today: NaiveDate,
) -> String {
    let projection = attendance::project_attendance(course, slots);
    let threshold = course.attendance_threshold;
    let current = grades::current_grade(grade_entries);
    let breakdown = grades::grade_breakdown(grade_entries);
    let due = scheduler::due_cards(cards, today);

    let mut output = String::new();
    let course_label = match &course.code {
        Some(code) => format!("{} ({})", course.name, code),
        None => course.name.clone(),
    };

    let _ = writeln!(output, "# Study Report - {course_label}");
    let _ = writeln!(output, "Generated on {today}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");

    if projection.total_expected_occurrences == 0 {
        let _ = writeln!(output, "No schedule data for this course yet.");
    } else {
        let _ = writeln!(
            output,
            "- Expected: {} classes, {:.1} hours",
            projection.total_expected_occurrences, projection.total_expected_hours
        );
        let _ = writeln!(
            output,
            "- Attended: {:.1} hours ({} skips, {:.1} hours skipped)",
            projection.attended_hours,
            course.skipped_classes.max(0),
            projection.skipped_hours
        );
        let _ = writeln!(
            output,
            "- Attendance: {:.2}% (target {:.0}%)",
            projection.attendance_percent, threshold
        );
        if projection.attendance_percent >= threshold {
            let _ = writeln!(
                output,
                "- You can skip {} more classes and stay above target.",
                projection.safe_additional_skips(threshold)
            );
        } else {
            let _ = writeln!(
                output,
                "- Below target: attend {} more classes to reach {:.0}%.",
                projection.classes_needed_to_reach_threshold(threshold),
                threshold
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grades");

    if grade_entries.is_empty() {
        let _ = writeln!(output, "No grades recorded for this course.");
    } else {
        let _ = writeln!(
            output,
            "- Current weighted grade: {:.2}% across {} assignments",
            current, breakdown.completed_count
        );
        let _ = writeln!(
            output,
            "- Points: {:.1}/{:.1} ({:.2}% raw)",
            breakdown.total_points, breakdown.max_points, breakdown.percentage
        );
        for entry in grade_entries.iter().take(10) {
            let when = entry
                .exam_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "undated".to_string());
            let _ = writeln!(
                output,
                "- {}: {}/{} (weight {}, {})",
                entry.assignment_name, entry.score, entry.max_score, entry.weight, when
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cards Due");

    if due.is_empty() {
        let _ = writeln!(output, "No cards due for review today.");
    } else {
        let _ = writeln!(output, "{} cards due today:", due.len());
        for card in due.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} (due {})",
                card.front, card.review.next_review_date
            );
        }
    }

    output
}
