//! Study-block layout for the week ahead.
//!
//! Pending tasks are ordered by priority then due date and dealt onto the
//! caller's per-weekday availability windows, with a 30-minute break between
//! consecutive sessions.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{CourseRecord, TaskRecord};

const BREAK_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct StudyBlock {
    pub date: NaiveDate,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub title: String,
    pub topic: Option<String>,
    pub course_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Lay out up to `sessions_per_day` blocks of `session_minutes` for each of
/// the seven days starting at `today` that have an availability window.
/// Blocks may not start at or past the window end; tasks are consumed in
/// priority order and leftover blocks become generic study sessions.
pub fn plan_week(
    tasks: &[TaskRecord],
    courses: &[CourseRecord],
    available_hours: &HashMap<u8, (NaiveTime, NaiveTime)>,
    today: NaiveDate,
    sessions_per_day: usize,
    session_minutes: i64,
) -> Vec<StudyBlock> {
    let mut ordered: Vec<&TaskRecord> = tasks.iter().collect();
    ordered.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
    let mut queue: VecDeque<&TaskRecord> = ordered.into();

    let mut blocks = Vec::new();
    for day_offset in 0..7 {
        let date = today + Duration::days(day_offset);
        let day_of_week = date.weekday().num_days_from_monday() as u8;
        let Some(&(window_start, window_end)) = available_hours.get(&day_of_week) else {
            continue;
        };

        for session in 0..sessions_per_day {
            let offset = Duration::minutes(session as i64 * (session_minutes + BREAK_MINUTES));
            let (start_time, start_wrap) = window_start.overflowing_add_signed(offset);
            if start_wrap != 0 || start_time >= window_end {
                break;
            }
            let (end_time, end_wrap) =
                start_time.overflowing_add_signed(Duration::minutes(session_minutes));
            if end_wrap != 0 {
                break;
            }

            let (title, topic, course_id, task_id) = match queue.pop_front() {
                Some(task) => {
                    let course = task
                        .course_id
                        .and_then(|id| courses.iter().find(|c| c.id == id));
                    let title = match course {
                        Some(course) => format!("Study: {}", course.name),
                        None => "Study: General".to_string(),
                    };
                    (title, Some(task.title.clone()), task.course_id, Some(task.id))
                }
                None => ("Study Session".to_string(), None, None, None),
            };

            blocks.push(StudyBlock {
                date,
                day_of_week,
                start_time,
                end_time,
                title,
                topic,
                course_id,
                task_id,
            });
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn task(title: &str, priority: Priority, due: Option<NaiveDate>) -> TaskRecord {
        TaskRecord {
            id: Uuid::new_v4(),
            course_id: None,
            title: title.to_string(),
            due_date: due.map(|d| d.and_hms_opt(23, 59, 0).unwrap()),
            priority,
        }
    }

    fn weekday_evenings() -> HashMap<u8, (NaiveTime, NaiveTime)> {
        (0..5).map(|d| (d, (time(18, 0), time(22, 0)))).collect()
    }

    #[test]
    fn urgent_tasks_are_planned_first() {
        let tasks = vec![
            task("Read chapter", Priority::Medium, None),
            task("Finish lab", Priority::Urgent, None),
            task("Revise notes", Priority::High, Some(day(2026, 2, 10))),
        ];

        // Monday, so the first block lands on day one of the window.
        let blocks = plan_week(&tasks, &[], &weekday_evenings(), day(2026, 2, 2), 2, 120);
        let topics: Vec<&str> = blocks
            .iter()
            .filter_map(|b| b.topic.as_deref())
            .collect();
        assert_eq!(topics, vec!["Finish lab", "Revise notes", "Read chapter"]);
    }

    #[test]
    fn earlier_due_dates_break_priority_ties() {
        let tasks = vec![
            task("Later", Priority::High, Some(day(2026, 2, 20))),
            task("Sooner", Priority::High, Some(day(2026, 2, 5))),
            task("Undated", Priority::High, None),
        ];

        let blocks = plan_week(&tasks, &[], &weekday_evenings(), day(2026, 2, 2), 3, 60);
        let topics: Vec<&str> = blocks
            .iter()
            .filter_map(|b| b.topic.as_deref())
            .collect();
        assert_eq!(topics[..3], ["Sooner", "Later", "Undated"]);
    }

    #[test]
    fn sessions_stop_at_window_end() {
        // 18:00-20:00 window: a second 120-minute session would start at
        // 20:30, past the window end.
        let mut hours = HashMap::new();
        hours.insert(0u8, (time(18, 0), time(20, 0)));

        let blocks = plan_week(&[], &[], &hours, day(2026, 2, 2), 3, 120);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_time, time(18, 0));
        assert_eq!(blocks[0].end_time, time(20, 0));
    }

    #[test]
    fn block_count_is_bounded_by_days_and_sessions() {
        // Five weekday windows wide enough for two sessions each.
        let blocks = plan_week(&[], &[], &weekday_evenings(), day(2026, 2, 2), 2, 90);
        assert_eq!(blocks.len(), 10);
        assert!(blocks.iter().all(|b| b.day_of_week < 5));
    }

    #[test]
    fn leftover_blocks_are_generic_sessions() {
        let tasks = vec![task("Only task", Priority::Low, None)];
        let blocks = plan_week(&tasks, &[], &weekday_evenings(), day(2026, 2, 2), 2, 60);

        assert_eq!(blocks[0].topic.as_deref(), Some("Only task"));
        assert_eq!(blocks[0].title, "Study: General");
        assert!(blocks[1..].iter().all(|b| b.topic.is_none()));
        assert!(blocks[1..].iter().all(|b| b.title == "Study Session"));
    }

    #[test]
    fn task_blocks_carry_the_course_name() {
        let course = CourseRecord {
            id: Uuid::new_v4(),
            name: "Distributed Systems".to_string(),
            code: None,
            start_date: None,
            end_date: None,
            skipped_classes: 0,
            attendance_threshold: 75.0,
        };
        let mut linked = task("Problem set", Priority::High, None);
        linked.course_id = Some(course.id);
        let task_id = linked.id;

        let blocks = plan_week(
            &[linked],
            &[course.clone()],
            &weekday_evenings(),
            day(2026, 2, 2),
            1,
            60,
        );
        assert_eq!(blocks[0].title, "Study: Distributed Systems");
        assert_eq!(blocks[0].course_id, Some(course.id));
        assert_eq!(blocks[0].task_id, Some(task_id));
    }

    #[test]
    fn no_availability_means_no_blocks() {
        let tasks = vec![task("Anything", Priority::Urgent, None)];
        let blocks = plan_week(&tasks, &[], &HashMap::new(), day(2026, 2, 2), 2, 120);
        assert!(blocks.is_empty());
    }
}
