use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub skipped_classes: i32,
    pub attendance_threshold: f64,
}

/// One recurring weekly class slot. `day_of_week` is 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone)]
pub struct TimetableSlot {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// SM-2 scheduling state carried by each flashcard.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewState {
    pub easiness_factor: f64,
    pub interval_days: i64,
    pub repetitions: u32,
    pub next_review_date: NaiveDate,
    pub last_reviewed: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct CardRecord {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub front: String,
    pub back: String,
    pub review: ReviewState,
}

#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub assignment_name: String,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
    pub exam_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Unknown labels fall back to medium rather than failing the fetch.
    pub fn parse(value: &str) -> Self {
        match value {
            "urgent" => Priority::Urgent,
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }

}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub due_date: Option<NaiveDateTime>,
    pub priority: Priority,
}
