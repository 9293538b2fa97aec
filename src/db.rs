use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    CardRecord, CourseRecord, GradeRecord, Priority, ReviewState, TaskRecord, TimetableSlot,
};
use crate::scheduler;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let courses = vec![
        (
            Uuid::parse_str("7e4f2c7a-1b7e-4f24-9a34-0c1d7d3b6a91")?,
            "Distributed Systems",
            "CS-486",
            NaiveDate::from_ymd_opt(2026, 1, 12).context("invalid date")?,
            NaiveDate::from_ymd_opt(2026, 4, 24).context("invalid date")?,
        ),
        (
            Uuid::parse_str("b2a6d7ce-58f1-4d05-8f2e-6f5a9c1e0d43")?,
            "Linear Algebra",
            "MATH-221",
            NaiveDate::from_ymd_opt(2026, 1, 12).context("invalid date")?,
            NaiveDate::from_ymd_opt(2026, 4, 24).context("invalid date")?,
        ),
    ];

    for (id, name, code, start_date, end_date) in courses {
        sqlx::query(
            r#"
            INSERT INTO study_tracker.courses (id, name, code, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE
            SET code = EXCLUDED.code, start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(code)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(pool)
        .await?;
    }

    let slots = vec![
        ("Distributed Systems", 0i16, (9, 0), (10, 30)),
        ("Distributed Systems", 2, (9, 0), (10, 30)),
        ("Distributed Systems", 4, (11, 0), (12, 0)),
        ("Linear Algebra", 1, (14, 0), (15, 0)),
        ("Linear Algebra", 3, (14, 0), (15, 0)),
    ];

    for (course_name, day_of_week, start, end) in slots {
        let course_id = course_id_by_name(pool, course_name).await?;
        let start_time = NaiveTime::from_hms_opt(start.0, start.1, 0).context("invalid time")?;
        let end_time = NaiveTime::from_hms_opt(end.0, end.1, 0).context("invalid time")?;

        sqlx::query(
            r#"
            INSERT INTO study_tracker.timetable
            (id, course_id, title, day_of_week, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (course_id, day_of_week, start_time) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(format!("{course_name} Class"))
        .bind(day_of_week)
        .bind(start_time)
        .bind(end_time)
        .execute(pool)
        .await?;
    }

    let grades = vec![
        (
            "seed-grade-001",
            "Distributed Systems",
            "Problem Set 1",
            42.0,
            50.0,
            0.1,
            NaiveDate::from_ymd_opt(2026, 2, 6).context("invalid date")?,
        ),
        (
            "seed-grade-002",
            "Distributed Systems",
            "Midterm",
            71.0,
            100.0,
            0.3,
            NaiveDate::from_ymd_opt(2026, 3, 6).context("invalid date")?,
        ),
        (
            "seed-grade-003",
            "Linear Algebra",
            "Quiz 1",
            18.0,
            20.0,
            0.1,
            NaiveDate::from_ymd_opt(2026, 2, 13).context("invalid date")?,
        ),
    ];

    for (source_key, course_name, assignment_name, score, max_score, weight, exam_date) in grades {
        let course_id = course_id_by_name(pool, course_name).await?;
        sqlx::query(
            r#"
            INSERT INTO study_tracker.grades
            (id, course_id, assignment_name, score, max_score, weight, exam_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(assignment_name)
        .bind(score)
        .bind(max_score)
        .bind(weight)
        .bind(exam_date)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let cards = vec![
        (
            "seed-card-001",
            "Distributed Systems",
            "What does the CAP theorem say a partitioned system must choose between?",
            "Consistency and availability",
        ),
        (
            "seed-card-002",
            "Distributed Systems",
            "What quorum sizes guarantee read-your-writes in a system of N replicas?",
            "R + W > N",
        ),
        (
            "seed-card-003",
            "Linear Algebra",
            "When is a square matrix invertible?",
            "Exactly when its determinant is non-zero",
        ),
    ];

    let due = NaiveDate::from_ymd_opt(2026, 1, 12).context("invalid date")?;
    for (source_key, course_name, front, back) in cards {
        let course_id = course_id_by_name(pool, course_name).await?;
        sqlx::query(
            r#"
            INSERT INTO study_tracker.flashcards
            (id, course_id, front, back, next_review_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(front)
        .bind(back)
        .bind(due)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let tasks = vec![
        (
            "seed-task-001",
            Some("Distributed Systems"),
            "Problem Set 2",
            NaiveDate::from_ymd_opt(2026, 2, 20)
                .and_then(|d| d.and_hms_opt(23, 59, 0)),
            "high",
        ),
        (
            "seed-task-002",
            Some("Distributed Systems"),
            "Read the Raft paper",
            None,
            "medium",
        ),
        (
            "seed-task-003",
            Some("Linear Algebra"),
            "Quiz 2 prep",
            NaiveDate::from_ymd_opt(2026, 2, 17)
                .and_then(|d| d.and_hms_opt(9, 0, 0)),
            "urgent",
        ),
    ];

    for (source_key, course_name, title, due_date, priority) in tasks {
        let course_id = match course_name {
            Some(name) => Some(course_id_by_name(pool, name).await?),
            None => None,
        };
        sqlx::query(
            r#"
            INSERT INTO study_tracker.tasks
            (id, course_id, title, due_date, priority, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(title)
        .bind(due_date)
        .bind(priority)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn course_id_by_name(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    let id = sqlx::query("SELECT id FROM study_tracker.courses WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?
        .get("id");
    Ok(id)
}

async fn upsert_course_by_name(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    let id = sqlx::query(
        r#"
        INSERT INTO study_tracker.courses (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

pub async fn import_cards_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    default_course: Option<&str>,
    today: NaiveDate,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        course: Option<String>,
        front: String,
        back: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let course_name = row
            .course
            .as_deref()
            .or(default_course)
            .context("CSV row has no course and no --course default was given")?;
        let course_id = upsert_course_by_name(pool, course_name).await?;

        let state = scheduler::initialize(today);
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO study_tracker.flashcards
            (id, course_id, front, back, easiness_factor, interval_days, repetitions,
             next_review_date, last_reviewed, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(&row.front)
        .bind(&row.back)
        .bind(state.easiness_factor)
        .bind(state.interval_days)
        .bind(state.repetitions as i32)
        .bind(state.next_review_date)
        .bind(state.last_reviewed)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn import_grades_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    default_course: Option<&str>,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        course: Option<String>,
        assignment_name: String,
        score: f64,
        max_score: f64,
        weight: f64,
        exam_date: Option<NaiveDate>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let course_name = row
            .course
            .as_deref()
            .or(default_course)
            .context("CSV row has no course and no --course default was given")?;
        let course_id = upsert_course_by_name(pool, course_name).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO study_tracker.grades
            (id, course_id, assignment_name, score, max_score, weight, exam_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(&row.assignment_name)
        .bind(row.score)
        .bind(row.max_score)
        .bind(row.weight)
        .bind(row.exam_date)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

fn course_from_row(row: &PgRow) -> CourseRecord {
    CourseRecord {
        id: row.get("id"),
        name: row.get("name"),
        code: row.get("code"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        skipped_classes: row.get("skipped_classes"),
        attendance_threshold: row.get("attendance_threshold"),
    }
}

pub async fn fetch_courses(pool: &PgPool) -> anyhow::Result<Vec<CourseRecord>> {
    let rows = sqlx::query(
        "SELECT id, name, code, start_date, end_date, skipped_classes, attendance_threshold \
         FROM study_tracker.courses ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(course_from_row).collect())
}

pub async fn fetch_course_by_name(
    pool: &PgPool,
    name: &str,
) -> anyhow::Result<Option<CourseRecord>> {
    let row = sqlx::query(
        "SELECT id, name, code, start_date, end_date, skipped_classes, attendance_threshold \
         FROM study_tracker.courses WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(course_from_row))
}

pub async fn fetch_timetable(pool: &PgPool, course_id: Uuid) -> anyhow::Result<Vec<TimetableSlot>> {
    let rows = sqlx::query(
        "SELECT day_of_week, start_time, end_time FROM study_tracker.timetable \
         WHERE course_id = $1 ORDER BY day_of_week, start_time",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    let slots = rows
        .iter()
        .map(|row| TimetableSlot {
            day_of_week: row.get::<i16, _>("day_of_week") as u8,
            start_time: row.get("start_time"),
            end_time: row.get("end_time"),
        })
        .collect();

    Ok(slots)
}

pub async fn fetch_grades(pool: &PgPool, course_id: Uuid) -> anyhow::Result<Vec<GradeRecord>> {
    let rows = sqlx::query(
        "SELECT assignment_name, score, max_score, weight, exam_date \
         FROM study_tracker.grades WHERE course_id = $1 \
         ORDER BY exam_date DESC NULLS LAST, created_at DESC",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    let grades = rows
        .iter()
        .map(|row| GradeRecord {
            assignment_name: row.get("assignment_name"),
            score: row.get("score"),
            max_score: row.get("max_score"),
            weight: row.get("weight"),
            exam_date: row.get("exam_date"),
        })
        .collect();

    Ok(grades)
}

fn card_from_row(row: &PgRow) -> CardRecord {
    CardRecord {
        id: row.get("id"),
        course_id: row.get("course_id"),
        front: row.get("front"),
        back: row.get("back"),
        review: ReviewState {
            easiness_factor: row.get("easiness_factor"),
            interval_days: row.get("interval_days"),
            repetitions: row.get::<i32, _>("repetitions").max(0) as u32,
            next_review_date: row.get("next_review_date"),
            last_reviewed: row.get("last_reviewed"),
        },
    }
}

pub async fn fetch_cards(
    pool: &PgPool,
    course_id: Option<Uuid>,
) -> anyhow::Result<Vec<CardRecord>> {
    let mut query = String::from(
        "SELECT id, course_id, front, back, easiness_factor, interval_days, repetitions, \
         next_review_date, last_reviewed FROM study_tracker.flashcards",
    );
    if course_id.is_some() {
        query.push_str(" WHERE course_id = $1");
    }
    query.push_str(" ORDER BY next_review_date, created_at");

    let mut rows = sqlx::query(&query);
    if let Some(id) = course_id {
        rows = rows.bind(id);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(card_from_row).collect())
}

pub async fn fetch_card(pool: &PgPool, card_id: Uuid) -> anyhow::Result<Option<CardRecord>> {
    let row = sqlx::query(
        "SELECT id, course_id, front, back, easiness_factor, interval_days, repetitions, \
         next_review_date, last_reviewed FROM study_tracker.flashcards WHERE id = $1",
    )
    .bind(card_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(card_from_row))
}

pub async fn update_review_state(
    pool: &PgPool,
    card_id: Uuid,
    state: &ReviewState,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE study_tracker.flashcards
        SET easiness_factor = $1, interval_days = $2, repetitions = $3,
            next_review_date = $4, last_reviewed = $5
        WHERE id = $6
        "#,
    )
    .bind(state.easiness_factor)
    .bind(state.interval_days)
    .bind(state.repetitions as i32)
    .bind(state.next_review_date)
    .bind(state.last_reviewed)
    .bind(card_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_skipped_classes(
    pool: &PgPool,
    course_id: Uuid,
    skipped_classes: i32,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE study_tracker.courses SET skipped_classes = $1 WHERE id = $2")
        .bind(skipped_classes)
        .bind(course_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn fetch_pending_tasks(pool: &PgPool) -> anyhow::Result<Vec<TaskRecord>> {
    let rows = sqlx::query(
        "SELECT id, course_id, title, due_date, priority FROM study_tracker.tasks \
         WHERE status <> 'completed' ORDER BY due_date NULLS LAST, created_at",
    )
    .fetch_all(pool)
    .await?;

    let tasks = rows
        .iter()
        .map(|row| TaskRecord {
            id: row.get("id"),
            course_id: row.get("course_id"),
            title: row.get("title"),
            due_date: row.get("due_date"),
            priority: Priority::parse(row.get::<String, _>("priority").as_str()),
        })
        .collect();

    Ok(tasks)
}
