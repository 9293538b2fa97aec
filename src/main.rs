use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveTime, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod attendance;
mod db;
mod grades;
mod models;
mod planner;
mod report;
mod scheduler;
mod util;

#[derive(Parser)]
#[command(name = "study-tracker")]
#[command(about = "Flashcard scheduling, grade and attendance tracking for ZenOS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import flashcards or grades from a CSV file
    #[command(group(
        ArgGroup::new("source")
            .args(["cards", "grades"])
            .required(true)
            .multiple(false)
    ))]
    Import {
        #[arg(long)]
        cards: Option<PathBuf>,
        #[arg(long)]
        grades: Option<PathBuf>,
        /// Course assigned to rows that do not name one
        #[arg(long)]
        course: Option<String>,
    },
    /// List flashcards due for review today
    Due {
        #[arg(long)]
        course: Option<String>,
    },
    /// Grade a flashcard recall (0-5) and reschedule it
    Review {
        #[arg(long)]
        card: Uuid,
        #[arg(long)]
        quality: u8,
    },
    /// Current weighted grade and target projection for a course
    Grades {
        #[arg(long)]
        course: String,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long, default_value_t = 0.5)]
        completed_weight: f64,
        #[arg(long, default_value_t = 0.5)]
        remaining_weight: f64,
    },
    /// Attendance projection and skip budget for a course
    Attendance {
        #[arg(long)]
        course: String,
        /// Overrides the threshold stored on the course
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Record a skipped class (or undo one)
    Skip {
        #[arg(long)]
        course: String,
        #[arg(long, default_value_t = false)]
        undo: bool,
    },
    /// Plan a week of study sessions from pending tasks
    Plan {
        #[arg(long, default_value_t = 2)]
        sessions_per_day: usize,
        #[arg(long, default_value_t = 120)]
        session_minutes: i64,
        /// Daily availability window start, weekdays only (HH:MM)
        #[arg(long, default_value = "18:00")]
        from: String,
        /// Daily availability window end (HH:MM)
        #[arg(long, default_value = "22:00")]
        to: String,
    },
    /// Generate a markdown report for a course
    Report {
        #[arg(long)]
        course: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let today = Utc::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import {
            cards,
            grades,
            course,
        } => {
            if let Some(path) = cards {
                let inserted =
                    db::import_cards_csv(&pool, &path, course.as_deref(), today).await?;
                println!("Inserted {inserted} flashcards from {}.", path.display());
            } else if let Some(path) = grades {
                let inserted = db::import_grades_csv(&pool, &path, course.as_deref()).await?;
                println!("Inserted {inserted} grades from {}.", path.display());
            }
        }
        Commands::Due { course } => {
            let course_id = match course {
                Some(name) => {
                    let record = db::fetch_course_by_name(&pool, &name)
                        .await?
                        .with_context(|| format!("no course named '{name}'"))?;
                    Some(record.id)
                }
                None => None,
            };
            let cards = db::fetch_cards(&pool, course_id).await?;
            let mut due = scheduler::due_cards(&cards, today);

            if due.is_empty() {
                println!("No cards due today.");
                return Ok(());
            }

            due.sort_by(|a, b| a.review.next_review_date.cmp(&b.review.next_review_date));
            println!("{} cards due:", due.len());
            for card in due {
                println!(
                    "- {} (due {}, id {})",
                    card.front, card.review.next_review_date, card.id
                );
            }
        }
        Commands::Review { card, quality } => {
            let record = db::fetch_card(&pool, card)
                .await?
                .with_context(|| format!("no flashcard with id {card}"))?;

            let next = scheduler::next_review(&record.review, quality, today)?;
            db::update_review_state(&pool, record.id, &next).await?;

            println!("Answer was: {}", record.back);
            println!(
                "Rescheduled '{}': next review {} (interval {} days, easiness {:.2})",
                record.front, next.next_review_date, next.interval_days, next.easiness_factor
            );
        }
        Commands::Grades {
            course,
            target,
            completed_weight,
            remaining_weight,
        } => {
            let record = db::fetch_course_by_name(&pool, &course)
                .await?
                .with_context(|| format!("no course named '{course}'"))?;
            let entries = db::fetch_grades(&pool, record.id).await?;

            if entries.is_empty() {
                println!("No grades recorded for {course} yet.");
                return Ok(());
            }

            let current = grades::current_grade(&entries);
            let breakdown = grades::grade_breakdown(&entries);
            println!(
                "Current grade for {course}: {current:.2}% across {} assignments",
                breakdown.completed_count
            );
            println!(
                "Points: {:.1}/{:.1} ({:.2}% raw)",
                breakdown.total_points, breakdown.max_points, breakdown.percentage
            );

            if let Some(target) = target {
                let needed = grades::required_future_grade(
                    current,
                    target,
                    completed_weight,
                    remaining_weight,
                );
                if remaining_weight == 0.0 {
                    println!("No remaining weight: the grade stays at {current:.2}%.");
                } else {
                    println!(
                        "To finish at {target:.1}%, you need {needed:.2}% on remaining work \
                         (weight {remaining_weight})."
                    );
                }
                if !grades::target_reachable(current, target, completed_weight, remaining_weight) {
                    println!("Warning: {target:.1}% is not reachable with the remaining weight.");
                }
            }
        }
        Commands::Attendance {
            course,
            threshold,
            json,
        } => {
            let record = db::fetch_course_by_name(&pool, &course)
                .await?
                .with_context(|| format!("no course named '{course}'"))?;
            let slots = db::fetch_timetable(&pool, record.id).await?;
            let projection = attendance::project_attendance(&record, &slots);
            let threshold = threshold.unwrap_or(record.attendance_threshold);

            if json {
                let value = serde_json::json!({
                    "course": record.name,
                    "total_expected_occurrences": projection.total_expected_occurrences,
                    "total_expected_hours": projection.total_expected_hours,
                    "average_class_duration_hours": projection.average_class_duration_hours,
                    "skipped_classes": record.skipped_classes,
                    "skipped_hours": projection.skipped_hours,
                    "attended_hours": projection.attended_hours,
                    "attendance_percent": projection.attendance_percent,
                    "threshold_percent": threshold,
                    "max_safe_skips": projection.max_safe_skips(threshold),
                    "classes_needed_to_reach_threshold":
                        projection.classes_needed_to_reach_threshold(threshold),
                    "safe_additional_skips": projection.safe_additional_skips(threshold),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            if projection.total_expected_occurrences == 0 {
                println!("No schedule data for {course}: set start/end dates or add timetable entries.");
                return Ok(());
            }

            println!("Attendance for {course}:");
            println!(
                "- Expected: {} classes, {:.1} hours",
                projection.total_expected_occurrences, projection.total_expected_hours
            );
            println!(
                "- Attended: {:.1} hours ({} skips, {:.1} hours skipped)",
                projection.attended_hours,
                record.skipped_classes.max(0),
                projection.skipped_hours
            );
            println!(
                "- Attendance: {:.2}% (target {threshold:.0}%)",
                projection.attendance_percent
            );
            println!(
                "- Maximum safe skips overall: {}",
                projection.max_safe_skips(threshold)
            );
            if projection.attendance_percent >= threshold {
                println!(
                    "Safe: you can skip {} more classes and stay above {threshold:.0}%.",
                    projection.safe_additional_skips(threshold)
                );
            } else {
                println!(
                    "Below target: attend {} more classes to reach {threshold:.0}%.",
                    projection.classes_needed_to_reach_threshold(threshold)
                );
            }
        }
        Commands::Skip { course, undo } => {
            let record = db::fetch_course_by_name(&pool, &course)
                .await?
                .with_context(|| format!("no course named '{course}'"))?;

            let updated = if undo {
                (record.skipped_classes - 1).max(0)
            } else {
                record.skipped_classes.max(0) + 1
            };
            db::set_skipped_classes(&pool, record.id, updated).await?;
            println!("{course} now has {updated} skipped classes.");
        }
        Commands::Plan {
            sessions_per_day,
            session_minutes,
            from,
            to,
        } => {
            let window_start = NaiveTime::parse_from_str(&from, "%H:%M")
                .context("--from must be HH:MM")?;
            let window_end =
                NaiveTime::parse_from_str(&to, "%H:%M").context("--to must be HH:MM")?;

            let tasks = db::fetch_pending_tasks(&pool).await?;
            let courses = db::fetch_courses(&pool).await?;
            let available: HashMap<u8, (NaiveTime, NaiveTime)> =
                (0..5).map(|d| (d, (window_start, window_end))).collect();

            let blocks = planner::plan_week(
                &tasks,
                &courses,
                &available,
                today,
                sessions_per_day,
                session_minutes,
            );

            if blocks.is_empty() {
                println!("No study blocks fit the given availability window.");
                return Ok(());
            }

            println!("Study plan for the week of {today}:");
            for block in blocks {
                let topic = block
                    .topic
                    .map(|t| format!(" - {t}"))
                    .unwrap_or_default();
                println!(
                    "- {} {}-{} {}{}",
                    block.date,
                    block.start_time.format("%H:%M"),
                    block.end_time.format("%H:%M"),
                    block.title,
                    topic
                );
            }
        }
        Commands::Report { course, out } => {
            let record = db::fetch_course_by_name(&pool, &course)
                .await?
                .with_context(|| format!("no course named '{course}'"))?;
            let slots = db::fetch_timetable(&pool, record.id).await?;
            let entries = db::fetch_grades(&pool, record.id).await?;
            let cards = db::fetch_cards(&pool, Some(record.id)).await?;

            let report = report::build_report(&record, &slots, &entries, &cards, today);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
