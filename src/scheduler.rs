//! SM-2 spaced repetition scheduling.
//!
//! Each card carries four fields (easiness factor, interval, repetition
//! count, next review date) and every computation derives from those alone.
//! Quality 0-5 rates a recall; below 3 the repetition ladder restarts while
//! the easiness update still applies.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::models::{CardRecord, ReviewState};

pub const MIN_EASINESS: f64 = 1.3;
pub const DEFAULT_EASINESS: f64 = 2.5;

/// A quality rating outside 0-5 is a caller bug, rejected rather than clamped.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("review quality {0} is out of range (expected 0-5)")]
pub struct InvalidQuality(pub u8);

/// Fresh scheduling state for a card created today: due immediately.
pub fn initialize(today: NaiveDate) -> ReviewState {
    ReviewState {
        easiness_factor: DEFAULT_EASINESS,
        interval_days: 1,
        repetitions: 0,
        next_review_date: today,
        last_reviewed: None,
    }
}

/// Apply one review with the given quality and return the new state.
pub fn next_review(
    state: &ReviewState,
    quality: u8,
    today: NaiveDate,
) -> Result<ReviewState, InvalidQuality> {
    if quality > 5 {
        return Err(InvalidQuality(quality));
    }

    let q = quality as f64;
    let mut easiness = state.easiness_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    if easiness < MIN_EASINESS {
        easiness = MIN_EASINESS;
    }

    let (interval_days, repetitions) = if quality < 3 {
        // Forgotten: restart the ladder. The easiness update above stands.
        (1, 0)
    } else {
        let interval = match state.repetitions {
            0 => 1,
            1 => 6,
            _ => (state.interval_days as f64 * easiness).floor() as i64,
        };
        (interval, state.repetitions + 1)
    };

    Ok(ReviewState {
        easiness_factor: easiness,
        interval_days,
        repetitions,
        next_review_date: today + Duration::days(interval_days),
        last_reviewed: Some(today),
    })
}

/// Cards due on or before `today`, input order preserved.
pub fn due_cards(cards: &[CardRecord], today: NaiveDate) -> Vec<CardRecord> {
    cards
        .iter()
        .filter(|card| card.review.next_review_date <= today)
        .cloned()
        .collect()
}
