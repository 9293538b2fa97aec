//! Weighted grade aggregation and target-grade projection.

use crate::models::GradeRecord;
use crate::util::{percentage, round2};

#[derive(Debug, Clone, PartialEq)]
pub struct GradeBreakdown {
    pub total_points: f64,
    pub max_points: f64,
    pub percentage: f64,
    pub weighted_average: f64,
    pub completed_count: usize,
}

/// Weighted mean of score/max_score percentages. Entries with a non-positive
/// max score are excluded entirely; no entries or zero total weight is 0.
pub fn current_grade(entries: &[GradeRecord]) -> f64 {
    let mut total_weighted = 0.0;
    let mut total_weight = 0.0;

    for entry in entries {
        if entry.max_score <= 0.0 {
            continue;
        }
        total_weighted += entry.score / entry.max_score * 100.0 * entry.weight;
        total_weight += entry.weight;
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    round2(total_weighted / total_weight)
}

fn solve_required(current: f64, target: f64, completed_weight: f64, remaining_weight: f64) -> f64 {
    // target = current * completed_weight + needed * remaining_weight
    (target - current * completed_weight) / remaining_weight
}

/// Grade needed on remaining work to finish at `target`, clamped to 0-100.
/// With no remaining weight the current grade is returned unchanged: nothing
/// left to earn. Weights are taken as given, never normalized.
pub fn required_future_grade(
    current: f64,
    target: f64,
    completed_weight: f64,
    remaining_weight: f64,
) -> f64 {
    if remaining_weight == 0.0 {
        return current;
    }
    let needed = solve_required(current, target, completed_weight, remaining_weight);
    round2(needed.clamp(0.0, 100.0))
}

/// Whether the unclamped solution lies within 0-100, i.e. the target can
/// actually be met by future work.
pub fn target_reachable(
    current: f64,
    target: f64,
    completed_weight: f64,
    remaining_weight: f64,
) -> bool {
    if remaining_weight == 0.0 {
        return current >= target;
    }
    let needed = solve_required(current, target, completed_weight, remaining_weight);
    (0.0..=100.0).contains(&needed)
}

pub fn grade_breakdown(entries: &[GradeRecord]) -> GradeBreakdown {
    let mut total_points = 0.0;
    let mut max_points = 0.0;

    for entry in entries {
        total_points += entry.score;
        max_points += entry.max_score;
    }

    GradeBreakdown {
        total_points: round2(total_points),
        max_points: round2(max_points),
        percentage: percentage(total_points, max_points),
        weighted_average: current_grade(entries),
        completed_count: entries.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: f64, max_score: f64, weight: f64) -> GradeRecord {
        GradeRecord {
            assignment_name: "Assignment".to_string(),
            score,
            max_score,
            weight,
            exam_date: None,
        }
    }

    #[test]
    fn empty_entries_grade_to_zero() {
        assert_eq!(current_grade(&[]), 0.0);
    }

    #[test]
    fn weighted_mean_over_entries() {
        let entries = vec![entry(80.0, 100.0, 0.6), entry(90.0, 100.0, 0.4)];
        assert_eq!(current_grade(&entries), 84.0);
    }

    #[test]
    fn order_does_not_matter() {
        let forward = vec![entry(42.0, 50.0, 0.1), entry(71.0, 100.0, 0.3)];
        let reversed: Vec<GradeRecord> = forward.iter().rev().cloned().collect();
        assert_eq!(current_grade(&forward), current_grade(&reversed));
    }

    #[test]
    fn zero_max_entries_are_excluded() {
        let entries = vec![entry(50.0, 0.0, 1.0), entry(80.0, 100.0, 1.0)];
        assert_eq!(current_grade(&entries), 80.0);

        let only_invalid = vec![entry(50.0, 0.0, 1.0)];
        assert_eq!(current_grade(&only_invalid), 0.0);
    }

    #[test]
    fn zero_total_weight_grades_to_zero() {
        let entries = vec![entry(80.0, 100.0, 0.0), entry(90.0, 100.0, 0.0)];
        assert_eq!(current_grade(&entries), 0.0);
    }

    #[test]
    fn required_grade_solves_weighted_split() {
        assert_eq!(required_future_grade(80.0, 90.0, 0.5, 0.5), 100.0);
    }

    #[test]
    fn no_remaining_weight_returns_current() {
        assert_eq!(required_future_grade(72.5, 90.0, 1.0, 0.0), 72.5);
        assert!(!target_reachable(72.5, 90.0, 1.0, 0.0));
        assert!(target_reachable(92.5, 90.0, 1.0, 0.0));
    }

    #[test]
    fn unreachable_targets_are_clamped_and_flagged() {
        // Needed would be (50 - 85.5) / 0.1 = -355: clamps to 0, but the
        // target is already overshot so it still counts as unreachable.
        assert_eq!(required_future_grade(95.0, 50.0, 0.9, 0.1), 0.0);
        assert!(!target_reachable(95.0, 50.0, 0.9, 0.1));

        assert_eq!(required_future_grade(40.0, 95.0, 0.8, 0.2), 100.0);
        assert!(!target_reachable(40.0, 95.0, 0.8, 0.2));
    }

    #[test]
    fn weights_are_not_normalized() {
        // completed + remaining = 0.5; normalizing to 1.0 would give 0,
        // taking the weights as given yields 80.
        assert_eq!(required_future_grade(80.0, 40.0, 0.25, 0.25), 80.0);
    }

    #[test]
    fn breakdown_totals_points_and_weights() {
        let entries = vec![entry(42.0, 50.0, 0.1), entry(71.0, 100.0, 0.3)];
        let breakdown = grade_breakdown(&entries);
        assert_eq!(breakdown.total_points, 113.0);
        assert_eq!(breakdown.max_points, 150.0);
        assert_eq!(breakdown.percentage, 75.33);
        assert_eq!(breakdown.completed_count, 2);
        assert_eq!(breakdown.weighted_average, current_grade(&entries));
    }
}
