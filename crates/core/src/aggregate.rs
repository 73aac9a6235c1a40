//! Reductions over graded attempts.
//!
//! Both functions are pure: they recompute from their inputs on every call and
//! never mutate them. Records are validated when built, so there is no
//! malformed input left to reject here.

use std::cmp::Ordering;

use crate::model::{AttemptRecord, Percentage, TestId};

/// The attempt with the highest percentage.
///
/// Ties go to the earliest `completed_at`; identical timestamps fall back to
/// the smaller result id, so the answer never depends on input order.
/// Returns `None` for an empty slice.
#[must_use]
pub fn best_attempt(attempts: &[AttemptRecord]) -> Option<&AttemptRecord> {
    attempts.iter().min_by(|a, b| rank(a, b))
}

// `Less` means `a` is the better attempt.
fn rank(a: &AttemptRecord, b: &AttemptRecord) -> Ordering {
    b.percentage()
        .total_cmp(&a.percentage())
        .then_with(|| a.completed_at().cmp(&b.completed_at()))
        .then_with(|| a.result_id().cmp(b.result_id()))
}

/// Completion of a module: the mean of each test's best percentage, where a
/// test without attempts counts as zero.
///
/// The divisor is the number of tests in the module, not the number attempted.
/// An empty module is 0%.
#[must_use]
pub fn module_completion(per_test_best: &[(TestId, Option<&AttemptRecord>)]) -> Percentage {
    Percentage::mean(
        per_test_best
            .iter()
            .map(|(_, best)| best.map_or(Percentage::ZERO, AttemptRecord::percentage)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ScoreBand, classify};
    use crate::model::ResultId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn attempt(id: &str, percentage: f64, minutes: i64) -> AttemptRecord {
        AttemptRecord::new(
            ResultId::new(id),
            0,
            10,
            percentage,
            fixed_now() + Duration::minutes(minutes),
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn empty_history_has_no_best() {
        assert!(best_attempt(&[]).is_none());
    }

    #[test]
    fn single_attempt_is_best() {
        let only = attempt("r1", 40.0, 0);
        assert_eq!(best_attempt(std::slice::from_ref(&only)), Some(&only));
    }

    #[test]
    fn best_is_independent_of_order() {
        let a = attempt("a", 60.0, 0);
        let b = attempt("b", 90.0, 1);
        let c = attempt("c", 75.0, 2);
        let orders = [
            vec![a.clone(), b.clone(), c.clone()],
            vec![c.clone(), b.clone(), a.clone()],
            vec![b.clone(), a.clone(), c.clone()],
            vec![c.clone(), a.clone(), b.clone()],
        ];
        for order in &orders {
            assert_eq!(best_attempt(order).map(|r| r.result_id().as_str()), Some("b"));
        }
    }

    #[test]
    fn tie_goes_to_earliest_completion() {
        let early = attempt("late-id", 85.0, 0);
        let late = attempt("early-id", 85.0, 5);
        assert_eq!(
            best_attempt(&[late.clone(), early.clone()]).map(AttemptRecord::result_id),
            Some(early.result_id())
        );
        assert_eq!(
            best_attempt(&[early.clone(), late]).map(AttemptRecord::result_id),
            Some(early.result_id())
        );
    }

    #[test]
    fn same_timestamp_tie_uses_result_id() {
        let x = attempt("x", 70.0, 3);
        let y = attempt("y", 70.0, 3);
        assert_eq!(
            best_attempt(&[y.clone(), x.clone()]).map(|r| r.result_id().as_str()),
            Some("x")
        );
        assert_eq!(
            best_attempt(&[x, y]).map(|r| r.result_id().as_str()),
            Some("x")
        );
    }

    #[test]
    fn unattempted_tests_count_as_zero() {
        let t1 = attempt("r1", 100.0, 0);
        let t3 = attempt("r3", 50.0, 0);
        let completion = module_completion(&[
            (TestId::new("t1"), Some(&t1)),
            (TestId::new("t2"), None),
            (TestId::new("t3"), Some(&t3)),
        ]);
        assert_eq!(completion.value(), 50.0);
    }

    #[test]
    fn one_perfect_test_of_four_is_a_quarter() {
        let only = attempt("r", 100.0, 0);
        let completion = module_completion(&[
            (TestId::new("t1"), Some(&only)),
            (TestId::new("t2"), None),
            (TestId::new("t3"), None),
            (TestId::new("t4"), None),
        ]);
        assert_eq!(completion.value(), 25.0);
    }

    #[test]
    fn empty_module_is_zero() {
        assert_eq!(module_completion(&[]), Percentage::ZERO);
    }

    #[test]
    fn module_band_differs_from_test_bands() {
        let high = attempt("a", 80.0, 0);
        let low = attempt("b", 40.0, 0);
        let completion = module_completion(&[
            (TestId::new("t1"), Some(&high)),
            (TestId::new("t2"), Some(&low)),
        ]);
        assert_eq!(completion.value(), 60.0);
        assert_eq!(classify(high.percentage()), ScoreBand::High);
        assert_eq!(classify(low.percentage()), ScoreBand::Low);
        assert_eq!(classify(completion), ScoreBand::Medium);
    }
}
