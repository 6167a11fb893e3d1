//! Orders sized candidates: closest knock-out to the stop first, then higher leverage.

use std::cmp::Ordering;

use super::SizedCandidate;

/// Ranking order between two candidates.
pub fn compare(a: &SizedCandidate, b: &SizedCandidate) -> Ordering {
    a.distance_to_stop
        .cmp(&b.distance_to_stop)
        .then_with(|| b.leverage.cmp(&a.leverage))
}

/// Sort in place. Stable: exact ties keep their input order.
pub fn rank(candidates: &mut [SizedCandidate]) {
    candidates.sort_by(compare);
}
