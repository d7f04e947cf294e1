//! Set operations on half-open intervals.
//!
//! Every function here is pure and total. Results never contain empty
//! intervals, and fragment lists come back sorted by start whenever the input
//! was, which is what the scheduler's free-interval bookkeeping relies on.

use qtty::{Quantity, Unit};

use super::interval::Interval;

/// Returns the overlapping sub-interval of `a` and `b`, if non-empty.
pub fn intersect<U: Unit>(a: &Interval<U>, b: &Interval<U>) -> Option<Interval<U>> {
    let start = if a.start().value() > b.start().value() {
        a.start()
    } else {
        b.start()
    };
    let end = if a.end().value() < b.end().value() {
        a.end()
    } else {
        b.end()
    };
    Interval::try_new(start, end)
}

/// Returns the parts of `base` not covered by `remove`: zero, one or two
/// fragments in start order.
pub fn subtract_one<U: Unit>(base: &Interval<U>, remove: &Interval<U>) -> Vec<Interval<U>> {
    if !base.overlaps(remove) {
        return if base.is_empty() { Vec::new() } else { vec![*base] };
    }

    let mut fragments = Vec::with_capacity(2);
    if let Some(left) = Interval::try_new(base.start(), remove.start()) {
        fragments.push(left);
    }
    if let Some(right) = Interval::try_new(remove.end(), base.end()) {
        fragments.push(right);
    }
    fragments
}

/// Removes every interval in `removals` from `base`.
///
/// Removals are processed in start order; once nothing of `base` is left the
/// fold stops early.
pub fn subtract_many<U: Unit>(base: &Interval<U>, removals: &[Interval<U>]) -> Vec<Interval<U>> {
    let mut sorted: Vec<&Interval<U>> = removals.iter().collect();
    sorted.sort_by(|a, b| {
        a.start()
            .value()
            .partial_cmp(&b.start().value())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut fragments = if base.is_empty() { Vec::new() } else { vec![*base] };
    for remove in sorted {
        if fragments.is_empty() {
            break;
        }
        fragments = fragments
            .iter()
            .flat_map(|fragment| subtract_one(fragment, remove))
            .collect();
    }
    fragments
}

/// Saturating clamp of `value` into `[min, max]`.
///
/// When the bounds are inverted, `min` wins.
pub fn clamp<U: Unit>(value: Quantity<U>, min: Quantity<U>, max: Quantity<U>) -> Quantity<U> {
    if value.value() < min.value() {
        min
    } else if value.value() > max.value() {
        if max.value() < min.value() {
            min
        } else {
            max
        }
    } else {
        value
    }
}

/// Sums the durations of `intervals` (overlaps are counted twice).
pub fn total_duration<U: Unit>(intervals: &[Interval<U>]) -> Quantity<U> {
    intervals
        .iter()
        .fold(Quantity::new(0.0), |acc, iv| acc + iv.duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use qtty::Second;

    fn iv(start: f64, end: f64) -> Interval<Second> {
        Interval::from_f64(start, end)
    }

    fn q(value: f64) -> Quantity<Second> {
        Quantity::new(value)
    }

    #[test]
    fn intersect_partial_overlap() {
        assert_eq!(intersect(&iv(0.0, 50.0), &iv(30.0, 80.0)), Some(iv(30.0, 50.0)));
    }

    #[test]
    fn intersect_touching_is_none() {
        assert_eq!(intersect(&iv(0.0, 50.0), &iv(50.0, 80.0)), None);
    }

    #[test]
    fn intersect_disjoint_is_none() {
        assert_eq!(intersect(&iv(0.0, 10.0), &iv(20.0, 30.0)), None);
    }

    #[test]
    fn subtract_one_splits_in_two() {
        let parts = subtract_one(&iv(0.0, 100.0), &iv(40.0, 60.0));
        assert_eq!(parts, vec![iv(0.0, 40.0), iv(60.0, 100.0)]);
    }

    #[test]
    fn subtract_one_trims_edges() {
        assert_eq!(subtract_one(&iv(0.0, 100.0), &iv(-10.0, 30.0)), vec![iv(30.0, 100.0)]);
        assert_eq!(subtract_one(&iv(0.0, 100.0), &iv(70.0, 130.0)), vec![iv(0.0, 70.0)]);
    }

    #[test]
    fn subtract_one_covering_removal_leaves_nothing() {
        assert!(subtract_one(&iv(10.0, 20.0), &iv(0.0, 30.0)).is_empty());
    }

    #[test]
    fn subtract_one_disjoint_keeps_base() {
        assert_eq!(subtract_one(&iv(0.0, 10.0), &iv(10.0, 30.0)), vec![iv(0.0, 10.0)]);
    }

    #[test]
    fn subtract_many_no_removals_is_identity() {
        assert_eq!(subtract_many(&iv(0.0, 100.0), &[]), vec![iv(0.0, 100.0)]);
    }

    #[test]
    fn subtract_many_self_is_empty() {
        assert!(subtract_many(&iv(0.0, 100.0), &[iv(0.0, 100.0)]).is_empty());
    }

    #[test]
    fn subtract_many_unsorted_removals() {
        let parts = subtract_many(
            &iv(0.0, 100.0),
            &[iv(70.0, 80.0), iv(10.0, 20.0), iv(15.0, 40.0)],
        );
        assert_eq!(parts, vec![iv(0.0, 10.0), iv(40.0, 70.0), iv(80.0, 100.0)]);
    }

    #[test]
    fn clamp_saturates() {
        assert_eq!(clamp(q(-5.0), q(0.0), q(10.0)).value(), 0.0);
        assert_eq!(clamp(q(15.0), q(0.0), q(10.0)).value(), 10.0);
        assert_eq!(clamp(q(5.0), q(0.0), q(10.0)).value(), 5.0);
        assert_eq!(clamp(q(15.0), q(10.0), q(0.0)).value(), 10.0);
    }

    #[test]
    fn total_duration_sums() {
        assert_eq!(total_duration(&[iv(0.0, 10.0), iv(20.0, 25.0)]).value(), 15.0);
        assert_eq!(total_duration::<Second>(&[]).value(), 0.0);
    }

    fn interval_strategy() -> impl Strategy<Value = Interval<Second>> {
        (-1_000i32..1_000, 1i32..500)
            .prop_map(|(start, len)| iv(start as f64, (start + len) as f64))
    }

    proptest! {
        #[test]
        fn removed_region_never_survives(
            base in interval_strategy(),
            remove in interval_strategy(),
        ) {
            for fragment in subtract_one(&base, &remove) {
                prop_assert!(intersect(&fragment, &remove).is_none());
                prop_assert!(intersect(&fragment, &base) == Some(fragment));
            }
        }

        #[test]
        fn fragments_are_sorted_and_disjoint(
            base in interval_strategy(),
            removals in proptest::collection::vec(interval_strategy(), 0..8),
        ) {
            let fragments = subtract_many(&base, &removals);
            for pair in fragments.windows(2) {
                prop_assert!(pair[0].end().value() <= pair[1].start().value());
            }
            for fragment in &fragments {
                prop_assert!(!fragment.is_empty());
                for remove in &removals {
                    prop_assert!(!fragment.overlaps(remove));
                }
            }
        }

        #[test]
        fn subtraction_conserves_length(
            base in interval_strategy(),
            remove in interval_strategy(),
        ) {
            let kept = total_duration(&subtract_one(&base, &remove)).value();
            let cut = intersect(&base, &remove).map_or(0.0, |i| i.duration().value());
            prop_assert!((kept + cut - base.duration().value()).abs() < 1e-9);
        }
    }
}
