//! Pulse descriptor words and their merge ordering.

use std::cmp::Ordering;

/// One observed radar pulse.
///
/// Ordering is lexicographic over `(toa, doa, rf, pw, pa, radar_id)`. The
/// merger relies on this full tuple to break ties between pulses that arrive
/// at the same time, so equal TOAs are resolved by DOA, then RF, PW, PA and
/// finally the radar id. The tie-break is an artifact of the key, not a
/// modelled phenomenon.
#[derive(Debug, Clone, Copy)]
pub struct Pdw {
    /// Time of arrival
    pub toa: f64,
    /// Direction of arrival
    pub doa: f64,
    /// Carrier frequency
    pub rf: f64,
    /// Pulse width
    pub pw: f64,
    /// Pulse amplitude
    pub pa: f64,
    /// Index of the emitting radar
    pub radar_id: usize,
}

impl Pdw {
    /// Creates a pulse descriptor word.
    pub fn new(toa: f64, doa: f64, rf: f64, pw: f64, pa: f64, radar_id: usize) -> Self {
        Self {
            toa,
            doa,
            rf,
            pw,
            pa,
            radar_id,
        }
    }
}

// Numeric comparison keeps -0.0 == 0.0; total_cmp only decides the
// unordered case, which validated inputs never reach.
fn compare_field(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

impl Ord for Pdw {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_field(self.toa, other.toa)
            .then_with(|| compare_field(self.doa, other.doa))
            .then_with(|| compare_field(self.rf, other.rf))
            .then_with(|| compare_field(self.pw, other.pw))
            .then_with(|| compare_field(self.pa, other.pa))
            .then_with(|| self.radar_id.cmp(&other.radar_id))
    }
}

impl PartialOrd for Pdw {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pdw {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pdw {}

#[cfg(test)]
mod tests {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn test_toa_orders_first() {
        let early = Pdw::new(1.0, 90.0, 9000.0, 9.0, 9.0, 9);
        let late = Pdw::new(2.0, 0.0, 0.0, 0.0, 0.0, 0);

        assert!(early < late);
    }

    #[test]
    fn test_tie_break_follows_field_order() {
        let base = Pdw::new(10.0, 5.0, 1000.0, 1.0, -1.0, 3);

        let lower_doa = Pdw { doa: 4.0, radar_id: 7, ..base };
        assert!(lower_doa < base);

        let lower_rf = Pdw { rf: 999.0, radar_id: 7, ..base };
        assert!(lower_rf < base);

        let lower_pw = Pdw { pw: 0.5, radar_id: 7, ..base };
        assert!(lower_pw < base);

        let lower_pa = Pdw { pa: -2.0, radar_id: 7, ..base };
        assert!(lower_pa < base);

        let lower_id = Pdw { radar_id: 1, ..base };
        assert!(lower_id < base);
    }

    #[test]
    fn test_signed_zero_compares_equal() {
        let positive = Pdw::new(0.0, 0.0, 1.0, 1.0, 1.0, 0);
        let negative = Pdw::new(-0.0, -0.0, 1.0, 1.0, 1.0, 0);

        assert_eq!(positive, negative);
    }

    #[test]
    fn test_reverse_heap_pops_minimum() {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(Pdw::new(30.0, 0.0, 0.0, 0.0, 0.0, 0)));
        heap.push(Reverse(Pdw::new(10.0, 0.0, 0.0, 0.0, 0.0, 1)));
        heap.push(Reverse(Pdw::new(20.0, 0.0, 0.0, 0.0, 0.0, 2)));

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|Reverse(p)| p.radar_id))
            .collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    fn pdw_strategy() -> impl proptest::strategy::Strategy<Value = Pdw> {
        use proptest::prelude::*;
        (
            -1e3..1e3f64,
            prop::sample::select(vec![0.0, 45.0, 90.0]),
            prop::sample::select(vec![1000.0, 2000.0]),
            0.1..5.0f64,
            prop::sample::select(vec![-1.0, -40.0]),
            0..4usize,
        )
            .prop_map(|(toa, doa, rf, pw, pa, id)| Pdw::new(toa, doa, rf, pw, pa, id))
    }

    proptest::proptest! {
        #[test]
        fn test_order_is_total_and_antisymmetric(a in pdw_strategy(), b in pdw_strategy()) {
            proptest::prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            proptest::prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
        }

        #[test]
        fn test_sorted_pulses_have_sorted_toa(
            mut pulses in proptest::collection::vec(pdw_strategy(), 0..64),
        ) {
            pulses.sort();
            proptest::prop_assert!(pulses.windows(2).all(|w| w[0].toa <= w[1].toa));
        }
    }
}
