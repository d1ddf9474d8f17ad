// sensorframe — Reducer Library
//
// Pure statistics over one accumulation window.  The slice length is the
// live sample count; every reducer returns `None` only for an empty slice.

/// Arithmetic mean, truncated toward zero.
pub fn mean(samples: &[i32]) -> Option<i32> {
    if samples.is_empty() {
        return None;
    }
    let sum: i64 = samples.iter().map(|&v| v as i64).sum();
    Some((sum / samples.len() as i64) as i32)
}

/// Middle element of a sorted copy.  Even counts take the lower middle.
pub fn median(samples: &[i32]) -> Option<i32> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted: heapless::Vec<i32, { crate::config::SAMPLE_CAPACITY }> = heapless::Vec::new();
    // Windows never exceed SAMPLE_CAPACITY; anything past it is ignored.
    for &v in samples.iter().take(sorted.capacity()) {
        let _ = sorted.push(v);
    }
    sorted.sort_unstable();
    Some(sorted[(sorted.len() - 1) / 2])
}

pub fn max(samples: &[i32]) -> Option<i32> {
    samples.iter().copied().max()
}

pub fn min(samples: &[i32]) -> Option<i32> {
    samples.iter().copied().min()
}

/// Sample farthest from `previous`.
///
/// Two samples at the same distance on opposite sides of `previous` resolve
/// to the one above it; otherwise the earliest sample wins.
pub fn peak_deviation(samples: &[i32], previous: i32) -> Option<i32> {
    let mut best: Option<(i64, i32)> = None;
    for &v in samples {
        let distance = (v as i64 - previous as i64).abs();
        let better = match best {
            None => true,
            Some((d, b)) => distance > d || (distance == d && v > previous && b < previous),
        };
        if better {
            best = Some((distance, v));
        }
    }
    best.map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample_is_returned_by_every_reducer() {
        let one = [42];
        assert_eq!(mean(&one), Some(42));
        assert_eq!(median(&one), Some(42));
        assert_eq!(max(&one), Some(42));
        assert_eq!(min(&one), Some(42));
        assert_eq!(peak_deviation(&one, -1000), Some(42));
    }

    #[test]
    fn empty_window_has_no_value() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(peak_deviation(&[], 0), None);
    }

    #[test]
    fn mean_truncates() {
        assert_eq!(mean(&[1, 2]), Some(1));
        assert_eq!(mean(&[-1, -2]), Some(-1));
        assert_eq!(mean(&[i32::MAX, i32::MAX]), Some(i32::MAX));
    }

    #[test]
    fn median_even_count_takes_lower_middle() {
        for _ in 0..3 {
            assert_eq!(median(&[1, 2, 3, 4]), Some(2));
            assert_eq!(median(&[4, 3, 2, 1]), Some(2));
        }
        assert_eq!(median(&[9, 1, 5]), Some(5));
    }

    #[test]
    fn min_max_scan() {
        let s = [3, -7, 12, 0];
        assert_eq!(max(&s), Some(12));
        assert_eq!(min(&s), Some(-7));
    }

    #[test]
    fn peak_deviation_picks_farthest_from_previous() {
        assert_eq!(peak_deviation(&[5, 1, 9], 5), Some(9));
    }

    #[test]
    fn peak_deviation_opposite_side_tie_prefers_upward() {
        assert_eq!(peak_deviation(&[1, 9], 5), Some(9));
        assert_eq!(peak_deviation(&[9, 1], 5), Some(9));
    }

    #[test]
    fn peak_deviation_tie_breaks() {
        assert_eq!(peak_deviation(&[2, 8, 2], 5), Some(8));
        assert_eq!(peak_deviation(&[-3, 13], 5), Some(13));
        assert_eq!(peak_deviation(&[0, 1, 0], 5), Some(0));
    }
}
