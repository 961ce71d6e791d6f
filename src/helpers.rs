/// Size of the contiguous index range each worker task owns.
///
/// Partitioning depends only on the point count and the requested concurrency,
/// never on timing, so the same partitioning is reused across all phases and
/// iterations of a restart.
pub(crate) fn partition_size(point_cnt: usize, concurrency: usize) -> usize {
    ((point_cnt + concurrency - 1) / concurrency).max(1)
}

#[cfg(test)]
macro_rules! assert_approx_eq {
	($left: expr, $right: expr, $tol: expr) => ({
		match ($left, $right, $tol) {
			(left_val , right_val, tol_val) => {
				let delta = (left_val - right_val).abs();
				if !(delta < tol_val) {
					panic!(
						"assertion failed: `(left ≈ right)` \
						(left: `{}`, right: `{}`) \
						with ∆={:1.1e} (allowed ∆={:e})",
						left_val , right_val, delta, tol_val
					)
				}
			}
		}
	});
	($left: expr, $right: expr) => (assert_approx_eq!(($left), ($right), 1e-15))
}

#[cfg(test)]
mod tests {
    #[test]
    fn partition_size() {
        assert_eq!(super::partition_size(6, 1), 6);
        assert_eq!(super::partition_size(6, 2), 3);
        assert_eq!(super::partition_size(6, 4), 2);
        assert_eq!(super::partition_size(7, 4), 2);
        assert_eq!(super::partition_size(1, 8), 1);
        // Empty input still yields a legal chunk size.
        assert_eq!(super::partition_size(0, 4), 1);
    }

    #[test]
    fn partition_size_covers_all_points() {
        for n in 1..50 {
            for c in 1..10 {
                let size = super::partition_size(n, c);
                let chunks = (n + size - 1) / size;
                assert!(chunks <= c);
                assert!(chunks * size >= n);
            }
        }
    }
}
