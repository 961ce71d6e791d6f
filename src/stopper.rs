/// Pure halt decision for the main iteration loop.
///
/// The loop stops when the iteration cap is reached, when a round produced no
/// swaps at all, or when the fraction of points that changed cluster this
/// round fell below the configured delta threshold. A threshold of `0` means
/// "stop only on zero swaps or the iteration cap".
#[derive(Clone, Copy, Debug)]
pub(crate) struct IterationStopper {
    max_iterations: usize,
    delta_threshold: f64,
    point_cnt: usize,
}

impl IterationStopper {
    pub fn new(max_iterations: usize, delta_threshold: f64, point_cnt: usize) -> Self {
        Self {
            max_iterations,
            delta_threshold,
            point_cnt,
        }
    }

    pub fn should_stop(&self, swaps_this_round: usize, iteration: usize) -> bool {
        if iteration >= self.max_iterations || swaps_this_round == 0 {
            return true;
        }
        (swaps_this_round as f64) < self.delta_threshold * (self.point_cnt as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_iteration_cap() {
        let stopper = IterationStopper::new(5, 0.0, 100);
        assert_eq!(stopper.should_stop(50, 4), false);
        assert_eq!(stopper.should_stop(50, 5), true);
        assert_eq!(stopper.should_stop(50, 6), true);
    }

    #[test]
    fn stops_on_zero_swaps() {
        let stopper = IterationStopper::new(100, 0.0, 100);
        assert_eq!(stopper.should_stop(1, 1), false);
        assert_eq!(stopper.should_stop(0, 1), true);
    }

    #[test]
    fn zero_threshold_never_stops_on_nonzero_swaps() {
        let stopper = IterationStopper::new(1000, 0.0, 10);
        for iteration in 1..1000 {
            assert_eq!(stopper.should_stop(1, iteration), false);
        }
    }

    #[test]
    fn stops_below_swap_fraction() {
        // 5% of 100 points = 5 swaps; strictly fewer stops the loop.
        let stopper = IterationStopper::new(100, 0.05, 100);
        assert_eq!(stopper.should_stop(6, 1), false);
        assert_eq!(stopper.should_stop(5, 1), false);
        assert_eq!(stopper.should_stop(4, 1), true);
    }

    #[test]
    fn full_threshold_stops_immediately() {
        let stopper = IterationStopper::new(100, 1.0, 100);
        assert_eq!(stopper.should_stop(99, 1), true);
        // All points swapping is not below a threshold of 1.0.
        assert_eq!(stopper.should_stop(100, 1), false);
    }
}
