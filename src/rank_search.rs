use crate::error::Error;

/// Error bound a reconstruction has to reach to count as converged.
pub const THRESHOLD: f64 = 1e-6;
/// Number of steps without a relevant change in error after which the search gives up.
pub const STALL_LIMIT: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct RankSearchOptions {
    pub threshold: f64,
    /// Overrides the default cap of `ceil(log2(upper rank)) + STALL_LIMIT` steps.
    pub max_iterations: Option<usize>,
}

impl Default for RankSearchOptions {
    fn default() -> Self {
        Self {
            threshold: THRESHOLD,
            max_iterations: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Searching,
    Converged,
    StalledAccepted,
    IterationCapReached,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankSearchOutcome {
    pub rank: usize,
    pub error: f64,
    pub iterations: usize,
    pub state: SearchState,
}

/// Something that can score the reconstruction at a given rank.
pub trait RankEvaluator {
    /// Largest rank that may be evaluated. Ranks start at 1.
    fn upper_rank(&self) -> usize;

    fn evaluate(&mut self, rank: usize) -> crate::Result<f64>;
}

#[derive(Clone, Copy)]
struct Candidate {
    rank: usize,
    error: f64,
}

impl Candidate {
    fn update(&mut self, rank: usize, error: f64) {
        if error < self.error || (error == self.error && rank < self.rank) {
            self.rank = rank;
            self.error = error;
        }
    }
}

pub struct RankSelector {
    options: RankSearchOptions,
}

impl RankSelector {
    pub fn new(options: RankSearchOptions) -> Self {
        Self { options }
    }

    pub fn iteration_cap(&self, upper_rank: usize) -> usize {
        self.options
            .max_iterations
            .unwrap_or_else(|| ceil_log2(upper_rank) + STALL_LIMIT)
    }

    /// Bisects `[1, upper rank]` for a rank whose error is within the threshold.
    ///
    /// The interval is narrowed from above when the error at the midpoint got
    /// worse than at the previous rank and from below otherwise. Once the
    /// midpoint equals the current rank the upper end is probed instead. The
    /// search stops early after `STALL_LIMIT` steps whose error changed by less
    /// than the threshold, when the interval collapsed, or when the iteration
    /// cap is hit. In all of these cases the best rank seen so far is returned.
    pub fn select<E>(&self, evaluator: &mut E) -> crate::Result<RankSearchOutcome>
    where
        E: RankEvaluator + ?Sized,
    {
        let upper_rank = evaluator.upper_rank();
        if upper_rank == 0 {
            return Err(Error::EmptyImage);
        }
        let threshold = self.options.threshold;
        let iteration_cap = self.iteration_cap(upper_rank);

        let (mut lower, mut upper) = (1, upper_rank);
        let mut rank = lower;
        let mut error = evaluator.evaluate(rank)?;
        let mut best = Candidate { rank, error };
        let mut stalls = 0;
        let mut iterations = 0;
        log::debug!("Rank {} has error {:e}", rank, error);

        let state = loop {
            if error <= threshold {
                break SearchState::Converged;
            }
            if stalls >= STALL_LIMIT {
                break SearchState::StalledAccepted;
            }
            if iterations >= iteration_cap {
                break SearchState::IterationCapReached;
            }
            let mut candidate = (lower + upper) / 2;
            if candidate == rank {
                candidate = upper;
            }
            if candidate == rank {
                break SearchState::StalledAccepted;
            }

            iterations += 1;
            let new_error = evaluator.evaluate(candidate)?;
            log::debug!(
                "Rank {} has error {:e}, interval [{}, {}]",
                candidate,
                new_error,
                lower,
                upper
            );
            if new_error > error {
                upper = candidate;
            } else {
                lower = candidate;
            }
            if (new_error - error).abs() < threshold {
                stalls = (stalls + 1).min(STALL_LIMIT);
            }
            best.update(candidate, new_error);
            rank = candidate;
            error = new_error;
        };

        let outcome = match state {
            SearchState::Converged => RankSearchOutcome {
                rank,
                error,
                iterations,
                state,
            },
            _ => RankSearchOutcome {
                rank: best.rank,
                error: best.error,
                iterations,
                state,
            },
        };
        log::info!(
            "Rank search finished as {:?} after {} iterations with rank {} (error {:e})",
            outcome.state,
            outcome.iterations,
            outcome.rank,
            outcome.error
        );
        Ok(outcome)
    }
}

fn ceil_log2(value: usize) -> usize {
    if value <= 1 {
        return 0;
    }
    (usize::BITS - (value - 1).leading_zeros()) as usize
}

#[cfg(test)]
mod test {
    use super::{
        ceil_log2, RankEvaluator, RankSearchOptions, RankSelector, SearchState, STALL_LIMIT,
    };
    use crate::error::Error;

    struct CurveEvaluator<F: Fn(usize) -> f64> {
        upper_rank: usize,
        curve: F,
        evaluated: Vec<usize>,
    }

    impl<F: Fn(usize) -> f64> CurveEvaluator<F> {
        fn new(upper_rank: usize, curve: F) -> Self {
            Self {
                upper_rank,
                curve,
                evaluated: Vec::new(),
            }
        }
    }

    impl<F: Fn(usize) -> f64> RankEvaluator for CurveEvaluator<F> {
        fn upper_rank(&self) -> usize {
            self.upper_rank
        }

        fn evaluate(&mut self, rank: usize) -> crate::Result<f64> {
            assert!(rank >= 1 && rank <= self.upper_rank, "rank {} out of range", rank);
            self.evaluated.push(rank);
            Ok((self.curve)(rank))
        }
    }

    fn default_selector() -> RankSelector {
        RankSelector::new(RankSearchOptions::default())
    }

    #[test]
    fn converges_immediately_when_rank_one_is_exact() {
        let mut evaluator = CurveEvaluator::new(4, |_| 0.0);
        let outcome = default_selector().select(&mut evaluator).unwrap();
        assert_eq!(outcome.state, SearchState::Converged);
        assert_eq!(outcome.rank, 1);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(evaluator.evaluated, vec![1]);
    }

    #[test]
    fn converges_on_monotone_curve() {
        let mut evaluator =
            CurveEvaluator::new(100, |rank| if rank >= 37 { 0.0 } else { (37 - rank) as f64 });
        let outcome = default_selector().select(&mut evaluator).unwrap();
        assert_eq!(outcome.state, SearchState::Converged);
        assert!(outcome.rank >= 37 && outcome.rank <= 100);
        assert_eq!(outcome.error, 0.0);
    }

    #[test]
    fn reaches_full_rank_when_only_full_rank_is_exact() {
        let upper_rank = 9;
        let mut evaluator = CurveEvaluator::new(upper_rank, move |rank| {
            (upper_rank - rank) as f64 * 0.25
        });
        let outcome = default_selector().select(&mut evaluator).unwrap();
        assert_eq!(outcome.state, SearchState::Converged);
        assert_eq!(outcome.rank, upper_rank);
    }

    #[test]
    fn plateau_stops_search() {
        let mut evaluator = CurveEvaluator::new(100, |_| 0.5);
        let outcome = default_selector().select(&mut evaluator).unwrap();
        assert_eq!(outcome.state, SearchState::StalledAccepted);
        assert_eq!(outcome.iterations, STALL_LIMIT);
        assert_eq!(outcome.rank, 1);
    }

    #[test]
    fn iteration_cap_returns_best_rank() {
        let options = RankSearchOptions {
            max_iterations: Some(1),
            ..RankSearchOptions::default()
        };
        let mut evaluator = CurveEvaluator::new(64, |rank| 1000.0 / rank as f64);
        let outcome = RankSelector::new(options).select(&mut evaluator).unwrap();
        assert_eq!(outcome.state, SearchState::IterationCapReached);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.rank, 32);
    }

    #[test]
    fn terminates_on_non_monotone_curves() {
        for upper_rank in [1, 2, 3, 17, 128, 513] {
            let mut evaluator =
                CurveEvaluator::new(upper_rank, |rank| 1.0 + ((rank * 7919) % 13) as f64);
            let selector = default_selector();
            let outcome = selector.select(&mut evaluator).unwrap();
            let cap = ceil_log2(upper_rank) + STALL_LIMIT;
            assert!(outcome.iterations <= cap);
            assert!(evaluator.evaluated.len() <= cap + 1);
            assert!(outcome.rank >= 1 && outcome.rank <= upper_rank);
            assert_ne!(outcome.state, SearchState::Searching);
        }
    }

    #[test]
    fn evaluator_errors_are_propagated() {
        struct FailingEvaluator;
        impl RankEvaluator for FailingEvaluator {
            fn upper_rank(&self) -> usize {
                10
            }
            fn evaluate(&mut self, _rank: usize) -> crate::Result<f64> {
                Err(Error::MissingImage)
            }
        }
        let result = default_selector().select(&mut FailingEvaluator);
        assert!(matches!(result, Err(Error::MissingImage)));
    }

    #[test]
    fn ceil_log2_values() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(480), 9);
    }
}
