//! Backtracking line search with Armijo sufficient decrease.
//!
//! Shared by the gradient-descent and conjugate-gradient solvers. The search
//! probes along a descent direction through the manifold's retraction, so
//! every trial point is feasible by construction.

use crate::{error::Result, manifold::Manifold, types::Scalar};
use num_traits::Float;

/// Parameters of the backtracking search.
#[derive(Debug, Clone, Copy)]
pub struct LineSearchParams<T: Scalar> {
    /// Trial step used on the very first call, before any step history
    /// exists. Divided by the direction norm.
    pub initial_step_size: T,
    /// Multiplicative backoff applied after each rejected trial.
    pub contraction_factor: T,
    /// Armijo constant c₁ in `f(x⁺) ≤ f(x) + c₁ α ⟨grad f, d⟩`.
    pub sufficient_decrease: T,
    /// Growth factor applied to the previous accepted step when seeding the
    /// next search.
    pub optimism: T,
    /// Maximum number of backoffs before the search gives up.
    pub max_backtracks: usize,
}

impl<T: Scalar> Default for LineSearchParams<T> {
    fn default() -> Self {
        Self {
            initial_step_size: T::one(),
            contraction_factor: <T as Scalar>::from_f64(0.5),
            sufficient_decrease: <T as Scalar>::from_f64(1e-4),
            optimism: <T as Scalar>::from_f64(2.0),
            max_backtracks: 25,
        }
    }
}

impl<T: Scalar> LineSearchParams<T> {
    /// Creates parameters with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial trial step.
    pub fn with_initial_step_size(mut self, step: T) -> Self {
        self.initial_step_size = step;
        self
    }

    /// Sets the backoff factor.
    pub fn with_contraction_factor(mut self, factor: T) -> Self {
        self.contraction_factor = factor;
        self
    }

    /// Sets the Armijo constant.
    pub fn with_sufficient_decrease(mut self, c1: T) -> Self {
        self.sufficient_decrease = c1;
        self
    }

    /// Sets the optimism factor.
    pub fn with_optimism(mut self, optimism: T) -> Self {
        self.optimism = optimism;
        self
    }

    /// Sets the backtrack budget.
    pub fn with_max_backtracks(mut self, max: usize) -> Self {
        self.max_backtracks = max;
        self
    }
}

/// Outcome of one line search.
#[derive(Debug, Clone)]
pub struct LineSearchResult<T: Scalar, P> {
    /// Accepted (or best-effort) step size along the search direction.
    pub step_size: T,
    /// Point reached by retracting the scaled direction.
    pub new_point: P,
    /// Objective value at `new_point`.
    pub new_cost: T,
    /// Whether the Armijo condition was satisfied. `false` marks a stalled
    /// search; the result still carries the best trial seen.
    pub success: bool,
    /// Number of cost evaluations spent.
    pub function_evals: usize,
}

/// Armijo backtracking search with an adaptive initial step.
///
/// The searcher is stateful across iterations of the same solver run: the
/// previous accepted step seeds the next initial trial (scaled by
/// `optimism`), which keeps step sizes in the right regime without a
/// quadratic interpolation model.
#[derive(Debug, Clone)]
pub struct BacktrackingLineSearch<T: Scalar> {
    params: LineSearchParams<T>,
    previous_step: Option<T>,
}

impl<T: Scalar> BacktrackingLineSearch<T> {
    /// Creates a searcher with the given parameters.
    pub fn new(params: LineSearchParams<T>) -> Self {
        Self {
            params,
            previous_step: None,
        }
    }

    /// The search parameters.
    pub fn params(&self) -> &LineSearchParams<T> {
        &self.params
    }

    /// Forgets the step-size history, as after a direction restart.
    pub fn reset(&mut self) {
        self.previous_step = None;
    }

    /// Searches along `direction` from `point`.
    ///
    /// `cost` and `directional_derivative` are the objective value and
    /// ⟨grad f, direction⟩ at `point`; the derivative must be negative for
    /// a meaningful search. The objective is evaluated through `cost_fn`,
    /// one call per trial point.
    ///
    /// When every trial within the backtrack budget violates the Armijo
    /// condition the search returns the lowest-cost trial seen with
    /// `success = false` instead of failing; the caller's stopping criteria
    /// turn a persistent stall into termination.
    pub fn search<M, F>(
        &mut self,
        manifold: &M,
        mut cost_fn: F,
        point: &M::Point,
        direction: &M::TangentVector,
        cost: T,
        directional_derivative: T,
    ) -> Result<LineSearchResult<T, M::Point>>
    where
        M: Manifold<T>,
        F: FnMut(&M::Point) -> Result<T>,
    {
        let direction_norm = manifold.norm(point, direction)?;
        if !<T as Float>::is_finite(direction_norm) || direction_norm <= T::zero() {
            // A zero or broken direction admits no trial step; report a
            // stalled search at the current point.
            return Ok(LineSearchResult {
                step_size: T::zero(),
                new_point: point.clone(),
                new_cost: cost,
                success: false,
                function_evals: 0,
            });
        }

        let mut alpha = match self.previous_step {
            Some(previous) => previous * self.params.optimism,
            None => self.params.initial_step_size / direction_norm,
        };
        if !<T as Float>::is_finite(alpha) || alpha <= T::zero() {
            alpha = self.params.initial_step_size / direction_norm;
        }

        let threshold = self.params.sufficient_decrease * directional_derivative;

        let mut function_evals = 0;
        let mut best: Option<(T, M::Point, T)> = None;

        for _ in 0..=self.params.max_backtracks {
            let scaled = manifold.scale_tangent(point, alpha, direction)?;
            let candidate = manifold.retract(point, &scaled)?;
            let candidate_cost = cost_fn(&candidate)?;
            function_evals += 1;

            if candidate_cost <= cost + alpha * threshold {
                self.previous_step = Some(alpha);
                return Ok(LineSearchResult {
                    step_size: alpha,
                    new_point: candidate,
                    new_cost: candidate_cost,
                    success: true,
                    function_evals,
                });
            }

            let better = match &best {
                Some((best_cost, _, _)) => candidate_cost < *best_cost,
                None => true,
            };
            if better {
                best = Some((candidate_cost, candidate, alpha));
            }

            alpha = alpha * self.params.contraction_factor;
        }

        // Stalled: hand back the best trial and let the caller's step-size
        // criterion decide whether to stop.
        let (best_cost, best_point, best_alpha) = best.ok_or_else(|| {
            crate::error::ManifoldError::numerical_error("line search evaluated no trial points")
        })?;
        self.previous_step = Some(best_alpha);
        Ok(LineSearchResult {
            step_size: best_alpha,
            new_point: best_point,
            new_cost: best_cost,
            success: false,
            function_evals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEuclidean;
    use crate::types::DVector;
    use approx::assert_relative_eq;

    fn quadratic(x: &DVector<f64>) -> Result<f64> {
        Ok(0.5 * x.norm_squared())
    }

    #[test]
    fn test_accepts_full_step_on_quadratic() {
        let manifold = TestEuclidean::new(2);
        let mut search = BacktrackingLineSearch::new(LineSearchParams::default());
        let x = DVector::from_vec(vec![1.0, 0.0]);
        let direction = DVector::from_vec(vec![-1.0, 0.0]);
        // grad f = x, so <grad, d> = -1.
        let result = search
            .search(&manifold, quadratic, &x, &direction, 0.5, -1.0)
            .unwrap();
        assert!(result.success);
        assert!(result.new_cost < 0.5);
        assert_relative_eq!(result.step_size, 1.0);
    }

    #[test]
    fn test_adaptive_initial_step_grows() {
        let manifold = TestEuclidean::new(1);
        let mut search = BacktrackingLineSearch::new(LineSearchParams::default());
        let x = DVector::from_vec(vec![4.0]);
        let d = DVector::from_vec(vec![-1.0]);
        let first = search.search(&manifold, quadratic, &x, &d, 8.0, -4.0).unwrap();
        assert!(first.success);

        // Second call seeds from the previous step times the optimism
        // factor, then backtracks as needed.
        let x2 = first.new_point.clone();
        let cost2 = first.new_cost;
        let d2 = -x2.clone();
        let ddf2 = -x2.norm_squared();
        let second = search.search(&manifold, quadratic, &x2, &d2, cost2, ddf2).unwrap();
        assert!(second.success);
        assert!(second.new_cost <= cost2);
    }

    #[test]
    fn test_stall_returns_best_seen() {
        let manifold = TestEuclidean::new(1);
        let params = LineSearchParams::default().with_max_backtracks(3);
        let mut search = BacktrackingLineSearch::new(params);
        let x = DVector::from_vec(vec![0.0]);
        let d = DVector::from_vec(vec![1.0]);
        // Ascent direction with a claimed negative derivative: every trial
        // increases the cost, so the Armijo test always fails.
        let result = search.search(&manifold, quadratic, &x, &d, 0.0, -1.0).unwrap();
        assert!(!result.success);
        assert_eq!(result.function_evals, 4);
        // The smallest trial step produced the least-bad point.
        assert_relative_eq!(result.step_size, 0.125);
    }

    #[test]
    fn test_zero_direction_stalls_without_trials() {
        let manifold = TestEuclidean::new(2);
        let mut search = BacktrackingLineSearch::new(LineSearchParams::default());
        let x = DVector::from_vec(vec![1.0, -2.0]);
        let zero = DVector::zeros(2);
        let result = search.search(&manifold, quadratic, &x, &zero, 2.5, 0.0).unwrap();
        assert!(!result.success);
        assert_eq!(result.function_evals, 0);
        assert_eq!(result.step_size, 0.0);
        assert!(result.new_cost.is_finite());
        assert_relative_eq!(result.new_point, x);
        // The stall leaves no step history behind.
        let follow_up = search.search(
            &manifold,
            quadratic,
            &x,
            &DVector::from_vec(vec![-1.0, 2.0]),
            2.5,
            -5.0,
        )
        .unwrap();
        assert!(follow_up.step_size.is_finite() && follow_up.step_size > 0.0);
    }

    #[test]
    fn test_reset_forgets_history() {
        let manifold = TestEuclidean::new(1);
        let mut search = BacktrackingLineSearch::new(LineSearchParams::default());
        let x = DVector::from_vec(vec![1.0]);
        let d = DVector::from_vec(vec![-1.0]);
        search.search(&manifold, quadratic, &x, &d, 0.5, -1.0).unwrap();
        search.reset();
        let result = search.search(&manifold, quadratic, &x, &d, 0.5, -1.0).unwrap();
        // After a reset the initial step is normalized by the direction
        // norm again.
        assert_relative_eq!(result.step_size, 1.0);
    }
}
