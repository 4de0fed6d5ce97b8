//! Solver-facing machinery: stopping criteria, run state, and results.
//!
//! Every solver in this workspace follows the same outer loop: evaluate the
//! objective, check the [`StoppingCriterion`], compute a step, advance. The
//! types here hold the pieces that loop shares across algorithms — the
//! per-run [`OptimizerState`], the [`ConvergenceChecker`] that evaluates the
//! criteria in a fixed order, and the [`OptimizationResult`] returned to the
//! caller with its per-iteration history.

use crate::{
    cost::CostFunction,
    error::{Result, SolverResult},
    manifold::Manifold,
    problem::Problem,
    types::Scalar,
};
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Reason a solver run terminated.
///
/// Reaching an iteration or time budget is a normal terminal state, not an
/// error; only misconfiguration aborts a run with an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Gradient norm fell below the tolerance (first-order optimality), or a
    /// progress-based tolerance (function or point change) was satisfied.
    Converged,
    /// Objective value reached the user-specified target.
    TargetReached,
    /// The derivative-free solver's simplex diameter collapsed.
    SimplexCollapsed,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Wall-clock budget exhausted.
    MaxTime,
    /// Function-evaluation budget exhausted.
    MaxFunctionEvaluations,
    /// Accepted steps shrank below the minimum step size (persistent
    /// line-search stall).
    StepSizeBelowMinimum,
    /// A callback requested early termination.
    CallbackRequested,
}

impl TerminationReason {
    /// Whether this reason indicates convergence rather than budget
    /// exhaustion.
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            Self::Converged | Self::TargetReached | Self::SimplexCollapsed
        )
    }
}

/// Stopping criteria evaluated at the top of every outer iteration.
///
/// All thresholds are optional; the defaults follow common published
/// choices. The first satisfied criterion terminates the loop, which is also
/// the cooperative cancellation point: an in-flight oracle call or
/// line-search backtrack always completes before a time budget is observed.
#[derive(Debug, Clone)]
pub struct StoppingCriterion<T: Scalar> {
    /// Maximum number of outer iterations.
    pub max_iterations: Option<usize>,
    /// Wall-clock budget.
    pub max_time: Option<Duration>,
    /// Maximum number of cost evaluations.
    pub max_function_evaluations: Option<usize>,
    /// Riemannian gradient-norm tolerance.
    pub gradient_tolerance: Option<T>,
    /// Tolerance on the change in objective value between iterations.
    pub function_tolerance: Option<T>,
    /// Tolerance on the manifold distance between successive iterates.
    pub point_tolerance: Option<T>,
    /// Minimum accepted step size before the run is declared stalled.
    pub min_step_size: Option<T>,
    /// Stop as soon as the objective value is at or below this target.
    pub target_value: Option<T>,
}

impl<T: Scalar> Default for StoppingCriterion<T> {
    fn default() -> Self {
        Self {
            max_iterations: Some(1000),
            max_time: None,
            max_function_evaluations: None,
            gradient_tolerance: Some(<T as Scalar>::from_f64(1e-6)),
            function_tolerance: Some(<T as Scalar>::from_f64(1e-9)),
            point_tolerance: Some(<T as Scalar>::from_f64(1e-9)),
            min_step_size: Some(<T as Scalar>::from_f64(1e-10)),
            target_value: None,
        }
    }
}

impl<T: Scalar> StoppingCriterion<T> {
    /// Creates a criterion with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = Some(max_iter);
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Sets the function-evaluation budget.
    pub fn with_max_function_evaluations(mut self, max_evals: usize) -> Self {
        self.max_function_evaluations = Some(max_evals);
        self
    }

    /// Sets the gradient-norm tolerance.
    pub fn with_gradient_tolerance(mut self, tol: T) -> Self {
        self.gradient_tolerance = Some(tol);
        self
    }

    /// Sets the function-change tolerance.
    pub fn with_function_tolerance(mut self, tol: T) -> Self {
        self.function_tolerance = Some(tol);
        self
    }

    /// Sets the point-change tolerance.
    pub fn with_point_tolerance(mut self, tol: T) -> Self {
        self.point_tolerance = Some(tol);
        self
    }

    /// Sets the minimum accepted step size.
    pub fn with_min_step_size(mut self, min_step: T) -> Self {
        self.min_step_size = Some(min_step);
        self
    }

    /// Sets the target objective value.
    pub fn with_target_value(mut self, target: T) -> Self {
        self.target_value = Some(target);
        self
    }
}

/// One entry of the per-iteration diagnostic log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord<T: Scalar> {
    /// Outer iteration index.
    pub iteration: usize,
    /// Objective value at this iterate.
    pub cost: T,
    /// Riemannian gradient norm, when the algorithm computes one.
    pub gradient_norm: Option<T>,
    /// Step size accepted at this iteration, when applicable.
    pub step_size: Option<T>,
    /// Elapsed wall-clock time since the run started.
    pub elapsed: Duration,
}

/// Result of a solver run.
#[derive(Debug, Clone)]
pub struct OptimizationResult<T: Scalar, P> {
    /// Final iterate.
    pub point: P,
    /// Objective value at the final iterate.
    pub value: T,
    /// Riemannian gradient norm at the final iterate (gradient-based
    /// solvers only).
    pub gradient_norm: Option<T>,
    /// Number of outer iterations performed.
    pub iterations: usize,
    /// Number of cost evaluations.
    pub function_evaluations: usize,
    /// Number of gradient evaluations.
    pub gradient_evaluations: usize,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Which stopping criterion fired.
    pub termination_reason: TerminationReason,
    /// Whether the run converged (as opposed to exhausting a budget).
    pub converged: bool,
    /// Per-iteration diagnostic log.
    pub history: Vec<IterationRecord<T>>,
}

impl<T: Scalar, P> OptimizationResult<T, P> {
    /// Creates a result record.
    pub fn new(
        point: P,
        value: T,
        iterations: usize,
        duration: Duration,
        termination_reason: TerminationReason,
    ) -> Self {
        Self {
            point,
            value,
            gradient_norm: None,
            iterations,
            function_evaluations: 0,
            gradient_evaluations: 0,
            duration,
            termination_reason,
            converged: termination_reason.is_converged(),
            history: Vec::new(),
        }
    }

    /// Sets the final gradient norm.
    pub fn with_gradient_norm(mut self, norm: T) -> Self {
        self.gradient_norm = Some(norm);
        self
    }

    /// Sets the function-evaluation count.
    pub fn with_function_evaluations(mut self, count: usize) -> Self {
        self.function_evaluations = count;
        self
    }

    /// Sets the gradient-evaluation count.
    pub fn with_gradient_evaluations(mut self, count: usize) -> Self {
        self.gradient_evaluations = count;
        self
    }

    /// Attaches the per-iteration history.
    pub fn with_history(mut self, history: Vec<IterationRecord<T>>) -> Self {
        self.history = history;
        self
    }
}

/// Mutable per-run state shared by the gradient-based solvers.
///
/// Constructed fresh for every call to `optimize`; solvers never keep state
/// across runs except explicit diagnostics.
#[derive(Debug, Clone)]
pub struct OptimizerState<T: Scalar, P, V> {
    /// Current iterate.
    pub point: P,
    /// Objective value at the current iterate.
    pub value: T,
    /// Previous iterate, once one exists.
    pub previous_point: Option<P>,
    /// Objective value at the previous iterate.
    pub previous_value: Option<T>,
    /// Riemannian gradient at the current iterate.
    pub gradient: Option<V>,
    /// Norm of the current Riemannian gradient.
    pub gradient_norm: Option<T>,
    /// Step size accepted at the last iteration.
    pub step_size: Option<T>,
    /// Outer iteration counter.
    pub iteration: usize,
    /// Cost evaluations so far.
    pub function_evaluations: usize,
    /// Gradient evaluations so far.
    pub gradient_evaluations: usize,
    /// Instant the run started.
    pub start_time: Instant,
}

impl<T: Scalar, P, V> OptimizerState<T, P, V> {
    /// Creates the state for a run starting at `point` with value `value`.
    pub fn new(point: P, value: T) -> Self {
        Self {
            point,
            value,
            previous_point: None,
            previous_value: None,
            gradient: None,
            gradient_norm: None,
            step_size: None,
            iteration: 0,
            function_evaluations: 1,
            gradient_evaluations: 0,
            start_time: Instant::now(),
        }
    }

    /// Advances to a new iterate, retaining the previous one for the
    /// progress-based stopping tests.
    pub fn update(&mut self, new_point: P, new_value: T)
    where
        P: Clone,
    {
        self.previous_point = Some(std::mem::replace(&mut self.point, new_point));
        self.previous_value = Some(self.value);
        self.value = new_value;
        self.iteration += 1;
    }

    /// Records the current Riemannian gradient and its norm.
    pub fn set_gradient(&mut self, gradient: V, norm: T) {
        self.gradient = Some(gradient);
        self.gradient_norm = Some(norm);
        self.gradient_evaluations += 1;
    }

    /// Elapsed wall-clock time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Evaluates stopping criteria against a run's state.
#[derive(Debug)]
pub struct ConvergenceChecker;

impl ConvergenceChecker {
    /// Returns the first satisfied criterion, or `None` to keep iterating.
    ///
    /// Order: target value, gradient norm, function change, point change,
    /// step size, then the iteration/time/evaluation budgets.
    pub fn check<T, M, P, V>(
        state: &OptimizerState<T, P, V>,
        manifold: &M,
        criterion: &StoppingCriterion<T>,
    ) -> Result<Option<TerminationReason>>
    where
        T: Scalar,
        M: Manifold<T, Point = P>,
        P: Clone + Debug + Send + Sync,
    {
        if let Some(target) = criterion.target_value {
            if state.value <= target {
                return Ok(Some(TerminationReason::TargetReached));
            }
        }

        if let (Some(tol), Some(norm)) = (criterion.gradient_tolerance, state.gradient_norm) {
            if norm < tol {
                return Ok(Some(TerminationReason::Converged));
            }
        }

        if let (Some(tol), Some(previous)) = (criterion.function_tolerance, state.previous_value)
        {
            if num_traits::Float::abs(state.value - previous) < tol {
                return Ok(Some(TerminationReason::Converged));
            }
        }

        if let (Some(tol), Some(previous)) =
            (criterion.point_tolerance, state.previous_point.as_ref())
        {
            if manifold.distance(previous, &state.point)? < tol {
                return Ok(Some(TerminationReason::Converged));
            }
        }

        if let (Some(min_step), Some(step)) = (criterion.min_step_size, state.step_size) {
            if step < min_step {
                return Ok(Some(TerminationReason::StepSizeBelowMinimum));
            }
        }

        if let Some(max_iter) = criterion.max_iterations {
            if state.iteration >= max_iter {
                return Ok(Some(TerminationReason::MaxIterations));
            }
        }

        if let Some(max_time) = criterion.max_time {
            if state.elapsed() >= max_time {
                return Ok(Some(TerminationReason::MaxTime));
            }
        }

        if let Some(max_evals) = criterion.max_function_evaluations {
            if state.function_evaluations >= max_evals {
                return Ok(Some(TerminationReason::MaxFunctionEvaluations));
            }
        }

        Ok(None)
    }
}

/// Common interface implemented by every solver.
pub trait Optimizer<T: Scalar>: Debug {
    /// Human-readable algorithm name.
    fn name(&self) -> &str;

    /// Minimizes `problem` starting from `initial_point`.
    fn optimize<M, C>(
        &mut self,
        problem: &Problem<T, M, C>,
        initial_point: &M::Point,
        criterion: &StoppingCriterion<T>,
    ) -> SolverResult<OptimizationResult<T, M::Point>>
    where
        M: Manifold<T>,
        C: CostFunction<T, Point = M::Point, TangentVector = M::TangentVector>;
}
