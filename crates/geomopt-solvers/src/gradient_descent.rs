//! Riemannian steepest descent.
//!
//! The simplest gradient-based solver: move along the negative Riemannian
//! gradient, pick the step with a backtracking Armijo search, retract back
//! onto the manifold. Robust and cheap per iteration; linear local
//! convergence.

use geomopt_core::{
    callback::{CallbackInfo, NoOpCallback, OptimizationCallback},
    cost::CostFunction,
    error::{SolverError, SolverResult},
    line_search::{BacktrackingLineSearch, LineSearchParams},
    manifold::Manifold,
    problem::Problem,
    solver::{
        ConvergenceChecker, IterationRecord, OptimizationResult, Optimizer, OptimizerState,
        StoppingCriterion, TerminationReason,
    },
    types::Scalar,
};

/// Configuration for [`GradientDescent`].
#[derive(Debug, Clone)]
pub struct GradientDescentConfig<T: Scalar> {
    /// Parameters of the backtracking line search.
    pub line_search_params: LineSearchParams<T>,
}

impl<T: Scalar> Default for GradientDescentConfig<T> {
    fn default() -> Self {
        Self {
            line_search_params: LineSearchParams::default(),
        }
    }
}

impl<T: Scalar> GradientDescentConfig<T> {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line search parameters.
    pub fn with_line_search_params(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search_params = params;
        self
    }
}

/// Riemannian steepest descent with Armijo line search.
#[derive(Debug, Clone)]
pub struct GradientDescent<T: Scalar> {
    config: GradientDescentConfig<T>,
}

impl<T: Scalar> Default for GradientDescent<T> {
    fn default() -> Self {
        Self::new(GradientDescentConfig::default())
    }
}

impl<T: Scalar> GradientDescent<T> {
    /// Creates a solver with the given configuration.
    pub fn new(config: GradientDescentConfig<T>) -> Self {
        Self { config }
    }

    /// The solver configuration.
    pub fn config(&self) -> &GradientDescentConfig<T> {
        &self.config
    }

    /// Minimizes `problem`, reporting progress to `callback`.
    pub fn optimize_with_callback<M, C>(
        &mut self,
        problem: &Problem<T, M, C>,
        initial_point: &M::Point,
        criterion: &StoppingCriterion<T>,
        callback: &mut dyn OptimizationCallback<T>,
    ) -> SolverResult<OptimizationResult<T, M::Point>>
    where
        M: Manifold<T>,
        C: CostFunction<T, Point = M::Point, TangentVector = M::TangentVector>,
    {
        let manifold = problem.manifold();
        if !manifold.is_point_on_manifold(initial_point, <T as Scalar>::MANIFOLD_TOLERANCE) {
            return Err(SolverError::invalid_initial_point(format!(
                "point does not satisfy the {} constraint",
                manifold.name()
            )));
        }

        let initial_cost = problem.cost(initial_point)?;
        let mut state: OptimizerState<T, M::Point, M::TangentVector> =
            OptimizerState::new(initial_point.clone(), initial_cost);
        let mut line_search = BacktrackingLineSearch::new(self.config.line_search_params);
        let mut history: Vec<IterationRecord<T>> = Vec::new();

        callback.on_start()?;

        let reason = loop {
            let gradient = problem.riemannian_gradient(&state.point)?;
            let gradient_norm = manifold.norm(&state.point, &gradient)?;
            let direction = manifold.scale_tangent(&state.point, -T::one(), &gradient)?;
            state.set_gradient(gradient, gradient_norm);

            history.push(IterationRecord {
                iteration: state.iteration,
                cost: state.value,
                gradient_norm: Some(gradient_norm),
                step_size: state.step_size,
                elapsed: state.elapsed(),
            });

            let info = CallbackInfo {
                iteration: state.iteration,
                cost: state.value,
                gradient_norm: Some(gradient_norm),
                elapsed: state.elapsed(),
            };
            if !callback.on_iteration(&info)? {
                break TerminationReason::CallbackRequested;
            }

            if let Some(reason) = ConvergenceChecker::check(&state, manifold, criterion)? {
                break reason;
            }

            let directional_derivative = -gradient_norm * gradient_norm;

            let ls = line_search.search(
                manifold,
                |p| problem.cost(p),
                &state.point,
                &direction,
                state.value,
                directional_derivative,
            )?;
            state.function_evaluations += ls.function_evals;
            // A stalled search still yields the best trial; the step-size
            // criterion terminates the run if stalls persist.
            state.step_size = Some(ls.step_size);
            state.update(ls.new_point, ls.new_cost);
        };

        let final_info = CallbackInfo {
            iteration: state.iteration,
            cost: state.value,
            gradient_norm: state.gradient_norm,
            elapsed: state.elapsed(),
        };
        callback.on_end(&final_info)?;

        let mut result = OptimizationResult::new(
            state.point,
            state.value,
            state.iteration,
            state.start_time.elapsed(),
            reason,
        )
        .with_function_evaluations(state.function_evaluations)
        .with_gradient_evaluations(state.gradient_evaluations)
        .with_history(history);
        if let Some(norm) = state.gradient_norm {
            result = result.with_gradient_norm(norm);
        }
        Ok(result)
    }
}

impl<T: Scalar> Optimizer<T> for GradientDescent<T> {
    fn name(&self) -> &str {
        "Riemannian Gradient Descent"
    }

    fn optimize<M, C>(
        &mut self,
        problem: &Problem<T, M, C>,
        initial_point: &M::Point,
        criterion: &StoppingCriterion<T>,
    ) -> SolverResult<OptimizationResult<T, M::Point>>
    where
        M: Manifold<T>,
        C: CostFunction<T, Point = M::Point, TangentVector = M::TangentVector>,
    {
        self.optimize_with_callback(problem, initial_point, criterion, &mut NoOpCallback)
    }
}
