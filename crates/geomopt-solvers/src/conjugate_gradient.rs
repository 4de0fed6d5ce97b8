//! Riemannian nonlinear conjugate gradient.
//!
//! Combines the current negative gradient with the previous search
//! direction, transported into the current tangent space. Three classical
//! beta rules are available; all of them degrade gracefully to steepest
//! descent through restarts:
//!
//! - an opt-in Powell restart when successive gradients lose orthogonality,
//! - a restart whenever the combined direction fails to be a descent
//!   direction,
//! - the Polak–Ribière rule additionally clips negative betas to zero.

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
use num_traits::Float;

/// Rule used to compute the conjugacy coefficient β.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetaRule {
    /// β = ‖g⁺‖² / ‖g‖².
    FletcherReeves,
    /// β = ⟨g⁺, g⁺ − 𝒯g⟩ / ‖g‖², clipped at zero. The default.
    PolakRibiere,
    /// β = ⟨g⁺, g⁺ − 𝒯g⟩ / ⟨g⁺ − 𝒯g, 𝒯d⟩, clipped at zero, falling back to
    /// β = 1 when the denominator vanishes.
    HestenesStiefel,
}

/// Configuration for [`ConjugateGradient`].
#[derive(Debug, Clone)]
pub struct ConjugateGradientConfig<T: Scalar> {
    /// Beta rule to use.
    pub beta_rule: BetaRule,
    /// Powell restart threshold: restart when
    /// |⟨g⁺, 𝒯g⟩| / ‖g⁺‖² exceeds this value. Infinite by default, which
    /// disables the restart; enable it with a finite threshold such as 0.1.
    pub orth_threshold: T,
    /// Parameters of the backtracking line search.
    pub line_search_params: LineSearchParams<T>,
}

impl<T: Scalar> Default for ConjugateGradientConfig<T> {
    fn default() -> Self {
        Self {
            beta_rule: BetaRule::PolakRibiere,
            orth_threshold: <T as Float>::infinity(),
            line_search_params: LineSearchParams::default(),
        }
    }
}

impl<T: Scalar> ConjugateGradientConfig<T> {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the beta rule.
    pub fn with_beta_rule(mut self, rule: BetaRule) -> Self {
        self.beta_rule = rule;
        self
    }

    /// Sets the Powell restart threshold.
    pub fn with_orth_threshold(mut self, threshold: T) -> Self {
        self.orth_threshold = threshold;
        self
    }

    /// Sets the line search parameters.
    pub fn with_line_search_params(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search_params = params;
        self
    }
}

/// Riemannian nonlinear conjugate gradient solver.
#[derive(Debug, Clone)]
pub struct ConjugateGradient<T: Scalar> {
    config: ConjugateGradientConfig<T>,
}

impl<T: Scalar> Default for ConjugateGradient<T> {
    fn default() -> Self {
        Self::new(ConjugateGradientConfig::default())
    }
}

impl<T: Scalar> ConjugateGradient<T> {
    /// Creates a solver with the given configuration.
    pub fn new(config: ConjugateGradientConfig<T>) -> Self {
        Self { config }
    }

    /// The solver configuration.
    pub fn config(&self) -> &ConjugateGradientConfig<T> {
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

        // Direction memory from the previous iteration, anchored at the
        // previous point.
        let mut previous: Option<(M::Point, M::TangentVector, M::TangentVector, T)> = None;

        callback.on_start()?;

        let reason = loop {
            let gradient = problem.riemannian_gradient(&state.point)?;
            let gradient_norm = manifold.norm(&state.point, &gradient)?;
            let gradient_norm_sq = gradient_norm * gradient_norm;

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
                state.set_gradient(gradient, gradient_norm);
                break TerminationReason::CallbackRequested;
            }

            state.gradient_norm = Some(gradient_norm);
            if let Some(reason) = ConvergenceChecker::check(&state, manifold, criterion)? {
                state.set_gradient(gradient, gradient_norm);
                break reason;
            }

            let direction = match previous.take() {
                None => manifold.scale_tangent(&state.point, -T::one(), &gradient)?,
                Some((prev_point, prev_gradient, prev_direction, prev_norm_sq)) => {
                    let transported_grad =
                        manifold.transport(&prev_point, &state.point, &prev_gradient)?;
                    let transported_dir =
                        manifold.transport(&prev_point, &state.point, &prev_direction)?;

                    let overlap =
                        manifold.inner_product(&state.point, &gradient, &transported_grad)?;
                    let powell_restart = gradient_norm_sq > T::zero()
                        && <T as Float>::abs(overlap) / gradient_norm_sq
                            >= self.config.orth_threshold;

                    let beta = if powell_restart {
                        T::zero()
                    } else {
                        self.beta(
                            manifold,
                            &state.point,
                            &gradient,
                            gradient_norm_sq,
                            &transported_grad,
                            &transported_dir,
                            prev_norm_sq,
                        )?
                    };

                    if beta == T::zero() {
                        manifold.scale_tangent(&state.point, -T::one(), &gradient)?
                    } else {
                        let neg_grad =
                            manifold.scale_tangent(&state.point, -T::one(), &gradient)?;
                        manifold.axpy_tangent(&state.point, beta, &transported_dir, &neg_grad)?
                    }
                }
            };

            let (direction, directional_derivative) = Self::safeguard_direction(
                manifold,
                &state.point,
                &gradient,
                gradient_norm_sq,
                direction,
                &mut line_search,
            )?;

            let ls = line_search.search(
                manifold,
                |p| problem.cost(p),
                &state.point,
                &direction,
                state.value,
                directional_derivative,
            )?;
            state.function_evaluations += ls.function_evals;
            state.step_size = Some(ls.step_size);

            previous = Some((state.point.clone(), gradient.clone(), direction, gradient_norm_sq));
            state.set_gradient(gradient, gradient_norm);
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

    /// Replaces a non-descent candidate direction with steepest descent.
    ///
    /// Returns the direction together with ⟨grad, direction⟩. A restart also
    /// clears the line-search step history, which the discarded direction's
    /// scale had tuned.
    fn safeguard_direction<M>(
        manifold: &M,
        point: &M::Point,
        gradient: &M::TangentVector,
        gradient_norm_sq: T,
        direction: M::TangentVector,
        line_search: &mut BacktrackingLineSearch<T>,
    ) -> geomopt_core::error::Result<(M::TangentVector, T)>
    where
        M: Manifold<T>,
    {
        let directional_derivative = manifold.inner_product(point, gradient, &direction)?;
        if directional_derivative >= T::zero() {
            let descent = manifold.scale_tangent(point, -T::one(), gradient)?;
            line_search.reset();
            return Ok((descent, -gradient_norm_sq));
        }
        Ok((direction, directional_derivative))
    }

    #[allow(clippy::too_many_arguments)]
    fn beta<M>(
        &self,
        manifold: &M,
        point: &M::Point,
        gradient: &M::TangentVector,
        gradient_norm_sq: T,
        transported_grad: &M::TangentVector,
        transported_dir: &M::TangentVector,
        prev_norm_sq: T,
    ) -> geomopt_core::error::Result<T>
    where
        M: Manifold<T>,
    {
        if prev_norm_sq <= T::zero() {
            return Ok(T::zero());
        }
        match self.config.beta_rule {
            BetaRule::FletcherReeves => Ok(gradient_norm_sq / prev_norm_sq),
            BetaRule::PolakRibiere => {
                let neg_transported =
                    manifold.scale_tangent(point, -T::one(), transported_grad)?;
                let diff = manifold.add_tangents(point, gradient, &neg_transported)?;
                let numerator = manifold.inner_product(point, gradient, &diff)?;
                Ok(<T as Float>::max(T::zero(), numerator / prev_norm_sq))
            }
            BetaRule::HestenesStiefel => {
                let neg_transported =
                    manifold.scale_tangent(point, -T::one(), transported_grad)?;
                let diff = manifold.add_tangents(point, gradient, &neg_transported)?;
                let numerator = manifold.inner_product(point, gradient, &diff)?;
                let denominator = manifold.inner_product(point, &diff, transported_dir)?;
                if <T as Float>::abs(denominator) < <T as Scalar>::EPSILON {
                    Ok(T::one())
                } else {
                    Ok(<T as Float>::max(T::zero(), numerator / denominator))
                }
            }
        }
    }
}

impl<T: Scalar> Optimizer<T> for ConjugateGradient<T> {
    fn name(&self) -> &str {
        "Riemannian Conjugate Gradient"
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
