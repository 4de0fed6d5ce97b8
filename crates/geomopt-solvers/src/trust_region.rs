//! Riemannian trust-region (Newton-type) solver.
//!
//! At each iterate the solver builds a quadratic model of the pulled-back
//! objective in the current tangent space, approximately minimizes it inside
//! a ball of radius Δ with [truncated CG](crate::truncated_cg), and adjusts
//! Δ from the agreement ratio ρ between the actual and predicted decrease.
//!
//! Second-order information comes from the problem's Hessian oracle when one
//! exists, or from finite differences of transported gradients otherwise.
//! The exact mode refuses to start without an oracle; it never discovers the
//! absence mid-run.

use crate::truncated_cg::{self, TcgParams, TcgStatus};
use geomopt_core::{
    callback::{CallbackInfo, NoOpCallback, OptimizationCallback},
    cost::CostFunction,
    error::{Result, SolverError, SolverResult},
    manifold::Manifold,
    problem::Problem,
    solver::{
        ConvergenceChecker, IterationRecord, OptimizationResult, Optimizer, OptimizerState,
        StoppingCriterion, TerminationReason,
    },
    types::Scalar,
};
use num_traits::Float;

/// How the Riemannian Hessian-vector product is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HessianMode {
    /// Use the problem's Hessian oracle; fails before the first iteration
    /// when none is provided.
    Exact,
    /// Approximate by differencing transported gradients along a retracted
    /// perturbation. The default.
    #[default]
    FiniteDifference,
}

/// Configuration for [`TrustRegion`].
#[derive(Debug, Clone)]
pub struct TrustRegionConfig<T: Scalar> {
    /// Initial trust-region radius Δ₀.
    pub initial_radius: T,
    /// Upper bound on the radius.
    pub max_radius: T,
    /// Radius below which the run terminates as stalled.
    pub min_radius: T,
    /// ρ threshold for accepting a step.
    pub acceptance_threshold: T,
    /// ρ below which the radius shrinks.
    pub shrink_threshold: T,
    /// ρ above which the radius may grow (when the subproblem hit the
    /// boundary or negative curvature).
    pub grow_threshold: T,
    /// Multiplicative shrink factor.
    pub shrink_factor: T,
    /// Multiplicative growth factor.
    pub grow_factor: T,
    /// Hessian source.
    pub hessian_mode: HessianMode,
    /// Relative perturbation size for the finite-difference Hessian.
    pub fd_step: T,
    /// Subproblem parameters.
    pub tcg_params: TcgParams<T>,
}

impl<T: Scalar> Default for TrustRegionConfig<T> {
    fn default() -> Self {
        Self {
            initial_radius: T::one(),
            max_radius: <T as Scalar>::from_f64(100.0),
            min_radius: <T as Scalar>::from_f64(1e-10),
            acceptance_threshold: <T as Scalar>::from_f64(0.1),
            shrink_threshold: <T as Scalar>::from_f64(0.25),
            grow_threshold: <T as Scalar>::from_f64(0.75),
            shrink_factor: <T as Scalar>::from_f64(0.25),
            grow_factor: <T as Scalar>::from_f64(2.0),
            hessian_mode: HessianMode::FiniteDifference,
            // 2^-14, the customary perturbation scale for gradient
            // differencing in double precision.
            fd_step: <T as Scalar>::from_f64(6.103_515_625e-5),
            tcg_params: TcgParams::default(),
        }
    }
}

impl<T: Scalar> TrustRegionConfig<T> {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial radius.
    pub fn with_initial_radius(mut self, radius: T) -> Self {
        self.initial_radius = radius;
        self
    }

    /// Sets the maximum radius.
    pub fn with_max_radius(mut self, radius: T) -> Self {
        self.max_radius = radius;
        self
    }

    /// Sets the minimum radius.
    pub fn with_min_radius(mut self, radius: T) -> Self {
        self.min_radius = radius;
        self
    }

    /// Sets the Hessian source.
    pub fn with_hessian_mode(mut self, mode: HessianMode) -> Self {
        self.hessian_mode = mode;
        self
    }

    /// Sets the subproblem parameters.
    pub fn with_tcg_params(mut self, params: TcgParams<T>) -> Self {
        self.tcg_params = params;
        self
    }
}

/// Diagnostics accumulated over one solver run.
#[derive(Debug, Clone, Default)]
pub struct TrustRegionStats {
    /// Subproblem solves that ended on a negative-curvature direction.
    pub negative_curvature_hits: usize,
    /// Subproblem solves that ended on the trust-region boundary.
    pub boundary_hits: usize,
    /// Outer iterations whose step was rejected (ρ below the acceptance
    /// threshold).
    pub rejected_steps: usize,
    /// Terminal status of every subproblem solve, in order.
    pub subproblem_statuses: Vec<TcgStatus>,
}

/// Riemannian trust-region solver with a truncated-CG subsolver.
#[derive(Debug, Clone)]
pub struct TrustRegion<T: Scalar> {
    config: TrustRegionConfig<T>,
    stats: TrustRegionStats,
}

impl<T: Scalar> Default for TrustRegion<T> {
    fn default() -> Self {
        Self::new(TrustRegionConfig::default())
    }
}

impl<T: Scalar> TrustRegion<T> {
    /// Creates a solver with the given configuration.
    pub fn new(config: TrustRegionConfig<T>) -> Self {
        Self {
            config,
            stats: TrustRegionStats::default(),
        }
    }

    /// The solver configuration.
    pub fn config(&self) -> &TrustRegionConfig<T> {
        &self.config
    }

    /// Diagnostics from the most recent run.
    pub fn stats(&self) -> &TrustRegionStats {
        &self.stats
    }

    /// Applies the configured Hessian approximation to `tangent`.
    fn hessian_vector_product<M, C>(
        &self,
        problem: &Problem<T, M, C>,
        point: &M::Point,
        gradient: &M::TangentVector,
        tangent: &M::TangentVector,
    ) -> Result<M::TangentVector>
    where
        M: Manifold<T>,
        C: CostFunction<T, Point = M::Point, TangentVector = M::TangentVector>,
    {
        let manifold = problem.manifold();
        match self.config.hessian_mode {
            HessianMode::Exact => problem.riemannian_hessian_vector_product(point, tangent),
            HessianMode::FiniteDifference => {
                let tangent_norm = manifold.norm(point, tangent)?;
                if tangent_norm < <T as Scalar>::EPSILON {
                    return manifold.zero_tangent(point);
                }
                let h = self.config.fd_step / tangent_norm;
                let perturbation = manifold.scale_tangent(point, h, tangent)?;
                let perturbed = manifold.retract(point, &perturbation)?;
                let gradient_there = problem.riemannian_gradient(&perturbed)?;
                let transported = manifold.transport(&perturbed, point, &gradient_there)?;
                let neg_gradient = manifold.scale_tangent(point, -T::one(), gradient)?;
                let diff = manifold.add_tangents(point, &transported, &neg_gradient)?;
                manifold.scale_tangent(point, T::one() / h, &diff)
            }
        }
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
        if self.config.hessian_mode == HessianMode::Exact && !problem.provides_hessian() {
            return Err(SolverError::oracle_unavailable(
                "Hessian-vector product oracle",
            ));
        }
        self.stats = TrustRegionStats::default();

        let initial_cost = problem.cost(initial_point)?;
        let mut state: OptimizerState<T, M::Point, M::TangentVector> =
            OptimizerState::new(initial_point.clone(), initial_cost);
        let mut radius = self.config.initial_radius;
        let mut history: Vec<IterationRecord<T>> = Vec::new();

        callback.on_start()?;

        let reason = loop {
            let gradient = problem.riemannian_gradient(&state.point)?;
            let gradient_norm = manifold.norm(&state.point, &gradient)?;
            state.set_gradient(gradient.clone(), gradient_norm);

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
            if radius < self.config.min_radius {
                break TerminationReason::StepSizeBelowMinimum;
            }

            let tcg = truncated_cg::solve(
                manifold,
                &state.point,
                &gradient,
                radius,
                &self.config.tcg_params,
                |v| self.hessian_vector_product(problem, &state.point, &gradient, v),
            )?;
            self.stats.subproblem_statuses.push(tcg.status);
            match tcg.status {
                TcgStatus::NegativeCurvature => self.stats.negative_curvature_hits += 1,
                TcgStatus::BoundaryReached => self.stats.boundary_hits += 1,
                _ => {}
            }

            let step_norm = manifold.norm(&state.point, &tcg.step)?;
            let candidate = manifold.retract(&state.point, &tcg.step)?;
            let candidate_cost = problem.cost(&candidate)?;
            state.function_evaluations += 1;

            // Predicted decrease of the quadratic model:
            // -(⟨g, s⟩ + ½⟨s, H s⟩).
            let hs = self.hessian_vector_product(problem, &state.point, &gradient, &tcg.step)?;
            let gs = manifold.inner_product(&state.point, &gradient, &tcg.step)?;
            let shs = manifold.inner_product(&state.point, &tcg.step, &hs)?;
            let half = <T as Scalar>::from_f64(0.5);
            let predicted = -(gs + half * shs);

            let actual = state.value - candidate_cost;
            let floor = <T as Scalar>::EPSILON * (T::one() + <T as Float>::abs(state.value));
            let rho = if predicted <= floor {
                // Model predicts no decrease; trust only a real improvement.
                if actual > floor {
                    T::one()
                } else {
                    T::zero()
                }
            } else {
                actual / predicted
            };

            let expanded_region =
                matches!(tcg.status, TcgStatus::BoundaryReached | TcgStatus::NegativeCurvature);
            if rho < self.config.shrink_threshold {
                radius = radius * self.config.shrink_factor;
            } else if rho > self.config.grow_threshold && expanded_region {
                radius = <T as Float>::min(radius * self.config.grow_factor, self.config.max_radius);
            }

            if rho >= self.config.acceptance_threshold {
                state.step_size = Some(step_norm);
                state.update(candidate, candidate_cost);
            } else {
                self.stats.rejected_steps += 1;
                state.iteration += 1;
            }
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

impl<T: Scalar> Optimizer<T> for TrustRegion<T> {
    fn name(&self) -> &str {
        "Riemannian Trust Region"
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
