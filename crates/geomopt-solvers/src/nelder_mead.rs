//! Derivative-free simplex search on a manifold.
//!
//! The classical Nelder–Mead moves, restated through manifold primitives:
//! the centroid of the better vertices is a Karcher mean computed by
//! fixed-point averaging of inverse retractions, and reflection, expansion,
//! contraction, and shrink all follow retractions of scaled inverse
//! retractions instead of affine combinations. Only cost evaluations are
//! used; the gradient field of the result is `None`.

use geomopt_core::{
    callback::{CallbackInfo, NoOpCallback, OptimizationCallback},
    cost::CostFunction,
    error::{Result, SolverError, SolverResult},
    manifold::Manifold,
    problem::Problem,
    solver::{
        IterationRecord, OptimizationResult, Optimizer, StoppingCriterion, TerminationReason,
    },
    types::Scalar,
};
use num_traits::Float;
use std::time::Instant;

/// Configuration for [`NelderMead`].
#[derive(Debug, Clone)]
pub struct NelderMeadConfig<T: Scalar> {
    /// Scale of the random tangent steps used to build the initial simplex
    /// around the starting point.
    pub simplex_radius: T,
    /// Expansion coefficient (applied to the reflected direction).
    pub expansion: T,
    /// Contraction coefficient.
    pub contraction: T,
    /// Shrink coefficient (geodesic interpolation toward the best vertex).
    pub shrink: T,
    /// Fixed-point iterations for the Karcher-mean centroid.
    pub centroid_iterations: usize,
    /// Simplex diameter below which the search is declared collapsed.
    pub diameter_tolerance: T,
}

impl<T: Scalar> Default for NelderMeadConfig<T> {
    fn default() -> Self {
        Self {
            simplex_radius: <T as Scalar>::from_f64(0.5),
            expansion: <T as Scalar>::from_f64(2.0),
            contraction: <T as Scalar>::from_f64(0.5),
            shrink: <T as Scalar>::from_f64(0.5),
            centroid_iterations: 5,
            diameter_tolerance: <T as Scalar>::from_f64(1e-8),
        }
    }
}

impl<T: Scalar> NelderMeadConfig<T> {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial simplex radius.
    pub fn with_simplex_radius(mut self, radius: T) -> Self {
        self.simplex_radius = radius;
        self
    }

    /// Sets the diameter tolerance.
    pub fn with_diameter_tolerance(mut self, tol: T) -> Self {
        self.diameter_tolerance = tol;
        self
    }

    /// Sets the number of centroid fixed-point iterations.
    pub fn with_centroid_iterations(mut self, iterations: usize) -> Self {
        self.centroid_iterations = iterations;
        self
    }
}

/// Riemannian Nelder–Mead simplex solver.
#[derive(Debug, Clone)]
pub struct NelderMead<T: Scalar> {
    config: NelderMeadConfig<T>,
}

impl<T: Scalar> Default for NelderMead<T> {
    fn default() -> Self {
        Self::new(NelderMeadConfig::default())
    }
}

struct Vertex<T, P> {
    cost: T,
    point: P,
}

impl<T: Scalar> NelderMead<T> {
    /// Creates a solver with the given configuration.
    pub fn new(config: NelderMeadConfig<T>) -> Self {
        Self { config }
    }

    /// The solver configuration.
    pub fn config(&self) -> &NelderMeadConfig<T> {
        &self.config
    }

    /// Karcher mean of `points` by fixed-point averaging: repeatedly move
    /// the estimate along the mean of the inverse retractions to the points.
    fn centroid<M>(&self, manifold: &M, points: &[&M::Point]) -> Result<M::Point>
    where
        M: Manifold<T>,
    {
        let count = <T as Scalar>::from_usize(points.len());
        let mut estimate = points[0].clone();
        for _ in 0..self.config.centroid_iterations {
            let mut mean = manifold.zero_tangent(&estimate)?;
            for point in points {
                let log = manifold.inverse_retract(&estimate, point)?;
                mean = manifold.add_tangents(&estimate, &mean, &log)?;
            }
            mean = manifold.scale_tangent(&estimate, T::one() / count, &mean)?;
            if manifold.norm(&estimate, &mean)? < <T as Scalar>::EPSILON {
                break;
            }
            estimate = manifold.retract(&estimate, &mean)?;
        }
        Ok(estimate)
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

        let start_time = Instant::now();
        let mut function_evaluations = 0usize;
        let mut history: Vec<IterationRecord<T>> = Vec::new();

        // dimension + 1 vertices: the start plus random perturbations.
        let mut simplex: Vec<Vertex<T, M::Point>> = Vec::with_capacity(manifold.dimension() + 1);
        let initial_cost = problem.cost(initial_point)?;
        function_evaluations += 1;
        simplex.push(Vertex {
            cost: initial_cost,
            point: initial_point.clone(),
        });
        for _ in 0..manifold.dimension() {
            let tangent = manifold.random_tangent(initial_point)?;
            let scaled =
                manifold.scale_tangent(initial_point, self.config.simplex_radius, &tangent)?;
            let point = manifold.retract(initial_point, &scaled)?;
            let cost = problem.cost(&point)?;
            function_evaluations += 1;
            simplex.push(Vertex { cost, point });
        }

        callback.on_start()?;

        let mut iteration = 0usize;
        let reason = loop {
            simplex.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal));

            let best_cost = simplex[0].cost;
            history.push(IterationRecord {
                iteration,
                cost: best_cost,
                gradient_norm: None,
                step_size: None,
                elapsed: start_time.elapsed(),
            });

            let info = CallbackInfo {
                iteration,
                cost: best_cost,
                gradient_norm: None,
                elapsed: start_time.elapsed(),
            };
            if !callback.on_iteration(&info)? {
                break TerminationReason::CallbackRequested;
            }

            if let Some(target) = criterion.target_value {
                if best_cost <= target {
                    break TerminationReason::TargetReached;
                }
            }

            let mut diameter = T::zero();
            for vertex in &simplex[1..] {
                let d = manifold.distance(&simplex[0].point, &vertex.point)?;
                diameter = <T as Float>::max(diameter, d);
            }
            if diameter < self.config.diameter_tolerance {
                break TerminationReason::SimplexCollapsed;
            }

            if let Some(max_iter) = criterion.max_iterations {
                if iteration >= max_iter {
                    break TerminationReason::MaxIterations;
                }
            }
            if let Some(max_time) = criterion.max_time {
                if start_time.elapsed() >= max_time {
                    break TerminationReason::MaxTime;
                }
            }
            if let Some(max_evals) = criterion.max_function_evaluations {
                if function_evaluations >= max_evals {
                    break TerminationReason::MaxFunctionEvaluations;
                }
            }

            let worst_index = simplex.len() - 1;
            let second_worst_cost = simplex[worst_index - 1].cost;
            let better: Vec<&M::Point> =
                simplex[..worst_index].iter().map(|v| &v.point).collect();
            let centroid = self.centroid(manifold, &better)?;

            // Direction from the worst vertex through the centroid.
            let toward_worst = manifold.inverse_retract(&centroid, &simplex[worst_index].point)?;
            let away = manifold.scale_tangent(&centroid, -T::one(), &toward_worst)?;

            let reflected = manifold.retract(&centroid, &away)?;
            let reflected_cost = problem.cost(&reflected)?;
            function_evaluations += 1;

            if reflected_cost < simplex[0].cost {
                // Promising direction: try going further.
                let expanded_dir =
                    manifold.scale_tangent(&centroid, self.config.expansion, &away)?;
                let expanded = manifold.retract(&centroid, &expanded_dir)?;
                let expanded_cost = problem.cost(&expanded)?;
                function_evaluations += 1;
                if expanded_cost < reflected_cost {
                    simplex[worst_index] = Vertex {
                        cost: expanded_cost,
                        point: expanded,
                    };
                } else {
                    simplex[worst_index] = Vertex {
                        cost: reflected_cost,
                        point: reflected,
                    };
                }
            } else if reflected_cost < second_worst_cost {
                simplex[worst_index] = Vertex {
                    cost: reflected_cost,
                    point: reflected,
                };
            } else {
                let contracted_dir =
                    manifold.scale_tangent(&centroid, self.config.contraction, &away)?;
                let contracted = manifold.retract(&centroid, &contracted_dir)?;
                let contracted_cost = problem.cost(&contracted)?;
                function_evaluations += 1;
                if contracted_cost < simplex[worst_index].cost {
                    simplex[worst_index] = Vertex {
                        cost: contracted_cost,
                        point: contracted,
                    };
                } else {
                    // Shrink every non-best vertex toward the best one along
                    // the connecting geodesic.
                    let best_point = simplex[0].point.clone();
                    for vertex in simplex.iter_mut().skip(1) {
                        let log = manifold.inverse_retract(&best_point, &vertex.point)?;
                        let scaled =
                            manifold.scale_tangent(&best_point, self.config.shrink, &log)?;
                        let point = manifold.retract(&best_point, &scaled)?;
                        let cost = problem.cost(&point)?;
                        function_evaluations += 1;
                        *vertex = Vertex { cost, point };
                    }
                }
            }

            iteration += 1;
        };

        simplex.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal));
        let best = simplex.into_iter().next().ok_or_else(|| {
            geomopt_core::error::ManifoldError::numerical_error("empty simplex")
        })?;

        let final_info = CallbackInfo {
            iteration,
            cost: best.cost,
            gradient_norm: None,
            elapsed: start_time.elapsed(),
        };
        callback.on_end(&final_info)?;

        Ok(OptimizationResult::new(
            best.point,
            best.cost,
            iteration,
            start_time.elapsed(),
            reason,
        )
        .with_function_evaluations(function_evaluations)
        .with_history(history))
    }
}

impl<T: Scalar> Optimizer<T> for NelderMead<T> {
    fn name(&self) -> &str {
        "Riemannian Nelder-Mead"
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
