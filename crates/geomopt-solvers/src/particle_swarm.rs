//! Derivative-free particle swarm search on a manifold.
//!
//! A population of particles explores the manifold; each carries a velocity
//! in its tangent space and is pulled toward its own best point and the
//! swarm's best point. The Euclidean update rule survives the translation
//! almost verbatim: velocities move between tangent spaces by transport, the
//! pulls are inverse retractions toward the attractors, and positions
//! advance by retraction. Only cost evaluations are used; the gradient field
//! of the result is `None`.
//!
//! Cost evaluations are the one resource the swarm consumes, so when the
//! stopping criterion leaves the evaluation budget unset a dimension-scaled
//! default cap applies instead of running unbounded.

use geomopt_core::{
    callback::{CallbackInfo, NoOpCallback, OptimizationCallback},
    cost::CostFunction,
    error::{SolverError, SolverResult},
    manifold::Manifold,
    problem::Problem,
    solver::{
        IterationRecord, OptimizationResult, Optimizer, StoppingCriterion, TerminationReason,
    },
    types::Scalar,
};
use rand::Rng;
use std::time::Instant;

/// Configuration for [`ParticleSwarm`].
#[derive(Debug, Clone)]
pub struct ParticleSwarmConfig<T: Scalar> {
    /// Number of particles. `None` picks `min(40, 10 * dimension)`.
    pub population_size: Option<usize>,
    /// Weight of the pull toward each particle's own best point.
    pub nostalgia: T,
    /// Weight of the pull toward the swarm's best point.
    pub social: T,
    /// Inertia weight at the start of the run.
    pub initial_inertia: T,
    /// Inertia weight reached at the end of the iteration budget.
    pub final_inertia: T,
}

impl<T: Scalar> Default for ParticleSwarmConfig<T> {
    fn default() -> Self {
        Self {
            population_size: None,
            nostalgia: <T as Scalar>::from_f64(1.4),
            social: <T as Scalar>::from_f64(1.4),
            initial_inertia: <T as Scalar>::from_f64(0.9),
            final_inertia: <T as Scalar>::from_f64(0.4),
        }
    }
}

impl<T: Scalar> ParticleSwarmConfig<T> {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Sets the nostalgia weight.
    pub fn with_nostalgia(mut self, nostalgia: T) -> Self {
        self.nostalgia = nostalgia;
        self
    }

    /// Sets the social weight.
    pub fn with_social(mut self, social: T) -> Self {
        self.social = social;
        self
    }
}

/// Riemannian particle swarm solver.
#[derive(Debug, Clone)]
pub struct ParticleSwarm<T: Scalar> {
    config: ParticleSwarmConfig<T>,
}

impl<T: Scalar> Default for ParticleSwarm<T> {
    fn default() -> Self {
        Self::new(ParticleSwarmConfig::default())
    }
}

struct Particle<T, P, V> {
    point: P,
    /// Where the current velocity is anchored; one position behind `point`.
    previous_point: P,
    velocity: V,
    best_point: P,
    best_cost: T,
}

impl<T: Scalar> ParticleSwarm<T> {
    /// Creates a solver with the given configuration.
    pub fn new(config: ParticleSwarmConfig<T>) -> Self {
        Self { config }
    }

    /// The solver configuration.
    pub fn config(&self) -> &ParticleSwarmConfig<T> {
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

        let dim = manifold.dimension().max(1);
        let population = self
            .config
            .population_size
            .unwrap_or_else(|| usize::min(40, 10 * dim))
            .max(1);
        let evaluation_cap = criterion
            .max_function_evaluations
            .unwrap_or_else(|| usize::max(5000, 2 * dim));
        let inertia_span = criterion
            .max_iterations
            .unwrap_or_else(|| usize::max(500, 4 * dim))
            .max(1);

        let start_time = Instant::now();
        let mut rng = rand::thread_rng();
        let mut function_evaluations = 0usize;
        let mut history: Vec<IterationRecord<T>> = Vec::new();

        // The supplied point seeds the swarm; the rest is drawn at random.
        let mut particles: Vec<Particle<T, M::Point, M::TangentVector>> =
            Vec::with_capacity(population);
        let initial_cost = problem.cost(initial_point)?;
        function_evaluations += 1;
        particles.push(Particle {
            point: initial_point.clone(),
            previous_point: initial_point.clone(),
            velocity: manifold.random_tangent(initial_point)?,
            best_point: initial_point.clone(),
            best_cost: initial_cost,
        });
        for _ in 1..population {
            let point = manifold.random_point();
            let cost = problem.cost(&point)?;
            function_evaluations += 1;
            let velocity = manifold.random_tangent(&point)?;
            particles.push(Particle {
                point: point.clone(),
                previous_point: point.clone(),
                velocity,
                best_point: point,
                best_cost: cost,
            });
        }

        let mut best_index = 0;
        for (i, particle) in particles.iter().enumerate() {
            if particle.best_cost < particles[best_index].best_cost {
                best_index = i;
            }
        }
        let mut best_cost = particles[best_index].best_cost;
        let mut best_point = particles[best_index].best_point.clone();

        callback.on_start()?;

        let mut iteration = 0usize;
        let reason = loop {
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
            if function_evaluations >= evaluation_cap {
                break TerminationReason::MaxFunctionEvaluations;
            }

            // Inertia decays linearly over the iteration budget.
            let frac = num_traits::clamp(
                <T as Scalar>::from_usize(iteration) / <T as Scalar>::from_usize(inertia_span),
                T::zero(),
                T::one(),
            );
            let inertia_weight = self.config.final_inertia
                + (self.config.initial_inertia - self.config.final_inertia) * (T::one() - frac);

            // Velocities first, all against the same swarm best.
            let swarm_best = best_point.clone();
            for particle in &mut particles {
                let carried = manifold.transport(
                    &particle.previous_point,
                    &particle.point,
                    &particle.velocity,
                )?;
                let inertia = manifold.scale_tangent(&particle.point, inertia_weight, &carried)?;

                let toward_own = manifold.inverse_retract(&particle.point, &particle.best_point)?;
                let nostalgia_weight =
                    <T as Scalar>::from_f64(rng.gen::<f64>()) * self.config.nostalgia;
                let pulled =
                    manifold.axpy_tangent(&particle.point, nostalgia_weight, &toward_own, &inertia)?;

                let toward_swarm = manifold.inverse_retract(&particle.point, &swarm_best)?;
                let social_weight =
                    <T as Scalar>::from_f64(rng.gen::<f64>()) * self.config.social;
                particle.velocity =
                    manifold.axpy_tangent(&particle.point, social_weight, &toward_swarm, &pulled)?;
            }

            // Then positions and bests.
            for particle in &mut particles {
                let moved = manifold.retract(&particle.point, &particle.velocity)?;
                particle.previous_point =
                    std::mem::replace(&mut particle.point, moved);
                let cost = problem.cost(&particle.point)?;
                function_evaluations += 1;

                if cost < particle.best_cost {
                    particle.best_cost = cost;
                    particle.best_point = particle.point.clone();
                    if cost < best_cost {
                        best_cost = cost;
                        best_point = particle.point.clone();
                    }
                }
            }

            iteration += 1;
        };

        let final_info = CallbackInfo {
            iteration,
            cost: best_cost,
            gradient_norm: None,
            elapsed: start_time.elapsed(),
        };
        callback.on_end(&final_info)?;

        Ok(OptimizationResult::new(
            best_point,
            best_cost,
            iteration,
            start_time.elapsed(),
            reason,
        )
        .with_function_evaluations(function_evaluations)
        .with_history(history))
    }
}

impl<T: Scalar> Optimizer<T> for ParticleSwarm<T> {
    fn name(&self) -> &str {
        "Riemannian Particle Swarm"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let config = ParticleSwarmConfig::<f64>::default();
        assert_eq!(config.nostalgia, 1.4);
        assert_eq!(config.social, 1.4);
        assert!(config.population_size.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ParticleSwarmConfig::<f64>::new()
            .with_population_size(12)
            .with_nostalgia(1.0)
            .with_social(2.0);
        assert_eq!(config.population_size, Some(12));
        assert_eq!(config.nostalgia, 1.0);
        assert_eq!(config.social, 2.0);
    }
}
