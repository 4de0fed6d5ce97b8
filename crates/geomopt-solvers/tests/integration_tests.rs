//! End-to-end solver tests on concrete manifolds.

use geomopt_core::{
    cost::CostFunction,
    error::{Result, SolverError},
    problem::Problem,
    solver::{Optimizer, StoppingCriterion, TerminationReason},
    types::{DMatrix, DVector},
};
use geomopt_manifolds::{Euclidean, Sphere};
use geomopt_solvers::{
    truncated_cg::{self, TcgParams, TcgStatus},
    BetaRule, ConjugateGradient, ConjugateGradientConfig, GradientDescent, HessianMode,
    NelderMead, ParticleSwarm, ParticleSwarmConfig, TrustRegion, TrustRegionConfig,
};

/// f(x) = -xᵀAx on the unit sphere; minimized by the dominant eigenvector
/// of A with value -λ_max.
#[derive(Debug)]
struct RayleighQuotient {
    a: DMatrix<f64>,
}

impl RayleighQuotient {
    fn diagonal(values: &[f64]) -> Self {
        let n = values.len();
        let mut a = DMatrix::zeros(n, n);
        for (i, &v) in values.iter().enumerate() {
            a[(i, i)] = v;
        }
        Self { a }
    }
}

impl CostFunction<f64> for RayleighQuotient {
    type Point = DVector<f64>;
    type TangentVector = DVector<f64>;

    fn cost(&self, x: &Self::Point) -> Result<f64> {
        Ok(-x.dot(&(&self.a * x)))
    }

    fn euclidean_gradient(&self, x: &Self::Point) -> Result<Self::TangentVector> {
        Ok(&self.a * x * -2.0)
    }

    fn euclidean_hessian_vector_product(
        &self,
        _x: &Self::Point,
        u: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        Ok(&self.a * u * -2.0)
    }

    fn provides_hessian(&self) -> bool {
        true
    }
}

/// Same objective without a Hessian oracle.
#[derive(Debug)]
struct RayleighFirstOrderOnly {
    a: DMatrix<f64>,
}

impl CostFunction<f64> for RayleighFirstOrderOnly {
    type Point = DVector<f64>;
    type TangentVector = DVector<f64>;

    fn cost(&self, x: &Self::Point) -> Result<f64> {
        Ok(-x.dot(&(&self.a * x)))
    }

    fn euclidean_gradient(&self, x: &Self::Point) -> Result<Self::TangentVector> {
        Ok(&self.a * x * -2.0)
    }
}

/// f(x) = ½‖x - b‖² on Euclidean space.
#[derive(Debug)]
struct ShiftedQuadratic {
    b: DVector<f64>,
}

impl CostFunction<f64> for ShiftedQuadratic {
    type Point = DVector<f64>;
    type TangentVector = DVector<f64>;

    fn cost(&self, x: &Self::Point) -> Result<f64> {
        Ok(0.5 * (x - &self.b).norm_squared())
    }

    fn euclidean_gradient(&self, x: &Self::Point) -> Result<Self::TangentVector> {
        Ok(x - &self.b)
    }
}

/// Linear height function on the sphere, minimized at e₀.
#[derive(Debug)]
struct NegativeFirstCoordinate;

impl CostFunction<f64> for NegativeFirstCoordinate {
    type Point = DVector<f64>;
    type TangentVector = DVector<f64>;

    fn cost(&self, x: &Self::Point) -> Result<f64> {
        Ok(-x[0])
    }

    fn euclidean_gradient(&self, x: &Self::Point) -> Result<Self::TangentVector> {
        let mut g = DVector::zeros(x.len());
        g[0] = -1.0;
        Ok(g)
    }
}

fn unit(v: Vec<f64>) -> DVector<f64> {
    let v = DVector::from_vec(v);
    let n = v.norm();
    v / n
}

/// Criterion with only the gradient test active, for checking first-order
/// optimality precisely.
fn gradient_only_criterion(tol: f64, max_iter: usize) -> StoppingCriterion<f64> {
    let mut criterion = StoppingCriterion::new()
        .with_gradient_tolerance(tol)
        .with_max_iterations(max_iter);
    criterion.function_tolerance = None;
    criterion.point_tolerance = None;
    criterion.min_step_size = None;
    criterion
}

#[test]
fn test_gradient_descent_euclidean_quadratic() {
    let manifold = Euclidean::new(4);
    let b = DVector::from_vec(vec![1.0, -2.0, 3.0, 0.5]);
    let problem = Problem::new(manifold, ShiftedQuadratic { b: b.clone() });
    let x0 = DVector::zeros(4);

    let mut solver = GradientDescent::default();
    let criterion = gradient_only_criterion(1e-8, 2000);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert!(result.converged, "reason: {:?}", result.termination_reason);
    assert!((result.point - b).norm() < 1e-6);
    assert!(result.value < 1e-12);
}

#[test]
fn test_gradient_descent_rayleigh_on_sphere() {
    // Scenario: maximize the Rayleigh quotient; the solver should reach the
    // dominant eigenvector with a tight first-order residual.
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]));
    let x0 = unit(vec![1.0, 1.0, 1.0]);

    let mut solver = GradientDescent::default();
    let criterion = gradient_only_criterion(1e-6, 5000);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert!(result.converged, "reason: {:?}", result.termination_reason);
    assert!(result.gradient_norm.unwrap() < 1e-6);
    assert!((result.value - (-3.0)).abs() < 1e-8);
    assert!(result.point[0].abs() > 1.0 - 1e-6);
}

#[test]
fn test_conjugate_gradient_beta_rules_converge() {
    let manifold = Sphere::new(5);
    let problem = Problem::new(
        manifold,
        RayleighQuotient::diagonal(&[5.0, 2.0, 1.0, 0.5, 0.1]),
    );
    let x0 = unit(vec![1.0, 1.0, 1.0, 1.0, 1.0]);

    for rule in [
        BetaRule::FletcherReeves,
        BetaRule::PolakRibiere,
        BetaRule::HestenesStiefel,
    ] {
        let config = ConjugateGradientConfig::new().with_beta_rule(rule);
        let mut solver = ConjugateGradient::new(config);
        let criterion = gradient_only_criterion(1e-6, 5000);
        let result = solver.optimize(&problem, &x0, &criterion).unwrap();
        assert!(
            result.converged,
            "{rule:?} did not converge: {:?}",
            result.termination_reason
        );
        assert!((result.value - (-5.0)).abs() < 1e-6, "{rule:?}");
    }
}

#[test]
fn test_conjugate_gradient_history_is_monotone_enough() {
    let manifold = Sphere::new(4);
    let problem = Problem::new(manifold, RayleighQuotient::diagonal(&[4.0, 2.0, 1.0, 0.5]));
    let x0 = unit(vec![0.5, 1.0, -0.5, 1.0]);

    let mut solver = ConjugateGradient::default();
    let criterion = gradient_only_criterion(1e-6, 5000);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    // The Armijo condition enforces decrease of accepted iterates.
    for pair in result.history.windows(2) {
        assert!(pair[1].cost <= pair[0].cost + 1e-12);
    }
}

#[test]
fn test_trust_region_exact_hessian_converges_quadratically() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]));
    let x0 = unit(vec![1.0, 1.0, 1.0]);

    let config = TrustRegionConfig::new().with_hessian_mode(HessianMode::Exact);
    let mut solver = TrustRegion::new(config);
    let criterion = gradient_only_criterion(1e-10, 200);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert!(result.converged, "reason: {:?}", result.termination_reason);
    assert!((result.value - (-3.0)).abs() < 1e-10);
    // Newton-type convergence needs far fewer iterations than first-order
    // methods on the same problem.
    assert!(result.iterations < 100);
}

#[test]
fn test_trust_region_negative_curvature_near_saddle() {
    // Scenario: start near the smallest eigenvector, a saddle point of the
    // sphere-constrained problem. The subproblem must detect negative
    // curvature at least once on the way out.
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]));
    let x0 = unit(vec![1e-3, 2e-3, 1.0]);

    let config = TrustRegionConfig::new().with_hessian_mode(HessianMode::Exact);
    let mut solver = TrustRegion::new(config);
    let criterion = gradient_only_criterion(1e-8, 500);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert!(result.converged, "reason: {:?}", result.termination_reason);
    assert!((result.value - (-3.0)).abs() < 1e-8);
    assert!(
        solver.stats().negative_curvature_hits >= 1,
        "statuses: {:?}",
        solver.stats().subproblem_statuses
    );
}

#[test]
fn test_trust_region_finite_difference_hessian() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(
        manifold,
        RayleighFirstOrderOnly {
            a: RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]).a,
        },
    );
    let x0 = unit(vec![1.0, 1.0, 1.0]);

    let mut solver = TrustRegion::default();
    let criterion = gradient_only_criterion(1e-6, 500);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert!(result.converged, "reason: {:?}", result.termination_reason);
    assert!((result.value - (-3.0)).abs() < 1e-6);
}

#[test]
fn test_trust_region_exact_mode_requires_oracle() {
    // Scenario: exact mode with a first-order-only oracle fails before any
    // iteration rather than mid-run.
    let manifold = Sphere::new(3);
    let problem = Problem::new(
        manifold,
        RayleighFirstOrderOnly {
            a: RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]).a,
        },
    );
    let x0 = unit(vec![1.0, 1.0, 1.0]);

    let config = TrustRegionConfig::new().with_hessian_mode(HessianMode::Exact);
    let mut solver = TrustRegion::new(config);
    let criterion = StoppingCriterion::new();
    let err = solver.optimize(&problem, &x0, &criterion).unwrap_err();
    assert!(matches!(err, SolverError::OracleUnavailable { .. }));
    assert!(solver.stats().subproblem_statuses.is_empty());
}

#[test]
fn test_invalid_initial_point_rejected() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]));
    let off_sphere = DVector::from_vec(vec![2.0, 0.0, 0.0]);

    let mut solver = GradientDescent::default();
    let criterion = StoppingCriterion::new();
    let err = solver.optimize(&problem, &off_sphere, &criterion).unwrap_err();
    assert!(matches!(err, SolverError::InvalidInitialPoint { .. }));
}

#[test]
fn test_truncated_cg_step_respects_radius_on_indefinite_model() {
    let manifold = Euclidean::new(3);
    let point = DVector::zeros(3);
    let gradient = DVector::from_vec(vec![1.0, 1.0, 1.0]);
    let radius = 0.5;

    // Indefinite diagonal Hessian.
    let hess = DVector::from_vec(vec![2.0, -1.0, 0.5]);
    let result = truncated_cg::solve(
        &manifold,
        &point,
        &gradient,
        radius,
        &TcgParams::default(),
        |v: &DVector<f64>| Ok(v.component_mul(&hess)),
    )
    .unwrap();

    assert!(matches!(
        result.status,
        TcgStatus::NegativeCurvature | TcgStatus::BoundaryReached
    ));
    assert!(result.step.norm() <= radius * (1.0 + 1e-12));
    // Boundary steps sit on the boundary, not strictly inside.
    assert!(result.step.norm() >= radius * (1.0 - 1e-9));
}

#[test]
fn test_truncated_cg_solves_positive_definite_model() {
    let manifold = Euclidean::new(3);
    let point = DVector::zeros(3);
    let gradient = DVector::from_vec(vec![1.0, -2.0, 0.5]);

    // H = I: the model minimizer is -gradient, well inside a large radius.
    let result = truncated_cg::solve(
        &manifold,
        &point,
        &gradient,
        100.0,
        &TcgParams::default(),
        |v: &DVector<f64>| Ok(v.clone()),
    )
    .unwrap();

    assert_eq!(result.status, TcgStatus::ResidualConverged);
    assert!((result.step + gradient).norm() < 1e-6);
}

#[test]
fn test_nelder_mead_on_sphere() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, NegativeFirstCoordinate);
    let x0 = unit(vec![0.1, 1.0, 0.5]);

    let mut solver = NelderMead::default();
    let criterion = StoppingCriterion::new()
        .with_max_iterations(2000)
        .with_max_function_evaluations(10_000);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert!(result.gradient_norm.is_none());
    assert!(
        result.value < -0.99,
        "value {} after {:?}",
        result.value,
        result.termination_reason
    );
    assert!(result.point[0] > 0.99);
}

#[test]
fn test_nelder_mead_reports_simplex_collapse() {
    let manifold = Euclidean::new(2);
    let problem = Problem::new(
        manifold,
        ShiftedQuadratic {
            b: DVector::from_vec(vec![1.0, 1.0]),
        },
    );
    let x0 = DVector::zeros(2);

    let mut solver = NelderMead::default();
    let criterion = StoppingCriterion::new().with_max_iterations(5000);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert_eq!(result.termination_reason, TerminationReason::SimplexCollapsed);
    assert!((result.point - DVector::from_vec(vec![1.0, 1.0])).norm() < 1e-3);
}

#[test]
fn test_particle_swarm_on_sphere() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, NegativeFirstCoordinate);
    let x0 = unit(vec![0.1, 1.0, 0.5]);

    let mut solver = ParticleSwarm::default();
    let criterion = StoppingCriterion::new()
        .with_max_iterations(500)
        .with_max_function_evaluations(50_000);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert!(result.gradient_norm.is_none());
    assert!(
        result.value < -0.9,
        "value {} after {:?}",
        result.value,
        result.termination_reason
    );
    assert!(result.point[0] > 0.9);
}

#[test]
fn test_particle_swarm_respects_evaluation_cap() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, NegativeFirstCoordinate);
    let x0 = unit(vec![0.1, 1.0, 0.5]);

    let config = ParticleSwarmConfig::new().with_population_size(8);
    let mut solver = ParticleSwarm::new(config);
    let criterion = StoppingCriterion::new()
        .with_max_iterations(100_000)
        .with_max_function_evaluations(30);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert_eq!(
        result.termination_reason,
        TerminationReason::MaxFunctionEvaluations
    );
    // The budget check runs between sweeps, so the overshoot is at most one
    // population's worth of evaluations.
    assert!(result.function_evaluations <= 30 + 8);
}

#[test]
fn test_max_iterations_is_normal_termination() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]));
    let x0 = unit(vec![1.0, 1.0, 1.0]);

    let mut solver = GradientDescent::default();
    let criterion = gradient_only_criterion(1e-16, 3);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert_eq!(result.termination_reason, TerminationReason::MaxIterations);
    assert!(!result.converged);
    assert_eq!(result.iterations, 3);
}

#[test]
fn test_target_value_stops_early() {
    let manifold = Sphere::new(3);
    let problem = Problem::new(manifold, RayleighQuotient::diagonal(&[3.0, 1.0, 0.5]));
    let x0 = unit(vec![1.0, 1.0, 1.0]);

    let mut solver = GradientDescent::default();
    let criterion = gradient_only_criterion(1e-12, 5000).with_target_value(-2.5);
    let result = solver.optimize(&problem, &x0, &criterion).unwrap();

    assert_eq!(result.termination_reason, TerminationReason::TargetReached);
    assert!(result.value <= -2.5);
}
