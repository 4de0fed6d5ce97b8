//! Solver comparison on the dominant-eigenvector problem.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geomopt_core::{
    cost::CostFunction,
    error::Result,
    problem::Problem,
    solver::{Optimizer, StoppingCriterion},
    types::{DMatrix, DVector},
};
use geomopt_manifolds::Sphere;
use geomopt_solvers::{
    ConjugateGradient, GradientDescent, HessianMode, TrustRegion, TrustRegionConfig,
};

#[derive(Debug)]
struct RayleighQuotient {
    a: DMatrix<f64>,
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

fn setup(n: usize) -> (Problem<f64, Sphere, RayleighQuotient>, DVector<f64>) {
    // Fixed spectrum with a clear dominant eigenvalue.
    let mut a = DMatrix::zeros(n, n);
    for i in 0..n {
        a[(i, i)] = 1.0 + (n - i) as f64;
    }
    a[(0, 0)] = 2.0 * n as f64;
    let problem = Problem::new(Sphere::new(n), RayleighQuotient { a });
    let x0 = DVector::from_element(n, 1.0 / (n as f64).sqrt());
    (problem, x0)
}

fn bench_solvers(c: &mut Criterion) {
    let n = 50;
    let (problem, x0) = setup(n);
    let criterion = StoppingCriterion::new()
        .with_gradient_tolerance(1e-6)
        .with_max_iterations(10_000);

    let mut group = c.benchmark_group("rayleigh_sphere_50");

    group.bench_function("gradient_descent", |b| {
        b.iter(|| {
            let mut solver = GradientDescent::default();
            black_box(solver.optimize(&problem, &x0, &criterion).unwrap())
        })
    });

    group.bench_function("conjugate_gradient", |b| {
        b.iter(|| {
            let mut solver = ConjugateGradient::default();
            black_box(solver.optimize(&problem, &x0, &criterion).unwrap())
        })
    });

    group.bench_function("trust_region_exact", |b| {
        b.iter(|| {
            let config = TrustRegionConfig::new().with_hessian_mode(HessianMode::Exact);
            let mut solver = TrustRegion::new(config);
            black_box(solver.optimize(&problem, &x0, &criterion).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_solvers);
criterion_main!(benches);
