//! Riemannian optimization in Rust.
//!
//! Optimizes smooth (and not-so-smooth) objectives over curved parameter
//! spaces: unit spheres, orthonormal frames, the positive definite cone.
//! The constraint is carried by the manifold itself, so every iterate of
//! every solver is feasible by construction.
//!
//! # Quick start
//!
//! Maximize the Rayleigh quotient `xᵀAx` on the unit sphere (equivalently,
//! minimize its negation) to find the dominant eigenvector:
//!
//! ```
//! use geomopt::prelude::*;
//! use nalgebra::{DMatrix, DVector};
//!
//! #[derive(Debug)]
//! struct Rayleigh {
//!     a: DMatrix<f64>,
//! }
//!
//! impl CostFunction<f64> for Rayleigh {
//!     type Point = DVector<f64>;
//!     type TangentVector = DVector<f64>;
//!
//!     fn cost(&self, x: &Self::Point) -> Result<f64> {
//!         Ok(-x.dot(&(&self.a * x)))
//!     }
//!
//!     fn euclidean_gradient(&self, x: &Self::Point) -> Result<Self::TangentVector> {
//!         Ok(&self.a * x * -2.0)
//!     }
//! }
//!
//! # fn main() -> SolverResult<()> {
//! let a = DMatrix::from_diagonal(&DVector::from_vec(vec![3.0, 1.0, 0.5]));
//! let problem = Problem::new(Sphere::new(3), Rayleigh { a });
//! let x0 = DVector::from_vec(vec![1.0, 1.0, 1.0]).normalize();
//!
//! let mut solver = GradientDescent::default();
//! let result = solver.optimize(&problem, &x0, &StoppingCriterion::default())?;
//!
//! assert!(result.converged);
//! assert!((result.value - (-3.0)).abs() < 1e-4);
//! # Ok(())
//! # }
//! ```
//!
//! # Crates
//!
//! - [`core`](geomopt_core): traits, errors, line search, stopping criteria.
//! - [`manifolds`](geomopt_manifolds): `Euclidean`, `Sphere`, `Stiefel`,
//!   `SymmetricPositiveDefinite`.
//! - [`solvers`](geomopt_solvers): `GradientDescent`, `ConjugateGradient`,
//!   `TrustRegion`, `NelderMead`, `ParticleSwarm`.

pub use geomopt_core as core;
pub use geomopt_manifolds as manifolds;
pub use geomopt_solvers as solvers;

/// Everything needed to define and solve a problem, for glob import.
pub mod prelude {
    pub use geomopt_core::prelude::*;
    pub use geomopt_manifolds::{Euclidean, Sphere, Stiefel, SymmetricPositiveDefinite};
    pub use geomopt_solvers::{
        BetaRule, ConjugateGradient, ConjugateGradientConfig, GradientDescent,
        GradientDescentConfig, HessianMode, NelderMead, NelderMeadConfig, ParticleSwarm,
        ParticleSwarmConfig, TcgParams, TcgStatus, TrustRegion, TrustRegionConfig,
        TrustRegionStats,
    };
}
