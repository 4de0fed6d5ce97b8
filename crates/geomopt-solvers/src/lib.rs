//! Riemannian optimization solvers.
//!
//! Five solvers over the [`geomopt_core`] abstractions:
//!
//! - [`GradientDescent`]: steepest descent with Armijo backtracking.
//! - [`ConjugateGradient`]: nonlinear CG with transported directions and
//!   restart safeguards.
//! - [`TrustRegion`]: Newton-type trust region with a Steihaug–Toint
//!   truncated-CG subsolver and optional finite-difference Hessian.
//! - [`NelderMead`]: derivative-free simplex search.
//! - [`ParticleSwarm`]: derivative-free population search.
//!
//! All solvers implement [`geomopt_core::solver::Optimizer`] and share the
//! same stopping criteria, result record, and callback machinery.

pub mod conjugate_gradient;
pub mod gradient_descent;
pub mod nelder_mead;
pub mod particle_swarm;
pub mod trust_region;
pub mod truncated_cg;

pub use conjugate_gradient::{BetaRule, ConjugateGradient, ConjugateGradientConfig};
pub use gradient_descent::{GradientDescent, GradientDescentConfig};
pub use nelder_mead::{NelderMead, NelderMeadConfig};
pub use particle_swarm::{ParticleSwarm, ParticleSwarmConfig};
pub use trust_region::{HessianMode, TrustRegion, TrustRegionConfig, TrustRegionStats};
pub use truncated_cg::{TcgParams, TcgResult, TcgStatus};
