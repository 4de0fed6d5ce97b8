//! Core abstractions for Riemannian optimization.
//!
//! This crate defines the contracts the rest of the workspace builds on:
//!
//! - [`Manifold`](manifold::Manifold): the geometric capability set
//!   (projection, metric, retraction, transport) solvers rely on.
//! - [`CostFunction`](cost::CostFunction): the Euclidean derivative oracle,
//!   combined with a manifold into a [`Problem`](problem::Problem).
//! - [`StoppingCriterion`](solver::StoppingCriterion) and
//!   [`OptimizationResult`](solver::OptimizationResult): the shared outer-loop
//!   machinery, including per-iteration history and callbacks.
//! - [`BacktrackingLineSearch`](line_search::BacktrackingLineSearch): the
//!   Armijo search used by the first-order solvers.
//!
//! Manifold implementations live in `geomopt-manifolds`, solvers in
//! `geomopt-solvers`.

pub mod cached_cost;
pub mod callback;
pub mod cost;
pub mod error;
pub mod line_search;
pub mod manifold;
pub mod problem;
pub mod solver;
pub mod types;

#[cfg(test)]
mod test_utils;

/// Commonly used items, for glob import.
pub mod prelude {
    pub use crate::cached_cost::{CacheStats, CachedCostFunction};
    pub use crate::callback::{CallbackInfo, NoOpCallback, OptimizationCallback, PrintProgress};
    pub use crate::cost::CostFunction;
    pub use crate::error::{ManifoldError, Result, SolverError, SolverResult};
    pub use crate::line_search::{BacktrackingLineSearch, LineSearchParams, LineSearchResult};
    pub use crate::manifold::Manifold;
    pub use crate::problem::Problem;
    pub use crate::solver::{
        ConvergenceChecker, IterationRecord, OptimizationResult, Optimizer, OptimizerState,
        StoppingCriterion, TerminationReason,
    };
    pub use crate::types::{DMatrix, DVector, Scalar};
}
