//! Cost function interface.
//!
//! A [`CostFunction`] supplies the objective value and its *Euclidean*
//! derivatives in the ambient representation space. The library never
//! differentiates anything itself; gradients and Hessian-vector products
//! come from an external oracle (an autodiff backend, a hand-derived
//! formula, ...) and are converted to their Riemannian counterparts by the
//! manifold via [`Problem`](crate::problem::Problem).

use crate::{
    error::{ManifoldError, Result},
    types::Scalar,
};
use std::fmt::Debug;

/// Trait for cost functions evaluated by the solvers.
///
/// Only `cost` and `euclidean_gradient` are required. The Hessian oracle is
/// optional: solvers that need second-order information query
/// [`provides_hessian`](CostFunction::provides_hessian) before starting and
/// either fail fast or fall back to a finite-difference approximation.
pub trait CostFunction<T: Scalar>: Debug {
    /// Point representation, matching the manifold the function is paired
    /// with.
    type Point: Clone + Debug + Send + Sync;

    /// Ambient vector representation (gradients, Hessian products).
    type TangentVector: Clone + Debug + Send + Sync;

    /// Evaluates the objective at `point`.
    fn cost(&self, point: &Self::Point) -> Result<T>;

    /// Evaluates the Euclidean gradient at `point`.
    fn euclidean_gradient(&self, point: &Self::Point) -> Result<Self::TangentVector>;

    /// Evaluates cost and Euclidean gradient together.
    ///
    /// Override when the two share intermediate computations.
    fn cost_and_gradient(&self, point: &Self::Point) -> Result<(T, Self::TangentVector)> {
        Ok((self.cost(point)?, self.euclidean_gradient(point)?))
    }

    /// Evaluates the Euclidean Hessian-vector product at `point`.
    ///
    /// The default reports the oracle as missing.
    fn euclidean_hessian_vector_product(
        &self,
        _point: &Self::Point,
        _vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        Err(ManifoldError::not_implemented(
            "Euclidean Hessian-vector product",
        ))
    }

    /// Whether a Hessian oracle is available.
    ///
    /// Must return `true` iff `euclidean_hessian_vector_product` is
    /// implemented.
    fn provides_hessian(&self) -> bool {
        false
    }
}
