//! Problem definition: a manifold bound to a cost function.
//!
//! [`Problem`] is the immutable package a solver minimizes. It owns the
//! manifold and the cost oracle and composes the two: Euclidean derivatives
//! from the oracle are converted into Riemannian quantities through the
//! manifold's projection and curvature correction. The problem itself caches
//! nothing; wrap the oracle in
//! [`CachedCostFunction`](crate::cached_cost::CachedCostFunction) when
//! evaluations are expensive.

use crate::{
    cost::CostFunction,
    error::Result,
    manifold::Manifold,
    types::Scalar,
};
use std::marker::PhantomData;

/// An optimization problem: minimize `cost_fn` over `manifold`.
#[derive(Debug, Clone)]
pub struct Problem<T, M, C>
where
    T: Scalar,
    M: Manifold<T>,
    C: CostFunction<T, Point = M::Point, TangentVector = M::TangentVector>,
{
    manifold: M,
    cost_fn: C,
    _scalar: PhantomData<T>,
}

impl<T, M, C> Problem<T, M, C>
where
    T: Scalar,
    M: Manifold<T>,
    C: CostFunction<T, Point = M::Point, TangentVector = M::TangentVector>,
{
    /// Binds a manifold and a cost function.
    pub fn new(manifold: M, cost_fn: C) -> Self {
        Self {
            manifold,
            cost_fn,
            _scalar: PhantomData,
        }
    }

    /// The manifold being optimized over.
    pub fn manifold(&self) -> &M {
        &self.manifold
    }

    /// The wrapped cost function.
    pub fn cost_fn(&self) -> &C {
        &self.cost_fn
    }

    /// Evaluates the objective at `point`.
    pub fn cost(&self, point: &M::Point) -> Result<T> {
        self.cost_fn.cost(point)
    }

    /// Evaluates the Euclidean gradient at `point`.
    pub fn euclidean_gradient(&self, point: &M::Point) -> Result<M::TangentVector> {
        self.cost_fn.euclidean_gradient(point)
    }

    /// Evaluates the Riemannian gradient at `point`.
    pub fn riemannian_gradient(&self, point: &M::Point) -> Result<M::TangentVector> {
        let egrad = self.cost_fn.euclidean_gradient(point)?;
        self.manifold
            .euclidean_to_riemannian_gradient(point, &egrad)
    }

    /// Evaluates cost and Riemannian gradient together.
    pub fn cost_and_riemannian_gradient(
        &self,
        point: &M::Point,
    ) -> Result<(T, M::TangentVector)> {
        let (value, egrad) = self.cost_fn.cost_and_gradient(point)?;
        let rgrad = self
            .manifold
            .euclidean_to_riemannian_gradient(point, &egrad)?;
        Ok((value, rgrad))
    }

    /// Evaluates the Riemannian Hessian-vector product at `point`.
    ///
    /// Composes the oracle's Euclidean Hessian product with the manifold's
    /// curvature correction. Fails with
    /// [`ManifoldError::NotImplemented`](crate::error::ManifoldError) when
    /// the oracle lacks a Hessian; solvers that require one should check
    /// [`provides_hessian`](Self::provides_hessian) before iterating and
    /// surface the condition as
    /// [`SolverError::OracleUnavailable`](crate::error::SolverError).
    pub fn riemannian_hessian_vector_product(
        &self,
        point: &M::Point,
        tangent: &M::TangentVector,
    ) -> Result<M::TangentVector> {
        let egrad = self.cost_fn.euclidean_gradient(point)?;
        let ehess_vec = self
            .cost_fn
            .euclidean_hessian_vector_product(point, tangent)?;
        self.manifold
            .euclidean_to_riemannian_hessian(point, &egrad, &ehess_vec, tangent)
    }

    /// Whether the underlying oracle supplies Hessian-vector products.
    pub fn provides_hessian(&self) -> bool {
        self.cost_fn.provides_hessian()
    }

    /// Norm of the Riemannian gradient at `point`.
    pub fn gradient_norm(&self, point: &M::Point) -> Result<T> {
        let rgrad = self.riemannian_gradient(point)?;
        self.manifold.norm(point, &rgrad)
    }
}
