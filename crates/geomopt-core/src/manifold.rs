//! Core manifold trait.
//!
//! A Riemannian manifold (ℳ, g) is a smooth space that locally resembles
//! Euclidean space, equipped with a metric g giving each tangent space
//! T_p ℳ an inner product. Solvers interact with manifolds exclusively
//! through this trait, so a solver written once runs on the sphere, the
//! Stiefel manifold, the SPD cone, or anything else implementing the
//! capability set below.
//!
//! Key operations and the properties implementations must preserve:
//!
//! - **Tangent projection** P_p: ℝⁿ → T_p ℳ is idempotent and linear.
//! - **Metric** ⟨·,·⟩_p is symmetric, bilinear, positive definite.
//! - **Retraction** R_p: T_p ℳ → ℳ satisfies R_p(0) = p and agrees with
//!   the exponential map to first order; its image is always feasible.
//! - **Transport** moves a tangent vector between tangent spaces; the
//!   default projects onto the destination tangent space, which is a valid
//!   vector transport though not true parallel transport.
//!
//! Tangent vectors are meaningful only together with the point they are
//! anchored at. Combining vectors anchored at different points without an
//! explicit [`transport`](Manifold::transport) is a logic error the type
//! system cannot catch; solvers in this workspace are written to respect it.

use crate::{error::Result, types::Scalar};
use num_traits::Float;
use std::fmt::Debug;

/// Trait for Riemannian manifolds.
///
/// Implementations are immutable and cheaply shareable; all methods take
/// `&self` and the same manifold value may serve any number of concurrent
/// solver runs.
pub trait Manifold<T: Scalar>: Debug + Send + Sync {
    /// Representation of a point on the manifold.
    type Point: Clone + Debug + Send + Sync;

    /// Representation of a tangent vector. Same numeric shape as a point,
    /// but semantically distinct: a tangent vector is generally not a valid
    /// point.
    type TangentVector: Clone + Debug + Send + Sync;

    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &str;

    /// Intrinsic real dimension of the manifold.
    ///
    /// Used for default inner-iteration caps and for sizing the
    /// derivative-free solver's simplex.
    fn dimension(&self) -> usize;

    /// Checks whether `point` satisfies the membership constraint within
    /// `tol`.
    fn is_point_on_manifold(&self, point: &Self::Point, tol: T) -> bool;

    /// Projects an ambient vector onto the tangent space at `point`.
    fn project_tangent(
        &self,
        point: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector>;

    /// Riemannian inner product ⟨u, v⟩ at `point`.
    fn inner_product(
        &self,
        point: &Self::Point,
        u: &Self::TangentVector,
        v: &Self::TangentVector,
    ) -> Result<T>;

    /// Norm of a tangent vector, `sqrt(⟨v, v⟩)`.
    fn norm(&self, point: &Self::Point, vector: &Self::TangentVector) -> Result<T> {
        self.inner_product(point, vector, vector)
            .map(|ip| <T as Float>::sqrt(ip))
    }

    /// Retracts a tangent vector onto the manifold: R_p(v).
    fn retract(&self, point: &Self::Point, tangent: &Self::TangentVector)
        -> Result<Self::Point>;

    /// Inverse retraction (logarithm-like map): a tangent vector at `point`
    /// pointing toward `other`, with `retract(point, inverse_retract(point,
    /// other)) ≈ other` near `point`.
    ///
    /// Exact on manifolds with closed-form logarithms, a first-order
    /// approximation elsewhere.
    fn inverse_retract(
        &self,
        point: &Self::Point,
        other: &Self::Point,
    ) -> Result<Self::TangentVector>;

    /// Transports a tangent vector from the tangent space at `from` to the
    /// tangent space at `to`.
    ///
    /// The default projects onto the destination tangent space.
    fn transport(
        &self,
        _from: &Self::Point,
        to: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.project_tangent(to, vector)
    }

    /// Converts a Euclidean gradient into the Riemannian gradient.
    ///
    /// For embedded manifolds with the induced metric this is the tangent
    /// projection; manifolds with a non-Euclidean metric override it.
    fn euclidean_to_riemannian_gradient(
        &self,
        point: &Self::Point,
        euclidean_grad: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.project_tangent(point, euclidean_grad)
    }

    /// Converts Euclidean second-order data into a Riemannian
    /// Hessian-vector product.
    ///
    /// Given the Euclidean gradient, the Euclidean Hessian applied to
    /// `tangent`, and `tangent` itself, returns Hess f(p)[tangent]. The
    /// default projects `euclidean_hess_vec`, which is only exact for flat
    /// embeddings; curved manifolds override this with their curvature
    /// correction term.
    fn euclidean_to_riemannian_hessian(
        &self,
        point: &Self::Point,
        _euclidean_grad: &Self::TangentVector,
        euclidean_hess_vec: &Self::TangentVector,
        _tangent: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.project_tangent(point, euclidean_hess_vec)
    }

    /// Scales a tangent vector: `alpha * tangent`.
    fn scale_tangent(
        &self,
        point: &Self::Point,
        alpha: T,
        tangent: &Self::TangentVector,
    ) -> Result<Self::TangentVector>;

    /// Adds two tangent vectors anchored at the same point.
    fn add_tangents(
        &self,
        point: &Self::Point,
        a: &Self::TangentVector,
        b: &Self::TangentVector,
    ) -> Result<Self::TangentVector>;

    /// Computes `alpha * x + y` in the tangent space at `point`.
    fn axpy_tangent(
        &self,
        point: &Self::Point,
        alpha: T,
        x: &Self::TangentVector,
        y: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        let scaled = self.scale_tangent(point, alpha, x)?;
        self.add_tangents(point, &scaled, y)
    }

    /// The zero tangent vector at `point`.
    fn zero_tangent(&self, point: &Self::Point) -> Result<Self::TangentVector>;

    /// Draws a random point, distributed so that repeated draws explore the
    /// whole manifold.
    fn random_point(&self) -> Self::Point;

    /// Draws a random unit-norm tangent vector at `point`.
    fn random_tangent(&self, point: &Self::Point) -> Result<Self::TangentVector>;

    /// Geodesic (or retraction-consistent) distance between two points.
    fn distance(&self, x: &Self::Point, y: &Self::Point) -> Result<T> {
        let log = self.inverse_retract(x, y)?;
        self.norm(x, &log)
    }
}
