//! Steihaug–Toint truncated conjugate gradient.
//!
//! Approximately minimizes the quadratic model
//! `m(s) = ⟨g, s⟩ + ½⟨s, H s⟩` over the trust region `‖s‖ ≤ Δ` in a single
//! tangent space. The Hessian enters only through a vector-product closure,
//! so the caller decides whether it is exact or approximated.
//!
//! The solve stops at the first of four terminal states: the residual
//! tolerance is met, a direction of negative curvature is found, the iterate
//! crosses the trust-region boundary, or the inner-iteration cap is hit. In
//! the curvature and boundary cases the step is moved to the boundary along
//! the current search direction, which is the model-optimal point on that
//! ray.

use geomopt_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::Scalar,
};
use num_traits::Float;

/// Terminal state of a truncated CG solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcgStatus {
    /// Residual dropped below the adaptive tolerance.
    ResidualConverged,
    /// A direction of negative curvature was detected; the step sits on the
    /// boundary.
    NegativeCurvature,
    /// The CG iterate left the trust region; the step sits on the boundary.
    BoundaryReached,
    /// Inner-iteration cap reached before any other condition.
    MaxInnerIterations,
}

/// Parameters of the truncated CG solve.
#[derive(Debug, Clone, Copy)]
pub struct TcgParams<T: Scalar> {
    /// κ in the residual tolerance `‖r₀‖ · min(κ, ‖r₀‖^θ)`.
    pub kappa: T,
    /// θ in the residual tolerance; θ = 1 gives locally superlinear outer
    /// convergence.
    pub theta: T,
    /// Inner-iteration cap; defaults to the manifold dimension.
    pub max_iterations: Option<usize>,
}

impl<T: Scalar> Default for TcgParams<T> {
    fn default() -> Self {
        Self {
            kappa: <T as Scalar>::from_f64(0.1),
            theta: T::one(),
            max_iterations: None,
        }
    }
}

impl<T: Scalar> TcgParams<T> {
    /// Creates parameters with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets κ.
    pub fn with_kappa(mut self, kappa: T) -> Self {
        self.kappa = kappa;
        self
    }

    /// Sets θ.
    pub fn with_theta(mut self, theta: T) -> Self {
        self.theta = theta;
        self
    }

    /// Sets the inner-iteration cap.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }
}

/// Result of a truncated CG solve.
#[derive(Debug, Clone)]
pub struct TcgResult<V> {
    /// Approximate minimizer of the model, `‖step‖ ≤ Δ`.
    pub step: V,
    /// Terminal state.
    pub status: TcgStatus,
    /// Number of inner iterations performed.
    pub iterations: usize,
}

impl<V> TcgResult<V> {
    fn new(step: V, status: TcgStatus, iterations: usize) -> Self {
        Self {
            step,
            status,
            iterations,
        }
    }
}

/// Positive root τ of `‖s + τ d‖² = Δ²`.
///
/// Exists whenever `‖s‖ < Δ` and `d ≠ 0`, which the caller guarantees.
fn boundary_tau<T: Scalar>(s_sq: T, sd: T, d_sq: T, radius: T) -> Result<T> {
    let two = <T as Scalar>::from_f64(2.0);
    let four = <T as Scalar>::from_f64(4.0);
    let b = two * sd;
    let c = s_sq - radius * radius;
    let discriminant = b * b - four * d_sq * c;
    if d_sq <= T::zero() || discriminant < T::zero() {
        return Err(ManifoldError::numerical_error(
            "trust-region boundary intersection is undefined",
        ));
    }
    Ok((-b + <T as Float>::sqrt(discriminant)) / (two * d_sq))
}

/// Runs truncated CG in the tangent space at `point`.
///
/// `gradient` is the Riemannian gradient at `point` and `hvp` applies the
/// (possibly approximate) Riemannian Hessian to a tangent vector. Every
/// tangent operation goes through the manifold, so the solve works for any
/// point representation.
pub fn solve<T, M, F>(
    manifold: &M,
    point: &M::Point,
    gradient: &M::TangentVector,
    radius: T,
    params: &TcgParams<T>,
    mut hvp: F,
) -> Result<TcgResult<M::TangentVector>>
where
    T: Scalar,
    M: Manifold<T>,
    F: FnMut(&M::TangentVector) -> Result<M::TangentVector>,
{
    let max_iterations = params
        .max_iterations
        .unwrap_or_else(|| manifold.dimension().max(1));

    let mut step = manifold.zero_tangent(point)?;
    let mut residual = gradient.clone();
    let mut direction = manifold.scale_tangent(point, -T::one(), gradient)?;

    let r0_norm = manifold.norm(point, &residual)?;
    if r0_norm < <T as Scalar>::EPSILON {
        return Ok(TcgResult::new(step, TcgStatus::ResidualConverged, 0));
    }
    // Tolerance tightens as the outer iteration approaches stationarity.
    let tolerance = r0_norm
        * <T as Float>::min(params.kappa, <T as Float>::powf(r0_norm, params.theta));

    let mut r_sq = r0_norm * r0_norm;
    let mut step_sq = T::zero();

    for k in 0..max_iterations {
        let hd = hvp(&direction)?;
        let curvature = manifold.inner_product(point, &direction, &hd)?;
        let d_sq = manifold.inner_product(point, &direction, &direction)?;
        let sd = manifold.inner_product(point, &step, &direction)?;

        if curvature <= T::zero() {
            let tau = boundary_tau(step_sq, sd, d_sq, radius)?;
            let step = manifold.axpy_tangent(point, tau, &direction, &step)?;
            return Ok(TcgResult::new(step, TcgStatus::NegativeCurvature, k + 1));
        }

        let alpha = r_sq / curvature;
        let next_sq = step_sq + two_alpha_terms(alpha, sd, d_sq);
        if next_sq >= radius * radius {
            let tau = boundary_tau(step_sq, sd, d_sq, radius)?;
            let step = manifold.axpy_tangent(point, tau, &direction, &step)?;
            return Ok(TcgResult::new(step, TcgStatus::BoundaryReached, k + 1));
        }

        step = manifold.axpy_tangent(point, alpha, &direction, &step)?;
        step_sq = next_sq;
        residual = manifold.axpy_tangent(point, alpha, &hd, &residual)?;

        let r_sq_next = manifold.inner_product(point, &residual, &residual)?;
        if <T as Float>::sqrt(r_sq_next) <= tolerance {
            return Ok(TcgResult::new(step, TcgStatus::ResidualConverged, k + 1));
        }

        let beta = r_sq_next / r_sq;
        let neg_residual = manifold.scale_tangent(point, -T::one(), &residual)?;
        direction = manifold.axpy_tangent(point, beta, &direction, &neg_residual)?;
        r_sq = r_sq_next;
    }

    Ok(TcgResult::new(
        step,
        TcgStatus::MaxInnerIterations,
        max_iterations,
    ))
}

/// `‖s + α d‖² - ‖s‖²` expanded: `2α⟨s, d⟩ + α²‖d‖²`.
fn two_alpha_terms<T: Scalar>(alpha: T, sd: T, d_sq: T) -> T {
    let two = <T as Scalar>::from_f64(2.0);
    two * alpha * sd + alpha * alpha * d_sq
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_boundary_tau_unit_case() {
        // s = 0, d unit, radius 2 -> tau = 2.
        let tau = boundary_tau(0.0, 0.0, 1.0, 2.0).unwrap();
        assert_relative_eq!(tau, 2.0);
    }

    #[test]
    fn test_boundary_tau_from_interior() {
        // s with ||s|| = 1 along d (unit): ||s + tau d|| = 3 -> tau = 2.
        let tau = boundary_tau(1.0, 1.0, 1.0, 3.0).unwrap();
        assert_relative_eq!(tau, 2.0);
    }

    #[test]
    fn test_boundary_tau_rejects_zero_direction() {
        assert!(boundary_tau(0.0_f64, 0.0, 0.0, 1.0).is_err());
    }
}
