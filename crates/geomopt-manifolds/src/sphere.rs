//! Unit sphere S^{n-1} ⊂ ℝⁿ.
//!
//! Points are unit vectors; the tangent space at x is the hyperplane
//! orthogonal to x. The sphere has closed-form exponential and logarithm
//! maps and exact parallel transport, so it doubles as the reference
//! geometry for validating solver behavior on a curved space.

use geomopt_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::{DVector, Scalar},
};
use num_traits::Float;
use rand::Rng;
use rand_distr::StandardNormal;

/// The unit sphere S^{n-1} embedded in ℝⁿ.
#[derive(Debug, Clone)]
pub struct Sphere {
    ambient_dim: usize,
}

impl Sphere {
    /// Creates S^{n-1} for ambient dimension `n ≥ 2`.
    ///
    /// # Panics
    ///
    /// Panics if `ambient_dim < 2`.
    pub fn new(ambient_dim: usize) -> Self {
        assert!(ambient_dim >= 2, "sphere requires ambient dimension >= 2");
        Self { ambient_dim }
    }

    /// Ambient dimension n.
    pub fn ambient_dim(&self) -> usize {
        self.ambient_dim
    }

    fn check_dim<T: Scalar>(&self, v: &DVector<T>) -> Result<()> {
        if v.len() != self.ambient_dim {
            return Err(ManifoldError::dimension_mismatch(self.ambient_dim, v.len()));
        }
        Ok(())
    }

    /// Geodesic angle between two points, clamped against roundoff.
    fn angle<T: Scalar>(x: &DVector<T>, y: &DVector<T>) -> T {
        let cos = num_traits::clamp(x.dot(y), -T::one(), T::one());
        <T as Float>::acos(cos)
    }
}

impl<T: Scalar> Manifold<T> for Sphere {
    type Point = DVector<T>;
    type TangentVector = DVector<T>;

    fn name(&self) -> &str {
        "Sphere"
    }

    fn dimension(&self) -> usize {
        self.ambient_dim - 1
    }

    fn is_point_on_manifold(&self, point: &Self::Point, tol: T) -> bool {
        point.len() == self.ambient_dim
            && <T as Float>::abs(point.norm() - T::one()) < tol
    }

    fn project_tangent(
        &self,
        point: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.check_dim(point)?;
        self.check_dim(vector)?;
        Ok(vector - point * point.dot(vector))
    }

    fn inner_product(
        &self,
        _point: &Self::Point,
        u: &Self::TangentVector,
        v: &Self::TangentVector,
    ) -> Result<T> {
        if u.len() != v.len() {
            return Err(ManifoldError::dimension_mismatch(u.len(), v.len()));
        }
        Ok(u.dot(v))
    }

    /// Exponential map: follows the great circle in direction `tangent`.
    fn retract(
        &self,
        point: &Self::Point,
        tangent: &Self::TangentVector,
    ) -> Result<Self::Point> {
        self.check_dim(point)?;
        self.check_dim(tangent)?;
        let theta = tangent.norm();
        if theta < <T as Scalar>::EPSILON {
            // First-order fallback keeps the result exactly feasible.
            let moved = point + tangent;
            let norm = moved.norm();
            if norm <= T::zero() {
                return Err(ManifoldError::numerical_error(
                    "degenerate retraction on the sphere",
                ));
            }
            return Ok(moved / norm);
        }
        Ok(point * <T as Float>::cos(theta) + tangent * (<T as Float>::sin(theta) / theta))
    }

    /// Logarithm map: the tangent vector whose exponential reaches `other`.
    fn inverse_retract(
        &self,
        point: &Self::Point,
        other: &Self::Point,
    ) -> Result<Self::TangentVector> {
        self.check_dim(point)?;
        self.check_dim(other)?;
        let theta = Self::angle(point, other);
        let projected = self.project_tangent(point, other)?;
        let norm = projected.norm();
        if norm < <T as Scalar>::EPSILON {
            // Identical points, or antipodal ones where the logarithm is not
            // unique; return zero in both cases.
            return Ok(DVector::zeros(self.ambient_dim));
        }
        Ok(projected * (theta / norm))
    }

    /// Parallel transport along the connecting geodesic.
    ///
    /// Exact: components orthogonal to the geodesic plane are unchanged,
    /// the component along the geodesic direction is rotated with it.
    fn transport(
        &self,
        from: &Self::Point,
        to: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.check_dim(vector)?;
        let log = self.inverse_retract(from, to)?;
        let theta = log.norm();
        if theta < <T as Scalar>::EPSILON {
            return self.project_tangent(to, vector);
        }
        let unit = log / theta;
        let along = unit.dot(vector);
        let rotated =
            vector + (&unit * (<T as Float>::cos(theta) - T::one()) - from * <T as Float>::sin(theta)) * along;
        // Projection scrubs the residual normal component from roundoff.
        self.project_tangent(to, &rotated)
    }

    fn euclidean_to_riemannian_hessian(
        &self,
        point: &Self::Point,
        euclidean_grad: &Self::TangentVector,
        euclidean_hess_vec: &Self::TangentVector,
        tangent: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        // Hess f(x)[u] = P_x(∇²f(x)[u]) - (xᵀ∇f(x)) u
        let projected = self.project_tangent(point, euclidean_hess_vec)?;
        let normal_component = point.dot(euclidean_grad);
        Ok(projected - tangent * normal_component)
    }

    fn scale_tangent(
        &self,
        _point: &Self::Point,
        alpha: T,
        tangent: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        Ok(tangent * alpha)
    }

    fn add_tangents(
        &self,
        _point: &Self::Point,
        a: &Self::TangentVector,
        b: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        Ok(a + b)
    }

    fn zero_tangent(&self, _point: &Self::Point) -> Result<Self::TangentVector> {
        Ok(DVector::zeros(self.ambient_dim))
    }

    /// Uniform draw: a normalized Gaussian vector.
    fn random_point(&self) -> Self::Point {
        let mut rng = rand::thread_rng();
        loop {
            let v = DVector::from_fn(self.ambient_dim, |_, _| {
                let sample: f64 = rng.sample(StandardNormal);
                <T as Scalar>::from_f64(sample)
            });
            let norm = v.norm();
            if norm > <T as Scalar>::EPSILON {
                return v / norm;
            }
        }
    }

    fn random_tangent(&self, point: &Self::Point) -> Result<Self::TangentVector> {
        let mut rng = rand::thread_rng();
        for _ in 0..16 {
            let v = DVector::from_fn(self.ambient_dim, |_, _| {
                let sample: f64 = rng.sample(StandardNormal);
                <T as Scalar>::from_f64(sample)
            });
            let projected = self.project_tangent(point, &v)?;
            let norm = projected.norm();
            if norm > <T as Scalar>::EPSILON {
                return Ok(projected / norm);
            }
        }
        Err(ManifoldError::numerical_error(
            "failed to draw a tangent vector on the sphere",
        ))
    }

    /// Geodesic distance: the angle between the two unit vectors.
    fn distance(&self, x: &Self::Point, y: &Self::Point) -> Result<T> {
        self.check_dim(x)?;
        self.check_dim(y)?;
        Ok(Self::angle(x, y))
    }
}
