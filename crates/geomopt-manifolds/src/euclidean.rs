//! Euclidean space ℝⁿ.
//!
//! The flat manifold: tangent spaces coincide with the space itself, the
//! retraction is vector addition, and transport is the identity. Useful as a
//! correctness baseline for the solvers and for unconstrained problems.

use geomopt_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::{DVector, Scalar},
};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// ℝⁿ with the standard inner product.
#[derive(Debug, Clone)]
pub struct Euclidean {
    dim: usize,
}

impl Euclidean {
    /// Creates ℝⁿ for `dim = n ≥ 1`.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is zero.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 1, "Euclidean space requires dimension >= 1");
        Self { dim }
    }

    fn check_dim(&self, len: usize) -> Result<()> {
        if len != self.dim {
            return Err(ManifoldError::dimension_mismatch(self.dim, len));
        }
        Ok(())
    }
}

impl<T: Scalar> Manifold<T> for Euclidean {
    type Point = DVector<T>;
    type TangentVector = DVector<T>;

    fn name(&self) -> &str {
        "Euclidean"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_point_on_manifold(&self, point: &Self::Point, _tol: T) -> bool {
        point.len() == self.dim
    }

    fn project_tangent(
        &self,
        point: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.check_dim(point.len())?;
        self.check_dim(vector.len())?;
        Ok(vector.clone())
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

    fn retract(
        &self,
        point: &Self::Point,
        tangent: &Self::TangentVector,
    ) -> Result<Self::Point> {
        self.check_dim(point.len())?;
        self.check_dim(tangent.len())?;
        Ok(point + tangent)
    }

    fn inverse_retract(
        &self,
        point: &Self::Point,
        other: &Self::Point,
    ) -> Result<Self::TangentVector> {
        self.check_dim(point.len())?;
        self.check_dim(other.len())?;
        Ok(other - point)
    }

    fn transport(
        &self,
        _from: &Self::Point,
        _to: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        Ok(vector.clone())
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
        Ok(DVector::zeros(self.dim))
    }

    fn random_point(&self) -> Self::Point {
        let mut rng = rand::thread_rng();
        DVector::from_fn(self.dim, |_, _| {
            let sample: f64 = StandardNormal.sample(&mut rng);
            <T as Scalar>::from_f64(sample)
        })
    }

    fn random_tangent(&self, _point: &Self::Point) -> Result<Self::TangentVector> {
        let mut rng = rand::thread_rng();
        let v = DVector::from_fn(self.dim, |_, _| {
            let sample: f64 = rng.sample(StandardNormal);
            <T as Scalar>::from_f64(sample)
        });
        let norm = v.norm();
        if norm > T::zero() {
            Ok(v / norm)
        } else {
            Err(ManifoldError::numerical_error(
                "degenerate random tangent draw",
            ))
        }
    }

    fn distance(&self, x: &Self::Point, y: &Self::Point) -> Result<T> {
        self.check_dim(x.len())?;
        self.check_dim(y.len())?;
        Ok((y - x).norm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_retraction_is_addition() {
        let manifold = Euclidean::new(3);
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let v = DVector::from_vec(vec![0.1, -0.2, 0.3]);
        let y = manifold.retract(&x, &v).unwrap();
        assert_relative_eq!(y, &x + &v);
        let back = manifold.inverse_retract(&x, &y).unwrap();
        assert_relative_eq!(back, v, epsilon = 1e-14);
    }

    #[test]
    fn test_projection_is_identity() {
        let manifold = Euclidean::new(2);
        let x = DVector::from_vec(vec![0.0, 0.0]);
        let v = DVector::from_vec(vec![5.0, -7.0]);
        assert_relative_eq!(manifold.project_tangent(&x, &v).unwrap(), v);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let manifold = Euclidean::new(3);
        let x = DVector::from_vec(vec![1.0, 2.0]);
        let v = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(manifold.retract(&x, &v).is_err());
    }

    #[test]
    fn test_random_tangent_is_unit() {
        let manifold = Euclidean::new(5);
        let x = <Euclidean as Manifold<f64>>::random_point(&manifold);
        let v = manifold.random_tangent(&x).unwrap();
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
    }
}
