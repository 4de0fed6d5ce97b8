//! Minimal flat manifold used by this crate's unit tests.

use crate::{error::Result, manifold::Manifold, types::DVector};
use rand::Rng;

/// ℝⁿ with the Euclidean metric and identity retraction.
#[derive(Debug, Clone)]
pub struct TestEuclidean {
    dim: usize,
}

impl TestEuclidean {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Manifold<f64> for TestEuclidean {
    type Point = DVector<f64>;
    type TangentVector = DVector<f64>;

    fn name(&self) -> &str {
        "TestEuclidean"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_point_on_manifold(&self, point: &Self::Point, _tol: f64) -> bool {
        point.len() == self.dim
    }

    fn project_tangent(
        &self,
        _point: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        Ok(vector.clone())
    }

    fn inner_product(
        &self,
        _point: &Self::Point,
        u: &Self::TangentVector,
        v: &Self::TangentVector,
    ) -> Result<f64> {
        Ok(u.dot(v))
    }

    fn retract(
        &self,
        point: &Self::Point,
        tangent: &Self::TangentVector,
    ) -> Result<Self::Point> {
        Ok(point + tangent)
    }

    fn inverse_retract(
        &self,
        point: &Self::Point,
        other: &Self::Point,
    ) -> Result<Self::TangentVector> {
        Ok(other - point)
    }

    fn scale_tangent(
        &self,
        _point: &Self::Point,
        alpha: f64,
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
        DVector::from_fn(self.dim, |_, _| rng.gen_range(-1.0..1.0))
    }

    fn random_tangent(&self, _point: &Self::Point) -> Result<Self::TangentVector> {
        let mut rng = rand::thread_rng();
        let v = DVector::from_fn(self.dim, |_, _| rng.gen_range(-1.0..1.0));
        let norm = v.norm();
        if norm > 0.0 {
            Ok(v / norm)
        } else {
            Ok(DVector::from_element(self.dim, 1.0) / (self.dim as f64).sqrt())
        }
    }
}
