//! Stiefel manifold St(n, p) of orthonormal n×p frames.
//!
//! Points are matrices X with XᵀX = I_p; the tangent space at X is
//! {V : XᵀV + VᵀX = 0}. Retraction is by thin QR decomposition, with the
//! usual sign convention on R's diagonal to make the factorization unique.

use geomopt_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::{DMatrix, Scalar},
};
use num_traits::Float;
use rand::Rng;
use rand_distr::StandardNormal;

/// The Stiefel manifold St(n, p), n ≥ p ≥ 1.
#[derive(Debug, Clone)]
pub struct Stiefel {
    n: usize,
    p: usize,
}

impl Stiefel {
    /// Creates St(n, p).
    ///
    /// # Panics
    ///
    /// Panics unless `n ≥ p ≥ 1`.
    pub fn new(n: usize, p: usize) -> Self {
        assert!(p >= 1 && n >= p, "Stiefel manifold requires n >= p >= 1");
        Self { n, p }
    }

    /// Number of rows n.
    pub fn rows(&self) -> usize {
        self.n
    }

    /// Number of columns p.
    pub fn cols(&self) -> usize {
        self.p
    }

    fn check_shape<T: Scalar>(&self, m: &DMatrix<T>) -> Result<()> {
        if m.nrows() != self.n || m.ncols() != self.p {
            return Err(ManifoldError::dimension_mismatch(
                self.n * self.p,
                m.nrows() * m.ncols(),
            ));
        }
        Ok(())
    }

    /// Symmetric part (A + Aᵀ)/2.
    fn sym<T: Scalar>(a: &DMatrix<T>) -> DMatrix<T> {
        let half = <T as Scalar>::from_f64(0.5);
        (a + a.transpose()) * half
    }

    /// Thin QR with positive diagonal of R, so the factor Q is unique and
    /// depends continuously on the input.
    fn qr_unique<T: Scalar>(m: DMatrix<T>) -> Result<DMatrix<T>> {
        let p = m.ncols();
        let qr = m.qr();
        let mut q = qr.q();
        let r = qr.r();
        for j in 0..p {
            if r[(j, j)] < T::zero() {
                for i in 0..q.nrows() {
                    q[(i, j)] = -q[(i, j)];
                }
            }
            if <T as Float>::abs(r[(j, j)]) < <T as Scalar>::EPSILON {
                return Err(ManifoldError::numerical_error(
                    "rank-deficient matrix in QR retraction",
                ));
            }
        }
        Ok(q)
    }
}

impl<T: Scalar> Manifold<T> for Stiefel {
    type Point = DMatrix<T>;
    type TangentVector = DMatrix<T>;

    fn name(&self) -> &str {
        "Stiefel"
    }

    fn dimension(&self) -> usize {
        self.n * self.p - self.p * (self.p + 1) / 2
    }

    fn is_point_on_manifold(&self, point: &Self::Point, tol: T) -> bool {
        if point.nrows() != self.n || point.ncols() != self.p {
            return false;
        }
        let gram = point.transpose() * point;
        let identity = DMatrix::<T>::identity(self.p, self.p);
        (gram - identity).norm() < tol
    }

    fn project_tangent(
        &self,
        point: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.check_shape(point)?;
        self.check_shape(vector)?;
        let xtv = point.transpose() * vector;
        Ok(vector - point * Self::sym(&xtv))
    }

    fn inner_product(
        &self,
        _point: &Self::Point,
        u: &Self::TangentVector,
        v: &Self::TangentVector,
    ) -> Result<T> {
        if u.shape() != v.shape() {
            return Err(ManifoldError::dimension_mismatch(
                u.nrows() * u.ncols(),
                v.nrows() * v.ncols(),
            ));
        }
        Ok(u.dot(v))
    }

    fn retract(
        &self,
        point: &Self::Point,
        tangent: &Self::TangentVector,
    ) -> Result<Self::Point> {
        self.check_shape(point)?;
        self.check_shape(tangent)?;
        Self::qr_unique(point + tangent)
    }

    /// First-order approximation: the projected difference.
    fn inverse_retract(
        &self,
        point: &Self::Point,
        other: &Self::Point,
    ) -> Result<Self::TangentVector> {
        self.check_shape(point)?;
        self.check_shape(other)?;
        let diff = other - point;
        self.project_tangent(point, &diff)
    }

    fn euclidean_to_riemannian_hessian(
        &self,
        point: &Self::Point,
        euclidean_grad: &Self::TangentVector,
        euclidean_hess_vec: &Self::TangentVector,
        tangent: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        // Hess f(X)[U] = P_X(∇²f(X)[U] - U sym(Xᵀ∇f(X)))
        let xtg = point.transpose() * euclidean_grad;
        let corrected = euclidean_hess_vec - tangent * Self::sym(&xtg);
        self.project_tangent(point, &corrected)
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
        Ok(DMatrix::zeros(self.n, self.p))
    }

    /// Q factor of a Gaussian matrix, which is Haar-distributed with the
    /// unique-QR sign convention.
    fn random_point(&self) -> Self::Point {
        let mut rng = rand::thread_rng();
        loop {
            let gaussian = DMatrix::from_fn(self.n, self.p, |_, _| {
                let sample: f64 = rng.sample(StandardNormal);
                <T as Scalar>::from_f64(sample)
            });
            if let Ok(q) = Self::qr_unique(gaussian) {
                return q;
            }
        }
    }

    fn random_tangent(&self, point: &Self::Point) -> Result<Self::TangentVector> {
        let mut rng = rand::thread_rng();
        for _ in 0..16 {
            let gaussian = DMatrix::from_fn(self.n, self.p, |_, _| {
                let sample: f64 = rng.sample(StandardNormal);
                <T as Scalar>::from_f64(sample)
            });
            let projected = self.project_tangent(point, &gaussian)?;
            let norm = projected.norm();
            if norm > <T as Scalar>::EPSILON {
                return Ok(projected / norm);
            }
        }
        Err(ManifoldError::numerical_error(
            "failed to draw a tangent vector on the Stiefel manifold",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn orthonormality_defect(x: &DMatrix<f64>) -> f64 {
        let p = x.ncols();
        (x.transpose() * x - DMatrix::<f64>::identity(p, p)).norm()
    }

    #[test]
    fn test_dimension_formula() {
        let st = Stiefel::new(5, 2);
        assert_eq!(<Stiefel as Manifold<f64>>::dimension(&st), 5 * 2 - 3);
    }

    #[test]
    fn test_random_point_is_orthonormal() {
        let st = Stiefel::new(6, 3);
        let x: DMatrix<f64> = st.random_point();
        assert!(orthonormality_defect(&x) < 1e-10);
        assert!(st.is_point_on_manifold(&x, 1e-8));
    }

    #[test]
    fn test_retraction_restores_orthonormality() {
        let st = Stiefel::new(5, 2);
        let x: DMatrix<f64> = st.random_point();
        let v = st.random_tangent(&x).unwrap();
        let scaled = st.scale_tangent(&x, 0.3, &v).unwrap();
        let y = st.retract(&x, &scaled).unwrap();
        assert!(orthonormality_defect(&y) < 1e-10);
    }

    #[test]
    fn test_zero_retraction_is_identity() {
        let st = Stiefel::new(4, 2);
        let x: DMatrix<f64> = st.random_point();
        let zero = st.zero_tangent(&x).unwrap();
        let y = st.retract(&x, &zero).unwrap();
        assert_relative_eq!(y, x, epsilon = 1e-10);
    }

    #[test]
    fn test_projected_vector_is_tangent() {
        let st = Stiefel::new(5, 3);
        let x: DMatrix<f64> = st.random_point();
        let v = st.random_tangent(&x).unwrap();
        // Tangency: XᵀV must be skew-symmetric.
        let xtv = x.transpose() * &v;
        assert!((&xtv + xtv.transpose()).norm() < 1e-10);
    }

    #[test]
    fn test_inverse_retract_points_toward_other() {
        let st = Stiefel::new(4, 2);
        let x: DMatrix<f64> = st.random_point();
        let v = st.random_tangent(&x).unwrap();
        let scaled = st.scale_tangent(&x, 0.05, &v).unwrap();
        let y = st.retract(&x, &scaled).unwrap();
        let log = st.inverse_retract(&x, &y).unwrap();
        // For small steps the projected difference approximates the step.
        assert!((log - scaled).norm() < 1e-2);
    }
}
