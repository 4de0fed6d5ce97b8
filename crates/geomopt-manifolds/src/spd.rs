//! Symmetric positive definite matrices with the affine-invariant metric.
//!
//! Points are SPD matrices P; tangent vectors are symmetric matrices. Under
//! the affine-invariant metric ⟨U, V⟩_P = tr(P⁻¹U P⁻¹V) the manifold is
//! geodesically complete and the cone boundary sits at infinite distance,
//! which is what makes the geometry worthwhile over plain Euclidean
//! treatment of the entries. All P⁻¹ applications go through a Cholesky
//! factorization; a factorization failure means the point left the cone and
//! is reported as a numerical error.

use geomopt_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::{DMatrix, Scalar},
};
use nalgebra::Cholesky;
use num_traits::Float;
use rand::Rng;
use rand_distr::StandardNormal;

/// The manifold of n×n symmetric positive definite matrices.
#[derive(Debug, Clone)]
pub struct SymmetricPositiveDefinite {
    n: usize,
}

impl SymmetricPositiveDefinite {
    /// Creates the SPD manifold for n×n matrices, n ≥ 1.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn new(n: usize) -> Self {
        assert!(n >= 1, "SPD manifold requires n >= 1");
        Self { n }
    }

    /// Matrix size n.
    pub fn size(&self) -> usize {
        self.n
    }

    fn check_shape<T: Scalar>(&self, m: &DMatrix<T>) -> Result<()> {
        if m.nrows() != self.n || m.ncols() != self.n {
            return Err(ManifoldError::dimension_mismatch(
                self.n * self.n,
                m.nrows() * m.ncols(),
            ));
        }
        Ok(())
    }

    fn sym<T: Scalar>(a: &DMatrix<T>) -> DMatrix<T> {
        let half = <T as Scalar>::from_f64(0.5);
        (a + a.transpose()) * half
    }

    fn cholesky<T: Scalar>(point: &DMatrix<T>) -> Result<Cholesky<T, nalgebra::Dyn>> {
        Cholesky::new(point.clone()).ok_or_else(|| {
            ManifoldError::numerical_error("Cholesky factorization failed: point is not positive definite")
        })
    }

    /// L⁻¹ A L⁻ᵀ for the Cholesky factor L of the base point.
    fn whiten<T: Scalar>(l: &DMatrix<T>, a: &DMatrix<T>) -> Result<DMatrix<T>> {
        let left = l.solve_lower_triangular(a).ok_or_else(|| {
            ManifoldError::numerical_error("singular Cholesky factor")
        })?;
        let right_t = l.solve_lower_triangular(&left.transpose()).ok_or_else(|| {
            ManifoldError::numerical_error("singular Cholesky factor")
        })?;
        Ok(right_t.transpose())
    }
}

impl<T: Scalar> Manifold<T> for SymmetricPositiveDefinite {
    type Point = DMatrix<T>;
    type TangentVector = DMatrix<T>;

    fn name(&self) -> &str {
        "SymmetricPositiveDefinite"
    }

    fn dimension(&self) -> usize {
        self.n * (self.n + 1) / 2
    }

    fn is_point_on_manifold(&self, point: &Self::Point, tol: T) -> bool {
        if point.nrows() != self.n || point.ncols() != self.n {
            return false;
        }
        if (point - point.transpose()).norm() >= tol {
            return false;
        }
        Cholesky::new(point.clone()).is_some()
    }

    /// Projection onto symmetric matrices.
    fn project_tangent(
        &self,
        point: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.check_shape(point)?;
        self.check_shape(vector)?;
        Ok(Self::sym(vector))
    }

    /// Affine-invariant metric tr(P⁻¹U P⁻¹V).
    fn inner_product(
        &self,
        point: &Self::Point,
        u: &Self::TangentVector,
        v: &Self::TangentVector,
    ) -> Result<T> {
        self.check_shape(point)?;
        self.check_shape(u)?;
        self.check_shape(v)?;
        let chol = Self::cholesky(point)?;
        let pinv_u = chol.solve(u);
        let pinv_v = chol.solve(v);
        Ok((pinv_u * pinv_v).trace())
    }

    /// Second-order retraction P + V + ½ V P⁻¹ V, symmetrized.
    ///
    /// Agrees with the affine-invariant exponential to second order and
    /// stays inside the cone for any step that the exponential's Taylor
    /// truncation keeps positive.
    fn retract(
        &self,
        point: &Self::Point,
        tangent: &Self::TangentVector,
    ) -> Result<Self::Point> {
        self.check_shape(point)?;
        self.check_shape(tangent)?;
        let chol = Self::cholesky(point)?;
        let pinv_v = chol.solve(tangent);
        let half = <T as Scalar>::from_f64(0.5);
        let candidate = point + tangent + (tangent * pinv_v) * half;
        let candidate = Self::sym(&candidate);
        // The quadratic correction can still overshoot the cone for very
        // large steps; fail loudly rather than return an infeasible point.
        if Cholesky::new(candidate.clone()).is_none() {
            return Err(ManifoldError::numerical_error(
                "retraction left the positive definite cone",
            ));
        }
        Ok(candidate)
    }

    /// Affine-invariant logarithm L log(L⁻¹ Q L⁻ᵀ) Lᵀ.
    fn inverse_retract(
        &self,
        point: &Self::Point,
        other: &Self::Point,
    ) -> Result<Self::TangentVector> {
        self.check_shape(point)?;
        self.check_shape(other)?;
        let chol = Self::cholesky(point)?;
        let l = chol.l();
        let whitened = Self::whiten(&l, other)?;
        let eig = Self::sym(&whitened).symmetric_eigen();
        let mut log_diag = DMatrix::zeros(self.n, self.n);
        for i in 0..self.n {
            let lambda = eig.eigenvalues[i];
            if lambda <= T::zero() {
                return Err(ManifoldError::numerical_error(
                    "logarithm undefined: target is not positive definite",
                ));
            }
            log_diag[(i, i)] = <T as Float>::ln(lambda);
        }
        let log_whitened = &eig.eigenvectors * log_diag * eig.eigenvectors.transpose();
        let result = &l * log_whitened * l.transpose();
        Ok(Self::sym(&result))
    }

    /// P sym(G) P: the metric gradient conversion.
    fn euclidean_to_riemannian_gradient(
        &self,
        point: &Self::Point,
        euclidean_grad: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        self.check_shape(point)?;
        self.check_shape(euclidean_grad)?;
        Ok(point * Self::sym(euclidean_grad) * point)
    }

    fn euclidean_to_riemannian_hessian(
        &self,
        point: &Self::Point,
        euclidean_grad: &Self::TangentVector,
        euclidean_hess_vec: &Self::TangentVector,
        tangent: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        // Hess f(P)[V] = P sym(∇²f[V]) P + sym(V sym(∇f) P)
        self.check_shape(point)?;
        let sym_grad = Self::sym(euclidean_grad);
        let first = point * Self::sym(euclidean_hess_vec) * point;
        let second = tangent * sym_grad * point;
        Ok(first + Self::sym(&second))
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
        Ok(DMatrix::zeros(self.n, self.n))
    }

    /// Q exp(D) Qᵀ for a random orthogonal Q and log-uniform eigenvalues,
    /// giving well-conditioned draws away from the cone boundary.
    fn random_point(&self) -> Self::Point {
        let mut rng = rand::thread_rng();
        loop {
            let gaussian = DMatrix::from_fn(self.n, self.n, |_, _| {
                let sample: f64 = rng.sample(StandardNormal);
                <T as Scalar>::from_f64(sample)
            });
            let q = gaussian.qr().q();
            let mut diag = DMatrix::zeros(self.n, self.n);
            for i in 0..self.n {
                let exponent: f64 = rng.gen_range(-1.0..1.0);
                diag[(i, i)] = <T as Scalar>::from_f64(exponent.exp());
            }
            let candidate = &q * diag * q.transpose();
            let candidate = Self::sym(&candidate);
            if Cholesky::new(candidate.clone()).is_some() {
                return candidate;
            }
        }
    }

    fn random_tangent(&self, point: &Self::Point) -> Result<Self::TangentVector> {
        let mut rng = rand::thread_rng();
        for _ in 0..16 {
            let gaussian = DMatrix::from_fn(self.n, self.n, |_, _| {
                let sample: f64 = rng.sample(StandardNormal);
                <T as Scalar>::from_f64(sample)
            });
            let symmetric = Self::sym(&gaussian);
            let norm = self.norm(point, &symmetric)?;
            if norm > <T as Scalar>::EPSILON {
                return self.scale_tangent(point, T::one() / norm, &symmetric);
            }
        }
        Err(ManifoldError::numerical_error(
            "failed to draw a tangent vector on the SPD manifold",
        ))
    }

    /// Affine-invariant distance: the norm of the whitened log spectrum.
    fn distance(&self, x: &Self::Point, y: &Self::Point) -> Result<T> {
        self.check_shape(x)?;
        self.check_shape(y)?;
        let chol = Self::cholesky(x)?;
        let l = chol.l();
        let whitened = Self::whiten(&l, y)?;
        let eig = Self::sym(&whitened).symmetric_eigen();
        let mut sum = T::zero();
        for i in 0..self.n {
            let lambda = eig.eigenvalues[i];
            if lambda <= T::zero() {
                return Err(ManifoldError::numerical_error(
                    "distance undefined: target is not positive definite",
                ));
            }
            let log_lambda = <T as Float>::ln(lambda);
            sum = sum + log_lambda * log_lambda;
        }
        Ok(<T as Float>::sqrt(sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spd2(a: f64, b: f64, c: f64) -> DMatrix<f64> {
        // [[a, b], [b, c]], assumed SPD by the caller.
        DMatrix::from_row_slice(2, 2, &[a, b, b, c])
    }

    #[test]
    fn test_random_point_is_spd() {
        let spd = SymmetricPositiveDefinite::new(3);
        let p: DMatrix<f64> = spd.random_point();
        assert!(spd.is_point_on_manifold(&p, 1e-8));
    }

    #[test]
    fn test_retraction_stays_in_cone() {
        let spd = SymmetricPositiveDefinite::new(2);
        let p = spd2(2.0, 0.3, 1.5);
        let v = spd2(0.2, -0.1, 0.1);
        let q = spd.retract(&p, &v).unwrap();
        assert!(spd.is_point_on_manifold(&q, 1e-8));
    }

    #[test]
    fn test_zero_retraction_is_identity() {
        let spd = SymmetricPositiveDefinite::new(2);
        let p = spd2(2.0, 0.3, 1.5);
        let zero = spd.zero_tangent(&p).unwrap();
        let q = spd.retract(&p, &zero).unwrap();
        assert_relative_eq!(q, p, epsilon = 1e-12);
    }

    #[test]
    fn test_norm_is_positive_definite() {
        let spd = SymmetricPositiveDefinite::new(2);
        let p = spd2(2.0, 0.3, 1.5);
        let v = spd2(0.2, -0.1, 0.4);
        let norm: f64 = spd.norm(&p, &v).unwrap();
        assert!(norm > 0.0);
        let zero = spd.zero_tangent(&p).unwrap();
        assert_relative_eq!(spd.norm(&p, &zero).unwrap(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_inner_product_is_affine_invariant_at_identity() {
        let spd = SymmetricPositiveDefinite::new(2);
        let identity = DMatrix::<f64>::identity(2, 2);
        let u = spd2(1.0, 0.0, -1.0);
        // At the identity the metric reduces to the Frobenius product.
        let ip = spd.inner_product(&identity, &u, &u).unwrap();
        assert_relative_eq!(ip, u.norm_squared(), epsilon = 1e-12);
    }

    #[test]
    fn test_distance_scales_logarithmically() {
        let spd = SymmetricPositiveDefinite::new(2);
        let identity = DMatrix::<f64>::identity(2, 2);
        let scaled = &identity * 4.0;
        // d(I, cI) = sqrt(n) * ln(c)
        let d = spd.distance(&identity, &scaled).unwrap();
        assert_relative_eq!(d, (2.0f64).sqrt() * 4.0f64.ln(), epsilon = 1e-10);
    }

    #[test]
    fn test_log_exp_consistency_for_small_steps() {
        let spd = SymmetricPositiveDefinite::new(2);
        let p = spd2(1.5, 0.2, 2.0);
        let v = spd2(0.05, 0.01, -0.04);
        let q = spd.retract(&p, &v).unwrap();
        let log = spd.inverse_retract(&p, &q).unwrap();
        // Retraction is a second-order approximation of exp, so the
        // round-trip error is third order in the step.
        assert!((log - v).norm() < 1e-4);
    }

    #[test]
    fn test_gradient_conversion_symmetric() {
        let spd = SymmetricPositiveDefinite::new(2);
        let p = spd2(2.0, 0.5, 1.0);
        let egrad = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, -1.0]);
        let rgrad = spd.euclidean_to_riemannian_gradient(&p, &egrad).unwrap();
        assert!((&rgrad - rgrad.transpose()).norm() < 1e-12);
    }

    #[test]
    fn test_non_spd_point_rejected() {
        let spd = SymmetricPositiveDefinite::new(2);
        let not_pd = spd2(1.0, 2.0, 1.0);
        assert!(!spd.is_point_on_manifold(&not_pd, 1e-8));
        let u = spd2(1.0, 0.0, 1.0);
        assert!(spd.inner_product(&not_pd, &u, &u).is_err());
    }
}
