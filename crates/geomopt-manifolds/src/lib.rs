//! Manifold implementations.
//!
//! Each manifold implements [`geomopt_core::manifold::Manifold`] and can be
//! paired with any cost function over the matching point representation:
//!
//! - [`Euclidean`]: flat ℝⁿ, the unconstrained baseline.
//! - [`Sphere`]: unit vectors, with exact exponential/logarithm maps and
//!   parallel transport.
//! - [`Stiefel`]: orthonormal frames, with the QR retraction.
//! - [`SymmetricPositiveDefinite`]: the SPD cone under the affine-invariant
//!   metric.

pub mod euclidean;
pub mod spd;
pub mod sphere;
pub mod stiefel;

pub use euclidean::Euclidean;
pub use spd::SymmetricPositiveDefinite;
pub use sphere::Sphere;
pub use stiefel::Stiefel;
