//! Scalar trait and type aliases used throughout the library.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// Combines the numeric traits required by the manifold geometry and the
/// solver loops, together with a few library-wide tolerance constants.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default tolerance for manifold membership checks.
    const MANIFOLD_TOLERANCE: Self;

    /// Default tolerance for gradient-norm convergence.
    const DEFAULT_GRADIENT_TOLERANCE: Self;

    /// Converts from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails, which cannot happen for finite
    /// constants and f32/f64 targets.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("failed to convert from f64")
    }

    /// Converts to f64 (for reporting).
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("failed to convert to f64")
    }

    /// Converts from usize (for iteration counts and averaging).
    fn from_usize(v: usize) -> Self {
        <Self as FromPrimitive>::from_usize(v).expect("failed to convert from usize")
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const MANIFOLD_TOLERANCE: Self = 1e-4;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-4;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const MANIFOLD_TOLERANCE: Self = 1e-8;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-6;
}

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;
