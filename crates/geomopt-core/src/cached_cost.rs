//! Optional caching decorator for cost functions.
//!
//! Gradient-based solvers routinely evaluate the cost and the gradient at
//! the same point in the same iteration (line search probes, convergence
//! checks). [`CachedCostFunction`] wraps any [`CostFunction`] and memoizes
//! the most recent evaluation point. Caching is an explicit decorator the
//! caller opts into; [`Problem`](crate::problem::Problem) itself never
//! caches.

use crate::{
    cost::CostFunction,
    error::Result,
    types::Scalar,
};
use parking_lot::Mutex;
use std::fmt::Debug;

/// Hit/miss counters for a [`CachedCostFunction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cost evaluations served from the cache.
    pub cost_hits: usize,
    /// Cost evaluations forwarded to the wrapped function.
    pub cost_misses: usize,
    /// Gradient evaluations served from the cache.
    pub gradient_hits: usize,
    /// Gradient evaluations forwarded to the wrapped function.
    pub gradient_misses: usize,
}

/// A cost function decorator memoizing the last evaluated point.
///
/// Holds the wrapped oracle by reference; the cache itself uses interior
/// mutability so the decorator still satisfies the `&self` contract of
/// [`CostFunction`].
#[derive(Debug)]
pub struct CachedCostFunction<'a, T: Scalar, C: CostFunction<T>> {
    inner: &'a C,
    cost_cache: Mutex<Option<(C::Point, T)>>,
    gradient_cache: Mutex<Option<(C::Point, (T, C::TangentVector))>>,
    stats: Mutex<CacheStats>,
}

impl<'a, T: Scalar, C: CostFunction<T>> CachedCostFunction<'a, T, C> {
    /// Wraps `inner` with a last-point cache.
    pub fn new(inner: &'a C) -> Self {
        Self {
            inner,
            cost_cache: Mutex::new(None),
            gradient_cache: Mutex::new(None),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Returns the accumulated hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }
}

impl<T, C> CostFunction<T> for CachedCostFunction<'_, T, C>
where
    T: Scalar,
    C: CostFunction<T>,
    C::Point: PartialEq,
{
    type Point = C::Point;
    type TangentVector = C::TangentVector;

    fn cost(&self, point: &Self::Point) -> Result<T> {
        // A cached gradient evaluation also knows the cost.
        if let Some((cached_point, (value, _))) = self.gradient_cache.lock().as_ref() {
            if cached_point == point {
                self.stats.lock().cost_hits += 1;
                return Ok(*value);
            }
        }
        let mut cache = self.cost_cache.lock();
        if let Some((cached_point, value)) = cache.as_ref() {
            if cached_point == point {
                self.stats.lock().cost_hits += 1;
                return Ok(*value);
            }
        }
        let value = self.inner.cost(point)?;
        *cache = Some((point.clone(), value));
        self.stats.lock().cost_misses += 1;
        Ok(value)
    }

    fn euclidean_gradient(&self, point: &Self::Point) -> Result<Self::TangentVector> {
        self.cost_and_gradient(point).map(|(_, grad)| grad)
    }

    fn cost_and_gradient(&self, point: &Self::Point) -> Result<(T, Self::TangentVector)> {
        let mut cache = self.gradient_cache.lock();
        if let Some((cached_point, (value, grad))) = cache.as_ref() {
            if cached_point == point {
                let mut stats = self.stats.lock();
                stats.cost_hits += 1;
                stats.gradient_hits += 1;
                return Ok((*value, grad.clone()));
            }
        }
        let (value, grad) = self.inner.cost_and_gradient(point)?;
        *cache = Some((point.clone(), (value, grad.clone())));
        let mut stats = self.stats.lock();
        stats.cost_misses += 1;
        stats.gradient_misses += 1;
        Ok((value, grad))
    }

    fn euclidean_hessian_vector_product(
        &self,
        point: &Self::Point,
        vector: &Self::TangentVector,
    ) -> Result<Self::TangentVector> {
        // Hessian products vary with the direction; caching does not apply.
        self.inner.euclidean_hessian_vector_product(point, vector)
    }

    fn provides_hessian(&self) -> bool {
        self.inner.provides_hessian()
    }
}
