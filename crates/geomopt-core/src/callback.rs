//! Observer hooks for solver runs.
//!
//! Callbacks are the observability surface of the solvers: a caller can log
//! progress, collect traces, or request early termination without the
//! solvers knowing anything about the consumer. Every solver exposes an
//! `optimize_with_callback` variant; the plain `optimize` uses
//! [`NoOpCallback`].

use crate::{error::Result, types::Scalar};
use std::time::Duration;

/// Snapshot handed to a callback at each outer iteration.
#[derive(Debug, Clone, Copy)]
pub struct CallbackInfo<T: Scalar> {
    /// Outer iteration index.
    pub iteration: usize,
    /// Current objective value.
    pub cost: T,
    /// Riemannian gradient norm, when the solver computes one.
    pub gradient_norm: Option<T>,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

/// Observer invoked during optimization.
pub trait OptimizationCallback<T: Scalar> {
    /// Called once before the first iteration.
    fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called after each outer iteration. Returning `Ok(false)` asks the
    /// solver to stop with
    /// [`TerminationReason::CallbackRequested`](crate::solver::TerminationReason).
    fn on_iteration(&mut self, info: &CallbackInfo<T>) -> Result<bool> {
        let _ = info;
        Ok(true)
    }

    /// Called once after the run terminates, with the final snapshot.
    fn on_end(&mut self, info: &CallbackInfo<T>) -> Result<()> {
        let _ = info;
        Ok(())
    }
}

/// Callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl<T: Scalar> OptimizationCallback<T> for NoOpCallback {}

/// Callback printing one progress line every `every` iterations.
#[derive(Debug, Clone, Copy)]
pub struct PrintProgress {
    /// Print period in iterations.
    pub every: usize,
}

impl Default for PrintProgress {
    fn default() -> Self {
        Self { every: 10 }
    }
}

impl<T: Scalar> OptimizationCallback<T> for PrintProgress {
    fn on_iteration(&mut self, info: &CallbackInfo<T>) -> Result<bool> {
        if self.every > 0 && info.iteration % self.every == 0 {
            match info.gradient_norm {
                Some(norm) => println!(
                    "iter {:>5}  cost {:>14.6e}  |grad| {:>12.6e}",
                    info.iteration,
                    info.cost.to_f64(),
                    norm.to_f64()
                ),
                None => println!(
                    "iter {:>5}  cost {:>14.6e}",
                    info.iteration,
                    info.cost.to_f64()
                ),
            }
        }
        Ok(true)
    }

    fn on_end(&mut self, info: &CallbackInfo<T>) -> Result<()> {
        println!(
            "done after {} iterations, cost {:.6e} ({:.3?})",
            info.iteration,
            info.cost.to_f64(),
            info.elapsed
        );
        Ok(())
    }
}
