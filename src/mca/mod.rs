//! Multiple Correspondence Analysis
//!
//! The model is fitted on an indicator matrix, decomposes its standardized residuals and derives
//! factor scores and diagnostics for the observations and the coded levels.
mod algorithms;
mod diagnostics;
mod hyperparams;

pub use algorithms::*;
pub use hyperparams::*;
