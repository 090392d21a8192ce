#![doc = include_str!("../README.md")]

pub mod correction;
pub mod correspondence;
pub mod decomposition;
mod error;
mod mca;
pub mod preprocessing;
mod utils;

pub use error::{McaError, Result};
pub use mca::{Margin, Mca, McaParams, McaValidParams, SvdSolver};
pub use preprocessing::{CategoricalTable, CodedInput, ColumnGroup, DummyCoding};
