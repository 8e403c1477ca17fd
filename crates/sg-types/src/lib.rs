//! # sg-types
//!
//! Core data model for searchgrid: parameter values, configuration nodes
//! with their grid annotation slot, grid shapes and errors.

pub mod component;
pub mod errors;
pub mod grid;
pub mod value;

pub use component::*;
pub use errors::*;
pub use grid::*;
pub use value::*;
