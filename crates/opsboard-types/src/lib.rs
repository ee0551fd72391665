//! Opsboard Types - Pure type definitions for the task/metric API
//!
//! This crate contains only plain data types with no async runtime
//! dependencies, shared between the server and any future clients.

pub mod health;
pub mod metric;
pub mod task;

pub use health::*;
pub use metric::*;
pub use task::*;
