//! HTTP handlers

pub mod cache;
pub mod health;
pub mod info;
pub mod metrics;
pub mod tasks;

pub use health::health;
pub use info::{info, welcome};
