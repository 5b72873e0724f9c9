//! Shared types for hrm

pub mod error;

pub use error::{HrmError, Result};
