//! Storely Shared Types
//!
//! This crate contains the tenant and organization types shared between the
//! Storely edge service and its tests.

pub mod types;

pub use types::*;
