//! Public facade crate for `advisor`.
//!
//! This crate contains no IO or provider-specific logic.
//! It re-exports the backend-agnostic types/traits from `advisor-core`.

pub use advisor_core::*;
