//! Value and type model shared by declarations and the coercion engine.
//!
//! # Responsibility
//! - Define the dynamic `Value` that flows in and out of coercion.
//! - Define type descriptors and the model schema built on top of them.
//!
//! # Invariants
//! - Descriptors are immutable after declaration and shared across threads.
//! - Coercion consumes values by ownership, so passthrough never copies.

pub mod descriptor;
pub mod json;
pub mod schema;
pub mod value;
