//! Abacus Types
//!
//! This crate defines the scalar value model shared by the Abacus crates
//! (currently `abacus-calculator` and `abacus-cli`). Calculator inputs are a
//! flat mapping from field names to [`InputValue`]s; keeping the type in a
//! leaf crate lets front ends build inputs without pulling in the engine.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]

mod types;
pub use types::{InputValue, NonScalarValue};
