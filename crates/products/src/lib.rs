//! Products domain module.
//!
//! Products registered within a reception: the allowed type vocabulary and the
//! record itself, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod product;

pub use product::{Product, ProductType};
