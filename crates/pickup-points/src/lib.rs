//! Pickup point (PVZ) domain module.
//!
//! Registration rules for pickup points, implemented as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod point;

pub use point::{City, PickupPoint};
