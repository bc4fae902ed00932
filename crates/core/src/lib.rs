//! `pvz-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the pickup point,
//! reception and product modules (no infrastructure concerns).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod query;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{PickupPointId, ProductId, ReceptionId};
pub use query::{DateRange, PageRequest};
pub use value_object::ValueObject;
