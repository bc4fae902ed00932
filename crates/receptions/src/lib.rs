//! Reception domain module.
//!
//! A reception is a goods-receiving session at a pickup point. This crate holds the
//! status vocabulary and the one-way `open → closed` transition as pure domain logic.

pub mod reception;

pub use reception::{Reception, ReceptionStatus};
