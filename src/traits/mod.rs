//! Trait definitions for swappable backends
//!
//! Each facade holds one of these as a trait object and picks the
//! implementation once, at construction. Implement them to plug in a
//! custom backend or a test double.

pub mod cache;
pub mod monitor;
pub mod payment;
