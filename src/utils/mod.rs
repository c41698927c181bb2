//! Utility functions and helpers.
//!
//! Environment variable handling shared by every facade configuration.

pub mod env;

pub use env::{get_env_with_prefix, parse_flag};
pub(crate) use env::non_empty;
