//! High-level operations.
//!
//! This module contains the implementation of the pipfile commands.

pub mod check;
pub mod freeze;
pub mod show;

pub use check::{check, check_requirements, CheckOptions, CheckReport};
pub use freeze::{freeze, FreezeOptions, FreezeResult};
pub use show::format_record;
