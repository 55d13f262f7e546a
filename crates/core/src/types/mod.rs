//! Core types for the agency admin.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod page;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use page::AdminPage;
pub use role::{AdminRole, UnknownRole};
