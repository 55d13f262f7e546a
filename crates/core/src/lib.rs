//! Agency Core - shared types and access-control decisions.
//!
//! This crate is used by every component of the agency admin:
//! - `admin` - Admin panel shell and session gate
//! - `cli` - Command-line tools for migrations and access inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Every decision here is total: unknown or missing
//! input degrades to the most restrictive answer instead of an error.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and emails, plus the closed
//!   [`AdminRole`] and [`AdminPage`] enums
//! - [`permissions`] - Role-permission resolver and path-to-page resolution

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod permissions;
pub mod types;

pub use permissions::{
    MonotonicityViolation, PathRule, PathTable, PermissionTable, accessible_pages,
    assignable_roles, can_access, can_assign, can_manage, has_equal_or_higher_role,
    required_permission,
};
pub use types::*;
