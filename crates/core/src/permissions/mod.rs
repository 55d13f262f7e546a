//! Role-permission resolver.
//!
//! Pure, side-effect-free answers to "may this role see this admin page?".
//! The free functions in this module consult the canonical
//! [`PermissionTable`] and [`PathTable`]; the same questions can be asked of
//! custom tables through their methods.
//!
//! Roles arrive as `Option<AdminRole>`: `None` stands for a missing or
//! unrecognised role string (see [`AdminRole::parse_lenient`]) and always
//! receives the most restrictive answer.

mod paths;
mod table;

use std::collections::BTreeSet;

pub use paths::{PathRule, PathTable};
pub use table::{MonotonicityViolation, PermissionTable};

use crate::types::{AdminPage, AdminRole};

/// Returns true iff `page` is in the canonical table's set for `role`.
#[must_use]
pub fn can_access(role: Option<AdminRole>, page: AdminPage) -> bool {
    PermissionTable::canonical().can_access(role, page)
}

/// Compares role ranks. An absent `user_role` ranks 0 and never qualifies.
#[must_use]
pub const fn has_equal_or_higher_role(user_role: Option<AdminRole>, required: AdminRole) -> bool {
    AdminRole::rank_of(user_role) >= required.rank()
}

/// Pages the role may view under the canonical table.
#[must_use]
pub fn accessible_pages(role: Option<AdminRole>) -> BTreeSet<AdminPage> {
    PermissionTable::canonical().accessible_pages(role)
}

/// Roles the holder of `current` may grant to someone else.
///
/// Every role with strictly lower rank, highest first. An absent role may
/// grant nothing.
#[must_use]
pub fn assignable_roles(current: Option<AdminRole>) -> Vec<AdminRole> {
    let rank = AdminRole::rank_of(current);
    AdminRole::ALL
        .into_iter()
        .filter(|role| role.rank() < rank)
        .collect()
}

/// Whether the holder of `actor` may modify an admin who currently holds
/// `target`. Only strictly lower-ranked admins can be managed, so peers and
/// superiors are out of reach.
#[must_use]
pub const fn can_manage(actor: Option<AdminRole>, target: Option<AdminRole>) -> bool {
    actor.is_some() && AdminRole::rank_of(actor) > AdminRole::rank_of(target)
}

/// Whether `actor` may change an admin holding `target` to `new_role`.
#[must_use]
pub fn can_assign(actor: Option<AdminRole>, target: Option<AdminRole>, new_role: AdminRole) -> bool {
    can_manage(actor, target) && assignable_roles(actor).contains(&new_role)
}

/// Resolves a request path to the admin page it belongs to, using the
/// canonical path table. `None` means no page restriction applies.
#[must_use]
pub fn required_permission(path: &str) -> Option<AdminPage> {
    PathTable::canonical().resolve(path)
}
