//! Permission table queries.
//!
//! These read the compiled-in tables only and need no database. Unknown role
//! names are accepted and treated as the unknown role, which is granted
//! nothing.
//!
//! ```bash
//! agency-cli access check --role editor --path /admin/settings
//! agency-cli access pages --role admin
//! agency-cli access assignable --role super_admin
//! agency-cli access table
//! ```

#![allow(clippy::print_stdout)]

use agency_core::{
    AdminPage, AdminRole, PathTable, PermissionTable, accessible_pages, assignable_roles,
    can_access, required_permission,
};

fn role_arg(role: &str) -> Option<AdminRole> {
    let parsed = AdminRole::parse_lenient(role);
    if parsed.is_none() {
        tracing::warn!(role, "unknown role, treating as no access");
    }
    parsed
}

fn role_name(role: Option<AdminRole>) -> &'static str {
    role.map_or("unknown", AdminRole::as_str)
}

/// Report whether `role` may open `path`.
pub fn check(role: &str, path: &str) {
    let role = role_arg(role);
    match required_permission(path) {
        None => println!("{path}: no page rule, unrestricted"),
        Some(page) if can_access(role, page) => {
            println!("{path}: {} page, allowed for {}", page, role_name(role));
        }
        Some(page) => println!("{path}: {} page, restricted for {}", page, role_name(role)),
    }
}

/// List the pages `role` may open.
pub fn pages(role: &str) {
    let role = role_arg(role);
    let pages = accessible_pages(role);
    if pages.is_empty() {
        println!("{}: no pages", role_name(role));
        return;
    }
    for page in pages {
        println!("{page}");
    }
}

/// List the roles `role` may grant.
pub fn assignable(role: &str) {
    let role = role_arg(role);
    let roles = assignable_roles(role);
    if roles.is_empty() {
        println!("{}: may not assign roles", role_name(role));
        return;
    }
    for assignable in roles {
        println!("{assignable}");
    }
}

/// Print the role/page grid and the path rules, then report any role that
/// sees less than a lower-ranked one.
pub fn table() {
    let permissions = PermissionTable::canonical();

    print!("{:<12}", "");
    for page in AdminPage::ALL {
        print!(" {:<11}", page.as_str());
    }
    println!();
    for role in AdminRole::ALL {
        print!("{:<12}", role.as_str());
        for page in AdminPage::ALL {
            let mark = if permissions.can_access(Some(role), page) { "x" } else { "-" };
            print!(" {mark:<11}");
        }
        println!();
    }

    println!();
    for rule in PathTable::canonical().rules() {
        let scope = if rule.covers_children() { "/**" } else { "" };
        println!("{}{scope} -> {}", rule.path(), rule.page());
    }

    let violations = permissions.monotonicity_violations();
    if violations.is_empty() {
        tracing::info!("Permission table is monotone in rank");
    }
    for violation in violations {
        tracing::warn!(
            higher = %violation.higher,
            lower = %violation.lower,
            missing = ?violation.missing,
            "higher role sees less than a lower role"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_arg_is_lenient() {
        assert_eq!(role_arg("Editor"), Some(AdminRole::Editor));
        assert_eq!(role_arg("owner"), None);
        assert_eq!(role_name(None), "unknown");
    }
}
