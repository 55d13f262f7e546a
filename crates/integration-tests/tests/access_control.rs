//! Integration tests for role-based page access.
//!
//! These exercise the permission table, path resolution and the admin
//! user management rules together, the way the admin shell uses them.

use agency_admin::gate::{PageAccess, page_access};
use agency_admin::navigation::navigation_for;
use agency_admin::routes::users::{Change, authorize_change};
use agency_core::{
    AdminPage, AdminRole, PermissionTable, accessible_pages, assignable_roles, can_access,
    required_permission,
};
use agency_integration_tests::TestBackend;

// =============================================================================
// Permission Table Tests
// =============================================================================

#[test]
fn test_every_role_sees_exactly_its_table_row() {
    let table = PermissionTable::canonical();
    for role in AdminRole::ALL {
        for page in AdminPage::ALL {
            assert_eq!(
                can_access(Some(role), page),
                table.pages_for(role).contains(&page),
                "{role} / {page}"
            );
        }
    }
}

#[test]
fn test_unknown_role_sees_nothing() {
    for page in AdminPage::ALL {
        assert!(!can_access(None, page));
    }
    assert!(accessible_pages(AdminRole::parse_lenient("owner")).is_empty());
    assert!(navigation_for(None).is_empty());
}

#[test]
fn test_shipped_table_is_monotone_in_rank() {
    let violations = PermissionTable::canonical().monotonicity_violations();
    assert!(violations.is_empty(), "{violations:?}");

    for higher in AdminRole::ALL {
        for lower in AdminRole::ALL.into_iter().filter(|r| r.rank() < higher.rank()) {
            assert!(accessible_pages(Some(lower)).is_subset(&accessible_pages(Some(higher))));
        }
    }
}

#[test]
fn test_assignable_roles_descend_from_below_holder() {
    assert_eq!(
        assignable_roles(Some(AdminRole::SuperAdmin)),
        [AdminRole::Admin, AdminRole::Editor, AdminRole::Viewer]
    );
    assert!(assignable_roles(Some(AdminRole::Viewer)).is_empty());
    assert!(assignable_roles(None).is_empty());
}

// =============================================================================
// Path Resolution Tests
// =============================================================================

/// Pins the mapping of every path the admin shell links to.
#[test]
fn test_known_admin_paths() {
    let expected = [
        ("/admin", Some(AdminPage::Dashboard)),
        ("/admin/dashboard", Some(AdminPage::Dashboard)),
        ("/admin/blog", Some(AdminPage::Blog)),
        ("/admin/blog/edit/123", Some(AdminPage::Blog)),
        ("/admin/seo/redirects", Some(AdminPage::Seo)),
        ("/admin/settings", Some(AdminPage::Settings)),
        ("/admin/users/42", Some(AdminPage::Users)),
        ("/admin/media", Some(AdminPage::Media)),
        ("/admin/transcripts/2026-10", Some(AdminPage::Transcripts)),
        ("/admin/help", Some(AdminPage::Help)),
        ("/admin/unknown-path", None),
        ("/admin/blogroll", None),
        ("/about", None),
    ];
    for (path, page) in expected {
        assert_eq!(required_permission(path), page, "{path}");
    }
}

#[test]
fn test_every_navigation_entry_resolves_to_its_page() {
    for item in navigation_for(Some(AdminRole::SuperAdmin)) {
        assert_eq!(required_permission(item.path), Some(item.page), "{}", item.path);
    }
}

#[test]
fn test_page_access_for_editor() {
    let editor = Some(AdminRole::Editor);
    assert_eq!(
        page_access(editor, "/admin/blog/edit/1"),
        PageAccess::Allowed(Some(AdminPage::Blog))
    );
    assert_eq!(
        page_access(editor, "/admin/users"),
        PageAccess::Restricted(AdminPage::Users)
    );
    assert_eq!(page_access(editor, "/admin/unknown-path"), PageAccess::Allowed(None));
}

// =============================================================================
// Admin User Management Tests
// =============================================================================

#[tokio::test]
async fn test_role_changes_respect_rank() {
    let backend = TestBackend::new();
    let owner = backend.admin("owner@agency.studio", AdminRole::SuperAdmin).await;
    let lead = backend.admin("lead@agency.studio", AdminRole::Admin).await;
    let writer = backend.admin("writer@agency.studio", AdminRole::Editor).await;

    // Owner can promote to admin, lead cannot.
    assert!(authorize_change(&owner, &writer, Change::Role(AdminRole::Admin)).is_ok());
    assert!(authorize_change(&lead, &writer, Change::Role(AdminRole::Admin)).is_err());
    assert!(authorize_change(&lead, &writer, Change::Role(AdminRole::Viewer)).is_ok());

    // Nobody manages upwards or themselves.
    assert!(authorize_change(&lead, &owner, Change::Active(false)).is_err());
    assert!(authorize_change(&writer, &lead, Change::Active(false)).is_err());
    assert!(authorize_change(&owner, &owner, Change::Role(AdminRole::Viewer)).is_err());
}

#[tokio::test]
async fn test_unknown_role_cannot_manage_anyone() {
    let backend = TestBackend::new();
    let mut odd = backend.admin("odd@agency.studio", AdminRole::Admin).await;
    odd.role = None;
    let viewer = backend.admin("viewer@agency.studio", AdminRole::Viewer).await;

    assert!(authorize_change(&odd, &viewer, Change::Active(false)).is_err());
    assert!(authorize_change(&odd, &viewer, Change::Role(AdminRole::Viewer)).is_err());
}
