//! Sidebar navigation.

use agency_core::{AdminPage, AdminRole, can_access};

/// A sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub path: &'static str,
    pub label: &'static str,
    /// Icon name from the admin icon set.
    pub icon: &'static str,
    /// Page whose permission gates this entry.
    pub page: AdminPage,
}

const fn item(path: &'static str, label: &'static str, icon: &'static str, page: AdminPage) -> NavItem {
    NavItem {
        path,
        label,
        icon,
        page,
    }
}

/// Every entry, in display order.
pub const NAV_ITEMS: [NavItem; 8] = [
    item("/admin", "Dashboard", "layout-dashboard", AdminPage::Dashboard),
    item("/admin/blog", "Blog", "file-text", AdminPage::Blog),
    item("/admin/seo", "SEO", "search", AdminPage::Seo),
    item("/admin/media", "Media", "image", AdminPage::Media),
    item("/admin/transcripts", "Transcripts", "mic", AdminPage::Transcripts),
    item("/admin/users", "Users", "users", AdminPage::Users),
    item("/admin/settings", "Settings", "settings", AdminPage::Settings),
    item("/admin/help", "Help", "help-circle", AdminPage::Help),
];

/// Entries visible to `role`, in display order.
#[must_use]
pub fn navigation_for(role: Option<AdminRole>) -> Vec<NavItem> {
    NAV_ITEMS
        .iter()
        .copied()
        .filter(|entry| can_access(role, entry.page))
        .collect()
}

#[cfg(test)]
mod tests {
    use agency_core::required_permission;

    use super::*;

    fn labels(role: Option<AdminRole>) -> Vec<&'static str> {
        navigation_for(role).iter().map(|entry| entry.label).collect()
    }

    #[test]
    fn test_editor_navigation() {
        assert_eq!(
            labels(Some(AdminRole::Editor)),
            ["Dashboard", "Blog", "Media", "Help"]
        );
    }

    #[test]
    fn test_viewer_and_unknown_navigation() {
        assert_eq!(labels(Some(AdminRole::Viewer)), ["Dashboard", "Help"]);
        assert!(labels(None).is_empty());
    }

    #[test]
    fn test_super_admin_sees_everything_and_admin_all_but_users() {
        assert_eq!(navigation_for(Some(AdminRole::SuperAdmin)).len(), NAV_ITEMS.len());
        let admin = labels(Some(AdminRole::Admin));
        assert_eq!(admin.len(), NAV_ITEMS.len() - 1);
        assert!(!admin.contains(&"Users"));
    }

    #[test]
    fn test_entry_paths_resolve_to_their_page() {
        for entry in NAV_ITEMS {
            assert_eq!(required_permission(entry.path), Some(entry.page), "{}", entry.path);
        }
    }
}
