//! Askama templates and the view models they render.

use askama::Template;
use axum::response::Html;

use agency_core::{AdminPage, AdminRole, accessible_pages, required_permission};

use crate::models::{AdminUserProfile, CurrentAdmin};
use crate::navigation::navigation_for;

/// Signed-in admin as shown in the shell header.
#[derive(Debug, Clone)]
pub struct AdminView {
    pub name: String,
    pub email: String,
    pub role_label: &'static str,
}

impl From<&CurrentAdmin> for AdminView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            role_label: admin.role.map_or("Unknown role", AdminRole::label),
        }
    }
}

/// Sidebar link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub path: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub active: bool,
}

/// Role-filtered sidebar with the entry for `current_path` marked active.
#[must_use]
pub fn nav_links(role: Option<AdminRole>, current_path: &str) -> Vec<NavLink> {
    let current = required_permission(current_path);
    navigation_for(role)
        .into_iter()
        .map(|item| NavLink {
            path: item.path,
            label: item.label,
            icon: item.icon,
            active: current == Some(item.page),
        })
        .collect()
}

/// Render a template, falling back to a plain error body.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_string()
    }))
}

// =============================================================================
// Sign-in
// =============================================================================

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

// =============================================================================
// Shell screens
// =============================================================================

/// Page card on the dashboard.
#[derive(Debug, Clone)]
pub struct PageCard {
    pub path: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

#[derive(Template)]
#[template(path = "screen.html")]
pub struct ScreenTemplate {
    pub admin: AdminView,
    pub nav: Vec<NavLink>,
    pub title: &'static str,
    pub summary: &'static str,
    pub cards: Vec<PageCard>,
}

/// Heading and summary for each admin screen.
#[must_use]
pub const fn screen_copy(page: AdminPage) -> (&'static str, &'static str) {
    match page {
        AdminPage::Dashboard => ("Dashboard", "Everything your role can reach, in one place."),
        AdminPage::Blog => ("Blog", "Draft, schedule and publish posts."),
        AdminPage::Seo => ("SEO", "Metadata, redirects and search previews."),
        AdminPage::Settings => ("Settings", "Site-wide configuration and integrations."),
        AdminPage::Users => ("Users", "Admin accounts, roles and access."),
        AdminPage::Media => ("Media", "Images, video and downloadable assets."),
        AdminPage::Transcripts => ("Transcripts", "Call and interview transcripts."),
        AdminPage::Help => ("Help", "Guides for working in the admin panel."),
    }
}

/// Render the shell for `page`.
#[must_use]
pub fn screen(admin: &CurrentAdmin, page: AdminPage, current_path: &str) -> Html<String> {
    let (title, summary) = screen_copy(page);
    let cards = if page == AdminPage::Dashboard {
        navigation_for(admin.role)
            .into_iter()
            .filter(|item| item.page != AdminPage::Dashboard)
            .map(|item| PageCard {
                path: item.path,
                label: item.label,
                icon: item.icon,
            })
            .collect()
    } else {
        Vec::new()
    };

    render(&ScreenTemplate {
        admin: AdminView::from(admin),
        nav: nav_links(admin.role, current_path),
        title,
        summary,
        cards,
    })
}

#[derive(Template)]
#[template(path = "restricted.html")]
pub struct RestrictedTemplate {
    pub admin: AdminView,
    pub nav: Vec<NavLink>,
    pub page_label: &'static str,
    pub has_any_page: bool,
}

/// Render the restricted-access view for a page the role may not see.
#[must_use]
pub fn restricted(admin: &CurrentAdmin, page: AdminPage) -> Html<String> {
    render(&RestrictedTemplate {
        admin: AdminView::from(admin),
        nav: nav_links(admin.role, ""),
        page_label: page.label(),
        has_any_page: !accessible_pages(admin.role).is_empty(),
    })
}

// =============================================================================
// Admin users
// =============================================================================

/// Role choice in a row's role form.
#[derive(Debug, Clone)]
pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// One row of the admin users table.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_label: &'static str,
    pub is_active: bool,
    pub last_login: String,
    /// The viewer outranks this admin and may change them.
    pub can_manage: bool,
    pub role_options: Vec<RoleOption>,
}

impl UserRow {
    /// Build a row as seen by an admin holding `actor`.
    #[must_use]
    pub fn new(profile: &AdminUserProfile, actor: Option<AdminRole>) -> Self {
        let can_manage = agency_core::can_manage(actor, profile.role);
        let role_options = if can_manage {
            agency_core::assignable_roles(actor)
                .into_iter()
                .map(|role| RoleOption {
                    value: role.as_str(),
                    label: role.label(),
                    selected: profile.role == Some(role),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            id: profile.id.to_string(),
            name: profile.name.clone(),
            email: profile.email.to_string(),
            role_label: profile.role.map_or("Unknown", AdminRole::label),
            is_active: profile.is_active,
            last_login: profile
                .last_login
                .map_or_else(|| "Never".to_string(), |at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
            can_manage,
            role_options,
        }
    }
}

#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub admin: AdminView,
    pub nav: Vec<NavLink>,
    pub users: Vec<UserRow>,
    pub notice: Option<String>,
}
