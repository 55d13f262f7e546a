//! Path to page resolution.
//!
//! An exact match always wins. Otherwise the *longest* rule whose path is a
//! segment-aligned prefix of the request path wins, so the result never
//! depends on the order rules were declared in.

use std::sync::LazyLock;

use crate::types::AdminPage;

static CANONICAL: LazyLock<PathTable> = LazyLock::new(|| {
    PathTable::new([
        PathRule::exact("/admin", AdminPage::Dashboard),
        PathRule::nested("/admin/dashboard", AdminPage::Dashboard),
        PathRule::nested("/admin/blog", AdminPage::Blog),
        PathRule::nested("/admin/seo", AdminPage::Seo),
        PathRule::nested("/admin/settings", AdminPage::Settings),
        PathRule::nested("/admin/users", AdminPage::Users),
        PathRule::nested("/admin/media", AdminPage::Media),
        PathRule::nested("/admin/transcripts", AdminPage::Transcripts),
        PathRule::nested("/admin/help", AdminPage::Help),
    ])
});

/// Maps one known path (and optionally everything beneath it) to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    path: String,
    page: AdminPage,
    covers_children: bool,
}

impl PathRule {
    /// Matches `path` itself and any `path/...` beneath it.
    #[must_use]
    pub fn nested(path: &str, page: AdminPage) -> Self {
        Self {
            path: normalize(path).to_owned(),
            page,
            covers_children: true,
        }
    }

    /// Matches `path` only. Used for the admin root so unknown admin
    /// paths stay unrestricted instead of collapsing onto the dashboard.
    #[must_use]
    pub fn exact(path: &str, page: AdminPage) -> Self {
        Self {
            path: normalize(path).to_owned(),
            page,
            covers_children: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn page(&self) -> AdminPage {
        self.page
    }

    /// Whether paths beneath this one are covered too.
    #[must_use]
    pub const fn covers_children(&self) -> bool {
        self.covers_children
    }

    fn is_parent_of(&self, path: &str) -> bool {
        self.covers_children
            && path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Ordered collection of [`PathRule`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTable {
    rules: Vec<PathRule>,
}

impl PathTable {
    pub fn new(rules: impl IntoIterator<Item = PathRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// The admin panel's route table.
    #[must_use]
    pub fn canonical() -> &'static Self {
        &CANONICAL
    }

    #[must_use]
    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    /// Resolve `path` to a page; `None` means no page restriction applies.
    ///
    /// Query strings, fragments and a trailing slash are ignored.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<AdminPage> {
        let path = normalize(path);

        if let Some(rule) = self.rules.iter().find(|rule| rule.path == path) {
            return Some(rule.page);
        }

        self.rules
            .iter()
            .filter(|rule| rule.is_parent_of(path))
            .max_by_key(|rule| rule.path.len())
            .map(|rule| rule.page)
    }
}

/// Strip query, fragment and trailing slashes (the root `/` is kept).
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path.get(..end).unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(path: &str) -> Option<AdminPage> {
        PathTable::canonical().resolve(path)
    }

    #[test]
    fn test_pins_every_canonical_path() {
        let expected = [
            ("/admin", Some(AdminPage::Dashboard)),
            ("/admin/dashboard", Some(AdminPage::Dashboard)),
            ("/admin/blog", Some(AdminPage::Blog)),
            ("/admin/seo", Some(AdminPage::Seo)),
            ("/admin/settings", Some(AdminPage::Settings)),
            ("/admin/users", Some(AdminPage::Users)),
            ("/admin/media", Some(AdminPage::Media)),
            ("/admin/transcripts", Some(AdminPage::Transcripts)),
            ("/admin/help", Some(AdminPage::Help)),
        ];
        for (path, page) in expected {
            assert_eq!(resolve(path), page, "{path}");
        }
    }

    #[test]
    fn test_nested_paths() {
        assert_eq!(resolve("/admin/blog/edit/123"), Some(AdminPage::Blog));
        assert_eq!(resolve("/admin/users/42/role"), Some(AdminPage::Users));
        assert_eq!(resolve("/admin/seo/keywords"), Some(AdminPage::Seo));
    }

    #[test]
    fn test_unknown_paths_are_unrestricted() {
        assert_eq!(resolve("/admin/unknown-path"), None);
        assert_eq!(resolve("/admin/unknown-path/deeper"), None);
        assert_eq!(resolve("/blog"), None);
        assert_eq!(resolve("/"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn test_prefix_must_end_on_segment_boundary() {
        assert_eq!(resolve("/admin/blog-archive"), None);
        assert_eq!(resolve("/admin/helpdesk"), None);
    }

    #[test]
    fn test_ignores_query_fragment_and_trailing_slash() {
        assert_eq!(resolve("/admin/"), Some(AdminPage::Dashboard));
        assert_eq!(resolve("/admin/blog/"), Some(AdminPage::Blog));
        assert_eq!(resolve("/admin/media?page=2"), Some(AdminPage::Media));
        assert_eq!(resolve("/admin/help#faq"), Some(AdminPage::Help));
        assert_eq!(resolve("/admin?tab=overview"), Some(AdminPage::Dashboard));
    }

    #[test]
    fn test_longest_prefix_wins_regardless_of_order() {
        let rules = [
            PathRule::nested("/admin/seo", AdminPage::Seo),
            PathRule::nested("/admin/seo/reports", AdminPage::Dashboard),
        ];
        let forward = PathTable::new(rules.clone());
        let reversed = PathTable::new(rules.into_iter().rev());

        for table in [&forward, &reversed] {
            assert_eq!(
                table.resolve("/admin/seo/reports/weekly"),
                Some(AdminPage::Dashboard)
            );
            assert_eq!(table.resolve("/admin/seo/keywords"), Some(AdminPage::Seo));
        }
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        let table = PathTable::new([
            PathRule::nested("/admin/media", AdminPage::Media),
            PathRule::exact("/admin/media/help", AdminPage::Help),
        ]);
        assert_eq!(table.resolve("/admin/media/help"), Some(AdminPage::Help));
        assert_eq!(table.resolve("/admin/media/help/more"), Some(AdminPage::Media));
    }
}
