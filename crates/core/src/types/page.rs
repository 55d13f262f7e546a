//! Admin screens used as the unit of access control.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One logical screen of the admin interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPage {
    Dashboard,
    Blog,
    Seo,
    Settings,
    Users,
    Media,
    Transcripts,
    Help,
}

impl AdminPage {
    /// Every admin page, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Dashboard,
        Self::Blog,
        Self::Seo,
        Self::Settings,
        Self::Users,
        Self::Media,
        Self::Transcripts,
        Self::Help,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Blog => "blog",
            Self::Seo => "seo",
            Self::Settings => "settings",
            Self::Users => "users",
            Self::Media => "media",
            Self::Transcripts => "transcripts",
            Self::Help => "help",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Blog => "Blog",
            Self::Seo => "SEO",
            Self::Settings => "Settings",
            Self::Users => "Users",
            Self::Media => "Media",
            Self::Transcripts => "Transcripts",
            Self::Help => "Help",
        }
    }

    /// Parse a page name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|page| page.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for AdminPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(AdminPage::parse("seo"), Some(AdminPage::Seo));
        assert_eq!(AdminPage::parse("Transcripts"), Some(AdminPage::Transcripts));
        assert_eq!(AdminPage::parse("orders"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = AdminPage::ALL.iter().map(|p| p.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AdminPage::ALL.len());
    }
}
