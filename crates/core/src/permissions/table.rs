//! Role to page permission table.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::types::{AdminPage, AdminRole};

static CANONICAL: LazyLock<PermissionTable> = LazyLock::new(|| {
    use AdminPage::{Blog, Dashboard, Help, Media, Seo, Settings, Transcripts, Users};

    PermissionTable::new([
        (
            AdminRole::SuperAdmin,
            vec![Dashboard, Blog, Seo, Settings, Users, Media, Transcripts, Help],
        ),
        (
            AdminRole::Admin,
            vec![Dashboard, Blog, Seo, Settings, Media, Transcripts, Help],
        ),
        (AdminRole::Editor, vec![Dashboard, Blog, Media, Help]),
        (AdminRole::Viewer, vec![Dashboard, Help]),
    ])
});

/// A pair of roles where the higher-ranked one sees less than the lower one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonotonicityViolation {
    pub higher: AdminRole,
    pub lower: AdminRole,
    /// Pages the lower role has that the higher role lacks.
    pub missing: BTreeSet<AdminPage>,
}

/// Static mapping from [`AdminRole`] to the set of pages it may view.
///
/// Roles missing from the table are granted nothing. The table is expected
/// to be monotone in rank, but this is not enforced: a table where a higher
/// role sees less is still honoured exactly as written, and
/// [`PermissionTable::monotonicity_violations`] reports the offending pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    grants: BTreeMap<AdminRole, BTreeSet<AdminPage>>,
}

impl PermissionTable {
    /// Build a table from `(role, pages)` entries. Repeated roles merge.
    pub fn new<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (AdminRole, P)>,
        P: IntoIterator<Item = AdminPage>,
    {
        let mut grants: BTreeMap<AdminRole, BTreeSet<AdminPage>> = BTreeMap::new();
        for (role, pages) in entries {
            grants.entry(role).or_default().extend(pages);
        }
        Self { grants }
    }

    /// The table shipped with the admin panel.
    #[must_use]
    pub fn canonical() -> &'static Self {
        &CANONICAL
    }

    /// Pages granted to `role`, empty if the role has no entry.
    #[must_use]
    pub fn pages_for(&self, role: AdminRole) -> BTreeSet<AdminPage> {
        self.grants.get(&role).cloned().unwrap_or_default()
    }

    /// Fail-closed membership check.
    #[must_use]
    pub fn can_access(&self, role: Option<AdminRole>, page: AdminPage) -> bool {
        role.and_then(|role| self.grants.get(&role))
            .is_some_and(|pages| pages.contains(&page))
    }

    /// Pages for an optional role, empty when absent.
    #[must_use]
    pub fn accessible_pages(&self, role: Option<AdminRole>) -> BTreeSet<AdminPage> {
        role.map(|role| self.pages_for(role)).unwrap_or_default()
    }

    /// Every `(higher, lower)` pair whose page sets are not nested.
    #[must_use]
    pub fn monotonicity_violations(&self) -> Vec<MonotonicityViolation> {
        let mut violations = Vec::new();
        for higher in AdminRole::ALL {
            let higher_pages = self.pages_for(higher);
            for lower in AdminRole::ALL
                .into_iter()
                .filter(|lower| lower.rank() < higher.rank())
            {
                let missing: BTreeSet<AdminPage> = self
                    .pages_for(lower)
                    .difference(&higher_pages)
                    .copied()
                    .collect();
                if !missing.is_empty() {
                    violations.push(MonotonicityViolation {
                        higher,
                        lower,
                        missing,
                    });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_table_is_monotone() {
        let violations = PermissionTable::canonical().monotonicity_violations();
        assert!(
            violations.is_empty(),
            "permission table grants a lower role pages a higher role lacks: {violations:?}"
        );
    }

    #[test]
    fn test_canonical_subset_chain() {
        let table = PermissionTable::canonical();
        for higher in AdminRole::ALL {
            for lower in AdminRole::ALL {
                if higher.rank() > lower.rank() {
                    assert!(table.pages_for(lower).is_subset(&table.pages_for(higher)));
                }
            }
        }
    }

    #[test]
    fn test_custom_non_monotone_table_is_honoured() {
        let table = PermissionTable::new([
            (AdminRole::Admin, vec![AdminPage::Dashboard]),
            (AdminRole::Editor, vec![AdminPage::Dashboard, AdminPage::Blog]),
        ]);

        assert!(table.can_access(Some(AdminRole::Editor), AdminPage::Blog));
        assert!(!table.can_access(Some(AdminRole::Admin), AdminPage::Blog));
        assert!(!table.can_access(Some(AdminRole::SuperAdmin), AdminPage::Dashboard));

        let violations = table.monotonicity_violations();
        assert!(violations.contains(&MonotonicityViolation {
            higher: AdminRole::Admin,
            lower: AdminRole::Editor,
            missing: BTreeSet::from([AdminPage::Blog]),
        }));
        // super_admin has no entry at all, so it is below both
        assert!(violations.iter().any(|v| v.higher == AdminRole::SuperAdmin));
    }

    #[test]
    fn test_repeated_entries_merge() {
        let table = PermissionTable::new([
            (AdminRole::Viewer, vec![AdminPage::Help]),
            (AdminRole::Viewer, vec![AdminPage::Dashboard]),
        ]);
        assert_eq!(
            table.accessible_pages(Some(AdminRole::Viewer)),
            BTreeSet::from([AdminPage::Dashboard, AdminPage::Help])
        );
        assert!(table.accessible_pages(None).is_empty());
    }
}
