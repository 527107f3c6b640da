//! Route table and path matching.

use crate::auth::Role;

/// Access requirement declared on a route record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteRequirement {
    pub requires_auth: bool,
    pub role: Option<Role>,
}

impl RouteRequirement {
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        role: None,
    };

    pub const AUTHENTICATED: Self = Self {
        requires_auth: true,
        role: None,
    };

    pub const fn role(role: Role) -> Self {
        Self {
            requires_auth: true,
            role: Some(role),
        }
    }
}

/// One entry of the route table. Child paths are relative to the parent.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub name: &'static str,
    pub path: &'static str,
    pub requirement: RouteRequirement,
    pub children: Vec<RouteRecord>,
}

/// Pattern that matches any remaining path
pub const CATCH_ALL: &str = "*";

impl RouteRecord {
    pub fn new(name: &'static str, path: &'static str, requirement: RouteRequirement) -> Self {
        Self {
            name,
            path,
            requirement,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }

    fn segments(&self) -> Vec<&'static str> {
        split(self.path)
    }

    fn is_catch_all(&self) -> bool {
        self.path == CATCH_ALL
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Strip query string and fragment
fn path_only(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

/// Ordered route table; the first matching record wins
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self { records }
    }

    /// Routes of the Ecomflex web client
    pub fn ecomflex() -> Self {
        use RouteRequirement as R;

        Self::new(vec![
            RouteRecord::new("landing", "/", R::PUBLIC),
            RouteRecord::new("login", "/auth/login", R::PUBLIC),
            RouteRecord::new("register", "/auth/register", R::PUBLIC),
            RouteRecord::new("forgot-password", "/auth/forgot-password", R::PUBLIC),
            RouteRecord::new("home", "/home", R::AUTHENTICATED),
            RouteRecord::new("product-details", "/product/:id", R::AUTHENTICATED),
            RouteRecord::new("my-bookings", "/my-bookings", R::AUTHENTICATED),
            RouteRecord::new("influencer", "/influencer", R::role(Role::Influencer)).with_children(
                vec![
                    RouteRecord::new("influencer-dashboard", "dashboard", R::PUBLIC),
                    RouteRecord::new("influencer-referrals", "referrals", R::PUBLIC),
                    RouteRecord::new("influencer-products", "products", R::PUBLIC),
                    RouteRecord::new("influencer-earnings", "earnings", R::PUBLIC),
                    RouteRecord::new("influencer-profile", "profile", R::PUBLIC),
                    RouteRecord::new("influencer-settings", "settings", R::PUBLIC),
                ],
            ),
            RouteRecord::new("admin", "/admin", R::role(Role::Admin)).with_children(vec![
                RouteRecord::new("admin-dashboard", "dashboard", R::PUBLIC),
                RouteRecord::new("admin-products", "products", R::PUBLIC),
                RouteRecord::new("admin-proofs", "proofs", R::PUBLIC),
                RouteRecord::new("admin-influencers", "influencers", R::PUBLIC),
            ]),
            RouteRecord::new("offline", "/offline", R::PUBLIC),
            RouteRecord::new("not-found", CATCH_ALL, R::PUBLIC),
        ])
    }

    /// Matched record chain for `target`, outermost first
    pub fn resolve(&self, target: &str) -> Option<Vec<&RouteRecord>> {
        let segments = split(path_only(target));
        match_chain(&self.records, &segments)
    }

    /// Effective requirement for `target`: authentication is required if any
    /// matched record requires it; the role comes from the outermost record
    /// declaring one. Unmatched paths have no requirement.
    pub fn requirement(&self, target: &str) -> RouteRequirement {
        let Some(chain) = self.resolve(target) else {
            return RouteRequirement::PUBLIC;
        };

        RouteRequirement {
            requires_auth: chain.iter().any(|r| r.requirement.requires_auth),
            role: chain.iter().find_map(|r| r.requirement.role),
        }
    }
}

fn match_chain<'a>(records: &'a [RouteRecord], segments: &[&str]) -> Option<Vec<&'a RouteRecord>> {
    for record in records {
        if record.is_catch_all() {
            return Some(vec![record]);
        }

        let pattern = record.segments();
        if pattern.len() > segments.len() {
            continue;
        }

        let prefix_matches = pattern
            .iter()
            .zip(segments)
            .all(|(p, s)| p.starts_with(':') || p == s);
        if !prefix_matches {
            continue;
        }

        let rest = &segments[pattern.len()..];
        if rest.is_empty() {
            return Some(vec![record]);
        }

        if let Some(mut chain) = match_chain(&record.children, rest) {
            chain.insert(0, record);
            return Some(chain);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(table: &RouteTable, path: &str) -> Vec<&'static str> {
        table
            .resolve(path)
            .unwrap_or_default()
            .iter()
            .map(|r| r.name)
            .collect()
    }

    #[test]
    fn test_nested_children_resolve_with_parent() {
        let table = RouteTable::ecomflex();
        assert_eq!(names(&table, "/admin/proofs"), vec!["admin", "admin-proofs"]);
        assert_eq!(
            names(&table, "/influencer/dashboard?tab=week"),
            vec!["influencer", "influencer-dashboard"]
        );
    }

    #[test]
    fn test_params_and_catch_all() {
        let table = RouteTable::ecomflex();
        assert_eq!(names(&table, "/product/42"), vec!["product-details"]);
        assert_eq!(names(&table, "/product"), vec!["not-found"]);
        assert_eq!(names(&table, "/admin/unknown"), vec!["not-found"]);
        assert_eq!(names(&table, "/"), vec!["landing"]);
    }

    #[test]
    fn test_child_inherits_parent_requirement() {
        let table = RouteTable::ecomflex();
        assert_eq!(
            table.requirement("/admin/products"),
            RouteRequirement::role(Role::Admin)
        );
        assert_eq!(table.requirement("/home"), RouteRequirement::AUTHENTICATED);
        assert_eq!(table.requirement("/auth/login"), RouteRequirement::PUBLIC);
    }

    #[test]
    fn test_unmatched_path_without_catch_all() {
        let table = RouteTable::new(vec![RouteRecord::new("home", "/home", RouteRequirement::AUTHENTICATED)]);
        assert!(table.resolve("/elsewhere").is_none());
        assert_eq!(table.requirement("/elsewhere"), RouteRequirement::PUBLIC);
    }
}
