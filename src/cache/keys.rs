//! Cache key model and the key conventions for every read

use crate::models::Page;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Ordered token sequence identifying a cached query result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self(parts.into_iter().map(|p| p.to_string()).collect())
    }

    pub fn with(mut self, part: impl ToString) -> Self {
        self.0.push(part.to_string());
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Prefix match used by invalidation: `["runs", p]` covers `["runs", p, "page", ..]`
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

pub fn projects() -> QueryKey {
    QueryKey::new(["projects"])
}

pub fn projects_page(page: Page) -> QueryKey {
    paged(projects(), page)
}

pub fn project(id: Uuid) -> QueryKey {
    QueryKey::new(["project"]).with(id)
}

pub fn runs(project_id: Uuid) -> QueryKey {
    QueryKey::new(["runs"]).with(project_id)
}

pub fn runs_page(project_id: Uuid, page: Page) -> QueryKey {
    paged(runs(project_id), page)
}

/// Prefix of every single-run key of a project
pub fn run_scope(project_id: Uuid) -> QueryKey {
    QueryKey::new(["run"]).with(project_id)
}

pub fn run(project_id: Uuid, run_id: Uuid) -> QueryKey {
    run_scope(project_id).with(run_id)
}

pub fn papers(project_id: Uuid) -> QueryKey {
    QueryKey::new(["papers"]).with(project_id)
}

pub fn papers_page(project_id: Uuid, page: Page) -> QueryKey {
    paged(papers(project_id), page)
}

/// Prefix of every single-association key of a project
pub fn paper_scope(project_id: Uuid) -> QueryKey {
    QueryKey::new(["paper"]).with(project_id)
}

pub fn paper(project_id: Uuid, paper_id: Uuid) -> QueryKey {
    paper_scope(project_id).with(paper_id)
}

fn paged(key: QueryKey, page: Page) -> QueryKey {
    key.with("page").with(page.skip).with(page.limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        let pid = Uuid::new_v4();
        let rid = Uuid::new_v4();

        assert_eq!(projects().to_string(), "projects");
        assert_eq!(runs(pid).to_string(), format!("runs:{}", pid));
        assert_eq!(run(pid, rid).parts().len(), 3);
        assert!(run(pid, rid).starts_with(&run_scope(pid)));
        assert!(runs_page(pid, Page::default()).starts_with(&runs(pid)));
    }

    #[test]
    fn test_keys_do_not_collide() {
        let pid = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_ne!(runs(pid), papers(pid));
        assert_ne!(runs(pid), runs(other));
        assert_ne!(project(pid), projects());
        assert!(!runs(pid).starts_with(&runs(other)));
        assert!(!project(pid).starts_with(&projects()));
        assert!(!paper(pid, other).starts_with(&papers(pid)));
    }
}
