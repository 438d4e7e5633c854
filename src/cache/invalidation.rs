//! Declared dependencies from each write to the reads it makes stale
//!
//! Every mutation goes through [`QueryCache::mutate`](super::QueryCache::mutate) with a
//! `WriteOp`; the match below is exhaustive, so a new write cannot be added without
//! stating which keys it affects.

use super::keys::{self, QueryKey};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    CreateProject,
    UpdateProject { project_id: Uuid },
    DeleteProject { project_id: Uuid },
    CreateRun { project_id: Uuid },
    AddPaper { project_id: Uuid },
    LinkPaper { project_id: Uuid },
}

impl WriteOp {
    /// Key prefixes invalidated after the write succeeds
    pub fn invalidates(&self) -> Vec<QueryKey> {
        match *self {
            WriteOp::CreateProject => vec![keys::projects()],
            WriteOp::UpdateProject { project_id } => {
                vec![keys::projects(), keys::project(project_id)]
            }
            WriteOp::DeleteProject { project_id } => vec![
                keys::projects(),
                keys::project(project_id),
                keys::runs(project_id),
                keys::run_scope(project_id),
                keys::papers(project_id),
                keys::paper_scope(project_id),
            ],
            // Run creation does not touch the project detail
            WriteOp::CreateRun { project_id } => vec![keys::runs(project_id)],
            WriteOp::AddPaper { project_id } | WriteOp::LinkPaper { project_id } => {
                vec![keys::papers(project_id)]
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WriteOp::CreateProject => "create_project",
            WriteOp::UpdateProject { .. } => "update_project",
            WriteOp::DeleteProject { .. } => "delete_project",
            WriteOp::CreateRun { .. } => "create_run",
            WriteOp::AddPaper { .. } => "add_paper",
            WriteOp::LinkPaper { .. } => "link_paper",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(op: WriteOp, key: &QueryKey) -> bool {
        op.invalidates().iter().any(|prefix| key.starts_with(prefix))
    }

    #[test]
    fn test_create_run_only_touches_run_list() {
        let pid = Uuid::new_v4();
        let op = WriteOp::CreateRun { project_id: pid };

        assert!(covered(op, &keys::runs(pid)));
        assert!(!covered(op, &keys::project(pid)));
        assert!(!covered(op, &keys::projects()));
        assert!(!covered(op, &keys::runs(Uuid::new_v4())));
    }

    #[test]
    fn test_delete_project_covers_everything_scoped_to_it() {
        let pid = Uuid::new_v4();
        let op = WriteOp::DeleteProject { project_id: pid };

        assert!(covered(op, &keys::projects()));
        assert!(covered(op, &keys::project(pid)));
        assert!(covered(op, &keys::runs(pid)));
        assert!(covered(op, &keys::run(pid, Uuid::new_v4())));
        assert!(covered(op, &keys::papers(pid)));
        assert!(covered(op, &keys::paper(pid, Uuid::new_v4())));
        assert!(!covered(op, &keys::project(Uuid::new_v4())));
    }

    #[test]
    fn test_paper_writes_touch_paper_list() {
        let pid = Uuid::new_v4();
        for op in [
            WriteOp::AddPaper { project_id: pid },
            WriteOp::LinkPaper { project_id: pid },
        ] {
            assert!(covered(op, &keys::papers(pid)));
            assert!(covered(op, &keys::papers_page(pid, Default::default())));
            assert!(!covered(op, &keys::runs(pid)));
        }
    }

    #[test]
    fn test_project_writes_refresh_list() {
        let pid = Uuid::new_v4();
        assert!(covered(WriteOp::CreateProject, &keys::projects()));
        assert!(covered(
            WriteOp::UpdateProject { project_id: pid },
            &keys::project(pid)
        ));
        assert!(covered(
            WriteOp::UpdateProject { project_id: pid },
            &keys::projects_page(Default::default())
        ));
    }
}
