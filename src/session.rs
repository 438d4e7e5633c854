//! Cached reads and invalidating writes, as used by the command views

use crate::cache::{keys, QueryCache, WriteOp};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    ConfigSnapshot, LinkPaper, NewPaper, NewProject, Page, Project, ProjectPaper, ProjectUpdate,
    Run,
};
use crate::transport::ApiClient;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// A project with its runs, fetched together for the detail view
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOverview {
    pub project: Project,
    pub runs: Vec<Run>,
}

/// A run with the papers of its project
#[derive(Debug, Clone, Serialize)]
pub struct RunOverview {
    pub run: Run,
    pub papers: Vec<ProjectPaper>,
}

#[derive(Clone)]
pub struct Session {
    client: ApiClient,
    cache: QueryCache,
}

impl Session {
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            ApiClient::from_config(config)?,
            QueryCache::new(config.stale_time()),
        ))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // Reads

    pub async fn projects(&self, page: Option<Page>) -> Result<Vec<Project>> {
        let client = self.client.clone();
        match page {
            None => {
                self.cache
                    .query(keys::projects(), move || async move {
                        client.projects().list().await
                    })
                    .await
            }
            Some(page) => {
                self.cache
                    .query(keys::projects_page(page), move || async move {
                        client.projects().list_page(page).await
                    })
                    .await
            }
        }
    }

    pub async fn project(&self, id: Uuid) -> Result<Project> {
        let client = self.client.clone();
        self.cache
            .query(keys::project(id), move || async move {
                client.projects().get(id).await
            })
            .await
    }

    pub async fn runs(&self, project_id: Uuid, page: Option<Page>) -> Result<Vec<Run>> {
        let client = self.client.clone();
        match page {
            None => {
                self.cache
                    .query(keys::runs(project_id), move || async move {
                        client.runs().list(project_id).await
                    })
                    .await
            }
            Some(page) => {
                self.cache
                    .query(keys::runs_page(project_id, page), move || async move {
                        client.runs().list_page(project_id, page).await
                    })
                    .await
            }
        }
    }

    pub async fn run(&self, project_id: Uuid, run_id: Uuid) -> Result<Run> {
        let client = self.client.clone();
        self.cache
            .query(keys::run(project_id, run_id), move || async move {
                client.runs().get(project_id, run_id).await
            })
            .await
    }

    pub async fn papers(&self, project_id: Uuid, page: Option<Page>) -> Result<Vec<ProjectPaper>> {
        let client = self.client.clone();
        match page {
            None => {
                self.cache
                    .query(keys::papers(project_id), move || async move {
                        client.papers().list(project_id).await
                    })
                    .await
            }
            Some(page) => {
                self.cache
                    .query(keys::papers_page(project_id, page), move || async move {
                        client.papers().list_page(project_id, page).await
                    })
                    .await
            }
        }
    }

    pub async fn paper(&self, project_id: Uuid, paper_id: Uuid) -> Result<ProjectPaper> {
        let client = self.client.clone();
        self.cache
            .query(keys::paper(project_id, paper_id), move || async move {
                client.papers().get(project_id, paper_id).await
            })
            .await
    }

    /// Project and its runs, requested concurrently
    pub async fn project_overview(&self, id: Uuid) -> Result<ProjectOverview> {
        let (project, runs) = tokio::join!(self.project(id), self.runs(id, None));
        Ok(ProjectOverview {
            project: project?,
            runs: runs?,
        })
    }

    /// Run and its project's papers, requested concurrently
    pub async fn run_overview(&self, project_id: Uuid, run_id: Uuid) -> Result<RunOverview> {
        let (run, papers) = tokio::join!(
            self.run(project_id, run_id),
            self.papers(project_id, None)
        );
        Ok(RunOverview {
            run: run?,
            papers: papers?,
        })
    }

    // Writes

    pub async fn create_project(&self, body: NewProject) -> Result<Project> {
        if body.name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Project name must not be empty".to_string(),
            ));
        }
        let project = self
            .cache
            .mutate(WriteOp::CreateProject, self.client.projects().create(&body))
            .await?;
        info!(project_id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    pub async fn update_project(&self, id: Uuid, body: ProjectUpdate) -> Result<Project> {
        if matches!(&body.name, Some(name) if name.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "Project name must not be empty".to_string(),
            ));
        }
        self.cache
            .mutate(
                WriteOp::UpdateProject { project_id: id },
                self.client.projects().update(id, &body),
            )
            .await
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<()> {
        self.cache
            .mutate(
                WriteOp::DeleteProject { project_id: id },
                self.client.projects().delete(id),
            )
            .await?;
        info!(project_id = %id, "Deleted project");
        Ok(())
    }

    pub async fn create_run(
        &self,
        project_id: Uuid,
        snapshot: Option<ConfigSnapshot>,
    ) -> Result<Run> {
        let run = self
            .cache
            .mutate(
                WriteOp::CreateRun { project_id },
                self.client.runs().create(project_id, snapshot),
            )
            .await?;
        info!(run_id = %run.id, project_id = %project_id, "Created run");
        Ok(run)
    }

    pub async fn add_paper(&self, project_id: Uuid, body: NewPaper) -> Result<ProjectPaper> {
        self.cache
            .mutate(
                WriteOp::AddPaper { project_id },
                self.client.papers().add(project_id, &body),
            )
            .await
    }

    pub async fn link_paper(&self, project_id: Uuid, body: LinkPaper) -> Result<ProjectPaper> {
        self.cache
            .mutate(
                WriteOp::LinkPaper { project_id },
                self.client.papers().link(project_id, &body),
            )
            .await
    }

    /// Re-read a run every `interval` until it reaches a terminal status.
    /// `on_change` sees the first read and every status change after it.
    pub async fn poll_run<F>(
        &self,
        project_id: Uuid,
        run_id: Uuid,
        interval: Duration,
        mut on_change: F,
    ) -> Result<Run>
    where
        F: FnMut(&Run),
    {
        let key = keys::run(project_id, run_id);
        let mut last_status = None;
        loop {
            self.cache.invalidate(&key);
            let run = self.run(project_id, run_id).await?;
            if last_status != Some(run.status) {
                on_change(&run);
                last_status = Some(run.status);
            }
            if run.status.is_terminal() {
                return Ok(run);
            }
            debug!(run_id = %run_id, status = %run.status, "Run still active, waiting");
            tokio::time::sleep(interval).await;
        }
    }
}
