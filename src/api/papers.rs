use crate::error::Result;
use crate::models::{LinkPaper, NewPaper, Page, ProjectPaper};
use crate::transport::ApiClient;
use uuid::Uuid;

pub struct PapersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PapersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Associations of a project, each with its embedded paper
    pub async fn list(&self, project_id: Uuid) -> Result<Vec<ProjectPaper>> {
        self.client
            .get(&format!("/projects/{}/papers", project_id))
            .await
    }

    pub async fn list_page(&self, project_id: Uuid, page: Page) -> Result<Vec<ProjectPaper>> {
        self.client
            .get(&format!(
                "/projects/{}/papers{}",
                project_id,
                page.query_string()
            ))
            .await
    }

    pub async fn get(&self, project_id: Uuid, paper_id: Uuid) -> Result<ProjectPaper> {
        self.client
            .get(&format!("/projects/{}/papers/{}", project_id, paper_id))
            .await
    }

    /// Create (or reuse, matched by DOI / arXiv id) a canonical paper and link it
    pub async fn add(&self, project_id: Uuid, body: &NewPaper) -> Result<ProjectPaper> {
        self.client
            .post(&format!("/projects/{}/papers", project_id), body)
            .await
    }

    /// Link an already known canonical paper
    pub async fn link(&self, project_id: Uuid, body: &LinkPaper) -> Result<ProjectPaper> {
        self.client
            .post(&format!("/projects/{}/papers/link", project_id), body)
            .await
    }
}
