use crate::error::Result;
use crate::models::{NewProject, Page, Project, ProjectUpdate};
use crate::transport::ApiClient;
use uuid::Uuid;

pub struct ProjectsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProjectsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        self.client.get("/projects").await
    }

    pub async fn list_page(&self, page: Page) -> Result<Vec<Project>> {
        self.client
            .get(&format!("/projects{}", page.query_string()))
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Project> {
        self.client.get(&format!("/projects/{}", id)).await
    }

    pub async fn create(&self, body: &NewProject) -> Result<Project> {
        self.client.post("/projects", body).await
    }

    pub async fn update(&self, id: Uuid, body: &ProjectUpdate) -> Result<Project> {
        self.client.patch(&format!("/projects/{}", id), body).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.client.delete(&format!("/projects/{}", id)).await
    }
}
