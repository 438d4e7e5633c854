use crate::error::Result;
use crate::models::{ConfigSnapshot, NewRun, Page, Run};
use crate::transport::ApiClient;
use tracing::warn;
use uuid::Uuid;

pub struct RunsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> RunsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, project_id: Uuid) -> Result<Vec<Run>> {
        let runs: Vec<Run> = self
            .client
            .get(&format!("/projects/{}/runs", project_id))
            .await?;
        runs.iter().for_each(observe_lifecycle);
        Ok(runs)
    }

    pub async fn list_page(&self, project_id: Uuid, page: Page) -> Result<Vec<Run>> {
        let runs: Vec<Run> = self
            .client
            .get(&format!("/projects/{}/runs{}", project_id, page.query_string()))
            .await?;
        runs.iter().for_each(observe_lifecycle);
        Ok(runs)
    }

    pub async fn get(&self, project_id: Uuid, run_id: Uuid) -> Result<Run> {
        let run: Run = self
            .client
            .get(&format!("/projects/{}/runs/{}", project_id, run_id))
            .await?;
        observe_lifecycle(&run);
        Ok(run)
    }

    /// Start a run; a missing snapshot is sent as the empty mapping
    pub async fn create(&self, project_id: Uuid, snapshot: Option<ConfigSnapshot>) -> Result<Run> {
        let body = NewRun {
            config_snapshot: snapshot.unwrap_or_default(),
        };
        self.client
            .post(&format!("/projects/{}/runs", project_id), &body)
            .await
    }
}

// Status transitions belong to the backend; the client only reports oddities.
fn observe_lifecycle(run: &Run) {
    if !run.lifecycle_consistent() {
        warn!(
            run_id = %run.id,
            status = %run.status,
            completed_at = ?run.completed_at,
            "Run reports completed_at inconsistent with its status"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{ConfigSnapshot, RunStatus};
    use crate::test_support::{client_for, run_json};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_without_snapshot_sends_empty_mapping() {
        let server = MockServer::start().await;
        let project_id = Uuid::new_v4();
        let run_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path(format!("/projects/{}/runs", project_id)))
            .and(body_json(json!({"config_snapshot": {}})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(run_json(run_id, project_id, "pending", json!({}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let run = client.runs().create(project_id, None).await.unwrap();
        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(run.config_snapshot, ConfigSnapshot::default());
        assert!(run.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_create_with_snapshot_is_stored_verbatim() {
        let server = MockServer::start().await;
        let project_id = Uuid::new_v4();
        let snapshot = json!({
            "model": "gpt-4o",
            "prompt_version": "v1",
            "clustering_params": {"n_clusters": 10},
            "privacy_mode": "metadata-only"
        });

        Mock::given(method("POST"))
            .and(path(format!("/projects/{}/runs", project_id)))
            .and(body_json(json!({"config_snapshot": snapshot.clone()})))
            .respond_with(ResponseTemplate::new(201).set_body_json(run_json(
                Uuid::new_v4(),
                project_id,
                "pending",
                snapshot.clone(),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let sent = ConfigSnapshot::from_value(snapshot).unwrap();
        let run = client
            .runs()
            .create(project_id, Some(sent.clone()))
            .await
            .unwrap();
        assert_eq!(run.config_snapshot, sent);
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let server = MockServer::start().await;
        let project_id = Uuid::new_v4();
        let done = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/projects/{}/runs", project_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                run_json(Uuid::new_v4(), project_id, "running", json!({})),
                run_json(done, project_id, "completed", json!({})),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/projects/{}/runs/{}", project_id, done)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(run_json(done, project_id, "completed", json!({}))),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let runs = client.runs().list(project_id).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|r| r.project_id == project_id));

        let run = client.runs().get(project_id, done).await.unwrap();
        assert!(run.status.is_terminal());
        assert!(run.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_run_is_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"detail":"Run not found"}"#))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client
            .runs()
            .get(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
