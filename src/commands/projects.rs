//! Project views and forms

use super::format_timestamp;
use crate::error::{Error, Result};
use crate::models::{NewProject, Page, Project, ProjectUpdate};
use crate::session::{ProjectOverview, Session};
use clap_complete::Shell;
use tracing::info;
use uuid::Uuid;

pub async fn cmd_list_projects(session: &Session, page: Option<Page>) -> Result<Vec<Project>> {
    info!("Listing projects");
    session.projects(page).await
}

pub async fn cmd_show_project(session: &Session, id: Uuid) -> Result<ProjectOverview> {
    info!(project_id = %id, "Showing project");
    session.project_overview(id).await
}

pub async fn cmd_create_project(
    session: &Session,
    name: String,
    description: Option<String>,
) -> Result<Project> {
    session
        .create_project(NewProject {
            name: name.trim().to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
        })
        .await
}

pub async fn cmd_update_project(
    session: &Session,
    id: Uuid,
    name: Option<String>,
    description: Option<String>,
) -> Result<Project> {
    if name.is_none() && description.is_none() {
        return Err(Error::InvalidInput(
            "Nothing to update: pass --name and/or --description".to_string(),
        ));
    }
    session
        .update_project(
            id,
            ProjectUpdate {
                name: name.map(|n| n.trim().to_string()),
                description,
            },
        )
        .await
}

pub async fn cmd_delete_project(session: &Session, id: Uuid) -> Result<()> {
    session.delete_project(id).await
}

pub fn print_projects(projects: &[Project]) {
    println!("\n📁 Projects\n");

    if projects.is_empty() {
        println!("No projects yet. Create one with 'lrweb projects create <name>'.");
        return;
    }

    for project in projects {
        println!("• {}", project.name);
        println!("  ID: {}", project.id);
        if let Some(description) = &project.description {
            println!("  {}", description);
        }
        println!("  Created: {}", format_timestamp(&project.created_at));
        println!();
    }
}

pub fn print_project_overview(overview: &ProjectOverview) {
    let project = &overview.project;
    println!("\n📁 {}\n", project.name);
    println!("ID: {}", project.id);
    if let Some(description) = &project.description {
        println!("Description: {}", description);
    }
    println!("Created: {}", format_timestamp(&project.created_at));
    println!("Updated: {}", format_timestamp(&project.updated_at));

    println!("\nRuns:");
    if overview.runs.is_empty() {
        println!(
            "  No runs yet. Start one with 'lrweb runs create {}'.",
            project.id
        );
        return;
    }
    for run in &overview.runs {
        println!(
            "  {}  {:<9}  {}",
            run.short_id(),
            run.status.to_string(),
            format_timestamp(&run.created_at)
        );
    }
}

pub fn print_project(project: &Project, verb: &str) {
    println!("✓ {} project '{}'", verb, project.name);
    println!("  ID: {}", project.id);
}

/// Project IDs with descriptions for shell completions
pub fn print_project_completions(projects: &[Project], shell: Shell) {
    for project in projects {
        let mut description = match &project.description {
            Some(d) => format!("{} ({})", project.name, d),
            None => project.name.clone(),
        };
        description = description.replace('\n', " ");

        match shell {
            Shell::Zsh => {
                let sanitized = description.replace(':', "\\:");
                println!("{}:{}", project.id, sanitized);
            }
            Shell::Fish => {
                let sanitized = description.replace('\t', " ");
                println!("{}\t{}", project.id, sanitized);
            }
            _ => {
                println!("{}", project.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryCache;
    use crate::test_support::{client_for, project_json};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(server: &MockServer) -> Session {
        Session::new(client_for(&server.uri()), QueryCache::new(Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn test_create_trims_name_and_drops_blank_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects"))
            .and(body_json(json!({"name": "Graph neural nets"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(project_json(
                Uuid::new_v4(),
                "Graph neural nets",
                None,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server);
        let project = cmd_create_project(
            &session,
            "  Graph neural nets ".to_string(),
            Some("  ".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(project.name, "Graph neural nets");
    }

    #[tokio::test]
    async fn test_update_requires_a_field() {
        let server = MockServer::start().await;
        let session = session_for(&server);

        let err = cmd_update_project(&session, Uuid::new_v4(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = cmd_update_project(&session, Uuid::new_v4(), Some(" ".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_with_page_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .and(wiremock::matchers::query_param("skip", "10"))
            .and(wiremock::matchers::query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server);
        let projects = cmd_list_projects(&session, Some(Page { skip: 10, limit: 5 }))
            .await
            .unwrap();
        assert!(projects.is_empty());
    }
}
