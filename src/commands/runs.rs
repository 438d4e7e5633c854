//! Run views and the run creation form

use super::format_timestamp;
use crate::error::{Error, Result};
use crate::models::{ConfigSnapshot, Page, Run, RunStatus};
use crate::session::{RunOverview, Session};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Where the frozen configuration of a new run comes from
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    /// Inline JSON object
    pub json: Option<String>,
    /// File holding a JSON object
    pub file: Option<std::path::PathBuf>,
    /// Individual `key=value` entries; values parse as JSON when they can
    pub set: Vec<String>,
}

impl SnapshotSource {
    pub fn is_empty(&self) -> bool {
        self.json.is_none() && self.file.is_none() && self.set.is_empty()
    }

    pub fn resolve(&self) -> Result<Option<ConfigSnapshot>> {
        if self.is_empty() {
            return Ok(None);
        }

        let mut entries = match (&self.json, &self.file) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput(
                    "Use either an inline snapshot or a snapshot file, not both".to_string(),
                ))
            }
            (Some(raw), None) => ConfigSnapshot::from_str(raw)?.as_map().clone(),
            (None, Some(path)) => read_snapshot_file(path)?.as_map().clone(),
            (None, None) => serde_json::Map::new(),
        };

        for pair in &self.set {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::InvalidInput(format!("Expected key=value, got '{}'", pair))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidInput(format!("Empty key in '{}'", pair)));
            }
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            entries.insert(key.to_string(), value);
        }

        Ok(Some(ConfigSnapshot::new(entries)))
    }
}

fn read_snapshot_file(path: &Path) -> Result<ConfigSnapshot> {
    let raw = std::fs::read_to_string(path)?;
    ConfigSnapshot::from_str(&raw)
}

pub async fn cmd_list_runs(
    session: &Session,
    project_id: Uuid,
    page: Option<Page>,
) -> Result<Vec<Run>> {
    info!(project_id = %project_id, "Listing runs");
    session.runs(project_id, page).await
}

pub async fn cmd_show_run(session: &Session, project_id: Uuid, run_id: Uuid) -> Result<RunOverview> {
    info!(run_id = %run_id, "Showing run");
    session.run_overview(project_id, run_id).await
}

pub async fn cmd_create_run(
    session: &Session,
    project_id: Uuid,
    snapshot: &SnapshotSource,
) -> Result<Run> {
    let snapshot = snapshot.resolve()?;
    session.create_run(project_id, snapshot).await
}

pub async fn cmd_watch_run(
    session: &Session,
    project_id: Uuid,
    run_id: Uuid,
    interval: Duration,
    json: bool,
) -> Result<Run> {
    session
        .poll_run(project_id, run_id, interval, |run| {
            if json {
                if let Ok(line) = serde_json::to_string(run) {
                    println!("{}", line);
                }
            } else {
                println!("{} {}  {}", status_marker(run.status), run.short_id(), run.status);
            }
        })
        .await
}

fn status_marker(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "…",
        RunStatus::Running => "▶",
        RunStatus::Completed => "✓",
        RunStatus::Failed => "✗",
    }
}

pub fn print_runs(runs: &[Run]) {
    println!("\n🧪 Runs\n");

    if runs.is_empty() {
        println!("No runs yet. Start one with 'lrweb runs create <project-id>'.");
        return;
    }

    for run in runs {
        println!(
            "{} Run {}  {}",
            status_marker(run.status),
            run.short_id(),
            run.status
        );
        println!("  ID: {}", run.id);
        println!("  Created: {}", format_timestamp(&run.created_at));
        if let Some(completed) = &run.completed_at {
            println!("  Completed: {}", format_timestamp(completed));
        }
        println!();
    }
}

pub fn print_run_overview(overview: &RunOverview) {
    let run = &overview.run;
    println!("\n🧪 Run {}\n", run.short_id());
    println!("ID: {}", run.id);
    println!("Project: {}", run.project_id);
    println!("Status: {} {}", status_marker(run.status), run.status);
    println!("Created: {}", format_timestamp(&run.created_at));
    match &run.completed_at {
        Some(completed) => println!("Completed: {}", format_timestamp(completed)),
        None => println!("Completed: -"),
    }

    println!("\nConfiguration snapshot:");
    if run.config_snapshot.is_empty() {
        println!("  (empty)");
    } else {
        for line in run.config_snapshot.to_pretty_json().lines() {
            println!("  {}", line);
        }
    }

    println!("\nPapers in project: {}", overview.papers.len());
}

pub fn print_created_run(run: &Run) {
    println!("✓ Started run {} ({})", run.short_id(), run.status);
    println!("  ID: {}", run.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_no_snapshot_source_means_none() {
        assert!(SnapshotSource::default().resolve().unwrap().is_none());
    }

    #[test]
    fn test_set_entries_parse_json_values() {
        let source = SnapshotSource {
            json: Some(r#"{"model": "gpt-4o"}"#.to_string()),
            set: vec![
                "prompt_version=v2".to_string(),
                "clustering_params={\"n_clusters\": 10}".to_string(),
                "temperature=0.2".to_string(),
            ],
            ..Default::default()
        };
        let snapshot = source.resolve().unwrap().unwrap();

        assert_eq!(snapshot.get("model"), Some(&json!("gpt-4o")));
        assert_eq!(snapshot.get("prompt_version"), Some(&json!("v2")));
        assert_eq!(snapshot.get("clustering_params"), Some(&json!({"n_clusters": 10})));
        assert_eq!(snapshot.get("temperature"), Some(&json!(0.2)));
    }

    #[test]
    fn test_snapshot_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, r#"{"privacy_mode": "metadata-only"}"#).unwrap();

        let source = SnapshotSource {
            file: Some(path),
            ..Default::default()
        };
        let snapshot = source.resolve().unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        let both = SnapshotSource {
            json: Some("{}".to_string()),
            file: Some("x.json".into()),
            ..Default::default()
        };
        assert!(matches!(both.resolve(), Err(Error::InvalidInput(_))));

        let no_equals = SnapshotSource {
            set: vec!["model".to_string()],
            ..Default::default()
        };
        assert!(matches!(no_equals.resolve(), Err(Error::InvalidInput(_))));

        let not_object = SnapshotSource {
            json: Some("[1, 2]".to_string()),
            ..Default::default()
        };
        assert!(not_object.resolve().is_err());
    }
}
