//! Fixtures shared by the unit tests: a client pointed at a mock backend and
//! JSON payloads shaped like the backend's responses.

use crate::identity::{Identity, StaticIdentity};
use crate::transport::{ApiClient, BaseOrigin};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

pub const TEST_USER: Uuid = Uuid::from_u128(0x5eed);

pub fn client_for(uri: &str) -> ApiClient {
    let origin = BaseOrigin::Direct(Url::parse(uri).unwrap());
    ApiClient::new(
        origin,
        Arc::new(StaticIdentity(Identity::User(TEST_USER))),
        Duration::from_secs(5),
    )
    .unwrap()
}

pub fn project_json(id: Uuid, name: &str, description: Option<&str>) -> Value {
    json!({
        "id": id,
        "owner_id": TEST_USER,
        "name": name,
        "description": description,
        "created_at": "2024-05-01T10:00:00.000001",
        "updated_at": "2024-05-01T10:00:00.000001"
    })
}

pub fn run_json(id: Uuid, project_id: Uuid, status: &str, snapshot: Value) -> Value {
    let completed_at = match status {
        "completed" | "failed" => json!("2024-05-01T11:30:00"),
        _ => Value::Null,
    };
    json!({
        "id": id,
        "project_id": project_id,
        "status": status,
        "config_snapshot": snapshot,
        "created_at": "2024-05-01T11:00:00",
        "completed_at": completed_at
    })
}

pub fn project_paper_json(project_id: Uuid, paper_id: Uuid, title: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "project_id": project_id,
        "paper_id": paper_id,
        "inclusion_reason": null,
        "score": null,
        "added_at": "2024-05-02T09:00:00",
        "paper": {
            "id": paper_id,
            "doi": null,
            "arxiv_id": "1706.03762",
            "title": title,
            "authors": ["Vaswani et al."],
            "year": 2017,
            "abstract": "We propose the Transformer architecture.",
            "created_at": "2024-05-02T09:00:00"
        }
    })
}
