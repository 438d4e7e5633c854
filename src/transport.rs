//! HTTP transport to the LRWeb backend
//!
//! Every request carries `Content-Type: application/json` and the caller identity.
//! Non-2xx answers become [`Error::Status`] with the numeric status and raw body.

use crate::config::{Config, OriginMode};
use crate::error::{Error, Result};
use crate::identity::{resolve_provider, IdentityProvider, USER_ID_HEADER};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Where relative API paths are rooted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseOrigin {
    /// Talk to the backend origin directly
    Direct(Url),
    /// Same-origin prefix forwarded to the backend by a reverse proxy
    Proxied { origin: Url, prefix: String },
}

impl BaseOrigin {
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.backend_url()?;
        Ok(match config.backend.mode {
            OriginMode::Direct => BaseOrigin::Direct(url),
            OriginMode::Proxy => BaseOrigin::Proxied {
                origin: url,
                prefix: config.backend.proxy_prefix.clone(),
            },
        })
    }

    /// Absolute URL for a path such as `/projects/{id}`
    ///
    /// Built by concatenation: `Url::join` would drop the proxy prefix.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let base = match self {
            BaseOrigin::Direct(url) => url.as_str().trim_end_matches('/').to_string(),
            BaseOrigin::Proxied { origin, prefix } => format!(
                "{}/{}",
                origin.as_str().trim_end_matches('/'),
                prefix.trim_matches('/')
            ),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }
}

impl fmt::Display for BaseOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseOrigin::Direct(url) => write!(f, "{}", url),
            BaseOrigin::Proxied { origin, prefix } => write!(f, "{} (via {})", origin, prefix),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Typed JSON client for the backend
///
/// Cheap to clone; clones share the connection pool and identity provider.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    origin: BaseOrigin,
    identity: Arc<dyn IdentityProvider>,
}

impl ApiClient {
    pub fn new(
        origin: BaseOrigin,
        identity: Arc<dyn IdentityProvider>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let caller = identity.identity();
        if caller.is_anonymous() {
            warn!(
                "No user id configured; sending the anonymous dev identity ({}). \
                 This is a placeholder for real authentication.",
                caller.header_value()
            );
        }
        debug!(origin = %origin, caller = %caller, "API client ready");
        Ok(Self {
            client,
            origin,
            identity,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let origin = BaseOrigin::from_config(config)?;
        let identity = resolve_provider(config)?;
        Self::new(origin, identity, config.request_timeout())
    }

    pub fn origin(&self) -> &BaseOrigin {
        &self.origin
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// Send a request and decode the JSON answer
    ///
    /// A 204 decodes `T` from JSON `null`, so `()` and `Option<_>` callers get no value.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.origin.resolve(path)?;
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_ID_HEADER, self.identity.identity().header_value());
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, url = %url, status = status.as_u16(), "Received response");

        if !status.is_success() {
            let body = response.text().await?;
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    /// Backend liveness check
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("/health").await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{client_for, TEST_USER};
    use super::*;
    use crate::identity::{Identity, StaticIdentity};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_direct_origin_resolution() {
        let origin = BaseOrigin::Direct(Url::parse("http://localhost:8000").unwrap());
        assert_eq!(
            origin.resolve("/projects/abc").unwrap().as_str(),
            "http://localhost:8000/projects/abc"
        );
        assert_eq!(
            origin.resolve("projects").unwrap().as_str(),
            "http://localhost:8000/projects"
        );
    }

    #[test]
    fn test_proxied_origin_keeps_prefix() {
        let origin = BaseOrigin::Proxied {
            origin: Url::parse("https://lr.example.org/").unwrap(),
            prefix: "/api".to_string(),
        };
        assert_eq!(
            origin.resolve("/projects?skip=0&limit=50").unwrap().as_str(),
            "https://lr.example.org/api/projects?skip=0&limit=50"
        );
    }

    #[tokio::test]
    async fn test_request_sends_identity_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects"))
            .and(header("content-type", "application/json"))
            .and(header("x-user-id", TEST_USER.to_string().as_str()))
            .and(body_json(json!({"name": "X"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let value: serde_json::Value = client.post("/projects", &json!({"name": "X"})).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_anonymous_identity_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .and(header("x-user-id", "00000000-0000-0000-0000-000000000001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(
            BaseOrigin::Direct(Url::parse(&server.uri()).unwrap()),
            Arc::new(StaticIdentity(Identity::AnonymousDev)),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.health().await.unwrap().status, "ok");
    }

    #[tokio::test]
    async fn test_no_content_yields_unit() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/projects/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        client.delete::<()>("/projects/1").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_embeds_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"detail":"Project not found"}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client
            .get::<serde_json::Value>("/projects/missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), r#"404: {"detail":"Project not found"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = client_for(&uri);
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert_eq!(err.status(), None);
    }
}
