//! Concrete reqwest-based client for the Nimbus control plane.

use crate::error::{ApiError, ApiResult};
use crate::{ClientFactory, ClientOptions, IdentityApi};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentUserInfo {
    /// Stable user identifier.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A project on the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A branch within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
struct ProjectsResponse {
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct BranchesResponse {
    branches: Vec<Branch>,
}

/// Client for the Nimbus control-plane API.
///
/// Every request carries the bearer credential it was constructed with.
#[derive(Debug, Clone)]
pub struct Api {
    http: reqwest::Client,
    api_host: String,
    api_key: String,
}

impl Api {
    /// Create a new client bound to a key and host.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_host: options.api_host.trim_end_matches('/').to_string(),
            api_key: options.api_key,
        }
    }

    /// Base URL this client talks to.
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// List projects visible to the authenticated user.
    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let response: ProjectsResponse = self.get("/projects").await?;
        Ok(response.projects)
    }

    /// List branches of a project.
    pub async fn list_branches(&self, project_id: &str) -> ApiResult<Vec<Branch>> {
        let response: BranchesResponse =
            self.get(&format!("/projects/{project_id}/branches")).await?;
        Ok(response.branches)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{}", self.api_host, path);
        debug!(url = %url, "GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IdentityApi for Api {
    async fn get_current_user_info(&self) -> ApiResult<CurrentUserInfo> {
        self.get("/users/me").await
    }
}

/// Factory producing real [`Api`] clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiFactory;

impl ClientFactory for ApiFactory {
    type Client = Api;

    fn make_client(&self, options: ClientOptions) -> Api {
        Api::new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> Api {
        Api::new(ClientOptions {
            api_key: "test-key".to_string(),
            api_host: server.uri(),
        })
    }

    #[tokio::test]
    async fn test_get_current_user_info() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "user_123",
                "email": "dev@example.com"
            })))
            .mount(&server)
            .await;

        let user = api_for(&server).get_current_user_info().await.unwrap();
        assert_eq!(user.id, "user_123");
        assert_eq!(user.email, Some("dev@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_unauthorized_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let err = api_for(&server).get_current_user_info().await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("invalid token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_projects() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "projects": [
                    {"id": "p1", "name": "main-db", "region_id": "eu-central-1"},
                    {"id": "p2", "name": "staging"}
                ]
            })))
            .mount(&server)
            .await;

        let projects = api_for(&server).list_projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "main-db");
        assert_eq!(projects[1].region_id, None);
    }

    #[tokio::test]
    async fn test_list_branches() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/p1/branches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "branches": [
                    {"id": "br-1", "name": "main", "primary": true}
                ]
            })))
            .mount(&server)
            .await;

        let branches = api_for(&server).list_branches("p1").await.unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].primary, Some(true));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = Api::new(ClientOptions {
            api_key: "k".to_string(),
            api_host: "https://api.nimbus.dev/v1/".to_string(),
        });
        assert_eq!(api.api_host(), "https://api.nimbus.dev/v1");
    }
}
