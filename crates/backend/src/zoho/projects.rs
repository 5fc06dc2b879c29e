//! Zoho Projects client: task listing for one fixed project.

use std::sync::Arc;

use axum::http::header;
use serde_json::Value;

use super::{oauth_header, TokenManager, ZohoError};

pub struct ProjectsClient {
    http: reqwest::Client,
    api_base: String,
    project_id: String,
    tokens: Arc<TokenManager>,
}

impl ProjectsClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        project_id: impl Into<String>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        ProjectsClient {
            http,
            api_base: api_base.into(),
            project_id: project_id.into(),
            tokens,
        }
    }

    /// Fetch the raw task-list payload for the configured project.
    ///
    /// The body is returned as-is; shape validation happens at the pass level
    /// so a malformed response can be surfaced verbatim.
    pub async fn list_project_tasks(&self) -> Result<Value, ZohoError> {
        let url = format!("{}/projects/{}/tasks/", self.api_base, self.project_id);
        let token = self.tokens.bearer().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, oauth_header(&token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZohoError::Status {
                endpoint: "project tasks",
                status,
            });
        }

        Ok(response.json().await?)
    }
}
