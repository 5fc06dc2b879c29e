//! Zoho Cliq client: user-directory lookup and direct-message delivery.

use std::sync::Arc;

use axum::http::header;
use serde_json::{json, Value};

use super::{oauth_header, TokenManager, ZohoError};

/// Marker substring Cliq returns when a user tries to DM themselves.
const SELF_MESSAGE_MARKER: &str = "buddies_self_message_restricted";

/// Per-recipient delivery outcome. Failures are values, not errors; the
/// caller aggregates them so one recipient never aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmOutcome {
    Sent,
    /// Directory search found no user (or no usable id) for the email.
    UserNotFound,
    /// Cliq refuses self-directed messages; treated as not-sent, not an error.
    SelfMessageRestricted,
    Failed(String),
}

impl DmOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DmOutcome::Sent)
    }
}

pub struct CliqClient {
    http: reqwest::Client,
    api_base: String,
    tokens: Arc<TokenManager>,
}

impl CliqClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        CliqClient {
            http,
            api_base: api_base.into(),
            tokens,
        }
    }

    /// Send a direct message to the owner behind `owner_email`.
    ///
    /// Never returns an error: transport and token failures collapse into
    /// `DmOutcome::Failed` with the reason, logged by the caller.
    pub async fn send_dm(&self, owner_email: &str, text: &str) -> DmOutcome {
        match self.try_send_dm(owner_email, text).await {
            Ok(outcome) => outcome,
            Err(e) => DmOutcome::Failed(e.to_string()),
        }
    }

    async fn try_send_dm(&self, owner_email: &str, text: &str) -> Result<DmOutcome, ZohoError> {
        let Some(buddy_id) = self.find_buddy_id(owner_email).await? else {
            return Ok(DmOutcome::UserNotFound);
        };

        let token = self.tokens.bearer().await?;
        let response = self
            .http
            .post(format!("{}/buddies/{}/message", self.api_base, buddy_id))
            .header(header::AUTHORIZATION, oauth_header(&token))
            .json(&json!({"text": text}))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains(SELF_MESSAGE_MARKER) {
            tracing::info!("Cannot send DM to self for owner: {}", owner_email);
            return Ok(DmOutcome::SelfMessageRestricted);
        }
        if !status.is_success() {
            return Ok(DmOutcome::Failed(format!("message send returned {status}")));
        }

        Ok(DmOutcome::Sent)
    }

    /// Look up the messaging-platform user id for an email address.
    async fn find_buddy_id(&self, owner_email: &str) -> Result<Option<String>, ZohoError> {
        let token = self.tokens.bearer().await?;
        let response = self
            .http
            .get(format!("{}/users", self.api_base))
            .query(&[("search", owner_email)])
            .header(header::AUTHORIZATION, oauth_header(&token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZohoError::Status {
                endpoint: "user search",
                status,
            });
        }

        let body: Value = response.json().await?;
        let entry = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|entries| entries.first());

        let Some(entry) = entry else {
            return Ok(None);
        };

        // id field priority: zuid, then email_id, then id
        let buddy_id = ["zuid", "email_id", "id"]
            .iter()
            .filter_map(|key| entry.get(*key))
            .find_map(id_string);

        Ok(buddy_id)
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
