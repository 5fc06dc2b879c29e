//! Thin clients for the Zoho Projects and Cliq REST APIs.

mod cliq;
mod projects;
mod token;

pub use cliq::{CliqClient, DmOutcome};
pub use projects::ProjectsClient;
pub use token::{AuthError, TokenManager};

use thiserror::Error;

/// Failures talking to a Zoho API. Token-exchange failures are wrapped so the
/// caller can still tell them apart; at the pass level both abort the fetch.
#[derive(Debug, Error)]
pub enum ZohoError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
}

/// Authorization header value for Zoho APIs (not a standard Bearer scheme).
fn oauth_header(token: &str) -> String {
    format!("Zoho-oauthtoken {token}")
}
