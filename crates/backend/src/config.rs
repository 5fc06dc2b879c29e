//! Environment-driven configuration for the monitor service.

use anyhow::Context;
use chrono_tz::Tz;

/// Regional base URLs for the Zoho APIs. Two hard-coded sets, selected by
/// the REGION flag.
#[derive(Debug, Clone)]
pub struct RegionEndpoints {
    pub oauth_url: String,
    pub projects_api_base: String,
    pub cliq_api_base: String,
}

impl RegionEndpoints {
    pub fn for_region(region: &str, portal_name: &str) -> Self {
        if region.eq_ignore_ascii_case("in") {
            RegionEndpoints {
                oauth_url: "https://accounts.zoho.in/oauth/v2/token".to_string(),
                projects_api_base: format!(
                    "https://projectsapi.zoho.in/restapi/portal/{portal_name}"
                ),
                cliq_api_base: "https://cliq.zoho.in/api/v2".to_string(),
            }
        } else {
            RegionEndpoints {
                oauth_url: "https://accounts.zoho.com/oauth/v2/token".to_string(),
                projects_api_base: format!(
                    "https://projectsapi.zoho.com/restapi/portal/{portal_name}"
                ),
                cliq_api_base: "https://cliq.zoho.com/api/v2".to_string(),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub project_id: String,
    pub endpoints: RegionEndpoints,

    /// Lookahead window before a due date counts as at-risk.
    pub due_soon_hours: i64,

    /// Shared secret for the webhook routes. When unset the check is skipped.
    pub webhook_secret: Option<String>,

    /// Timezone that naive due dates are assumed to be in.
    pub reference_tz: Tz,

    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let client_id = require_env("ZOHO_CLIENT_ID")?;
        let client_secret = require_env("ZOHO_CLIENT_SECRET")?;
        let refresh_token = require_env("ZOHO_REFRESH_TOKEN")?;
        let portal_name = require_env("PORTAL_NAME")?;
        let project_id = require_env("PROJECT_ID")?;

        let region = std::env::var("REGION").unwrap_or_else(|_| "in".to_string());
        let endpoints = RegionEndpoints::for_region(&region, &portal_name);

        let due_soon_hours = std::env::var("DUE_SOON_HOURS")
            .ok()
            .map(|raw| raw.parse::<i64>())
            .transpose()
            .context("DUE_SOON_HOURS must be an integer")?
            .unwrap_or(24);

        let webhook_secret = std::env::var("CLIQ_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let reference_tz = std::env::var("REFERENCE_TZ")
            .unwrap_or_else(|_| "Asia/Kolkata".to_string())
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("REFERENCE_TZ is not a valid timezone: {e}"))?;

        let port = std::env::var("PORT")
            .ok()
            .map(|raw| raw.parse::<u16>())
            .transpose()
            .context("PORT must be a valid port number")?
            .unwrap_or(8000);

        Ok(Config {
            client_id,
            client_secret,
            refresh_token,
            project_id,
            endpoints,
            due_soon_hours,
            webhook_secret,
            reference_tz,
            port,
        })
    }
}

fn require_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{} environment variable must be set", name))
}
