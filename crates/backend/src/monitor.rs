//! Orchestration for the monitor and digest passes.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use shared_types::{
    assess, AlertRecord, DigestReport, PassFailure, PassOutcome, RiskLabel, RiskReport, RiskWindow,
    Task,
};

use crate::config::Config;
use crate::zoho::{CliqClient, ProjectsClient, TokenManager};

/// Holds the API clients and pass parameters. Constructed once per process
/// and shared behind the application state.
pub struct RiskMonitor {
    projects: ProjectsClient,
    cliq: CliqClient,
    reference_tz: Tz,
    due_soon_hours: i64,
}

impl RiskMonitor {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            config.endpoints.oauth_url.as_str(),
            config.client_id.as_str(),
            config.client_secret.as_str(),
            config.refresh_token.as_str(),
        ));

        RiskMonitor {
            projects: ProjectsClient::new(
                http.clone(),
                config.endpoints.projects_api_base.as_str(),
                config.project_id.as_str(),
                tokens.clone(),
            ),
            cliq: CliqClient::new(http, config.endpoints.cliq_api_base.as_str(), tokens),
            reference_tz: config.reference_tz,
            due_soon_hours: config.due_soon_hours,
        }
    }

    /// Run one monitor pass: fetch, classify, DM each resolved owner of every
    /// at-risk task. One owner's failure never blocks the others, and one
    /// task's bad data never aborts the batch.
    pub async fn monitor_pass(&self) -> PassOutcome<RiskReport> {
        let tasks = match self.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(failure) => return PassOutcome::Failed(failure),
        };

        let window = self.window(Utc::now());
        let mut report = RiskReport::default();

        for raw in &tasks {
            report.checked += 1;

            let task: Task = match serde_json::from_value(raw.clone()) {
                Ok(task) => task,
                Err(e) => {
                    tracing::error!("Error processing task: {}", e);
                    continue;
                }
            };

            let Some((label, due)) = assess(&task, &window) else {
                continue;
            };

            let text = alert_text(label, &task, due);
            for email in task.alert_owner_emails() {
                let outcome = self.cliq.send_dm(&email, &text).await;
                if outcome.is_sent() {
                    report.alerts_sent += 1;
                    report.alerts.push(AlertRecord {
                        task: task.name().to_string(),
                        user: email,
                    });
                } else {
                    tracing::warn!("Alert to {} not sent: {:?}", email, outcome);
                }
            }
        }

        PassOutcome::Completed(report)
    }

    /// Run the daily digest pass: one aggregated message, sent once per
    /// distinct owner found under `details.owners` of the at-risk tasks.
    pub async fn daily_digest(&self) -> PassOutcome<DigestReport> {
        let tasks = match self.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(failure) => return PassOutcome::Failed(failure),
        };

        let window = self.window(Utc::now());
        let mut lines = Vec::new();
        let mut owners = BTreeSet::new();

        for raw in &tasks {
            let task: Task = match serde_json::from_value(raw.clone()) {
                Ok(task) => task,
                Err(e) => {
                    tracing::error!("Error processing task for digest: {}", e);
                    continue;
                }
            };

            let Some((label, due)) = assess(&task, &window) else {
                continue;
            };

            lines.push(format!(
                "{} *{}* — {}% complete, due {}",
                label.heading(),
                task.name(),
                task.percent(),
                due.format("%Y-%m-%d %I:%M %p")
            ));
            owners.extend(task.digest_owner_emails());
        }

        let digest_text = format!(
            "*Daily Risk Digest — {} IST*\n{}",
            window.now.format("%Y-%m-%d %I:%M %p"),
            lines.join("\n")
        );

        let mut digest_sent = 0;
        for email in &owners {
            let outcome = self.cliq.send_dm(email, &digest_text).await;
            if outcome.is_sent() {
                digest_sent += 1;
            } else {
                tracing::warn!("Digest to {} not sent: {:?}", email, outcome);
            }
        }

        PassOutcome::Completed(DigestReport {
            status: "ok".to_string(),
            digest_sent,
            owners: owners.into_iter().collect(),
        })
    }

    async fn fetch_tasks(&self) -> Result<Vec<Value>, PassFailure> {
        let body = match self.projects.list_project_tasks().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Error fetching tasks: {:#}", e);
                return Err(PassFailure::fetch_failed(e.to_string()));
            }
        };

        match body.get("tasks").and_then(Value::as_array) {
            Some(tasks) => Ok(tasks.clone()),
            None => Err(PassFailure::invalid_task_format(body)),
        }
    }

    fn window(&self, now: DateTime<Utc>) -> RiskWindow {
        RiskWindow::starting(now.with_timezone(&self.reference_tz), self.due_soon_hours)
    }
}

fn alert_text(label: RiskLabel, task: &Task, due: DateTime<Tz>) -> String {
    format!(
        "{} - Task *{}* is at risk!\nCompletion: {}%\nDue: {} (IST)",
        label.heading(),
        task.name(),
        task.percent(),
        due.format("%Y-%m-%d %I:%M %p")
    )
}
