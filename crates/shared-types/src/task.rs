//! Lenient task model for the Zoho Projects task-list API.
//!
//! The upstream API is loose about shapes: the due date lives under one of
//! several keys, percent-complete may arrive as a number or a numeric string,
//! and owners may be a list, a single object, or a bare identifier. Each of
//! those shapes is modeled as an untagged serde enum and normalized here so
//! the rest of the crate only ever sees uniform values.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

use crate::dates;

const UNNAMED_TASK: &str = "Unnamed Task";

/// A single task as returned by the task-list endpoint.
///
/// Unknown fields are ignored; every known field tolerates absence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Task {
    name: Option<String>,
    percent_complete: Option<Numeric>,
    end_date_format: Option<String>,
    end_date_time: Option<String>,
    due_date_time: Option<String>,
    end_date_long: Option<Numeric>,
    end_date: Option<String>,
    details: Option<DetailsField>,
    owners: Option<OwnerField>,
    owner: Option<OwnerField>,
    assigned_to: Option<OwnerField>,
}

/// A JSON value that should be a number but sometimes arrives as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Int(n) => Some(*n),
            Numeric::Float(f) => Some(*f as i64),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// `details` is expected to be an object; anything else is treated as empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DetailsField {
    Object(TaskDetails),
    Other(Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TaskDetails {
    owners: Vec<Owner>,
}

/// An owner field value: a list of entries or a single entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OwnerField {
    Many(Vec<Owner>),
    One(Owner),
}

impl OwnerField {
    fn entries(&self) -> &[Owner] {
        match self {
            OwnerField::Many(list) => list,
            OwnerField::One(one) => std::slice::from_ref(one),
        }
    }
}

/// One owner entry, either a proper record or a bare identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Owner {
    Record(OwnerRecord),
    Bare(Value),
}

impl Owner {
    /// Email for this entry, trying the known aliases in priority order.
    /// Bare identifiers carry no email and resolve to `None`.
    pub fn email_address(&self) -> Option<&str> {
        match self {
            Owner::Record(record) => record.email_address(),
            Owner::Bare(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OwnerRecord {
    email: Option<String>,
    email_id: Option<String>,
    user_email: Option<String>,
    created_by_email: Option<String>,
}

impl OwnerRecord {
    pub fn email_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.email_id.as_deref())
            .or(self.user_email.as_deref())
            .or(self.created_by_email.as_deref())
            .filter(|s| !s.is_empty())
    }
}

impl Task {
    pub fn name(&self) -> &str {
        self.name.as_deref().filter(|s| !s.is_empty()).unwrap_or(UNNAMED_TASK)
    }

    /// Completion percentage, 0 when absent or unparseable.
    pub fn percent(&self) -> i64 {
        self.percent_complete
            .as_ref()
            .and_then(Numeric::as_i64)
            .unwrap_or(0)
    }

    /// Resolve the due date in the reference timezone.
    ///
    /// Tries, in order: a free-form date/time string (several key aliases), an
    /// epoch-milliseconds field, a plain date string. Naive timestamps are
    /// assumed to be in the reference timezone. Whichever representation is
    /// present wins: a present-but-unparseable field yields `None` without
    /// falling through to the next one. Failures are logged, never raised.
    pub fn due_date(&self, tz: Tz) -> Option<DateTime<Tz>> {
        let freeform = self
            .end_date_format
            .as_deref()
            .or(self.end_date_time.as_deref())
            .or(self.due_date_time.as_deref())
            .filter(|s| !s.trim().is_empty());

        if let Some(raw) = freeform {
            let parsed = dates::parse_flexible(raw, tz);
            if parsed.is_none() {
                tracing::warn!("Could not parse due date {:?} for task {:?}", raw, self.name());
            }
            return parsed;
        }

        if let Some(raw) = &self.end_date_long {
            let parsed = raw.as_i64().and_then(|ms| dates::from_epoch_millis(ms, tz));
            if parsed.is_none() {
                tracing::warn!("Could not parse end_date_long for task {:?}", self.name());
            }
            return parsed;
        }

        if let Some(raw) = self.end_date.as_deref().filter(|s| !s.trim().is_empty()) {
            let parsed = dates::parse_flexible(raw, tz);
            if parsed.is_none() {
                tracing::warn!("Could not parse due date {:?} for task {:?}", raw, self.name());
            }
            return parsed;
        }

        None
    }

    /// Owner emails to alert for this task.
    ///
    /// A non-empty `details.owners` list takes priority; otherwise the first
    /// non-empty of the top-level `owners` / `owner` / `assigned_to` fields is
    /// normalized into a list. Entries without a resolvable email are dropped.
    pub fn alert_owner_emails(&self) -> Vec<String> {
        let entries = self.owner_entries();
        entries
            .iter()
            .filter_map(|o| o.email_address())
            .map(str::to_string)
            .collect()
    }

    /// Owner emails eligible for the daily digest.
    ///
    /// The digest audience is collected only from `details.owners`, and only
    /// from entries carrying a literal `email` field. Top-level owner fields
    /// never feed the digest. This mirrors the monitor/digest split the
    /// product currently relies on.
    pub fn digest_owner_emails(&self) -> Vec<String> {
        self.details_owners()
            .iter()
            .filter_map(|o| match o {
                Owner::Record(r) => r.email.as_deref().filter(|s| !s.is_empty()),
                Owner::Bare(_) => None,
            })
            .map(str::to_string)
            .collect()
    }

    fn details_owners(&self) -> &[Owner] {
        match &self.details {
            Some(DetailsField::Object(details)) => &details.owners,
            _ => &[],
        }
    }

    fn owner_entries(&self) -> &[Owner] {
        let from_details = self.details_owners();
        if !from_details.is_empty() {
            return from_details;
        }
        [&self.owners, &self.owner, &self.assigned_to]
            .into_iter()
            .flatten()
            .map(OwnerField::entries)
            .find(|entries| !entries.is_empty())
            .unwrap_or(&[])
    }
}
