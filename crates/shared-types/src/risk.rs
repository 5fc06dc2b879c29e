//! Risk classification for tasks against an evaluation window.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::task::Task;

/// The evaluation window for one pass: `now` and the due-soon cutoff.
#[derive(Debug, Clone)]
pub struct RiskWindow {
    pub now: DateTime<Tz>,
    pub cutoff: DateTime<Tz>,
}

impl RiskWindow {
    pub fn starting(now: DateTime<Tz>, lookahead_hours: i64) -> Self {
        RiskWindow {
            now,
            cutoff: now + Duration::hours(lookahead_hours),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.now.timezone()
    }
}

/// Risk label for an at-risk task. Overdue wins when both conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLabel {
    Overdue,
    DueSoon,
}

impl RiskLabel {
    pub fn heading(&self) -> &'static str {
        match self {
            RiskLabel::Overdue => "⚠️ OVERDUE",
            RiskLabel::DueSoon => "🚨 DUE SOON",
        }
    }
}

/// Classify a resolved due date.
///
/// `None` means skip: no resolvable due date, task already complete, or due
/// beyond the cutoff. Both comparisons are strict, so a task due exactly at
/// `now` is due-soon (not overdue) and a task due exactly at the cutoff is
/// safe.
pub fn classify(
    due: Option<DateTime<Tz>>,
    percent: i64,
    window: &RiskWindow,
) -> Option<RiskLabel> {
    let due = due?;
    if percent == 100 {
        return None;
    }
    if due < window.now {
        return Some(RiskLabel::Overdue);
    }
    if due < window.cutoff {
        return Some(RiskLabel::DueSoon);
    }
    None
}

/// Classify a task, returning the label together with the resolved due date.
pub fn assess(task: &Task, window: &RiskWindow) -> Option<(RiskLabel, DateTime<Tz>)> {
    let due = task.due_date(window.timezone())?;
    let label = classify(Some(due), task.percent(), window)?;
    Some((label, due))
}
