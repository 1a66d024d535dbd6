use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::event::EmailTemplate;

/// Key under which the email log lives in the key/value store.
pub(crate) const EMAIL_LOG_KEY: &str = "budget_email_notifications";

/// In-app alert progress of one budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum AlertState {
    #[default]
    Clear,
    NearLimitNotified,
    OverBudgetNotified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SessionEntry {
    state: AlertState,
    /// Start of the period the state was recorded in.
    period_start: NaiveDate,
}

/// Per-budget in-app alert state, kept for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionAlerts {
    entries: HashMap<i64, SessionEntry>,
}

impl SessionAlerts {
    /// State of `budget_id` within the period starting at `period_start`.
    /// An entry from an earlier period reads as `Clear`.
    pub(crate) fn state_for(&self, budget_id: i64, period_start: NaiveDate) -> AlertState {
        self.entries
            .get(&budget_id)
            .filter(|e| e.period_start == period_start)
            .map(|e| e.state)
            .unwrap_or_default()
    }

    pub(crate) fn record(&mut self, budget_id: i64, period_start: NaiveDate, state: AlertState) {
        if state == AlertState::Clear {
            self.entries.remove(&budget_id);
        } else {
            self.entries.insert(
                budget_id,
                SessionEntry {
                    state,
                    period_start,
                },
            );
        }
    }

    /// Forget a budget's alerts, e.g. after it was edited or deleted.
    pub(crate) fn reset(&mut self, budget_id: i64) {
        self.entries.remove(&budget_id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Emails already sent for one category on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DailyEmailRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub over_budget_email_sent: bool,
    #[serde(default)]
    pub warning_email_sent: bool,
}

impl DailyEmailRecord {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            over_budget_email_sent: false,
            warning_email_sent: false,
        }
    }

    fn flag(&self, template: EmailTemplate) -> bool {
        match template {
            EmailTemplate::BudgetExceeded => self.over_budget_email_sent,
            EmailTemplate::BudgetWarning => self.warning_email_sent,
        }
    }
}

/// Per-category, per-day record of budget emails. Persisted as one JSON
/// object keyed by category id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct EmailDedupeLog {
    records: BTreeMap<i64, DailyEmailRecord>,
}

impl EmailDedupeLog {
    /// Whether `template` counts as sent for `category_id` on `day`. A record
    /// from a later day suppresses every email for earlier days.
    pub(crate) fn was_sent(&self, category_id: i64, template: EmailTemplate, day: NaiveDate) -> bool {
        self.records
            .get(&category_id)
            .is_some_and(|r| r.date > day || (r.date == day && r.flag(template)))
    }

    /// Record a send. A record from a later day is never replaced.
    pub(crate) fn mark_sent(&mut self, category_id: i64, template: EmailTemplate, day: NaiveDate) {
        let record = self
            .records
            .entry(category_id)
            .or_insert_with(|| DailyEmailRecord::new(day));
        if record.date > day {
            return;
        }
        if record.date < day {
            *record = DailyEmailRecord::new(day);
        }
        match template {
            EmailTemplate::BudgetExceeded => record.over_budget_email_sent = true,
            EmailTemplate::BudgetWarning => record.warning_email_sent = true,
        }
    }

    /// Drop records from days before `day`.
    pub(crate) fn prune_before(&mut self, day: NaiveDate) {
        self.records.retain(|_, r| r.date >= day);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Both dedupe layers, threaded through the dispatcher by value.
#[derive(Debug, Clone, Default)]
pub(crate) struct DedupeState {
    pub session: SessionAlerts,
    pub emails: EmailDedupeLog,
}
