//! Turns computed budget progress into notifications.
//!
//! The dispatcher is pure: it takes the prior dedupe state by value and hands
//! back the events to emit together with the updated state. Delivering the
//! events and persisting the email log is up to the caller.

mod event;
pub(crate) mod outbox;
pub(crate) mod sinks;
mod state;

use chrono::NaiveDate;
use tracing::debug;

pub(crate) use event::{
    CenterEntry, EmailJob, EmailRequest, EmailTemplate, NotificationEvent, Priority, Severity,
    TemplateData, Toast,
};
pub(crate) use state::{AlertState, DedupeState, EmailDedupeLog, SessionAlerts, EMAIL_LOG_KEY};

use crate::models::{BudgetWithDetails, Settings, StatusLevel};
use crate::util::{format_amount, format_percent};

#[derive(Debug)]
pub(crate) struct Dispatch {
    pub events: Vec<NotificationEvent>,
    pub state: DedupeState,
}

pub(crate) struct Dispatcher<'a> {
    settings: &'a Settings,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Decide which notifications a freshly computed budget warrants.
    ///
    /// In-app alerts fire once per transition into near-limit or over-budget
    /// within a period. Returning to on-track re-arms both; dropping from
    /// over-budget to near-limit re-arms only the over-budget alert. Emails
    /// are gated separately by the per-category daily log, so an email that
    /// failed to send is offered again on the next run.
    pub(crate) fn dispatch(
        &self,
        details: &BudgetWithDetails,
        mut state: DedupeState,
        today: NaiveDate,
    ) -> Dispatch {
        let mut events = Vec::new();
        if !self.settings.alerts_enabled() {
            return Dispatch { events, state };
        }
        let Some(budget_id) = details.budget.id else {
            debug!(budget = %details.budget.name, "Budget has no id, skipping alerts");
            return Dispatch { events, state };
        };

        let period_start = details.window.start;
        let prior = state.session.state_for(budget_id, period_start);
        let level = details.status.level();

        let next = match (level, prior) {
            (StatusLevel::OverBudget, AlertState::OverBudgetNotified) => prior,
            (StatusLevel::OverBudget, _) => {
                self.in_app(details, EmailTemplate::BudgetExceeded, &mut events);
                AlertState::OverBudgetNotified
            }
            (StatusLevel::NearLimit, AlertState::Clear) => {
                self.in_app(details, EmailTemplate::BudgetWarning, &mut events);
                AlertState::NearLimitNotified
            }
            (StatusLevel::NearLimit, _) => AlertState::NearLimitNotified,
            (StatusLevel::OnTrack, _) => AlertState::Clear,
        };
        state.session.record(budget_id, period_start, next);

        let template = match level {
            StatusLevel::OverBudget => Some(EmailTemplate::BudgetExceeded),
            StatusLevel::NearLimit => Some(EmailTemplate::BudgetWarning),
            StatusLevel::OnTrack => None,
        };
        if let (Some(template), Some(to)) = (template, self.settings.email_recipient()) {
            let category_id = details.budget.category_id;
            if !state.emails.was_sent(category_id, template, today) {
                events.push(NotificationEvent::Email(EmailJob {
                    request: email_request(details, template, to),
                    category_id,
                    day: today,
                }));
            }
        }

        Dispatch { events, state }
    }

    fn in_app(
        &self,
        details: &BudgetWithDetails,
        template: EmailTemplate,
        events: &mut Vec<NotificationEvent>,
    ) {
        let (title, message) = describe(details, template);
        let (severity, priority) = match template {
            EmailTemplate::BudgetExceeded => (Severity::Error, Priority::High),
            EmailTemplate::BudgetWarning => (Severity::Warning, Priority::Medium),
        };
        debug!(budget = %details.budget.name, kind = template.as_str(), "Budget alert triggered");

        if self.settings.notifications.push_notifications {
            events.push(NotificationEvent::Toast(Toast {
                title: title.clone(),
                message: message.clone(),
                severity,
            }));
        }
        events.push(NotificationEvent::Center(CenterEntry {
            title,
            message,
            kind: template,
            priority,
        }));
    }
}

fn describe(details: &BudgetWithDetails, template: EmailTemplate) -> (String, String) {
    let name = &details.budget.name;
    let status = &details.status;
    match template {
        EmailTemplate::BudgetExceeded => (
            format!("Budget exceeded: {name}"),
            format!(
                "You have spent {} of your {} budget, {} over.",
                format_amount(status.spent_amount),
                format_amount(details.budget.amount),
                format_amount(-status.remaining_amount),
            ),
        ),
        EmailTemplate::BudgetWarning => (
            format!("Budget warning: {name}"),
            format!(
                "You have used {} of your {} budget ({} left).",
                format_percent(status.percentage_used),
                format_amount(details.budget.amount),
                format_amount(status.remaining_amount),
            ),
        ),
    }
}

fn email_request(details: &BudgetWithDetails, template: EmailTemplate, to: &str) -> EmailRequest {
    let percentage = match template {
        EmailTemplate::BudgetWarning => Some(details.status.percentage_used.round_dp(1)),
        EmailTemplate::BudgetExceeded => None,
    };
    EmailRequest {
        template,
        data: TemplateData {
            budget_name: details.budget.name.clone(),
            amount: details.budget.amount,
            spent_amount: details.status.spent_amount,
            percentage,
        },
        to: to.to_string(),
    }
}
