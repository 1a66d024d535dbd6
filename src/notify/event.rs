use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Priority {
    Medium,
    High,
}

impl Priority {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Short-lived in-app popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Toast {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// Entry appended to the notification center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CenterEntry {
    pub title: String,
    pub message: String,
    pub kind: EmailTemplate,
    pub priority: Priority,
}

/// Budget email templates; also names the notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum EmailTemplate {
    BudgetExceeded,
    BudgetWarning,
}

impl EmailTemplate {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetExceeded => "budget_exceeded",
            Self::BudgetWarning => "budget_warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TemplateData {
    pub budget_name: String,
    pub amount: Decimal,
    pub spent_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
}

/// What the email transport receives. Rendering is the transport's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct EmailRequest {
    pub template: EmailTemplate,
    pub data: TemplateData,
    pub to: String,
}

/// A queued email plus the dedupe key it is recorded under once sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EmailJob {
    pub request: EmailRequest,
    pub category_id: i64,
    pub day: NaiveDate,
}

impl EmailJob {
    pub(crate) fn key(&self) -> (i64, EmailTemplate, NaiveDate) {
        (self.category_id, self.request.template, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NotificationEvent {
    Toast(Toast),
    Center(CenterEntry),
    Email(EmailJob),
}
