use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Budget;

/// Inclusive calendar-day window a budget is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Alert thresholds after settings and budget fallbacks are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Thresholds {
    pub alert: u8,
    /// Resolved for display; no alert tier keys off it yet.
    pub critical: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusLevel {
    OnTrack,
    NearLimit,
    OverBudget,
}

impl StatusLevel {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on track",
            Self::NearLimit => "near limit",
            Self::OverBudget => "over budget",
        }
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetStatus {
    pub spent_amount: Decimal,
    pub remaining_amount: Decimal,
    pub percentage_used: Decimal,
    pub is_over_budget: bool,
    pub is_near_limit: bool,
}

impl BudgetStatus {
    pub(crate) fn level(&self) -> StatusLevel {
        if self.is_over_budget {
            StatusLevel::OverBudget
        } else if self.is_near_limit {
            StatusLevel::NearLimit
        } else {
            StatusLevel::OnTrack
        }
    }
}

/// A budget together with its computed progress for the current period.
#[derive(Debug, Clone)]
pub(crate) struct BudgetWithDetails {
    pub budget: Budget,
    pub status: BudgetStatus,
    pub thresholds: Thresholds,
    pub window: PeriodWindow,
}
