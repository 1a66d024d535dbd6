use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::BudgetError;
use crate::models::{
    Budget, BudgetStatus, BudgetWithDetails, Expense, Settings, Thresholds,
    DEFAULT_ALERT_THRESHOLD,
};
use crate::period::resolve_period;

pub(crate) const DEFAULT_CRITICAL_THRESHOLD: u8 = 95;

/// Settings override the budget's own alert threshold; critical comes only
/// from settings. A budget threshold of 0 counts as unset.
pub(crate) fn resolve_thresholds(budget: &Budget, settings: &Settings) -> Thresholds {
    let budget_alert = Some(budget.alert_threshold).filter(|t| *t > 0);
    let alert = settings
        .budget_alerts
        .alert_threshold
        .or(budget_alert)
        .unwrap_or(DEFAULT_ALERT_THRESHOLD);
    let critical = settings
        .budget_alerts
        .critical_threshold
        .unwrap_or(DEFAULT_CRITICAL_THRESHOLD);
    Thresholds { alert, critical }
}

/// Compute a budget's progress for the period containing `today`.
///
/// Only expenses in the budget's category, inside the period window and not
/// dated after `today` count. Amounts are summed as given; converting
/// mixed currencies is the caller's job.
pub(crate) fn calculate(
    budget: &Budget,
    expenses: &[Expense],
    thresholds: Thresholds,
    today: NaiveDate,
) -> Result<BudgetWithDetails, BudgetError> {
    let window = resolve_period(&budget.period, today)?;

    let overflow = || BudgetError::AmountOverflow(budget.name.clone());
    let spent_amount = expenses
        .iter()
        .filter(|e| e.category_id == Some(budget.category_id))
        .filter(|e| window.contains(e.date) && e.date <= today)
        .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
        .ok_or_else(overflow)?;
    let status =
        derive_status(budget.amount, spent_amount, thresholds.alert).ok_or_else(overflow)?;

    Ok(BudgetWithDetails {
        budget: budget.clone(),
        status,
        thresholds,
        window,
    })
}

/// `None` when the figures do not fit in a `Decimal`.
pub(crate) fn derive_status(
    amount: Decimal,
    spent_amount: Decimal,
    alert: u8,
) -> Option<BudgetStatus> {
    let percentage_used = if amount > Decimal::ZERO {
        spent_amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .checked_div(amount)?
    } else {
        Decimal::ZERO
    };
    let is_over_budget = spent_amount > amount;
    let is_near_limit = !is_over_budget && percentage_used >= Decimal::from(alert);

    Some(BudgetStatus {
        spent_amount,
        remaining_amount: amount.checked_sub(spent_amount)?,
        percentage_used,
        is_over_budget,
        is_near_limit,
    })
}

#[cfg(test)]
mod tests;
