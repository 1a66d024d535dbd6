use chrono::{Datelike, NaiveDate};

use crate::errors::BudgetError;
use crate::models::{BudgetPeriod, PeriodWindow};

/// Resolve the window of `period` that contains `today`.
pub(crate) fn resolve_period(
    period: &BudgetPeriod,
    today: NaiveDate,
) -> Result<PeriodWindow, BudgetError> {
    match period {
        BudgetPeriod::Monthly => {
            let (start, end) = month_bounds(today.year(), today.month());
            Ok(PeriodWindow { start, end })
        }
        BudgetPeriod::Yearly => Ok(PeriodWindow {
            start: ymd(today.year(), 1, 1),
            end: ymd(today.year(), 12, 31),
        }),
        BudgetPeriod::Unrecognized(raw) => Err(BudgetError::UnknownPeriod(raw.clone())),
    }
}

/// First and last day of a month. The last day is the day before the first
/// of the following month.
pub(crate) fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let start = ymd(year, month, 1);
    let next = if month == 12 {
        ymd(year + 1, 1, 1)
    } else {
        ymd(year, month + 1, 1)
    };
    let end = next.pred_opt().unwrap_or(next);
    (start, end)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Only called with day 1 or Dec 31, which exist in every year chrono supports.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
