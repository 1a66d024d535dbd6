mod budget;
mod category;
mod expense;
mod notification;
mod settings;
mod status;

pub(crate) use budget::{Budget, BudgetPeriod, DEFAULT_ALERT_THRESHOLD};
pub(crate) use category::Category;
pub(crate) use expense::Expense;
pub(crate) use notification::{NotificationRecord, SpooledEmail};
pub(crate) use settings::{parse_threshold, Settings};
pub(crate) use status::{BudgetStatus, BudgetWithDetails, PeriodWindow, StatusLevel, Thresholds};
