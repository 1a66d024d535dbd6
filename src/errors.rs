use thiserror::Error;

/// Configuration problems that make a single budget (or setting) unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum BudgetError {
    #[error("unknown budget period: '{0}'")]
    UnknownPeriod(String),
    #[error("budget '{budget}' references missing category {category_id}")]
    MissingCategory { budget: String, category_id: i64 },
    #[error("threshold must be between 0 and 100, got {0}")]
    InvalidThreshold(String),
    #[error("amounts for budget '{0}' are too large to compute")]
    AmountOverflow(String),
    #[error("unknown setting: '{0}'")]
    UnknownSetting(String),
    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidSetting { key: String, value: String },
}
