use chrono::NaiveDate;
use rust_decimal::Decimal;

pub(crate) const DEFAULT_ALERT_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BudgetPeriod {
    Monthly,
    Yearly,
    /// A stored period string this version does not understand.
    Unrecognized(String),
}

impl BudgetPeriod {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Self::Monthly,
            "yearly" => Self::Yearly,
            _ => Self::Unrecognized(s.to_string()),
        }
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Budget {
    pub id: Option<i64>,
    pub name: String,
    pub amount: Decimal,
    pub category_id: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    /// Percent of `amount` at which the budget counts as near its limit.
    pub alert_threshold: u8,
    /// Carried for the record only; unspent amounts are never rolled forward.
    pub rollover: bool,
}

impl Budget {
    pub(crate) fn new(
        name: String,
        category_id: i64,
        amount: Decimal,
        period: BudgetPeriod,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            name,
            amount,
            category_id,
            period,
            start_date,
            end_date: None,
            is_active: true,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            rollover: false,
        }
    }
}
