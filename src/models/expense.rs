use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub(crate) struct Expense {
    pub id: Option<i64>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub currency: String,
    pub description: String,
}

impl Expense {
    pub(crate) fn new(amount: Decimal, date: NaiveDate, category_id: Option<i64>) -> Self {
        Self {
            id: None,
            amount,
            date,
            category_id,
            currency: "USD".to_string(),
            description: String::new(),
        }
    }
}
