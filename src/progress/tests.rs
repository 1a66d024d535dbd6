#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::models::BudgetPeriod;

const FOOD: i64 = 1;
const TRAVEL: i64 = 2;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 3, 20)
}

fn food_budget(amount: Decimal) -> Budget {
    let mut budget = Budget::new(
        "Groceries".into(),
        FOOD,
        amount,
        BudgetPeriod::Monthly,
        date(2024, 1, 1),
    );
    budget.id = Some(10);
    budget
}

fn expense(amount: Decimal, day: NaiveDate, category: i64) -> Expense {
    Expense::new(amount, day, Some(category))
}

fn default_thresholds() -> Thresholds {
    Thresholds {
        alert: 80,
        critical: 95,
    }
}

fn run(budget: &Budget, expenses: &[Expense]) -> BudgetStatus {
    calculate(budget, expenses, default_thresholds(), today())
        .unwrap()
        .status
}

// ── Scenarios ─────────────────────────────────────────────────

#[test]
fn test_under_threshold() {
    let budget = food_budget(dec!(1000));
    let status = run(&budget, &[expense(dec!(750), date(2024, 3, 15), FOOD)]);
    assert_eq!(status.spent_amount, dec!(750));
    assert_eq!(status.remaining_amount, dec!(250));
    assert_eq!(status.percentage_used, dec!(75));
    assert!(!status.is_over_budget);
    assert!(!status.is_near_limit);
}

#[test]
fn test_near_limit() {
    let budget = food_budget(dec!(1000));
    let status = run(
        &budget,
        &[
            expense(dec!(500), date(2024, 3, 2), FOOD),
            expense(dec!(350), date(2024, 3, 15), FOOD),
        ],
    );
    assert_eq!(status.percentage_used, dec!(85));
    assert!(status.is_near_limit);
    assert!(!status.is_over_budget);
}

#[test]
fn test_over_budget_suppresses_near_limit() {
    let budget = food_budget(dec!(1000));
    let status = run(&budget, &[expense(dec!(1200), date(2024, 3, 15), FOOD)]);
    assert!(status.is_over_budget);
    assert!(!status.is_near_limit);
    assert_eq!(status.remaining_amount, dec!(-200));
    assert_eq!(status.percentage_used, dec!(120));
}

#[test]
fn test_exactly_at_amount_is_near_not_over() {
    let budget = food_budget(dec!(1000));
    let status = run(&budget, &[expense(dec!(1000), date(2024, 3, 15), FOOD)]);
    assert!(!status.is_over_budget);
    assert!(status.is_near_limit);
    assert_eq!(status.remaining_amount, Decimal::ZERO);
}

#[test]
fn test_exactly_at_threshold_is_near() {
    let budget = food_budget(dec!(1000));
    let status = run(&budget, &[expense(dec!(800), date(2024, 3, 15), FOOD)]);
    assert!(status.is_near_limit);
}

// ── Filtering ─────────────────────────────────────────────────

#[test]
fn test_other_categories_ignored() {
    let budget = food_budget(dec!(1000));
    let mut uncategorized = expense(dec!(40), date(2024, 3, 10), FOOD);
    uncategorized.category_id = None;
    let status = run(
        &budget,
        &[
            expense(dec!(100), date(2024, 3, 10), FOOD),
            expense(dec!(900), date(2024, 3, 10), TRAVEL),
            uncategorized,
        ],
    );
    assert_eq!(status.spent_amount, dec!(100));
}

#[test]
fn test_period_boundaries() {
    let budget = food_budget(dec!(1000));
    let now = date(2024, 3, 31);
    let details = calculate(
        &budget,
        &[
            expense(dec!(1), date(2024, 2, 29), FOOD),
            expense(dec!(10), date(2024, 3, 1), FOOD),
            expense(dec!(100), date(2024, 3, 31), FOOD),
            expense(dec!(1000), date(2024, 4, 1), FOOD),
        ],
        default_thresholds(),
        now,
    )
    .unwrap();
    // First and last day of the month count; neighbours do not
    assert_eq!(details.status.spent_amount, dec!(110));
    assert_eq!(details.window.start, date(2024, 3, 1));
    assert_eq!(details.window.end, date(2024, 3, 31));
}

#[test]
fn test_future_dated_expenses_excluded() {
    let budget = food_budget(dec!(1000));
    let status = run(
        &budget,
        &[
            expense(dec!(100), today(), FOOD),
            expense(dec!(500), date(2024, 3, 21), FOOD),
        ],
    );
    assert_eq!(status.spent_amount, dec!(100));
}

#[test]
fn test_yearly_budget_sums_whole_year() {
    let mut budget = food_budget(dec!(5000));
    budget.period = BudgetPeriod::Yearly;
    let status = run(
        &budget,
        &[
            expense(dec!(1000), date(2024, 1, 1), FOOD),
            expense(dec!(2000), date(2024, 3, 1), FOOD),
            expense(dec!(700), date(2023, 12, 31), FOOD),
        ],
    );
    assert_eq!(status.spent_amount, dec!(3000));
    assert_eq!(status.percentage_used, dec!(60));
}

#[test]
fn test_decimal_amounts_sum_exactly() {
    let budget = food_budget(dec!(100));
    let status = run(
        &budget,
        &[
            expense(dec!(0.10), date(2024, 3, 1), FOOD),
            expense(dec!(0.20), date(2024, 3, 2), FOOD),
        ],
    );
    assert_eq!(status.spent_amount, dec!(0.30));
}

// ── Edge cases ────────────────────────────────────────────────

#[test]
fn test_empty_expenses() {
    let budget = food_budget(dec!(1000));
    let status = run(&budget, &[]);
    assert_eq!(status.spent_amount, Decimal::ZERO);
    assert_eq!(status.remaining_amount, dec!(1000));
    assert_eq!(status.percentage_used, Decimal::ZERO);
    assert!(!status.is_over_budget);
    assert!(!status.is_near_limit);
}

#[test]
fn test_zero_threshold_is_near_with_no_spending() {
    let budget = food_budget(dec!(1000));
    let details = calculate(
        &budget,
        &[],
        Thresholds {
            alert: 0,
            critical: 95,
        },
        today(),
    )
    .unwrap();
    assert!(details.status.is_near_limit);
}

#[test]
fn test_zero_amount_budget() {
    let budget = food_budget(Decimal::ZERO);
    let status = run(&budget, &[]);
    assert_eq!(status.percentage_used, Decimal::ZERO);
    assert!(!status.is_over_budget);

    let status = run(&budget, &[expense(dec!(5), date(2024, 3, 3), FOOD)]);
    assert_eq!(status.percentage_used, Decimal::ZERO);
    assert!(status.is_over_budget);
    assert!(!status.is_near_limit);
}

#[test]
fn test_negative_amount_budget_has_zero_percentage() {
    let status = derive_status(dec!(-10), dec!(5), 80).unwrap();
    assert_eq!(status.percentage_used, Decimal::ZERO);
    assert!(status.is_over_budget);
}

#[test]
fn test_unknown_period_fails() {
    let mut budget = food_budget(dec!(1000));
    budget.period = BudgetPeriod::Unrecognized("fortnightly".into());
    let err = calculate(&budget, &[], default_thresholds(), today()).unwrap_err();
    assert_eq!(err, BudgetError::UnknownPeriod("fortnightly".into()));
}

#[test]
fn test_percentage_overflow_is_an_error() {
    let huge = Decimal::from_str_exact("1000000000000000000000000000").unwrap();
    let budget = food_budget(huge);
    let expenses = [expense(huge, date(2024, 3, 10), FOOD)];
    let err = calculate(&budget, &expenses, default_thresholds(), today()).unwrap_err();
    assert_eq!(err, BudgetError::AmountOverflow("Groceries".into()));
}

#[test]
fn test_sum_overflow_is_an_error() {
    let budget = food_budget(dec!(1000));
    let expenses = [
        expense(Decimal::MAX, date(2024, 3, 1), FOOD),
        expense(Decimal::MAX, date(2024, 3, 2), FOOD),
    ];
    let err = calculate(&budget, &expenses, default_thresholds(), today()).unwrap_err();
    assert_eq!(err, BudgetError::AmountOverflow("Groceries".into()));
}

// ── Properties ────────────────────────────────────────────────

#[test]
fn test_calculation_is_idempotent() {
    let budget = food_budget(dec!(1000));
    let expenses = vec![
        expense(dec!(420.42), date(2024, 3, 5), FOOD),
        expense(dec!(99.99), date(2024, 3, 19), FOOD),
    ];
    let a = calculate(&budget, &expenses, default_thresholds(), today()).unwrap();
    let b = calculate(&budget, &expenses, default_thresholds(), today()).unwrap();
    assert_eq!(a.status, b.status);
    assert_eq!(a.window, b.window);
}

#[test]
fn test_over_and_near_never_both_set() {
    for spent in 0..=30 {
        let spent = Decimal::from(spent * 50);
        for alert in [0u8, 50, 80, 100] {
            for amount in [dec!(-100), Decimal::ZERO, dec!(1000)] {
                let status = derive_status(amount, spent, alert).unwrap();
                assert!(
                    !(status.is_over_budget && status.is_near_limit),
                    "amount={amount} spent={spent} alert={alert}"
                );
            }
        }
    }
}

// ── Thresholds ────────────────────────────────────────────────

#[test]
fn test_thresholds_default() {
    let mut budget = food_budget(dec!(1000));
    budget.alert_threshold = 0;
    let t = resolve_thresholds(&budget, &Settings::default());
    assert_eq!(t.alert, DEFAULT_ALERT_THRESHOLD);
    assert_eq!(t.critical, DEFAULT_CRITICAL_THRESHOLD);
}

#[test]
fn test_thresholds_budget_field() {
    let mut budget = food_budget(dec!(1000));
    budget.alert_threshold = 60;
    let t = resolve_thresholds(&budget, &Settings::default());
    assert_eq!(t.alert, 60);
}

#[test]
fn test_thresholds_settings_override() {
    let mut budget = food_budget(dec!(1000));
    budget.alert_threshold = 60;
    let mut settings = Settings::default();
    settings.budget_alerts.alert_threshold = Some(90);
    settings.budget_alerts.critical_threshold = Some(99);
    let t = resolve_thresholds(&budget, &settings);
    assert_eq!(t.alert, 90);
    assert_eq!(t.critical, 99);
}
