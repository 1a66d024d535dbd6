use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::errors::BudgetError;
use crate::models::{Budget, BudgetWithDetails, Category, Expense, Settings};
use crate::notify::outbox::{EmailOutbox, FlushReport};
use crate::notify::sinks::Sinks;
use crate::notify::{DedupeState, Dispatcher, EmailDedupeLog, NotificationEvent, SessionAlerts};
use crate::progress::{calculate, resolve_thresholds};

/// Where a refresh reads its inputs and keeps the email log.
pub(crate) trait RecordStore {
    fn load_settings(&self) -> Result<Settings>;
    fn load_categories(&self) -> Result<Vec<Category>>;
    fn load_active_budgets(&self) -> Result<Vec<Budget>>;
    fn load_expenses(&self) -> Result<Vec<Expense>>;
    fn load_email_log(&self) -> Result<EmailDedupeLog>;
    fn save_email_log(&self, log: &EmailDedupeLog) -> Result<()>;
}

/// Result of one refresh.
#[derive(Debug)]
pub(crate) struct Refresh {
    /// Budgets that computed successfully, in store order.
    pub budgets: Vec<BudgetWithDetails>,
    /// Budgets left out because of a configuration error.
    pub skipped: Vec<(String, BudgetError)>,
    pub emails: FlushReport,
}

/// Recomputes budget progress and raises alerts. Holds the in-app alert
/// state for as long as it lives.
#[derive(Debug, Default)]
pub(crate) struct BudgetMonitor {
    session: SessionAlerts,
}

impl BudgetMonitor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Forget in-app alerts for a budget that was edited or deleted.
    pub(crate) fn budget_changed(&mut self, budget_id: i64) {
        self.session.reset(budget_id);
    }

    pub(crate) fn refresh(
        &mut self,
        store: &dyn RecordStore,
        sinks: &Sinks<'_>,
        today: NaiveDate,
    ) -> Result<Refresh> {
        // Any load failure aborts the whole refresh.
        let settings = store.load_settings().context("Failed to load settings")?;
        let categories = store
            .load_categories()
            .context("Failed to load categories")?;
        let budgets = store
            .load_active_budgets()
            .context("Failed to load budgets")?;
        let expenses = store.load_expenses().context("Failed to load expenses")?;
        let mut email_log = store
            .load_email_log()
            .context("Failed to load email notification log")?;
        email_log.prune_before(today);

        let dispatcher = Dispatcher::new(&settings);
        let mut state = DedupeState {
            session: std::mem::take(&mut self.session),
            emails: email_log,
        };
        let mut outbox = EmailOutbox::new();
        let mut computed = Vec::with_capacity(budgets.len());
        let mut skipped = Vec::new();

        for budget in budgets.iter().filter(|b| b.is_active) {
            let details = match compute_one(budget, &categories, &expenses, &settings, today) {
                Ok(details) => details,
                Err(e) => {
                    warn!(budget = %budget.name, error = %e, "Skipping budget");
                    skipped.push((budget.name.clone(), e));
                    continue;
                }
            };

            let dispatch = dispatcher.dispatch(&details, state, today);
            state = dispatch.state;
            for event in dispatch.events {
                match event {
                    NotificationEvent::Toast(toast) => sinks.toasts.toast(&toast),
                    NotificationEvent::Center(entry) => {
                        if let Err(e) = sinks.center.append(&entry) {
                            warn!(title = %entry.title, error = %e, "Failed to record notification");
                        }
                    }
                    NotificationEvent::Email(job) => {
                        if !outbox.enqueue(job) {
                            debug!(budget = %details.budget.name, "Email already queued");
                        }
                    }
                }
            }
            computed.push(details);
        }

        self.session = state.session;
        let mut email_log = state.emails;
        let emails = outbox.flush(sinks.email, &mut email_log);
        if emails.sent > 0 {
            if let Err(e) = store.save_email_log(&email_log) {
                warn!(error = %e, "Failed to persist email notification log");
            }
        }

        info!(
            computed = computed.len(),
            skipped = skipped.len(),
            emails_sent = emails.sent,
            "Budget refresh complete"
        );
        Ok(Refresh {
            budgets: computed,
            skipped,
            emails,
        })
    }
}

/// Compute every active budget as of `day` without raising any alert or
/// touching the email log.
pub(crate) fn preview(store: &dyn RecordStore, day: NaiveDate) -> Result<Refresh> {
    let settings = store.load_settings().context("Failed to load settings")?;
    let categories = store
        .load_categories()
        .context("Failed to load categories")?;
    let budgets = store
        .load_active_budgets()
        .context("Failed to load budgets")?;
    let expenses = store.load_expenses().context("Failed to load expenses")?;

    let mut computed = Vec::with_capacity(budgets.len());
    let mut skipped = Vec::new();
    for budget in budgets.iter().filter(|b| b.is_active) {
        match compute_one(budget, &categories, &expenses, &settings, day) {
            Ok(details) => computed.push(details),
            Err(e) => {
                warn!(budget = %budget.name, error = %e, "Skipping budget");
                skipped.push((budget.name.clone(), e));
            }
        }
    }
    debug!(%day, computed = computed.len(), "Budget preview complete");
    Ok(Refresh {
        budgets: computed,
        skipped,
        emails: FlushReport::default(),
    })
}

fn compute_one(
    budget: &Budget,
    categories: &[Category],
    expenses: &[Expense],
    settings: &Settings,
    today: NaiveDate,
) -> Result<BudgetWithDetails, BudgetError> {
    if Category::find_by_id(categories, budget.category_id).is_none() {
        return Err(BudgetError::MissingCategory {
            budget: budget.name.clone(),
            category_id: budget.category_id,
        });
    }
    calculate(budget, expenses, resolve_thresholds(budget, settings), today)
}
