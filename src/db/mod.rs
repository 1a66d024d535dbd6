mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;
use crate::monitor::RecordStore;
use crate::notify::sinks::{EmailTransport, NotificationCenter};
use crate::notify::{CenterEntry, EmailDedupeLog, EmailRequest, EMAIL_LOG_KEY};

const SETTINGS_KEY: &str = "settings";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let defaults = [
            "Bills & Utilities",
            "Education",
            "Entertainment",
            "Food & Dining",
            "Groceries",
            "Health",
            "Housing",
            "Shopping",
            "Transportation",
            "Travel",
        ];

        let tx = self.conn.transaction()?;
        for name in &defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                params![name],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn
            .execute("INSERT INTO categories (name) VALUES (?1)", params![cat.name])
            .with_context(|| format!("Failed to add category '{}'", cat.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Budgets ───────────────────────────────────────────────

    const BUDGET_COLUMNS: &'static str = "id, name, amount, category_id, period, start_date, \
         end_date, is_active, alert_threshold, rollover";

    fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
        let amount_str: String = row.get(2)?;
        let period: String = row.get(4)?;
        Ok(Budget {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            amount: parse_amount(2, &amount_str)?,
            category_id: row.get(3)?,
            period: BudgetPeriod::parse(&period),
            start_date: row.get(5)?,
            end_date: row.get(6)?,
            is_active: row.get(7)?,
            alert_threshold: row.get(8)?,
            rollover: row.get(9)?,
        })
    }

    pub(crate) fn insert_budget(&self, budget: &Budget) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO budgets (name, amount, category_id, period, start_date, end_date, is_active, alert_threshold, rollover)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                budget.name,
                budget.amount.to_string(),
                budget.category_id,
                budget.period.as_str(),
                budget.start_date,
                budget.end_date,
                budget.is_active,
                budget.alert_threshold,
                budget.rollover,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn update_budget(&self, budget: &Budget) -> Result<()> {
        let id = budget
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot update a budget without an id"))?;
        let changed = self.conn.execute(
            "UPDATE budgets SET name = ?1, amount = ?2, category_id = ?3, period = ?4, start_date = ?5,
                    end_date = ?6, is_active = ?7, alert_threshold = ?8, rollover = ?9
             WHERE id = ?10",
            params![
                budget.name,
                budget.amount.to_string(),
                budget.category_id,
                budget.period.as_str(),
                budget.start_date,
                budget.end_date,
                budget.is_active,
                budget.alert_threshold,
                budget.rollover,
                id,
            ],
        )?;
        if changed == 0 {
            anyhow::bail!("Budget {id} not found");
        }
        Ok(())
    }

    pub(crate) fn get_budgets(&self) -> Result<Vec<Budget>> {
        let sql = format!(
            "SELECT {} FROM budgets ORDER BY name, id",
            Self::BUDGET_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_active_budgets(&self) -> Result<Vec<Budget>> {
        let sql = format!(
            "SELECT {} FROM budgets WHERE is_active = 1 ORDER BY name, id",
            Self::BUDGET_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_budget_by_id(&self, id: i64) -> Result<Option<Budget>> {
        let sql = format!("SELECT {} FROM budgets WHERE id = ?1", Self::BUDGET_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::budget_from_row)
            .optional()?)
    }

    /// Soft delete: budgets are only ever deactivated.
    pub(crate) fn deactivate_budget(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("UPDATE budgets SET is_active = 0 WHERE id = ?1", params![id])?;
        if changed == 0 {
            anyhow::bail!("Budget {id} not found");
        }
        Ok(())
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO expenses (amount, date, category_id, currency, description)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                expense.amount.to_string(),
                expense.date,
                expense.category_id,
                expense.currency,
                expense.description,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_expenses(&self, category_id: Option<i64>) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, amount, date, category_id, currency, description
             FROM expenses
             WHERE ?1 IS NULL OR category_id = ?1
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![category_id], |row| {
            let amount_str: String = row.get(1)?;
            Ok(Expense {
                id: Some(row.get(0)?),
                amount: parse_amount(1, &amount_str)?,
                date: row.get(2)?,
                category_id: row.get(3)?,
                currency: row.get(4)?,
                description: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_expense(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Key/value store ───────────────────────────────────────

    pub(crate) fn get_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.get_value(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Stored value for '{key}' is not valid JSON")),
            None => Ok(T::default()),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_value(key, &serde_json::to_string(value)?)
    }

    pub(crate) fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.set_json(SETTINGS_KEY, settings)
    }

    // ── Notification center ───────────────────────────────────

    pub(crate) fn get_notifications(&self, limit: u32) -> Result<Vec<NotificationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, message, kind, priority, is_read, created_at
             FROM notifications ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(NotificationRecord {
                id: row.get(0)?,
                title: row.get(1)?,
                message: row.get(2)?,
                kind: row.get(3)?,
                priority: row.get(4)?,
                is_read: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn mark_notifications_read(&self) -> Result<usize> {
        Ok(self
            .conn
            .execute("UPDATE notifications SET is_read = 1 WHERE is_read = 0", [])?)
    }

    // ── Email spool ───────────────────────────────────────────

    pub(crate) fn get_spooled_emails(&self) -> Result<Vec<SpooledEmail>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, template, recipient, payload, created_at FROM email_spool ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SpooledEmail {
                id: row.get(0)?,
                template: row.get(1)?,
                recipient: row.get(2)?,
                payload: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl RecordStore for Database {
    fn load_settings(&self) -> Result<Settings> {
        self.get_json(SETTINGS_KEY)
    }

    fn load_categories(&self) -> Result<Vec<Category>> {
        self.get_categories()
    }

    fn load_active_budgets(&self) -> Result<Vec<Budget>> {
        self.get_active_budgets()
    }

    fn load_expenses(&self) -> Result<Vec<Expense>> {
        self.get_expenses(None)
    }

    fn load_email_log(&self) -> Result<EmailDedupeLog> {
        self.get_json(EMAIL_LOG_KEY)
    }

    fn save_email_log(&self, log: &EmailDedupeLog) -> Result<()> {
        self.set_json(EMAIL_LOG_KEY, log)
    }
}

impl NotificationCenter for Database {
    fn append(&self, entry: &CenterEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notifications (title, message, kind, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.title,
                entry.message,
                entry.kind.as_str(),
                entry.priority.as_str(),
                chrono::Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Spools the request for an external mailer; accepted once written.
impl EmailTransport for Database {
    fn send(&self, request: &EmailRequest) -> Result<bool> {
        let payload = serde_json::to_string(request)?;
        self.conn.execute(
            "INSERT INTO email_spool (template, recipient, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                request.template.as_str(),
                request.to,
                payload,
                chrono::Local::now().to_rfc3339(),
            ],
        )?;
        Ok(true)
    }
}

/// Amounts are stored as decimal text; anything else is a conversion error.
fn parse_amount(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
