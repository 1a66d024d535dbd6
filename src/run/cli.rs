use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::db::Database;
use crate::models::{parse_threshold, Budget, BudgetPeriod, Category, Expense, StatusLevel};
use crate::monitor::{preview, BudgetMonitor, Refresh, RecordStore};
use crate::notify::sinks::{ConsoleNotifier, Sinks};
use crate::util::{format_amount, format_percent, progress_bar, truncate};

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    match args[1].as_str() {
        "status" | "s" => cli_status(&args[2..], db),
        "watch" => cli_watch(&args[2..], db),
        "budget" => cli_budget(&args[2..], db),
        "budgets" => cli_budgets(db),
        "category" => cli_category(&args[2..], db),
        "categories" => cli_categories(db),
        "expense" => cli_expense(&args[2..], db),
        "expenses" => cli_expenses(&args[2..], db),
        "notifications" => cli_notifications(&args[2..], db),
        "emails" => cli_emails(db),
        "settings" => cli_settings(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetwatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("budgetwatch — budget progress and alerts");
    println!();
    println!("Usage: budgetwatch <command>");
    println!();
    println!("Commands:");
    println!("  status [YYYY-MM-DD]                      Recompute budgets and raise alerts");
    println!("  watch                                    Recompute repeatedly in one session");
    println!("    --interval <secs>                      Seconds between refreshes (default: 60)");
    println!("    --count <n>                            Stop after n refreshes");
    println!("  budget add <name> <category> <amount>    Create a budget");
    println!("    --period <monthly|yearly>              Budget period (default: monthly)");
    println!("    --threshold <percent>                  Near-limit alert threshold (default: 80)");
    println!("    --start <YYYY-MM-DD>                   Start date (default: today)");
    println!("  budget edit <id>                         Change --name, --amount, --period, --threshold");
    println!("  budget delete <id>                       Deactivate a budget");
    println!("  budgets                                  List budgets");
    println!("  category add <name>                      Create a category");
    println!("  categories                               List categories");
    println!("  expense add <category> <amount>          Record an expense");
    println!("    --date <YYYY-MM-DD>                    Expense date (default: today)");
    println!("    --currency <code>                      Currency code (default: USD)");
    println!("    --desc <text>                          Description");
    println!("  expense delete <id>                      Remove an expense");
    println!("  expenses [--category <name>]             List expenses");
    println!("  notifications [--mark-read]              Show the notification center");
    println!("  emails                                   Show spooled budget emails");
    println!("  settings                                 Print settings");
    println!("  settings set <key> <value>               Change a setting");
    println!("  --help, -h                               Show this help");
    println!("  --version, -V                            Show version");
}

// ── Argument helpers ──────────────────────────────────────────

const VALUE_FLAGS: &[&str] = &[
    "--interval",
    "--count",
    "--period",
    "--threshold",
    "--start",
    "--name",
    "--amount",
    "--date",
    "--currency",
    "--desc",
    "--category",
];

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

/// Largest amount accepted on the command line.
const MAX_AMOUNT: i64 = 1_000_000_000_000;

fn parse_amount(s: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(s.trim_start_matches('$').replace(',', "").as_str())
        .with_context(|| format!("Invalid amount: {s}"))?;
    if amount <= Decimal::ZERO {
        anyhow::bail!("Amount must be positive: {s}");
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        anyhow::bail!("Amount too large: {s}");
    }
    Ok(amount)
}

fn parse_period(s: &str) -> Result<BudgetPeriod> {
    match BudgetPeriod::parse(s) {
        BudgetPeriod::Unrecognized(raw) => anyhow::bail!("Unknown period '{raw}' (monthly or yearly)"),
        period => Ok(period),
    }
}

fn parse_id(s: &str) -> Result<i64> {
    s.parse::<i64>().with_context(|| format!("Invalid id: {s}"))
}

fn find_category(db: &Database, name: &str) -> Result<i64> {
    let categories = db.get_categories()?;
    Category::find_by_name(&categories, name)
        .and_then(|c| c.id)
        .ok_or_else(|| anyhow::anyhow!("Category '{name}' not found"))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ── Status ────────────────────────────────────────────────────

fn cli_status(args: &[String], db: &mut Database) -> Result<()> {
    let day = match positional(args).first() {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let refresh = if day == today() {
        let mut monitor = BudgetMonitor::new();
        run_refresh(&mut monitor, db, day)?
    } else {
        tracing::info!(%day, "Status for another day, alerts not sent");
        preview(db, day)?
    };
    print_refresh(&refresh, db, day)
}

fn cli_watch(args: &[String], db: &mut Database) -> Result<()> {
    let interval: u64 = flag(args, "--interval")
        .map(|s| s.parse::<u64>().with_context(|| format!("Invalid interval: {s}")))
        .transpose()?
        .unwrap_or(60);
    let count: Option<u64> = flag(args, "--count")
        .map(|s| s.parse::<u64>().with_context(|| format!("Invalid count: {s}")))
        .transpose()?;

    let mut monitor = BudgetMonitor::new();
    let mut known: HashMap<i64, Budget> = HashMap::new();
    let mut round = 0u64;
    loop {
        // Edits made from another process re-arm that budget's alerts
        let budgets = db.get_budgets()?;
        for budget in &budgets {
            if let Some(id) = budget.id {
                if known.get(&id).is_some_and(|prev| prev != budget) {
                    tracing::info!(budget = %budget.name, "Budget changed, re-arming alerts");
                    monitor.budget_changed(id);
                }
            }
        }
        known = budgets
            .into_iter()
            .filter_map(|b| b.id.map(|id| (id, b)))
            .collect();

        let day = today();
        match run_refresh(&mut monitor, db, day) {
            Ok(refresh) => print_refresh(&refresh, db, day)?,
            // The store may be briefly unavailable; try again next round
            Err(e) => tracing::error!("Refresh failed: {e:#}"),
        }

        round += 1;
        if count.is_some_and(|n| round >= n) {
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(interval));
        println!();
    }
}

fn run_refresh(monitor: &mut BudgetMonitor, db: &Database, day: NaiveDate) -> Result<Refresh> {
    let console = ConsoleNotifier;
    let sinks = Sinks {
        toasts: &console,
        center: db,
        email: db,
    };
    monitor.refresh(db, &sinks, day)
}

fn print_refresh(refresh: &Refresh, db: &Database, day: NaiveDate) -> Result<()> {
    let categories = db.load_categories()?;
    println!("Budgets as of {day}");
    println!("{}", "─".repeat(86));
    if refresh.budgets.is_empty() {
        println!("  No active budgets");
    }
    for details in &refresh.budgets {
        let budget = &details.budget;
        let status = &details.status;
        let cat_name = Category::find_by_id(&categories, budget.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("Unknown");
        let critical = status.percentage_used >= Decimal::from(details.thresholds.critical);
        let marker = match status.level() {
            StatusLevel::OnTrack => " ",
            StatusLevel::NearLimit if critical => "‼",
            StatusLevel::NearLimit => "!",
            StatusLevel::OverBudget => "✗",
        };
        println!(
            "{marker} {:<18} {:<14} {:>12} / {:<12} {} {:>7}  {}",
            truncate(&budget.name, 18),
            truncate(cat_name, 14),
            format_amount(status.spent_amount),
            format_amount(budget.amount),
            progress_bar(status.percentage_used, 10),
            format_percent(status.percentage_used),
            status.level(),
        );
    }
    for (name, err) in &refresh.skipped {
        println!("  {name}: skipped ({err})");
    }
    if refresh.emails.sent + refresh.emails.failed > 0 {
        println!();
        println!(
            "Emails: {} sent, {} failed",
            refresh.emails.sent, refresh.emails.failed
        );
    }
    Ok(())
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budget(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    match pos.first().copied() {
        Some("add") => {
            let &[_, name, category, amount] = pos.as_slice() else {
                anyhow::bail!("Usage: budgetwatch budget add <name> <category> <amount> [--period monthly|yearly] [--threshold N]");
            };
            let category_id = find_category(db, category)?;
            let period = flag(args, "--period")
                .map(parse_period)
                .transpose()?
                .unwrap_or(BudgetPeriod::Monthly);
            let start = flag(args, "--start")
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(today);
            let mut budget = Budget::new(name.into(), category_id, parse_amount(amount)?, period, start);
            if let Some(t) = flag(args, "--threshold") {
                budget.alert_threshold = parse_threshold(t)?;
            }
            let id = db.insert_budget(&budget)?;
            println!("Budget {id} created: {name} {} {}", format_amount(budget.amount), budget.period);
            Ok(())
        }
        Some("edit") => {
            let Some(id) = pos.get(1) else {
                anyhow::bail!("Usage: budgetwatch budget edit <id> [--name N] [--amount X] [--period P] [--threshold N]");
            };
            let id = parse_id(id)?;
            let mut budget = db
                .get_budget_by_id(id)?
                .ok_or_else(|| anyhow::anyhow!("Budget {id} not found"))?;
            if let Some(name) = flag(args, "--name") {
                budget.name = name.to_string();
            }
            if let Some(amount) = flag(args, "--amount") {
                budget.amount = parse_amount(amount)?;
            }
            if let Some(period) = flag(args, "--period") {
                budget.period = parse_period(period)?;
            }
            if let Some(t) = flag(args, "--threshold") {
                budget.alert_threshold = parse_threshold(t)?;
            }
            db.update_budget(&budget)?;
            println!("Budget {id} updated");
            Ok(())
        }
        Some("delete") => {
            let Some(id) = pos.get(1) else {
                anyhow::bail!("Usage: budgetwatch budget delete <id>");
            };
            let id = parse_id(id)?;
            db.deactivate_budget(id)?;
            println!("Budget {id} deactivated");
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetwatch budget <add|edit|delete> ..."),
    }
}

fn cli_budgets(db: &mut Database) -> Result<()> {
    let budgets = db.get_budgets()?;
    if budgets.is_empty() {
        println!("No budgets");
        return Ok(());
    }
    let categories = db.get_categories()?;
    println!(
        "{:<4} {:<20} {:<16} {:>12} {:<8} {:>5} Active",
        "ID", "Name", "Category", "Amount", "Period", "Alert"
    );
    println!("{}", "─".repeat(78));
    for b in &budgets {
        let cat_name = Category::find_by_id(&categories, b.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("Unknown");
        println!(
            "{:<4} {:<20} {:<16} {:>12} {:<8} {:>4}% {}",
            b.id.unwrap_or(0),
            truncate(&b.name, 20),
            truncate(cat_name, 16),
            format_amount(b.amount),
            b.period,
            b.alert_threshold,
            if b.is_active { "yes" } else { "no" },
        );
    }
    Ok(())
}

// ── Categories ────────────────────────────────────────────────

fn cli_category(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    match pos.as_slice() {
        ["add", rest @ ..] if !rest.is_empty() => {
            let name = rest.join(" ");
            let id = db.insert_category(&Category::new(name.clone()))?;
            println!("Category {id} created: {name}");
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetwatch category add <name>"),
    }
}

fn cli_categories(db: &mut Database) -> Result<()> {
    for cat in db.get_categories()? {
        println!("{:<4} {cat}", cat.id.unwrap_or(0));
    }
    Ok(())
}

// ── Expenses ──────────────────────────────────────────────────

fn cli_expense(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    match pos.first().copied() {
        Some("add") => {
            let &[_, category, amount] = pos.as_slice() else {
                anyhow::bail!("Usage: budgetwatch expense add <category> <amount> [--date YYYY-MM-DD] [--currency CUR] [--desc TEXT]");
            };
            let category_id = find_category(db, category)?;
            let date = flag(args, "--date")
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(today);
            let mut expense = Expense::new(parse_amount(amount)?, date, Some(category_id));
            if let Some(cur) = flag(args, "--currency") {
                expense.currency = cur.to_uppercase();
            }
            if let Some(desc) = flag(args, "--desc") {
                expense.description = desc.to_string();
            }
            let id = db.insert_expense(&expense)?;
            println!("Expense {id} recorded: {} on {date}", format_amount(expense.amount));
            Ok(())
        }
        Some("delete") => {
            let Some(id) = pos.get(1) else {
                anyhow::bail!("Usage: budgetwatch expense delete <id>");
            };
            let id = parse_id(id)?;
            db.delete_expense(id)?;
            println!("Expense {id} deleted");
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetwatch expense <add|delete> ..."),
    }
}

fn cli_expenses(args: &[String], db: &mut Database) -> Result<()> {
    let category_id = match flag(args, "--category") {
        Some(name) => Some(find_category(db, name)?),
        None => None,
    };
    let expenses = db.get_expenses(category_id)?;
    if expenses.is_empty() {
        println!("No expenses");
        return Ok(());
    }
    let categories = db.get_categories()?;
    println!(
        "{:<5} {:<10} {:<16} {:>12} {:<4} Description",
        "ID", "Date", "Category", "Amount", "Cur"
    );
    println!("{}", "─".repeat(70));
    for e in &expenses {
        let cat_name = e
            .category_id
            .and_then(|id| Category::find_by_id(&categories, id))
            .map(|c| c.name.as_str())
            .unwrap_or("—");
        println!(
            "{:<5} {:<10} {:<16} {:>12} {:<4} {}",
            e.id.unwrap_or(0),
            e.date,
            truncate(cat_name, 16),
            format_amount(e.amount),
            e.currency,
            truncate(&e.description, 30),
        );
    }
    Ok(())
}

// ── Notifications & settings ──────────────────────────────────

fn cli_notifications(args: &[String], db: &mut Database) -> Result<()> {
    let notifications = db.get_notifications(50)?;
    if notifications.is_empty() {
        println!("No notifications");
    }
    for n in &notifications {
        let unread = if n.is_read { " " } else { "•" };
        println!(
            "{unread} #{:<4} {} [{}/{}] {}",
            n.id, n.created_at, n.kind, n.priority, n.title
        );
        println!("         {}", n.message);
    }
    if args.iter().any(|a| a == "--mark-read") {
        let count = db.mark_notifications_read()?;
        println!("Marked {count} notification(s) read");
    }
    Ok(())
}

fn cli_emails(db: &mut Database) -> Result<()> {
    let emails = db.get_spooled_emails()?;
    if emails.is_empty() {
        println!("No spooled emails");
    }
    for e in &emails {
        println!("#{:<4} {} {} → {}", e.id, e.created_at, e.template, e.recipient);
        println!("       {}", e.payload);
    }
    Ok(())
}

fn cli_settings(args: &[String], db: &mut Database) -> Result<()> {
    let mut settings = db.load_settings()?;
    match positional(args).as_slice() {
        [] => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        ["set", key, value @ ..] => {
            settings.set(key, &value.join(" "))?;
            db.save_settings(&settings)?;
            println!("{key} updated");
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetwatch settings [set <key> <value>]"),
    }
}
