use serde::{Deserialize, Serialize};

use crate::errors::BudgetError;

/// User settings that drive budget alerting. Stored as one JSON document;
/// fields missing from the stored document take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub notifications: NotificationSettings,
    pub budget_alerts: BudgetAlertSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct NotificationSettings {
    pub enabled: bool,
    pub budget_alerts: bool,
    pub push_notifications: bool,
    pub email_notifications: bool,
    pub email_address: Option<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            budget_alerts: true,
            push_notifications: true,
            email_notifications: false,
            email_address: None,
        }
    }
}

/// Threshold overrides. `None` defers to the budget's own threshold (alert)
/// or to the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct BudgetAlertSettings {
    pub alert_threshold: Option<u8>,
    pub critical_threshold: Option<u8>,
}

impl Settings {
    /// Whether budget alerts may fire at all.
    pub(crate) fn alerts_enabled(&self) -> bool {
        self.notifications.enabled && self.notifications.budget_alerts
    }

    /// Recipient for budget emails, only when email alerts are switched on.
    pub(crate) fn email_recipient(&self) -> Option<&str> {
        if !self.notifications.email_notifications {
            return None;
        }
        self.notifications
            .email_address
            .as_deref()
            .filter(|addr| !addr.trim().is_empty())
    }

    /// Update a single setting from its dotted key, e.g.
    /// `notifications.email_notifications`.
    pub(crate) fn set(&mut self, key: &str, value: &str) -> Result<(), BudgetError> {
        let invalid = || BudgetError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "notifications.enabled" => {
                self.notifications.enabled = parse_bool(value).ok_or_else(invalid)?
            }
            "notifications.budget_alerts" => {
                self.notifications.budget_alerts = parse_bool(value).ok_or_else(invalid)?
            }
            "notifications.push_notifications" => {
                self.notifications.push_notifications = parse_bool(value).ok_or_else(invalid)?
            }
            "notifications.email_notifications" => {
                self.notifications.email_notifications = parse_bool(value).ok_or_else(invalid)?
            }
            "notifications.email_address" => {
                self.notifications.email_address = parse_optional(value).map(str::to_string)
            }
            "budget_alerts.alert_threshold" => {
                self.budget_alerts.alert_threshold = parse_optional(value)
                    .map(parse_threshold)
                    .transpose()?
            }
            "budget_alerts.critical_threshold" => {
                self.budget_alerts.critical_threshold = parse_optional(value)
                    .map(parse_threshold)
                    .transpose()?
            }
            _ => return Err(BudgetError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }
}

/// Parse a percent threshold in `0..=100`.
pub(crate) fn parse_threshold(value: &str) -> Result<u8, BudgetError> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|t| *t <= 100)
        .ok_or_else(|| BudgetError::InvalidThreshold(value.to_string()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// `none` or an empty string clears an optional setting.
fn parse_optional(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed)
    }
}
