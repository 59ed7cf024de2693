//! Activity kinds and their presentation table
//!
//! Backend codes are parsed exactly into a closed enum, and every variant
//! maps to one icon, color and label through an exhaustive `match`. Adding a
//! variant without a style is a compile error.

use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sub-types of reminder entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Payment,
    CreditCardDue,
    LoanInstallment,
    Check,
    Tax,
    Other,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 6] = [
        ReminderKind::Payment,
        ReminderKind::CreditCardDue,
        ReminderKind::LoanInstallment,
        ReminderKind::Check,
        ReminderKind::Tax,
        ReminderKind::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ReminderKind::Payment => "payment",
            ReminderKind::CreditCardDue => "credit_card_due",
            ReminderKind::LoanInstallment => "loan_installment",
            ReminderKind::Check => "check",
            ReminderKind::Tax => "tax",
            ReminderKind::Other => "other",
        }
    }
}

/// Kind of an activity-feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActivityKind {
    Income,
    Expense,
    CreditCard,
    BankBalance,
    Reminder(ReminderKind),
}

/// How a kind is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindStyle {
    pub icon: &'static str,
    /// Hex color
    pub color: &'static str,
    pub label: &'static str,
}

impl ActivityKind {
    pub fn style(&self) -> KindStyle {
        match self {
            ActivityKind::Income => KindStyle { icon: "arrow-down-circle", color: "#52c41a", label: "Gelir" },
            ActivityKind::Expense => KindStyle { icon: "arrow-up-circle", color: "#f5222d", label: "Gider" },
            ActivityKind::CreditCard => KindStyle { icon: "credit-card", color: "#722ed1", label: "Kredi Kartı" },
            ActivityKind::BankBalance => KindStyle { icon: "bank", color: "#1890ff", label: "Banka Bakiyesi" },
            ActivityKind::Reminder(kind) => match kind {
                ReminderKind::Payment => KindStyle { icon: "bell", color: "#fa8c16", label: "Ödeme Hatırlatma" },
                ReminderKind::CreditCardDue => KindStyle { icon: "credit-card", color: "#eb2f96", label: "Kart Son Ödeme" },
                ReminderKind::LoanInstallment => KindStyle { icon: "calendar", color: "#13c2c2", label: "Kredi Taksiti" },
                ReminderKind::Check => KindStyle { icon: "file-text", color: "#faad14", label: "Çek" },
                ReminderKind::Tax => KindStyle { icon: "audit", color: "#a0d911", label: "Vergi" },
                ReminderKind::Other => KindStyle { icon: "info-circle", color: "#8c8c8c", label: "Hatırlatma" },
            },
        }
    }

    /// Income-like kinds add to the balance
    pub fn is_inflow(&self) -> bool {
        matches!(self, ActivityKind::Income)
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        let kind = match code.as_str() {
            "income" => ActivityKind::Income,
            "expense" => ActivityKind::Expense,
            "credit_card" => ActivityKind::CreditCard,
            "bank_balance" => ActivityKind::BankBalance,
            "reminder" => ActivityKind::Reminder(ReminderKind::Other),
            other => {
                let sub = other
                    .strip_prefix("reminder:")
                    .ok_or_else(|| CoreError::InvalidKind { code: s.to_string() })?;
                let reminder = ReminderKind::ALL
                    .into_iter()
                    .find(|k| k.code() == sub)
                    .ok_or_else(|| CoreError::InvalidKind { code: s.to_string() })?;
                ActivityKind::Reminder(reminder)
            }
        };
        Ok(kind)
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Income => write!(f, "income"),
            ActivityKind::Expense => write!(f, "expense"),
            ActivityKind::CreditCard => write!(f, "credit_card"),
            ActivityKind::BankBalance => write!(f, "bank_balance"),
            ActivityKind::Reminder(kind) => write!(f, "reminder:{}", kind.code()),
        }
    }
}

impl TryFrom<String> for ActivityKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> Self {
        kind.to_string()
    }
}

/// One line of an activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub title: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_display() {
        let mut kinds = vec![
            ActivityKind::Income,
            ActivityKind::Expense,
            ActivityKind::CreditCard,
            ActivityKind::BankBalance,
        ];
        kinds.extend(ReminderKind::ALL.into_iter().map(ActivityKind::Reminder));

        for kind in kinds {
            assert_eq!(kind.to_string().parse::<ActivityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_codes_match_exactly_not_by_substring() {
        assert!("expenses_total".parse::<ActivityKind>().is_err());
        assert!("my income".parse::<ActivityKind>().is_err());
        assert!("reminder:loan".parse::<ActivityKind>().is_err());
        assert_eq!(" Income ".parse::<ActivityKind>().unwrap(), ActivityKind::Income);
    }

    #[test]
    fn test_bare_reminder_is_other() {
        assert_eq!(
            "reminder".parse::<ActivityKind>().unwrap(),
            ActivityKind::Reminder(ReminderKind::Other)
        );
    }

    #[test]
    fn test_style_table() {
        let style = ActivityKind::Reminder(ReminderKind::CreditCardDue).style();
        assert_eq!(style.icon, "credit-card");
        assert!(style.color.starts_with('#'));
        assert_eq!(ActivityKind::Income.style().label, "Gelir");
        assert!(ActivityKind::Income.is_inflow());
        assert!(!ActivityKind::Expense.is_inflow());
    }

    #[test]
    fn test_activity_item_deserializes_kind_code() {
        let item: ActivityItem = serde_json::from_str(
            r#"{"kind": "reminder:tax", "title": "KDV beyannamesi", "date": "2025-07-26"}"#,
        )
        .unwrap();
        assert_eq!(item.kind, ActivityKind::Reminder(ReminderKind::Tax));
        assert_eq!(item.amount, None);

        let bad = serde_json::from_str::<ActivityItem>(
            r#"{"kind": "gift", "title": "x", "date": "2025-07-26"}"#,
        );
        assert!(bad.is_err());
    }
}
