use crate::month::YearMonth;
use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            _ => Err(anyhow!(
                "Invalid category kind '{raw}'. Expected income or expense"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub kind: CategoryKind,
}

/// Read-only category lookup, built once per command from the store.
pub type CategoryIndex = BTreeMap<Uuid, Category>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnKind {
    Income,
    Expense,
    TransferOut,
    TransferIn,
}

impl TxnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxnKind::Income => "income",
            TxnKind::Expense => "expense",
            TxnKind::TransferOut => "transfer-out",
            TxnKind::TransferIn => "transfer-in",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "income" => Ok(TxnKind::Income),
            "expense" => Ok(TxnKind::Expense),
            "transfer-out" => Ok(TxnKind::TransferOut),
            "transfer-in" => Ok(TxnKind::TransferIn),
            _ => Err(anyhow!(
                "Invalid transaction kind '{raw}'. Expected income, expense, transfer-out or transfer-in"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    Pending,
    Cleared,
    Cancelled,
}

impl TxnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxnStatus::Pending => "pending",
            TxnStatus::Cleared => "cleared",
            TxnStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Ok(TxnStatus::Pending),
            "cleared" => Ok(TxnStatus::Cleared),
            "cancelled" => Ok(TxnStatus::Cancelled),
            _ => Err(anyhow!(
                "Invalid transaction status '{raw}'. Expected pending, cleared or cancelled"
            )),
        }
    }
}

/// A ledger entry. The budget engine only ever reads these.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub currency: String,
    pub amount: Decimal,
    pub kind: TxnKind,
    pub status: TxnStatus,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Active,
    Archived,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetStatus::Active => "active",
            BudgetStatus::Archived => "archived",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "active" => Ok(BudgetStatus::Active),
            "archived" => Ok(BudgetStatus::Archived),
            _ => Err(anyhow!(
                "Invalid budget status '{raw}'. Expected active or archived"
            )),
        }
    }
}

/// A budget applies either to exactly one month, or to a run of months that may
/// be open-ended. `end` is inclusive and must be >= `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetPeriod {
    OneTime { month: YearMonth },
    Recurring { start: YearMonth, end: Option<YearMonth> },
}

impl BudgetPeriod {
    pub fn is_recurring(&self) -> bool {
        matches!(self, BudgetPeriod::Recurring { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Budget {
    pub id: Uuid,
    pub category_id: Uuid,
    pub currency: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub status: BudgetStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 1 unit of `from` = `rate` units of `to`, observed on `date`.
///
/// The table is sparse and directional: a pair and its inverse are not
/// guaranteed to both be present, and a pair may carry many historical entries.
#[derive(Debug, Clone)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    pub rate: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown category {0} referenced by budget")]
    UnknownCategory(Uuid),
    #[error("budget {0} is not recurring")]
    NotRecurring(Uuid),
    #[error("end month {end} precedes start month {start}")]
    EndBeforeStart { start: YearMonth, end: YearMonth },
}
