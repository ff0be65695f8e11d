use crate::domain::{Budget, BudgetPeriod, EngineError};
use crate::month::YearMonth;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A user's edit to a recurring budget. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetEdit {
    pub amount: Option<Decimal>,
    pub note: Option<String>,
    pub end: Option<YearMonth>,
}

/// How an edit to a recurring budget lands in the store.
///
/// Each variant carries fully resolved records, so applying a plan is pure
/// persistence with no remaining decisions.
#[derive(Debug, Clone)]
pub enum EditPlan {
    /// The viewed month is the budget's start month: edit the record in place.
    UpdateInPlace { updated: Budget },
    /// The viewed month precedes the start month: pull the start back to the
    /// viewed month and apply the edit; no new record.
    ShiftStart { updated: Budget },
    /// The viewed month is after the start month: truncate the existing record
    /// to the month before the viewed month, keeping its original amount, note
    /// and status, and create a successor carrying the edit from the viewed
    /// month forward. Past months stay auditable; only the future changes.
    Split { truncated: Budget, successor: Budget },
}

/// Decide what an edit made while viewing `viewed` does to a recurring budget.
///
/// The returned plan's two-record variant must be persisted as one unit: if the
/// truncate write fails the successor must not be created.
pub fn plan_recurring_edit(
    budget: &Budget,
    viewed: YearMonth,
    edit: &BudgetEdit,
    now: DateTime<Utc>,
) -> Result<EditPlan, EngineError> {
    let BudgetPeriod::Recurring { start, end } = budget.period else {
        return Err(EngineError::NotRecurring(budget.id));
    };

    // Whichever plan comes out, the record carrying the edit starts at the
    // viewed month, so an edited end before it can never resolve a window.
    if let Some(new_end) = edit.end {
        if new_end < viewed {
            return Err(EngineError::EndBeforeStart {
                start: viewed,
                end: new_end,
            });
        }
    }

    if viewed == start {
        let mut updated = budget.clone();
        apply_edit(&mut updated, edit);
        updated.period = BudgetPeriod::Recurring {
            start,
            end: edit.end.or(end),
        };
        return Ok(EditPlan::UpdateInPlace { updated });
    }

    if viewed < start {
        let mut updated = budget.clone();
        apply_edit(&mut updated, edit);
        updated.period = BudgetPeriod::Recurring {
            start: viewed,
            end: edit.end.or(end),
        };
        return Ok(EditPlan::ShiftStart { updated });
    }

    // viewed > start: split into a historical record and a successor.
    let mut truncated = budget.clone();
    truncated.period = BudgetPeriod::Recurring {
        start,
        end: Some(viewed.prev()),
    };

    // The original end still applies to the successor when it reaches past the
    // viewed month; otherwise the edit supplies the new end (if any).
    let successor_end = match end {
        Some(original_end) if original_end >= viewed => Some(original_end),
        _ => edit.end,
    };

    let successor = Budget {
        id: Uuid::new_v4(),
        category_id: budget.category_id,
        currency: budget.currency.clone(),
        amount: edit.amount.unwrap_or(budget.amount),
        period: BudgetPeriod::Recurring {
            start: viewed,
            end: successor_end,
        },
        status: budget.status,
        note: edit.note.clone().or_else(|| budget.note.clone()),
        created_at: now,
    };

    Ok(EditPlan::Split {
        truncated,
        successor,
    })
}

fn apply_edit(budget: &mut Budget, edit: &BudgetEdit) {
    if let Some(amount) = edit.amount {
        budget.amount = amount;
    }
    if let Some(note) = &edit.note {
        budget.note = Some(note.clone());
    }
}
