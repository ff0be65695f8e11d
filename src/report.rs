use crate::actual::actual_amount;
use crate::convert::convert;
use crate::domain::{
    Budget, BudgetStatus, CategoryIndex, CategoryKind, EngineError, ExchangeRate, Transaction,
};
use crate::month::YearMonth;
use crate::window::resolve_window;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Running totals in the base currency (unconverted values fall back as-is).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub budget: Decimal,
    pub actual: Decimal,
    pub remaining: Decimal,
}

/// One budget's numbers for the month, in the budget's own currency.
#[derive(Debug, Clone)]
pub struct BudgetLine {
    pub budget_id: Uuid,
    pub category: String,
    pub currency: String,
    pub amount: Decimal,
    pub actual: Decimal,
    pub remaining: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct GroupSummary {
    pub one_time: Vec<BudgetLine>,
    pub recurring: Vec<BudgetLine>,
    pub totals: Totals,
}

impl GroupSummary {
    pub fn is_empty(&self) -> bool {
        self.one_time.is_empty() && self.recurring.is_empty()
    }
}

/// Month roll-up: income and expense budgets partitioned by category kind,
/// one-time and recurring grouped separately for display, totals summed across
/// both groups in the base currency.
///
/// Sign convention: `remaining = amount - actual` in both partitions. For an
/// expense budget that is the headroom left (negative once overspent); for an
/// income budget it is the amount still needed to reach the goal (negative once
/// exceeded). Nothing is clamped here.
#[derive(Debug, Clone)]
pub struct MonthSummary {
    pub month: YearMonth,
    pub base_currency: String,
    pub income: GroupSummary,
    pub expense: GroupSummary,
}

/// Build the month summary for every applicable, non-archived budget.
///
/// A budget whose window does not resolve for `reference` is skipped entirely.
/// A value that cannot be converted to `base_currency` is accumulated
/// unconverted; a missing rate degrades precision, never availability.
pub fn summarize(
    budgets: &[Budget],
    reference: YearMonth,
    ledger: &[Transaction],
    rates: &[ExchangeRate],
    categories: &CategoryIndex,
    base_currency: &str,
) -> Result<MonthSummary, EngineError> {
    let mut income = GroupSummary::default();
    let mut expense = GroupSummary::default();

    for budget in budgets {
        if budget.status == BudgetStatus::Archived {
            continue;
        }
        if resolve_window(budget, reference).is_none() {
            continue;
        }

        let category = categories
            .get(&budget.category_id)
            .ok_or(EngineError::UnknownCategory(budget.category_id))?;

        let actual = actual_amount(budget, reference, ledger, categories)?;
        let remaining = budget.amount - actual;

        let line = BudgetLine {
            budget_id: budget.id,
            category: category.name.clone(),
            currency: budget.currency.clone(),
            amount: budget.amount,
            actual,
            remaining,
        };

        let group = match category.kind {
            CategoryKind::Income => &mut income,
            CategoryKind::Expense => &mut expense,
        };

        group.totals.budget += to_base(budget.amount, &budget.currency, base_currency, rates);
        group.totals.actual += to_base(actual, &budget.currency, base_currency, rates);
        group.totals.remaining += to_base(remaining, &budget.currency, base_currency, rates);

        if budget.period.is_recurring() {
            group.recurring.push(line);
        } else {
            group.one_time.push(line);
        }
    }

    Ok(MonthSummary {
        month: reference,
        base_currency: base_currency.to_string(),
        income,
        expense,
    })
}

fn to_base(amount: Decimal, currency: &str, base_currency: &str, rates: &[ExchangeRate]) -> Decimal {
    convert(amount, currency, base_currency, rates).unwrap_or(amount)
}
