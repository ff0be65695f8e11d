use crate::domain::{Budget, BudgetPeriod};
use crate::month::YearMonth;
use chrono::NaiveDate;

/// Inclusive date range a budget is matched against for one reference month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Resolve the date range `budget` applies to in `reference`.
///
/// `None` means "this budget does not apply to this month": a one-time budget
/// outside its single month, a recurring budget before its start, or one past
/// its (inclusive) end. Callers must skip aggregation on `None` rather than
/// summing against an undefined window.
pub fn resolve_window(budget: &Budget, reference: YearMonth) -> Option<MonthWindow> {
    match budget.period {
        BudgetPeriod::OneTime { month } => {
            if month != reference {
                return None;
            }
            Some(MonthWindow {
                start: month.first_day(),
                end: month.last_day(),
            })
        }
        BudgetPeriod::Recurring { start, end } => {
            if reference < start {
                return None;
            }
            if let Some(end) = end {
                if reference > end {
                    return None;
                }
            }
            Some(MonthWindow {
                start: reference.first_day(),
                end: reference.last_day(),
            })
        }
    }
}
