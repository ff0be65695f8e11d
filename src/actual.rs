use crate::domain::{Budget, CategoryIndex, CategoryKind, EngineError, Transaction, TxnKind, TxnStatus};
use crate::month::YearMonth;
use crate::window::resolve_window;
use rust_decimal::Decimal;

/// Which transaction kinds count against a budget, derived from its category.
///
/// Spending against an expense budget includes outgoing transfers; earning
/// against an income budget must not count transfers at all.
fn kind_matches(category: CategoryKind, kind: TxnKind) -> bool {
    match category {
        CategoryKind::Income => kind == TxnKind::Income,
        CategoryKind::Expense => matches!(kind, TxnKind::Expense | TxnKind::TransferOut),
    }
}

/// Sum of ledger activity against `budget` for `reference`.
///
/// Matches on category, exact currency (no implicit conversion here), the
/// category-derived kind set, and the resolved window; cancelled and
/// soft-deleted entries never count. An inapplicable budget sums to zero.
pub fn actual_amount(
    budget: &Budget,
    reference: YearMonth,
    ledger: &[Transaction],
    categories: &CategoryIndex,
) -> Result<Decimal, EngineError> {
    let category = categories
        .get(&budget.category_id)
        .ok_or(EngineError::UnknownCategory(budget.category_id))?;

    let Some(window) = resolve_window(budget, reference) else {
        return Ok(Decimal::ZERO);
    };

    let mut total = Decimal::ZERO;
    for txn in ledger {
        if txn.status == TxnStatus::Cancelled || txn.deleted_at.is_some() {
            continue;
        }
        if txn.category_id != Some(budget.category_id) {
            continue;
        }
        if !txn.currency.eq_ignore_ascii_case(&budget.currency) {
            continue;
        }
        if !kind_matches(category.kind, txn.kind) {
            continue;
        }
        if !window.contains(txn.date) {
            continue;
        }
        total += txn.amount.abs();
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BudgetPeriod, BudgetStatus, Category};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn ym(s: &str) -> YearMonth {
        s.parse().expect("month")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn index(id: Uuid, kind: CategoryKind) -> CategoryIndex {
        let mut out = BTreeMap::new();
        out.insert(
            id,
            Category {
                id,
                name: "Groceries".to_string(),
                parent_id: None,
                kind,
            },
        );
        out
    }

    fn budget(category_id: Uuid, period: BudgetPeriod) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            category_id,
            currency: "USD".to_string(),
            amount: dec!(100),
            period,
            status: BudgetStatus::Active,
            note: None,
            created_at: Utc::now(),
        }
    }

    fn txn(category_id: Uuid, amount: Decimal, kind: TxnKind, date: NaiveDate) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            category_id: Some(category_id),
            currency: "USD".to_string(),
            amount,
            kind,
            status: TxnStatus::Cleared,
            date,
            note: None,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sums_matching_expense_transactions() {
        let cat = Uuid::new_v4();
        let b = budget(cat, BudgetPeriod::OneTime { month: ym("2024-03") });
        let ledger = vec![
            txn(cat, dec!(-30), TxnKind::Expense, date(2024, 3, 15)),
            txn(cat, dec!(12.50), TxnKind::Expense, date(2024, 3, 20)),
        ];

        let actual = actual_amount(&b, ym("2024-03"), &ledger, &index(cat, CategoryKind::Expense))
            .expect("actual");
        assert_eq!(actual, dec!(42.50));
    }

    #[test]
    fn transfer_out_counts_against_expense_but_not_income() {
        let cat = Uuid::new_v4();
        let ledger = vec![txn(cat, dec!(40), TxnKind::TransferOut, date(2024, 3, 10))];

        let expense = budget(cat, BudgetPeriod::OneTime { month: ym("2024-03") });
        let actual =
            actual_amount(&expense, ym("2024-03"), &ledger, &index(cat, CategoryKind::Expense))
                .expect("actual");
        assert_eq!(actual, dec!(40));

        let income = budget(cat, BudgetPeriod::OneTime { month: ym("2024-03") });
        let actual =
            actual_amount(&income, ym("2024-03"), &ledger, &index(cat, CategoryKind::Income))
                .expect("actual");
        assert_eq!(actual, Decimal::ZERO);
    }

    #[test]
    fn income_budget_counts_only_income_transactions() {
        let cat = Uuid::new_v4();
        let ledger = vec![
            txn(cat, dec!(500), TxnKind::Income, date(2024, 3, 1)),
            txn(cat, dec!(25), TxnKind::Expense, date(2024, 3, 2)),
            txn(cat, dec!(10), TxnKind::TransferIn, date(2024, 3, 3)),
        ];

        let b = budget(cat, BudgetPeriod::OneTime { month: ym("2024-03") });
        let actual = actual_amount(&b, ym("2024-03"), &ledger, &index(cat, CategoryKind::Income))
            .expect("actual");
        assert_eq!(actual, dec!(500));
    }

    #[test]
    fn cancelled_and_deleted_transactions_are_excluded() {
        let cat = Uuid::new_v4();
        let mut cancelled = txn(cat, dec!(30), TxnKind::Expense, date(2024, 3, 15));
        cancelled.status = TxnStatus::Cancelled;
        let mut deleted = txn(cat, dec!(30), TxnKind::Expense, date(2024, 3, 16));
        deleted.deleted_at = Some(Utc::now());

        let b = budget(cat, BudgetPeriod::OneTime { month: ym("2024-03") });
        let actual = actual_amount(
            &b,
            ym("2024-03"),
            &[cancelled, deleted],
            &index(cat, CategoryKind::Expense),
        )
        .expect("actual");
        assert_eq!(actual, Decimal::ZERO);
    }

    #[test]
    fn currency_category_and_window_filters_apply() {
        let cat = Uuid::new_v4();
        let other_cat = Uuid::new_v4();
        let mut eur = txn(cat, dec!(30), TxnKind::Expense, date(2024, 3, 15));
        eur.currency = "EUR".to_string();
        let ledger = vec![
            eur,
            txn(other_cat, dec!(30), TxnKind::Expense, date(2024, 3, 15)),
            txn(cat, dec!(30), TxnKind::Expense, date(2024, 4, 1)),
        ];

        let b = budget(cat, BudgetPeriod::OneTime { month: ym("2024-03") });
        let actual = actual_amount(&b, ym("2024-03"), &ledger, &index(cat, CategoryKind::Expense))
            .expect("actual");
        assert_eq!(actual, Decimal::ZERO);
    }

    #[test]
    fn inapplicable_budget_sums_to_zero() {
        let cat = Uuid::new_v4();
        let ledger = vec![txn(cat, dec!(30), TxnKind::Expense, date(2024, 3, 15))];

        let b = budget(
            cat,
            BudgetPeriod::Recurring {
                start: ym("2024-05"),
                end: None,
            },
        );
        let actual = actual_amount(&b, ym("2024-03"), &ledger, &index(cat, CategoryKind::Expense))
            .expect("actual");
        assert_eq!(actual, Decimal::ZERO);
    }

    #[test]
    fn unknown_category_fails_fast() {
        let b = budget(Uuid::new_v4(), BudgetPeriod::OneTime { month: ym("2024-03") });
        let err = actual_amount(&b, ym("2024-03"), &[], &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownCategory(_)));
    }
}
