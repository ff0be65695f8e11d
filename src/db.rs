use crate::config::AppPaths;
use crate::domain::{
    Budget, BudgetPeriod, BudgetStatus, Category, CategoryIndex, CategoryKind, ExchangeRate,
    Transaction, TxnKind, TxnStatus,
};
use crate::month::YearMonth;
use crate::split::EditPlan;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(paths: &AppPaths) -> Result<(Self, PathBuf)> {
        fs::create_dir_all(&paths.data_dir)
            .with_context(|| format!("Failed to create data dir {}", paths.data_dir.display()))?;

        let db_path = paths.data_dir.join("centavo.sqlite3");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open DB {}", db_path.display()))?;

        let db = Self { conn };
        db.migrate()?;
        Ok((db, db_path))
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id TEXT,
                kind TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name ON categories(name);

            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                category_id TEXT,
                currency TEXT NOT NULL,
                amount TEXT NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL,
                date TEXT NOT NULL,
                note TEXT,
                deleted_at TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);

            CREATE TABLE IF NOT EXISTS budgets (
                id TEXT PRIMARY KEY,
                category_id TEXT NOT NULL,
                currency TEXT NOT NULL,
                amount TEXT NOT NULL,
                recurring INTEGER NOT NULL,
                month TEXT,
                start_month TEXT,
                end_month TEXT,
                status TEXT NOT NULL,
                note TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_budgets_month ON budgets(month);
            CREATE INDEX IF NOT EXISTS idx_budgets_category ON budgets(category_id);

            CREATE TABLE IF NOT EXISTS rates (
                from_currency TEXT NOT NULL,
                to_currency TEXT NOT NULL,
                date TEXT NOT NULL,
                rate TEXT NOT NULL,
                PRIMARY KEY (from_currency, to_currency, date)
            );
            "#,
        )?;
        Ok(())
    }

    pub fn insert_category(&self, category: &Category) -> Result<()> {
        self.conn.execute(
            "INSERT INTO categories (id, name, parent_id, kind) VALUES (?1, ?2, ?3, ?4)",
            params![
                category.id.to_string(),
                category.name,
                category.parent_id.map(|id| id.to_string()),
                category.kind.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn category_index(&self) -> Result<CategoryIndex> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id, kind FROM categories")?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let parent_id: Option<String> = row.get(2)?;
            let kind: String = row.get(3)?;
            Ok((id, name, parent_id, kind))
        })?;

        let mut out = CategoryIndex::new();
        for row in rows {
            let (id, name, parent_id, kind) = row?;
            let id = Uuid::parse_str(&id).context("Invalid category UUID in DB")?;
            let parent_id = parent_id
                .map(|p| Uuid::parse_str(&p))
                .transpose()
                .context("Invalid parent UUID in DB")?;
            let kind = CategoryKind::parse(&kind).context("Invalid category kind in DB")?;
            out.insert(
                id,
                Category {
                    id,
                    name,
                    parent_id,
                    kind,
                },
            );
        }
        Ok(out)
    }

    pub fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let index = self.category_index()?;
        Ok(index.into_values().find(|c| c.name == name))
    }

    pub fn insert_transaction(&self, txn: &Transaction) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO transactions (id, category_id, currency, amount, kind, status, date, note, deleted_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                txn.id.to_string(),
                txn.category_id.map(|id| id.to_string()),
                txn.currency,
                txn.amount.to_string(),
                txn.kind.as_str(),
                txn.status.as_str(),
                txn.date.to_string(),
                txn.note,
                txn.deleted_at.map(|t| t.to_rfc3339()),
                txn.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, category_id, currency, amount, kind, status, date, note, deleted_at, created_at
            FROM transactions
            ORDER BY date ASC, created_at ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let category_id: Option<String> = row.get(1)?;
            let currency: String = row.get(2)?;
            let amount: String = row.get(3)?;
            let kind: String = row.get(4)?;
            let status: String = row.get(5)?;
            let date: String = row.get(6)?;
            let note: Option<String> = row.get(7)?;
            let deleted_at: Option<String> = row.get(8)?;
            let created_at: String = row.get(9)?;
            Ok((
                id, category_id, currency, amount, kind, status, date, note, deleted_at, created_at,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, category_id, currency, amount, kind, status, date, note, deleted_at, created_at) =
                row?;
            out.push(Transaction {
                id: Uuid::parse_str(&id).context("Invalid transaction UUID in DB")?,
                category_id: category_id
                    .map(|c| Uuid::parse_str(&c))
                    .transpose()
                    .context("Invalid category UUID in DB")?,
                currency,
                amount: parse_stored_decimal(&amount)?,
                kind: TxnKind::parse(&kind).context("Invalid transaction kind in DB")?,
                status: TxnStatus::parse(&status).context("Invalid transaction status in DB")?,
                date: parse_stored_date(&date)?,
                note,
                deleted_at: deleted_at.map(|t| parse_stored_timestamp(&t)).transpose()?,
                created_at: parse_stored_timestamp(&created_at)?,
            });
        }
        Ok(out)
    }

    pub fn set_transaction_status(&self, id: Uuid, status: TxnStatus) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE transactions SET status = ?2 WHERE id = ?1",
            params![id.to_string(), status.as_str()],
        )?;
        Ok(changed)
    }

    pub fn soft_delete_transaction(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE transactions SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), deleted_at.to_rfc3339()],
        )?;
        Ok(changed)
    }

    pub fn set_rate(&self, from: &str, to: &str, date: NaiveDate, rate: Decimal) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO rates (from_currency, to_currency, date, rate)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(from_currency, to_currency, date) DO UPDATE SET rate = excluded.rate
            "#,
            params![from, to, date.to_string(), rate.to_string()],
        )?;
        Ok(())
    }

    /// Full rate table in insert order within a date, so the converter's
    /// last-entry-wins tie-break follows storage order.
    pub fn list_rates(&self) -> Result<Vec<ExchangeRate>> {
        let mut stmt = self.conn.prepare(
            "SELECT from_currency, to_currency, date, rate FROM rates ORDER BY date ASC, rowid ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let from: String = row.get(0)?;
            let to: String = row.get(1)?;
            let date: String = row.get(2)?;
            let rate: String = row.get(3)?;
            Ok((from, to, date, rate))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (from, to, date, rate) = row?;
            out.push(ExchangeRate {
                from,
                to,
                date: parse_stored_date(&date)?,
                rate: parse_stored_decimal(&rate)?,
            });
        }
        Ok(out)
    }

    pub fn insert_budget(&self, budget: &Budget) -> Result<()> {
        insert_budget_row(&self.conn, budget)
    }

    pub fn update_budget(&self, budget: &Budget) -> Result<usize> {
        update_budget_row(&self.conn, budget)
    }

    pub fn get_budget(&self, id: Uuid) -> Result<Option<Budget>> {
        let budgets = self.list_budgets()?;
        Ok(budgets.into_iter().find(|b| b.id == id))
    }

    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, category_id, currency, amount, recurring, month, start_month, end_month, status, note, created_at
            FROM budgets
            ORDER BY created_at ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let category_id: String = row.get(1)?;
            let currency: String = row.get(2)?;
            let amount: String = row.get(3)?;
            let recurring: bool = row.get(4)?;
            let month: Option<String> = row.get(5)?;
            let start_month: Option<String> = row.get(6)?;
            let end_month: Option<String> = row.get(7)?;
            let status: String = row.get(8)?;
            let note: Option<String> = row.get(9)?;
            let created_at: String = row.get(10)?;
            Ok((
                id,
                category_id,
                currency,
                amount,
                recurring,
                month,
                start_month,
                end_month,
                status,
                note,
                created_at,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (
                id,
                category_id,
                currency,
                amount,
                recurring,
                month,
                start_month,
                end_month,
                status,
                note,
                created_at,
            ) = row?;

            let period = if recurring {
                let start =
                    start_month.ok_or_else(|| anyhow!("Recurring budget {id} has no start month"))?;
                BudgetPeriod::Recurring {
                    start: start.parse().context("Invalid start month in DB")?,
                    end: end_month
                        .map(|m| m.parse::<YearMonth>())
                        .transpose()
                        .context("Invalid end month in DB")?,
                }
            } else {
                let month = month.ok_or_else(|| anyhow!("One-time budget {id} has no month"))?;
                BudgetPeriod::OneTime {
                    month: month.parse().context("Invalid month in DB")?,
                }
            };

            out.push(Budget {
                id: Uuid::parse_str(&id).context("Invalid budget UUID in DB")?,
                category_id: Uuid::parse_str(&category_id)
                    .context("Invalid category UUID in DB")?,
                currency,
                amount: parse_stored_decimal(&amount)?,
                period,
                status: BudgetStatus::parse(&status).context("Invalid budget status in DB")?,
                note,
                created_at: parse_stored_timestamp(&created_at)?,
            });
        }
        Ok(out)
    }

    pub fn set_budget_status(&self, id: Uuid, status: BudgetStatus) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE budgets SET status = ?2 WHERE id = ?1",
            params![id.to_string(), status.as_str()],
        )?;
        Ok(changed)
    }

    /// Apply an edit plan. The split variant's two writes happen in one sqlite
    /// transaction: the truncate and the successor insert land together or not
    /// at all, so no state exists where an unmodified old record and the new
    /// record coexist.
    pub fn apply_edit_plan(&mut self, plan: &EditPlan) -> Result<()> {
        match plan {
            EditPlan::UpdateInPlace { updated } | EditPlan::ShiftStart { updated } => {
                let changed = update_budget_row(&self.conn, updated)?;
                if changed == 0 {
                    return Err(anyhow!("No such budget: {}", updated.id));
                }
                Ok(())
            }
            EditPlan::Split {
                truncated,
                successor,
            } => {
                let tx = self.conn.transaction()?;
                let changed = update_budget_row(&tx, truncated)?;
                if changed == 0 {
                    return Err(anyhow!("No such budget: {}", truncated.id));
                }
                insert_budget_row(&tx, successor)?;
                tx.commit().context("Failed to commit budget split")?;
                Ok(())
            }
        }
    }
}

fn budget_period_columns(
    period: &BudgetPeriod,
) -> (bool, Option<String>, Option<String>, Option<String>) {
    match period {
        BudgetPeriod::OneTime { month } => (false, Some(month.to_string()), None, None),
        BudgetPeriod::Recurring { start, end } => (
            true,
            None,
            Some(start.to_string()),
            end.map(|m| m.to_string()),
        ),
    }
}

fn insert_budget_row(conn: &Connection, budget: &Budget) -> Result<()> {
    let (recurring, month, start_month, end_month) = budget_period_columns(&budget.period);
    conn.execute(
        r#"
        INSERT INTO budgets (id, category_id, currency, amount, recurring, month, start_month, end_month, status, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            budget.id.to_string(),
            budget.category_id.to_string(),
            budget.currency,
            budget.amount.to_string(),
            recurring,
            month,
            start_month,
            end_month,
            budget.status.as_str(),
            budget.note,
            budget.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn update_budget_row(conn: &Connection, budget: &Budget) -> Result<usize> {
    let (recurring, month, start_month, end_month) = budget_period_columns(&budget.period);
    let changed = conn.execute(
        r#"
        UPDATE budgets
        SET category_id = ?2, currency = ?3, amount = ?4, recurring = ?5,
            month = ?6, start_month = ?7, end_month = ?8, status = ?9, note = ?10
        WHERE id = ?1
        "#,
        params![
            budget.id.to_string(),
            budget.category_id.to_string(),
            budget.currency,
            budget.amount.to_string(),
            recurring,
            month,
            start_month,
            end_month,
            budget.status.as_str(),
            budget.note,
        ],
    )?;
    Ok(changed)
}

fn parse_stored_decimal(raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal in DB: {raw}"))
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("Invalid date in DB: {raw}"))
}

fn parse_stored_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp in DB: {raw}"))?
        .with_timezone(&Utc))
}
