mod actual;
mod cli;
mod config;
mod convert;
mod db;
mod domain;
mod month;
mod report;
mod split;
mod window;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cli::{BaseCurrencyArgs, BudgetCmd, CategoryCmd, Cli, Command, RateCmd, TxCmd};
use crate::config::{
    AppConfig, app_paths, load_or_init_config, normalize_currency, now_utc, write_config,
};
use crate::db::Db;
use crate::domain::{
    Budget, BudgetPeriod, BudgetStatus, Category, CategoryKind, Transaction, TxnKind, TxnStatus,
};
use crate::month::YearMonth;
use crate::report::{GroupSummary, MonthSummary, summarize};
use crate::split::{BudgetEdit, EditPlan, plan_recurring_edit};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = app_paths(cli.home.clone())?;
    let (mut cfg, cfg_path) = load_or_init_config(&paths)?;

    match cli.command {
        Command::BaseCurrency(args) => {
            handle_base_currency(args, &mut cfg, &cfg_path)?;
            Ok(())
        }
        cmd => {
            let (mut db, _db_path) = Db::open(&paths)?;
            match cmd {
                Command::Category(args) => handle_category(&db, args.cmd),
                Command::Tx(args) => handle_tx(&db, args.cmd),
                Command::Rate(args) => handle_rate(&db, args.cmd),
                Command::Budget(args) => handle_budget(&mut db, &cfg, args.cmd),
                Command::BaseCurrency(_) => unreachable!(),
            }
        }
    }
}

fn handle_base_currency(
    args: BaseCurrencyArgs,
    cfg: &mut AppConfig,
    cfg_path: &std::path::Path,
) -> Result<()> {
    match args.code {
        None => {
            println!("{}", cfg.base_currency);
        }
        Some(code) => {
            let code = normalize_currency(&code)?;
            cfg.base_currency = code.clone();
            write_config(cfg_path, cfg)?;
            println!("Base currency set to {code}.");
        }
    }
    Ok(())
}

fn handle_category(db: &Db, cmd: CategoryCmd) -> Result<()> {
    match cmd {
        CategoryCmd::Add { name, kind, parent } => {
            let kind = CategoryKind::parse(&kind)?;
            let parent_id = match parent {
                None => None,
                Some(parent_name) => {
                    let parent = db
                        .category_by_name(&parent_name)?
                        .ok_or_else(|| anyhow!("No such parent category: '{parent_name}'"))?;
                    Some(parent.id)
                }
            };

            let category = Category {
                id: Uuid::new_v4(),
                name: name.clone(),
                parent_id,
                kind,
            };
            db.insert_category(&category)
                .with_context(|| format!("Failed to create category '{name}'"))?;
            println!("Created {} category '{}' ({}).", kind.as_str(), name, category.id);
            Ok(())
        }
        CategoryCmd::List => {
            let index = db.category_index()?;
            if index.is_empty() {
                println!("(no categories)");
                return Ok(());
            }

            let mut rows = Vec::new();
            for category in index.values() {
                let parent = category
                    .parent_id
                    .and_then(|id| index.get(&id))
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                rows.push(vec![
                    category.name.clone(),
                    category.kind.as_str().to_string(),
                    parent,
                    category.id.to_string(),
                ]);
            }
            rows.sort();
            print_table(&["NAME", "KIND", "PARENT", "ID"], &rows);
            Ok(())
        }
    }
}

fn handle_tx(db: &Db, cmd: TxCmd) -> Result<()> {
    match cmd {
        TxCmd::Add {
            amount,
            currency,
            category,
            kind,
            date,
            status,
            note,
        } => {
            let amount = parse_decimal(amount, "amount")?;
            if amount.is_zero() {
                return Err(anyhow!("Transaction amount must not be zero"));
            }
            let currency = normalize_currency(&currency)?;
            let kind = TxnKind::parse(&kind)?;
            let status = match status.as_deref() {
                None => TxnStatus::Cleared,
                Some(raw) => {
                    let status = TxnStatus::parse(raw)?;
                    if status == TxnStatus::Cancelled {
                        return Err(anyhow!(
                            "New transactions cannot be created cancelled. Use: centavo tx cancel <id>"
                        ));
                    }
                    status
                }
            };
            let date = parse_date_or_today(date.as_deref())?;

            let category_id = match category {
                None => None,
                Some(name) => {
                    let category = db
                        .category_by_name(&name)?
                        .ok_or_else(|| anyhow!("No such category: '{name}'"))?;
                    Some(category.id)
                }
            };

            let txn = Transaction {
                id: Uuid::new_v4(),
                category_id,
                currency: currency.clone(),
                amount,
                kind,
                status,
                date,
                note,
                deleted_at: None,
                created_at: now_utc(),
            };
            db.insert_transaction(&txn)?;
            println!("Recorded {} {} {} ({}).", kind.as_str(), amount, currency, txn.id);
            Ok(())
        }
        TxCmd::List { month } => {
            let month = month.map(|m| parse_month(&m)).transpose()?;
            let index = db.category_index()?;
            let txns = db.list_transactions()?;

            let mut lines = Vec::new();
            for txn in txns {
                if txn.deleted_at.is_some() {
                    continue;
                }
                if let Some(month) = month {
                    if !month.contains(txn.date) {
                        continue;
                    }
                }
                let category = txn
                    .category_id
                    .and_then(|id| index.get(&id))
                    .map(|c| c.name.as_str())
                    .unwrap_or("-");
                lines.push(format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    txn.date,
                    txn.kind.as_str(),
                    txn.status.as_str(),
                    txn.amount,
                    txn.currency,
                    category,
                    txn.id
                ));
            }
            if lines.is_empty() {
                println!("(no transactions)");
                return Ok(());
            }
            println!("date\tkind\tstatus\tamount\tcurrency\tcategory\tid");
            for line in lines {
                println!("{line}");
            }
            Ok(())
        }
        TxCmd::Cancel { id } => {
            let id = parse_uuid(&id)?;
            let changed = db.set_transaction_status(id, TxnStatus::Cancelled)?;
            if changed == 0 {
                return Err(anyhow!("No such transaction: {id}"));
            }
            println!("Cancelled transaction {id}.");
            Ok(())
        }
        TxCmd::Delete { id } => {
            let id = parse_uuid(&id)?;
            let changed = db.soft_delete_transaction(id, now_utc())?;
            if changed == 0 {
                return Err(anyhow!("No such transaction (or already deleted): {id}"));
            }
            println!("Deleted transaction {id}.");
            Ok(())
        }
    }
}

fn handle_rate(db: &Db, cmd: RateCmd) -> Result<()> {
    match cmd {
        RateCmd::Set {
            from,
            to,
            rate,
            date,
        } => {
            let from = normalize_currency(&from)?;
            let to = normalize_currency(&to)?;
            if from == to {
                return Err(anyhow!("Rate currencies must differ"));
            }
            if rate <= Decimal::ZERO {
                return Err(anyhow!("Rate must be > 0"));
            }
            let date = parse_date_or_today(date.as_deref())?;
            db.set_rate(&from, &to, date, rate)?;
            println!("Set rate 1 {from} = {rate} {to} (on {date}).");
            Ok(())
        }
        RateCmd::List { from, to } => {
            let from = from.map(|c| normalize_currency(&c)).transpose()?;
            let to = to.map(|c| normalize_currency(&c)).transpose()?;

            let rates = db.list_rates()?;
            let mut rows = Vec::new();
            for rate in rates.iter().rev() {
                if let Some(from) = &from {
                    if rate.from != *from {
                        continue;
                    }
                }
                if let Some(to) = &to {
                    if rate.to != *to {
                        continue;
                    }
                }
                rows.push(vec![
                    rate.from.clone(),
                    rate.to.clone(),
                    rate.date.to_string(),
                    rate.rate.to_string(),
                ]);
            }
            if rows.is_empty() {
                println!("(no rates)");
                return Ok(());
            }
            print_table(&["FROM", "TO", "DATE", "RATE"], &rows);
            Ok(())
        }
    }
}

fn handle_budget(db: &mut Db, cfg: &AppConfig, cmd: BudgetCmd) -> Result<()> {
    match cmd {
        BudgetCmd::Create {
            category,
            amount,
            currency,
            month,
            start,
            end,
            note,
        } => {
            let cat = db
                .category_by_name(&category)?
                .ok_or_else(|| anyhow!("No such category: '{category}'"))?;
            let amount = parse_decimal(amount, "amount")?;
            if amount <= Decimal::ZERO {
                return Err(anyhow!("Budget amount must be > 0"));
            }
            let currency = normalize_currency(&currency)?;

            let period = match (month, start) {
                (Some(month), None) => BudgetPeriod::OneTime {
                    month: parse_month(&month)?,
                },
                (None, Some(start)) => {
                    let start = parse_month(&start)?;
                    let end = end.map(|e| parse_month(&e)).transpose()?;
                    if let Some(end) = end {
                        if end < start {
                            return Err(anyhow!("--end must be on or after --start"));
                        }
                    }
                    BudgetPeriod::Recurring { start, end }
                }
                _ => {
                    return Err(anyhow!(
                        "budget create requires exactly one of --month (one-time) or --start (recurring)"
                    ));
                }
            };

            let budget = Budget {
                id: Uuid::new_v4(),
                category_id: cat.id,
                currency: currency.clone(),
                amount,
                period,
                status: BudgetStatus::Active,
                note,
                created_at: now_utc(),
            };
            db.insert_budget(&budget)?;
            println!(
                "Created budget for '{}' {} {} ({}).",
                category, amount, currency, budget.id
            );
            Ok(())
        }
        BudgetCmd::List => {
            let index = db.category_index()?;
            let budgets = db.list_budgets()?;
            if budgets.is_empty() {
                println!("(no budgets)");
                return Ok(());
            }

            let mut rows = Vec::new();
            for budget in budgets {
                let category = index
                    .get(&budget.category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| budget.category_id.to_string());
                rows.push(vec![
                    category,
                    format_period(&budget.period),
                    budget.currency.clone(),
                    budget.amount.to_string(),
                    budget.status.as_str().to_string(),
                    budget.id.to_string(),
                ]);
            }
            print_table(
                &["CATEGORY", "PERIOD", "CURRENCY", "AMOUNT", "STATUS", "ID"],
                &rows,
            );
            Ok(())
        }
        BudgetCmd::Edit {
            id,
            viewing,
            amount,
            note,
            end,
        } => {
            let id = parse_uuid(&id)?;
            let budget = db
                .get_budget(id)?
                .ok_or_else(|| anyhow!("No such budget: {id}"))?;
            let viewing = parse_month(&viewing)?;

            let edit = BudgetEdit {
                amount: amount
                    .map(|a| {
                        let amount = parse_decimal(a, "amount")?;
                        if amount <= Decimal::ZERO {
                            return Err(anyhow!("Budget amount must be > 0"));
                        }
                        Ok(amount)
                    })
                    .transpose()?,
                note,
                end: end.map(|e| parse_month(&e)).transpose()?,
            };

            if !budget.period.is_recurring() {
                if edit.end.is_some() {
                    return Err(anyhow!("--end only applies to recurring budgets"));
                }
                let mut updated = budget;
                if let Some(amount) = edit.amount {
                    updated.amount = amount;
                }
                if let Some(note) = edit.note {
                    updated.note = Some(note);
                }
                let changed = db.update_budget(&updated)?;
                if changed == 0 {
                    return Err(anyhow!("No such budget: {id}"));
                }
                println!("Updated budget {id}.");
                return Ok(());
            }

            let plan = plan_recurring_edit(&budget, viewing, &edit, now_utc())?;
            db.apply_edit_plan(&plan)?;
            match &plan {
                EditPlan::UpdateInPlace { .. } => {
                    println!("Updated budget {id}.");
                }
                EditPlan::ShiftStart { updated } => {
                    println!(
                        "Updated budget {id}; start moved to {}.",
                        format_period(&updated.period)
                    );
                }
                EditPlan::Split {
                    truncated,
                    successor,
                } => {
                    println!(
                        "Split budget {id}: history kept through {}, new budget {} applies from {}.",
                        format_period(&truncated.period),
                        successor.id,
                        viewing
                    );
                }
            }
            Ok(())
        }
        BudgetCmd::Archive { id } => {
            let id = parse_uuid(&id)?;
            let changed = db.set_budget_status(id, BudgetStatus::Archived)?;
            if changed == 0 {
                return Err(anyhow!("No such budget: {id}"));
            }
            println!("Archived budget {id}.");
            Ok(())
        }
        BudgetCmd::Report { month } => {
            let month = match month {
                Some(m) => parse_month(&m)?,
                None => YearMonth::from_date(now_utc().date_naive()),
            };

            let budgets = db.list_budgets()?;
            let ledger = db.list_transactions()?;
            let rates = db.list_rates()?;
            let categories = db.category_index()?;

            let summary = summarize(
                &budgets,
                month,
                &ledger,
                &rates,
                &categories,
                &cfg.base_currency,
            )?;

            if summary.income.is_empty() && summary.expense.is_empty() {
                println!("(no budgets)");
                return Ok(());
            }

            println!("month\tpartition\tperiod\tcategory\tcurrency\tbudget\tactual\tremaining\tid");
            print_group(&summary, "expense", &summary.expense);
            print_group(&summary, "income", &summary.income);

            if !summary.expense.is_empty() {
                println!(
                    "expense totals ({})\t{}\t{}\t{}",
                    summary.base_currency,
                    summary.expense.totals.budget,
                    summary.expense.totals.actual,
                    summary.expense.totals.remaining
                );
            }
            if !summary.income.is_empty() {
                println!(
                    "income totals ({})\t{}\t{}\t{}",
                    summary.base_currency,
                    summary.income.totals.budget,
                    summary.income.totals.actual,
                    summary.income.totals.remaining
                );
            }
            Ok(())
        }
    }
}

fn print_group(summary: &MonthSummary, partition: &str, group: &GroupSummary) {
    for (period, lines) in [("one-time", &group.one_time), ("recurring", &group.recurring)] {
        for line in lines {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                summary.month,
                partition,
                period,
                line.category,
                line.currency,
                line.amount,
                line.actual,
                line.remaining,
                line.budget_id
            );
        }
    }
}

fn format_period(period: &BudgetPeriod) -> String {
    match period {
        BudgetPeriod::OneTime { month } => month.to_string(),
        BudgetPeriod::Recurring { start, end } => match end {
            None => format!("{start}.."),
            Some(end) => format!("{start}..{end}"),
        },
    }
}

fn parse_decimal(raw: String, field: &'static str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal for {field}: {raw}"))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("Invalid id: {raw}"))
}

fn parse_month(raw: &str) -> Result<YearMonth> {
    raw.parse()
}

fn parse_date_or_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        None => Ok(now_utc().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}'. Expected YYYY-MM-DD")),
    }
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if headers.is_empty() {
        println!("(no columns)");
        return;
    }

    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();

    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    fn print_row(cells: &[String], widths: &[usize]) {
        print!("|");
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            print!(" {:width$} |", cell, width = *w);
        }
        println!();
    }

    fn print_sep(widths: &[usize]) {
        print!("|");
        for w in widths {
            print!("{}|", "-".repeat(w + 2));
        }
        println!();
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    print_row(&header_cells, &widths);
    print_sep(&widths);
    for row in rows {
        print_row(row, &widths);
    }
}
