use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(name = "centavo")]
#[command(about = "Local-first personal budget tracker", long_about = None)]
pub struct Cli {
    /// Override Centavo home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "CENTAVO_HOME")]
    pub home: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Category(CategoryArgs),
    Tx(TxArgs),
    Rate(RateArgs),
    Budget(BudgetArgs),
    /// Show or set the base display currency.
    BaseCurrency(BaseCurrencyArgs),
}

#[derive(Debug, Subcommand)]
pub enum CategoryCmd {
    Add {
        name: String,
        /// income or expense
        #[arg(long)]
        kind: String,
        /// Parent category name, for nesting.
        #[arg(long)]
        parent: Option<String>,
    },
    List,
}

#[derive(Debug, Args)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub cmd: CategoryCmd,
}

#[derive(Debug, Subcommand)]
pub enum TxCmd {
    Add {
        amount: String,
        currency: String,

        #[arg(long)]
        category: Option<String>,

        /// income, expense, transfer-out or transfer-in
        #[arg(long)]
        kind: String,

        /// Transaction date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// pending or cleared
        #[arg(long)]
        status: Option<String>,

        #[arg(long, short = 'm')]
        note: Option<String>,
    },
    List {
        #[arg(long)]
        month: Option<String>,
    },
    /// Mark a transaction cancelled; it no longer counts against budgets.
    Cancel { id: String },
    /// Soft-delete a transaction (sets the deletion timestamp).
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct TxArgs {
    #[command(subcommand)]
    pub cmd: TxCmd,
}

#[derive(Debug, Subcommand)]
pub enum RateCmd {
    /// Record that 1 FROM = <rate> TO on a date.
    Set {
        from: String,
        to: String,
        rate: Decimal,
        /// Observation date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    List {
        from: Option<String>,
        to: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct RateArgs {
    #[command(subcommand)]
    pub cmd: RateCmd,
}

#[derive(Debug, Subcommand)]
pub enum BudgetCmd {
    Create {
        /// Category name the budget tracks.
        category: String,
        amount: String,
        currency: String,

        /// One-time budget month (YYYY-MM). Mutually exclusive with --start.
        #[arg(long, conflicts_with_all = ["start", "end"])]
        month: Option<String>,

        /// Recurring budget start month (YYYY-MM).
        #[arg(long)]
        start: Option<String>,

        /// Recurring budget end month (YYYY-MM, inclusive). Open-ended if omitted.
        #[arg(long, requires = "start")]
        end: Option<String>,

        #[arg(long, short = 'm')]
        note: Option<String>,
    },
    List,
    /// Edit a budget while viewing a month. For a recurring budget this may
    /// shift its start or split it into a historical and a forward record.
    Edit {
        id: String,

        /// The month being viewed when the edit was made (YYYY-MM).
        #[arg(long)]
        viewing: String,

        #[arg(long)]
        amount: Option<String>,

        #[arg(long, short = 'm')]
        note: Option<String>,

        /// New end month for the forward-looking record (YYYY-MM).
        #[arg(long)]
        end: Option<String>,
    },
    Archive { id: String },
    Report {
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct BudgetArgs {
    #[command(subcommand)]
    pub cmd: BudgetCmd,
}

#[derive(Debug, Args)]
pub struct BaseCurrencyArgs {
    /// New base currency code (3 letters). Omit to show the current one.
    pub code: Option<String>,
}
