use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use expense_oracle::AppCommand;
use expense_oracle::cli::actions::ActionChoice;
use expense_oracle::cli::setup::{setup, setup_at_path};
use expense_oracle::core::log::init_logging;
use expense_oracle::core::model::{Credentials, GoalUpdate};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Account {
    email: String,
    /// Prompted for when omitted
    #[arg(short, long)]
    password: Option<String>,
}

impl Account {
    fn into_credentials(self) -> Result<Credentials> {
        let password = match self.password {
            Some(p) => p,
            None => {
                let term = console::Term::stderr();
                term.write_str("Password: ")?;
                term.read_secure_line().context("Failed to read password")?
            }
        };
        Ok(Credentials {
            email: self.email,
            password,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Sign in and remember the session
    Login(Account),
    /// Create an account and sign in
    Register(Account),
    /// Forget the stored session
    Logout,
    /// Financial health, forecast and anomalies
    Dashboard,
    /// Budget usage per category
    Budgets,
    /// Savings goals with feasibility
    Goals,
    /// Recorded expenses
    Expenses,
    /// Compare simulated investment portfolios
    Simulate {
        principal: f64,
        #[arg(short, long, default_value_t = 1)]
        years: u32,
    },
    /// Review autonomous actions
    Actions {
        /// Approve and execute the action at this index
        #[arg(long, conflicts_with = "dismiss")]
        execute: Option<usize>,
        /// Dismiss the action at this index
        #[arg(long)]
        dismiss: Option<usize>,
    },
    /// Ask the oracle; starts an interactive chat without a question
    Ask { query: Vec<String> },
    /// Record an expense
    AddExpense {
        title: String,
        amount: f64,
        #[arg(short = 'k', long)]
        category: Option<String>,
    },
    /// Set a monthly budget for a category
    AddBudget { category: String, limit: f64 },
    /// Create a savings goal
    AddGoal {
        name: String,
        target: f64,
        /// YYYY-MM-DD
        #[arg(short, long)]
        deadline: Option<NaiveDate>,
    },
    /// Change an existing goal
    UpdateGoal {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        /// Amount saved so far
        #[arg(long)]
        saved: Option<f64>,
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Delete a goal
    DeleteGoal { id: i64 },
    /// Update monthly income, savings and risk tolerance
    Profile {
        #[arg(long)]
        income: Option<f64>,
        #[arg(long)]
        savings: Option<f64>,
        #[arg(long)]
        risk: Option<String>,
    },
}

impl TryFrom<Commands> for AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<AppCommand> {
        Ok(match cmd {
            Commands::Login(account) => AppCommand::Login(account.into_credentials()?),
            Commands::Register(account) => AppCommand::Register(account.into_credentials()?),
            Commands::Logout => AppCommand::Logout,
            Commands::Dashboard => AppCommand::Dashboard,
            Commands::Budgets => AppCommand::Budgets,
            Commands::Goals => AppCommand::Goals,
            Commands::Expenses => AppCommand::Expenses,
            Commands::Simulate { principal, years } => AppCommand::Simulate { principal, years },
            Commands::Actions { execute, dismiss } => AppCommand::Actions(match (execute, dismiss) {
                (Some(index), _) => ActionChoice::Execute(index),
                (None, Some(index)) => ActionChoice::Dismiss(index),
                (None, None) => ActionChoice::List,
            }),
            Commands::Ask { query } => AppCommand::Ask(query.join(" ")),
            Commands::AddExpense {
                title,
                amount,
                category,
            } => AppCommand::AddExpense {
                title,
                amount,
                category,
            },
            Commands::AddBudget { category, limit } => AppCommand::AddBudget { category, limit },
            Commands::AddGoal {
                name,
                target,
                deadline,
            } => AppCommand::AddGoal {
                name,
                target,
                deadline,
            },
            Commands::UpdateGoal {
                id,
                name,
                target,
                saved,
                deadline,
            } => AppCommand::UpdateGoal {
                id,
                update: GoalUpdate {
                    name,
                    target_amount: target,
                    current_amount: saved,
                    deadline,
                },
            },
            Commands::DeleteGoal { id } => AppCommand::DeleteGoal(id),
            Commands::Profile {
                income,
                savings,
                risk,
            } => AppCommand::Profile {
                income,
                savings,
                risk,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => match AppCommand::try_from(cmd) {
            Ok(cmd) => expense_oracle::run_command(cmd, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
