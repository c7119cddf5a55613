pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::App;
use crate::cli::actions::ActionChoice;
use crate::core::aggregator::ViewModelAggregator;
use crate::core::config::AppConfig;
use crate::core::model::{Credentials, GoalUpdate};
use crate::core::session::Session;
use crate::providers::HttpBackend;
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that talk to the backend. `setup` is handled by the binary.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Login(Credentials),
    Register(Credentials),
    Logout,
    Dashboard,
    Budgets,
    Goals,
    Expenses,
    Simulate {
        principal: f64,
        years: u32,
    },
    Actions(ActionChoice),
    Ask(String),
    AddExpense {
        title: String,
        amount: f64,
        category: Option<String>,
    },
    AddBudget {
        category: String,
        limit: f64,
    },
    AddGoal {
        name: String,
        target: f64,
        deadline: Option<NaiveDate>,
    },
    UpdateGoal {
        id: i64,
        update: GoalUpdate,
    },
    DeleteGoal(i64),
    Profile {
        income: Option<f64>,
        savings: Option<f64>,
        risk: Option<String>,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(cmd: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("ExpenseOracle starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let store = store::open_session_store(&config.default_data_path()?);
    let mut app = App {
        aggregator: ViewModelAggregator::new(backend),
        session: Session::init(store)?,
        action_delay: config.action_delay(),
    };

    execute(&mut app, cmd).await
}

/// Runs `cmd` against an already assembled [`App`].
pub async fn execute(app: &mut App, cmd: AppCommand) -> Result<()> {
    match cmd {
        AppCommand::Login(credentials) => {
            cli::auth::login(app.aggregator.backend(), &mut app.session, &credentials).await
        }
        AppCommand::Register(credentials) => {
            cli::auth::register(app.aggregator.backend(), &mut app.session, &credentials).await
        }
        AppCommand::Logout => cli::auth::logout(&mut app.session),
        AppCommand::Dashboard => cli::dashboard::run(app).await,
        AppCommand::Budgets => cli::budgets::run(app).await,
        AppCommand::Goals => cli::goals::run(app).await,
        AppCommand::Expenses => cli::expenses::run(app).await,
        AppCommand::Simulate { principal, years } => {
            cli::simulator::run(app, principal, years).await
        }
        AppCommand::Actions(choice) => cli::actions::run(app, choice).await,
        AppCommand::Ask(query) => {
            cli::assistant::run(app.aggregator.backend(), app.user_id(), &query).await
        }
        AppCommand::AddExpense {
            title,
            amount,
            category,
        } => cli::expenses::add(app, &title, amount, category.as_deref()).await,
        AppCommand::AddBudget { category, limit } => {
            cli::budgets::add(app, &category, limit).await
        }
        AppCommand::AddGoal {
            name,
            target,
            deadline,
        } => cli::goals::add(app, &name, target, deadline).await,
        AppCommand::UpdateGoal { id, update } => cli::goals::update(app, id, update).await,
        AppCommand::DeleteGoal(id) => cli::goals::delete(app, id).await,
        AppCommand::Profile {
            income,
            savings,
            risk,
        } => cli::profile::run(app, income, savings, risk).await,
    }
}
