//! Builds one render-ready view model per screen from concurrently fetched
//! backend resources.
//!
//! Every read of a cycle is issued at once and awaited together. A failed
//! read never aborts the cycle: [`settle`] swaps in that resource's default
//! and the view model is derived from whatever arrived. Mutations are single
//! requests whose failure leaves the displayed state alone; callers refresh
//! by running a fresh cycle afterwards.

use crate::core::analytics::{
    self, BudgetUsage, Feasibility, SeriesPoint, effective_monthly_savings,
};
use crate::core::backend::{Backend, resolve_user_id};
use crate::core::model::{
    Analytics, Anomaly, AnomalyReport, AutonomousAction, Expense, Forecast, Goal, GoalUpdate,
    HealthScore, NewBudget, NewExpense, NewGoal, PortfolioSimulation, ProfileUpdate,
    SimulationReport, UserContext,
};
use crate::core::screen::settle;
use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use futures::join;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_HEALTH_SCORE: f64 = 78.0;
pub const DEFAULT_HEALTH_STATUS: &str = "Stable";
pub const DEFAULT_MONTHLY_FORECAST: f64 = 2450.0;
pub const DEFAULT_SAVINGS_RATE: f64 = 15.5;
pub const DEFAULT_RISK_TOLERANCE: &str = "Moderate";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub health_score: f64,
    pub health_status: String,
    pub savings_rate: f64,
    pub budget_utilization: Option<f64>,
    pub recommendations: Vec<String>,
    pub monthly_forecast: f64,
    pub forecast_trend: Option<String>,
    pub series: Vec<SeriesPoint>,
    pub anomalies: Vec<Anomaly>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::from_resources(
            HealthScore::default(),
            Forecast::default(),
            Analytics::default(),
            AnomalyReport::default(),
        )
    }
}

impl DashboardView {
    pub fn from_resources(
        health: HealthScore,
        forecast: Forecast,
        analytics: Analytics,
        anomalies: AnomalyReport,
    ) -> Self {
        let savings_rate = health
            .metrics
            .as_ref()
            .and_then(|m| {
                m.savings_ratio
                    .map(|ratio| ratio * 100.0)
                    .or(m.savings_rate_pct)
            })
            .unwrap_or(DEFAULT_SAVINGS_RATE);

        Self {
            health_score: health.health_score.unwrap_or(DEFAULT_HEALTH_SCORE),
            health_status: health
                .status
                .unwrap_or_else(|| DEFAULT_HEALTH_STATUS.to_string()),
            savings_rate,
            budget_utilization: health.metrics.and_then(|m| m.budget_utilization_pct),
            recommendations: health.recommendations,
            monthly_forecast: forecast.monthly().unwrap_or(DEFAULT_MONTHLY_FORECAST),
            forecast_trend: forecast.trend().map(str::to_string),
            series: analytics
                .series
                .map(|s| analytics::normalize_series(&s.forecast_vs_actual))
                .unwrap_or_default(),
            anomalies: anomalies.entries(),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.health_status.eq_ignore_ascii_case("critical")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetsView {
    pub lines: Vec<BudgetUsage>,
}

impl BudgetsView {
    pub fn over_budget(&self) -> impl Iterator<Item = &BudgetUsage> {
        self.lines.iter().filter(|l| l.is_over)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalPlan {
    pub goal: Goal,
    pub progress: f64,
    pub feasibility: Feasibility,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalsView {
    pub plans: Vec<GoalPlan>,
    pub monthly_income: Option<f64>,
    pub monthly_savings: f64,
    pub risk_tolerance: String,
}

impl GoalsView {
    pub fn savings_tier(&self) -> Option<&'static str> {
        self.monthly_income
            .map(|income| analytics::savings_tier(income, self.monthly_savings))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensesView {
    pub expenses: Vec<Expense>,
}

impl ExpensesView {
    pub fn total(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatorView {
    pub principal: f64,
    pub years: u32,
    pub portfolios: BTreeMap<String, PortfolioSimulation>,
    pub recommended: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionsView {
    pub actions: Vec<AutonomousAction>,
}

/// Result of a write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    Rejected(String),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }

    fn from_result(operation: &str, result: Result<()>) -> Self {
        match result {
            Ok(()) => {
                info!(operation, "Mutation applied");
                MutationOutcome::Applied
            }
            Err(e) => {
                warn!(operation, error = %e, "Mutation rejected, keeping previous state");
                MutationOutcome::Rejected(e.to_string())
            }
        }
    }
}

/// Validates the profile form. Savings default to 0 and risk tolerance to
/// "Moderate".
pub fn profile_update(
    income: Option<f64>,
    savings: Option<f64>,
    risk: Option<String>,
) -> Result<ProfileUpdate> {
    let income = match income {
        Some(i) if i.is_finite() && i > 0.0 => i,
        _ => bail!("Please enter a valid monthly income."),
    };
    Ok(ProfileUpdate {
        income,
        savings: savings.filter(|s| s.is_finite()).unwrap_or(0.0),
        risk: risk
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RISK_TOLERANCE.to_string()),
    })
}

#[derive(Clone)]
pub struct ViewModelAggregator {
    backend: Arc<dyn Backend>,
}

impl ViewModelAggregator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub async fn dashboard(&self, user_id: Option<i64>) -> DashboardView {
        let user_id = resolve_user_id(user_id);
        debug!(user_id, "Aggregating dashboard");

        let (health, forecast, analytics, anomalies) = join!(
            self.backend.health_score(user_id),
            self.backend.forecast(user_id),
            self.backend.analytics(user_id),
            self.backend.anomalies(user_id),
        );

        DashboardView::from_resources(
            settle("health score", health),
            settle("forecast", forecast),
            settle("analytics", analytics),
            settle("anomalies", anomalies),
        )
    }

    pub async fn budgets(&self, user_id: Option<i64>) -> BudgetsView {
        let user_id = resolve_user_id(user_id);
        debug!(user_id, "Aggregating budgets");

        let (budgets, expenses) = join!(
            self.backend.budgets(user_id),
            self.backend.expenses(user_id),
        );
        let budgets = settle("budgets", budgets);
        let expenses = settle("expenses", expenses);

        BudgetsView {
            lines: budgets
                .iter()
                .map(|b| analytics::budget_usage(b, &expenses))
                .collect(),
        }
    }

    pub async fn goals(&self, user: Option<&UserContext>) -> GoalsView {
        self.goals_on(user, Local::now().date_naive()).await
    }

    /// Goals screen evaluated as of `today`.
    pub async fn goals_on(&self, user: Option<&UserContext>, today: NaiveDate) -> GoalsView {
        let user_id = resolve_user_id(user.map(|u| u.id));
        debug!(user_id, %today, "Aggregating goals");

        let goals = settle("goals", self.backend.goals(user_id).await);
        let monthly_savings = user.and_then(|u| u.monthly_savings);

        GoalsView {
            plans: goals
                .into_iter()
                .map(|goal| GoalPlan {
                    progress: analytics::goal_progress(&goal),
                    feasibility: analytics::goal_feasibility(&goal, monthly_savings, today),
                    goal,
                })
                .collect(),
            monthly_income: user.and_then(|u| u.monthly_income),
            monthly_savings: effective_monthly_savings(monthly_savings),
            risk_tolerance: user
                .and_then(|u| u.risk_tolerance.clone())
                .unwrap_or_else(|| DEFAULT_RISK_TOLERANCE.to_string()),
        }
    }

    pub async fn expenses(&self, user_id: Option<i64>) -> ExpensesView {
        let user_id = resolve_user_id(user_id);
        debug!(user_id, "Aggregating expenses");

        ExpensesView {
            expenses: settle("expenses", self.backend.expenses(user_id).await),
        }
    }

    pub async fn simulator(&self, principal: f64, years: u32) -> SimulatorView {
        debug!(principal, years, "Running investment simulation");

        let report: SimulationReport = settle(
            "investment simulation",
            self.backend.simulate_investments(principal, years).await,
        );
        let recommended = analytics::optimal_portfolio(&report.simulations).map(str::to_string);

        SimulatorView {
            principal: report.principal.unwrap_or(principal),
            years,
            portfolios: report.simulations,
            recommended,
        }
    }

    pub async fn actions(&self, user_id: Option<i64>) -> ActionsView {
        let user_id = resolve_user_id(user_id);
        debug!(user_id, "Aggregating autonomous actions");

        ActionsView {
            actions: settle(
                "autonomous actions",
                self.backend.autonomous_actions(user_id).await,
            )
            .entries(),
        }
    }

    pub async fn add_expense(&self, user_id: Option<i64>, expense: &NewExpense) -> MutationOutcome {
        let user_id = resolve_user_id(user_id);
        MutationOutcome::from_result(
            "add expense",
            self.backend.add_expense(user_id, expense).await,
        )
    }

    pub async fn add_budget(&self, user_id: Option<i64>, budget: &NewBudget) -> MutationOutcome {
        let user_id = resolve_user_id(user_id);
        MutationOutcome::from_result("add budget", self.backend.add_budget(user_id, budget).await)
    }

    pub async fn add_goal(&self, user_id: Option<i64>, goal: &NewGoal) -> MutationOutcome {
        let user_id = resolve_user_id(user_id);
        MutationOutcome::from_result("add goal", self.backend.add_goal(user_id, goal).await)
    }

    pub async fn update_goal(&self, goal_id: i64, update: &GoalUpdate) -> MutationOutcome {
        MutationOutcome::from_result(
            "update goal",
            self.backend.update_goal(goal_id, update).await,
        )
    }

    pub async fn delete_goal(&self, goal_id: i64) -> MutationOutcome {
        MutationOutcome::from_result("delete goal", self.backend.delete_goal(goal_id).await)
    }

    pub async fn update_profile(
        &self,
        user_id: Option<i64>,
        profile: &ProfileUpdate,
    ) -> MutationOutcome {
        let user_id = resolve_user_id(user_id);
        MutationOutcome::from_result(
            "update profile",
            self.backend.update_profile(user_id, profile).await,
        )
    }
}
