//! Backend service abstraction

use crate::core::model::{
    ActionReport, Analytics, AnomalyReport, AuthResponse, Budget, ChatReply, Credentials,
    Expense, Forecast, Goal, GoalUpdate, HealthScore, NewBudget, NewExpense, NewGoal,
    ProfileUpdate, SimulationReport, UserContext,
};
use anyhow::Result;
use async_trait::async_trait;

/// User id used for anonymous and demo sessions.
pub const DEMO_USER_ID: i64 = 1;

/// Resolves the user a request is made for. Absent ids, and the unset id `0`,
/// fall back to the demo user.
pub fn resolve_user_id(user_id: Option<i64>) -> i64 {
    user_id.filter(|id| *id != 0).unwrap_or(DEMO_USER_ID)
}

/// Read and write endpoints of the ExpenseOracle service.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn health_score(&self, user_id: i64) -> Result<HealthScore>;
    async fn forecast(&self, user_id: i64) -> Result<Forecast>;
    async fn analytics(&self, user_id: i64) -> Result<Analytics>;
    async fn anomalies(&self, user_id: i64) -> Result<AnomalyReport>;
    async fn expenses(&self, user_id: i64) -> Result<Vec<Expense>>;
    async fn budgets(&self, user_id: i64) -> Result<Vec<Budget>>;
    async fn goals(&self, user_id: i64) -> Result<Vec<Goal>>;
    async fn autonomous_actions(&self, user_id: i64) -> Result<ActionReport>;
    async fn simulate_investments(&self, principal: f64, years: u32) -> Result<SimulationReport>;
    async fn chat(&self, user_id: i64, query: &str) -> Result<ChatReply>;

    async fn add_expense(&self, user_id: i64, expense: &NewExpense) -> Result<()>;
    async fn add_budget(&self, user_id: i64, budget: &NewBudget) -> Result<()>;
    async fn add_goal(&self, user_id: i64, goal: &NewGoal) -> Result<()>;
    async fn update_goal(&self, goal_id: i64, update: &GoalUpdate) -> Result<()>;
    async fn delete_goal(&self, goal_id: i64) -> Result<()>;
    async fn update_profile(&self, user_id: i64, profile: &ProfileUpdate) -> Result<()>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;
    async fn register(&self, credentials: &Credentials) -> Result<()>;
}

/// Session user to store after a successful login.
pub fn authenticated_user(response: AuthResponse) -> UserContext {
    response.user.unwrap_or_else(UserContext::fallback)
}
