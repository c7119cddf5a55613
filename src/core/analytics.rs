//! Pure derivations the dashboard computes on top of backend resources.
use crate::core::model::{Budget, Expense, Goal, PortfolioSimulation};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;

/// Savings assumed for feasibility when the profile has none.
pub const DEFAULT_MONTHLY_SAVINGS: f64 = 500.0;
/// Feasibility score reported for goals without a deadline.
pub const UNDATED_GOAL_SCORE: i64 = 90;
/// Chart label used when a series entry carries no month.
pub const UNKNOWN_MONTH: &str = "Unknown";

/// Spending against one budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUsage {
    pub budget: Budget,
    pub spent: f64,
    /// Share of the limit used, capped at 100.
    pub percent: f64,
    pub is_over: bool,
    pub remaining: f64,
}

/// Sum of expense amounts whose category matches, ignoring case.
pub fn spent_in_category(expenses: &[Expense], category: &str) -> f64 {
    let category = category.to_lowercase();
    expenses
        .iter()
        .filter(|e| e.category.to_lowercase() == category)
        .map(|e| e.amount)
        .sum()
}

pub fn budget_usage(budget: &Budget, expenses: &[Expense]) -> BudgetUsage {
    let spent = spent_in_category(expenses, &budget.category);
    let percent = if budget.limit_amount > 0.0 {
        (spent / budget.limit_amount * 100.0).min(100.0)
    } else if spent > 0.0 {
        100.0
    } else {
        0.0
    };

    BudgetUsage {
        budget: budget.clone(),
        spent,
        percent,
        is_over: spent > budget.limit_amount,
        remaining: budget.limit_amount - spent,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feasibility {
    pub score: i64,
    pub message: String,
}

/// Savings used for goal planning. Zero counts as unset.
pub fn effective_monthly_savings(monthly_savings: Option<f64>) -> f64 {
    monthly_savings
        .filter(|s| *s != 0.0)
        .unwrap_or(DEFAULT_MONTHLY_SAVINGS)
}

/// Whole-month distance between two dates. Days of month are ignored.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

/// Scores how likely a goal is reached by its deadline at the current
/// savings pace.
///
/// Buckets read the ratio after it is capped at 100, so a deadline with
/// at least the months needed reports "High probability".
pub fn goal_feasibility(goal: &Goal, monthly_savings: Option<f64>, today: NaiveDate) -> Feasibility {
    let savings = effective_monthly_savings(monthly_savings);
    let months_needed = goal.target_amount / savings.max(1.0);

    let Some(deadline) = goal.deadline else {
        return Feasibility {
            score: UNDATED_GOAL_SCORE,
            message: format!("Estimated time: {} months", months_needed.ceil() as i64),
        };
    };

    let months_left = months_between(today, deadline) as f64;
    let ratio = if months_needed > 0.0 {
        months_left / months_needed * 100.0
    } else {
        f64::INFINITY
    };

    let capped = ratio.min(100.0);
    let message = if capped > 100.0 {
        "On track"
    } else if capped > 70.0 {
        "High probability"
    } else {
        "Requires budget adjustment"
    };

    Feasibility {
        score: ratio.round().min(100.0) as i64,
        message: message.to_string(),
    }
}

/// Share of the goal already saved, capped at 100.
pub fn goal_progress(goal: &Goal) -> f64 {
    if goal.target_amount <= 0.0 {
        return 100.0;
    }
    (goal.saved() / goal.target_amount * 100.0).min(100.0)
}

pub fn savings_tier(monthly_income: f64, monthly_savings: f64) -> &'static str {
    if monthly_income > 0.0 && monthly_savings / monthly_income > 0.2 {
        "Excellent"
    } else {
        "Stable"
    }
}

/// One chart-ready point of the actual vs forecast series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub name: String,
    pub actual: f64,
    pub forecast: f64,
}

/// Coerces raw `{month, actual, forecast}` entries into chart points.
/// Non-numeric values become `0` and a missing month becomes "Unknown".
pub fn normalize_series(raw: &[Value]) -> Vec<SeriesPoint> {
    raw.iter()
        .map(|entry| SeriesPoint {
            name: month_label(entry.get("month")),
            actual: chart_number(entry.get("actual")),
            forecast: chart_number(entry.get("forecast")),
        })
        .collect()
}

fn month_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Some(Value::Bool(true)) => "true".to_string(),
        _ => UNKNOWN_MONTH.to_string(),
    }
}

fn chart_number(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Portfolio with the best risk-adjusted return.
pub fn optimal_portfolio(simulations: &BTreeMap<String, PortfolioSimulation>) -> Option<&str> {
    simulations
        .iter()
        .filter_map(|(name, sim)| sim.sharpe_ratio.map(|s| (name, s)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name.as_str())
}
