//! Backend resource types.
//!
//! Every type here is decoded leniently: a field that is missing, `null` or
//! of the wrong JSON type decodes to `None` (or an empty collection) instead
//! of failing the whole resource. Identity fields of list entries are the one
//! exception, see [`decode_list`].

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Category assigned to expenses the backend returns without one.
pub const DEFAULT_EXPENSE_CATEGORY: &str = "General";

/// The signed-in user as held by the session layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: i64,
    pub email: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub monthly_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub monthly_savings: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub risk_tolerance: Option<String>,
}

impl UserContext {
    /// User stored when a successful login response carries no user object.
    pub fn fallback() -> Self {
        Self {
            id: 1,
            email: "user@example.com".to_string(),
            monthly_income: None,
            monthly_savings: None,
            risk_tolerance: None,
        }
    }

    /// Local part of the email, or "Member" when there is none.
    pub fn display_name(&self) -> &str {
        match self.email.split('@').next() {
            Some(name) if !name.is_empty() => name,
            _ => "Member",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Expense {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    pub amount: f64,
    #[serde(default = "default_category", deserialize_with = "lenient::category")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

fn default_category() -> String {
    DEFAULT_EXPENSE_CATEGORY.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category: String,
    pub limit_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub current_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub deadline: Option<NaiveDate>,
}

impl Goal {
    pub fn saved(&self) -> f64 {
        self.current_amount.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthMetrics {
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings_rate_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub budget_utilization_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthScore {
    #[serde(default, alias = "score", deserialize_with = "lenient::number")]
    pub health_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub metrics: Option<HealthMetrics>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastAnalysis {
    #[serde(default, deserialize_with = "lenient::number")]
    pub monthly_forecast: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub trend: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence_level: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Forecast {
    #[serde(default, deserialize_with = "lenient::number")]
    pub monthly_forecast: Option<f64>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub forecast_analysis: Option<ForecastAnalysis>,
}

impl Forecast {
    pub fn monthly(&self) -> Option<f64> {
        self.monthly_forecast.or_else(|| {
            self.forecast_analysis
                .as_ref()
                .and_then(|a| a.monthly_forecast)
        })
    }

    pub fn trend(&self) -> Option<&str> {
        self.forecast_analysis.as_ref()?.trend.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalyticsSeries {
    /// Raw chart entries; shape is only checked during normalization.
    #[serde(default, deserialize_with = "lenient::values")]
    pub forecast_vs_actual: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Analytics {
    #[serde(default, deserialize_with = "lenient::object")]
    pub series: Option<AnalyticsSeries>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Anomaly {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::probability")]
    pub anomaly_probability: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reason: Option<String>,
}

impl Anomaly {
    /// First sentence of the reason, as shown next to the probability.
    pub fn short_reason(&self) -> &str {
        self.reason
            .as_deref()
            .and_then(|r| r.split('.').next())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnomalyReport {
    #[serde(default, deserialize_with = "lenient::values")]
    pub anomalies: Vec<Value>,
}

impl AnomalyReport {
    pub fn entries(&self) -> Vec<Anomaly> {
        decode_list("anomaly", &self.anomalies)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutonomousAction {
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient::probability")]
    pub priority_score: f64,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub why: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionReport {
    #[serde(default, deserialize_with = "lenient::values")]
    pub autonomous_actions: Vec<Value>,
}

impl ActionReport {
    pub fn entries(&self) -> Vec<AutonomousAction> {
        decode_list("autonomous action", &self.autonomous_actions)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Projection {
    #[serde(default, deserialize_with = "lenient::number")]
    pub mean: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub p10_worst_case: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub p90_best_case: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub volatility: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PortfolioSimulation {
    #[serde(default, deserialize_with = "lenient::text")]
    pub composition: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub expected_return: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sharpe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub risk_band: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub projection: Option<Projection>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationReport {
    #[serde(default, deserialize_with = "lenient::number")]
    pub principal: Option<f64>,
    #[serde(default, deserialize_with = "lenient::simulations")]
    pub simulations: BTreeMap<String, PortfolioSimulation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatReply {
    #[serde(default, deserialize_with = "lenient::text")]
    pub response: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub intent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default, deserialize_with = "lenient::text")]
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub user: Option<UserContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBudget {
    pub category: String,
    pub limit_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub income: f64,
    pub savings: f64,
    pub risk: String,
}

/// Decodes each entry of a list resource on its own. Entries missing their
/// identity fields are dropped with a warning, the rest are kept.
pub fn decode_list<T: DeserializeOwned>(kind: &str, raw: &[Value]) -> Vec<T> {
    raw.iter()
        .filter_map(|entry| match serde_json::from_value::<T>(entry.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(kind, error = %e, entry = %entry, "Dropping malformed entry");
                None
            }
        })
        .collect()
}

mod lenient {
    use super::*;

    fn raw<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
        Option::<Value>::deserialize(d).map(|v| v.unwrap_or(Value::Null))
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(raw(d)?.as_f64().filter(|n| n.is_finite()))
    }

    pub fn probability<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(number(d)?.map_or(0.0, |p| p.clamp(0.0, 1.0)))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match raw(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn category<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text(d)?
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(default_category))
    }

    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match raw(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn values<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
        Ok(match raw(d)? {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
    }

    pub fn object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match raw(d)? {
            v @ Value::Object(_) => serde_json::from_value(v)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }

    pub fn simulations<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, PortfolioSimulation>, D::Error> {
        Ok(match raw(d)? {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(name, v)| {
                    serde_json::from_value::<PortfolioSimulation>(v)
                        .ok()
                        .map(|sim| (name, sim))
                })
                .collect(),
            _ => BTreeMap::new(),
        })
    }

    /// Accepts `YYYY-MM-DD` or any ISO date-time; only the date part is kept.
    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        Ok(text(d)?.and_then(|s| {
            s.get(..10)
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        }))
    }
}
