use super::util::with_retry;
use crate::core::backend::Backend;
use crate::core::config::BackendConfig;
use crate::core::model::{
    ActionReport, Analytics, AnomalyReport, AuthResponse, Budget, ChatReply, Credentials,
    Expense, Forecast, Goal, GoalUpdate, HealthScore, NewBudget, NewExpense, NewGoal,
    ProfileUpdate, SimulationReport, decode_list,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error};

/// [`Backend`] over the ExpenseOracle HTTP API.
///
/// Reads are retried according to the config; writes are sent once.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    retries: usize,
    retry_delay_ms: u64,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse_with_params(&raw, params).with_context(|| format!("Invalid backend url: {raw}"))
    }

    fn user_url(&self, path: &str, user_id: i64) -> Result<Url> {
        self.url(path, &[("user_id", user_id.to_string())])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T> {
        debug!(%url, resource, "Fetching");
        let response = with_retry(
            || async {
                self.client
                    .get(url.clone())
                    .send()
                    .await?
                    .error_for_status()
            },
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .with_context(|| format!("Request for {resource} failed"))?;

        let response_text = response
            .text()
            .await
            .context("Failed to get response text")?;

        match serde_json::from_str(&response_text) {
            Ok(data) => Ok(data),
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    resource,
                    "Failed to parse response"
                );
                Err(e).with_context(|| format!("Failed to parse {resource} response"))
            }
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, url: Url, kind: &str) -> Result<Vec<T>> {
        let raw: Vec<Value> = self.get_json(url, kind).await?;
        Ok(decode_list(kind, &raw))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        action: &str,
    ) -> Result<reqwest::Response> {
        debug!(%method, %url, action, "Sending");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {action} failed"))?;
        response
            .error_for_status()
            .with_context(|| format!("Backend refused to {action}"))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health_score(&self, user_id: i64) -> Result<HealthScore> {
        self.get_json(self.user_url("/ml/health-score", user_id)?, "health score")
            .await
    }

    async fn forecast(&self, user_id: i64) -> Result<Forecast> {
        self.get_json(self.user_url("/ml/forecast", user_id)?, "forecast")
            .await
    }

    async fn analytics(&self, user_id: i64) -> Result<Analytics> {
        self.get_json(self.user_url("/ml/analytics", user_id)?, "analytics")
            .await
    }

    async fn anomalies(&self, user_id: i64) -> Result<AnomalyReport> {
        self.get_json(self.user_url("/ml/anomalies", user_id)?, "anomalies")
            .await
    }

    async fn expenses(&self, user_id: i64) -> Result<Vec<Expense>> {
        self.get_list(self.user_url("/expenses/", user_id)?, "expense")
            .await
    }

    async fn budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        self.get_list(self.user_url("/budgets/", user_id)?, "budget")
            .await
    }

    async fn goals(&self, user_id: i64) -> Result<Vec<Goal>> {
        self.get_list(self.user_url("/goals/", user_id)?, "goal").await
    }

    async fn autonomous_actions(&self, user_id: i64) -> Result<ActionReport> {
        self.get_json(
            self.user_url("/ml/autonomous-actions", user_id)?,
            "autonomous actions",
        )
        .await
    }

    async fn simulate_investments(&self, principal: f64, years: u32) -> Result<SimulationReport> {
        let url = self.url(
            "/ml/investment-simulator",
            &[
                ("principal", principal.to_string()),
                ("years", years.to_string()),
            ],
        )?;
        self.get_json(url, "investment simulation").await
    }

    async fn chat(&self, user_id: i64, query: &str) -> Result<ChatReply> {
        let response = self
            .send(
                Method::POST,
                self.user_url("/ml/chat", user_id)?,
                Some(&json!({ "query": query })),
                "reach the oracle",
            )
            .await?;
        let text = response.text().await.context("Failed to get response text")?;
        serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse chat response");
            anyhow::Error::new(e).context("Failed to parse chat response")
        })
    }

    async fn add_expense(&self, user_id: i64, expense: &NewExpense) -> Result<()> {
        self.send(
            Method::POST,
            self.user_url("/expenses/", user_id)?,
            Some(expense),
            "add expense",
        )
        .await?;
        Ok(())
    }

    async fn add_budget(&self, user_id: i64, budget: &NewBudget) -> Result<()> {
        self.send(
            Method::POST,
            self.user_url("/budgets/", user_id)?,
            Some(budget),
            "add budget",
        )
        .await?;
        Ok(())
    }

    async fn add_goal(&self, user_id: i64, goal: &NewGoal) -> Result<()> {
        self.send(
            Method::POST,
            self.user_url("/goals/", user_id)?,
            Some(goal),
            "add goal",
        )
        .await?;
        Ok(())
    }

    async fn update_goal(&self, goal_id: i64, update: &GoalUpdate) -> Result<()> {
        self.send(
            Method::PUT,
            self.url(&format!("/goals/{goal_id}"), &[])?,
            Some(update),
            "update goal",
        )
        .await?;
        Ok(())
    }

    async fn delete_goal(&self, goal_id: i64) -> Result<()> {
        self.send::<()>(
            Method::DELETE,
            self.url(&format!("/goals/{goal_id}"), &[])?,
            None,
            "delete goal",
        )
        .await?;
        Ok(())
    }

    async fn update_profile(&self, user_id: i64, profile: &ProfileUpdate) -> Result<()> {
        let url = self.url(
            "/auth/profile",
            &[
                ("user_id", user_id.to_string()),
                ("income", profile.income.to_string()),
                ("savings", profile.savings.to_string()),
                ("risk", profile.risk.clone()),
            ],
        )?;
        self.send::<()>(Method::PUT, url, None, "save profile")
            .await?;
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let response = self
            .send(
                Method::POST,
                self.url("/auth/login", &[])?,
                Some(credentials),
                "log in",
            )
            .await?;
        let text = response.text().await.context("Failed to get response text")?;
        if text.trim().is_empty() {
            return Ok(AuthResponse::default());
        }
        serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse login response");
            anyhow::Error::new(e).context("Failed to parse login response")
        })
    }

    async fn register(&self, credentials: &Credentials) -> Result<()> {
        self.send(
            Method::POST,
            self.url("/auth/register", &[])?,
            Some(credentials),
            "register",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: server.uri(),
            retries: 1,
            retry_delay_ms: 0,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_health_score_accepts_score_alias() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/health-score"))
            .and(query_param("user_id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "score": 64,
                "status": "Needs Attention",
                "metrics": {"savings_ratio": 0.12},
                "recommendations": ["Cut dining out"]
            })))
            .mount(&server)
            .await;

        let health = backend(&server).health_score(7).await.unwrap();

        assert_eq!(health.health_score, Some(64.0));
        assert_eq!(health.status.as_deref(), Some("Needs Attention"));
        assert_eq!(health.metrics.unwrap().savings_ratio, Some(0.12));
        assert_eq!(health.recommendations, vec!["Cut dining out"]);
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let result = backend(&server).forecast(1).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_is_retried_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/anomalies"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ml/anomalies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "anomalies": [{"title": "Casino", "amount": 900, "anomaly_probability": 0.93}]
            })))
            .mount(&server)
            .await;

        let report = backend(&server).anomalies(1).await.unwrap();

        let entries = report.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Casino"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/analytics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = backend(&server).analytics(1).await.unwrap_err();

        assert!(err.to_string().contains("Failed to parse analytics response"));
    }

    #[tokio::test]
    async fn test_expense_list_drops_malformed_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/expenses/"))
            .and(query_param("user_id", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Groceries", "amount": 82.5, "category": "Food"},
                {"id": 2, "title": "Broken"},
                {"id": 3, "title": "Bus", "amount": 2.75}
            ])))
            .mount(&server)
            .await;

        let expenses = backend(&server).expenses(3).await.unwrap();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[1].category, "General");
    }

    #[tokio::test]
    async fn test_simulation_sends_principal_and_years() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/investment-simulator"))
            .and(query_param("principal", "25000"))
            .and(query_param("years", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "principal": 25000,
                "simulations": {
                    "Balanced": {"sharpe_ratio": 1.1, "risk_band": "Medium"}
                }
            })))
            .mount(&server)
            .await;

        let report = backend(&server)
            .simulate_investments(25000.0, 5)
            .await
            .unwrap();

        assert_eq!(report.principal, Some(25000.0));
        assert!(report.simulations.contains_key("Balanced"));
    }

    #[tokio::test]
    async fn test_chat_posts_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ml/chat"))
            .and(query_param("user_id", "1"))
            .and(body_json(json!({"query": "Can I afford a car?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Not this quarter.",
                "intent": "affordability"
            })))
            .mount(&server)
            .await;

        let reply = backend(&server)
            .chat(1, "Can I afford a car?")
            .await
            .unwrap();

        assert_eq!(reply.response.as_deref(), Some("Not this quarter."));
    }

    #[tokio::test]
    async fn test_update_profile_uses_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/auth/profile"))
            .and(query_param("user_id", "4"))
            .and(query_param("income", "5200"))
            .and(query_param("savings", "800"))
            .and(query_param("risk", "Conservative"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .update_profile(
                4,
                &ProfileUpdate {
                    income: 5200.0,
                    savings: 800.0,
                    risk: "Conservative".to_string(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_write_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/goals/9"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend(&server).delete_goal(9).await.unwrap_err();

        assert!(err.to_string().contains("delete goal"));
    }

    #[tokio::test]
    async fn test_login_returns_token_without_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "ada@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let response = backend(&server)
            .login(&Credentials {
                email: "ada@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.access_token.as_deref(), Some("abc"));
        assert!(response.user.is_none());
    }

    #[tokio::test]
    async fn test_register_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": "Email already registered"
            })))
            .mount(&server)
            .await;

        let result = backend(&server)
            .register(&Credentials {
                email: "ada@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await;

        assert!(result.is_err());
    }
}
