//! Oracle chat transcript.
use crate::core::backend::{Backend, resolve_user_id};
use tracing::{debug, warn};

pub const GREETING: &str =
    "Hello! I am your ExpenseOracle. How can I help you optimize your finances today?";
pub const EMPTY_REPLY: &str = "I've analyzed your request and updated your strategy.";
pub const UNREACHABLE_REPLY: &str =
    "I'm sorry, I'm having trouble connecting to my intelligence core right now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub error: bool,
}

impl Message {
    fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            text: text.to_string(),
            error: false,
        }
    }

    fn assistant(text: &str, error: bool) -> Self {
        Self {
            role: Role::Assistant,
            text: text.to_string(),
            error,
        }
    }
}

pub struct Conversation {
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING, false)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Sends `query` and appends both sides of the exchange. Blank queries
    /// are ignored and return `None`; otherwise the assistant's reply is
    /// returned. A failed request still produces a reply, flagged as error.
    pub async fn ask(
        &mut self,
        backend: &dyn Backend,
        user_id: Option<i64>,
        query: &str,
    ) -> Option<&Message> {
        if query.trim().is_empty() {
            return None;
        }
        self.messages.push(Message::user(query));

        let reply = match backend.chat(resolve_user_id(user_id), query).await {
            Ok(reply) => {
                debug!(intent = ?reply.intent, "Oracle replied");
                let text = reply
                    .response
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY.to_string());
                Message::assistant(&text, false)
            }
            Err(e) => {
                warn!(error = %e, "Oracle chat failed");
                Message::assistant(UNREACHABLE_REPLY, true)
            }
        };
        self.messages.push(reply);
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        ActionReport, Analytics, AnomalyReport, AuthResponse, Budget, ChatReply, Credentials,
        Expense, Forecast, Goal, GoalUpdate, HealthScore, NewBudget, NewExpense, NewGoal,
        ProfileUpdate, SimulationReport,
    };
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    /// Only answers chat; `None` makes the chat call fail.
    struct ChatOnly(Option<ChatReply>);

    #[async_trait]
    impl Backend for ChatOnly {
        async fn health_score(&self, _: i64) -> Result<HealthScore> {
            unimplemented!()
        }
        async fn forecast(&self, _: i64) -> Result<Forecast> {
            unimplemented!()
        }
        async fn analytics(&self, _: i64) -> Result<Analytics> {
            unimplemented!()
        }
        async fn anomalies(&self, _: i64) -> Result<AnomalyReport> {
            unimplemented!()
        }
        async fn expenses(&self, _: i64) -> Result<Vec<Expense>> {
            unimplemented!()
        }
        async fn budgets(&self, _: i64) -> Result<Vec<Budget>> {
            unimplemented!()
        }
        async fn goals(&self, _: i64) -> Result<Vec<Goal>> {
            unimplemented!()
        }
        async fn autonomous_actions(&self, _: i64) -> Result<ActionReport> {
            unimplemented!()
        }
        async fn simulate_investments(&self, _: f64, _: u32) -> Result<SimulationReport> {
            unimplemented!()
        }
        async fn chat(&self, user_id: i64, _query: &str) -> Result<ChatReply> {
            assert_eq!(user_id, 1);
            self.0.clone().ok_or_else(|| anyhow!("connection refused"))
        }
        async fn add_expense(&self, _: i64, _: &NewExpense) -> Result<()> {
            unimplemented!()
        }
        async fn add_budget(&self, _: i64, _: &NewBudget) -> Result<()> {
            unimplemented!()
        }
        async fn add_goal(&self, _: i64, _: &NewGoal) -> Result<()> {
            unimplemented!()
        }
        async fn update_goal(&self, _: i64, _: &GoalUpdate) -> Result<()> {
            unimplemented!()
        }
        async fn delete_goal(&self, _: i64) -> Result<()> {
            unimplemented!()
        }
        async fn update_profile(&self, _: i64, _: &ProfileUpdate) -> Result<()> {
            unimplemented!()
        }
        async fn login(&self, _: &Credentials) -> Result<AuthResponse> {
            unimplemented!()
        }
        async fn register(&self, _: &Credentials) -> Result<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_transcript_starts_with_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].text, GREETING);
    }

    #[tokio::test]
    async fn test_blank_query_is_ignored() {
        let mut conversation = Conversation::new();
        let backend = ChatOnly(None);

        assert!(conversation.ask(&backend, None, "   ").await.is_none());
        assert_eq!(conversation.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_without_response_uses_fallback() {
        let mut conversation = Conversation::new();
        let backend = ChatOnly(Some(ChatReply::default()));

        let reply = conversation.ask(&backend, None, "How am I doing?").await.unwrap();

        assert_eq!(reply.text, EMPTY_REPLY);
        assert!(!reply.error);
        assert_eq!(conversation.messages()[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_failed_chat_appends_error_message() {
        let mut conversation = Conversation::new();
        let backend = ChatOnly(None);

        let reply = conversation.ask(&backend, Some(0), "forecast?").await.unwrap();

        assert_eq!(reply.text, UNREACHABLE_REPLY);
        assert!(reply.error);
        assert_eq!(conversation.messages().len(), 3);
    }
}
