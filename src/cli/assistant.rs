use super::ui;
use crate::core::assistant::{Conversation, Message, Role};
use crate::core::backend::Backend;
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

fn render(message: &Message) -> String {
    match message.role {
        Role::User => format!(
            "{} {}",
            ui::style_text("you>", ui::StyleType::Subtle),
            message.text
        ),
        Role::Assistant if message.error => format!(
            "{} {}",
            ui::style_text("oracle>", ui::StyleType::TotalLabel),
            ui::style_text(&message.text, ui::StyleType::Error)
        ),
        Role::Assistant => format!(
            "{} {}",
            ui::style_text("oracle>", ui::StyleType::TotalLabel),
            message.text
        ),
    }
}

async fn ask_one(
    conversation: &mut Conversation,
    backend: &dyn Backend,
    user_id: Option<i64>,
    query: &str,
) {
    let spinner = ui::new_spinner("Consulting the oracle...");
    let reply = conversation.ask(backend, user_id, query).await.map(render);
    spinner.finish_and_clear();
    if let Some(reply) = reply {
        println!("{reply}");
    }
}

/// Answers `query`, or starts an interactive chat on stdin when it is empty.
pub async fn run(backend: &dyn Backend, user_id: Option<i64>, query: &str) -> Result<()> {
    let mut conversation = Conversation::new();
    if let Some(greeting) = conversation.messages().first() {
        println!("{}", render(greeting));
    }

    if !query.trim().is_empty() {
        ask_one(&mut conversation, backend, user_id, query).await;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        ask_one(&mut conversation, backend, user_id, line).await;
    }
    Ok(())
}
