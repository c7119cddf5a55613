use super::{App, ui};
use crate::core::actions::ActionBoard;
use crate::core::screen::Screen;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Color};

/// What to do with the listed actions after rendering them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionChoice {
    List,
    Execute(usize),
    Dismiss(usize),
}

impl ActionBoard {
    pub fn display_as_table(&self) -> String {
        if self.is_empty() {
            return ui::style_text(
                "All clear. No autonomous actions are waiting for approval.",
                ui::StyleType::Subtle,
            );
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Type"),
            ui::header_cell("Priority"),
            ui::header_cell("Message"),
            ui::header_cell("Proposed Action"),
            ui::header_cell("Why"),
        ]);
        for (index, action) in self.actions().iter().enumerate() {
            let priority = Cell::new(format!("{:.0}%", action.priority_score * 100.0))
                .set_alignment(CellAlignment::Right)
                .fg(if action.priority_score >= 0.8 {
                    Color::Red
                } else {
                    Color::Yellow
                });
            table.add_row(vec![
                Cell::new(index),
                Cell::new(action.kind.as_deref().unwrap_or("ACTION")),
                priority,
                Cell::new(action.message.as_deref().unwrap_or("")),
                Cell::new(action.action.as_deref().unwrap_or("-")),
                Cell::new(action.why.join("\n")),
            ]);
        }

        format!(
            "{}\n\n{table}",
            ui::style_text("Autonomous actions", ui::StyleType::Title)
        )
    }
}

/// Applies `choice` to the board and waits for any started execution.
pub async fn apply(board: &mut ActionBoard, choice: ActionChoice) -> Option<String> {
    match choice {
        ActionChoice::List => None,
        ActionChoice::Dismiss(index) => Some(match board.dismiss(index) {
            Some(action) => format!(
                "Dismissed {}",
                action.kind.as_deref().unwrap_or("action")
            ),
            None => ui::style_text(&format!("No action at #{index}"), ui::StyleType::Error),
        }),
        ActionChoice::Execute(index) => {
            let Some(action) = board.execute(index) else {
                return Some(ui::style_text(
                    &format!("No action at #{index}"),
                    ui::StyleType::Error,
                ));
            };
            let kind = action.kind.as_deref().unwrap_or("action").to_string();
            let spinner = ui::new_spinner(&format!("Executing {kind}..."));
            let done = board.wait_for_completions().await;
            spinner.finish_and_clear();
            Some(ui::style_text(
                &format!("Executed {kind} ({} completed)", done.len()),
                ui::StyleType::TotalValue,
            ))
        }
    }
}

pub async fn run(app: &App, choice: ActionChoice) -> Result<()> {
    let aggregator = app.aggregator.clone();
    let user_id = app.user_id();
    let Some(view) = app
        .load(Screen::Actions, async move {
            aggregator.actions(user_id).await
        })
        .await
    else {
        return Ok(());
    };

    let mut board = ActionBoard::new(view.actions, app.action_delay);
    println!("{}", board.display_as_table());

    if let Some(message) = apply(&mut board, choice).await {
        println!("\n{message}\n");
        println!("{}", board.display_as_table());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::AutonomousAction;
    use std::time::Duration;

    fn board() -> ActionBoard {
        ActionBoard::new(
            vec![AutonomousAction {
                kind: Some("SAVINGS_SWEEP".to_string()),
                message: Some("Move surplus to savings".to_string()),
                action: Some("Transfer $200".to_string()),
                priority_score: 0.9,
                why: vec!["Surplus detected".to_string()],
            }],
            Duration::from_millis(1500),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_waits_and_empties_board() {
        console::set_colors_enabled(false);
        let mut board = board();

        let message = apply(&mut board, ActionChoice::Execute(0)).await.unwrap();

        assert_eq!(message, "Executed SAVINGS_SWEEP (1 completed)");
        assert!(board.is_empty());
        assert!(board.display_as_table().contains("All clear"));
    }

    #[tokio::test]
    async fn test_unknown_index_reports_error() {
        console::set_colors_enabled(false);
        let mut board = board();

        let message = apply(&mut board, ActionChoice::Dismiss(4)).await.unwrap();

        assert_eq!(message, "No action at #4");
        assert_eq!(board.actions().len(), 1);
    }
}
