use super::{App, positive, report, ui};
use crate::core::aggregator::BudgetsView;
use crate::core::model::NewBudget;
use crate::core::screen::Screen;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Color};

impl BudgetsView {
    pub fn display_as_table(&self) -> String {
        if self.lines.is_empty() {
            return ui::style_text("No budgets set yet.", ui::StyleType::Subtle);
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Category"),
            ui::header_cell("Limit"),
            ui::header_cell("Spent"),
            ui::header_cell("Used"),
            ui::header_cell("Remaining"),
        ]);

        for line in &self.lines {
            let remaining = if line.is_over {
                Cell::new("Exceeded")
                    .fg(Color::Red)
                    .set_alignment(CellAlignment::Right)
            } else {
                ui::amount_cell(line.remaining)
            };
            table.add_row(vec![
                Cell::new(&line.budget.category),
                ui::amount_cell(line.budget.limit_amount),
                ui::amount_cell(line.spent),
                ui::percent_cell(line.percent, line.is_over),
                remaining,
            ]);
        }

        let mut output = format!(
            "{}\n\n{table}",
            ui::style_text("Budgets", ui::StyleType::Title)
        );
        let over = self.over_budget().count();
        if over > 0 {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(
                    &format!("{over} categor{} over budget", if over == 1 { "y" } else { "ies" }),
                    ui::StyleType::Error
                )
            ));
        }
        output
    }
}

pub async fn run(app: &App) -> Result<()> {
    let aggregator = app.aggregator.clone();
    let user_id = app.user_id();
    let view = app
        .load(Screen::Budgets, async move {
            aggregator.budgets(user_id).await
        })
        .await;
    if let Some(view) = view {
        println!("{}", view.display_as_table());
    }
    Ok(())
}

pub async fn add(app: &App, category: &str, limit: f64) -> Result<()> {
    let budget = NewBudget {
        category: category.trim().to_string(),
        limit_amount: positive(limit, "Limit")?,
    };
    let outcome = app.aggregator.add_budget(app.user_id(), &budget).await;
    if !report(&outcome, "Budget saved.", "Could not save budget") {
        return Ok(());
    }
    run(app).await
}
