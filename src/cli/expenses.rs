use super::{App, positive, report, ui};
use crate::core::aggregator::ExpensesView;
use crate::core::model::{DEFAULT_EXPENSE_CATEGORY, NewExpense};
use crate::core::screen::Screen;
use anyhow::Result;
use comfy_table::Cell;

impl ExpensesView {
    pub fn display_as_table(&self) -> String {
        if self.expenses.is_empty() {
            return ui::style_text("No expenses recorded.", ui::StyleType::Subtle);
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell("Title"),
            ui::header_cell("Category"),
            ui::header_cell("Amount"),
        ]);
        for expense in &self.expenses {
            // Only the date part of the timestamp is shown.
            let date = expense
                .created_at
                .as_deref()
                .map(|d| d.split('T').next().unwrap_or(d))
                .unwrap_or("-");
            table.add_row(vec![
                Cell::new(date),
                Cell::new(expense.title.as_deref().unwrap_or("Untitled")),
                Cell::new(&expense.category),
                ui::amount_cell(expense.amount),
            ]);
        }

        format!(
            "{}\n\n{table}\n\nTotal: {}",
            ui::style_text("Expenses", ui::StyleType::Title),
            ui::style_text(&ui::format_amount(self.total()), ui::StyleType::TotalValue)
        )
    }
}

pub async fn run(app: &App) -> Result<()> {
    let aggregator = app.aggregator.clone();
    let user_id = app.user_id();
    let view = app
        .load(Screen::Expenses, async move {
            aggregator.expenses(user_id).await
        })
        .await;
    if let Some(view) = view {
        println!("{}", view.display_as_table());
    }
    Ok(())
}

pub async fn add(app: &App, title: &str, amount: f64, category: Option<&str>) -> Result<()> {
    let expense = NewExpense {
        title: title.trim().to_string(),
        amount: positive(amount, "Amount")?,
        category: category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_EXPENSE_CATEGORY)
            .to_string(),
    };
    let outcome = app.aggregator.add_expense(app.user_id(), &expense).await;
    if !report(&outcome, "Expense recorded.", "Could not record expense") {
        return Ok(());
    }
    run(app).await
}
