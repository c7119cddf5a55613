use super::{App, positive, report, ui};
use crate::core::aggregator::GoalsView;
use crate::core::model::{GoalUpdate, NewGoal};
use crate::core::screen::Screen;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use comfy_table::{Cell, CellAlignment, Color};

impl GoalsView {
    pub fn display_as_table(&self) -> String {
        let mut output = format!("{}\n\n", ui::style_text("Goals", ui::StyleType::Title));

        output.push_str(&format!(
            "Monthly income: {}  Monthly savings: {}  Risk: {}",
            self.monthly_income
                .map_or("not set".to_string(), ui::format_amount),
            ui::format_amount(self.monthly_savings),
            self.risk_tolerance
        ));
        if let Some(tier) = self.savings_tier() {
            output.push_str(&format!(
                "  Savings: {}",
                ui::style_text(tier, ui::StyleType::TotalValue)
            ));
        }
        output.push('\n');

        if self.plans.is_empty() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text("No goals yet.", ui::StyleType::Subtle)
            ));
            return output;
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("ID"),
            ui::header_cell("Goal"),
            ui::header_cell("Saved"),
            ui::header_cell("Target"),
            ui::header_cell("Progress"),
            ui::header_cell("Deadline"),
            ui::header_cell("Feasibility"),
        ]);

        for plan in &self.plans {
            let color = match plan.feasibility.score {
                s if s >= 90 => Color::Green,
                s if s >= 70 => Color::Yellow,
                _ => Color::Red,
            };
            table.add_row(vec![
                Cell::new(plan.goal.id),
                Cell::new(&plan.goal.name),
                ui::amount_cell(plan.goal.saved()),
                ui::amount_cell(plan.goal.target_amount),
                Cell::new(format!("{:.0}%", plan.progress)).set_alignment(CellAlignment::Right),
                ui::format_optional_cell(plan.goal.deadline, |d| d.to_string()),
                Cell::new(format!(
                    "{}% {}",
                    plan.feasibility.score, plan.feasibility.message
                ))
                .fg(color),
            ]);
        }

        output.push('\n');
        output.push_str(&table.to_string());
        output
    }
}

pub async fn run(app: &App) -> Result<()> {
    let aggregator = app.aggregator.clone();
    let user = app.session.user().cloned();
    let view = app
        .load(Screen::Goals, async move {
            aggregator.goals(user.as_ref()).await
        })
        .await;
    if let Some(view) = view {
        println!("{}", view.display_as_table());
    }
    Ok(())
}

pub async fn add(app: &App, name: &str, target: f64, deadline: Option<NaiveDate>) -> Result<()> {
    let goal = NewGoal {
        name: name.trim().to_string(),
        target_amount: positive(target, "Target")?,
        deadline,
    };
    let outcome = app.aggregator.add_goal(app.user_id(), &goal).await;
    if !report(&outcome, "Goal created.", "Could not create goal") {
        return Ok(());
    }
    run(app).await
}

pub async fn update(app: &App, goal_id: i64, update: GoalUpdate) -> Result<()> {
    if update == GoalUpdate::default() {
        bail!("Nothing to update for goal {goal_id}");
    }
    let outcome = app.aggregator.update_goal(goal_id, &update).await;
    if !report(&outcome, "Goal updated.", "Could not update goal") {
        return Ok(());
    }
    run(app).await
}

pub async fn delete(app: &App, goal_id: i64) -> Result<()> {
    let outcome = app.aggregator.delete_goal(goal_id).await;
    if !report(&outcome, "Goal deleted.", "Could not delete goal") {
        return Ok(());
    }
    run(app).await
}
