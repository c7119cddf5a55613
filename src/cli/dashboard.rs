use super::{App, ui};
use crate::core::aggregator::DashboardView;
use crate::core::model::UserContext;
use crate::core::screen::Screen;
use anyhow::Result;
use comfy_table::{Cell, Color};

impl DashboardView {
    pub fn display_as_table(&self, user: Option<&UserContext>) -> String {
        let name = user.map_or("Member", UserContext::display_name);
        let mut output = format!(
            "Welcome back, {}\n\n",
            ui::style_text(name, ui::StyleType::Title)
        );

        let status_style = if self.is_critical() {
            ui::StyleType::Error
        } else {
            ui::StyleType::TotalValue
        };
        output.push_str(&format!(
            "Financial health: {} ({})\n",
            ui::style_text(&format!("{:.0}", self.health_score), ui::StyleType::TotalLabel),
            ui::style_text(&self.health_status, status_style)
        ));

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Savings Rate"),
            ui::header_cell("Budget Used"),
            ui::header_cell("Monthly Forecast"),
            ui::header_cell("Trend"),
        ]);
        table.add_row(vec![
            ui::percent_cell(self.savings_rate, false),
            ui::format_optional_cell(self.budget_utilization, |u| format!("{u:.1}%")),
            ui::amount_cell(self.monthly_forecast),
            Cell::new(self.forecast_trend.as_deref().unwrap_or("-")),
        ]);
        output.push_str(&table.to_string());

        if !self.recommendations.is_empty() {
            output.push_str(&format!(
                "\n\n{}\n",
                ui::style_text("Recommendations", ui::StyleType::TotalLabel)
            ));
            for rec in &self.recommendations {
                output.push_str(&format!("  • {rec}\n"));
            }
        }

        if !self.series.is_empty() {
            let mut chart = ui::new_styled_table();
            chart.set_header(vec![
                ui::header_cell("Month"),
                ui::header_cell("Actual"),
                ui::header_cell("Forecast"),
            ]);
            for point in &self.series {
                chart.add_row(vec![
                    Cell::new(&point.name),
                    ui::amount_cell(point.actual),
                    ui::amount_cell(point.forecast),
                ]);
            }
            output.push_str(&format!(
                "\n{}\n{chart}",
                ui::style_text("Spending vs forecast", ui::StyleType::TotalLabel)
            ));
        }

        if self.anomalies.is_empty() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text("No unusual transactions detected.", ui::StyleType::Subtle)
            ));
        } else {
            let mut anomalies = ui::new_styled_table();
            anomalies.set_header(vec![
                ui::header_cell("Transaction"),
                ui::header_cell("Amount"),
                ui::header_cell("Risk"),
                ui::header_cell("Reason"),
            ]);
            for anomaly in &self.anomalies {
                anomalies.add_row(vec![
                    Cell::new(anomaly.title.as_deref().unwrap_or("Unknown")),
                    ui::format_optional_cell(anomaly.amount, ui::format_amount),
                    Cell::new(format!("{:.0}%", anomaly.anomaly_probability * 100.0))
                        .fg(Color::Red),
                    Cell::new(anomaly.short_reason()),
                ]);
            }
            output.push_str(&format!(
                "\n\n{}\n{anomalies}",
                ui::style_text("Anomalies", ui::StyleType::Warning)
            ));
        }

        output
    }
}

pub async fn run(app: &App) -> Result<()> {
    let aggregator = app.aggregator.clone();
    let user_id = app.user_id();
    let view = app
        .load(Screen::Dashboard, async move {
            aggregator.dashboard(user_id).await
        })
        .await;
    if let Some(view) = view {
        println!("{}", view.display_as_table(app.session.user()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dashboard_renders_fallbacks() {
        console::set_colors_enabled(false);
        let output = DashboardView::default().display_as_table(None);

        assert!(output.contains("Welcome back, Member"));
        assert!(output.contains("78 (Stable)"));
        assert!(output.contains("$2450.00"));
        assert!(output.contains("15.5%"));
        assert!(output.contains("No unusual transactions"));
    }
}
