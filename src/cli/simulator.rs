use super::{App, positive, ui};
use crate::core::aggregator::SimulatorView;
use crate::core::screen::Screen;
use anyhow::Result;
use comfy_table::{Attribute, Cell};

impl SimulatorView {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "{}\n\nPrincipal {} over {} year{}\n",
            ui::style_text("Investment simulator", ui::StyleType::Title),
            ui::format_amount(self.principal),
            self.years,
            if self.years == 1 { "" } else { "s" }
        );

        if self.portfolios.is_empty() {
            output.push_str(&ui::style_text(
                "Simulation unavailable, try again later.",
                ui::StyleType::Error,
            ));
            return output;
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Portfolio"),
            ui::header_cell("Composition"),
            ui::header_cell("Expected Return"),
            ui::header_cell("Sharpe"),
            ui::header_cell("Risk"),
            ui::header_cell("Mean"),
            ui::header_cell("Worst (P10)"),
            ui::header_cell("Best (P90)"),
            ui::header_cell("Volatility"),
        ]);

        for (name, sim) in &self.portfolios {
            let projection = sim.projection.clone().unwrap_or_default();
            let mut name_cell = Cell::new(name);
            if self.recommended.as_deref() == Some(name.as_str()) {
                name_cell = Cell::new(format!("{name} ★")).add_attribute(Attribute::Bold);
            }
            table.add_row(vec![
                name_cell,
                Cell::new(sim.composition.as_deref().unwrap_or("-")),
                Cell::new(sim.expected_return.as_deref().unwrap_or("-")),
                ui::format_optional_cell(sim.sharpe_ratio, |s| format!("{s:.2}")),
                Cell::new(sim.risk_band.as_deref().unwrap_or("-")),
                ui::format_optional_cell(projection.mean, ui::format_amount),
                ui::format_optional_cell(projection.p10_worst_case, ui::format_amount),
                ui::format_optional_cell(projection.p90_best_case, ui::format_amount),
                Cell::new(projection.volatility.as_deref().unwrap_or("-")),
            ]);
        }
        output.push_str(&table.to_string());

        if let Some(best) = &self.recommended {
            output.push_str(&format!(
                "\n\nRecommended: {}",
                ui::style_text(best, ui::StyleType::TotalValue)
            ));
        }
        output
    }
}

pub async fn run(app: &App, principal: f64, years: u32) -> Result<()> {
    let principal = positive(principal, "Principal")?;
    let aggregator = app.aggregator.clone();
    let view = app
        .load(Screen::Simulator, async move {
            aggregator.simulator(principal, years).await
        })
        .await;
    if let Some(view) = view {
        println!("{}", view.display_as_table());
    }
    Ok(())
}
