use super::{App, ui};
use crate::core::aggregator::{MutationOutcome, profile_update};
use anyhow::Result;
use tracing::warn;

pub const PROFILE_SAVE_FAILED: &str = "Failed to save profile. Please try again.";

/// Validates and saves the financial profile, then mirrors it into the
/// session so goal feasibility picks up the new savings figure.
pub async fn run(
    app: &mut App,
    income: Option<f64>,
    savings: Option<f64>,
    risk: Option<String>,
) -> Result<()> {
    let update = profile_update(income, savings, risk)?;

    let spinner = ui::new_spinner("Saving profile...");
    let outcome = app.aggregator.update_profile(app.user_id(), &update).await;
    spinner.finish_and_clear();

    match outcome {
        MutationOutcome::Applied => {
            app.session.apply_profile(&update)?;
            println!(
                "{} Income {}, savings {}, risk {}",
                ui::style_text("Profile saved.", ui::StyleType::TotalValue),
                ui::format_amount(update.income),
                ui::format_amount(update.savings),
                update.risk
            );
            Ok(())
        }
        MutationOutcome::Rejected(reason) => {
            warn!(%reason, "Profile update rejected");
            eprintln!("{}", ui::style_text(PROFILE_SAVE_FAILED, ui::StyleType::Error));
            Ok(())
        }
    }
}
