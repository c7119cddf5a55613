//! Terminal front end: one module per screen plus account and setup commands.

pub mod actions;
pub mod assistant;
pub mod auth;
pub mod budgets;
pub mod dashboard;
pub mod expenses;
pub mod goals;
pub mod profile;
pub mod setup;
pub mod simulator;
pub mod ui;

use crate::core::aggregator::{MutationOutcome, ViewModelAggregator};
use crate::core::screen::{Screen, ScreenScope};
use crate::core::session::Session;
use anyhow::{Result, bail};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Everything a command needs: the aggregator, the signed-in session and the
/// configured action delay.
pub struct App {
    pub aggregator: ViewModelAggregator,
    pub session: Session,
    pub action_delay: Duration,
}

impl App {
    pub fn user_id(&self) -> Option<i64> {
        self.session.user_id()
    }

    /// Runs one aggregation cycle for `screen` and waits for its view.
    pub async fn load<V, Fut>(&self, screen: Screen, cycle: Fut) -> Option<V>
    where
        V: Default + Clone + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        let scope = ScreenScope::new(screen);
        let cycle = scope.spawn_cycle(cycle);
        ui::await_cycle(cycle, &format!("Loading {screen}...")).await
    }
}

/// Prints the outcome of a write and returns whether it was applied.
/// A rejected write leaves the previous state alone and is not an error.
fn report(outcome: &MutationOutcome, success: &str, failure: &str) -> bool {
    match outcome {
        MutationOutcome::Applied => {
            println!("{}", ui::style_text(success, ui::StyleType::TotalValue));
            true
        }
        MutationOutcome::Rejected(reason) => {
            warn!(%reason, "{failure}");
            eprintln!(
                "{}",
                ui::style_text(&format!("{failure}: {reason}"), ui::StyleType::Error)
            );
            false
        }
    }
}

/// Form check shared by the add commands.
fn positive(value: f64, field: &str) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        bail!("{field} must be a positive number")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rejects_zero_and_nan() {
        assert_eq!(positive(12.5, "Amount").unwrap(), 12.5);
        assert!(positive(0.0, "Amount").is_err());
        assert!(positive(f64::NAN, "Amount").is_err());
        assert_eq!(
            positive(-1.0, "Limit").unwrap_err().to_string(),
            "Limit must be a positive number"
        );
    }

    #[test]
    fn test_report_keeps_rejection_out_of_errors() {
        console::set_colors_enabled(false);
        assert!(report(&MutationOutcome::Applied, "Saved", "Could not save"));
        assert!(!report(
            &MutationOutcome::Rejected("HTTP 500".to_string()),
            "Saved",
            "Could not save",
        ));
    }
}
