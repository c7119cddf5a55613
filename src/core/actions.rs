//! Local list of suggested autonomous actions and the optimistic execution
//! flow behind "Approve & Execute".

use crate::core::model::AutonomousAction;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Artificial time an approved action takes to "complete".
pub const DEFAULT_EXECUTION_DELAY: Duration = Duration::from_millis(1500);

pub struct ActionBoard {
    actions: Vec<AutonomousAction>,
    delay: Duration,
    in_flight: Vec<JoinHandle<AutonomousAction>>,
}

impl ActionBoard {
    pub fn new(actions: Vec<AutonomousAction>, delay: Duration) -> Self {
        Self {
            actions,
            delay,
            in_flight: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[AutonomousAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of approved actions whose completion has not fired yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    /// Approves the action at `index`.
    ///
    /// The action leaves the local list right away; its completion runs in
    /// the background and only waits the configured delay. Nothing is rolled
    /// back if that completion never happens. Returns `None` for an index
    /// that is out of range.
    pub fn execute(&mut self, index: usize) -> Option<AutonomousAction> {
        if index >= self.actions.len() {
            debug!(index, len = self.actions.len(), "Ignoring execute for unknown action");
            return None;
        }
        let action = self.actions.remove(index);
        info!(index, kind = ?action.kind, "Executing autonomous action");

        let delay = self.delay;
        let pending = action.clone();
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(kind = ?pending.kind, "Autonomous action completed");
            pending
        }));

        Some(action)
    }

    /// Removes the action at `index` without executing it.
    pub fn dismiss(&mut self, index: usize) -> Option<AutonomousAction> {
        if index >= self.actions.len() {
            return None;
        }
        let action = self.actions.remove(index);
        info!(index, kind = ?action.kind, "Dismissed autonomous action");
        Some(action)
    }

    /// Waits for the background completions still tracked and returns the
    /// completed actions in approval order. Completions that finished before
    /// a later `execute` are no longer tracked.
    pub async fn wait_for_completions(&mut self) -> Vec<AutonomousAction> {
        let mut done = Vec::with_capacity(self.in_flight.len());
        for handle in self.in_flight.drain(..) {
            if let Ok(action) = handle.await {
                done.push(action);
            }
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(kind: &str, priority: f64) -> AutonomousAction {
        AutonomousAction {
            kind: Some(kind.to_string()),
            message: Some(format!("{kind} message")),
            action: None,
            priority_score: priority,
            why: vec![],
        }
    }

    fn board() -> ActionBoard {
        ActionBoard::new(
            vec![
                action("SECURITY_ALERT", 0.98),
                action("BUDGET_WARNING", 0.75),
                action("LIFESTYLE_OPTIMIZATION", 0.4),
            ],
            DEFAULT_EXECUTION_DELAY,
        )
    }

    fn kinds(board: &ActionBoard) -> Vec<&str> {
        board
            .actions()
            .iter()
            .filter_map(|a| a.kind.as_deref())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_removes_before_completion() {
        let mut board = board();

        let executed = board.execute(1).unwrap();

        assert_eq!(executed.kind.as_deref(), Some("BUDGET_WARNING"));
        assert_eq!(kinds(&board), vec!["SECURITY_ALERT", "LIFESTYLE_OPTIMIZATION"]);
        assert_eq!(board.in_flight(), 1);

        let done = board.wait_for_completions().await;
        assert_eq!(done.len(), 1);
        assert_eq!(board.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_is_stable_across_renders() {
        let mut board = board();
        board.execute(0);

        let first = kinds(&board).join(",");
        board.wait_for_completions().await;
        let second = kinds(&board).join(",");

        assert_eq!(first, second);
        assert!(!second.contains("SECURITY_ALERT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_completions_are_released_on_execute() {
        let mut board = board();
        board.execute(0);

        tokio::time::sleep(DEFAULT_EXECUTION_DELAY * 2).await;
        while board.in_flight() > 0 {
            tokio::task::yield_now().await;
        }
        board.execute(0);

        assert_eq!(board.in_flight.len(), 1);
        assert_eq!(board.wait_for_completions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_is_ignored() {
        let mut board = board();

        assert!(board.execute(3).is_none());
        assert!(board.dismiss(10).is_none());
        assert_eq!(board.actions().len(), 3);
        assert_eq!(board.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_dismiss_schedules_nothing() {
        let mut board = board();

        let dismissed = board.dismiss(2).unwrap();

        assert_eq!(dismissed.kind.as_deref(), Some("LIFESTYLE_OPTIMIZATION"));
        assert_eq!(board.in_flight(), 0);
        assert!(board.wait_for_completions().await.is_empty());
    }
}
