//! Aggregation cycle plumbing: loading snapshots, partial-failure settling
//! and the cancellation scope that owns a screen's in-flight requests.

use anyhow::Result;
use std::fmt::Display;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Screens the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Dashboard,
    Budgets,
    Goals,
    Expenses,
    Simulator,
    Actions,
}

impl Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Screen::Dashboard => "dashboard",
                Screen::Budgets => "budgets",
                Screen::Goals => "goals",
                Screen::Expenses => "expenses",
                Screen::Simulator => "simulator",
                Screen::Actions => "actions",
            }
        )
    }
}

/// A view model together with the loading flag of the cycle that built it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<V> {
    pub loading: bool,
    pub view: V,
}

impl<V: Default> Snapshot<V> {
    /// Placeholder shown while a cycle is in flight.
    pub fn pending() -> Self {
        Self {
            loading: true,
            view: V::default(),
        }
    }
}

impl<V> Snapshot<V> {
    pub fn settled(view: V) -> Self {
        Self {
            loading: false,
            view,
        }
    }
}

/// Recovers a single resource of an aggregation cycle. A failed fetch is
/// logged and replaced by the resource's default so sibling resources still
/// reach the screen.
pub fn settle<T: Default>(resource: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(resource, error = %e, "Resource unavailable, using default");
            T::default()
        }
    }
}

/// Owner of the cycles started for one screen visit. Cancelling the scope
/// (or dropping it) stops every cycle that has not settled yet.
#[derive(Debug)]
pub struct ScreenScope {
    screen: Screen,
    cancel: watch::Sender<bool>,
}

impl ScreenScope {
    pub fn new(screen: Screen) -> Self {
        let (cancel, _) = watch::channel(false);
        Self { screen, cancel }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn cancel(&self) {
        debug!(screen = %self.screen, "Cancelling screen scope");
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Runs one aggregation cycle in the background.
    ///
    /// The returned receiver starts at the loading placeholder and changes
    /// exactly once, to the settled snapshot, after every call of the cycle
    /// has completed. A cycle whose scope is cancelled first never publishes.
    pub fn spawn_cycle<V, F>(&self, cycle: F) -> Cycle<V>
    where
        V: Default + Send + Sync + 'static,
        F: Future<Output = V> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Snapshot::pending());
        let mut cancelled = self.cancel.subscribe();
        let screen = self.screen;

        let handle = tokio::spawn(async move {
            if *cancelled.borrow_and_update() {
                return;
            }
            tokio::select! {
                view = cycle => {
                    debug!(screen = %screen, "Aggregation cycle settled");
                    tx.send_replace(Snapshot::settled(view));
                }
                _ = wait_for_cancel(&mut cancelled) => {
                    debug!(screen = %screen, "Dropping stale aggregation cycle");
                }
            }
        });

        Cycle { rx, handle }
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

async fn wait_for_cancel(cancelled: &mut watch::Receiver<bool>) {
    // A closed channel means the scope is gone, which also cancels.
    while !*cancelled.borrow_and_update() {
        if cancelled.changed().await.is_err() {
            return;
        }
    }
}

/// Handle to an in-flight aggregation cycle.
pub struct Cycle<V> {
    rx: watch::Receiver<Snapshot<V>>,
    handle: JoinHandle<()>,
}

impl<V: Clone> Cycle<V> {
    pub fn current(&self) -> Snapshot<V> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<V>> {
        self.rx.clone()
    }

    /// Waits for the settled snapshot. Returns `None` when the cycle was
    /// cancelled before settling.
    pub async fn settled(mut self) -> Option<Snapshot<V>> {
        let _ = (&mut self.handle).await;
        let snapshot = self.rx.borrow_and_update().clone();
        (!snapshot.loading).then_some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn test_settle_substitutes_default() {
        let ok: Vec<i32> = settle("numbers", Ok(vec![1, 2]));
        assert_eq!(ok, vec![1, 2]);

        let failed: Vec<i32> = settle("numbers", Err(anyhow!("boom")));
        assert!(failed.is_empty());
    }

    #[tokio::test]
    async fn test_cycle_flips_loading_once_after_settling() {
        let scope = ScreenScope::new(Screen::Dashboard);
        let (release, gate) = oneshot::channel::<()>();

        let cycle = scope.spawn_cycle(async move {
            let _ = gate.await;
            7u32
        });
        let mut rx = cycle.subscribe();

        assert!(cycle.current().loading);
        assert_eq!(cycle.current().view, 0);

        release.send(()).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Snapshot::settled(7));

        let settled = cycle.settled().await.unwrap();
        assert!(!settled.loading);
        // No further publication after the settled snapshot.
        assert!(!rx.has_changed().unwrap_or(false));
    }

    #[tokio::test]
    async fn test_cancelled_scope_drops_stale_cycle() {
        let scope = ScreenScope::new(Screen::Budgets);
        let cycle = scope.spawn_cycle(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            1u32
        });

        scope.cancel();

        assert!(scope.is_cancelled());
        assert!(cycle.settled().await.is_none());
    }

    #[tokio::test]
    async fn test_cycle_spawned_on_cancelled_scope_never_runs() {
        let scope = ScreenScope::new(Screen::Goals);
        scope.cancel();

        let cycle = scope.spawn_cycle(async { 5u32 });
        assert!(cycle.settled().await.is_none());
    }
}
