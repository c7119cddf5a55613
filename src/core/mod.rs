//! Client-side domain: backend abstraction, view model aggregation and the
//! local state that survives between screens.

pub mod actions;
pub mod aggregator;
pub mod analytics;
pub mod assistant;
pub mod backend;
pub mod config;
pub mod log;
pub mod model;
pub mod screen;
pub mod session;

pub use aggregator::{MutationOutcome, ViewModelAggregator};
pub use backend::Backend;
pub use screen::{Screen, ScreenScope, Snapshot};
pub use session::{Session, SessionStore};
