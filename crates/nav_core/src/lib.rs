//! Soft navigation: a menu controller that swaps page content and keeps
//! session history, menu highlighting and the document title in agreement
//! without full page loads.

pub mod collaborators;
pub mod controller;
pub mod dom;
pub mod error;
pub mod history;
pub mod menu;
pub mod transport;

pub use collaborators::{
    Activation, ActivationHandler, Dom, HistoryFacade, LocationHandler, TemplateRenderer,
    Transport,
};
pub use controller::{
    ActivePageState, CycleOutcome, CyclePhase, Dispatch, NavController, NavDependencies,
    PendingCycle,
};
pub use dom::MemoryDom;
pub use error::NavError;
pub use history::MemoryHistory;
pub use menu::MenuIndex;
pub use transport::HttpTransport;

pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
