//! Repository filesystem synchronization: a real-time debounced watcher,
//! a periodic reconciliation scanner, and a manager that composes both.

pub mod manager;
pub mod scanner;
pub mod watcher;

pub use manager::SyncManager;
pub use scanner::{ReconciliationScanner, ScanConfig};
pub use watcher::{FileWatcher, ScanGenerations, DEFAULT_DEBOUNCE_INTERVAL};
