//! Catalog synchronization.
//!
//! - **Reconciliation**: [`CatalogSync`] rebuilds the ranked categories from
//!   the remote source without touching favorites.
//! - **Favorites**: [`FavoriteToggle`] flips favorite membership atomically.
//! - **Scheduling**: [`SyncScheduler`] runs syncs in the background, driven by
//!   [`SyncPolicy`].

mod config;
mod engine;
mod favorites;
mod scheduler;
mod types;

pub use config::{SyncConfig, SyncTimings};
pub use engine::{apply_ranked_lists, CatalogSync};
pub use favorites::FavoriteToggle;
pub use scheduler::{SyncPolicy, SyncScheduler};
pub use types::{
    FavoriteState, SchedulerStatus, SyncDecision, SyncError, SyncReason, SyncResult,
};
