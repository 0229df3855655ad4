pub mod catalog;
pub mod config;
pub mod images;
pub mod metrics;
pub mod remote;
pub mod sync;
pub mod testing;

pub use catalog::{
    CatalogError, CatalogStats, CatalogWriter, Category, CategoryStore, Movie, SqliteCatalog,
    UpsertOutcome,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    SanitizedConfig, ServerConfig,
};
pub use images::{build_variants, resolve_image_path, ImageWidth};
pub use remote::{
    ImageConfiguration, MovieReview, MovieSource, MovieVideo, RankedList, RemoteError,
    RemoteMovieRecord, TmdbClient, TmdbConfig,
};
pub use sync::{
    apply_ranked_lists, CatalogSync, FavoriteState, FavoriteToggle, SchedulerStatus, SyncConfig,
    SyncDecision, SyncError, SyncPolicy, SyncReason, SyncResult, SyncScheduler, SyncTimings,
};
