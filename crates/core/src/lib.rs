pub mod config;
pub mod fetcher;
pub mod library;
pub mod metrics;
pub mod normalize;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SourceConfig,
};
pub use fetcher::{CompletionatorFetcher, DisabledFetcher, FetchError, Fetcher, HltbFetcher};
pub use library::{
    GameLibrary, LibraryError, ManualEntry, RefreshOutcome, RefreshSummary, SearchOutcome,
    SourceSelector,
};
pub use normalize::{normalize, parse_hours, NormalizeError};
pub use query::{GameQuery, GameRow, SortField};
pub use reconcile::reconcile;
pub use record::{GameRecord, PartialRecord, SourceKind};
pub use store::{
    GameStore, GameUpdate, ImportBatch, InsertOutcome, Mutation, SqliteGameStore, StoreError,
};
