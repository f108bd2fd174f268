mod error;
mod ports;
mod service;
mod use_cases;

pub use error::ApplicationError;
pub use ports::{
    CardSource, SelectionStore, SelectionSync, SyncMetrics, SyncOutcome, Thumbnail,
    ThumbnailEvent, ThumbnailLoader,
};
pub use service::{ApplicationService, PendingLoad};
pub use use_cases::{
    LoadCollectionCommand, PollSyncCommand, PollThumbnailCommand, RequestThumbnailCommand,
    SaveSelectionCommand, SyncMetricsQuery, ToggleSelectionCommand,
};
