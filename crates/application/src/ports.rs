use card_binder_domain::{Card, SelectionChange};

use crate::ApplicationError;

/// Serves the full collection snapshot, `checked` flags included.
pub trait CardSource: Send + Sync {
    fn fetch_cards(&self) -> Result<Vec<Card>, ApplicationError>;
}

/// Persists one selection flag, synchronously. 2xx is the only success.
pub trait SelectionStore: Send + Sync {
    fn persist_selection(&self, change: &SelectionChange) -> Result<(), ApplicationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Saved {
        sequence: u64,
        change: SelectionChange,
    },
    Failed {
        sequence: u64,
        change: SelectionChange,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMetrics {
    pub submitted: u64,
    pub sent: u64,
    pub coalesced: u64,
    pub failed: u64,
}

/// Submit-and-forget persistence of selection changes. Submissions are
/// numbered; outcomes come back through `try_receive_outcome`.
pub trait SelectionSync {
    fn submit(&self, change: SelectionChange) -> Result<u64, ApplicationError>;

    fn try_receive_outcome(&self) -> Result<Option<SyncOutcome>, ApplicationError>;

    fn metrics(&self) -> Result<SyncMetrics, ApplicationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailEvent {
    Ready(Thumbnail),
    Failed { url: String, reason: String },
}

pub trait ThumbnailLoader {
    fn request_thumbnail(&self, url: &str) -> Result<(), ApplicationError>;

    fn try_receive_thumbnail(&self) -> Result<Option<ThumbnailEvent>, ApplicationError>;
}
