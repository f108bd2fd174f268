#[derive(Debug, Clone, Default)]
pub struct LoadCollectionCommand;

#[derive(Debug, Clone)]
pub struct ToggleSelectionCommand {
    pub name: String,
    pub checked: bool,
}

#[derive(Debug, Clone)]
pub struct SaveSelectionCommand {
    pub name: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PollSyncCommand;

#[derive(Debug, Clone, Default)]
pub struct SyncMetricsQuery;

#[derive(Debug, Clone)]
pub struct RequestThumbnailCommand {
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct PollThumbnailCommand;
