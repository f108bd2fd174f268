use std::sync::{mpsc, Arc};
use std::thread;

use card_binder_domain::{apply_selection, Card, SelectionChange};
use tracing::{info, warn};

use crate::{
    ApplicationError, CardSource, LoadCollectionCommand, PollSyncCommand, PollThumbnailCommand,
    RequestThumbnailCommand, SaveSelectionCommand, SelectionStore, SelectionSync, SyncMetrics,
    SyncMetricsQuery, SyncOutcome, ThumbnailEvent, ThumbnailLoader, ToggleSelectionCommand,
};

pub struct ApplicationService {
    source: Arc<dyn CardSource>,
    store: Arc<dyn SelectionStore>,
    sync: Box<dyn SelectionSync>,
    thumbnails: Box<dyn ThumbnailLoader>,
}

/// A collection fetch running on its own thread. Poll once per frame.
pub struct PendingLoad {
    receiver: mpsc::Receiver<Result<Vec<Card>, ApplicationError>>,
}

impl PendingLoad {
    pub fn try_take(&self) -> Option<Result<Vec<Card>, ApplicationError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(ApplicationError::Io(
                "collection loader stopped before answering".to_string(),
            ))),
        }
    }
}

impl ApplicationService {
    pub fn new(
        source: Arc<dyn CardSource>,
        store: Arc<dyn SelectionStore>,
        sync: Box<dyn SelectionSync>,
        thumbnails: Box<dyn ThumbnailLoader>,
    ) -> Self {
        Self {
            source,
            store,
            sync,
            thumbnails,
        }
    }

    pub fn load_collection(
        &self,
        _command: LoadCollectionCommand,
    ) -> Result<Vec<Card>, ApplicationError> {
        let cards = self.source.fetch_cards()?;
        info!(cards = cards.len(), "collection loaded");
        Ok(cards)
    }

    pub fn start_load(&self, _command: LoadCollectionCommand) -> PendingLoad {
        let (tx, receiver) = mpsc::channel();
        let source = Arc::clone(&self.source);
        thread::spawn(move || {
            let result = source.fetch_cards();
            match &result {
                Ok(cards) => info!(cards = cards.len(), "collection loaded"),
                Err(error) => warn!(%error, "collection load failed"),
            }
            let _ = tx.send(result);
        });
        PendingLoad { receiver }
    }

    /// Applies the change to a fresh copy of `cards` and hands the remote
    /// write to the sync worker. The returned list never depends on whether
    /// the write gets through.
    pub fn toggle_selection(
        &self,
        cards: &[Card],
        command: ToggleSelectionCommand,
    ) -> Result<Vec<Card>, ApplicationError> {
        let change = SelectionChange::new(command.name, command.checked);
        let next = apply_selection(cards, &change).ok_or_else(|| {
            ApplicationError::NotFound(format!("no card named {:?}", change.name))
        })?;

        let name = change.name.clone();
        match self.sync.submit(change) {
            Ok(sequence) => {
                info!(card = %name, checked = command.checked, sequence, "selection queued")
            }
            Err(error) => warn!(card = %name, %error, "selection not queued"),
        }

        Ok(next)
    }

    pub fn save_selection(&self, command: SaveSelectionCommand) -> Result<(), ApplicationError> {
        if command.name.trim().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "card name must not be empty".to_string(),
            ));
        }
        self.store
            .persist_selection(&SelectionChange::new(command.name, command.checked))
    }

    pub fn poll_sync(
        &self,
        _command: PollSyncCommand,
    ) -> Result<Option<SyncOutcome>, ApplicationError> {
        self.sync.try_receive_outcome()
    }

    pub fn sync_metrics(&self, _query: SyncMetricsQuery) -> Result<SyncMetrics, ApplicationError> {
        self.sync.metrics()
    }

    pub fn request_thumbnail(
        &self,
        command: RequestThumbnailCommand,
    ) -> Result<(), ApplicationError> {
        if command.url.trim().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "thumbnail url must not be empty".to_string(),
            ));
        }
        self.thumbnails.request_thumbnail(&command.url)
    }

    pub fn poll_thumbnail(
        &self,
        _command: PollThumbnailCommand,
    ) -> Result<Option<ThumbnailEvent>, ApplicationError> {
        self.thumbnails.try_receive_thumbnail()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use card_binder_domain::Rarity;

    use super::*;

    struct FakeSource {
        result: Result<Vec<Card>, ApplicationError>,
    }

    impl CardSource for FakeSource {
        fn fetch_cards(&self) -> Result<Vec<Card>, ApplicationError> {
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct FakeStore {
        saved: Mutex<Vec<SelectionChange>>,
    }

    impl SelectionStore for FakeStore {
        fn persist_selection(&self, change: &SelectionChange) -> Result<(), ApplicationError> {
            self.saved
                .lock()
                .map_err(|_| ApplicationError::Io("poisoned".to_string()))?
                .push(change.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSync {
        fail_submit: bool,
        submitted: RefCell<Vec<SelectionChange>>,
        outcomes: RefCell<Vec<SyncOutcome>>,
    }

    impl SelectionSync for FakeSync {
        fn submit(&self, change: SelectionChange) -> Result<u64, ApplicationError> {
            if self.fail_submit {
                return Err(ApplicationError::Io("worker gone".to_string()));
            }
            let mut submitted = self.submitted.borrow_mut();
            submitted.push(change.clone());
            let sequence = submitted.len() as u64;
            self.outcomes.borrow_mut().push(SyncOutcome::Failed {
                sequence,
                change,
                reason: "backend down".to_string(),
            });
            Ok(sequence)
        }

        fn try_receive_outcome(&self) -> Result<Option<SyncOutcome>, ApplicationError> {
            Ok(self.outcomes.borrow_mut().pop())
        }

        fn metrics(&self) -> Result<SyncMetrics, ApplicationError> {
            Ok(SyncMetrics {
                submitted: self.submitted.borrow().len() as u64,
                ..SyncMetrics::default()
            })
        }
    }

    #[derive(Default)]
    struct FakeThumbnails {
        requested: RefCell<Vec<String>>,
    }

    impl ThumbnailLoader for FakeThumbnails {
        fn request_thumbnail(&self, url: &str) -> Result<(), ApplicationError> {
            self.requested.borrow_mut().push(url.to_string());
            Ok(())
        }

        fn try_receive_thumbnail(&self) -> Result<Option<ThumbnailEvent>, ApplicationError> {
            Ok(self
                .requested
                .borrow_mut()
                .pop()
                .map(|url| ThumbnailEvent::Failed {
                    url,
                    reason: "offline".to_string(),
                }))
        }
    }

    fn collection() -> Vec<Card> {
        vec![
            Card::new("Cloud", Rarity::Mythic, 1, 20.0),
            Card::new("Yuna", Rarity::Rare, 2, 4.0).with_checked(true),
        ]
    }

    fn service_with(source: FakeSource, sync: FakeSync) -> ApplicationService {
        ApplicationService::new(
            Arc::new(source),
            Arc::<FakeStore>::default(),
            Box::new(sync),
            Box::<FakeThumbnails>::default(),
        )
    }

    #[test]
    fn toggle_updates_locally_even_when_remote_write_fails() {
        let service = service_with(
            FakeSource {
                result: Ok(collection()),
            },
            FakeSync::default(),
        );
        let cards = service
            .load_collection(LoadCollectionCommand)
            .expect("load should work");

        let next = service
            .toggle_selection(
                &cards,
                ToggleSelectionCommand {
                    name: "Cloud".to_string(),
                    checked: true,
                },
            )
            .expect("toggle should work");
        assert!(next[0].checked);
        assert!(!cards[0].checked);

        let outcome = service
            .poll_sync(PollSyncCommand)
            .expect("poll")
            .expect("outcome");
        assert!(matches!(outcome, SyncOutcome::Failed { sequence: 1, .. }));
        assert!(next[0].checked);
    }

    #[test]
    fn toggle_survives_a_dead_sync_worker() {
        let service = service_with(
            FakeSource {
                result: Ok(collection()),
            },
            FakeSync {
                fail_submit: true,
                ..FakeSync::default()
            },
        );

        let next = service
            .toggle_selection(
                &collection(),
                ToggleSelectionCommand {
                    name: "Yuna".to_string(),
                    checked: false,
                },
            )
            .expect("toggle should work");
        assert!(!next[1].checked);
    }

    #[test]
    fn toggle_of_unknown_card_is_not_found_and_submits_nothing() {
        let service = service_with(
            FakeSource {
                result: Ok(collection()),
            },
            FakeSync::default(),
        );

        let result = service.toggle_selection(
            &collection(),
            ToggleSelectionCommand {
                name: "Kefka".to_string(),
                checked: true,
            },
        );
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
        let metrics = service.sync_metrics(SyncMetricsQuery).expect("metrics");
        assert_eq!(metrics.submitted, 0);
    }

    #[test]
    fn background_load_reports_failures() {
        let service = service_with(
            FakeSource {
                result: Err(ApplicationError::Network("connection refused".to_string())),
            },
            FakeSync::default(),
        );

        let pending = service.start_load(LoadCollectionCommand);
        let deadline = Instant::now() + Duration::from_millis(500);
        let result = loop {
            if let Some(result) = pending.try_take() {
                break result;
            }
            assert!(Instant::now() < deadline, "timed out waiting for load");
            thread::sleep(Duration::from_millis(5));
        };
        assert!(matches!(result, Err(ApplicationError::Network(_))));
    }

    #[test]
    fn save_selection_rejects_blank_names() {
        let service = service_with(
            FakeSource {
                result: Ok(Vec::new()),
            },
            FakeSync::default(),
        );

        let result = service.save_selection(SaveSelectionCommand {
            name: "  ".to_string(),
            checked: true,
        });
        assert!(matches!(result, Err(ApplicationError::InvalidInput(_))));
        service
            .save_selection(SaveSelectionCommand {
                name: "Cloud".to_string(),
                checked: true,
            })
            .expect("save should work");
    }

    #[test]
    fn thumbnails_pass_through_to_the_loader() {
        let service = service_with(
            FakeSource {
                result: Ok(Vec::new()),
            },
            FakeSync::default(),
        );

        assert!(matches!(
            service.request_thumbnail(RequestThumbnailCommand { url: String::new() }),
            Err(ApplicationError::InvalidInput(_))
        ));
        service
            .request_thumbnail(RequestThumbnailCommand {
                url: "http://img/cloud.jpg".to_string(),
            })
            .expect("request");
        let event = service
            .poll_thumbnail(PollThumbnailCommand)
            .expect("poll")
            .expect("event");
        assert!(matches!(event, ThumbnailEvent::Failed { .. }));
    }
}
