use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use card_binder_application::{
    ApplicationError, SelectionStore, SelectionSync, SyncMetrics, SyncOutcome,
};
use card_binder_domain::SelectionChange;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct ScheduledChange {
    sequence: u64,
    change: SelectionChange,
}

/// One worker thread drains submitted changes in order. When several queued
/// changes target the same card only the newest is sent, so the remote flag
/// ends up equal to the last local click.
pub struct BackgroundSelectionSync {
    next_sequence: AtomicU64,
    submit_tx: mpsc::Sender<ScheduledChange>,
    result_rx: Mutex<mpsc::Receiver<SyncOutcome>>,
    metrics: Arc<Mutex<SyncMetrics>>,
}

impl BackgroundSelectionSync {
    pub fn new(store: Arc<dyn SelectionStore>) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel::<ScheduledChange>();
        let (result_tx, result_rx) = mpsc::channel::<SyncOutcome>();
        let metrics = Arc::new(Mutex::new(SyncMetrics::default()));

        spawn_worker(submit_rx, result_tx, Arc::clone(&metrics), store);

        Self {
            next_sequence: AtomicU64::new(0),
            submit_tx,
            result_rx: Mutex::new(result_rx),
            metrics,
        }
    }
}

impl SelectionSync for BackgroundSelectionSync {
    fn submit(&self, change: SelectionChange) -> Result<u64, ApplicationError> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut metrics = self
                .metrics
                .lock()
                .map_err(|_| ApplicationError::Io("sync metrics lock poisoned".to_string()))?;
            metrics.submitted += 1;
        }
        self.submit_tx
            .send(ScheduledChange { sequence, change })
            .map_err(|error| {
                ApplicationError::Io(format!("failed to enqueue selection: {error}"))
            })?;
        Ok(sequence)
    }

    fn try_receive_outcome(&self) -> Result<Option<SyncOutcome>, ApplicationError> {
        let receiver = self
            .result_rx
            .lock()
            .map_err(|_| ApplicationError::Io("sync result lock poisoned".to_string()))?;

        match receiver.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(ApplicationError::Io(
                "sync result channel disconnected".to_string(),
            )),
        }
    }

    fn metrics(&self) -> Result<SyncMetrics, ApplicationError> {
        let metrics = self
            .metrics
            .lock()
            .map_err(|_| ApplicationError::Io("sync metrics lock poisoned".to_string()))?;
        Ok(metrics.clone())
    }
}

fn spawn_worker(
    submit_rx: mpsc::Receiver<ScheduledChange>,
    result_tx: mpsc::Sender<SyncOutcome>,
    metrics: Arc<Mutex<SyncMetrics>>,
    store: Arc<dyn SelectionStore>,
) {
    thread::spawn(move || {
        while let Ok(first) = submit_rx.recv() {
            let mut batch = vec![first];
            while let Ok(next) = submit_rx.try_recv() {
                batch.push(next);
            }

            let (jobs, coalesced) = coalesce(batch);
            if coalesced > 0 {
                debug!(coalesced, "dropped superseded selection changes");
                if let Ok(mut m) = metrics.lock() {
                    m.coalesced += coalesced;
                }
            }

            for job in jobs {
                let outcome = match store.persist_selection(&job.change) {
                    Ok(()) => SyncOutcome::Saved {
                        sequence: job.sequence,
                        change: job.change,
                    },
                    Err(error) => {
                        warn!(
                            card = %job.change.name,
                            sequence = job.sequence,
                            %error,
                            "selection not saved"
                        );
                        SyncOutcome::Failed {
                            sequence: job.sequence,
                            change: job.change,
                            reason: error.to_string(),
                        }
                    }
                };

                if let Ok(mut m) = metrics.lock() {
                    m.sent += 1;
                    if matches!(outcome, SyncOutcome::Failed { .. }) {
                        m.failed += 1;
                    }
                }

                if result_tx.send(outcome).is_err() {
                    return;
                }
            }
        }
    });
}

/// Keeps the newest change per card, in submission order.
fn coalesce(batch: Vec<ScheduledChange>) -> (Vec<ScheduledChange>, u64) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(batch.len());
    let mut dropped = 0_u64;
    for job in batch.into_iter().rev() {
        if seen.insert(job.change.name.clone()) {
            kept.push(job);
        } else {
            dropped += 1;
        }
    }
    kept.reverse();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::time::{Duration, Instant};

    use super::*;

    struct GatedStore {
        gate_first: AtomicBool,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
        saved: Mutex<Vec<SelectionChange>>,
        fail: bool,
    }

    impl GatedStore {
        fn new(gate_first: bool, fail: bool) -> (Arc<Self>, mpsc::Receiver<()>, mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = mpsc::channel();
            let (release_tx, release_rx) = mpsc::channel();
            let store = Arc::new(Self {
                gate_first: AtomicBool::new(gate_first),
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
                saved: Mutex::new(Vec::new()),
                fail,
            });
            (store, entered_rx, release_tx)
        }
    }

    impl SelectionStore for GatedStore {
        fn persist_selection(&self, change: &SelectionChange) -> Result<(), ApplicationError> {
            if self.gate_first.swap(false, Ordering::SeqCst) {
                let _ = self.entered.lock().expect("entered").send(());
                let _ = self.release.lock().expect("release").recv();
            }
            if self.fail {
                return Err(ApplicationError::Http {
                    status: 500,
                    url: "http://backend/api/update-selection".to_string(),
                });
            }
            self.saved.lock().expect("saved").push(change.clone());
            Ok(())
        }
    }

    fn wait_for_outcomes(sync: &BackgroundSelectionSync, count: usize) -> Vec<SyncOutcome> {
        let deadline = Instant::now() + Duration::from_millis(1000);
        let mut outcomes = Vec::new();
        while outcomes.len() < count {
            if let Some(outcome) = sync.try_receive_outcome().expect("poll") {
                outcomes.push(outcome);
                continue;
            }
            assert!(Instant::now() < deadline, "timed out waiting for sync outcomes");
            thread::sleep(Duration::from_millis(5));
        }
        outcomes
    }

    #[test]
    fn rapid_double_toggle_sends_only_the_latest_value() {
        let (store, entered, release) = GatedStore::new(true, false);
        let sync = BackgroundSelectionSync::new(store.clone());

        sync.submit(SelectionChange::new("Cloud", true)).expect("submit");
        entered
            .recv_timeout(Duration::from_millis(1000))
            .expect("worker should pick up the first change");

        sync.submit(SelectionChange::new("Cloud", false)).expect("submit");
        sync.submit(SelectionChange::new("Cloud", true)).expect("submit");
        let last = sync.submit(SelectionChange::new("Yuna", true)).expect("submit");
        assert_eq!(last, 4);
        release.send(()).expect("release");

        let outcomes = wait_for_outcomes(&sync, 3);
        let sequences: Vec<u64> = outcomes
            .iter()
            .map(|outcome| match outcome {
                SyncOutcome::Saved { sequence, .. } | SyncOutcome::Failed { sequence, .. } => {
                    *sequence
                }
            })
            .collect();
        assert_eq!(sequences, [1, 3, 4]);

        let saved = store.saved.lock().expect("saved").clone();
        assert_eq!(
            saved,
            [
                SelectionChange::new("Cloud", true),
                SelectionChange::new("Cloud", true),
                SelectionChange::new("Yuna", true),
            ]
        );

        let metrics = sync.metrics().expect("metrics");
        assert_eq!(metrics.submitted, 4);
        assert_eq!(metrics.sent, 3);
        assert_eq!(metrics.coalesced, 1);
        assert_eq!(metrics.failed, 0);
    }

    #[test]
    fn failures_are_reported_and_never_retried() {
        let (store, _entered, _release) = GatedStore::new(false, true);
        let sync = BackgroundSelectionSync::new(store);

        sync.submit(SelectionChange::new("Vivi", true)).expect("submit");
        let outcomes = wait_for_outcomes(&sync, 1);
        assert!(matches!(
            &outcomes[0],
            SyncOutcome::Failed { sequence: 1, reason, .. } if reason.contains("500")
        ));

        thread::sleep(Duration::from_millis(30));
        assert_eq!(sync.try_receive_outcome().expect("poll"), None);
        let metrics = sync.metrics().expect("metrics");
        assert_eq!((metrics.sent, metrics.failed), (1, 1));
    }

    #[test]
    fn coalesce_keeps_newest_per_card_in_order() {
        let batch = vec![
            ScheduledChange {
                sequence: 1,
                change: SelectionChange::new("A", true),
            },
            ScheduledChange {
                sequence: 2,
                change: SelectionChange::new("B", true),
            },
            ScheduledChange {
                sequence: 3,
                change: SelectionChange::new("A", false),
            },
        ];

        let (kept, dropped) = coalesce(batch);
        let sequences: Vec<u64> = kept.iter().map(|job| job.sequence).collect();
        assert_eq!(sequences, [2, 3]);
        assert_eq!(dropped, 1);
    }
}
