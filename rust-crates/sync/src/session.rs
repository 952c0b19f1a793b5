//! Key-switch orchestration: one live (game chain, tier) at a time.
//!
//! Entering a key stops the previous subscription, fetches the snapshot,
//! then drains the push channel into the cache. A monotonically increasing
//! generation counter is captured at task start and re-checked at every
//! resumption point before anything is written, so results from a
//! superseded switch are discarded silently even when the network call
//! itself cannot be aborted.

use crate::{
    Result,
    cache::{
        GameKey,
        Hydration,
        PredictionCache,
    },
    ledger::{
        AccountStream,
        LedgerReader,
        PredictionFilter,
    },
    loader,
};
use fortune_codec::Prediction;
use std::sync::{
    Arc,
    Mutex,
    atomic::{
        AtomicU64,
        Ordering,
    },
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct SyncSession<R: LedgerReader + 'static> {
    reader: Arc<R>,
    cache: PredictionCache,
    generation: Arc<AtomicU64>,
    active: Mutex<Option<ActiveKey>>,
}

struct ActiveKey {
    stopper: CancellationToken,
    pump: JoinHandle<()>,
}

impl ActiveKey {
    fn stop(&self) {
        self.stopper.cancel();
        self.pump.abort();
    }
}

impl<R: LedgerReader + 'static> SyncSession<R> {
    pub fn new(reader: Arc<R>, cache: PredictionCache) -> Self {
        Self {
            reader,
            cache,
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &PredictionCache {
        &self.cache
    }

    fn still_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn stop_active(&self) {
        if let Some(previous) = self.active.lock().unwrap().take() {
            previous.stop();
        }
    }

    /// Activate a key: snapshot first, then subscription events. Re-entering
    /// after an error is the retry path; there is no automatic one.
    pub async fn enter(&self, key: GameKey) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // The previous channel must be fully stopped before the new snapshot
        // fetch starts, or two live subscriptions would race writes.
        self.stop_active();

        self.cache.set_hydration(key, Hydration::Loading);

        let filter = PredictionFilter {
            game_epoch: key.game_epoch,
            tier: key.tier,
        };

        // Subscribe before the snapshot fetch so no update falls between
        // them; pushed events buffer in the channel until the snapshot is
        // committed, which keeps snapshot-before-upsert ordering.
        let stream = match self.reader.subscribe_predictions(filter).await {
            Ok(stream) => stream,
            Err(e) => {
                if self.still_current(generation) {
                    self.cache.set_hydration(key, Hydration::Error);
                }
                return Err(e);
            }
        };
        let stopper = stream.stopper();

        let snapshot = match loader::fetch_snapshot(self.reader.as_ref(), filter).await {
            Ok(records) => records,
            Err(e) => {
                stream.stop();
                if self.still_current(generation) {
                    self.cache.set_hydration(key, Hydration::Error);
                }
                return Err(e);
            }
        };

        if !self.still_current(generation) {
            // Superseded while fetching; a newer enter() owns the key now.
            stream.stop();
            return Ok(());
        }

        self.cache.load_snapshot(key, snapshot);
        self.cache.set_hydration(key, Hydration::Ready);

        let pump = tokio::spawn(pump_events(
            stream,
            self.cache.clone(),
            key,
            Arc::clone(&self.generation),
            generation,
        ));

        let replaced = self
            .active
            .lock()
            .unwrap()
            .replace(ActiveKey { stopper, pump });
        if let Some(previous) = replaced {
            // A concurrent enter() installed between our generation check and
            // this swap; whichever generation is newest keeps pumping, the
            // other's pump exits on its next generation check.
            previous.stop();
        }
        Ok(())
    }

    /// Stop the live subscription and leave the cache as-is.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.stop_active();
    }
}

async fn pump_events(
    mut stream: AccountStream,
    cache: PredictionCache,
    key: GameKey,
    shared_generation: Arc<AtomicU64>,
    generation: u64,
) {
    while let Some(update) = stream.next().await {
        if shared_generation.load(Ordering::SeqCst) != generation {
            break;
        }
        match Prediction::decode(&update.data) {
            Ok(record) => {
                tracing::debug!(address = %update.address, "applying pushed prediction");
                cache.upsert(key, update.address, record);
            }
            Err(e) => {
                tracing::warn!(address = %update.address, "dropping pushed record: {e}");
            }
        }
    }
}
